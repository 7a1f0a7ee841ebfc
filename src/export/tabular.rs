use std::io;

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};

use super::{ExportError, cell_text};
use crate::serp::ResultItem;
use crate::text::{single_line, truncate_chars};

const MAX_CELL_CHARS: usize = 60;

/// Write `items` as CSV with one column per field, header first.
pub fn write_csv<W: io::Write>(
    items: &[ResultItem],
    fields: &[&str],
    writer: W,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(fields)?;
    for item in items {
        wtr.write_record(fields.iter().map(|field| cell_text(item.get(*field))))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `items` as a terminal table over `fields`, prefixed by a row number.
pub fn render_table(items: &[ResultItem], fields: &[&str]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec!["#"];
    header.extend_from_slice(fields);
    table.set_header(header);

    for (i, item) in items.iter().enumerate() {
        let mut row = vec![(i + 1).to_string()];
        row.extend(fields.iter().map(|field| {
            truncate_chars(&single_line(&cell_text(item.get(*field))), MAX_CELL_CHARS)
        }));
        table.add_row(row);
    }

    table.to_string()
}
