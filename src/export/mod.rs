//! Result export: field projection, CSV/JSON encoders, and terminal table rendering.

pub mod document;
pub mod tabular;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::info;

use crate::search::RetrievalSession;
use crate::serp::{ResultItem, SearchCategory};

pub use document::ExportDocument;
pub use tabular::{render_table, write_csv};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("results do not contain the expected fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Text for one exported cell. Missing and null become empty; nested values stay compact JSON.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Refuse to export when a field appears in none of the items.
pub fn ensure_fields(items: &[ResultItem], fields: &[&str]) -> Result<(), ExportError> {
    if items.is_empty() {
        return Ok(());
    }
    let missing: Vec<String> = fields
        .iter()
        .filter(|field| !items.iter().any(|item| item.contains_key(**field)))
        .map(|field| field.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExportError::MissingFields(missing))
    }
}

/// `search_results_<category>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn file_name(category: SearchCategory, now: &DateTime<FixedOffset>, ext: &str) -> String {
    format!(
        "search_results_{category}_{}.{ext}",
        now.format("%Y%m%d_%H%M%S")
    )
}

#[derive(Debug)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Write both the CSV table and the JSON document into `dir`.
pub fn write_exports(
    dir: &Path,
    session: &RetrievalSession,
    query: &str,
    parameters: &[(String, String)],
    now: &DateTime<FixedOffset>,
) -> Result<ExportPaths, ExportError> {
    let fields = session.category.export_fields();
    ensure_fields(&session.items, fields)?;
    fs::create_dir_all(dir)?;

    let csv_path = dir.join(file_name(session.category, now, "csv"));
    write_csv(&session.items, fields, fs::File::create(&csv_path)?)?;

    let json_path = dir.join(file_name(session.category, now, "json"));
    let doc = ExportDocument::new(session, query, parameters, now);
    fs::write(&json_path, doc.to_json()?)?;

    info!(csv = %csv_path.display(), json = %json_path.display(), "results exported");
    Ok(ExportPaths {
        csv: csv_path,
        json: json_path,
    })
}
