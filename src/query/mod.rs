//! Search operator composition: turns structured query inputs into a single query string.

use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Structured inputs for one search. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub base: Option<String>,
    pub exact_phrase: Option<String>,
    pub site: Option<String>,
    pub include_dir: Option<String>,
    pub exclude_dir: Option<String>,
    /// Comma-separated list of sites to exclude.
    pub exclude_sites: Option<String>,
    /// Comma-separated list of words to exclude.
    pub exclude_words: Option<String>,
    pub filetype: Option<String>,
    pub exclude_filetypes: Vec<String>,
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
}

/// Build the query string for `spec`.
///
/// Tokens are emitted in a fixed slot order and joined with single spaces.
/// Returns an empty string when no field is set; callers must not submit it.
pub fn build_query(spec: &QuerySpec) -> String {
    let mut tokens: Vec<String> = Vec::new();

    if let Some(base) = present(&spec.base) {
        tokens.push(base.to_string());
    }
    if let Some(phrase) = present(&spec.exact_phrase) {
        tokens.push(format!("\"{phrase}\""));
    }
    if let Some(site) = present(&spec.site) {
        tokens.push(format!("site:{site}"));
    }
    if let Some(dir) = present(&spec.include_dir) {
        tokens.push(format!("inurl:{dir}"));
    }
    if let Some(dir) = present(&spec.exclude_dir) {
        tokens.push(format!("-inurl:{dir}"));
    }
    if let Some(sites) = present(&spec.exclude_sites) {
        tokens.extend(split_list(sites).map(|site| format!("-site:{site}")));
    }
    if let Some(words) = present(&spec.exclude_words) {
        tokens.extend(split_list(words).map(|word| format!("-{word}")));
    }
    if let Some(ext) = present(&spec.filetype) {
        tokens.push(format!("filetype:{ext}"));
    }
    tokens.extend(
        spec.exclude_filetypes
            .iter()
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!("-filetype:{ext}")),
    );
    if let Some(date) = spec.after {
        tokens.push(format!("after:{}", date.format(DATE_FORMAT)));
    }
    if let Some(date) = spec.before {
        tokens.push(format!("before:{}", date.format(DATE_FORMAT)));
    }

    tokens.join(" ")
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}
