use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};

use super::errors::CliError;
use crate::query::QuerySpec;
use crate::serp::SearchCategory;

pub const API_KEY_ENV: &str = "SERPAPI_API_KEY";

/// File extensions offered for `--filetype` / `--exclude-filetype`.
const FILE_TYPES: [&str; 7] = ["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Request parameters managed by the client itself.
const RESERVED_PARAMS: [&str; 3] = ["q", "api_key", "start"];

#[derive(Args, Debug, Default, Clone)]
pub struct QueryArgs {
    /// Base search terms
    pub terms: Vec<String>,
    /// Phrase to match exactly (wrapped in quotes)
    #[arg(long, value_name = "PHRASE")]
    pub exact: Option<String>,
    /// Restrict results to this domain (e.g., example.com)
    #[arg(long, value_name = "DOMAIN")]
    pub site: Option<String>,
    /// Only URLs containing this directory (e.g., /blog/)
    #[arg(long = "inurl", value_name = "DIR")]
    pub include_dir: Option<String>,
    /// Skip URLs containing this directory (e.g., /en/)
    #[arg(long = "exclude-inurl", value_name = "DIR")]
    pub exclude_dir: Option<String>,
    /// Comma-separated domains to exclude (e.g., "shop.example.com, other.com")
    #[arg(long, value_name = "SITES")]
    pub exclude_sites: Option<String>,
    /// Comma-separated words to exclude (e.g., "spam, ads")
    #[arg(long, value_name = "WORDS")]
    pub exclude_words: Option<String>,
    /// Only documents of this type
    #[arg(long, value_parser = FILE_TYPES)]
    pub filetype: Option<String>,
    /// Exclude documents of this type (repeatable)
    #[arg(long = "exclude-filetype", value_name = "EXT", value_parser = FILE_TYPES)]
    pub exclude_filetypes: Vec<String>,
    /// Results published after this date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub after: Option<NaiveDate>,
    /// Results published before this date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub before: Option<NaiveDate>,
}

impl QueryArgs {
    pub fn to_spec(&self) -> QuerySpec {
        let base = self.terms.join(" ");
        QuerySpec {
            base: (!base.is_empty()).then_some(base),
            exact_phrase: self.exact.clone(),
            site: self.site.clone(),
            include_dir: self.include_dir.clone(),
            exclude_dir: self.exclude_dir.clone(),
            exclude_sites: self.exclude_sites.clone(),
            exclude_words: self.exclude_words.clone(),
            filetype: self.filetype.clone(),
            exclude_filetypes: self.exclude_filetypes.clone(),
            after: self.after,
            before: self.before,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table over the category's export fields
    #[default]
    Table,
    /// JSON document with run metadata and full results
    Json,
    /// CSV over the category's export fields
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Search type
    #[arg(long = "type", short = 't', value_enum, default_value_t = SearchCategory::Web)]
    pub category: SearchCategory,

    /// Maximum pages to fetch (100 results per page)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_pages: u32,

    /// Extra request parameter, overriding defaults such as gl/hl (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Format for results printed to stdout
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Also write CSV and JSON exports into this directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// SerpApi key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub(super) fn parse_param(raw: &str) -> Result<(String, String), CliError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::InvalidParam(raw.to_string(), "expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidParam(raw.to_string(), "empty key"));
    }
    if RESERVED_PARAMS.contains(&key) {
        return Err(CliError::InvalidParam(
            raw.to_string(),
            "this parameter is set by serpx",
        ));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_join_into_base() {
        let args = QueryArgs {
            terms: vec!["rust".into(), "async".into()],
            site: Some("docs.rs".into()),
            ..Default::default()
        };
        let spec = args.to_spec();
        assert_eq!(spec.base.as_deref(), Some("rust async"));
        assert_eq!(spec.site.as_deref(), Some("docs.rs"));
    }

    #[test]
    fn no_terms_means_no_base() {
        assert_eq!(QueryArgs::default().to_spec(), QuerySpec::default());
    }

    #[test]
    fn param_parses_key_value() {
        assert_eq!(
            parse_param("gl=us").unwrap(),
            ("gl".to_string(), "us".to_string())
        );
        assert_eq!(
            parse_param("tbs=qdr:d,sbd:1").unwrap(),
            ("tbs".to_string(), "qdr:d,sbd:1".to_string())
        );
    }

    #[test]
    fn param_value_may_contain_equals() {
        assert_eq!(parse_param("x=a=b").unwrap().1, "a=b");
    }

    #[test]
    fn param_rejects_malformed_input() {
        assert!(matches!(parse_param("novalue"), Err(CliError::InvalidParam(..))));
        assert!(matches!(parse_param("=x"), Err(CliError::InvalidParam(..))));
    }

    #[test]
    fn param_rejects_reserved_keys() {
        for raw in ["q=x", "api_key=k", "start=100"] {
            let err = parse_param(raw).unwrap_err();
            assert!(err.to_string().contains("set by serpx"), "got: {err}");
        }
    }
}
