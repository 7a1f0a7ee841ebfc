use crate::export::ExportError;
use crate::serp::SerpError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(
        "empty query: give search terms or at least one operator (--exact, --site, --filetype, ...)"
    )]
    EmptyQuery,

    #[error("invalid --param '{0}': {1}")]
    InvalidParam(String, &'static str),

    #[error(transparent)]
    Serp(#[from] SerpError),

    #[error("cannot export: {0}")]
    Export(#[from] ExportError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
}
