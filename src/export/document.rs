use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;

use crate::search::RetrievalSession;
use crate::serp::{LOCALE_PARAMS, ResultItem, SearchCategory};

/// JSON export: run metadata plus the full, unprojected result items.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub query: &'a str,
    pub search_type: SearchCategory,
    pub timestamp: String,
    pub total_results: usize,
    pub pages_retrieved: u32,
    pub parameters: BTreeMap<&'a str, &'a str>,
    pub results: &'a [ResultItem],
}

impl<'a> ExportDocument<'a> {
    pub fn new(
        session: &'a RetrievalSession,
        query: &'a str,
        parameters: &'a [(String, String)],
        now: &DateTime<FixedOffset>,
    ) -> Self {
        Self {
            query,
            search_type: session.category,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, false),
            total_results: session.items.len(),
            pages_retrieved: session.pages_fetched,
            parameters: LOCALE_PARAMS
                .iter()
                .copied()
                .chain(parameters.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .collect(),
            results: &session.items,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
