use serde::Deserialize;
use serde_json::{Map, Value};

/// One record of a category result list. Shape is decided upstream.
pub type ResultItem = Map<String, Value>;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub error: Option<Value>,
    /// Kept loose: an odd shape here must not cost the page its results.
    #[serde(default)]
    pub serpapi_pagination: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SearchResponse {
    /// True when upstream advertises a following page.
    pub fn has_next_page(&self) -> bool {
        self.serpapi_pagination
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(|p| p.contains_key("next"))
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(value_to_message)
    }

    /// Removes the result list stored under `key`.
    /// A missing or non-array value yields an empty list; non-object entries are dropped.
    pub fn take_results(&mut self, key: &str) -> Vec<ResultItem> {
        match self.rest.remove(key) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
