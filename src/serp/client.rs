use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::category::SearchCategory;
use super::types::SearchResponse;

const API_BASE: &str = "https://serpapi.com/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_SNIPPET_BYTES: usize = 200;

/// Number of results requested per page; also the offset step between pages.
pub const RESULTS_PER_PAGE: u32 = 100;

/// Fixed request parameters. Callers may override any of them via extra params.
const DEFAULT_PARAMS: &[(&str, &str)] = &[("engine", "google"), ("google_domain", "google.com")];

/// Country and interface language sent unless overridden.
pub const LOCALE_PARAMS: &[(&str, &str)] = &[("gl", "it"), ("hl", "it")];

#[derive(Debug, thiserror::Error)]
pub enum SerpError {
    #[error("SerpApi key not set. Pass --api-key or set SERPAPI_API_KEY")]
    ApiKeyNotSet,

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("SerpApi error: {0}")]
    Upstream(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SerpError {
    // Request URLs carry the api_key query parameter; never let them reach a message.
    fn from(e: reqwest::Error) -> Self {
        SerpError::Network(e.without_url())
    }
}

impl SerpError {
    /// Network-level or non-2xx failures, as opposed to an error reported inside a response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SerpError::Network(_) | SerpError::Status { .. } | SerpError::Endpoint(_)
        )
    }
}

/// One page of a search: what to ask for and where to start.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub query: &'a str,
    pub category: SearchCategory,
    pub offset: u32,
    pub extra_params: &'a [(String, String)],
}

/// Abstraction over the search-results API.
/// Implemented by `SerpClient` for production; mock implementations used in tests.
pub trait SearchClient {
    async fn search(&self, request: &PageRequest<'_>) -> Result<SearchResponse, SerpError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct SerpClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl SerpClient {
    pub fn new(http: Client, api_key: &str) -> Result<Self, SerpError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SerpError::ApiKeyNotSet);
        }
        Ok(Self {
            http,
            api_key: ApiKey(api_key.to_string()),
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            base_url: base_url.to_string(),
        }
    }

    fn page_params(&self, request: &PageRequest<'_>) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = DEFAULT_PARAMS
            .iter()
            .chain(LOCALE_PARAMS)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.insert("num".into(), RESULTS_PER_PAGE.to_string());
        params.insert("api_key".into(), self.api_key.0.clone());
        params.insert("q".into(), request.query.to_string());
        if let Some(tbm) = request.category.tbm() {
            params.insert("tbm".into(), tbm.to_string());
        }
        for (key, value) in request.extra_params {
            params.insert(key.clone(), value.clone());
        }
        params.insert("start".into(), request.offset.to_string());
        params
    }

    fn page_url(&self, request: &PageRequest<'_>) -> Result<Url, SerpError> {
        let url = Url::parse_with_params(&self.base_url, &self.page_params(request))?;
        debug_assert!(
            url.scheme() == "https" || cfg!(test),
            "API key must only be sent over HTTPS"
        );
        Ok(url)
    }
}

impl SearchClient for SerpClient {
    async fn search(&self, request: &PageRequest<'_>) -> Result<SearchResponse, SerpError> {
        let url = self.page_url(request)?;

        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<SearchResponse>(&text)
                .ok()
                .and_then(|body| body.error_message())
                .unwrap_or_else(|| snippet(&text));
            warn!(status = %status, "SerpApi request failed");
            return Err(SerpError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse =
            serde_json::from_str(&text).map_err(|e| SerpError::Decode(e.to_string()))?;

        if let Some(message) = body.error_message() {
            warn!(error = %message, "SerpApi reported an error");
            return Err(SerpError::Upstream(message));
        }

        debug!(
            category = %request.category,
            offset = request.offset,
            next = body.has_next_page(),
            "page received"
        );
        Ok(body)
    }
}

fn snippet(text: &str) -> String {
    if text.len() > ERROR_SNIPPET_BYTES {
        text[..text.floor_char_boundary(ERROR_SNIPPET_BYTES)].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(category: SearchCategory, extra: &'a [(String, String)]) -> PageRequest<'a> {
        PageRequest {
            query: "cats site:example.com",
            category,
            offset: 200,
            extra_params: extra,
        }
    }

    #[test]
    fn blank_key_rejected() {
        let err = SerpClient::new(Client::new(), "  ").unwrap_err();
        assert!(matches!(err, SerpError::ApiKeyNotSet));
    }

    #[test]
    fn debug_redacts_key() {
        let client = SerpClient::new(Client::new(), "super-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn params_include_fixed_defaults() {
        let client = SerpClient::with_base_url(Client::new(), API_BASE);
        let params = client.page_params(&request(SearchCategory::Web, &[]));
        assert_eq!(params["engine"], "google");
        assert_eq!(params["google_domain"], "google.com");
        assert_eq!(params["gl"], "it");
        assert_eq!(params["hl"], "it");
        assert_eq!(params["num"], "100");
        assert_eq!(params["api_key"], "test-key");
        assert_eq!(params["q"], "cats site:example.com");
        assert_eq!(params["start"], "200");
        assert!(!params.contains_key("tbm"));
    }

    #[test]
    fn params_carry_category_tbm() {
        let client = SerpClient::with_base_url(Client::new(), API_BASE);
        let params = client.page_params(&request(SearchCategory::Shopping, &[]));
        assert_eq!(params["tbm"], "shop");
    }

    #[test]
    fn extra_params_override_defaults_but_not_offset() {
        let client = SerpClient::with_base_url(Client::new(), API_BASE);
        let extra = vec![
            ("gl".to_string(), "us".to_string()),
            ("start".to_string(), "999".to_string()),
            ("safe".to_string(), "active".to_string()),
        ];
        let params = client.page_params(&request(SearchCategory::Web, &extra));
        assert_eq!(params["gl"], "us");
        assert_eq!(params["safe"], "active");
        assert_eq!(params["start"], "200");
    }

    #[test]
    fn page_url_encodes_query() {
        let client = SerpClient::with_base_url(Client::new(), API_BASE);
        let url = client
            .page_url(&request(SearchCategory::Web, &[]))
            .unwrap();
        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        assert_eq!(q.as_deref(), Some("cats site:example.com"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let s = snippet(&long);
        assert!(s.len() <= ERROR_SNIPPET_BYTES);
        assert!(s.chars().all(|c| c == 'é'));
    }

    #[test]
    fn transport_classification() {
        assert!(
            SerpError::Status {
                code: 500,
                message: "boom".into()
            }
            .is_transport()
        );
        assert!(!SerpError::Upstream("no results".into()).is_transport());
        assert!(!SerpError::Decode("eof".into()).is_transport());
    }
}
