use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use crate::serp::{PageRequest, RESULTS_PER_PAGE, ResultItem, SearchCategory, SearchClient};

/// Pause between consecutive page requests.
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Placeholder scheme upstream emits for images it could not resolve.
const RAW_IMAGE_PREFIX: &str = "x-raw-image:///";

/// Why a retrieval ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back with no usable items.
    EmptyPage,
    /// Upstream advertised no following page.
    LastPage,
    PageCap,
    Transport(String),
    Upstream(String),
    Cancelled,
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::Transport(_) | StopReason::Upstream(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EmptyPage => f.write_str("no more results"),
            StopReason::LastPage => f.write_str("last page reached"),
            StopReason::PageCap => f.write_str("page limit reached"),
            StopReason::Transport(e) => write!(f, "request failed: {e}"),
            StopReason::Upstream(e) => write!(f, "search API error: {e}"),
            StopReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Everything one retrieval produced. Owned by the caller once returned.
#[derive(Debug)]
pub struct RetrievalSession {
    pub category: SearchCategory,
    pub items: Vec<ResultItem>,
    pub pages_fetched: u32,
    /// Image results dropped as unusable.
    pub discarded: usize,
    pub stop: StopReason,
}

/// Reported to the progress observer after each fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub page: u32,
    pub max_pages: u32,
    pub items: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalRequest<'a> {
    pub query: &'a str,
    pub category: SearchCategory,
    pub max_pages: u32,
    pub extra_params: &'a [(String, String)],
    pub page_delay: Duration,
}

impl<'a> RetrievalRequest<'a> {
    pub fn new(query: &'a str, category: SearchCategory, max_pages: u32) -> Self {
        Self {
            query,
            category,
            max_pages,
            extra_params: &[],
            page_delay: PAGE_DELAY,
        }
    }

    pub fn with_extra_params(mut self, extra_params: &'a [(String, String)]) -> Self {
        self.extra_params = extra_params;
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }
}

/// Page through results for `request`, collecting items until upstream runs
/// out, a request fails, `cancel` fires, or `max_pages` pages were fetched.
///
/// Never fails: errors end paging early and are reported through
/// [`RetrievalSession::stop`] alongside whatever was already collected.
pub async fn get_results(
    client: &impl SearchClient,
    request: &RetrievalRequest<'_>,
    cancel: &CancelToken,
    mut progress: impl FnMut(PageProgress),
) -> RetrievalSession {
    let category = request.category;
    let results_key = category.results_key();

    let mut items: Vec<ResultItem> = Vec::new();
    let mut discarded = 0;
    let mut page: u32 = 0;

    info!(
        query = %request.query,
        category = %category,
        max_pages = request.max_pages,
        "retrieval started"
    );

    let stop = loop {
        if page >= request.max_pages {
            break StopReason::PageCap;
        }
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        let page_request = PageRequest {
            query: request.query,
            category,
            offset: page * RESULTS_PER_PAGE,
            extra_params: request.extra_params,
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = client.search(&page_request) => Some(result),
        };

        let mut response = match outcome {
            None => break StopReason::Cancelled,
            Some(Ok(response)) => response,
            Some(Err(e)) if e.is_transport() => {
                warn!(page = page + 1, error = %e, "request failed, stopping");
                break StopReason::Transport(e.to_string());
            }
            Some(Err(e)) => {
                warn!(page = page + 1, error = %e, "upstream error, stopping");
                break StopReason::Upstream(e.to_string());
            }
        };
        page += 1;

        let mut batch = response.take_results(results_key);
        if category == SearchCategory::Images {
            let before = batch.len();
            batch.retain(is_exportable_image);
            discarded += before - batch.len();
        }

        let exhausted = batch.is_empty();
        debug!(page, received = batch.len(), "page collected");
        items.extend(batch);

        progress(PageProgress {
            page,
            max_pages: request.max_pages,
            items: items.len(),
        });

        if exhausted {
            break StopReason::EmptyPage;
        }
        if !response.has_next_page() {
            break StopReason::LastPage;
        }
        if page >= request.max_pages {
            break StopReason::PageCap;
        }

        let interrupted = tokio::select! {
            biased;
            () = cancel.cancelled() => true,
            () = tokio::time::sleep(request.page_delay) => false,
        };
        if interrupted {
            break StopReason::Cancelled;
        }
    };

    if discarded > 0 {
        info!(discarded, "dropped invalid or empty image results");
    }
    info!(
        items = items.len(),
        pages = page,
        stop = %stop,
        "retrieval finished"
    );

    RetrievalSession {
        category,
        items,
        pages_fetched: page,
        discarded,
        stop,
    }
}

fn is_exportable_image(item: &ResultItem) -> bool {
    item.get("original")
        .and_then(Value::as_str)
        .is_some_and(|url| !url.trim().is_empty() && !url.starts_with(RAW_IMAGE_PREFIX))
}
