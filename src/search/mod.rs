//! Paginated retrieval: walks result pages for one query and collects the items.

pub(crate) mod cancel;
pub(crate) mod engine;

pub use cancel::CancelToken;
pub use engine::{RetrievalRequest, RetrievalSession, StopReason, get_results};
