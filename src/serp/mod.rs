//! SerpApi access: search categories, response types, and the HTTP client.

pub mod category;
pub mod client;
pub mod types;

pub use category::SearchCategory;
pub use client::{
    LOCALE_PARAMS, PageRequest, RESULTS_PER_PAGE, SearchClient, SerpClient, SerpError,
};
pub use types::{ResultItem, SearchResponse};
