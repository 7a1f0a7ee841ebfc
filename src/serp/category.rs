use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Search mode. Selects the `tbm` sub-parameter, where the result list lives
/// in the response, and which fields are exported per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    #[default]
    Web,
    Images,
    News,
    Videos,
    Shopping,
}

#[derive(Debug)]
pub struct CategoryProfile {
    pub tbm: Option<&'static str>,
    pub results_key: &'static str,
    pub export_fields: &'static [&'static str],
    pub label: &'static str,
}

static WEB: CategoryProfile = CategoryProfile {
    tbm: None,
    results_key: "organic_results",
    export_fields: &["title", "link", "snippet", "displayed_link", "position"],
    label: "Web",
};

static IMAGES: CategoryProfile = CategoryProfile {
    tbm: Some("isch"),
    results_key: "images_results",
    export_fields: &["original"],
    label: "Images",
};

static NEWS: CategoryProfile = CategoryProfile {
    tbm: Some("nws"),
    results_key: "news_results",
    export_fields: &["title", "link", "snippet", "source", "date", "position"],
    label: "News",
};

static VIDEOS: CategoryProfile = CategoryProfile {
    tbm: Some("vid"),
    results_key: "video_results",
    export_fields: &["title", "link", "platform", "duration", "position"],
    label: "Videos",
};

static SHOPPING: CategoryProfile = CategoryProfile {
    tbm: Some("shop"),
    results_key: "shopping_results",
    export_fields: &["title", "link", "price", "source", "rating", "reviews", "position"],
    label: "Shopping",
};

impl SearchCategory {
    pub fn profile(self) -> &'static CategoryProfile {
        match self {
            SearchCategory::Web => &WEB,
            SearchCategory::Images => &IMAGES,
            SearchCategory::News => &NEWS,
            SearchCategory::Videos => &VIDEOS,
            SearchCategory::Shopping => &SHOPPING,
        }
    }

    pub fn tbm(self) -> Option<&'static str> {
        self.profile().tbm
    }

    pub fn results_key(self) -> &'static str {
        self.profile().results_key
    }

    pub fn export_fields(self) -> &'static [&'static str] {
        self.profile().export_fields
    }

    pub fn label(self) -> &'static str {
        self.profile().label
    }

    /// Lowercase name used on the command line and in export file names.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchCategory::Web => "web",
            SearchCategory::Images => "images",
            SearchCategory::News => "news",
            SearchCategory::Videos => "videos",
            SearchCategory::Shopping => "shopping",
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
