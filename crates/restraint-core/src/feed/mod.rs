//! Progressive feed reveal ("mindful scroll").
//!
//! Feed items start hidden; each "Show More" action raises the visible budget
//! by a fixed increment. The budget is per page load and never persisted.
//! Which elements count as feed items is a per-host CSS selector, looked up
//! through [`SelectorMap`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sites::canonical_host;

const BSKY_FEED_SELECTOR: &str = r#"div:not(:has(.r-hvic4v *)) > div > div:is([data-testid*="FeedPage-feed"], [data-testid*="postsFeed"]) > div[data-testid*="-flatlist"] > div > div > div > div[data-testid]"#;
const LINKEDIN_FEED_SELECTOR: &str =
    r#".scaffold-finite-scroll__content > div > div[data-id^="urn:li:activity"]"#;

/// Feed-limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Items revealed per "Show More" action.
    #[serde(default = "default_posts_increment")]
    pub posts_increment: usize,
    /// Feed-item CSS selector per host.
    #[serde(default = "default_selectors")]
    pub selectors: HashMap<String, String>,
}

fn default_posts_increment() -> usize {
    1
}

fn default_selectors() -> HashMap<String, String> {
    HashMap::from([
        ("bsky.app".to_string(), BSKY_FEED_SELECTOR.to_string()),
        (
            "linkedin.com".to_string(),
            LINKEDIN_FEED_SELECTOR.to_string(),
        ),
    ])
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            posts_increment: default_posts_increment(),
            selectors: default_selectors(),
        }
    }
}

/// Per-host feed selector lookup.
#[derive(Debug, Clone)]
pub struct SelectorMap {
    selectors: HashMap<String, String>,
}

impl SelectorMap {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            selectors: config
                .selectors
                .iter()
                .map(|(host, selector)| (canonical_host(host).to_string(), selector.clone()))
                .collect(),
        }
    }

    /// Selector for the host's feed items, if the host is supported.
    pub fn selector_for(&self, host: &str) -> Option<&str> {
        self.selectors.get(canonical_host(host)).map(String::as_str)
    }

    pub fn is_supported(&self, host: &str) -> bool {
        self.selector_for(host).is_some()
    }
}

/// Visible/hidden split of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCut {
    pub shown: usize,
    pub hidden: usize,
}

/// Progressive-reveal budget over an ordered feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedLimiter {
    visible: usize,
    increment: usize,
}

impl FeedLimiter {
    /// A fresh limiter with nothing revealed. A zero increment is treated
    /// as one so "Show More" always makes progress.
    pub fn new(increment: usize) -> Self {
        Self {
            visible: 0,
            increment: increment.max(1),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.posts_increment)
    }

    /// Number of items currently allowed to show.
    pub fn visible(&self) -> usize {
        self.visible
    }

    /// "Show More": raise the budget by the configured increment.
    /// Returns the new budget.
    pub fn show_more(&mut self) -> usize {
        self.visible += self.increment;
        self.visible
    }

    /// Whether the item at `index` (feed order) may be shown.
    pub fn is_visible(&self, index: usize) -> bool {
        index < self.visible
    }

    /// Split a feed of `total` items into shown and hidden counts.
    pub fn apply(&self, total: usize) -> FeedCut {
        let shown = self.visible.min(total);
        FeedCut {
            shown,
            hidden: total - shown,
        }
    }
}
