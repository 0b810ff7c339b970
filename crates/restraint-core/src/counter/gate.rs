//! Gate decision and display banding.
//!
//! The blocking condition is deliberately asymmetric: the overlay is active
//! whenever the counter is at or above zero, independent of whether an
//! activation is stored. Only a sufficiently aged activation opens the gate.

use serde::{Deserialize, Serialize};

/// Title prefix applied to blocked pages, so notification counts in the tab
/// title stay hidden while the overlay is up.
pub const BLOCKED_TITLE_PREFIX: &str = "[Blocked]";
const BLOCKED_TITLE_SEPARATOR: &str = "=====================";

/// Access is allowed once the counter goes negative.
pub fn is_open(counter: i64) -> bool {
    counter < 0
}

/// Overlay condition: blocked while the counter is at or above zero.
pub fn should_block(counter: i64) -> bool {
    counter >= 0
}

/// Display band for the counter. The threshold breakpoint only affects how
/// the host renders the control surface, never the gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLevel {
    /// Counter above the threshold: idle/locked.
    Locked,
    /// Counter between zero and the threshold: counting down.
    Cooling,
    /// Counter negative: access allowed.
    Open,
}

impl DisplayLevel {
    /// Get numeric level value (0-2)
    pub fn as_u8(self) -> u8 {
        match self {
            DisplayLevel::Locked => 0,
            DisplayLevel::Cooling => 1,
            DisplayLevel::Open => 2,
        }
    }

    /// Convert from numeric level value
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => DisplayLevel::Locked,
            1 => DisplayLevel::Cooling,
            _ => DisplayLevel::Open,
        }
    }

    /// Band for a counter value at a given threshold.
    pub fn for_counter(counter: i64, threshold: i64) -> Self {
        if counter < 0 {
            DisplayLevel::Open
        } else if counter <= threshold {
            DisplayLevel::Cooling
        } else {
            DisplayLevel::Locked
        }
    }
}

/// Prefix a blocked page's title with the marker. Idempotent.
pub fn mark_blocked(title: &str) -> String {
    if title.starts_with(BLOCKED_TITLE_PREFIX) {
        title.to_string()
    } else {
        format!("{BLOCKED_TITLE_PREFIX}{BLOCKED_TITLE_SEPARATOR}{title}")
    }
}

/// Strip the blocked marker from a page title.
pub fn clear_blocked(title: &str) -> String {
    match title.strip_prefix(BLOCKED_TITLE_PREFIX) {
        Some(rest) => rest.trim_start_matches('=').to_string(),
        None => title.to_string(),
    }
}
