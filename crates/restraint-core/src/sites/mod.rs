//! Restricted-site policy.
//!
//! A site is restricted iff its hostname (after stripping one leading `www.`
//! label) is in the restricted set and no allow-list pattern matches the full
//! URL. The predicate is evaluated independently of the countdown engine and
//! decides whether the gate applies to the current page at all.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Site lists, as configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    /// Hostnames the gate applies to, matched exactly after `www.` stripping.
    #[serde(default = "default_restricted_hosts")]
    pub restricted_hosts: Vec<String>,
    /// Regular expressions matched against the full URL; a match exempts the
    /// page even on a restricted host (e.g. a specific post reached from a
    /// search result).
    #[serde(default = "default_allow_patterns")]
    pub allow_patterns: Vec<String>,
}

fn default_restricted_hosts() -> Vec<String> {
    [
        "facebook.com",
        "twitter.com",
        "instagram.com",
        "linkedin.com",
        "youtube.com",
        "tiktok.com",
        "snapchat.com",
        "reddit.com",
        "pinterest.com",
        "bsky.app",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_allow_patterns() -> Vec<String> {
    vec![r"reddit\.com/r/.*/comments".to_string()]
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            restricted_hosts: default_restricted_hosts(),
            allow_patterns: default_allow_patterns(),
        }
    }
}

/// Compiled policy with cached allow regexes.
#[derive(Debug, Clone)]
pub struct SitePolicy {
    restricted_hosts: HashSet<String>,
    allow_patterns: Vec<Regex>,
}

impl SitePolicy {
    /// Compile the configured lists into a policy.
    ///
    /// # Errors
    /// Returns an error if any allow pattern is not a valid regex.
    pub fn compile(config: &SitesConfig) -> Result<Self, ConfigError> {
        let mut allow_patterns = Vec::with_capacity(config.allow_patterns.len());
        for pattern in &config.allow_patterns {
            let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                key: "sites.allow_patterns".to_string(),
                message: format!("invalid pattern '{pattern}': {e}"),
            })?;
            allow_patterns.push(re);
        }
        Ok(Self {
            restricted_hosts: config
                .restricted_hosts
                .iter()
                .map(|h| canonical_host(h).to_string())
                .collect(),
            allow_patterns,
        })
    }

    /// Compile the default site lists.
    pub fn default_policy() -> Self {
        // The built-in patterns are known-good; compile cannot fail on them.
        Self::compile(&SitesConfig::default()).unwrap_or(Self {
            restricted_hosts: HashSet::new(),
            allow_patterns: Vec::new(),
        })
    }

    /// Whether the gate applies to this URL.
    pub fn is_restricted(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if !self.restricted_hosts.contains(canonical_host(host)) {
            return false;
        }
        !self
            .allow_patterns
            .iter()
            .any(|re| re.is_match(url.as_str()))
    }

    /// Convenience over a raw URL string.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid URL.
    pub fn is_restricted_url(&self, url: &str) -> Result<bool, url::ParseError> {
        Ok(self.is_restricted(&Url::parse(url)?))
    }
}

/// Strip one leading `www.` label from a hostname.
pub fn canonical_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
