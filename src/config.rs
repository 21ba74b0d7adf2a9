//! Configuration Module
//!
//! Per-cache options and the registry-wide configuration.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Options applied to a single cache at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// TTL in seconds for every document written by the cache, 0 = no expiry
    pub ttl: u32,
    /// Clear by flushing the whole store instead of evicting the namespace
    pub always_flush: bool,
}

impl CacheOptions {
    /// Options with the given TTL and scoped clearing.
    pub fn with_ttl(ttl: u32) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

/// Registry configuration.
///
/// Every field has a default, so a partial document deserializes fine:
///
/// ```
/// let config: doc_cache::RegistryConfig =
///     serde_json::from_str(r#"{"ttls": {"sessions": 600}}"#).unwrap();
/// assert_eq!(config.ttl_for("sessions"), 600);
/// assert_eq!(config.ttl_for("users"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// TTL in seconds per cache name
    pub ttls: HashMap<String, u32>,
    /// Names of caches that start in always-flush mode
    pub always_flush: HashSet<String>,
}

impl RegistryConfig {
    /// Configuration with only TTLs set.
    pub fn from_ttls(ttls: HashMap<String, u32>) -> Self {
        Self {
            ttls,
            always_flush: HashSet::new(),
        }
    }

    /// TTL configured for `name`, 0 when absent.
    pub fn ttl_for(&self, name: &str) -> u32 {
        self.ttls.get(name).copied().unwrap_or(0)
    }

    /// Construction options for the cache called `name`.
    pub fn options_for(&self, name: &str) -> CacheOptions {
        CacheOptions {
            ttl: self.ttl_for(name),
            always_flush: self.always_flush.contains(name),
        }
    }
}
