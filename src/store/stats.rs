//! Store Statistics Module
//!
//! Counts the operations served by the in-memory store.

use serde::Serialize;

// == Store Stats ==
/// Operation counters of a [`MemoryStore`](super::MemoryStore).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Document reads that found a live document
    pub hits: u64,
    /// Document reads that found nothing (or an expired document)
    pub misses: u64,
    /// Create-or-replace writes
    pub upserts: u64,
    /// Remove calls, whether or not the document existed
    pub removes: u64,
    /// Successful full flushes
    pub flushes: u64,
    /// View queries answered
    pub view_queries: u64,
    /// Documents currently held, expired ones included until purged
    pub documents: usize,
}

impl StoreStats {
    // == Constructor ==
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total document reads.
    pub fn gets(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.gets();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_upsert(&mut self) {
        self.upserts += 1;
    }

    pub fn record_remove(&mut self) {
        self.removes += 1;
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    pub fn record_view_query(&mut self) {
        self.view_queries += 1;
    }

    pub fn set_documents(&mut self, count: usize) {
        self.documents = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StoreStats::new();
        assert_eq!(stats.gets(), 0);
        assert_eq!(stats.upserts, 0);
        assert_eq!(stats.removes, 0);
        assert_eq!(stats.documents, 0);
    }

    #[test]
    fn test_hit_rate_no_reads() {
        assert_eq!(StoreStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = StoreStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.gets(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_write_counters() {
        let mut stats = StoreStats::new();
        stats.record_upsert();
        stats.record_remove();
        stats.record_remove();
        stats.record_flush();
        stats.record_view_query();
        assert_eq!(stats.upserts, 1);
        assert_eq!(stats.removes, 2);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.view_queries, 1);
    }
}
