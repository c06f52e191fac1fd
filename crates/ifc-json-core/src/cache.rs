// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converted documents by load source

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A cached document with the entity count of its model
#[derive(Clone, Debug)]
pub struct CachedDocument {
    pub document: Arc<Value>,
    pub entity_count: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CachedDocument>,
    latest: Option<String>,
}

/// Source identifier → most recent document
///
/// Entries are replaced on reload and never evicted. Readers get shared
/// handles, so a writer swapping an entry never disturbs a render in flight.
#[derive(Debug, Default)]
pub struct DocumentCache {
    state: RwLock<CacheState>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document and make it the latest
    pub fn insert(
        &self,
        source: impl Into<String>,
        document: Value,
        entity_count: usize,
    ) -> Arc<Value> {
        let source = source.into();
        let document = Arc::new(document);
        let mut state = self.state.write();
        state.entries.insert(
            source.clone(),
            CachedDocument {
                document: document.clone(),
                entity_count,
            },
        );
        state.latest = Some(source);
        document
    }

    pub fn get(&self, source: &str) -> Option<Arc<Value>> {
        self.state
            .read()
            .entries
            .get(source)
            .map(|entry| entry.document.clone())
    }

    /// Most recently stored document
    pub fn latest(&self) -> Option<Arc<Value>> {
        let state = self.state.read();
        let source = state.latest.as_ref()?;
        state.entries.get(source).map(|entry| entry.document.clone())
    }

    pub fn latest_source(&self) -> Option<String> {
        self.state.read().latest.clone()
    }

    /// Cached sources with entity counts, sorted by source
    pub fn sources(&self) -> Vec<(String, usize)> {
        let mut sources: Vec<_> = self
            .state
            .read()
            .entries
            .iter()
            .map(|(source, entry)| (source.clone(), entry.entity_count))
            .collect();
        sources.sort();
        sources
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_cache() {
        let cache = DocumentCache::new();
        assert!(cache.is_empty());
        assert!(cache.latest().is_none());
        assert!(cache.get("a.ifc").is_none());
    }

    #[test]
    fn test_latest_follows_inserts() {
        let cache = DocumentCache::new();
        cache.insert("a.ifc", json!({"n": 1}), 10);
        cache.insert("b.ifc", json!({"n": 2}), 20);
        assert_eq!(cache.latest().map(|d| d["n"].clone()), Some(json!(2)));

        cache.insert("a.ifc", json!({"n": 3}), 12);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.latest_source().as_deref(), Some("a.ifc"));
        assert_eq!(cache.get("a.ifc").map(|d| d["n"].clone()), Some(json!(3)));
        assert_eq!(
            cache.sources(),
            vec![("a.ifc".to_string(), 12), ("b.ifc".to_string(), 20)]
        );
    }

    #[test]
    fn test_reader_keeps_replaced_document() {
        let cache = DocumentCache::new();
        let held = cache.insert("a.ifc", json!({"n": 1}), 1);
        cache.insert("a.ifc", json!({"n": 2}), 1);
        assert_eq!(held["n"], 1);
    }
}
