//! Schema cache with periodic rediscovery
//!
//! Discovery is repeated every `refresh_every` calls to [`SchemaCache::get`];
//! in between, callers receive the same shared schema.

use std::sync::{Arc, RwLock};

use super::{discover_from, Schema};
use crate::aggregator_core::record::LogRecord;

pub const DEFAULT_REFRESH_EVERY: usize = 10;

#[derive(Debug, Default)]
struct CacheState {
    current: Option<Arc<Schema>>,
    cycle_count: usize,
}

#[derive(Debug)]
pub struct SchemaCache {
    state: RwLock<CacheState>,
    refresh_every: usize,
}

impl SchemaCache {
    pub fn new(refresh_every: usize) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            refresh_every,
        }
    }

    pub fn refresh_every(&self) -> usize {
        self.refresh_every
    }

    /// Return the cached schema, rediscovering from `records` when empty or due
    pub fn get(&self, records: &[LogRecord]) -> Arc<Schema> {
        self.get_from(records)
    }

    /// Like [`SchemaCache::get`], but only pulls records from the iterator when
    /// rediscovery actually happens
    pub fn get_from<'a, I>(&self, records: I) -> Arc<Schema>
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.cycle_count += 1;

        if let Some(schema) = state.current.as_ref() {
            if state.cycle_count < self.refresh_every {
                return Arc::clone(schema);
            }
        }

        let schema = Arc::new(discover_from(records));
        log::info!(
            "🧬 Schema refreshed: {} fields (every {} cycles)",
            schema.fields.len(),
            self.refresh_every
        );
        state.current = Some(Arc::clone(&schema));
        state.cycle_count = 0;
        schema
    }

    pub fn current(&self) -> Option<Arc<Schema>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.current.clone()
    }

    /// Drop the cached schema so the next `get` rediscovers
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.current = None;
        state.cycle_count = 0;
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_EVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::record::LogAttributes;
    use crate::schema::discovery::MAX_SAMPLE_SIZE;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn record(status: &str, host: Option<&str>) -> LogRecord {
        LogRecord {
            id: None,
            attributes: Some(LogAttributes {
                status: Some(status.to_string()),
                host: host.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_cache_refreshes_every_n() {
        let cache = SchemaCache::new(3);
        let first = vec![record("error", None)];
        let second = vec![record("error", Some("web-01"))];

        let s1 = cache.get(&first);
        let s2 = cache.get(&second);
        assert!(Arc::ptr_eq(&s1, &s2));
        assert!(!s2.has_field("host"));

        let s3 = cache.get(&second);
        assert!(!s3.has_field("host"));

        let s4 = cache.get(&second);
        assert!(s4.has_field("host"));
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = SchemaCache::new(100);
        assert!(cache.current().is_none());

        cache.get(&[record("error", None)]);
        assert!(cache.current().is_some());

        cache.invalidate();
        assert!(cache.current().is_none());

        let rediscovered = cache.get(&[record("error", Some("web-02"))]);
        assert!(rediscovered.has_field("host"));
    }

    #[test]
    fn test_cache_concurrent_access() {
        let cache = Arc::new(SchemaCache::new(2));
        let records: Vec<LogRecord> = (0..10).map(|_| record("error", Some("web-01"))).collect();
        let records = Arc::new(records);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let records = Arc::clone(&records);
                thread::spawn(move || {
                    let schema = cache.get(&records);
                    assert!(schema.has_field("status"));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.current().is_some());
    }

    #[test]
    fn test_cache_hit_does_not_pull_records() {
        let cache = SchemaCache::new(5);
        let records: Vec<LogRecord> = (0..500).map(|_| record("error", Some("web-01"))).collect();

        let pulled = AtomicUsize::new(0);
        cache.get_from(records.iter().inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(pulled.load(Ordering::SeqCst), MAX_SAMPLE_SIZE);

        pulled.store(0, Ordering::SeqCst);
        cache.get_from(records.iter().inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(pulled.load(Ordering::SeqCst), 0);
    }
}
