use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

use super::reachability::{ReachabilityTable, TableKey};

/// Shared get-or-build store of [`ReachabilityTable`]s.
///
/// A table only depends on its [`TableKey`], so it is built at most once per
/// key and handed out as an [`Arc`] afterwards. Lookups take a read lock;
/// building takes the write lock, so concurrent searches with the same key
/// never build twice.
///
/// # Example
///
/// ```
/// use nestris_engine::{Level, ReachabilityCache, TableKey, TapSpeed};
///
/// let cache = ReachabilityCache::new();
/// let key = TableKey { level: Level::Level19, adj_delay: 0, taps: TapSpeed::Hz20.table() };
/// let first = cache.get(key);
/// let second = cache.get(key);
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ReachabilityCache {
    tables: RwLock<HashMap<TableKey, Arc<ReachabilityTable>>>,
}

impl ReachabilityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table for `key`, building it on first use.
    #[must_use]
    pub fn get(&self, key: TableKey) -> Arc<ReachabilityTable> {
        // Tables are immutable once inserted, so a poisoned lock still guards
        // consistent data.
        if let Some(table) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(table);
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(key).or_insert_with(|| {
            debug!(
                "building reachability table: level {}, adjustment delay {}, taps {:?}",
                key.level,
                key.adj_delay,
                key.taps.frames()
            );
            Arc::new(ReachabilityTable::build(key))
        });
        Arc::clone(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
