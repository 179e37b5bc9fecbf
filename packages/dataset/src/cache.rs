//! Single-slot dataset cache keyed by source content.
//!
//! Loading is pure given identical bytes, so the cache stores the most
//! recently loaded dataset together with the SHA-256 of its source. Loading
//! the same bytes again hands back the cached [`Arc`]; loading anything else
//! re-parses and replaces the slot.

use std::sync::Arc;

use crate::loader::{fingerprint, load_with_fingerprint};
use crate::{DataSource, Dataset, LoadError, LoaderConfig};

/// Memoizes [`crate::load`] for one session.
#[derive(Debug, Default)]
pub struct DatasetCache {
    config: LoaderConfig,
    current: Option<Arc<Dataset>>,
    parse_count: u64,
}

impl DatasetCache {
    /// Creates an empty cache that loads with `config`.
    #[must_use]
    pub const fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            current: None,
            parse_count: 0,
        }
    }

    /// Returns the dataset for `source`, parsing only if its contents
    /// differ from the cached dataset's.
    ///
    /// A failed load leaves the cache empty.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the source cannot be read or parsed.
    pub fn load(&mut self, source: &DataSource) -> Result<Arc<Dataset>, LoadError> {
        let bytes = source.read()?;
        let key = fingerprint(&bytes);

        if let Some(dataset) = &self.current
            && dataset.fingerprint() == key
        {
            log::debug!("[{}] Cache hit ({key})", source.label());
            return Ok(Arc::clone(dataset));
        }

        log::debug!("[{}] Cache miss ({key}), parsing", source.label());
        self.current = None;
        self.parse_count += 1;

        let dataset = Arc::new(load_with_fingerprint(&bytes, key, &self.config)?);
        log::info!("[{}] Loaded {} records", source.label(), dataset.len());
        self.current = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// The cached dataset, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.current.clone()
    }

    /// Drops the cached dataset.
    pub fn invalidate(&mut self) {
        if self.current.take().is_some() {
            log::debug!("Dataset cache invalidated");
        }
    }

    /// Number of times a source was actually parsed.
    #[must_use]
    pub const fn parse_count(&self) -> u64 {
        self.parse_count
    }

    /// The configuration used for parsing.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_CSV: &str = "Category,PdDistrict,X,Y\nA,MISSION,1,2\nB,PARK,3,4\n";

    #[test]
    fn reloading_identical_bytes_does_not_reparse() {
        let mut cache = DatasetCache::default();

        let first = cache.load(&DataSource::Demo).unwrap();
        let second = cache.load(&DataSource::Demo).unwrap();

        assert_eq!(cache.parse_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn same_content_from_another_source_hits_the_cache() {
        let mut cache = DatasetCache::default();
        cache.load(&DataSource::upload("a.csv", SMALL_CSV)).unwrap();
        cache.load(&DataSource::upload("b.csv", SMALL_CSV)).unwrap();
        assert_eq!(cache.parse_count(), 1);
    }

    #[test]
    fn new_source_invalidates_and_reparses() {
        let mut cache = DatasetCache::default();

        let demo = cache.load(&DataSource::Demo).unwrap();
        let small = DataSource::upload("small.csv", SMALL_CSV);
        let upload = cache.load(&small).unwrap();

        assert_eq!(cache.parse_count(), 2);
        assert_eq!(upload.len(), 2);
        assert_ne!(demo.fingerprint(), upload.fingerprint());
        assert_eq!(cache.current().map(|d| d.len()), Some(2));
    }

    #[test]
    fn failed_load_clears_the_slot() {
        let mut cache = DatasetCache::default();
        cache.load(&DataSource::Demo).unwrap();

        let err = cache
            .load(&DataSource::upload("bad.csv", "Category,X\nA,1\n"))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingFields { .. }), "{err:?}");
        assert!(cache.current().is_none());
    }

    #[test]
    fn explicit_invalidation_forces_reparse() {
        let mut cache = DatasetCache::default();
        cache.load(&DataSource::Demo).unwrap();
        cache.invalidate();
        assert!(cache.current().is_none());
        cache.load(&DataSource::Demo).unwrap();
        assert_eq!(cache.parse_count(), 2);
    }
}
