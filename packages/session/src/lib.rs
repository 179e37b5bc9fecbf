#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One dashboard session: the loaded dataset and the views computed from it.
//!
//! A [`Session`] owns a [`DatasetCache`], so reloading the same source on
//! every interaction costs a hash rather than a parse. Views are evaluated
//! against the current dataset and never modify it.

use std::sync::Arc;

use crime_dash_analytics::AnalyticsError;
use crime_dash_analytics_models::{AggregationRequest, LocationCount, Recipe, SummaryTable};
use crime_dash_dataset::{DataSource, Dataset, DatasetCache, LoadError, LoaderConfig};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The dataset could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A view could not be computed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// A view was requested before any dataset was loaded.
    #[error("No dataset loaded")]
    NoDataset,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Dataset owner for one user session.
#[derive(Debug, Default)]
pub struct Session {
    cache: DatasetCache,
}

impl Session {
    /// Creates a session that loads datasets with `config`.
    #[must_use]
    pub const fn new(config: LoaderConfig) -> Self {
        Self {
            cache: DatasetCache::new(config),
        }
    }

    /// Loads `source`, reusing the current dataset if its bytes are
    /// unchanged.
    ///
    /// # Errors
    ///
    /// * [`SessionError::Load`] if the source cannot be read or parsed. The
    ///   session is left without a dataset.
    pub fn load(&mut self, source: &DataSource) -> Result<Arc<Dataset>, SessionError> {
        Ok(self.cache.load(source)?)
    }

    /// The current dataset, if one is loaded.
    #[must_use]
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.cache.current()
    }

    /// Number of times a source was actually parsed in this session.
    #[must_use]
    pub const fn parse_count(&self) -> u64 {
        self.cache.parse_count()
    }

    /// Evaluates `request` against the current dataset.
    ///
    /// # Errors
    ///
    /// * [`SessionError::NoDataset`] if nothing is loaded
    /// * [`SessionError::Analytics`] if the request is invalid for the
    ///   dataset
    pub fn aggregate(&self, request: &AggregationRequest) -> Result<SummaryTable, SessionError> {
        let dataset = self.require_dataset()?;
        Ok(crime_dash_analytics::aggregate(&dataset, request)?)
    }

    /// Evaluates a named dashboard view. The table carries the view's title.
    ///
    /// # Errors
    ///
    /// * [`SessionError::NoDataset`] if nothing is loaded
    /// * [`SessionError::Analytics`] if the recipe's parameters are out of
    ///   range or the dataset lacks a dimension the view needs
    pub fn run(&self, recipe: &Recipe) -> Result<SummaryTable, SessionError> {
        let request = recipe.request().map_err(AnalyticsError::from)?;
        let mut table = self.aggregate(&request)?;
        table.metadata.title = recipe.title();
        Ok(table)
    }

    /// Incident hotspots of the current dataset.
    ///
    /// # Errors
    ///
    /// * [`SessionError::NoDataset`] if nothing is loaded
    /// * [`SessionError::Analytics`] if `top_n` is zero
    pub fn locations(&self, top_n: Option<usize>) -> Result<Vec<LocationCount>, SessionError> {
        let dataset = self.require_dataset()?;
        Ok(crime_dash_analytics::location_counts(&dataset, top_n)?)
    }

    fn require_dataset(&self) -> Result<Arc<Dataset>, SessionError> {
        self.dataset().ok_or_else(|| {
            log::warn!("View requested before a dataset was loaded");
            SessionError::NoDataset
        })
    }
}
