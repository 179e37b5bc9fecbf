#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine for dashboard views.
//!
//! Every public function is a pure function of a [`Dataset`] and its
//! parameters: nothing here mutates the dataset or knows how the result is
//! rendered.
//!
//! [`Dataset`]: crime_dash_dataset::Dataset

pub mod engine;
pub mod locations;

use crime_dash_analytics_models::InvalidRecipeError;
use crime_dash_crime_models::Dimension;
use thiserror::Error;

pub use engine::{aggregate, top_n};
pub use locations::location_counts;

/// Errors that can occur during aggregation. None of them invalidate the
/// dataset the aggregation ran against.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The dimension is not available on this dataset.
    #[error("Unknown dimension '{dimension}': dataset has no calendar fields")]
    UnknownDimension {
        /// The requested dimension.
        dimension: Dimension,
    },

    /// Percentages were requested over zero rows.
    #[error("Cannot compute percentages over an empty dataset")]
    EmptyDataset,

    /// A request parameter is out of range or inconsistent.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<InvalidRecipeError> for AnalyticsError {
    fn from(e: InvalidRecipeError) -> Self {
        Self::InvalidParameter {
            message: e.to_string(),
        }
    }
}
