#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation request and summary table types.
//!
//! An [`AggregationRequest`] describes one dashboard view: which dimension
//! to group by, an optional second dimension to split each group by, an
//! optional top-N restriction, and whether values are counts or
//! percentages. The engine answers with a [`SummaryTable`] that any chart
//! renderer can consume. [`Recipe`] names the fixed set of views the
//! dashboard offers.

pub mod recipe;

use std::collections::BTreeSet;

use crime_dash_crime_models::{Dimension, DimensionValue};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use recipe::{InvalidRecipeError, Recipe};

/// How percentages are normalized.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Normalization {
    /// Share of every incident in the dataset.
    Global,
    /// Share within each primary-dimension group. Requires a secondary
    /// dimension.
    PerGroup,
}

/// Whether summary values are raw counts or percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Number of incidents.
    Count,
    /// Percentage of incidents, normalized as given.
    Percentage(Normalization),
}

impl ValueMode {
    /// Axis label for the value column.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Percentage(_) => "Percentage",
        }
    }
}

/// Ordering of summary rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RowOrder {
    /// Highest count first; ties keep first-seen order.
    CountDescending,
    /// Lowest count first; ties keep first-seen order.
    CountAscending,
    /// By display label.
    Alphabetical,
    /// Canonical order of the dimension: Monday to Sunday, January to
    /// December, hours and years ascending, text lexicographic.
    Calendar,
    /// Order of first appearance in the dataset.
    FirstSeen,
}

/// One aggregation to evaluate against a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    /// Dimension to group by.
    pub primary: Dimension,
    /// Optional dimension to split each primary group by.
    pub secondary: Option<Dimension>,
    /// Keep only the N most frequent primary values.
    pub top_n: Option<usize>,
    /// Counts or percentages.
    pub value_mode: ValueMode,
    /// Ordering of primary groups.
    pub primary_order: RowOrder,
    /// Ordering of secondary values within each primary group.
    pub secondary_order: RowOrder,
}

impl AggregationRequest {
    /// Creates a count request over `primary`, most frequent first.
    #[must_use]
    pub const fn new(primary: Dimension) -> Self {
        Self {
            primary,
            secondary: None,
            top_n: None,
            value_mode: ValueMode::Count,
            primary_order: RowOrder::CountDescending,
            secondary_order: RowOrder::Calendar,
        }
    }

    /// Splits each primary group by `secondary`.
    #[must_use]
    pub const fn with_secondary(mut self, secondary: Dimension) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Restricts the primary dimension to its `n` most frequent values.
    #[must_use]
    pub const fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Sets the value mode.
    #[must_use]
    pub const fn with_value_mode(mut self, value_mode: ValueMode) -> Self {
        self.value_mode = value_mode;
        self
    }

    /// Switches to percentages normalized as given.
    #[must_use]
    pub const fn as_percentage(self, normalization: Normalization) -> Self {
        self.with_value_mode(ValueMode::Percentage(normalization))
    }

    /// Sets the ordering of primary groups.
    #[must_use]
    pub const fn ordered_by(mut self, order: RowOrder) -> Self {
        self.primary_order = order;
        self
    }

    /// Sets the ordering of secondary values within each group.
    #[must_use]
    pub const fn with_secondary_order(mut self, order: RowOrder) -> Self {
        self.secondary_order = order;
        self
    }

    /// Default chart title for this request.
    #[must_use]
    pub fn title(&self) -> String {
        let mut title = match self.secondary {
            Some(secondary) => format!(
                "Crime Incidents by {} and {}",
                self.primary.label(),
                secondary.label()
            ),
            None => format!("Crime Incidents by {}", self.primary.label()),
        };
        if let Some(n) = self.top_n {
            title.push_str(&format!(" (Top {n})"));
        }
        if matches!(self.value_mode, ValueMode::Percentage(_)) {
            title.push_str(" (%)");
        }
        title
    }
}

/// One row of a [`SummaryTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    /// Primary dimension value.
    pub primary: DimensionValue,
    /// Secondary dimension value, for two-dimension requests.
    pub secondary: Option<DimensionValue>,
    /// Number of incidents in this cell.
    pub count: u64,
    /// The count, or its percentage share.
    pub value: f64,
}

/// Labels and context a renderer needs alongside the rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetadata {
    /// Primary dimension.
    pub primary: Dimension,
    /// Secondary dimension, if any.
    pub secondary: Option<Dimension>,
    /// `"Count"` or `"Percentage"`.
    pub value_label: String,
    /// Chart title.
    pub title: String,
    /// Rows in the dataset the table was computed from.
    pub total_rows: u64,
}

impl SummaryMetadata {
    /// Axis label of the primary dimension.
    #[must_use]
    pub const fn primary_label(&self) -> &'static str {
        self.primary.label()
    }

    /// Axis label of the secondary dimension, if any.
    #[must_use]
    pub fn secondary_label(&self) -> Option<&'static str> {
        self.secondary.map(Dimension::label)
    }
}

/// The result of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTable {
    /// Labels and context.
    pub metadata: SummaryMetadata,
    /// Ordered rows.
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the count column.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Sum of the value column.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    /// Distinct primary values, in row order.
    #[must_use]
    pub fn primary_values(&self) -> Vec<&DimensionValue> {
        let mut values: Vec<&DimensionValue> = Vec::new();
        for row in &self.rows {
            if !values.contains(&&row.primary) {
                values.push(&row.primary);
            }
        }
        values
    }

    /// Rows belonging to one primary value.
    pub fn group<'a>(
        &'a self,
        primary: &'a DimensionValue,
    ) -> impl Iterator<Item = &'a SummaryRow> + 'a {
        self.rows.iter().filter(move |r| &r.primary == primary)
    }

    /// Dense matrix form of a two-dimension table, for heatmaps.
    ///
    /// Rows follow the table's primary order, columns follow the secondary
    /// dimension's canonical order, and absent pairs are `0.0`. Returns
    /// `None` for single-dimension tables.
    #[must_use]
    pub fn pivot(&self) -> Option<CrossTab> {
        let column_dimension = self.metadata.secondary?;

        let rows: Vec<DimensionValue> = self.primary_values().into_iter().cloned().collect();
        let columns: Vec<DimensionValue> = self
            .rows
            .iter()
            .filter_map(|r| r.secondary.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![vec![0.0; columns.len()]; rows.len()];
        for row in &self.rows {
            let Some(secondary) = &row.secondary else {
                continue;
            };
            if let (Some(i), Some(j)) = (
                rows.iter().position(|v| v == &row.primary),
                columns.iter().position(|v| v == secondary),
            ) {
                cells[i][j] = row.value;
            }
        }

        Some(CrossTab {
            row_dimension: self.metadata.primary,
            column_dimension,
            value_label: self.metadata.value_label.clone(),
            rows,
            columns,
            cells,
        })
    }
}

/// Dense cross-tabulation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTab {
    /// Dimension along the rows.
    pub row_dimension: Dimension,
    /// Dimension along the columns.
    pub column_dimension: Dimension,
    /// `"Count"` or `"Percentage"`.
    pub value_label: String,
    /// Row labels.
    pub rows: Vec<DimensionValue>,
    /// Column labels.
    pub columns: Vec<DimensionValue>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<f64>>,
}

/// Count of incidents for one dimension value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueCount {
    /// The dimension value.
    pub value: DimensionValue,
    /// Number of incidents.
    pub count: u64,
}

/// Incident count at one exact location for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCount {
    /// X coordinate (longitude).
    pub x: f64,
    /// Y coordinate (latitude).
    pub y: f64,
    /// Crime category.
    pub category: String,
    /// Number of incidents.
    pub count: u64,
}
