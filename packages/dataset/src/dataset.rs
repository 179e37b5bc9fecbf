//! The normalized, deduplicated incident table.

use crime_dash_crime_models::{CalendarFields, Dimension, Record};

use crate::config::TimestampConfig;
use crate::parsing::parse_timestamp;
use crate::{LoadError, LoadWarning};

/// A validated collection of unique [`Record`]s.
///
/// Either every record carries derived [`CalendarFields`] or none does.
/// A `Dataset` is never mutated in place: deriving calendar fields consumes
/// it and returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
    /// Source line of each record, parallel to `records`.
    lines: Vec<u64>,
    timestamp_column: Option<String>,
    warnings: Vec<LoadWarning>,
    fingerprint: String,
    duplicates_removed: usize,
}

impl Dataset {
    pub(crate) const fn new(
        headers: Vec<String>,
        records: Vec<Record>,
        lines: Vec<u64>,
        fingerprint: String,
        duplicates_removed: usize,
    ) -> Self {
        Self {
            headers,
            records,
            lines,
            timestamp_column: None,
            warnings: Vec::new(),
            fingerprint,
            duplicates_removed,
        }
    }

    /// Builds a dataset directly from records, without calendar fields.
    ///
    /// Useful for callers that already hold parsed incidents. The
    /// fingerprint is empty and line numbers count from 2 as if the records
    /// followed a header row.
    #[must_use]
    pub fn from_records(headers: Vec<String>, records: Vec<Record>) -> Self {
        let lines = (2..).take(records.len()).collect();
        Self::new(headers, records, lines, String::new(), 0)
    }

    pub(crate) fn with_warning(mut self, warning: LoadWarning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Parses `column` for every record and returns a new dataset with
    /// timestamps and calendar fields filled in.
    ///
    /// # Errors
    ///
    /// * [`LoadError::MissingFields`] if `column` is not a header
    /// * [`LoadError::TimestampParse`] if any value fails to parse; no
    ///   record is derived in that case
    pub fn derive_calendar(
        self,
        column: &str,
        config: &TimestampConfig,
    ) -> Result<Self, LoadError> {
        if !self.headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingFields {
                fields: vec![column.to_string()],
            });
        }

        let Self {
            headers,
            records,
            lines,
            warnings,
            fingerprint,
            duplicates_removed,
            ..
        } = self;

        let records = records
            .into_iter()
            .zip(&lines)
            .map(|(record, &line)| {
                let timestamp = {
                    let raw = record.extra.get(column).map_or("", String::as_str);
                    parse_timestamp(raw, config).ok_or_else(|| LoadError::TimestampParse {
                        column: column.to_string(),
                        line,
                        value: raw.to_string(),
                    })?
                };
                Ok(Record {
                    timestamp: Some(timestamp),
                    calendar: Some(CalendarFields::from_timestamp(&timestamp)),
                    ..record
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        log::debug!(
            "Derived calendar fields for {} records from '{column}'",
            records.len()
        );

        Ok(Self {
            headers,
            records,
            lines,
            timestamp_column: Some(column.to_string()),
            warnings,
            fingerprint,
            duplicates_removed,
        })
    }

    /// All records, in source order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Source headers, in source order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The timestamp column calendar fields were derived from, if any.
    #[must_use]
    pub fn timestamp_column(&self) -> Option<&str> {
        self.timestamp_column.as_deref()
    }

    /// Whether every record carries calendar fields.
    #[must_use]
    pub const fn has_calendar(&self) -> bool {
        self.timestamp_column.is_some()
    }

    /// Whether `dimension` can be grouped on for this dataset.
    #[must_use]
    pub const fn supports(&self, dimension: Dimension) -> bool {
        !dimension.is_calendar() || self.has_calendar()
    }

    /// Dimensions available for grouping.
    #[must_use]
    pub fn dimensions(&self) -> Vec<Dimension> {
        Dimension::all()
            .iter()
            .copied()
            .filter(|d| self.supports(*d))
            .collect()
    }

    /// Non-fatal warnings produced while loading.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// SHA-256 hex digest of the source bytes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of exact duplicate rows dropped on load.
    #[must_use]
    pub const fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }
}
