//! CSV loader.
//!
//! Parses a CSV byte buffer into a [`Dataset`]:
//!
//! 1. read the header row and check that the required columns exist
//! 2. drop exact duplicate rows, keeping the first occurrence
//! 3. parse coordinates and keep every other column as `extra`
//! 4. derive calendar fields from the first recognized timestamp column,
//!    or record a [`LoadWarning::NoTimestampColumn`] if there is none

use std::collections::BTreeSet;

use crime_dash_crime_models::Record;
use sha2::{Digest as _, Sha256};

use crate::parsing::parse_coordinate;
use crate::{DataSource, Dataset, LoadError, LoadWarning, LoaderConfig};

/// Loads and normalizes a dataset from `source`.
///
/// # Errors
///
/// Returns [`LoadError`] if the source cannot be read, the CSV is malformed,
/// required columns are missing, or a coordinate or timestamp cell cannot be
/// parsed.
pub fn load(source: &DataSource, config: &LoaderConfig) -> Result<Dataset, LoadError> {
    let bytes = source.read()?;
    log::debug!("[{}] Read {} bytes", source.label(), bytes.len());
    load_bytes(&bytes, config)
}

/// Loads and normalizes a dataset from a CSV buffer.
///
/// # Errors
///
/// See [`load`].
pub fn load_bytes(bytes: &[u8], config: &LoaderConfig) -> Result<Dataset, LoadError> {
    load_with_fingerprint(bytes, fingerprint(bytes), config)
}

/// SHA-256 hex digest identifying a source's contents.
pub(crate) fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub(crate) fn load_with_fingerprint(
    bytes: &[u8],
    fingerprint: String,
    config: &LoaderConfig,
) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(LoadError::EmptyHeader);
    }

    // ── Required columns ────────────────────────────────────────────
    let required = config.columns.required();
    let indices = required.map(|name| headers.iter().position(|h| h == name));
    let [Some(cat_idx), Some(dist_idx), Some(x_idx), Some(y_idx)] = indices else {
        let fields: Vec<String> = required
            .iter()
            .zip(indices)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| (*name).to_string())
            .collect();
        return Err(LoadError::MissingFields { fields });
    };
    let required_indices = [cat_idx, dist_idx, x_idx, y_idx];

    // ── Rows ────────────────────────────────────────────────────────
    let mut seen: BTreeSet<[u8; 32]> = BTreeSet::new();
    let mut records = Vec::new();
    let mut lines = Vec::new();
    let mut duplicates_removed = 0_usize;

    for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, csv::Position::line);

        if row.len() > headers.len() {
            return Err(LoadError::RowTooLong {
                line,
                expected: headers.len(),
                found: row.len(),
            });
        }

        // Short rows are padded with empty cells.
        let fields: Vec<&str> = (0..headers.len())
            .map(|i| row.get(i).unwrap_or(""))
            .collect();

        if !seen.insert(row_digest(&fields)) {
            duplicates_removed += 1;
            continue;
        }

        let x = coordinate(fields[x_idx], &headers[x_idx], line)?;
        let y = coordinate(fields[y_idx], &headers[y_idx], line)?;

        let extra = headers
            .iter()
            .zip(&fields)
            .enumerate()
            .filter(|(i, _)| !required_indices.contains(i))
            .map(|(_, (header, value))| (header.clone(), (*value).to_owned()))
            .collect();

        records.push(Record {
            category: fields[cat_idx].to_owned(),
            district: fields[dist_idx].to_owned(),
            x,
            y,
            timestamp: None,
            calendar: None,
            extra,
        });
        lines.push(line);
    }

    log::info!(
        "Parsed {} records ({duplicates_removed} duplicates removed)",
        records.len()
    );

    let dataset = Dataset::new(headers, records, lines, fingerprint, duplicates_removed);

    // ── Calendar fields ─────────────────────────────────────────────
    match config.timestamp.detect(dataset.headers()) {
        Some(column) => {
            log::debug!("Using timestamp column '{column}'");
            dataset.derive_calendar(column, &config.timestamp)
        }
        None => {
            let warning = LoadWarning::NoTimestampColumn {
                searched: config.timestamp.aliases.clone(),
            };
            log::warn!("{warning}");
            Ok(dataset.with_warning(warning))
        }
    }
}

/// Identity of a row for duplicate detection. Cells are length-prefixed so
/// that shifting text between adjacent cells changes the digest.
fn row_digest(fields: &[&str]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.finalize().into()
}

fn coordinate(value: &str, column: &str, line: u64) -> Result<f64, LoadError> {
    parse_coordinate(value).ok_or_else(|| LoadError::InvalidCoordinate {
        column: column.to_string(),
        line,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crime_dash_crime_models::{DayOfWeek, Dimension, MonthName};

    use super::*;

    fn load_str(csv: &str) -> Result<Dataset, LoadError> {
        load_bytes(csv.as_bytes(), &LoaderConfig::default())
    }

    #[test]
    fn loads_without_timestamp_and_warns() {
        let dataset = load_str(
            "Category,PdDistrict,X,Y\n\
             ASSAULT,MISSION,-122.41,37.76\n\
             ROBBERY,SOUTHERN,-122.40,37.78\n",
        )
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(!dataset.has_calendar());
        assert!(dataset.records().iter().all(|r| r.calendar.is_none()));
        let [LoadWarning::NoTimestampColumn { searched }] = dataset.warnings() else {
            panic!("expected one warning, got {:?}", dataset.warnings());
        };
        assert_eq!(searched[0], "Dates");
        let expected = vec![Dimension::Category, Dimension::District];
        assert_eq!(dataset.dimensions(), expected);
    }

    #[test]
    fn missing_x_is_named() {
        let csv = "Category,PdDistrict,Y\nASSAULT,MISSION,37.76\n";
        let err = load_str(csv).unwrap_err();
        match err {
            LoadError::MissingFields { fields } => assert_eq!(fields, vec!["X".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn names_every_missing_field_in_required_order() {
        let err = load_str("Y,Descript\n37.76,whatever\n").unwrap_err();
        match err {
            LoadError::MissingFields { fields } => {
                assert_eq!(fields, vec!["Category", "PdDistrict", "X"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn removes_exact_duplicates_stably() {
        let dataset = load_str(
            "Category,PdDistrict,X,Y\n\
             B,MISSION,1,2\n\
             A,MISSION,1,2\n\
             B,MISSION,1,2\n\
             C,PARK,3,4\n\
             A,MISSION,1,2\n",
        )
        .unwrap();

        let categories: Vec<&str> = dataset
            .records()
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(categories, vec!["B", "A", "C"]);
        assert_eq!(dataset.duplicates_removed(), 2);
    }

    #[test]
    fn row_longer_than_header_fails_the_load() {
        let err = load_str(
            "Category,PdDistrict,X,Y\n\
             A,MISSION,1,2\n\
             A,MISSION,1,2,EXTRA\n",
        )
        .unwrap_err();
        assert!(
            matches!(
                err,
                LoadError::RowTooLong {
                    line: 3,
                    expected: 4,
                    found: 5,
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let dataset = load_str(
            "Category,PdDistrict,X,Y,Descript\n\
             A,MISSION,1,2\n",
        )
        .unwrap();
        let extra = &dataset.records()[0].extra;
        assert_eq!(extra.get("Descript").map(String::as_str), Some(""));
    }

    #[test]
    fn surrounding_whitespace_makes_rows_distinct() {
        // The second row's category is " A ".
        let dataset = load_str(
            "Category,PdDistrict,X,Y\n\
             A,MISSION,1,2\n \
             A ,MISSION,1,2\n",
        )
        .unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.duplicates_removed(), 0);
        assert_eq!(dataset.records()[1].category, " A ");
    }

    #[test]
    fn cells_are_compared_individually() {
        let dataset = load_str(
            "Category,PdDistrict,X,Y,Descript,Address\n\
             A,MISSION,1,2,ab,c\n\
             A,MISSION,1,2,a,bc\n",
        )
        .unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn rows_differing_in_extra_columns_are_kept() {
        let dataset = load_str(
            "Category,PdDistrict,X,Y,Descript\n\
             A,MISSION,1,2,first\n\
             A,MISSION,1,2,second\n",
        )
        .unwrap();
        assert_eq!(dataset.len(), 2);
        let extra = &dataset.records()[1].extra;
        assert_eq!(extra.get("Descript").map(String::as_str), Some("second"));
    }

    #[test]
    fn derives_calendar_fields_from_dates() {
        let dataset = load_str(
            "Dates,Category,PdDistrict,X,Y\n\
             2015-05-13 23:53:00,WARRANTS,NORTHERN,-122.42,37.77\n\
             2015-01-04 08:05:00,ASSAULT,MISSION,-122.41,37.76\n",
        )
        .unwrap();

        assert!(dataset.warnings().is_empty());
        assert_eq!(dataset.timestamp_column(), Some("Dates"));
        let cal = dataset.records()[1].calendar.unwrap();
        assert_eq!(cal.hour, 8);
        assert_eq!(cal.day_of_week, DayOfWeek::Sunday);
        assert_eq!(cal.month, MonthName::January);
        assert_eq!(cal.month_number(), 1);
        assert_eq!(cal.year, 2015);
        assert_eq!(cal.day_of_month, 4);
    }

    #[test]
    fn uses_lowercase_alias() {
        let dataset = load_str(
            "date,Category,PdDistrict,X,Y\n\
             2020-02-29,A,MISSION,1,2\n",
        )
        .unwrap();
        assert_eq!(dataset.timestamp_column(), Some("date"));
        let calendar = dataset.records()[0].calendar.unwrap();
        assert_eq!(calendar.day_of_month, 29);
    }

    #[test]
    fn unparseable_timestamp_fails_the_load() {
        let err = load_str(
            "Dates,Category,PdDistrict,X,Y\n\
             2015-05-13 23:53:00,A,NORTHERN,1,2\n\
             ,B,NORTHERN,1,2\n",
        )
        .unwrap_err();
        match err {
            LoadError::TimestampParse {
                column,
                line,
                value,
            } => {
                assert_eq!(column, "Dates");
                assert_eq!(line, 3);
                assert_eq!(value, "");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_coordinate_fails_the_load() {
        let csv = "Category,PdDistrict,X,Y\nA,MISSION,east,2\n";
        let err = load_str(csv).unwrap_err();
        let LoadError::InvalidCoordinate { column, line, .. } = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(column, "X");
        assert_eq!(*line, 2);
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = load_str("").unwrap_err();
        assert!(matches!(err, LoadError::EmptyHeader), "{err:?}");
    }

    #[test]
    fn header_only_input_is_an_empty_dataset() {
        let dataset = load_str("Category,PdDistrict,X,Y\n").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn loads_the_demo_export() {
        let dataset = load(&DataSource::Demo, &LoaderConfig::default()).unwrap();
        assert_eq!(dataset.len(), 36);
        assert_eq!(dataset.duplicates_removed(), 1);
        assert!(dataset.has_calendar());
        assert!(dataset.warnings().is_empty());
        assert_eq!(dataset.fingerprint().len(), 64);
        assert!(dataset.records()[0].extra.contains_key("Descript"));
    }

    #[test]
    fn identical_bytes_load_identically() {
        let bytes = DataSource::Demo.read().unwrap();
        let first = load_bytes(&bytes, &LoaderConfig::default()).unwrap();
        let second = load_bytes(&bytes, &LoaderConfig::default()).unwrap();
        assert_eq!(first, second);
    }
}
