//! Counting, cross-tabulation and normalization.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crime_dash_analytics_models::{
    AggregationRequest, Normalization, RowOrder, SummaryMetadata, SummaryRow, SummaryTable,
    ValueCount, ValueMode,
};
use crime_dash_crime_models::{Dimension, DimensionValue, Record};
use crime_dash_dataset::Dataset;

use crate::AnalyticsError;

/// Running count for one distinct value, kept in first-seen order.
#[derive(Debug)]
struct Tally {
    value: DimensionValue,
    count: u64,
}

/// A primary value and the secondary values observed with it.
#[derive(Debug)]
struct Group {
    tally: Tally,
    cells: Vec<Tally>,
    cell_index: BTreeMap<DimensionValue, usize>,
}

/// Returns the `n` most frequent values of `dimension`, highest count
/// first. Ties keep the order in which values first appear. If `n` exceeds
/// the number of distinct values, all of them are returned.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidParameter`] if `n` is zero
/// * [`AnalyticsError::UnknownDimension`] if the dataset lacks `dimension`
pub fn top_n(
    dataset: &Dataset,
    dimension: Dimension,
    n: usize,
) -> Result<Vec<ValueCount>, AnalyticsError> {
    if n == 0 {
        return Err(AnalyticsError::InvalidParameter {
            message: "top-N must be at least 1".to_string(),
        });
    }
    require(dataset, dimension)?;

    let mut tallies = tally(dataset.records().iter(), dimension)?;
    order_by(&mut tallies, RowOrder::CountDescending, |t| t);
    tallies.truncate(n);

    Ok(tallies
        .into_iter()
        .map(|t| ValueCount {
            value: t.value,
            count: t.count,
        })
        .collect())
}

/// Evaluates `request` against `dataset`.
///
/// With a top-N restriction, records whose primary value is outside the
/// top-N set are removed before counting, so they contribute no secondary
/// values either. Global percentages are shares of every row in the
/// dataset; per-group percentages are shares within each primary value.
///
/// # Errors
///
/// * [`AnalyticsError::UnknownDimension`] if either dimension needs
///   calendar fields the dataset does not have
/// * [`AnalyticsError::InvalidParameter`] for a zero top-N, a secondary
///   dimension equal to the primary, or per-group normalization without a
///   secondary dimension
/// * [`AnalyticsError::EmptyDataset`] for percentages over zero rows
pub fn aggregate(
    dataset: &Dataset,
    request: &AggregationRequest,
) -> Result<SummaryTable, AnalyticsError> {
    validate(dataset, request)?;

    let allowed: Option<BTreeSet<DimensionValue>> = match request.top_n {
        Some(n) => Some(
            top_n(dataset, request.primary, n)?
                .into_iter()
                .map(|vc| vc.value)
                .collect(),
        ),
        None => None,
    };

    let mut groups = tabulate(dataset, request, allowed.as_ref())?;

    order_by(&mut groups, request.primary_order, |g| &g.tally);
    for group in &mut groups {
        order_by(&mut group.cells, request.secondary_order, |t| t);
    }

    let total_rows = dataset.len() as u64;
    let rows = match request.secondary {
        None => groups
            .into_iter()
            .map(|g| SummaryRow {
                value: value_of(g.tally.count, total_rows, request.value_mode),
                primary: g.tally.value,
                secondary: None,
                count: g.tally.count,
            })
            .collect(),
        Some(_) => groups
            .into_iter()
            .flat_map(|g| {
                let denominator = match request.value_mode {
                    ValueMode::Percentage(Normalization::PerGroup) => g.tally.count,
                    ValueMode::Count | ValueMode::Percentage(Normalization::Global) => total_rows,
                };
                let primary = g.tally.value;
                g.cells.into_iter().map(move |cell| SummaryRow {
                    primary: primary.clone(),
                    value: value_of(cell.count, denominator, request.value_mode),
                    secondary: Some(cell.value),
                    count: cell.count,
                })
            })
            .collect(),
    };

    let table = SummaryTable {
        metadata: SummaryMetadata {
            primary: request.primary,
            secondary: request.secondary,
            value_label: request.value_mode.label().to_string(),
            title: request.title(),
            total_rows,
        },
        rows,
    };

    log::debug!(
        "Aggregated '{}' into {} rows over {total_rows} records",
        table.metadata.title,
        table.len()
    );

    Ok(table)
}

fn validate(dataset: &Dataset, request: &AggregationRequest) -> Result<(), AnalyticsError> {
    require(dataset, request.primary)?;

    if let Some(secondary) = request.secondary {
        require(dataset, secondary)?;
        if secondary == request.primary {
            return Err(AnalyticsError::InvalidParameter {
                message: format!(
                    "secondary dimension must differ from the primary dimension '{secondary}'"
                ),
            });
        }
    }

    if request.top_n == Some(0) {
        return Err(AnalyticsError::InvalidParameter {
            message: "top-N must be at least 1".to_string(),
        });
    }

    match request.value_mode {
        ValueMode::Count => {}
        ValueMode::Percentage(normalization) => {
            if normalization == Normalization::PerGroup && request.secondary.is_none() {
                return Err(AnalyticsError::InvalidParameter {
                    message: "per-group percentages need a secondary dimension".to_string(),
                });
            }
            if dataset.is_empty() {
                return Err(AnalyticsError::EmptyDataset);
            }
        }
    }

    Ok(())
}

const fn require(dataset: &Dataset, dimension: Dimension) -> Result<(), AnalyticsError> {
    if dataset.supports(dimension) {
        Ok(())
    } else {
        Err(AnalyticsError::UnknownDimension { dimension })
    }
}

fn value_for(record: &Record, dimension: Dimension) -> Result<DimensionValue, AnalyticsError> {
    record
        .value(dimension)
        .ok_or(AnalyticsError::UnknownDimension { dimension })
}

fn tally<'a>(
    records: impl Iterator<Item = &'a Record>,
    dimension: Dimension,
) -> Result<Vec<Tally>, AnalyticsError> {
    let mut tallies: Vec<Tally> = Vec::new();
    let mut index: BTreeMap<DimensionValue, usize> = BTreeMap::new();

    for record in records {
        let value = value_for(record, dimension)?;
        if let Some(&i) = index.get(&value) {
            tallies[i].count += 1;
        } else {
            index.insert(value.clone(), tallies.len());
            tallies.push(Tally { value, count: 1 });
        }
    }

    Ok(tallies)
}

fn tabulate(
    dataset: &Dataset,
    request: &AggregationRequest,
    allowed: Option<&BTreeSet<DimensionValue>>,
) -> Result<Vec<Group>, AnalyticsError> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: BTreeMap<DimensionValue, usize> = BTreeMap::new();

    for record in dataset.records() {
        let primary = value_for(record, request.primary)?;
        if allowed.is_some_and(|set| !set.contains(&primary)) {
            continue;
        }

        let i = if let Some(&i) = index.get(&primary) {
            i
        } else {
            index.insert(primary.clone(), groups.len());
            groups.push(Group {
                tally: Tally {
                    value: primary,
                    count: 0,
                },
                cells: Vec::new(),
                cell_index: BTreeMap::new(),
            });
            groups.len() - 1
        };
        let group = &mut groups[i];
        group.tally.count += 1;

        if let Some(dimension) = request.secondary {
            let secondary = value_for(record, dimension)?;
            if let Some(&j) = group.cell_index.get(&secondary) {
                group.cells[j].count += 1;
            } else {
                let next = group.cells.len();
                group.cell_index.insert(secondary.clone(), next);
                group.cells.push(Tally {
                    value: secondary,
                    count: 1,
                });
            }
        }
    }

    Ok(groups)
}

/// Sorts `items` by `order`. Items must already be in first-seen order;
/// every sort is stable, so ties keep it.
fn order_by<T>(items: &mut [T], order: RowOrder, tally: impl Fn(&T) -> &Tally) {
    match order {
        RowOrder::CountDescending => items.sort_by_key(|t| Reverse(tally(t).count)),
        RowOrder::CountAscending => items.sort_by_key(|t| tally(t).count),
        RowOrder::Alphabetical => items.sort_by_cached_key(|t| tally(t).value.to_string()),
        RowOrder::Calendar => items.sort_by(|a, b| tally(a).value.cmp(&tally(b).value)),
        RowOrder::FirstSeen => {}
    }
}

#[allow(clippy::cast_precision_loss)]
fn value_of(count: u64, denominator: u64, mode: ValueMode) -> f64 {
    match mode {
        ValueMode::Count => count as f64,
        ValueMode::Percentage(_) => count as f64 * 100.0 / denominator as f64,
    }
}
