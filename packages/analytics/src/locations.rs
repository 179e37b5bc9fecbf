//! Incident counts per exact location, for map layers.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crime_dash_analytics_models::LocationCount;
use crime_dash_dataset::Dataset;

use crate::AnalyticsError;

/// Counts incidents per `(x, y, category)` in first-seen order. With
/// `top_n`, only the busiest `top_n` locations are returned, most frequent
/// first with ties in first-seen order.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidParameter`] if `top_n` is zero
pub fn location_counts(
    dataset: &Dataset,
    top_n: Option<usize>,
) -> Result<Vec<LocationCount>, AnalyticsError> {
    if top_n == Some(0) {
        return Err(AnalyticsError::InvalidParameter {
            message: "top-N must be at least 1".to_string(),
        });
    }

    let mut locations: Vec<LocationCount> = Vec::new();
    let mut index: BTreeMap<(u64, u64, &str), usize> = BTreeMap::new();

    for record in dataset.records() {
        let key = (
            record.x.to_bits(),
            record.y.to_bits(),
            record.category.as_str(),
        );
        if let Some(&i) = index.get(&key) {
            locations[i].count += 1;
        } else {
            index.insert(key, locations.len());
            locations.push(LocationCount {
                x: record.x,
                y: record.y,
                category: record.category.clone(),
                count: 1,
            });
        }
    }

    if let Some(n) = top_n {
        locations.sort_by_key(|l| Reverse(l.count));
        locations.truncate(n);
    }

    log::debug!(
        "Counted {} distinct locations over {} records",
        locations.len(),
        dataset.len()
    );

    Ok(locations)
}
