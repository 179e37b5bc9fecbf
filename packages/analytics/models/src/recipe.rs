//! The dashboard's fixed set of views.

use std::ops::RangeInclusive;

use crime_dash_crime_models::Dimension;
use serde::{Deserialize, Serialize};

use crate::{AggregationRequest, RowOrder};

/// Allowed number of categories on the top-categories view.
pub const TOP_CATEGORIES_RANGE: RangeInclusive<usize> = 5..=20;

/// Default number of categories on the top-categories view.
pub const TOP_CATEGORIES_DEFAULT: usize = 15;

/// Allowed number of categories on the cross-tabulated insight views.
pub const INSIGHT_CATEGORIES_RANGE: RangeInclusive<usize> = 3..=10;

/// Default number of categories on the cross-tabulated insight views.
pub const INSIGHT_CATEGORIES_DEFAULT: usize = 5;

/// A named dashboard view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "recipe", rename_all = "snake_case")]
pub enum Recipe {
    /// Most frequent crime categories.
    TopCategories {
        /// Number of categories to show.
        n: usize,
    },
    /// Incidents per police district.
    DistrictDistribution {
        /// Row ordering (descending, ascending, or alphabetical).
        order: RowOrder,
    },
    /// Incidents per hour of day.
    HourOfDay,
    /// Incidents per weekday, Monday first.
    DayOfWeek,
    /// Incidents per month, January first.
    Month,
    /// Top categories split by district.
    CategoryByDistrict {
        /// Number of categories to analyze.
        n: usize,
    },
    /// Top categories split by hour of day.
    CategoryByHour {
        /// Number of categories to analyze.
        n: usize,
    },
    /// Any request built by the caller.
    Custom {
        /// The request to evaluate.
        request: AggregationRequest,
    },
}

impl Recipe {
    /// Converts this recipe into the request the engine evaluates.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRecipeError`] if a category count is outside the
    /// range the view allows.
    pub fn request(&self) -> Result<AggregationRequest, InvalidRecipeError> {
        let by = AggregationRequest::new;
        Ok(match self {
            Self::TopCategories { n } => {
                check_range("top_categories", *n, &TOP_CATEGORIES_RANGE)?;
                by(Dimension::Category).with_top_n(*n)
            }
            Self::DistrictDistribution { order } => by(Dimension::District).ordered_by(*order),
            Self::HourOfDay => by(Dimension::Hour).ordered_by(RowOrder::Calendar),
            Self::DayOfWeek => by(Dimension::DayOfWeek).ordered_by(RowOrder::Calendar),
            Self::Month => by(Dimension::Month).ordered_by(RowOrder::Calendar),
            Self::CategoryByDistrict { n } => {
                check_range("category_by_district", *n, &INSIGHT_CATEGORIES_RANGE)?;
                by(Dimension::Category)
                    .with_top_n(*n)
                    .with_secondary(Dimension::District)
                    .with_secondary_order(RowOrder::Alphabetical)
            }
            Self::CategoryByHour { n } => {
                check_range("category_by_hour", *n, &INSIGHT_CATEGORIES_RANGE)?;
                by(Dimension::Category)
                    .with_top_n(*n)
                    .with_secondary(Dimension::Hour)
                    .with_secondary_order(RowOrder::Calendar)
            }
            Self::Custom { request } => request.clone(),
        })
    }

    /// Chart title for this view.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::TopCategories { n } => format!("Top {n} Crime Categories"),
            Self::DistrictDistribution { .. } => "Crime Distribution by District".to_string(),
            Self::HourOfDay => "Crime Incidents by Hour of Day".to_string(),
            Self::DayOfWeek => "Crime Incidents by Day of Week".to_string(),
            Self::Month => "Crime Incidents by Month".to_string(),
            Self::CategoryByDistrict { n } => {
                format!("Distribution of Top {n} Crime Categories Across Districts")
            }
            Self::CategoryByHour { n } => {
                format!("Crime Patterns Throughout the Day for Top {n} Categories")
            }
            Self::Custom { request } => request.title(),
        }
    }
}

fn check_range(
    recipe: &str,
    n: usize,
    range: &RangeInclusive<usize>,
) -> Result<(), InvalidRecipeError> {
    if range.contains(&n) {
        Ok(())
    } else {
        Err(InvalidRecipeError {
            recipe: recipe.to_string(),
            n,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Error returned when a recipe's category count is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecipeError {
    /// Recipe name.
    pub recipe: String,
    /// The requested count.
    pub n: usize,
    /// Smallest allowed count.
    pub min: usize,
    /// Largest allowed count.
    pub max: usize,
}

impl std::fmt::Display for InvalidRecipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: category count {} out of range: expected {}-{}",
            self.recipe, self.n, self.min, self.max
        )
    }
}

impl std::error::Error for InvalidRecipeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueMode;

    #[test]
    fn top_categories_defaults_are_in_range() {
        let insight = INSIGHT_CATEGORIES_RANGE;
        assert!(TOP_CATEGORIES_RANGE.contains(&TOP_CATEGORIES_DEFAULT));
        assert!(insight.contains(&INSIGHT_CATEGORIES_DEFAULT));
    }

    #[test]
    fn top_categories_maps_to_top_n_counts() {
        let request = Recipe::TopCategories { n: 15 }.request().unwrap();
        assert_eq!(request.primary, Dimension::Category);
        assert_eq!(request.top_n, Some(15));
        assert_eq!(request.value_mode, ValueMode::Count);
        assert_eq!(request.primary_order, RowOrder::CountDescending);
    }

    #[test]
    fn time_views_use_calendar_order() {
        for recipe in [Recipe::HourOfDay, Recipe::DayOfWeek, Recipe::Month] {
            assert_eq!(recipe.request().unwrap().primary_order, RowOrder::Calendar);
        }
    }

    #[test]
    fn category_by_hour_crosses_with_hour() {
        let request = Recipe::CategoryByHour { n: 5 }.request().unwrap();
        assert_eq!(request.secondary, Some(Dimension::Hour));
        assert_eq!(request.top_n, Some(5));
    }

    #[test]
    fn rejects_out_of_range_counts() {
        let err = Recipe::CategoryByDistrict { n: 11 }.request().unwrap_err();
        assert_eq!((err.min, err.max, err.n), (3, 10, 11));
        assert!(Recipe::TopCategories { n: 4 }.request().is_err());
        assert!(Recipe::TopCategories { n: 20 }.request().is_ok());
    }

    #[test]
    fn titles_match_views() {
        let top = Recipe::TopCategories { n: 15 };
        assert_eq!(top.title(), "Top 15 Crime Categories");
        assert_eq!(
            Recipe::DistrictDistribution {
                order: RowOrder::Alphabetical
            }
            .title(),
            "Crime Distribution by District"
        );
    }

    #[test]
    fn recipe_serializes_with_tag() {
        let recipe = Recipe::CategoryByHour { n: 5 };
        let json = serde_json::to_value(recipe).unwrap();
        assert_eq!(json["recipe"], "category_by_hour");
        assert_eq!(json["n"], 5);
    }
}
