#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident record types and groupable dimensions.
//!
//! This crate defines the row model shared by the loader and the
//! aggregation engine: a single [`Record`] per incident, the calendar fields
//! derived from its timestamp, and the [`Dimension`]s a dashboard can group
//! by.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Day of the week, in Monday-first calendar order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DayOfWeek {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl DayOfWeek {
    /// Converts a [`chrono::Weekday`].
    #[must_use]
    pub const fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }

    /// Zero-based position in the Monday-first week.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns all variants of this enum in calendar order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

/// Month of the year, in January-first calendar order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum MonthName {
    /// January
    January = 1,
    /// February
    February = 2,
    /// March
    March = 3,
    /// April
    April = 4,
    /// May
    May = 5,
    /// June
    June = 6,
    /// July
    July = 7,
    /// August
    August = 8,
    /// September
    September = 9,
    /// October
    October = 10,
    /// November
    November = 11,
    /// December
    December = 12,
}

impl MonthName {
    /// Returns the month number (1-12).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Creates a month from its number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-12.
    pub const fn from_number(value: u32) -> Result<Self, InvalidMonthError> {
        match value {
            1 => Ok(Self::January),
            2 => Ok(Self::February),
            3 => Ok(Self::March),
            4 => Ok(Self::April),
            5 => Ok(Self::May),
            6 => Ok(Self::June),
            7 => Ok(Self::July),
            8 => Ok(Self::August),
            9 => Ok(Self::September),
            10 => Ok(Self::October),
            11 => Ok(Self::November),
            12 => Ok(Self::December),
            _ => Err(InvalidMonthError { value }),
        }
    }

    /// Returns all variants of this enum in calendar order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::January,
            Self::February,
            Self::March,
            Self::April,
            Self::May,
            Self::June,
            Self::July,
            Self::August,
            Self::September,
            Self::October,
            Self::November,
            Self::December,
        ]
    }
}

/// Error returned when attempting to create a [`MonthName`] from an invalid
/// month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMonthError {
    /// The invalid month number that was provided.
    pub value: u32,
}

impl std::fmt::Display for InvalidMonthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid month number {}: expected 1-12", self.value)
    }
}

impl std::error::Error for InvalidMonthError {}

/// Calendar features derived from an incident timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarFields {
    /// Hour of day (0-23).
    pub hour: u8,
    /// Day of the week.
    pub day_of_week: DayOfWeek,
    /// Month of the year.
    pub month: MonthName,
    /// Calendar year.
    pub year: i32,
    /// Day of the month (1-31).
    pub day_of_month: u8,
}

impl CalendarFields {
    /// Derives every calendar field from a parsed timestamp.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_timestamp(ts: &NaiveDateTime) -> Self {
        // chrono guarantees month() is 1-12
        let month = MonthName::from_number(ts.month()).unwrap_or(MonthName::January);
        Self {
            hour: ts.hour() as u8,
            day_of_week: DayOfWeek::from_chrono(ts.weekday()),
            month,
            year: ts.year(),
            day_of_month: ts.day() as u8,
        }
    }

    /// Returns the month number (1-12).
    #[must_use]
    pub const fn month_number(&self) -> u8 {
        self.month.number()
    }
}

/// One incident row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Crime category (e.g. `"LARCENY/THEFT"`).
    pub category: String,
    /// Police district (e.g. `"SOUTHERN"`).
    pub district: String,
    /// Longitude-like X coordinate.
    pub x: f64,
    /// Latitude-like Y coordinate.
    pub y: f64,
    /// Parsed timestamp, when the dataset has a timestamp column.
    pub timestamp: Option<NaiveDateTime>,
    /// Calendar fields derived from [`Self::timestamp`].
    pub calendar: Option<CalendarFields>,
    /// All other source columns, keyed by header.
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// Returns this record's value for `dimension`, or `None` if the
    /// dimension needs calendar fields that were never derived.
    #[must_use]
    pub fn value(&self, dimension: Dimension) -> Option<DimensionValue> {
        match dimension {
            Dimension::Category => Some(DimensionValue::Text(self.category.clone())),
            Dimension::District => Some(DimensionValue::Text(self.district.clone())),
            Dimension::Hour => self.calendar.map(|c| DimensionValue::Hour(c.hour)),
            Dimension::DayOfWeek => self
                .calendar
                .map(|c| DimensionValue::DayOfWeek(c.day_of_week)),
            Dimension::Month => self.calendar.map(|c| DimensionValue::Month(c.month)),
            Dimension::Year => self.calendar.map(|c| DimensionValue::Year(c.year)),
        }
    }
}

/// A field usable for grouping.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    /// Crime category.
    Category,
    /// Police district.
    District,
    /// Hour of day.
    Hour,
    /// Day of the week.
    DayOfWeek,
    /// Month of the year.
    Month,
    /// Calendar year.
    Year,
}

impl Dimension {
    /// Whether this dimension is derived from the timestamp column.
    #[must_use]
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::Hour | Self::DayOfWeek | Self::Month | Self::Year)
    }

    /// Human-readable axis label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::District => "District",
            Self::Hour => "Hour",
            Self::DayOfWeek => "Day of Week",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Category,
            Self::District,
            Self::Hour,
            Self::DayOfWeek,
            Self::Month,
            Self::Year,
        ]
    }
}

/// The value a single record takes for some [`Dimension`].
///
/// The derived [`Ord`] is the canonical order within one dimension:
/// lexicographic for text, numeric for hours and years, Monday-first for
/// weekdays and January-first for months.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    /// Category or district name.
    Text(String),
    /// Hour of day (0-23).
    Hour(u8),
    /// Day of the week.
    DayOfWeek(DayOfWeek),
    /// Month of the year.
    Month(MonthName),
    /// Calendar year.
    Year(i32),
}

impl std::fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Hour(h) => write!(f, "{h}"),
            Self::DayOfWeek(d) => write!(f, "{d}"),
            Self::Month(m) => write!(f, "{m}"),
            Self::Year(y) => write!(f, "{y}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use chrono::NaiveDate;

    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    #[test]
    fn derives_calendar_fields() {
        // 2015-05-13 was a Wednesday
        let cal = CalendarFields::from_timestamp(&ts(2015, 5, 13, 23));
        assert_eq!(cal.hour, 23);
        assert_eq!(cal.day_of_week, DayOfWeek::Wednesday);
        assert_eq!(cal.month, MonthName::May);
        assert_eq!(cal.month_number(), 5);
        assert_eq!(cal.year, 2015);
        assert_eq!(cal.day_of_month, 13);
    }

    #[test]
    fn month_from_number_roundtrip() {
        for m in MonthName::all() {
            assert_eq!(MonthName::from_number(u32::from(m.number())).unwrap(), *m);
        }
        assert!(MonthName::from_number(0).is_err());
        assert!(MonthName::from_number(13).is_err());
    }

    #[test]
    fn weekday_order_is_monday_first() {
        let mut days = vec![DayOfWeek::Sunday, DayOfWeek::Monday, DayOfWeek::Friday];
        days.sort();
        assert_eq!(
            days,
            vec![DayOfWeek::Monday, DayOfWeek::Friday, DayOfWeek::Sunday]
        );
        assert_eq!(DayOfWeek::Sunday.index(), 6);
    }

    #[test]
    fn calendar_names_display_in_full() {
        assert_eq!(DayOfWeek::Thursday.to_string(), "Thursday");
        assert_eq!(MonthName::September.to_string(), "September");
        assert_eq!(DayOfWeek::from_str("Friday").unwrap(), DayOfWeek::Friday);
    }

    #[test]
    fn dimension_parses_snake_case() {
        let parsed = Dimension::from_str("day_of_week").unwrap();
        assert_eq!(parsed, Dimension::DayOfWeek);
        assert_eq!(Dimension::Hour.as_ref(), "hour");
        assert!(Dimension::Month.is_calendar());
        assert!(!Dimension::District.is_calendar());
    }

    #[test]
    fn calendar_dimensions_need_derived_fields() {
        let record = Record {
            category: "ASSAULT".to_string(),
            district: "MISSION".to_string(),
            x: -122.42,
            y: 37.76,
            timestamp: None,
            calendar: None,
            extra: BTreeMap::new(),
        };
        assert_eq!(
            record.value(Dimension::Category),
            Some(DimensionValue::Text("ASSAULT".to_string()))
        );
        assert_eq!(record.value(Dimension::Hour), None);
        assert_eq!(record.value(Dimension::Month), None);
    }
}
