#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident marker and statistic row types.
//!
//! These types mirror the JSON shapes served by the precomputed statistics
//! backend. The backend's field names are Lithuanian (`zuvusiuSkaicius`,
//! `savivaldybe`, ...); they are mapped onto English Rust field names here
//! so the rest of the workspace never sees the wire names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One traffic accident as served by `GET /api/mapData`.
///
/// Records are created by the backend and are read-only to the client.
/// A record without usable coordinates is still a valid record; it just
/// cannot be placed on a map (see [`MarkerRecord::coordinates`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    /// When the accident happened (epoch milliseconds on the wire).
    #[serde(
        rename = "dataLaikas",
        default,
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub occurred_at: Option<DateTime<Utc>>,
    /// Number of people involved.
    #[serde(
        rename = "dalyviuSkaicius",
        default,
        deserialize_with = "deserialize_small_count"
    )]
    pub participants: u32,
    /// Number of people killed.
    #[serde(
        rename = "zuvusiuSkaicius",
        default,
        deserialize_with = "deserialize_small_count"
    )]
    pub fatalities: u32,
    /// Number of people injured.
    #[serde(
        rename = "suzeistuSkaicius",
        default,
        deserialize_with = "deserialize_small_count"
    )]
    pub injured: u32,
    /// Number of vehicles involved.
    #[serde(
        rename = "tpSkaicius",
        default,
        deserialize_with = "deserialize_small_count"
    )]
    pub vehicles: u32,
    /// Municipality name.
    #[serde(rename = "savivaldybe", default)]
    pub municipality: Option<String>,
    /// Street name.
    #[serde(rename = "gatve", default)]
    pub street: Option<String>,
    /// House identifier.
    #[serde(rename = "namas", default)]
    pub house: Option<String>,
    /// Posted speed limit in km/h.
    #[serde(
        rename = "leistinasGreitis",
        default,
        deserialize_with = "deserialize_optional_count"
    )]
    pub speed_limit: Option<u32>,
    /// Latitude (WGS84).
    #[serde(rename = "lat", default)]
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    #[serde(rename = "lon", default)]
    pub longitude: Option<f64>,
}

impl MarkerRecord {
    /// Whether anybody died in this accident.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.fatalities > 0
    }

    /// Returns `(latitude, longitude)` when the record can be plotted.
    ///
    /// Missing, non-finite, or zero coordinates are all treated as "not
    /// plottable".
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.filter(|v| v.is_finite() && *v != 0.0)?;
        let lon = self.longitude.filter(|v| v.is_finite() && *v != 0.0)?;
        Some((lat, lon))
    }

    /// Municipality and street joined for display, with missing parts
    /// left blank.
    #[must_use]
    pub fn location_label(&self) -> String {
        format!(
            "{}  {}",
            self.municipality.as_deref().unwrap_or_default(),
            self.street.as_deref().unwrap_or_default()
        )
    }
}

/// Accident count for a single car make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarTypeAccidents {
    /// Car make, e.g. `"Toyota"`.
    pub marke: String,
    /// Accidents involving this make.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_accidents: u64,
}

/// Death count for a single car make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarTypeDeaths {
    /// Car make, e.g. `"Toyota"`.
    pub marke: String,
    /// Deaths in accidents involving this make.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_deaths: u64,
}

/// Response of `GET /api/carType`.
///
/// The `*_top` lists are already ranked (top 10, descending) by the
/// backend; the plain lists are in the backend's grouping order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarTypesData {
    /// Accidents per make.
    #[serde(default)]
    pub accidents: Vec<CarTypeAccidents>,
    /// Top makes by accidents.
    #[serde(default)]
    pub accidents_top: Vec<CarTypeAccidents>,
    /// Deaths per make.
    #[serde(default)]
    pub deaths: Vec<CarTypeDeaths>,
    /// Top makes by deaths.
    #[serde(default)]
    pub deaths_top: Vec<CarTypeDeaths>,
}

/// Which ranking of [`CarTypesData`] a chart shows.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CarTypeMetric {
    /// Rank makes by number of accidents.
    #[default]
    Accidents,
    /// Rank makes by number of deaths.
    Deaths,
}

/// One row of `GET /api/intoxicatedDrivers`: driver sobriety per time
/// bucket (a `YYYY-MM` month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntoxicatedDriverRow {
    /// Time bucket label.
    pub time: String,
    /// Sober drivers in this bucket.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub sober_count: u64,
    /// Intoxicated drivers in this bucket.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub intoxicated_count: u64,
}

/// A single headline statistic, e.g. `"Total deaths"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDetails {
    /// Human-readable statistic name.
    pub statistic: String,
    /// Statistic value.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub value: u64,
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsData {
    /// Headline statistics in display order.
    #[serde(default)]
    pub data: Vec<StatsDetails>,
}

/// Accidents in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAccidents {
    /// Month as `YYYY-MM`.
    pub year_month: String,
    /// Accidents in the month.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_accidents: u64,
}

/// Deaths in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDeaths {
    /// Month as `YYYY-MM`.
    pub year_month: String,
    /// Deaths in the month.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_deaths: u64,
}

/// Response of `GET /api/accidents_by_month`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentsByMonth {
    /// Accidents per month, chronological.
    #[serde(default)]
    pub accidents: Vec<MonthlyAccidents>,
    /// Deaths per month, chronological.
    #[serde(default)]
    pub deaths: Vec<MonthlyDeaths>,
}

/// Counts come out of `pandas`, which writes `3.0` instead of `3` for any
/// column that ever held a `NaN`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(u64),
    Float(f64),
}

impl RawCount {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn value(self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(v),
            Self::Float(v) if v.is_finite() && v >= 0.0 => Some(v.min(u64::MAX as f64) as u64),
            Self::Float(_) => None,
        }
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawCount>::deserialize(deserializer)?
        .and_then(RawCount::value)
        .unwrap_or(0))
}

fn deserialize_small_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_count(deserializer)?;
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawCount>::deserialize(deserializer)?
        .and_then(RawCount::value)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX)))
}
