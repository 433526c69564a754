#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart data transformers.
//!
//! Each transformer is a pure function from statistics API rows to the
//! series a chart component draws. All of them:
//!
//! - accept data that has not loaded yet (`None`) or is empty, and return
//!   an empty series in that case;
//! - keep the backend's row order. Ranked ("top") lists are ranked by the
//!   backend and passed through as-is.

pub mod car_types;
pub mod markers;
pub mod sobriety;
pub mod trend;

use serde::{Deserialize, Serialize};
use traffic_stats_accident_models::{
    CarTypeAccidents, CarTypeDeaths, MonthlyAccidents, MonthlyDeaths, StatsDetails,
};

pub use car_types::{DonutSeries, car_type_points, car_types_donut};
pub use markers::plottable_markers;
pub use sobriety::{NamedSeries, StackedSeries, sober_vs_intoxicated};
pub use trend::{LineSeries, TimeSeries, monthly_trend, stat_cards};

/// One labelled value on a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeriesPoint {
    /// Category or x-axis label.
    pub label: String,
    /// Value.
    pub value: u64,
}

/// A statistic row that reduces to a label and a count.
pub trait LabeledCount {
    /// The category label.
    fn label(&self) -> &str;

    /// The count.
    fn count(&self) -> u64;
}

impl LabeledCount for CarTypeAccidents {
    fn label(&self) -> &str {
        &self.marke
    }

    fn count(&self) -> u64 {
        self.total_accidents
    }
}

impl LabeledCount for CarTypeDeaths {
    fn label(&self) -> &str {
        &self.marke
    }

    fn count(&self) -> u64 {
        self.total_deaths
    }
}

impl LabeledCount for StatsDetails {
    fn label(&self) -> &str {
        &self.statistic
    }

    fn count(&self) -> u64 {
        self.value
    }
}

impl LabeledCount for MonthlyAccidents {
    fn label(&self) -> &str {
        &self.year_month
    }

    fn count(&self) -> u64 {
        self.total_accidents
    }
}

impl LabeledCount for MonthlyDeaths {
    fn label(&self) -> &str {
        &self.year_month
    }

    fn count(&self) -> u64 {
        self.total_deaths
    }
}

/// Maps rows to points, one per row, in row order.
#[must_use]
pub fn points<R: LabeledCount>(rows: &[R]) -> Vec<ChartSeriesPoint> {
    rows.iter()
        .map(|row| ChartSeriesPoint {
            label: row.label().to_string(),
            value: row.count(),
        })
        .collect()
}
