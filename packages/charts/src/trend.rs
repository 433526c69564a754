//! Headline statistics and the monthly accidents/deaths line chart.

use serde::{Deserialize, Serialize};
use traffic_stats_accident_models::{AccidentsByMonth, StatsData};

use crate::{ChartSeriesPoint, points};

/// A named line of points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Legend name.
    pub name: String,
    /// Points in x-axis order.
    pub points: Vec<ChartSeriesPoint>,
}

/// Lines sharing one chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSeries {
    /// The lines.
    pub series: Vec<TimeSeries>,
}

/// Legend name of the monthly accidents line.
pub const ACCIDENTS: &str = "Accidents";
/// Legend name of the monthly deaths line.
pub const DEATHS: &str = "Deaths";

/// Headline statistic cards (total deaths, injured, ...) in backend
/// order.
#[must_use]
pub fn stat_cards(data: Option<&StatsData>) -> Vec<ChartSeriesPoint> {
    data.map(|d| points(&d.data)).unwrap_or_default()
}

/// Accidents and deaths per month as two lines.
///
/// Each line keeps its own points, so months missing from one list do
/// not shift the other.
#[must_use]
pub fn monthly_trend(data: Option<&AccidentsByMonth>) -> LineSeries {
    let (accidents, deaths) = data.map_or_else(Default::default, |d| {
        (points(&d.accidents), points(&d.deaths))
    });

    LineSeries {
        series: vec![
            TimeSeries {
                name: ACCIDENTS.to_string(),
                points: accidents,
            },
            TimeSeries {
                name: DEATHS.to_string(),
                points: deaths,
            },
        ],
    }
}
