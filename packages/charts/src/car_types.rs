//! Top car makes donut chart.

use serde::{Deserialize, Serialize};
use traffic_stats_accident_models::{CarTypeMetric, CarTypesData};

use crate::{ChartSeriesPoint, LabeledCount, points};

/// Parallel label/value arrays for a donut chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonutSeries {
    /// Slice labels.
    pub labels: Vec<String>,
    /// Slice values, aligned with `labels`.
    pub values: Vec<u64>,
}

impl DonutSeries {
    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sum of all slices.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }
}

impl From<Vec<ChartSeriesPoint>> for DonutSeries {
    fn from(points: Vec<ChartSeriesPoint>) -> Self {
        let (labels, values) = points.into_iter().map(|p| (p.label, p.value)).unzip();
        Self { labels, values }
    }
}

/// Car make rows as chart points.
#[must_use]
pub fn car_type_points<R: LabeledCount>(rows: &[R]) -> Vec<ChartSeriesPoint> {
    points(rows)
}

/// Donut series for the top car makes by `metric`.
///
/// Uses the backend's pre-ranked `accidents_top` / `deaths_top` lists.
#[must_use]
pub fn car_types_donut(data: Option<&CarTypesData>, metric: CarTypeMetric) -> DonutSeries {
    let Some(data) = data else {
        return DonutSeries::default();
    };

    match metric {
        CarTypeMetric::Accidents => car_type_points(&data.accidents_top),
        CarTypeMetric::Deaths => car_type_points(&data.deaths_top),
    }
    .into()
}
