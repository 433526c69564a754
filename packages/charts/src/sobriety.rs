//! Sober vs. intoxicated drivers stacked bar chart.

use serde::{Deserialize, Serialize};
use traffic_stats_accident_models::IntoxicatedDriverRow;

/// A named series of values aligned with a chart's categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSeries {
    /// Legend name.
    pub name: String,
    /// One value per category.
    pub data: Vec<u64>,
}

/// Categories plus series stacked on top of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackedSeries {
    /// X-axis categories.
    pub categories: Vec<String>,
    /// Stacked series, each aligned with `categories`.
    pub series: Vec<NamedSeries>,
}

impl StackedSeries {
    /// The series called `name`.
    #[must_use]
    pub fn series(&self, name: &str) -> Option<&NamedSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// Legend name of the sober drivers series.
pub const SOBER: &str = "Sober";
/// Legend name of the intoxicated drivers series.
pub const INTOXICATED: &str = "Intoxicated";

/// Stacked sober/intoxicated counts per time bucket.
///
/// Both series always exist, so a chart keeps its legend while empty.
#[must_use]
pub fn sober_vs_intoxicated(rows: Option<&[IntoxicatedDriverRow]>) -> StackedSeries {
    let rows = rows.unwrap_or_default();

    StackedSeries {
        categories: rows.iter().map(|r| r.time.clone()).collect(),
        series: vec![
            NamedSeries {
                name: SOBER.to_string(),
                data: rows.iter().map(|r| r.sober_count).collect(),
            },
            NamedSeries {
                name: INTOXICATED.to_string(),
                data: rows.iter().map(|r| r.intoxicated_count).collect(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_align_with_time_buckets() {
        let rows: Vec<IntoxicatedDriverRow> = serde_json::from_value(serde_json::json!([
            { "time": "08:00", "sober_count": 5, "intoxicated_count": 1 }
        ]))
        .unwrap();

        let chart = sober_vs_intoxicated(Some(&rows));
        assert_eq!(chart.categories, ["08:00"]);
        assert_eq!(chart.series(SOBER).unwrap().data, [5]);
        assert_eq!(chart.series(INTOXICATED).unwrap().data, [1]);
    }

    #[test]
    fn keeps_backend_order() {
        let rows: Vec<IntoxicatedDriverRow> = serde_json::from_value(serde_json::json!([
            { "time": "2023-03", "sober_count": 2, "intoxicated_count": 0 },
            { "time": "2023-01", "sober_count": 4, "intoxicated_count": 3 }
        ]))
        .unwrap();

        let chart = sober_vs_intoxicated(Some(&rows));
        assert_eq!(chart.categories, ["2023-03", "2023-01"]);
        assert_eq!(chart.series(SOBER).unwrap().data, [2, 4]);
        assert_eq!(chart.series(INTOXICATED).unwrap().data, [0, 3]);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        for chart in [sober_vs_intoxicated(None), sober_vs_intoxicated(Some(&[]))] {
            assert!(chart.categories.is_empty());
            assert_eq!(chart.series.len(), 2);
            assert!(chart.series.iter().all(|s| s.data.is_empty()));
        }
    }
}
