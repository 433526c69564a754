//! Map markers that can actually be drawn.

use traffic_stats_accident_models::MarkerRecord;

/// The records with usable coordinates, in input order.
///
/// The map client deliberately returns unplottable records too; this is
/// where the map view drops them.
#[must_use]
pub fn plottable_markers(records: &[MarkerRecord]) -> Vec<&MarkerRecord> {
    records
        .iter()
        .filter(|record| record.coordinates().is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_records_without_coordinates() {
        let records: Vec<MarkerRecord> = serde_json::from_value(serde_json::json!([
            { "gatve": "A", "lat": 54.6, "lon": 25.2 },
            { "gatve": "B", "lat": 0.0, "lon": 25.2 },
            { "gatve": "C" },
            { "gatve": "D", "lat": 54.9, "lon": 23.9 }
        ]))
        .unwrap();

        let streets: Vec<&str> = plottable_markers(&records)
            .into_iter()
            .filter_map(|r| r.street.as_deref())
            .collect();
        assert_eq!(streets, ["A", "D"]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(plottable_markers(&[]).is_empty());
    }
}
