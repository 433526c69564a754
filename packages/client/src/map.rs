//! Accident markers for the map view.
//!
//! The backend has no filtering support, so the full marker collection is
//! always requested and [`MapFilters`] are applied here, after the fetch.
//! Records without coordinates are returned like any other; deciding what
//! can be drawn is up to the map itself.

use traffic_stats_accident_models::MarkerRecord;
use traffic_stats_filters::MapFilters;

use crate::{ApiClient, ClientError, Endpoint};

/// Fetches every accident marker and applies `options`.
///
/// An empty response yields an empty vector.
///
/// # Errors
///
/// Returns [`ClientError`] if the request fails or the body cannot be
/// decoded.
pub async fn fetch_map_data(
    client: &ApiClient,
    options: Option<&MapFilters>,
) -> Result<Vec<MarkerRecord>, ClientError> {
    let records: Vec<MarkerRecord> = client
        .get_json(Endpoint::MapData)
        .await?
        .unwrap_or_default();
    let fetched = records.len();

    let records = apply_fatality_filter(records, options);
    log::debug!(
        "fetch_map_data: options={options:?} fetched={fetched} kept={}",
        records.len()
    );

    Ok(records)
}

/// Keeps only fatal accidents when `options` asks for them; otherwise
/// returns `records` untouched. Order is preserved either way.
#[must_use]
pub fn apply_fatality_filter(
    mut records: Vec<MarkerRecord>,
    options: Option<&MapFilters>,
) -> Vec<MarkerRecord> {
    if options.is_some_and(MapFilters::fatal_only) {
        records.retain(MarkerRecord::is_fatal);
    }
    records
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use traffic_stats_filters::FatalityFilter;

    use super::*;
    use crate::StaticTransport;

    const MAP_BODY: &str = r#"[
        {"zuvusiuSkaicius": 0, "gatve": "A", "lat": 54.6, "lon": 25.2},
        {"zuvusiuSkaicius": 2, "gatve": "B", "lat": null, "lon": null},
        {"zuvusiuSkaicius": 1, "gatve": "C", "lat": 54.7, "lon": 25.3},
        {"zuvusiuSkaicius": 0, "gatve": "D"}
    ]"#;

    fn client() -> (ApiClient, Arc<StaticTransport>) {
        let transport = Arc::new(StaticTransport::new().with_body(Endpoint::MapData, MAP_BODY));
        (ApiClient::with_transport(transport.clone()), transport)
    }

    fn streets(records: &[MarkerRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.street.as_deref().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn yes_keeps_only_fatal_records_in_order() {
        let (client, _) = client();
        let filters = MapFilters::fatalities_only(FatalityFilter::Yes);
        let records = fetch_map_data(&client, Some(&filters)).await.unwrap();
        assert_eq!(streets(&records), ["B", "C"]);
        assert!(records.iter().all(|r| r.fatalities > 0));
    }

    #[tokio::test]
    async fn unplottable_fatal_record_is_kept() {
        let (client, _) = client();
        let filters = MapFilters::fatalities_only(FatalityFilter::Yes);
        let records = fetch_map_data(&client, Some(&filters)).await.unwrap();
        assert!(records[0].coordinates().is_none());
    }

    #[tokio::test]
    async fn everything_else_returns_full_collection() {
        let (client, transport) = client();
        let unset = MapFilters::default();
        let no = MapFilters::fatalities_only(FatalityFilter::No);

        for options in [None, Some(&unset), Some(&no)] {
            let records = fetch_map_data(&client, options).await.unwrap();
            assert_eq!(streets(&records), ["A", "B", "C", "D"]);
        }
        assert_eq!(transport.calls(Endpoint::MapData), 3);
    }

    #[tokio::test]
    async fn same_options_give_same_output() {
        let (client, _) = client();
        let filters = MapFilters::fatalities_only(FatalityFilter::Yes);
        let first = fetch_map_data(&client, Some(&filters)).await.unwrap();
        let second = fetch_map_data(&client, Some(&filters)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_response_is_empty_collection() {
        let transport = Arc::new(StaticTransport::new().with_body(Endpoint::MapData, ""));
        let client = ApiClient::with_transport(transport);
        let filters = MapFilters::fatalities_only(FatalityFilter::Yes);
        assert!(
            fetch_map_data(&client, Some(&filters))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn failure_is_an_error_not_empty() {
        let transport = Arc::new(StaticTransport::new().with_status(Endpoint::MapData, 503));
        let client = ApiClient::with_transport(transport);
        assert!(fetch_map_data(&client, None).await.is_err());
    }
}
