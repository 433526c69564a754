#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The traffic accident statistics dashboard.
//!
//! [`Dashboard`] wires the API client, the filter store and the query
//! cache together. Each widget of the dashboard has one method that
//! returns its render-ready data as a [`QueryState`]: the raw statistic
//! rows are fetched once per cache key and the chart transformers run on
//! top of the cached rows.

pub mod config;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use traffic_stats_accident_models::{
    AccidentsByMonth, CarTypeMetric, CarTypesData, IntoxicatedDriverRow, MarkerRecord, StatsData,
};
use traffic_stats_charts::{
    ChartSeriesPoint, DonutSeries, LineSeries, StackedSeries, car_types_donut, monthly_trend,
    plottable_markers, sober_vs_intoxicated, stat_cards,
};
use traffic_stats_client::{ApiClient, Endpoint, Payload, map::fetch_map_data};
use traffic_stats_filters::{FATALITIES_ONLY_PARAM, FilterStore, MapFilters};
use traffic_stats_query::{QueryClient, QueryError, QueryKey, QueryState};

pub use config::{ConfigError, DashboardConfig};

/// Cache key names, one per backend dataset.
pub mod keys {
    /// `GET /api/mapData` (plus the effective fatality filter).
    pub const MAP_DATA: &str = "mapData";
    /// `GET /api/carType`.
    pub const CAR_TYPES: &str = "carTypes";
    /// `GET /api/intoxicatedDrivers`.
    pub const INTOXICATED_DRIVERS: &str = "intoxicatedDrivers";
    /// `GET /api/stats`.
    pub const STATS: &str = "stats";
    /// `GET /api/accidents_by_month`.
    pub const ACCIDENTS_BY_MONTH: &str = "accidentsByMonth";
    /// Parameter carrying the dataset period.
    pub const PERIOD_PARAM: &str = "period";
}

/// Errors surfaced by the dashboard binary.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A widget's query failed.
    #[error("{0}")]
    Query(Arc<QueryError>),

    /// A widget's query had not settled.
    #[error("query {0} is still loading")]
    Pending(String),

    /// Output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Turns a settled [`QueryState`] into a `Result`.
///
/// # Errors
///
/// Returns [`DashboardError::Query`] for a failed query and
/// [`DashboardError::Pending`] for one still loading.
pub fn settled<T>(name: &str, state: QueryState<T>) -> Result<Arc<T>, DashboardError> {
    match state {
        QueryState::Success(data) => Ok(data),
        QueryState::Error(e) => Err(DashboardError::Query(e)),
        QueryState::Loading => Err(DashboardError::Pending(name.to_string())),
    }
}

/// One dashboard session: an API client, the map filters and a query
/// cache shared by every widget.
#[derive(Debug, Clone)]
pub struct Dashboard {
    api: ApiClient,
    queries: QueryClient,
    filters: FilterStore,
    period: String,
}

impl Dashboard {
    /// Creates a session for `config` with default filters.
    #[must_use]
    pub fn new(config: &DashboardConfig) -> Self {
        Self::with_client(ApiClient::new(&config.api_url), &config.period)
    }

    /// Creates a session on top of an existing API client.
    #[must_use]
    pub fn with_client(api: ApiClient, period: &str) -> Self {
        Self {
            api,
            queries: QueryClient::new(),
            filters: FilterStore::default(),
            period: period.to_string(),
        }
    }

    /// Replaces the filter store, e.g. with one restored from a shared
    /// link.
    #[must_use]
    pub fn with_filters(mut self, filters: FilterStore) -> Self {
        self.filters = filters;
        self
    }

    /// The map filters of this session.
    #[must_use]
    pub const fn filters(&self) -> &FilterStore {
        &self.filters
    }

    /// The query cache of this session.
    #[must_use]
    pub const fn queries(&self) -> &QueryClient {
        &self.queries
    }

    /// Cache key for `name` in this session's period.
    #[must_use]
    pub fn key(&self, name: &str) -> QueryKey {
        QueryKey::new(name).with_param(keys::PERIOD_PARAM, self.period.as_str())
    }

    /// Cache key for the map markers under the current filters.
    ///
    /// Unset and `No` share a key since both show every accident.
    #[must_use]
    pub fn map_data_key(&self) -> QueryKey {
        self.map_data_key_for(self.filters.filters())
    }

    /// Cache key for the map markers under `filters`.
    #[must_use]
    pub fn map_data_key_for(&self, filters: MapFilters) -> QueryKey {
        self.key(keys::MAP_DATA).with_param(FATALITIES_ONLY_PARAM, filters.effective_key())
    }

    /// Accident markers under the current filters.
    ///
    /// The filters are read once; the key and the fetch both use that
    /// snapshot.
    pub async fn map_data(&self) -> QueryState<Vec<MarkerRecord>> {
        let filters = self.filters.filters();
        self.map_data_with(filters).await
    }

    /// Accident markers under `filters`, cached under the matching key.
    pub async fn map_data_with(&self, filters: MapFilters) -> QueryState<Vec<MarkerRecord>> {
        let api = self.api.clone();

        self.queries
            .fetch(self.map_data_key_for(filters), move || async move {
                fetch_map_data(&api, Some(&filters)).await
            })
            .await
    }

    /// Accident markers under the current filters, optionally limited to
    /// the ones that can be drawn.
    pub async fn map_markers(&self, plottable_only: bool) -> QueryState<Vec<MarkerRecord>> {
        let state = self.map_data().await;
        if !plottable_only {
            return state;
        }
        state.map(|records| {
            plottable_markers(records)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
    }

    /// Accidents and deaths per car make.
    pub async fn car_types(&self) -> QueryState<CarTypesData> {
        self.fetch_endpoint(keys::CAR_TYPES, Endpoint::CarType).await
    }

    /// Sober vs. intoxicated drivers per month.
    pub async fn intoxicated_drivers(&self) -> QueryState<Vec<IntoxicatedDriverRow>> {
        self.fetch_endpoint(keys::INTOXICATED_DRIVERS, Endpoint::IntoxicatedDrivers)
            .await
    }

    /// Headline statistics.
    pub async fn stats(&self) -> QueryState<StatsData> {
        self.fetch_endpoint(keys::STATS, Endpoint::Stats).await
    }

    /// Accidents and deaths per month.
    pub async fn accidents_by_month(&self) -> QueryState<AccidentsByMonth> {
        self.fetch_endpoint(keys::ACCIDENTS_BY_MONTH, Endpoint::AccidentsByMonth)
            .await
    }

    /// Top car makes donut.
    pub async fn car_types_chart(&self, metric: CarTypeMetric) -> QueryState<DonutSeries> {
        self.car_types()
            .await
            .map(|data| car_types_donut(Some(data), metric))
    }

    /// Sober vs. intoxicated stacked bars.
    pub async fn sobriety_chart(&self) -> QueryState<StackedSeries> {
        self.intoxicated_drivers()
            .await
            .map(|rows| sober_vs_intoxicated(Some(rows.as_slice())))
    }

    /// Headline statistic cards.
    pub async fn stat_cards(&self) -> QueryState<Vec<ChartSeriesPoint>> {
        self.stats().await.map(|data| stat_cards(Some(data)))
    }

    /// Monthly accidents/deaths lines.
    pub async fn trend_chart(&self) -> QueryState<LineSeries> {
        self.accidents_by_month()
            .await
            .map(|data| monthly_trend(Some(data)))
    }

    async fn fetch_endpoint<T>(&self, name: &str, endpoint: Endpoint) -> QueryState<T>
    where
        T: DeserializeOwned + Default + Send + Sync + 'static,
    {
        let api = self.api.clone();

        self.queries
            .fetch(self.key(name), move || async move {
                api.get_json::<T>(endpoint)
                    .await
                    .map(Payload::unwrap_or_default)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use traffic_stats_client::{ClientError, StaticTransport};
    use traffic_stats_filters::FatalityFilter;

    use super::*;

    const MAP_BODY: &str = r#"[
        {"zuvusiuSkaicius": 0, "gatve": "A", "lat": 54.6, "lon": 25.2},
        {"zuvusiuSkaicius": 2, "gatve": "B", "lat": 54.7, "lon": 25.3},
        {"zuvusiuSkaicius": 1, "gatve": "C"}
    ]"#;

    fn dashboard(transport: &Arc<StaticTransport>) -> Dashboard {
        Dashboard::with_client(ApiClient::with_transport(transport.clone()), "2023")
    }

    #[tokio::test]
    async fn same_key_is_fetched_once() {
        let transport = Arc::new(StaticTransport::new().with_body(
            Endpoint::CarType,
            r#"{"accidents_top":[{"marke":"Toyota","total_accidents":10},{"marke":"BMW","total_accidents":7}]}"#,
        ));
        let dashboard = dashboard(&transport);

        let accidents = dashboard.car_types_chart(CarTypeMetric::Accidents).await;
        let deaths = dashboard.car_types_chart(CarTypeMetric::Deaths).await;

        assert_eq!(transport.calls(Endpoint::CarType), 1);
        let accidents = accidents.data().unwrap();
        assert_eq!(accidents.labels, ["Toyota", "BMW"]);
        assert_eq!(accidents.values, [10, 7]);
        assert!(deaths.data().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_widgets_share_one_fetch() {
        let transport = Arc::new(StaticTransport::new().with_body(
            Endpoint::IntoxicatedDrivers,
            r#"[{"time":"2023-01","sober_count":5,"intoxicated_count":1}]"#,
        ));
        let dashboard = dashboard(&transport);

        let (chart, rows) =
            futures::join!(dashboard.sobriety_chart(), dashboard.intoxicated_drivers());

        assert_eq!(transport.calls(Endpoint::IntoxicatedDrivers), 1);
        assert_eq!(rows.data().unwrap().len(), 1);
        let chart = chart.data().unwrap();
        assert_eq!(chart.categories, ["2023-01"]);
        assert_eq!(chart.series[0].data, [5]);
        assert_eq!(chart.series[1].data, [1]);
    }

    #[tokio::test]
    async fn fatality_filter_changes_the_map_key() {
        let transport = Arc::new(StaticTransport::new().with_body(Endpoint::MapData, MAP_BODY));
        let dashboard = dashboard(&transport);

        let all = dashboard.map_data().await;
        assert_eq!(all.data().unwrap().len(), 3);

        dashboard
            .filters()
            .set_filters(MapFilters::fatalities_only(FatalityFilter::Yes));
        let fatal = dashboard.map_data().await;
        let streets: Vec<_> = fatal
            .data()
            .unwrap()
            .iter()
            .filter_map(|r| r.street.as_deref())
            .collect();
        assert_eq!(streets, ["B", "C"]);
        assert_eq!(transport.calls(Endpoint::MapData), 2);

        // "No" shows everything, so it reuses the unset entry.
        dashboard
            .filters()
            .set_filters(MapFilters::fatalities_only(FatalityFilter::No));
        assert_eq!(dashboard.map_data().await.data().unwrap().len(), 3);
        assert_eq!(transport.calls(Endpoint::MapData), 2);
    }

    #[tokio::test]
    async fn map_results_are_cached_under_the_filters_they_used() {
        let transport = Arc::new(StaticTransport::new().with_body(Endpoint::MapData, MAP_BODY));
        let dashboard = dashboard(&transport);
        let fatal = MapFilters::fatalities_only(FatalityFilter::Yes);

        // The store says "all" while the fetch runs with a "yes" snapshot.
        let state = dashboard.map_data_with(fatal).await;
        assert_eq!(state.data().unwrap().len(), 2);

        let cached = dashboard
            .queries()
            .peek::<Vec<MarkerRecord>>(&dashboard.map_data_key_for(fatal))
            .unwrap();
        assert_eq!(cached.data().unwrap().len(), 2);
        assert!(
            dashboard
                .queries()
                .peek::<Vec<MarkerRecord>>(&dashboard.map_data_key())
                .is_none()
        );
    }

    #[tokio::test]
    async fn plottable_markers_drop_missing_coordinates() {
        let transport = Arc::new(StaticTransport::new().with_body(Endpoint::MapData, MAP_BODY));
        let dashboard = dashboard(&transport);

        let markers = dashboard.map_markers(true).await;
        assert_eq!(markers.data().unwrap().len(), 2);
        assert_eq!(dashboard.map_markers(false).await.data().unwrap().len(), 3);
        assert_eq!(transport.calls(Endpoint::MapData), 1);
    }

    #[tokio::test]
    async fn empty_response_renders_empty_series() {
        let transport = Arc::new(
            StaticTransport::new()
                .with_body(Endpoint::Stats, "")
                .with_body(Endpoint::AccidentsByMonth, "null"),
        );
        let dashboard = dashboard(&transport);

        assert!(dashboard.stat_cards().await.data().unwrap().is_empty());
        let trend = dashboard.trend_chart().await;
        assert!(
            trend
                .data()
                .unwrap()
                .series
                .iter()
                .all(|s| s.points.is_empty())
        );
    }

    #[tokio::test]
    async fn failures_are_errors_and_stay_cached() {
        let transport = Arc::new(StaticTransport::new().with_status(Endpoint::Stats, 500));
        let dashboard = dashboard(&transport);

        let state = dashboard.stats().await;
        assert!(state.is_error());
        assert!(dashboard.stat_cards().await.is_error());
        assert_eq!(transport.calls(Endpoint::Stats), 1);

        let err = settled("stats", state).unwrap_err();
        assert!(matches!(err, DashboardError::Query(_)));

        assert!(dashboard.queries().invalidate(&dashboard.key(keys::STATS)));
        assert!(dashboard.stats().await.is_error());
        assert_eq!(transport.calls(Endpoint::Stats), 2);
    }

    #[tokio::test]
    async fn fetch_error_keeps_its_source() {
        let transport = Arc::new(StaticTransport::new().with_body(Endpoint::Stats, "{"));
        let dashboard = dashboard(&transport);

        let state = dashboard.stats().await;
        let Some(QueryError::Fetch(source)) = state.error() else {
            panic!("expected a fetch error, got {state:?}");
        };
        assert!(matches!(
            source.downcast_ref::<ClientError>(),
            Some(ClientError::Json(_))
        ));
    }

    #[test]
    fn keys_include_period() {
        let transport = Arc::new(StaticTransport::new());
        let dashboard = dashboard(&transport);
        assert_eq!(dashboard.key(keys::STATS).param(keys::PERIOD_PARAM), Some("2023"));
        assert_eq!(
            dashboard.map_data_key().param(FATALITIES_ONLY_PARAM),
            Some("all")
        );
    }
}
