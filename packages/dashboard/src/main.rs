#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the traffic accident statistics dashboard.
//!
//! ```text
//! traffic_stats map [--fatalities-only yes|no] [--plottable]
//! traffic_stats car-types [--metric accidents|deaths]
//! traffic_stats sobriety
//! traffic_stats stats
//! traffic_stats trend
//! traffic_stats all
//! ```
//!
//! Every command prints the render-ready series as pretty JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use traffic_stats_accident_models::CarTypeMetric;
use traffic_stats_charts::{ChartSeriesPoint, DonutSeries, LineSeries, StackedSeries};
use traffic_stats_dashboard::{Dashboard, DashboardConfig, DashboardError, keys, settled};
use traffic_stats_filters::{FatalityFilter, FilterStore, MapFilters};

#[derive(Parser)]
#[command(
    name = "traffic_stats",
    about = "Traffic accident statistics from the precomputed stats API"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the statistics API (overrides config and environment)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Dataset period (overrides config and environment)
    #[arg(long, global = true)]
    period: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accident markers for the map
    Map {
        /// Only fatal accidents (`yes`) or all of them (`no`)
        #[arg(long)]
        fatalities_only: Option<FatalityFilter>,

        /// Restore filters from a shared query string, e.g. `fatalitiesOnly=yes`
        #[arg(long, conflicts_with = "fatalities_only")]
        link: Option<String>,

        /// Drop markers without usable coordinates
        #[arg(long)]
        plottable: bool,
    },
    /// Top car makes donut
    CarTypes {
        /// Rank makes by `accidents` or `deaths`
        #[arg(long, default_value = "accidents")]
        metric: CarTypeMetric,
    },
    /// Sober vs. intoxicated drivers per month
    Sobriety,
    /// Headline statistics
    Stats,
    /// Accidents and deaths per month
    Trend,
    /// Every widget of the dashboard
    All,
}

/// Everything the dashboard page shows at once.
#[derive(Serialize)]
struct Overview<'a> {
    stats: &'a [ChartSeriesPoint],
    trend: &'a LineSeries,
    car_types: &'a DonutSeries,
    sobriety: &'a StackedSeries,
    markers: usize,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), DashboardError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config =
        DashboardConfig::load(cli.config.as_deref())?.with_overrides(cli.api_url, cli.period);
    log::info!(
        "Using statistics API at {} (period {})",
        config.api_url,
        config.period
    );

    let dashboard = Dashboard::new(&config);

    match cli.command {
        Commands::Map {
            fatalities_only,
            link,
            plottable,
        } => {
            let dashboard = match link {
                Some(link) => dashboard.with_filters(FilterStore::from_query(&link)),
                None => dashboard,
            };
            if let Some(value) = fatalities_only {
                dashboard
                    .filters()
                    .set_filters(MapFilters::fatalities_only(value));
            }
            log::info!("Shareable filters: ?{}", dashboard.filters().to_query());

            let markers = settled(keys::MAP_DATA, dashboard.map_markers(plottable).await)?;
            print_json(markers.as_slice())?;
        }
        Commands::CarTypes { metric } => {
            let chart = settled(keys::CAR_TYPES, dashboard.car_types_chart(metric).await)?;
            print_json(&*chart)?;
        }
        Commands::Sobriety => {
            let chart =
                settled(keys::INTOXICATED_DRIVERS, dashboard.sobriety_chart().await)?;
            print_json(&*chart)?;
        }
        Commands::Stats => {
            let cards = settled(keys::STATS, dashboard.stat_cards().await)?;
            print_json(cards.as_slice())?;
        }
        Commands::Trend => {
            let chart = settled(keys::ACCIDENTS_BY_MONTH, dashboard.trend_chart().await)?;
            print_json(&*chart)?;
        }
        Commands::All => {
            let (stats, trend, car_types, sobriety, markers) = futures::join!(
                dashboard.stat_cards(),
                dashboard.trend_chart(),
                dashboard.car_types_chart(CarTypeMetric::default()),
                dashboard.sobriety_chart(),
                dashboard.map_markers(true),
            );

            let stats = settled(keys::STATS, stats)?;
            let trend = settled(keys::ACCIDENTS_BY_MONTH, trend)?;
            let car_types = settled(keys::CAR_TYPES, car_types)?;
            let sobriety = settled(keys::INTOXICATED_DRIVERS, sobriety)?;
            let markers = settled(keys::MAP_DATA, markers)?;

            print_json(&Overview {
                stats: &stats,
                trend: &trend,
                car_types: &car_types,
                sobriety: &sobriety,
                markers: markers.len(),
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_map_flags() {
        let cli = Cli::try_parse_from([
            "traffic_stats",
            "map",
            "--fatalities-only",
            "yes",
            "--plottable",
        ])
        .unwrap();

        let Commands::Map {
            fatalities_only,
            link,
            plottable,
        } = cli.command
        else {
            panic!("expected the map command");
        };
        assert_eq!(fatalities_only, Some(FatalityFilter::Yes));
        assert!(link.is_none());
        assert!(plottable);
    }

    #[test]
    fn parses_car_type_metric() {
        let cli =
            Cli::try_parse_from(["traffic_stats", "car-types", "--metric", "deaths"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::CarTypes {
                metric: CarTypeMetric::Deaths
            }
        ));

        let cli = Cli::try_parse_from(["traffic_stats", "car-types"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::CarTypes {
                metric: CarTypeMetric::Accidents
            }
        ));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "traffic_stats",
            "stats",
            "--api-url",
            "http://stats.example",
            "--period",
            "2022",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Stats));
        assert_eq!(cli.api_url.as_deref(), Some("http://stats.example"));
        assert_eq!(cli.period.as_deref(), Some("2022"));
    }

    #[test]
    fn rejects_unknown_filter_value() {
        let err = Cli::try_parse_from(["traffic_stats", "map", "--fatalities-only", "maybe"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn link_conflicts_with_explicit_filter() {
        let err = Cli::try_parse_from([
            "traffic_stats",
            "map",
            "--fatalities-only",
            "yes",
            "--link",
            "fatalitiesOnly=no",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }
}
