#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the displacement choreography pipeline.
//!
//! Loads the event and region CSV files, aggregates places, ranks them at
//! the requested granularity, and then either prints the ranking, prints
//! the movement score of one place, or plays the navigator: key names are
//! read from stdin one per line and every resulting view model is printed
//! as a line of JSON.

mod load;

use std::io::{BufRead as _, Write as _};
use std::path::PathBuf;

use choreo_aggregate::PlaceAggregator;
use choreo_aggregate_models::{Place, RankingResult};
use choreo_config::DomainConfig;
use choreo_event_models::EventStore;
use choreo_geography_models::{GeographyTable, Granularity};
use choreo_hazard_models::HazardType;
use choreo_navigation::Navigator;
use choreo_navigation_models::Command;
use choreo_score::{ScoreEngine, render_score_table, thousands};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "choreo", about = "Disaster displacement choreography")]
struct Cli {
    /// Event CSV (`country, code, year, start, crisis_category, hazard_type,
    /// displaced, event`)
    #[arg(long, default_value = "data/idmc_disaster.csv")]
    events: PathBuf,
    /// Region lookup CSV (`name, alpha3, region, subRegion`)
    #[arg(long, default_value = "data/regions.csv")]
    regions: PathBuf,
    /// Level to rank at: country, region, or subregion (defaults to the config)
    #[arg(long, value_parser = parse_granularity)]
    granularity: Option<Granularity>,
    /// Number of top places (defaults to the config)
    #[arg(long)]
    max: Option<usize>,
    /// Domain config TOML replacing the built-in one
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ranked places and their combined hazard totals
    Rank,
    /// Print the movement score of a ranked place, year by year
    Score {
        /// Position in the ranking, starting at 0
        #[arg(long, default_value = "0")]
        place: usize,
    },
    /// Read key names from stdin and print each view model as JSON
    Play,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DomainConfig::load(path)?,
        None => DomainConfig::embedded()?,
    };
    let defaults = config.ranking();
    let granularity = cli.granularity.unwrap_or(defaults.granularity);
    let max = cli.max.unwrap_or(defaults.max);

    let store = EventStore::from_raw_rows(&load::read_events(&cli.events)?);
    let table = GeographyTable::from_rows(load::read_regions(&cli.regions)?);
    log::info!(
        "Loaded {} events ({} rows skipped) and {} geography rows",
        store.len(),
        store.skipped_rows(),
        table.len()
    );

    let aggregator = PlaceAggregator::new(&config, table);
    let countries = aggregator.build_countries(&store)?;
    let geographies = aggregator.build_geographies(&countries)?;
    let places: &[Place] = match granularity {
        Granularity::Country => &countries,
        Granularity::Region => &geographies.regions,
        Granularity::Subregion => &geographies.sub_regions,
    };
    let ranking = choreo_ranking::select_top(places, granularity, max)?;

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Rank => {
            print_ranking(&ranking);
            print_vocabulary(&config, &store);
        }
        Commands::Score { place } => {
            let place = ranking
                .top_places
                .get(place)
                .ok_or_else(|| format!("No ranked place at position {place}"))?;
            println!("{}", place.name);
            let score = ScoreEngine::new(&config).compute_score(place);
            for entry in score.entries() {
                println!();
                print!("{}", render_score_table(entry));
            }
        }
        Commands::Play => play(&config, &ranking)?,
    }

    Ok(())
}

fn parse_granularity(raw: &str) -> Result<Granularity, String> {
    raw.parse()
        .map_err(|_| format!("expected country, region, or subregion, got '{raw}'"))
}

/// Observed hazards that no key filters by.
fn unbound_hazards(config: &DomainConfig, observed: &[HazardType]) -> Vec<HazardType> {
    observed
        .iter()
        .copied()
        .filter(|&hazard| {
            !config
                .key_bindings()
                .any(|(_, command)| command == Command::FilterByHazard(hazard))
        })
        .collect()
}

fn print_vocabulary(config: &DomainConfig, store: &EventStore) {
    let observed = store.observed_categories();
    let categories: Vec<&str> = observed.iter().map(AsRef::as_ref).collect();
    println!();
    println!("Crisis categories: {}", categories.join(", "));

    for hazard in unbound_hazards(config, &store.observed_hazards()) {
        log::warn!("Hazard {hazard} appears in the events but has no filter key");
    }
}

fn print_ranking(ranking: &RankingResult) {
    println!(
        "{:<4} {:<40} DISPLACED",
        "#",
        ranking.granularity.as_ref().to_uppercase()
    );
    println!("{}", "-".repeat(60));
    for (i, place) in ranking.top_places.iter().enumerate() {
        println!(
            "{:<4} {:<40} {}",
            i + 1,
            place.name,
            thousands(place.total_displaced)
        );
    }

    println!();
    println!("{:<45} {:>8} DISPLACED", "HAZARD", "EVENTS");
    println!("{}", "-".repeat(70));
    for hazard in ranking.top_hazards.by_frequency() {
        if hazard.frequency == 0 {
            continue;
        }
        println!(
            "{:<45} {:>8} {}",
            hazard.key.as_ref(),
            thousands(hazard.frequency),
            thousands(hazard.total_displaced)
        );
    }
}

fn play(
    config: &DomainConfig,
    ranking: &RankingResult,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut navigator = Navigator::new(config, ranking)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    serde_json::to_writer(&mut out, &navigator.view())?;
    writeln!(out)?;

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let key = line.trim();
        if key.is_empty() {
            continue;
        }
        if let Some(transition) = navigator.apply_key(key) {
            serde_json::to_writer(&mut out, &transition)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
