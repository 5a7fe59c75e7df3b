use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use gtfs_structures::{Gtfs, GtfsReader};

use csa::network::{StopIndex, Timestamp};
use csa::{earliest_arrival, pareto_journeys, utils, JourneyError, Network, NetworkConfig, TransfersCount};

#[derive(Parser, Debug)]
#[command(name = "csa", version, about = "Plan journeys over GTFS timetables with the Connection Scan Algorithm")]
struct Args {
    /// GTFS zip archive or directory. Repeat to merge several operators, whose ids then become "<file name>:<id>"
    #[arg(short, long = "gtfs", required = true)]
    gtfs: Vec<PathBuf>,

    /// Service date, as YYYY-MM-DD
    date: NaiveDate,

    /// Departure stop name or id
    from: String,

    /// Arrival stop name or id
    to: String,

    /// Departure time, as HH:MM:SS
    #[arg(value_parser = parse_start_time)]
    time: Timestamp,

    /// Longest footpath between two stops, in km
    #[arg(long, default_value_t = 0.5)]
    max_walk_km: f64,

    /// Walking speed on footpaths, in km/h
    #[arg(long, default_value_t = 5.0)]
    walking_speed_kmh: f64,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_start_time(time: &str) -> Result<Timestamp, String> {
    utils::parse_time(time).map_err(|error| error.to_string())
}

fn load_network(args: &Args) -> Result<Network, Box<dyn std::error::Error>> {
    let config = NetworkConfig::default()
        .with_max_footpath_distance_km(args.max_walk_km)
        .with_walking_speed_kmh(args.walking_speed_kmh);

    let feeds = args
        .gtfs
        .iter()
        .map(|path| -> Result<(String, Gtfs), gtfs_structures::Error> {
            let gtfs = GtfsReader::default().read_shapes(false).read_from_path(path)?;
            log::info!(
                "GTFS {} loaded with {} stops, {} routes, and {} trips.",
                path.display(),
                gtfs.stops.len(),
                gtfs.routes.len(),
                gtfs.trips.len()
            );
            let operator = path
                .file_stem()
                .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned());
            Ok((operator, gtfs))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let network = match feeds.as_slice() {
        [(_, gtfs)] => Network::from_gtfs(gtfs, args.date, &config)?,
        feeds => {
            let feeds: Vec<(&str, &Gtfs)> = feeds.iter().map(|(operator, gtfs)| (operator.as_str(), gtfs)).collect();
            Network::from_gtfs_feeds(&feeds, args.date, &config)?
        }
    };
    Ok(network)
}

// Stops are looked up by name first, then by id.
fn resolve_stops(network: &Network, stop: &str) -> Result<Vec<StopIndex>, JourneyError> {
    let by_name = network.stops_with_name(stop, None);
    if by_name.is_empty() {
        Ok(vec![network.resolve_stop(stop)?])
    } else {
        Ok(by_name)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    let network = load_network(&args)?;
    let departures = resolve_stops(&network, &args.from)?;
    let arrivals = resolve_stops(&network, &args.to)?;

    let result = match earliest_arrival(&network, &departures, &arrivals, args.time) {
        Ok(result) => result,
        Err(JourneyError::NoJourneyFound) => {
            println!("No journey found from {} to {} after {}.", args.from, args.to, utils::get_time_str(args.time));
            return Ok(());
        }
        Err(error) => return Err(error.into()),
    };
    println!("Earliest arrival at {} at {}.", network.get_stop(result.stop).name, utils::get_time_str(result.arrival_time));
    println!("{}", result.journey);

    // Trade arrival time against transfers between the two stops the fastest journey used.
    let departure = result.journey.legs.first().map_or(departures[0], |leg| leg.departure_stop());
    let profile = pareto_journeys(&network, departure, result.stop, args.time, TransfersCount::default())?;
    println!(
        "Options from {} to {}:",
        network.get_stop(profile.departure()).name,
        network.get_stop(profile.arrival()).name
    );
    for option in profile.journeys() {
        println!("  arrive at {} with {}.", utils::get_time_str(option.arrival_time), option.tracker);
    }
    if let Some(option) = profile.best_by(|option| (option.tracker.boardings, option.arrival_time)) {
        println!("Fewest transfers:");
        println!("{}", profile.reconstruct(&option.tracker)?);
    }

    Ok(())
}
