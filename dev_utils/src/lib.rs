use std::sync::Arc;

use chrono::NaiveDate;
use gtfs_structures::{Error, Gtfs, GtfsReader};
use rayon::prelude::*;

use csa::network::{Connection, RouteInfo, Stop, StopIndex, Timestamp, TransportMode, TripIndex};
use csa::{earliest_arrival, utils, Coordinate, JourneyError, Network, NetworkConfig};

// Common example data for the demos, tests and benchmarks.

// A feed under dev_utils/gtfs.
pub fn load_gtfs(name: &str) -> Result<Gtfs, Error> {
    let gtfs_dir = format!("{}/gtfs/{}", env!("CARGO_MANIFEST_DIR"), name);
    GtfsReader::default().read_shapes(false).read(&gtfs_dir)
}

pub fn load_example_gtfs() -> Result<Gtfs, Error> { load_gtfs("tiny") }

// The Brussels feed and a regional bus feed starting next to Merode, with clashing stop ids.
pub fn build_example_regional_network(date: NaiveDate) -> Network {
    let city = load_example_gtfs().unwrap();
    let region = load_gtfs("tec").unwrap();
    Network::from_gtfs_feeds(&[("BXL", &city), ("TEC", &region)], date, &NetworkConfig::default()).unwrap()
}

// A Friday.
pub fn get_example_date() -> NaiveDate {
    const { utils::const_unwrap(NaiveDate::from_ymd_opt(2024, 5, 10)) }
}

// A Thursday on which the weekend timetable runs.
pub fn get_example_holiday() -> NaiveDate {
    const { utils::const_unwrap(NaiveDate::from_ymd_opt(2024, 8, 15)) }
}

pub fn build_example_network(gtfs: &Gtfs, date: NaiveDate) -> Network {
    Network::from_gtfs(gtfs, date, &NetworkConfig::default()).unwrap()
}

pub fn get_example_start_time() -> Timestamp {
    utils::parse_time("07:55:00").unwrap()
}

pub fn get_example_start_stop_idx(network: &Network) -> StopIndex {
    network.get_stop_idx_from_name("Gare du Midi").unwrap()
}

pub fn get_example_end_stop_idx(network: &Network) -> StopIndex {
    network.get_stop_idx_from_name("Merode").unwrap()
}

pub fn get_example_scenario() -> (Network, StopIndex, Timestamp, StopIndex) {
    let gtfs = load_example_gtfs().unwrap();
    let network = build_example_network(&gtfs, get_example_date());
    let start = get_example_start_stop_idx(&network);
    let start_time = get_example_start_time();
    let end = get_example_end_stop_idx(&network);
    (network, start, start_time, end)
}

/// A `side` x `side` grid of stops roughly 330 m apart, with a line along every row and column in both directions.
///
/// Trips leave every `headway` seconds between 06:00 and 10:00, so neighbouring stops are also linked by footpaths.
pub fn synthetic_network(side: u32, headway: Timestamp, seed: u64) -> Network {
    let mut rng = fastrand::Rng::with_seed(seed);
    let operator: Arc<str> = Arc::from("SYNTH");

    let mut stops = Vec::with_capacity((side * side) as usize);
    for row in 0..side {
        for col in 0..side {
            let coord = Coordinate::new(50.0 + row as f64 * 0.003, 4.0 + col as f64 * 0.0047);
            stops.push(Stop::new(&format!("{row}-{col}"), &format!("Stop {row}-{col}"), coord, operator.clone()));
        }
    }

    let mut lines: Vec<Vec<StopIndex>> = Vec::new();
    for i in 0..side {
        lines.push((0..side).map(|col| i * side + col).collect());
        lines.push((0..side).map(|row| row * side + i).collect());
    }

    let mut trip_ids: Vec<Box<str>> = Vec::new();
    let mut connections = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        for (direction, stops_in_order) in [line.clone(), line.iter().rev().copied().collect()].into_iter().enumerate() {
            let mode = if rng.bool() { TransportMode::Bus } else { TransportMode::Tram };
            let name = format!("L{line_idx}");
            let route = Arc::new(RouteInfo::new(&format!("{name}-{direction}"), &name, mode, operator.clone()));

            let mut start_time = 6 * 3600 + rng.u32(0..headway);
            while start_time < 10 * 3600 {
                let trip = trip_ids.len() as TripIndex;
                trip_ids.push(format!("{name}-{direction}-{start_time}").into());
                let mut time = start_time;
                for hop in stops_in_order.windows(2) {
                    let arrival_time = time + rng.u32(45..90);
                    connections.push(Connection {
                        trip,
                        route: route.clone(),
                        departure_stop: hop[0],
                        departure_time: time,
                        arrival_stop: hop[1],
                        arrival_time,
                    });
                    // Dwell.
                    time = arrival_time + 20;
                }
                start_time += headway;
            }
        }
    }

    Network::new(stops, trip_ids, connections, &NetworkConfig::default())
}

pub fn random_queries(network: &Network, count: usize, seed: u64) -> Vec<(StopIndex, StopIndex, Timestamp)> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let num_stops = network.num_stops() as StopIndex;
    (0..count)
        .map(|_| {
            let from = rng.u32(0..num_stops);
            let to = (from + rng.u32(1..num_stops)) % num_stops;
            (from, to, rng.u32(6 * 3600..9 * 3600))
        })
        .collect()
}

// Queries only read the network, so they can share it across threads.
pub fn run_queries_in_parallel(
    network: &Network,
    queries: &[(StopIndex, StopIndex, Timestamp)],
) -> Vec<Result<Timestamp, JourneyError>> {
    queries
        .par_iter()
        .map(|&(from, to, start_time)| earliest_arrival(network, &[from], &[to], start_time).map(|result| result.arrival_time))
        .collect()
}
