use csa::{earliest_arrival, utils, Network, NetworkConfig};

use dev_utils::{get_example_date, load_example_gtfs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Load GTFS timetable from disk.
    let gtfs = load_example_gtfs()?;

    // Parse into network format, based on a specific date.
    let network = Network::from_gtfs(&gtfs, get_example_date(), &NetworkConfig::default())?;
    network.log_stats();

    let start = network.get_stop_idx_from_name("Gare du Midi").ok_or("Unknown stop")?;
    let start_time = utils::parse_time("07:55:00")?;
    let end = network.get_stop_idx_from_name("Schuman Bus").ok_or("Unknown stop")?;
    let result = earliest_arrival(&network, &[start], &[end], start_time)?;

    println!("{}", result.journey);

    Ok(())
}
