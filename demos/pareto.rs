use csa::{pareto_journeys, utils, FootpathsCount, TransfersCount};

use dev_utils::get_example_scenario;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (network, start, start_time, end) = get_example_scenario();
    println!(
        "Start: {} at time {}",
        network.get_stop(start).name,
        utils::get_time_str(start_time)
    );
    println!("End: {}", network.get_stop(end).name);
    println!();

    let profile = pareto_journeys(&network, start, end, start_time, TransfersCount::default())?;
    for option in profile.journeys() {
        println!("{} arriving at {}:", option.tracker, utils::get_time_str(option.arrival_time));
        println!("{}", profile.reconstruct(&option.tracker)?);
    }

    let profile = pareto_journeys(&network, start, end, start_time, FootpathsCount::default())?;
    let fewest_walks = profile.best_by(|option| option.tracker.footpaths);
    if let Some(option) = fewest_walks {
        println!("With the fewest footpaths ({}):", option.tracker);
        println!("{}", profile.reconstruct(&option.tracker)?);
    }

    Ok(())
}
