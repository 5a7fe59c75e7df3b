pub mod geometry;

pub use geometry::Coordinate;

pub mod ball_tree;

pub use ball_tree::BallTree;

pub mod config;

pub use config::NetworkConfig;

pub mod network;

pub use network::{Connection, Footpath, Movement, Network, RouteInfo, Stop, TransportMode};

pub mod gtfs;

pub mod criteria;

pub use criteria::{CriteriaTracker, FootpathsCount, ModeCount, TransfersCount};

pub mod profile;

pub use profile::ProfileFunction;

pub mod journey;

pub use journey::{Instruction, Journey, JourneyError, Leg};

pub mod csa;

pub use csa::{earliest_arrival, EarliestArrival};

pub mod mc_csa;

pub use mc_csa::{pareto_journeys, ParetoOption, ParetoProfile};

pub mod utils;

#[cfg(test)]
mod test_fixtures;
