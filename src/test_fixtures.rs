// Small hand-built networks shared by the unit tests.
use std::sync::Arc;

use crate::network::{Connection, Footpath, RouteInfo, Stop, StopIndex, Timestamp, TransportMode, TripIndex};
use crate::{Coordinate, Network, NetworkConfig};

pub(crate) fn stop(id: &str, name: &str, lat: f64, lon: f64) -> Stop {
    Stop::new(id, name, Coordinate::new(lat, lon), Arc::from("TEST"))
}

pub(crate) fn route(name: &str, mode: TransportMode) -> Arc<RouteInfo> {
    Arc::new(RouteInfo::new(name, name, mode, Arc::from("TEST")))
}

pub(crate) fn connection(
    trip: TripIndex,
    route: &Arc<RouteInfo>,
    departure_stop: StopIndex,
    departure_time: Timestamp,
    arrival_stop: StopIndex,
    arrival_time: Timestamp,
) -> Connection {
    Connection { trip, route: route.clone(), departure_stop, departure_time, arrival_stop, arrival_time }
}

// Stops far enough apart that no footpath is generated between them.
pub(crate) fn distant_stops(n: usize) -> Vec<Stop> {
    (0..n).map(|i| stop(&i.to_string(), &format!("Stop {i}"), 50.0 + i as f64 * 0.1, 4.0)).collect()
}

/// Builds a network from `(trip, from, dep, to, arr)` tuples and explicit footpaths.
pub(crate) fn network(
    num_stops: usize,
    connections: &[(TripIndex, StopIndex, Timestamp, StopIndex, Timestamp)],
    footpaths: &[(StopIndex, StopIndex, Timestamp)],
) -> Network {
    let bus = route("B", TransportMode::Bus);
    let num_trips = connections.iter().map(|c| c.0 + 1).max().unwrap_or(0);
    let trip_ids: Vec<Box<str>> = (0..num_trips).map(|trip| format!("trip{trip}").into()).collect();
    let connections = connections
        .iter()
        .map(|&(trip, from, dep, to, arr)| connection(trip, &bus, from, dep, to, arr))
        .collect();
    let mut network = Network::new(distant_stops(num_stops), trip_ids, connections, &NetworkConfig::without_footpaths());
    network.set_footpaths(
        footpaths
            .iter()
            .map(|&(from, to, duration)| Footpath::with_duration(from, to, duration))
            .collect(),
    );
    network
}

/// The five-stop toy network, with a footpath 4 <-> 3 of the given duration.
pub(crate) fn toy_network(footpath_duration: Timestamp) -> Network {
    network(
        5,
        &[
            (0, 0, 0, 1, 1),
            (1, 1, 1, 3, 2),
            (2, 0, 1, 2, 3),
            (3, 2, 3, 3, 4),
            (4, 0, 0, 4, 0),
            (5, 4, 0, 2, 2),
            (6, 4, 0, 1, 1),
        ],
        &[(4, 3, footpath_duration), (3, 4, footpath_duration)],
    )
}
