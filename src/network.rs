use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use crate::ball_tree::BallTree;
use crate::geometry::{walking_duration, Coordinate};
use crate::journey::JourneyError;
use crate::NetworkConfig;

// Timestamp is seconds since midnight.
pub type Timestamp = u32;
pub type StopIndex = u32;
pub type TripIndex = u32;
pub type FootpathIndex = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransportMode {
    Bus,
    Tram,
    Metro,
    Train,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Coach,
    Other,
}

impl Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransportMode::Bus => "bus",
            TransportMode::Tram => "tram",
            TransportMode::Metro => "metro",
            TransportMode::Train => "train",
            TransportMode::Ferry => "ferry",
            TransportMode::CableCar => "cable car",
            TransportMode::Gondola => "gondola",
            TransportMode::Funicular => "funicular",
            TransportMode::Coach => "coach",
            TransportMode::Other => "other",
        };
        f.write_str(name)
    }
}

// Compared by attribute, so routes loaded twice are still equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteInfo {
    pub id: Box<str>,
    pub name: Box<str>,
    pub mode: TransportMode,
    pub operator: Arc<str>,
}

impl RouteInfo {
    pub fn new(id: &str, name: &str, mode: TransportMode, operator: Arc<str>) -> Self {
        Self { id: id.into(), name: name.into(), mode, operator }
    }
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub id: Box<str>,
    pub name: Box<str>,
    pub coord: Coordinate,
    pub operator: Arc<str>,
    // First route seen serving this stop. Only used to tell apart stops sharing a name.
    pub route: Option<Arc<RouteInfo>>,
}

impl Stop {
    pub fn new(id: &str, name: &str, coord: Coordinate, operator: Arc<str>) -> Self {
        Self { id: id.into(), name: name.into(), coord, operator, route: None }
    }
}

// One vehicle hop between two consecutive stops of a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub trip: TripIndex,
    pub route: Arc<RouteInfo>,
    pub departure_stop: StopIndex,
    pub departure_time: Timestamp,
    pub arrival_stop: StopIndex,
    pub arrival_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footpath {
    pub departure_stop: StopIndex,
    pub arrival_stop: StopIndex,
    pub distance_km: f64,
    pub duration: Timestamp,
}

impl Footpath {
    pub fn walking(departure: (StopIndex, &Stop), arrival: (StopIndex, &Stop), walking_speed_kmh: f64) -> Self {
        let distance_km = departure.1.coord.distance_km(&arrival.1.coord);
        Self {
            departure_stop: departure.0,
            arrival_stop: arrival.0,
            distance_km,
            duration: walking_duration(distance_km, walking_speed_kmh),
        }
    }

    // A footpath with a known duration, e.g. from a transfer table.
    pub fn with_duration(departure_stop: StopIndex, arrival_stop: StopIndex, duration: Timestamp) -> Self {
        Self { departure_stop, arrival_stop, distance_km: 0.0, duration: duration.max(1) }
    }
}

/// An edge of the time-expanded network: either a ride on a connection or a walk along a footpath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Movement<'a> {
    Connection(&'a Connection),
    Footpath(&'a Footpath),
}

impl Movement<'_> {
    pub fn departure_stop(&self) -> StopIndex {
        match self {
            Movement::Connection(connection) => connection.departure_stop,
            Movement::Footpath(footpath) => footpath.departure_stop,
        }
    }

    pub fn arrival_stop(&self) -> StopIndex {
        match self {
            Movement::Connection(connection) => connection.arrival_stop,
            Movement::Footpath(footpath) => footpath.arrival_stop,
        }
    }
}

pub struct Network {
    pub stops: Vec<Stop>,
    pub stop_index: HashMap<String, StopIndex>,
    pub trip_ids: Vec<Box<str>>,
    // Sorted by departure time.
    pub connections: Vec<Connection>,
    // Sorted by departure stop, outgoing_idx[s]..outgoing_idx[s + 1] are the footpaths leaving s.
    footpaths: Vec<Footpath>,
    outgoing_idx: Vec<usize>,
    // Footpath indices sorted by arrival stop, sliced the same way by incoming_idx.
    incoming: Vec<FootpathIndex>,
    incoming_idx: Vec<usize>,
    ball_tree: BallTree<StopIndex>,
}

impl Network {
    pub fn new(mut stops: Vec<Stop>, trip_ids: Vec<Box<str>>, mut connections: Vec<Connection>, config: &NetworkConfig) -> Self {
        assert!(
            stops.len() < StopIndex::MAX as usize,
            "Too many stops ({}) in network (we currently use a {}-bit index for stops).",
            stops.len(),
            std::mem::size_of::<StopIndex>() * 8
        );
        assert!(
            trip_ids.len() < TripIndex::MAX as usize,
            "Too many trips ({}) in network (we currently use a {}-bit index for trips).",
            trip_ids.len(),
            std::mem::size_of::<TripIndex>() * 8
        );

        // Stable, so connections departing together keep their trip order.
        connections.sort_by_key(|connection| connection.departure_time);

        for connection in &connections {
            for stop_idx in [connection.departure_stop, connection.arrival_stop] {
                let stop = &mut stops[stop_idx as usize];
                if stop.route.is_none() {
                    stop.route = Some(connection.route.clone());
                }
            }
        }

        let stop_index = stops
            .iter()
            .enumerate()
            .map(|(i, stop)| (stop.id.to_string(), i as StopIndex))
            .collect();

        let ball_tree = BallTree::new(stops.iter().enumerate().map(|(i, stop)| (stop.coord, i as StopIndex)).collect());

        let mut network = Self {
            stops,
            stop_index,
            trip_ids,
            connections,
            footpaths: Vec::new(),
            outgoing_idx: Vec::new(),
            incoming: Vec::new(),
            incoming_idx: Vec::new(),
            ball_tree,
        };
        network.build_footpaths(config);
        network
    }

    // Link every stop to every other stop within walking distance. A non-positive distance disables footpaths.
    pub fn build_footpaths(&mut self, config: &NetworkConfig) {
        let mut footpaths = Vec::new();
        if config.max_footpath_distance_km > 0.0 {
            for (stop_idx, stop) in self.stops.iter().enumerate() {
                let stop_idx = stop_idx as StopIndex;
                for &other_idx in self.ball_tree.find_within_radius(&stop.coord, config.max_footpath_distance_km) {
                    if other_idx != stop_idx {
                        let other = &self.stops[other_idx as usize];
                        footpaths.push(Footpath::walking((stop_idx, stop), (other_idx, other), config.walking_speed_kmh));
                    }
                }
            }
        }

        log::info!(
            "Built {} footpaths between {} stops (max distance {} km).",
            footpaths.len(),
            self.stops.len(),
            config.max_footpath_distance_km
        );
        self.set_footpaths(footpaths);
    }

    // Replace the footpath graph and rebuild both footpath indices.
    pub fn set_footpaths(&mut self, mut footpaths: Vec<Footpath>) {
        let num_stops = self.stops.len();
        footpaths.retain(|footpath| footpath.departure_stop != footpath.arrival_stop);
        assert!(
            footpaths
                .iter()
                .all(|f| (f.departure_stop as usize) < num_stops && (f.arrival_stop as usize) < num_stops),
            "Footpath refers to a stop outside the network."
        );
        footpaths.sort_by_key(|footpath| (footpath.departure_stop, footpath.arrival_stop));

        let outgoing_idx = prefix_offsets(num_stops, footpaths.iter().map(|f| f.departure_stop));

        let mut incoming: Vec<FootpathIndex> = (0..footpaths.len() as FootpathIndex).collect();
        incoming.sort_by_key(|&i| footpaths[i as usize].arrival_stop);
        let incoming_idx = prefix_offsets(num_stops, footpaths.iter().map(|f| f.arrival_stop));

        self.footpaths = footpaths;
        self.outgoing_idx = outgoing_idx;
        self.incoming = incoming;
        self.incoming_idx = incoming_idx;
    }

    pub fn footpaths(&self) -> &[Footpath] { &self.footpaths }

    pub fn outgoing_footpaths(&self, stop: StopIndex) -> &[Footpath] {
        let stop = stop as usize;
        &self.footpaths[self.outgoing_idx[stop]..self.outgoing_idx[stop + 1]]
    }

    pub fn incoming_footpaths(&self, stop: StopIndex) -> impl Iterator<Item = &Footpath> + '_ {
        let stop = stop as usize;
        self.incoming[self.incoming_idx[stop]..self.incoming_idx[stop + 1]]
            .iter()
            .map(|&i| &self.footpaths[i as usize])
    }

    // Index of the first connection departing at or after `time`.
    pub fn earliest_connection_idx(&self, time: Timestamp) -> usize {
        self.connections.partition_point(|connection| connection.departure_time < time)
    }

    // All connections departing at or after `time`, in departure order.
    pub fn connections_from(&self, time: Timestamp) -> &[Connection] {
        &self.connections[self.earliest_connection_idx(time)..]
    }

    pub fn get_stop(&self, stop: StopIndex) -> &Stop { &self.stops[stop as usize] }

    pub fn get_stop_idx(&self, stop_id: &str) -> Option<StopIndex> { self.stop_index.get(stop_id).copied() }

    pub fn resolve_stop(&self, stop_id: &str) -> Result<StopIndex, JourneyError> {
        self.get_stop_idx(stop_id).ok_or_else(|| JourneyError::UnknownStop(stop_id.to_owned()))
    }

    // Stops called `name`. When a route name is given, stops known to be served by another route are skipped.
    pub fn stops_with_name(&self, name: &str, route_name: Option<&str>) -> Vec<StopIndex> {
        self.stops
            .iter()
            .enumerate()
            .filter(|(_, stop)| {
                let other_route = match (route_name, &stop.route) {
                    (Some(route_name), Some(route)) => &*route.name != route_name,
                    _ => false,
                };
                !other_route && &*stop.name == name
            })
            .map(|(i, _)| i as StopIndex)
            .collect()
    }

    pub fn get_stop_idx_from_name(&self, name: &str) -> Option<StopIndex> {
        self.stops_with_name(name, None).first().copied()
    }

    /// Stops within `radius_km` of the given stop, excluding the stop itself.
    pub fn footpaths_within(&self, stop_id: &str, radius_km: f64) -> Result<Vec<&Stop>, JourneyError> {
        let stop_idx = self.resolve_stop(stop_id)?;
        let coord = self.get_stop(stop_idx).coord;
        Ok(self
            .ball_tree
            .find_within_radius(&coord, radius_km)
            .into_iter()
            .filter(|&&other| other != stop_idx)
            .map(|&other| self.get_stop(other))
            .collect())
    }

    pub fn num_stops(&self) -> usize { self.stops.len() }

    pub fn num_trips(&self) -> usize { self.trip_ids.len() }

    pub fn trip_id(&self, trip: TripIndex) -> &str { &self.trip_ids[trip as usize] }

    pub fn log_stats(&self) {
        log::info!(
            "Network has {} stops, {} trips, {} connections and {} footpaths.",
            self.stops.len(),
            self.trip_ids.len(),
            self.connections.len(),
            self.footpaths.len()
        );
    }
}

// CSR offsets from the stop each footpath is grouped by, num_stops + 1 entries.
fn prefix_offsets(num_stops: usize, keys: impl Iterator<Item = StopIndex>) -> Vec<usize> {
    let mut offsets = vec![0; num_stops + 1];
    for key in keys {
        offsets[key as usize + 1] += 1;
    }
    for i in 0..num_stops {
        offsets[i + 1] += offsets[i];
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{connection, route, stop};

    fn walkable_network() -> Network {
        // A and B are ~111m apart, C is ~1.1km from A.
        let stops = vec![
            stop("A", "Alpha", 50.0, 4.0),
            stop("B", "Beta", 50.001, 4.0),
            stop("C", "Gamma", 50.01, 4.0),
        ];
        Network::new(stops, Vec::new(), Vec::new(), &NetworkConfig::default())
    }

    #[test]
    fn footpaths_link_nearby_stops_both_ways() {
        let network = walkable_network();
        assert_eq!(network.footpaths().len(), 2);

        let from_a = network.outgoing_footpaths(0);
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].arrival_stop, 1);
        // 111m at 5 km/h.
        assert_eq!(from_a[0].duration, 80);

        let into_a: Vec<_> = network.incoming_footpaths(0).collect();
        assert_eq!(into_a.len(), 1);
        assert_eq!(into_a[0].departure_stop, 1);

        assert!(network.outgoing_footpaths(2).is_empty());
        assert_eq!(network.incoming_footpaths(2).count(), 0);
    }

    #[test]
    fn larger_radius_reaches_further() {
        let mut network = walkable_network();
        network.build_footpaths(&NetworkConfig::default().with_max_footpath_distance_km(2.0));
        assert_eq!(network.footpaths().len(), 6);
        assert_eq!(network.incoming_footpaths(2).count(), 2);

        network.build_footpaths(&NetworkConfig::without_footpaths());
        assert!(network.footpaths().is_empty());
    }

    #[test]
    fn explicit_footpaths_skip_loops() {
        let mut network = walkable_network();
        network.set_footpaths(vec![
            Footpath::with_duration(2, 2, 10),
            Footpath::with_duration(2, 0, 0),
            Footpath::with_duration(1, 0, 30),
        ]);
        assert_eq!(network.footpaths().len(), 2);
        // Durations are floored at one second.
        assert_eq!(network.outgoing_footpaths(2)[0].duration, 1);
        let mut into_a: Vec<_> = network.incoming_footpaths(0).map(|f| f.departure_stop).collect();
        into_a.sort_unstable();
        assert_eq!(into_a, vec![1, 2]);
    }

    #[test]
    fn connections_are_sorted_and_searchable() {
        let stops = vec![stop("A", "A", 50.0, 4.0), stop("B", "B", 51.0, 4.0)];
        let bus = route("1", TransportMode::Bus);
        let connections = vec![
            connection(0, &bus, 0, 300, 1, 400),
            connection(1, &bus, 1, 100, 0, 200),
            connection(2, &bus, 0, 200, 1, 250),
        ];
        let network = Network::new(stops, vec!["t0".into(), "t1".into(), "t2".into()], connections, &NetworkConfig::default());

        let departures: Vec<_> = network.connections.iter().map(|c| c.departure_time).collect();
        assert_eq!(departures, vec![100, 200, 300]);
        assert_eq!(network.earliest_connection_idx(0), 0);
        assert_eq!(network.earliest_connection_idx(200), 1);
        assert_eq!(network.earliest_connection_idx(201), 2);
        assert!(network.connections_from(301).is_empty());
        assert_eq!(network.trip_id(2), "t2");
    }

    #[test]
    fn stops_remember_their_first_route_and_are_found_by_name() {
        let stops = vec![
            stop("A1", "Central", 50.0, 4.0),
            stop("A2", "Central", 50.2, 4.0),
            stop("B", "Park", 50.1, 4.0),
            stop("W", "Central", 50.3, 4.0),
        ];
        let tram = route("T7", TransportMode::Tram);
        let bus = route("B12", TransportMode::Bus);
        let connections = vec![connection(0, &tram, 0, 10, 2, 20), connection(1, &bus, 2, 30, 1, 40)];
        let network = Network::new(stops, vec!["t".into(), "b".into()], connections, &NetworkConfig::default());

        assert_eq!(network.get_stop(0).route.as_deref().map(|r| &*r.name), Some("T7"));
        assert_eq!(network.get_stop(2).route.as_deref().map(|r| &*r.name), Some("T7"));
        assert_eq!(network.get_stop(1).route.as_deref().map(|r| &*r.name), Some("B12"));
        // Never served, still a valid stop.
        assert!(network.get_stop(3).route.is_none());

        assert_eq!(network.stops_with_name("Central", None), vec![0, 1, 3]);
        assert_eq!(network.stops_with_name("Central", Some("B12")), vec![1, 3]);
        assert!(network.stops_with_name("Nowhere", None).is_empty());
        assert_eq!(network.get_stop_idx("B"), Some(2));
        assert_eq!(network.get_stop_idx("Z"), None);
        assert_eq!(network.get_stop_idx_from_name("Park"), Some(2));
    }

    #[test]
    fn footpaths_within_excludes_the_stop_itself() {
        let network = walkable_network();
        let names: Vec<_> = network.footpaths_within("A", 0.5).unwrap().iter().map(|s| &*s.name).collect();
        assert_eq!(names, vec!["Beta"]);
        assert_eq!(network.footpaths_within("A", 5.0).unwrap().len(), 2);
        assert!(matches!(network.footpaths_within("nope", 1.0), Err(JourneyError::UnknownStop(_))));
    }
}
