use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use gtfs_structures::{Gtfs, RouteType};

use crate::network::{Connection, RouteInfo, Stop, StopIndex, TripIndex, TransportMode};
use crate::{utils, Coordinate, Network, NetworkConfig};

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Gtfs(#[from] gtfs_structures::Error),
    #[error("Stop {stop} is served by a trip but has no coordinates.")]
    MissingCoordinates { stop: String },
}

impl From<RouteType> for TransportMode {
    fn from(route_type: RouteType) -> Self {
        match route_type {
            RouteType::Tramway => TransportMode::Tram,
            RouteType::Subway => TransportMode::Metro,
            RouteType::Rail => TransportMode::Train,
            RouteType::Bus => TransportMode::Bus,
            RouteType::Ferry => TransportMode::Ferry,
            RouteType::CableCar => TransportMode::CableCar,
            RouteType::Gondola => TransportMode::Gondola,
            RouteType::Funicular => TransportMode::Funicular,
            RouteType::Coach => TransportMode::Coach,
            _ => TransportMode::Other,
        }
    }
}

// Stops, trips and connections gathered from one or more feeds before the network is built.
#[derive(Default)]
struct FeedLoader {
    stops: Vec<Stop>,
    trip_ids: Vec<Box<str>>,
    connections: Vec<Connection>,
}

impl FeedLoader {
    // With a `namespace`, ids become "namespace:id" and every stop and route belongs to that operator.
    fn add_feed(&mut self, gtfs: &Gtfs, journey_date: NaiveDate, namespace: Option<&str>) -> Result<(), LoadError> {
        let qualify = |id: &str| match namespace {
            Some(namespace) => format!("{namespace}:{id}"),
            None => id.to_owned(),
        };
        let default_operator: Arc<str> = match namespace {
            Some(namespace) => Arc::from(namespace),
            None => gtfs.agencies.first().map_or_else(|| Arc::from(""), |agency| Arc::from(agency.name.as_str())),
        };
        let operators: HashMap<&str, Arc<str>> = match namespace {
            Some(_) => HashMap::new(),
            None => gtfs
                .agencies
                .iter()
                .filter_map(|agency| Some((agency.id.as_deref()?, Arc::from(agency.name.as_str()))))
                .collect(),
        };

        let mut stop_ids: Vec<&String> = gtfs.stops.keys().collect();
        stop_ids.sort_unstable();
        let mut stop_index = HashMap::with_capacity(stop_ids.len());
        let mut num_unplaced = 0;
        for id in stop_ids {
            let stop = &gtfs.stops[id];
            // Generic nodes and boarding areas may leave out their position.
            let (Some(lat), Some(lon)) = (stop.latitude, stop.longitude) else {
                log::debug!("Stop {} has no coordinates, skipping it.", id);
                num_unplaced += 1;
                continue;
            };
            stop_index.insert(id.as_str(), self.stops.len() as StopIndex);
            let name = stop.name.as_deref().unwrap_or(id.as_str());
            self.stops.push(Stop::new(&qualify(id.as_str()), name, Coordinate::new(lat, lon), default_operator.clone()));
        }
        if num_unplaced > 0 {
            log::warn!("Skipped {} stops without coordinates.", num_unplaced);
        }
        let lookup = |id: &str| {
            stop_index.get(id).copied().ok_or_else(|| LoadError::MissingCoordinates { stop: qualify(id) })
        };

        let routes: HashMap<&str, Arc<RouteInfo>> = gtfs
            .routes
            .iter()
            .map(|(id, route)| {
                let name = route.short_name.as_deref().or(route.long_name.as_deref()).unwrap_or(id.as_str());
                let operator = route
                    .agency_id
                    .as_deref()
                    .and_then(|agency_id| operators.get(agency_id))
                    .unwrap_or(&default_operator)
                    .clone();
                (id.as_str(), Arc::new(RouteInfo::new(&qualify(id.as_str()), name, route.route_type.into(), operator)))
            })
            .collect();

        let mut trips: Vec<_> = gtfs.trips.values().filter(|trip| utils::does_trip_run(gtfs, trip, journey_date)).collect();
        trips.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        let num_running = trips.len();

        let mut num_untimed = 0;
        for trip in trips {
            let Some(route) = routes.get(trip.route_id.as_str()) else {
                log::warn!("Trip {} refers to unknown route {}, skipping it.", trip.id, trip.route_id);
                continue;
            };
            let trip_idx = self.trip_ids.len() as TripIndex;
            self.trip_ids.push(qualify(trip.id.as_str()).into());

            // Stop times are sorted by stop sequence.
            for pair in trip.stop_times.windows(2) {
                let (from, to) = (&pair[0], &pair[1]);
                let (Some(departure_time), Some(arrival_time)) =
                    (from.departure_time.or(from.arrival_time), to.arrival_time.or(to.departure_time))
                else {
                    num_untimed += 1;
                    continue;
                };
                self.connections.push(Connection {
                    trip: trip_idx,
                    route: route.clone(),
                    departure_stop: lookup(from.stop.id.as_str())?,
                    departure_time,
                    arrival_stop: lookup(to.stop.id.as_str())?,
                    arrival_time,
                });
            }
        }
        if num_untimed > 0 {
            log::warn!("Skipped {} connections between stop times without a time.", num_untimed);
        }
        log::info!("{} of {} trips run on {}.", num_running, gtfs.trips.len(), journey_date);
        Ok(())
    }

    fn build(self, config: &NetworkConfig) -> Network {
        let network = Network::new(self.stops, self.trip_ids, self.connections, config);
        network.log_stats();
        network
    }
}

impl Network {
    /// Builds the network of every trip running on `journey_date`.
    ///
    /// Stops and trips are indexed in id order, so the same feed always gives the same indices. Stops without
    /// coordinates are skipped unless a trip serves them. Stop times without any time are skipped with a warning, as
    /// are trips whose route is missing.
    pub fn from_gtfs(gtfs: &Gtfs, journey_date: NaiveDate, config: &NetworkConfig) -> Result<Self, LoadError> {
        let mut loader = FeedLoader::default();
        loader.add_feed(gtfs, journey_date, None)?;
        Ok(loader.build(config))
    }

    /// Builds one network from the feeds of several operators, e.g. a train operator and the city's buses.
    ///
    /// Stop, route and trip ids are prefixed with the operator, as in "TEC:1234", so ids shared between feeds stay
    /// apart. Footpaths link nearby stops across feeds.
    pub fn from_gtfs_feeds(feeds: &[(&str, &Gtfs)], journey_date: NaiveDate, config: &NetworkConfig) -> Result<Self, LoadError> {
        let mut loader = FeedLoader::default();
        for &(operator, gtfs) in feeds {
            log::info!("Adding feed of {}.", operator);
            loader.add_feed(gtfs, journey_date, Some(operator))?;
        }
        Ok(loader.build(config))
    }
}
