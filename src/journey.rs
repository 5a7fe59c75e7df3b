use std::fmt::Display;
use std::sync::Arc;

use crate::network::{Movement, RouteInfo, StopIndex, Timestamp, TripIndex};
use crate::{utils, Network};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum JourneyError {
    #[error("No journey found.")]
    NoJourneyFound,
    #[error("Departure and arrival stops are the same.")]
    SameStop,
    #[error("No departure or arrival stops given.")]
    EmptyStopSet,
    #[error("Unknown stop {0}.")]
    UnknownStop(String),
    #[error("No movement leads to stop {stop} although it was reached.")]
    BrokenChain { stop: StopIndex },
    #[error("Infinite loop in journey reconstruction.")]
    InfiniteLoop,
    #[error("The chosen option is not part of the profile.")]
    UnknownOption,
}

pub type JourneyResult<'a> = Result<Journey<'a>, JourneyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    Ride,
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg<'a> {
    pub movement: Movement<'a>,
    pub departure_time: Timestamp,
    pub arrival_time: Timestamp,
}

impl<'a> Leg<'a> {
    pub fn new(movement: Movement<'a>, departure_time: Timestamp) -> Self {
        let arrival_time = match movement {
            Movement::Connection(connection) => connection.arrival_time,
            Movement::Footpath(footpath) => departure_time + footpath.duration,
        };
        Self { movement, departure_time, arrival_time }
    }

    pub fn kind(&self) -> LegKind {
        match self.movement {
            Movement::Connection(_) => LegKind::Ride,
            Movement::Footpath(_) => LegKind::Walk,
        }
    }

    pub fn departure_stop(&self) -> StopIndex { self.movement.departure_stop() }

    pub fn arrival_stop(&self) -> StopIndex { self.movement.arrival_stop() }

    pub fn route(&self) -> Option<&'a Arc<RouteInfo>> {
        match self.movement {
            Movement::Connection(connection) => Some(&connection.route),
            Movement::Footpath(_) => None,
        }
    }

    pub fn trip(&self) -> Option<TripIndex> {
        match self.movement {
            Movement::Connection(connection) => Some(connection.trip),
            Movement::Footpath(_) => None,
        }
    }
}

/// One line of directions: a stretch on a single vehicle, or a walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction<'a> {
    Ride {
        route: &'a RouteInfo,
        trip: TripIndex,
        from: StopIndex,
        departure_time: Timestamp,
        to: StopIndex,
        arrival_time: Timestamp,
        num_connections: usize,
    },
    Walk {
        from: StopIndex,
        departure_time: Timestamp,
        to: StopIndex,
        arrival_time: Timestamp,
        distance_km: f64,
    },
}

#[derive(Clone)]
pub struct Journey<'a> {
    pub legs: Vec<Leg<'a>>,
    pub network: &'a Network,
}

impl<'a> Journey<'a> {
    pub fn empty(network: &'a Network) -> Self {
        Self { legs: Vec::new(), network }
    }

    pub fn from(legs: Vec<Leg<'a>>, network: &'a Network) -> Self {
        Self { legs, network }
    }

    pub fn is_empty(&self) -> bool { self.legs.is_empty() }

    pub fn departure_time(&self) -> Option<Timestamp> { self.legs.first().map(|leg| leg.departure_time) }

    pub fn arrival_time(&self) -> Option<Timestamp> { self.legs.last().map(|leg| leg.arrival_time) }

    pub fn duration(&self) -> Timestamp {
        match (self.departure_time(), self.arrival_time()) {
            (Some(departure_time), Some(arrival_time)) => arrival_time - departure_time,
            _ => 0,
        }
    }

    // Consecutive connections of one trip become a single ride.
    pub fn instructions(&self) -> Vec<Instruction<'a>> {
        let mut instructions: Vec<Instruction<'a>> = Vec::new();
        for leg in &self.legs {
            match leg.movement {
                Movement::Connection(connection) => {
                    if let Some(Instruction::Ride { trip, to, arrival_time, num_connections, .. }) = instructions.last_mut() {
                        if *trip == connection.trip && *to == connection.departure_stop {
                            *to = connection.arrival_stop;
                            *arrival_time = connection.arrival_time;
                            *num_connections += 1;
                            continue;
                        }
                    }
                    instructions.push(Instruction::Ride {
                        route: &connection.route,
                        trip: connection.trip,
                        from: connection.departure_stop,
                        departure_time: connection.departure_time,
                        to: connection.arrival_stop,
                        arrival_time: connection.arrival_time,
                        num_connections: 1,
                    });
                }
                Movement::Footpath(footpath) => instructions.push(Instruction::Walk {
                    from: footpath.departure_stop,
                    departure_time: leg.departure_time,
                    to: footpath.arrival_stop,
                    arrival_time: leg.arrival_time,
                    distance_km: footpath.distance_km,
                }),
            }
        }
        instructions
    }

    pub fn num_rides(&self) -> usize {
        self.instructions().iter().filter(|instruction| matches!(instruction, Instruction::Ride { .. })).count()
    }

    pub fn num_transfers(&self) -> usize { self.num_rides().saturating_sub(1) }
}

impl std::fmt::Debug for Journey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journey").field("legs", &self.legs).finish_non_exhaustive()
    }
}

impl Display for Journey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-----------------------------------------------")?;
        if !self.legs.is_empty() {
            for instruction in self.instructions() {
                writeln!(f)?;
                match instruction {
                    Instruction::Ride { route, from, departure_time, to, arrival_time, num_connections, .. } => {
                        writeln!(f,
                                 "Board at {} at {} ({} {}).",
                                 &self.network.get_stop(from).name,
                                 utils::get_time_str(departure_time),
                                 route.name,
                                 route.mode,
                        )?;
                        writeln!(f,
                                 "Arrive at {} at {} after {} stop(s).",
                                 &self.network.get_stop(to).name,
                                 utils::get_time_str(arrival_time),
                                 num_connections,
                        )?;
                    }
                    Instruction::Walk { from, departure_time, to, arrival_time, distance_km } => {
                        writeln!(f,
                                 "Walk from {} at {} to {} ({:.0} m).",
                                 &self.network.get_stop(from).name,
                                 utils::get_time_str(departure_time),
                                 &self.network.get_stop(to).name,
                                 distance_km * 1000.,
                        )?;
                        writeln!(f, "Arrive at {} at {}.", &self.network.get_stop(to).name, utils::get_time_str(arrival_time))?;
                    }
                }
            }
            writeln!(f)?;
            writeln!(f, "Total journey time: {} minutes.", self.duration() / 60)?;
        } else {
            writeln!(f)?;
            writeln!(f, "No journey found.")?;
        }
        writeln!(f, "-----------------------------------------------")?;
        Ok(())
    }
}
