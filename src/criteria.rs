use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::network::{Connection, Movement, TransportMode};

/// A secondary optimisation criterion carried along a partial journey.
///
/// Trackers are immutable values: taking one more movement produces a new tracker. They key the bags of a
/// [`crate::ProfileFunction`], so equality and hashing must be by value. Lower is better, and `dominates` is a strict
/// improvement (it must be irreflexive).
///
/// The journey is built backwards, so `add_movement` prepends a movement to a journey already ending at the target.
pub trait CriteriaTracker: Clone + Eq + Hash + Ord + Debug {
    // Whether riding on through consecutive connections of one trip differs from alighting and boarding again.
    // Only then does the profile scan need its per-trip table.
    const TRIP_AWARE: bool = false;

    fn add_movement(&self, movement: Movement) -> Self;

    fn dominates(&self, other: &Self) -> bool;

    // Prepend a connection of the trip the journey is already seated on.
    fn extend_trip(&self, connection: &Connection) -> Self {
        self.add_movement(Movement::Connection(connection))
    }
}

// Number of footpaths walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FootpathsCount {
    pub footpaths: u32,
}

impl CriteriaTracker for FootpathsCount {
    fn add_movement(&self, movement: Movement) -> Self {
        match movement {
            Movement::Footpath(_) => Self { footpaths: self.footpaths + 1 },
            Movement::Connection(_) => *self,
        }
    }

    fn dominates(&self, other: &Self) -> bool { self.footpaths < other.footpaths }
}

impl Display for FootpathsCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} footpath(s)", self.footpaths)
    }
}

// Number of vehicles boarded, so transfers are one less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TransfersCount {
    pub boardings: u32,
}

impl TransfersCount {
    pub fn transfers(&self) -> u32 { self.boardings.saturating_sub(1) }
}

impl CriteriaTracker for TransfersCount {
    const TRIP_AWARE: bool = true;

    fn add_movement(&self, movement: Movement) -> Self {
        match movement {
            Movement::Connection(_) => Self { boardings: self.boardings + 1 },
            Movement::Footpath(_) => *self,
        }
    }

    fn dominates(&self, other: &Self) -> bool { self.boardings < other.boardings }

    fn extend_trip(&self, _connection: &Connection) -> Self { *self }
}

impl Display for TransfersCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} transfer(s)", self.transfers())
    }
}

/// Number of connections ridden with one transport mode, e.g. to avoid trams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeCount {
    pub mode: TransportMode,
    pub count: u32,
}

impl ModeCount {
    pub fn zero(mode: TransportMode) -> Self { Self { mode, count: 0 } }
}

impl CriteriaTracker for ModeCount {
    fn add_movement(&self, movement: Movement) -> Self {
        match movement {
            Movement::Connection(connection) if connection.route.mode == self.mode => {
                Self { mode: self.mode, count: self.count + 1 }
            }
            _ => *self,
        }
    }

    fn dominates(&self, other: &Self) -> bool { self.mode == other.mode && self.count < other.count }
}

impl Display for ModeCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} connection(s)", self.count, self.mode)
    }
}
