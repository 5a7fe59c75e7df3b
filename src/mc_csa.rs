use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::criteria::CriteriaTracker;
use crate::csa::validate_stops;
use crate::journey::{JourneyError, JourneyResult, Leg};
use crate::network::{Connection, Footpath, Movement, StopIndex, Timestamp, TripIndex};
use crate::profile::{ProfileFunction, ProfilePair};
use crate::{Journey, Network};

pub type StepIndex = u32;

// A movement of some partial journey, linked to the rest of that journey.
#[derive(Debug, Clone, Copy)]
struct Step<'a> {
    movement: Movement<'a>,
    departure_time: Timestamp,
    next: Option<StepIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParetoOption<C> {
    pub tracker: C,
    pub arrival_time: Timestamp,
}

// Candidates for one connection, keyed by tracker: arrival time and the step to take after the connection.
type Candidates<C> = HashMap<C, (Timestamp, Option<StepIndex>)>;

fn offer<C: CriteriaTracker>(candidates: &mut Candidates<C>, tracker: C, arrival_time: Timestamp, next: Option<StepIndex>) {
    match candidates.entry(tracker) {
        Entry::Occupied(mut occupied) => {
            if arrival_time < occupied.get().0 {
                occupied.insert((arrival_time, next));
            }
        }
        Entry::Vacant(vacant) => {
            vacant.insert((arrival_time, next));
        }
    }
}

fn push_step<'a>(steps: &mut Vec<Step<'a>>, movement: Movement<'a>, departure_time: Timestamp, next: Option<StepIndex>) -> StepIndex {
    steps.push(Step { movement, departure_time, next });
    (steps.len() - 1) as StepIndex
}

// How a journey continues after riding a connection: a step already taken, or the step to take next.
#[derive(Debug, Clone, Copy)]
enum Link {
    Step(StepIndex),
    Pending(Option<StepIndex>),
}

// The connection scanned last on a trip, with every journey merged for it. Staying seated continues one of them.
struct Seat<'a, C> {
    connection: &'a Connection,
    journeys: HashMap<C, (Timestamp, Link)>,
}

struct ProfileScan<'a, C> {
    network: &'a Network,
    arrival: StopIndex,
    start_time: Timestamp,
    zero: C,
    profiles: Vec<ProfileFunction<C, StepIndex>>,
    steps: Vec<Step<'a>>,
    // Last footpath into the arrival stop, by the stop it leaves from.
    final_footpaths: Vec<Option<&'a Footpath>>,
    trips: HashMap<TripIndex, Seat<'a, C>>,
}

impl<'a, C: CriteriaTracker> ProfileScan<'a, C> {
    fn new(network: &'a Network, arrival: StopIndex, start_time: Timestamp, zero: C) -> Self {
        let mut final_footpaths = vec![None; network.num_stops()];
        for footpath in network.incoming_footpaths(arrival) {
            final_footpaths[footpath.departure_stop as usize].get_or_insert(footpath);
        }
        Self {
            network,
            arrival,
            start_time,
            zero,
            profiles: (0..network.num_stops()).map(|_| ProfileFunction::new()).collect(),
            steps: Vec::new(),
            final_footpaths,
            trips: HashMap::new(),
        }
    }

    fn run(&mut self) {
        let network = self.network;
        for connection in network.connections_from(self.start_time).iter().rev() {
            // Arriving and then riding away from the target again is never useful.
            if connection.departure_stop == self.arrival {
                continue;
            }
            let candidates = self.evaluate(connection);
            self.insert(connection, candidates);
        }
        log::debug!(
            "Profile scan stored {} steps, {} journeys at the departure side.",
            self.steps.len(),
            self.profiles.iter().map(|profile| profile.num_journeys()).sum::<usize>()
        );
    }

    fn evaluate(&mut self, connection: &'a Connection) -> Candidates<C> {
        let ride = Movement::Connection(connection);
        let arrival_stop = connection.arrival_stop;
        let mut candidates = HashMap::new();

        // Straight to the target, or walking there at the end.
        if arrival_stop == self.arrival {
            offer(&mut candidates, self.zero.add_movement(ride), connection.arrival_time, None);
        } else if let Some(footpath) = self.final_footpaths[arrival_stop as usize] {
            let walk = Movement::Footpath(footpath);
            let walk_tracker = self.zero.add_movement(walk);
            let walk_arrival = connection.arrival_time + footpath.duration;
            let walk_step = push_step(&mut self.steps, walk, connection.arrival_time, None);
            self.profiles[arrival_stop as usize].insert(
                connection.arrival_time,
                HashMap::from([(walk_tracker.clone(), ProfilePair { arrival_time: walk_arrival, next: walk_step })]),
            );
            offer(&mut candidates, walk_tracker.add_movement(ride), walk_arrival, Some(walk_step));
        }

        // Staying on board.
        if C::TRIP_AWARE {
            if let Some(seat) = self.trips.get_mut(&connection.trip) {
                let later = seat.connection;
                if later.departure_stop == arrival_stop && later.departure_time >= connection.arrival_time {
                    for (tracker, (arrival_time, link)) in seat.journeys.iter_mut() {
                        let step = match *link {
                            Link::Step(step) => step,
                            Link::Pending(next) => {
                                let step = push_step(&mut self.steps, Movement::Connection(later), later.departure_time, next);
                                *link = Link::Step(step);
                                step
                            }
                        };
                        offer(&mut candidates, tracker.extend_trip(connection), *arrival_time, Some(step));
                    }
                }
            }
        }

        // Changing at the arrival stop.
        for (tracker, pair) in self.profiles[arrival_stop as usize].evaluate_at(connection.arrival_time) {
            offer(&mut candidates, tracker.add_movement(ride), pair.arrival_time, Some(pair.next));
        }

        candidates
    }

    fn insert(&mut self, connection: &'a Connection, candidates: Candidates<C>) {
        let departure_stop = connection.departure_stop;
        let ride = Movement::Connection(connection);
        let seated = C::TRIP_AWARE.then(|| candidates.clone());

        let steps = &mut self.steps;
        let mut linked = HashMap::new();
        let inserted = self.profiles[departure_stop as usize].insert_with(connection.departure_time, candidates, |tracker, next| {
            let step = push_step(steps, ride, connection.departure_time, next);
            linked.insert(tracker.clone(), step);
            step
        });

        if let Some(seated) = seated {
            let journeys = seated
                .into_iter()
                .map(|(tracker, (arrival_time, next))| {
                    let link = linked.get(&tracker).map_or(Link::Pending(next), |&step| Link::Step(step));
                    (tracker, (arrival_time, link))
                })
                .collect();
            self.trips.insert(connection.trip, Seat { connection, journeys });
        }
        if !inserted {
            return;
        }

        // Walking to this connection from neighbouring stops.
        let network = self.network;
        let current = self.profiles[departure_stop as usize].evaluate_at(connection.departure_time);
        for footpath in network.incoming_footpaths(departure_stop) {
            if footpath.departure_stop == self.arrival {
                continue;
            }
            let Some(departure_time) = connection.departure_time.checked_sub(footpath.duration) else {
                continue;
            };
            if departure_time <= self.start_time {
                continue;
            }
            let walk = Movement::Footpath(footpath);
            let walks: HashMap<C, (Timestamp, StepIndex)> = current
                .iter()
                .map(|(tracker, pair)| (tracker.add_movement(walk), (pair.arrival_time, pair.next)))
                .collect();
            let steps = &mut self.steps;
            self.profiles[footpath.departure_stop as usize]
                .insert_with(departure_time, walks, |_, next| push_step(steps, walk, departure_time, Some(next)));
        }
    }
}

// Drops the steps no journey of `profile` leads through, and renumbers the rest.
fn compact<'a, C: CriteriaTracker>(profile: &mut ProfileFunction<C, StepIndex>, mut steps: Vec<Step<'a>>) -> Vec<Step<'a>> {
    let mut reachable = vec![false; steps.len()];
    for pair in profile.iter().flat_map(|entry| entry.bag.values()) {
        let mut next = Some(pair.next);
        while let Some(step_idx) = next {
            if std::mem::replace(&mut reachable[step_idx as usize], true) {
                break;
            }
            next = steps[step_idx as usize].next;
        }
    }

    let mut renumbered = vec![0; steps.len()];
    let mut kept = 0;
    for (step_idx, &is_reachable) in reachable.iter().enumerate() {
        if is_reachable {
            renumbered[step_idx] = kept;
            kept += 1;
        }
    }
    let mut is_reachable = reachable.into_iter();
    steps.retain(|_| is_reachable.next().unwrap_or(false));
    for step in &mut steps {
        step.next = step.next.map(|next| renumbered[next as usize]);
    }
    for pair in profile.pairs_mut() {
        pair.next = renumbered[pair.next as usize];
    }
    steps
}

/// Pareto-optimal journeys from one stop to another, trading arrival time against a secondary criterion.
pub struct ParetoProfile<'a, C> {
    network: &'a Network,
    departure: StopIndex,
    arrival: StopIndex,
    start_time: Timestamp,
    profile: ProfileFunction<C, StepIndex>,
    steps: Vec<Step<'a>>,
}

impl<'a, C: CriteriaTracker> ParetoProfile<'a, C> {
    /// Every non-dominated option, by arrival time and then tracker. Empty if the arrival stop is unreachable.
    pub fn journeys(&self) -> Vec<ParetoOption<C>> {
        let mut options: Vec<_> = self
            .profile
            .evaluate_at(self.start_time)
            .into_iter()
            .map(|(tracker, pair)| ParetoOption { tracker, arrival_time: pair.arrival_time })
            .collect();
        options.sort_unstable_by(|a, b| a.arrival_time.cmp(&b.arrival_time).then_with(|| a.tracker.cmp(&b.tracker)));
        options
    }

    pub fn is_empty(&self) -> bool { self.profile.evaluate_at(self.start_time).is_empty() }

    // The option minimizing `key`, e.g. the fewest transfers.
    pub fn best_by<K: Ord>(&self, key: impl Fn(&ParetoOption<C>) -> K) -> Option<ParetoOption<C>> {
        self.journeys().into_iter().min_by_key(|option| key(option))
    }

    pub fn departure(&self) -> StopIndex { self.departure }

    pub fn arrival(&self) -> StopIndex { self.arrival }

    /// Replays the journey behind the option with criteria `tracker`.
    pub fn reconstruct(&self, tracker: &C) -> JourneyResult<'a> {
        let (_, pair) = self.profile.get_first_match(self.start_time, tracker).ok_or(JourneyError::UnknownOption)?;

        let mut legs = Vec::new();
        let mut next = Some(pair.next);
        while let Some(step_idx) = next {
            if legs.len() > self.steps.len() {
                return Err(JourneyError::InfiniteLoop);
            }
            let step = self.steps[step_idx as usize];
            legs.push(Leg::new(step.movement, step.departure_time));
            next = step.next;
        }

        match legs.last() {
            Some(leg) if leg.arrival_stop() == self.arrival => Ok(Journey::from(legs, self.network)),
            Some(leg) => Err(JourneyError::BrokenChain { stop: leg.arrival_stop() }),
            None => Err(JourneyError::BrokenChain { stop: self.departure }),
        }
    }
}

/// Profile scan from `departure` to `arrival` for journeys leaving at `start_time` or later.
///
/// `zero` is the tracker of a journey that has not moved yet, and selects the secondary criterion.
pub fn pareto_journeys<'a, C: CriteriaTracker>(
    network: &'a Network,
    departure: StopIndex,
    arrival: StopIndex,
    start_time: Timestamp,
    zero: C,
) -> Result<ParetoProfile<'a, C>, JourneyError> {
    validate_stops(network, &[departure], &[arrival])?;

    let mut scan = ProfileScan::new(network, arrival, start_time, zero);
    scan.run();

    let mut profile = std::mem::take(&mut scan.profiles[departure as usize]);
    let steps = compact(&mut profile, scan.steps);
    log::debug!("Kept {} steps for {} journeys from stop {}.", steps.len(), profile.num_journeys(), departure);
    Ok(ParetoProfile { network, departure, arrival, start_time, profile, steps })
}

pub fn pareto_journeys_by_id<'a, C: CriteriaTracker>(
    network: &'a Network,
    departure: &str,
    arrival: &str,
    start_time: Timestamp,
    zero: C,
) -> Result<ParetoProfile<'a, C>, JourneyError> {
    pareto_journeys(network, network.resolve_stop(departure)?, network.resolve_stop(arrival)?, start_time, zero)
}
