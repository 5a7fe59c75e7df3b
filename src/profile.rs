use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use crate::criteria::CriteriaTracker;
use crate::network::Timestamp;

/// Arrival time at the target of a partial journey, and what to do next to follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilePair<M> {
    pub arrival_time: Timestamp,
    pub next: M,
}

pub type Bag<C, M> = HashMap<C, ProfilePair<M>>;

// Non-dominated partial journeys all departing at `departure_time`.
#[derive(Debug, Clone)]
pub struct ProfileEntry<C, M> {
    pub departure_time: Timestamp,
    pub bag: Bag<C, M>,
}

/// `a` dominates `b` if its criteria dominate and it arrives no later, or its criteria are equal and it arrives
/// strictly earlier.
pub fn journey_dominates<C: CriteriaTracker>(a: (&C, Timestamp), b: (&C, Timestamp)) -> bool {
    (a.0.dominates(b.0) && a.1 <= b.1) || (a.0 == b.0 && a.1 < b.1)
}

// Dominates, or is the very same journey.
fn covers<C: CriteriaTracker>(a: (&C, Timestamp), b: (&C, Timestamp)) -> bool {
    journey_dominates(a, b) || (a.0 == b.0 && a.1 == b.1)
}

/// Pareto set of journeys from one stop to the target, indexed by departure time.
///
/// Entries are kept in increasing departure time. A journey is only worth keeping if no journey leaving at the same
/// time or later is at least as good, so insertion prunes in both directions: new journeys covered by a later one are
/// dropped, and older journeys leaving no later than a new one that covers them are removed.
#[derive(Debug, Clone)]
pub struct ProfileFunction<C, M> {
    entries: VecDeque<ProfileEntry<C, M>>,
}

impl<C: CriteriaTracker, M: Copy> Default for ProfileFunction<C, M> {
    fn default() -> Self { Self::new() }
}

impl<C: CriteriaTracker, M: Copy> ProfileFunction<C, M> {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    // Index of the first entry departing at or after `time`. The backward scan mostly inserts near the front.
    fn first_reachable_idx(&self, time: Timestamp) -> usize {
        self.entries.partition_point(|entry| entry.departure_time < time)
    }

    /// Inserts partial journeys departing at `departure_time`.
    ///
    /// Returns true if at least one of them survived, i.e. the profile changed.
    pub fn insert(&mut self, departure_time: Timestamp, batch: Bag<C, M>) -> bool {
        let batch = batch.into_iter().map(|(c, pair)| (c, (pair.arrival_time, pair.next))).collect();
        self.insert_with(departure_time, batch, |_, next| next)
    }

    /// Like [`insert`](Self::insert) for journeys given as arrival time and payload. Only the journeys that survive
    /// pruning are turned into pairs, by `link`.
    pub fn insert_with<P>(
        &mut self,
        departure_time: Timestamp,
        mut batch: HashMap<C, (Timestamp, P)>,
        mut link: impl FnMut(&C, P) -> M,
    ) -> bool {
        // Dominated by another new journey.
        let candidates: Vec<(C, Timestamp)> = batch.iter().map(|(c, (arrival_time, _))| (c.clone(), *arrival_time)).collect();
        batch.retain(|c, (arrival_time, _)| {
            !candidates.iter().any(|(other, other_arrival)| journey_dominates((other, *other_arrival), (c, *arrival_time)))
        });

        // Dominated by, or equal to, a journey we can still catch by waiting.
        let first_idx = self.first_reachable_idx(departure_time);
        batch.retain(|c, (arrival_time, _)| {
            !self.entries.range(first_idx..).any(|entry| {
                entry
                    .bag
                    .iter()
                    .any(|(old, old_pair)| covers((old, old_pair.arrival_time), (c, *arrival_time)))
            })
        });

        if batch.is_empty() {
            return false;
        }

        // Journeys leaving at or before this time that the new ones now beat.
        let same_time = self.entries.get(first_idx).is_some_and(|entry| entry.departure_time == departure_time);
        let end_idx = if same_time { first_idx + 1 } else { first_idx };
        for entry in self.entries.range_mut(..end_idx) {
            entry.bag.retain(|old, old_pair| {
                !batch
                    .iter()
                    .any(|(c, (arrival_time, _))| covers((c, *arrival_time), (old, old_pair.arrival_time)))
            });
        }

        let bag = batch.into_iter().map(|(c, (arrival_time, payload))| {
            let next = link(&c, payload);
            (c, ProfilePair { arrival_time, next })
        });
        if same_time {
            self.entries[first_idx].bag.extend(bag);
        } else {
            let bag = bag.collect();
            self.entries.insert(first_idx, ProfileEntry { departure_time, bag });
        }
        self.entries.retain(|entry| !entry.bag.is_empty());

        true
    }

    /// The best journey per tracker over every entry departing at or after `time`, reduced to its Pareto front.
    pub fn evaluate_at(&self, time: Timestamp) -> Bag<C, M> {
        let mut best: Bag<C, M> = HashMap::new();
        for entry in self.entries.range(self.first_reachable_idx(time)..) {
            for (c, pair) in &entry.bag {
                match best.entry(c.clone()) {
                    Entry::Occupied(mut occupied) => {
                        if pair.arrival_time < occupied.get().arrival_time {
                            occupied.insert(*pair);
                        }
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(*pair);
                    }
                }
            }
        }

        // Journeys leaving later may be beaten by ones leaving earlier but still at or after `time`.
        let front: Vec<(C, Timestamp)> = best.iter().map(|(c, pair)| (c.clone(), pair.arrival_time)).collect();
        best.retain(|c, pair| {
            !front
                .iter()
                .any(|(other, arrival_time)| journey_dominates((other, *arrival_time), (c, pair.arrival_time)))
        });
        best
    }

    /// The earliest-departing journey at or after `time` whose criteria equal `tracker`, with its departure time.
    pub fn get_first_match(&self, time: Timestamp, tracker: &C) -> Option<(Timestamp, &ProfilePair<M>)> {
        self.entries
            .range(self.first_reachable_idx(time)..)
            .find_map(|entry| entry.bag.get(tracker).map(|pair| (entry.departure_time, pair)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileEntry<C, M>> { self.entries.iter() }

    pub(crate) fn pairs_mut(&mut self) -> impl Iterator<Item = &mut ProfilePair<M>> {
        self.entries.iter_mut().flat_map(|entry| entry.bag.values_mut())
    }

    // Number of distinct departure times.
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn num_journeys(&self) -> usize { self.entries.iter().map(|entry| entry.bag.len()).sum() }
}
