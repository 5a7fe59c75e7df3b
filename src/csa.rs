use crate::journey::{JourneyError, JourneyResult, Leg};
use crate::network::{Movement, StopIndex, Timestamp};
use crate::{Journey, Network};

// Earliest known arrival at a stop and the movement that got us there (none for departure stops).
#[derive(Debug, Clone, Copy)]
struct BestKnownEntry<'a> {
    arrival_time: Timestamp,
    movement: Option<Movement<'a>>,
}

#[derive(Debug, Clone)]
pub struct EarliestArrival<'a> {
    pub arrival_time: Timestamp,
    pub stop: StopIndex,
    pub journey: Journey<'a>,
}

// Stops must exist, and the two sets must be non-empty and disjoint.
pub(crate) fn validate_stops(network: &Network, departures: &[StopIndex], arrivals: &[StopIndex]) -> Result<(), JourneyError> {
    if departures.is_empty() || arrivals.is_empty() {
        return Err(JourneyError::EmptyStopSet);
    }
    if let Some(stop) = departures.iter().chain(arrivals).find(|&&stop| stop as usize >= network.num_stops()) {
        return Err(JourneyError::UnknownStop(stop.to_string()));
    }
    if departures.iter().any(|stop| arrivals.contains(stop)) {
        return Err(JourneyError::SameStop);
    }
    Ok(())
}

fn improve<'a>(
    best_known: &mut [Option<BestKnownEntry<'a>>],
    stop: StopIndex,
    arrival_time: Timestamp,
    movement: Movement<'a>,
    on_improve: &mut impl FnMut(StopIndex, Timestamp),
) -> bool {
    let entry = &mut best_known[stop as usize];
    if entry.is_none_or(|known| arrival_time < known.arrival_time) {
        *entry = Some(BestKnownEntry { arrival_time, movement: Some(movement) });
        on_improve(stop, arrival_time);
        true
    } else {
        false
    }
}

fn relax_footpaths<'a>(
    network: &'a Network,
    best_known: &mut [Option<BestKnownEntry<'a>>],
    stop: StopIndex,
    time: Timestamp,
    on_improve: &mut impl FnMut(StopIndex, Timestamp),
) {
    for footpath in network.outgoing_footpaths(stop) {
        improve(best_known, footpath.arrival_stop, time + footpath.duration, Movement::Footpath(footpath), on_improve);
    }
}

// Forward connection scan. `on_improve` sees every update of a stop's earliest arrival.
fn scan<'a>(
    network: &'a Network,
    departures: &[StopIndex],
    arrivals: &[StopIndex],
    start_time: Timestamp,
    mut on_improve: impl FnMut(StopIndex, Timestamp),
) -> Vec<Option<BestKnownEntry<'a>>> {
    let mut best_known = vec![None; network.num_stops()];
    for &stop in departures {
        best_known[stop as usize] = Some(BestKnownEntry { arrival_time: start_time, movement: None });
        on_improve(stop, start_time);
    }
    for &stop in departures {
        relax_footpaths(network, &mut best_known, stop, start_time, &mut on_improve);
    }

    let mut num_scanned = 0;
    for connection in network.connections_from(start_time) {
        // Nothing departing this late can improve any arrival stop.
        let settled = arrivals.iter().all(|&stop| {
            best_known[stop as usize].is_some_and(|entry| entry.arrival_time <= connection.departure_time)
        });
        if settled {
            break;
        }
        num_scanned += 1;

        let reachable = best_known[connection.departure_stop as usize]
            .is_some_and(|entry| entry.arrival_time <= connection.departure_time);
        if !reachable {
            continue;
        }

        let arrival_stop = connection.arrival_stop;
        if improve(&mut best_known, arrival_stop, connection.arrival_time, Movement::Connection(connection), &mut on_improve) {
            log::trace!("Reached stop {} at {} on trip {}.", arrival_stop, connection.arrival_time, connection.trip);
            relax_footpaths(network, &mut best_known, arrival_stop, connection.arrival_time, &mut on_improve);
        }
    }
    log::debug!("Scanned {} of {} connections.", num_scanned, network.connections.len());

    best_known
}

// Walk predecessors back from `stop` until a departure stop.
fn reconstruct<'a>(
    network: &'a Network,
    best_known: &[Option<BestKnownEntry<'a>>],
    departures: &[StopIndex],
    stop: StopIndex,
) -> JourneyResult<'a> {
    let mut legs = Vec::new();
    let mut current_stop = stop;
    while !departures.contains(&current_stop) {
        if legs.len() > network.num_stops() {
            return Err(JourneyError::InfiniteLoop);
        }
        let (entry, movement) = best_known[current_stop as usize]
            .and_then(|entry| entry.movement.map(|movement| (entry, movement)))
            .ok_or(JourneyError::BrokenChain { stop: current_stop })?;

        let departure_time = match movement {
            Movement::Connection(connection) => connection.departure_time,
            Movement::Footpath(footpath) => entry.arrival_time - footpath.duration,
        };
        legs.push(Leg { movement, departure_time, arrival_time: entry.arrival_time });
        current_stop = movement.departure_stop();
    }

    legs.reverse();
    Ok(Journey::from(legs, network))
}

/// Earliest arrival at any of `arrivals` when leaving any of `departures` at `start_time`.
///
/// The result is the arrival stop reached first (ties go to the stop listed first) together with the journey there.
pub fn earliest_arrival<'a>(
    network: &'a Network,
    departures: &[StopIndex],
    arrivals: &[StopIndex],
    start_time: Timestamp,
) -> Result<EarliestArrival<'a>, JourneyError> {
    validate_stops(network, departures, arrivals)?;

    let best_known = scan(network, departures, arrivals, start_time, |_, _| {});

    let (stop, arrival_time) = arrivals
        .iter()
        .filter_map(|&stop| best_known[stop as usize].map(|entry| (stop, entry.arrival_time)))
        .min_by_key(|&(_, arrival_time)| arrival_time)
        .ok_or(JourneyError::NoJourneyFound)?;

    let journey = reconstruct(network, &best_known, departures, stop)?;
    Ok(EarliestArrival { arrival_time, stop, journey })
}

pub fn earliest_arrival_by_id<'a>(
    network: &'a Network,
    departures: &[&str],
    arrivals: &[&str],
    start_time: Timestamp,
) -> Result<EarliestArrival<'a>, JourneyError> {
    let departures = departures.iter().map(|id| network.resolve_stop(id)).collect::<Result<Vec<_>, _>>()?;
    let arrivals = arrivals.iter().map(|id| network.resolve_stop(id)).collect::<Result<Vec<_>, _>>()?;
    earliest_arrival(network, &departures, &arrivals, start_time)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::journey::LegKind;
    use crate::test_fixtures::{network, toy_network};

    // Each leg starts where and after the previous one ended.
    fn assert_consistent(journey: &Journey, from: StopIndex, to: StopIndex, start_time: Timestamp) {
        let mut stop = from;
        let mut time = start_time;
        for leg in &journey.legs {
            assert_eq!(leg.departure_stop(), stop);
            assert!(leg.departure_time >= time);
            assert!(leg.arrival_time >= leg.departure_time);
            stop = leg.arrival_stop();
            time = leg.arrival_time;
        }
        assert_eq!(stop, to);
    }

    #[test]
    fn toy_network_rides_when_the_footpath_is_slow() {
        let network = toy_network(5);
        let result = earliest_arrival(&network, &[0], &[3], 0).unwrap();
        assert_eq!(result.arrival_time, 2);
        assert_eq!(result.stop, 3);
        assert_consistent(&result.journey, 0, 3, 0);
        assert!(result.journey.legs.iter().all(|leg| leg.kind() == LegKind::Ride));
        assert_eq!(result.journey.legs.last().and_then(|leg| leg.trip()), Some(1));
    }

    #[test]
    fn toy_network_walks_when_the_footpath_is_fast() {
        let network = toy_network(1);
        let result = earliest_arrival(&network, &[0], &[3], 0).unwrap();
        assert_eq!(result.arrival_time, 1);
        assert_consistent(&result.journey, 0, 3, 0);
        let kinds: Vec<_> = result.journey.legs.iter().map(|leg| leg.kind()).collect();
        assert_eq!(kinds, vec![LegKind::Ride, LegKind::Walk]);
        assert_eq!(result.journey.legs[0].trip(), Some(4));
    }

    #[test]
    fn invalid_queries_are_rejected() {
        let network = toy_network(1);
        assert_eq!(earliest_arrival(&network, &[0], &[0], 0).unwrap_err(), JourneyError::SameStop);
        assert_eq!(earliest_arrival(&network, &[0, 1], &[3, 1], 0).unwrap_err(), JourneyError::SameStop);
        assert_eq!(earliest_arrival(&network, &[], &[3], 0).unwrap_err(), JourneyError::EmptyStopSet);
        assert_eq!(earliest_arrival(&network, &[0], &[], 0).unwrap_err(), JourneyError::EmptyStopSet);
        assert_eq!(earliest_arrival(&network, &[0], &[9], 0).unwrap_err(), JourneyError::UnknownStop("9".into()));
        assert_eq!(
            earliest_arrival_by_id(&network, &["0"], &["nowhere"], 0).unwrap_err(),
            JourneyError::UnknownStop("nowhere".into())
        );
    }

    #[test]
    fn isolated_stop_is_unreachable() {
        let network = network(6, &[(0, 0, 0, 1, 10), (1, 1, 20, 2, 30)], &[(2, 3, 5)]);
        assert_eq!(earliest_arrival(&network, &[0], &[5], 0).unwrap_err(), JourneyError::NoJourneyFound);
        // Too late for every connection.
        assert_eq!(earliest_arrival(&network, &[0], &[2], 1).unwrap_err(), JourneyError::NoJourneyFound);
    }

    #[test]
    fn departure_footpaths_are_seeded() {
        let network = network(3, &[(0, 1, 100, 2, 200)], &[(0, 1, 60)]);
        let result = earliest_arrival(&network, &[0], &[2], 30).unwrap();
        assert_eq!(result.arrival_time, 200);
        assert_consistent(&result.journey, 0, 2, 30);
        assert_eq!(result.journey.legs[0].kind(), LegKind::Walk);
        assert_eq!(result.journey.legs[0].departure_time, 30);

        // The walk arrives after the connection has left.
        assert_eq!(earliest_arrival(&network, &[0], &[2], 50).unwrap_err(), JourneyError::NoJourneyFound);
        // Walking alone reaches the middle stop.
        assert_eq!(earliest_arrival(&network, &[0], &[1], 50).unwrap().arrival_time, 110);
    }

    #[test]
    fn earliest_of_several_arrival_stops_wins() {
        let network = network(5, &[(0, 0, 10, 1, 100), (1, 0, 10, 2, 50), (2, 3, 0, 4, 20)], &[]);
        let result = earliest_arrival(&network, &[0, 3], &[1, 2], 0).unwrap();
        assert_eq!((result.stop, result.arrival_time), (2, 50));

        let result = earliest_arrival_by_id(&network, &["3"], &["4"], 0).unwrap();
        assert_eq!((result.stop, result.arrival_time), (4, 20));
    }

    #[test]
    fn missing_predecessor_is_reported() {
        let network = toy_network(1);
        let mut best_known = vec![None; network.num_stops()];
        best_known[2] = Some(BestKnownEntry { arrival_time: 5, movement: None });
        assert_eq!(
            reconstruct(&network, &best_known, &[0], 2).unwrap_err(),
            JourneyError::BrokenChain { stop: 2 }
        );
    }

    #[test]
    fn cyclic_predecessors_are_reported() {
        let network = toy_network(1);
        let mut best_known = vec![None; network.num_stops()];
        let footpaths = network.footpaths();
        // 3 -> 4 -> 3 -> ...
        for footpath in footpaths {
            best_known[footpath.arrival_stop as usize] =
                Some(BestKnownEntry { arrival_time: 10, movement: Some(Movement::Footpath(footpath)) });
        }
        assert_eq!(reconstruct(&network, &best_known, &[0], 3).unwrap_err(), JourneyError::InfiniteLoop);
    }

    fn random_network(num_stops: u32, num_connections: usize) -> Network {
        let connections: Vec<_> = (0..num_connections as u32)
            .map(|trip| {
                let from = fastrand::u32(0..num_stops);
                let to = (from + fastrand::u32(1..num_stops)) % num_stops;
                let departure_time = fastrand::u32(0..1000);
                (trip, from, departure_time, to, departure_time + fastrand::u32(1..100))
            })
            .collect();
        network(num_stops as usize, &connections, &[])
    }

    // Fixed point of connection relaxation, ignoring scan order.
    fn brute_force(network: &Network, from: StopIndex, start_time: Timestamp) -> Vec<Option<Timestamp>> {
        let mut best = vec![None; network.num_stops()];
        best[from as usize] = Some(start_time);
        let mut changed = true;
        while changed {
            changed = false;
            for connection in &network.connections {
                let reachable = connection.departure_time >= start_time
                    && best[connection.departure_stop as usize].is_some_and(|t| t <= connection.departure_time);
                let arrival = &mut best[connection.arrival_stop as usize];
                if reachable && arrival.is_none_or(|t| connection.arrival_time < t) {
                    *arrival = Some(connection.arrival_time);
                    changed = true;
                }
            }
        }
        best
    }

    #[test]
    fn matches_brute_force_on_random_networks() {
        fastrand::seed(11);
        for _ in 0..30 {
            let network = random_network(15, 150);
            let start_time = fastrand::u32(0..500);
            let expected = brute_force(&network, 0, start_time);
            for to in 1..15 {
                match (earliest_arrival(&network, &[0], &[to], start_time), expected[to as usize]) {
                    (Ok(result), Some(arrival_time)) => {
                        assert_eq!(result.arrival_time, arrival_time);
                        assert_eq!(result.journey.arrival_time(), Some(arrival_time));
                        assert_consistent(&result.journey, 0, to, start_time);
                    }
                    (Err(JourneyError::NoJourneyFound), None) => {}
                    (result, expected) => panic!("Got {result:?}, expected {expected:?}."),
                }
            }
        }
    }

    #[test]
    fn best_known_arrivals_only_decrease() {
        fastrand::seed(5);
        for _ in 0..20 {
            let network = random_network(10, 200);
            let mut last_seen: HashMap<StopIndex, Timestamp> = HashMap::new();
            scan(&network, &[0], &[9], fastrand::u32(0..300), |stop, arrival_time| {
                if let Some(previous) = last_seen.insert(stop, arrival_time) {
                    assert!(arrival_time < previous);
                }
            });
        }
    }
}
