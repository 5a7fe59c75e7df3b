use std::cmp::Ordering;

use crate::geometry::Coordinate;

struct BallPoint<T> {
    coord: Coordinate,
    item: T,
}

enum BallTreeNode<T> {
    // Holds at most one point.
    Leaf(Option<BallPoint<T>>),
    Internal {
        center: Coordinate,
        // Max distance from the center to any point below this node.
        radius: f64,
        left: Box<BallTreeNode<T>>,
        right: Box<BallTreeNode<T>>,
    },
}

impl<T> BallTreeNode<T> {
    fn build(mut points: Vec<BallPoint<T>>) -> Self {
        if points.len() <= 1 {
            return BallTreeNode::Leaf(points.pop());
        }

        // Approximate the diameter of the set with two farthest-point passes.
        let pivot = points[0].coord;
        let p2 = farthest_from(&points, &pivot);
        let p3 = farthest_from(&points, &p2);
        let center = p2.midpoint(&p3);
        let radius = points
            .iter()
            .map(|point| center.distance_km(&point.coord))
            .fold(0.0, f64::max);

        // Split into halves by distance to the pivot.
        points.sort_by(|a, b| pivot.distance_km(&a.coord).total_cmp(&pivot.distance_km(&b.coord)));
        let right = points.split_off(points.len() / 2);

        BallTreeNode::Internal {
            center,
            radius,
            left: Box::new(Self::build(points)),
            right: Box::new(Self::build(right)),
        }
    }

    fn center(&self) -> Option<Coordinate> {
        match self {
            BallTreeNode::Leaf(point) => point.as_ref().map(|point| point.coord),
            BallTreeNode::Internal { center, .. } => Some(*center),
        }
    }

    // Lower bound on the distance from the target to anything in this node.
    fn min_distance(&self, target: &Coordinate) -> f64 {
        match self {
            BallTreeNode::Leaf(Some(point)) => target.distance_km(&point.coord),
            BallTreeNode::Leaf(None) => f64::INFINITY,
            BallTreeNode::Internal { center, radius, .. } => target.distance_km(center) - radius,
        }
    }

    fn collect_within<'a>(&'a self, target: &Coordinate, radius_km: f64, found: &mut Vec<&'a T>) {
        match self {
            BallTreeNode::Leaf(Some(point)) => {
                if target.distance_km(&point.coord) <= radius_km {
                    found.push(&point.item);
                }
            }
            BallTreeNode::Leaf(None) => {}
            BallTreeNode::Internal { center, radius, left, right } => {
                // The closest possible point in the ball is already too far.
                if target.distance_km(center) - radius > radius_km {
                    return;
                }
                left.collect_within(target, radius_km, found);
                right.collect_within(target, radius_km, found);
            }
        }
    }

    fn nearest<'a>(&'a self, target: &Coordinate, best: &mut Option<(&'a T, f64)>) {
        if best.is_some_and(|(_, best_distance)| self.min_distance(target) > best_distance) {
            return;
        }

        match self {
            BallTreeNode::Leaf(Some(point)) => {
                let distance = target.distance_km(&point.coord);
                if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                    *best = Some((&point.item, distance));
                }
            }
            BallTreeNode::Leaf(None) => {}
            BallTreeNode::Internal { left, right, .. } => {
                // Explore the closer child first so the bound tightens early.
                let left_distance = left.center().map_or(f64::INFINITY, |c| target.distance_km(&c));
                let right_distance = right.center().map_or(f64::INFINITY, |c| target.distance_km(&c));
                let (first, second) = match left_distance.total_cmp(&right_distance) {
                    Ordering::Greater => (right, left),
                    _ => (left, right),
                };
                first.nearest(target, best);
                second.nearest(target, best);
            }
        }
    }
}

fn farthest_from<T>(points: &[BallPoint<T>], from: &Coordinate) -> Coordinate {
    points
        .iter()
        .map(|point| (point.coord, from.distance_km(&point.coord)))
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(*from, |(coord, _)| coord)
}

/// Static ball tree over geographic points, used to find the stops close enough to walk between.
///
/// The tree is built once and never updated. Each item is stored alongside its coordinate.
pub struct BallTree<T> {
    root: BallTreeNode<T>,
    len: usize,
}

impl<T> BallTree<T> {
    pub fn new(points: Vec<(Coordinate, T)>) -> Self {
        let len = points.len();
        let points = points.into_iter().map(|(coord, item)| BallPoint { coord, item }).collect();
        Self { root: BallTreeNode::build(points), len }
    }

    /// All items within `radius_km` of `target` (inclusive), in no particular order.
    pub fn find_within_radius(&self, target: &Coordinate, radius_km: f64) -> Vec<&T> {
        let mut found = Vec::new();
        self.root.collect_within(target, radius_km, &mut found);
        found
    }

    /// The closest item to `target` and its distance in kilometres.
    pub fn nearest(&self, target: &Coordinate) -> Option<(&T, f64)> {
        let mut best = None;
        self.root.nearest(target, &mut best);
        best
    }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }
}
