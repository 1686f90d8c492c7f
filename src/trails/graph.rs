//! Shortest paths over trail polylines.
//!
//! Trail vertices become graph nodes, deduplicated by coordinate so that ways
//! sharing a node are connected. Anchors (waypoint projections) are spliced
//! into the segment they fall on, ordered by their position along it.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use crate::geo::distance_meters;
use crate::models::{Point, Trail};

/// Coordinates are merged when equal at this precision (about 1 cm)
const NODE_KEY_PRECISION: f64 = 1e7;

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A point spliced into a trail segment
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    /// Position of the trail in the slice given to [`TrailGraph::build`]
    pub trail_position: usize,
    pub segment_index: usize,
    pub t: f64,
    pub point: Point,
}

/// Undirected graph weighted by great-circle meters
pub struct TrailGraph {
    nodes: Vec<Point>,
    edges: Vec<Vec<(usize, f64)>>,
    anchor_nodes: Vec<usize>,
}

impl TrailGraph {
    #[must_use]
    pub fn build(trails: &[Trail], anchors: &[Anchor]) -> Self {
        let mut graph = TrailGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            anchor_nodes: Vec::with_capacity(anchors.len()),
        };
        let mut by_key: HashMap<(i64, i64), usize> = HashMap::new();

        let mut on_segment: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (i, anchor) in anchors.iter().enumerate() {
            on_segment
                .entry((anchor.trail_position, anchor.segment_index))
                .or_default()
                .push(i);
        }

        let anchor_ids: Vec<usize> = anchors.iter().map(|a| graph.add_node(a.point)).collect();
        graph.anchor_nodes.clone_from(&anchor_ids);

        for (trail_position, trail) in trails.iter().enumerate() {
            for (segment_index, segment) in trail.geometry.windows(2).enumerate() {
                let start = graph.vertex(&mut by_key, segment[0]);
                let end = graph.vertex(&mut by_key, segment[1]);

                let mut chain = vec![start];
                if let Some(spliced) = on_segment.get_mut(&(trail_position, segment_index)) {
                    spliced.sort_by(|a, b| anchors[*a].t.total_cmp(&anchors[*b].t));
                    chain.extend(spliced.iter().map(|i| anchor_ids[*i]));
                }
                chain.push(end);

                for pair in chain.windows(2) {
                    graph.connect(pair[0], pair[1]);
                }
            }
        }
        graph
    }

    fn add_node(&mut self, point: Point) -> usize {
        self.nodes.push(point);
        self.edges.push(Vec::new());
        self.nodes.len() - 1
    }

    fn vertex(&mut self, by_key: &mut HashMap<(i64, i64), usize>, point: Point) -> usize {
        let key = (
            (point.lat * NODE_KEY_PRECISION).round() as i64,
            (point.lon * NODE_KEY_PRECISION).round() as i64,
        );
        if let Some(id) = by_key.get(&key) {
            return *id;
        }
        let id = self.add_node(point);
        by_key.insert(key, id);
        id
    }

    fn connect(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let weight = distance_meters(&self.nodes[a], &self.nodes[b]);
        self.edges[a].push((b, weight));
        self.edges[b].push((a, weight));
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Shortest path visiting every anchor in order.
    ///
    /// Returns `None` when any consecutive pair of anchors is disconnected.
    #[must_use]
    pub fn path_through_anchors(&self) -> Option<Vec<Point>> {
        let mut path: Vec<Point> = Vec::new();
        for leg in self.anchor_nodes.windows(2) {
            let nodes = self.shortest_path(leg[0], leg[1])?;
            let skip = usize::from(!path.is_empty());
            path.extend(nodes.into_iter().skip(skip).map(|n| self.nodes[n]));
        }
        if path.is_empty() {
            if let Some(only) = self.anchor_nodes.first() {
                path.push(self.nodes[*only]);
            }
        }
        Some(path)
    }

    fn shortest_path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut dist = vec![f64::INFINITY; self.nodes.len()];
        let mut previous: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut queue = BinaryHeap::new();

        dist[from] = 0.0;
        queue.push(Reverse((FloatOrd(0.0), from)));

        while let Some(Reverse((FloatOrd(cost), node))) = queue.pop() {
            if node == to {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            for &(next, weight) in &self.edges[node] {
                let candidate = cost + weight;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    previous[next] = Some(node);
                    queue.push(Reverse((FloatOrd(candidate), next)));
                }
            }
        }

        if !dist[to].is_finite() {
            return None;
        }

        let mut nodes = vec![to];
        let mut current = to;
        while let Some(prev) = previous[current] {
            nodes.push(prev);
            current = prev;
        }
        nodes.reverse();
        Some(nodes)
    }
}
