//! Path network graph.
//!
//! Nodes are path endpoints clustered within a tolerance; every non-draft
//! path is an edge between its two end nodes. Used for merge checks,
//! connectivity reports and shortest routes between positions.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use geo::Coord;
use log::debug;

use crate::error::{OptionExt, Result, TopologyError};
use crate::linear::coords_close;
use crate::PathId;

use super::path_store::PathStore;

pub type NodeId = usize;

/// A network node: the shared end of one or more paths.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub coord: Coord<f64>,
    /// Paths ending here. A loop path appears twice.
    pub paths: Vec<PathId>,
}

/// A path seen as a graph edge.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub path_id: PathId,
    pub from: NodeId,
    pub to: NodeId,
    pub length: f64,
}

/// A route on the network as a list of `(path, start, end)` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub steps: Vec<(PathId, f64, f64)>,
    pub length: f64,
}

/// State for Dijkstra's algorithm
#[derive(Clone, Copy, PartialEq)]
struct DijkstraState {
    cost: f64,
    node: NodeId,
}

impl Eq for DijkstraState {}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a node was reached during the route search.
#[derive(Debug, Clone, Copy)]
enum Via {
    /// Directly from the start position along its path, towards `end` (0 or 1)
    Origin { end: f64 },
    /// From another node through a whole path
    Edge { prev: NodeId, path_id: PathId, forward: bool },
}

/// Graph view of the non-draft paths.
#[derive(Debug, Default)]
pub struct PathNetwork {
    nodes: Vec<Node>,
    edges: HashMap<PathId, Edge>,
    adjacency: HashMap<NodeId, Vec<PathId>>,
    grid: HashMap<(i64, i64), Vec<NodeId>>,
    tolerance: f64,
}

impl PathNetwork {
    /// Build the graph of every non-draft path in the store.
    pub fn build(store: &PathStore, tolerance: f64) -> Self {
        let mut network = Self {
            tolerance: tolerance.max(f64::EPSILON),
            ..Self::default()
        };

        for path in store.values().filter(|p| !p.is_draft()) {
            let from = network.node_for(path.start());
            let to = network.node_for(path.end());
            network.nodes[from].paths.push(path.id);
            network.nodes[to].paths.push(path.id);
            network.adjacency.entry(from).or_default().push(path.id);
            if to != from {
                network.adjacency.entry(to).or_default().push(path.id);
            }
            network.edges.insert(
                path.id,
                Edge {
                    path_id: path.id,
                    from,
                    to,
                    length: path.length(),
                },
            );
        }

        debug!(
            "[Network] built {} nodes, {} edges",
            network.nodes.len(),
            network.edges.len()
        );
        network
    }

    fn cell(&self, coord: Coord<f64>) -> (i64, i64) {
        (
            (coord.x / self.tolerance).floor() as i64,
            (coord.y / self.tolerance).floor() as i64,
        )
    }

    fn node_for(&mut self, coord: Coord<f64>) -> NodeId {
        if let Some(id) = self.node_of(coord) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            coord,
            paths: Vec::new(),
        });
        let cell = self.cell(coord);
        self.grid.entry(cell).or_default().push(id);
        id
    }

    /// Node within tolerance of a coordinate.
    pub fn node_of(&self, coord: Coord<f64>) -> Option<NodeId> {
        let (cx, cy) = self.cell(coord);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.grid.get(&(cx + dx, cy + dy)) {
                    if let Some(id) = ids
                        .iter()
                        .find(|id| coords_close(self.nodes[**id].coord, coord, self.tolerance))
                    {
                        return Some(*id);
                    }
                }
            }
        }
        None
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, path_id: PathId) -> Option<&Edge> {
        self.edges.get(&path_id)
    }

    /// Number of path ends at a node.
    pub fn degree(&self, id: NodeId) -> usize {
        self.nodes.get(id).map_or(0, |n| n.paths.len())
    }

    /// Distinct paths touching a node.
    pub fn paths_at(&self, id: NodeId) -> Vec<PathId> {
        self.adjacency.get(&id).cloned().unwrap_or_default()
    }

    /// Edges leaving a node, with the node at their other end.
    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = (&Edge, NodeId)> + '_ {
        self.paths_at(id).into_iter().filter_map(move |path_id| {
            self.edges.get(&path_id).map(|edge| {
                let other = if edge.from == id { edge.to } else { edge.from };
                (edge, other)
            })
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Groups of paths connected to each other, each sorted, ordered by
    /// their smallest path id.
    pub fn connected_components(&self) -> Vec<Vec<PathId>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut queue = VecDeque::new();
            queue.push_back(start);
            let mut paths: Vec<PathId> = Vec::new();

            while let Some(node) = queue.pop_front() {
                for (edge, other) in self.edges_from(node) {
                    if !paths.contains(&edge.path_id) {
                        paths.push(edge.path_id);
                    }
                    if !seen[other] {
                        seen[other] = true;
                        queue.push_back(other);
                    }
                }
            }

            if !paths.is_empty() {
                paths.sort_unstable();
                components.push(paths);
            }
        }

        components.sort_by_key(|c| c[0]);
        components
    }

    /// Shortest route between two positions on the network.
    pub fn shortest_route(&self, from: (PathId, f64), to: (PathId, f64)) -> Result<Route> {
        let (from_path, from_pos) = from;
        let (to_path, to_pos) = to;
        let origin = *self.edges.get(&from_path).ok_or_path_not_found(from_path)?;
        let target = *self.edges.get(&to_path).ok_or_path_not_found(to_path)?;

        let mut best: Option<Route> = None;
        if from_path == to_path {
            best = Some(Route {
                steps: vec![(from_path, from_pos, to_pos)],
                length: (to_pos - from_pos).abs() * origin.length,
            });
        }

        let mut dist: HashMap<NodeId, f64> = HashMap::new();
        let mut via: HashMap<NodeId, Via> = HashMap::new();
        let mut heap = BinaryHeap::new();

        for (node, end, cost) in [
            (origin.from, 0.0, from_pos * origin.length),
            (origin.to, 1.0, (1.0 - from_pos) * origin.length),
        ] {
            if cost < *dist.get(&node).unwrap_or(&f64::INFINITY) {
                dist.insert(node, cost);
                via.insert(node, Via::Origin { end });
                heap.push(DijkstraState { cost, node });
            }
        }

        while let Some(DijkstraState { cost, node }) = heap.pop() {
            if cost > *dist.get(&node).unwrap_or(&f64::INFINITY) {
                continue;
            }
            for (edge, other) in self.edges_from(node) {
                let next = cost + edge.length;
                if next < *dist.get(&other).unwrap_or(&f64::INFINITY) {
                    dist.insert(other, next);
                    via.insert(
                        other,
                        Via::Edge {
                            prev: node,
                            path_id: edge.path_id,
                            forward: edge.from == node,
                        },
                    );
                    heap.push(DijkstraState { cost: next, node: other });
                }
            }
        }

        for (node, end, tail) in [
            (target.from, 0.0, to_pos * target.length),
            (target.to, 1.0, (1.0 - to_pos) * target.length),
        ] {
            let Some(reached) = dist.get(&node) else {
                continue;
            };
            let total = reached + tail;
            if best.as_ref().map_or(true, |b| total < b.length) {
                let mut steps = self.unwind(node, &via, from);
                steps.push((to_path, end, to_pos));
                best = Some(Route {
                    steps,
                    length: total,
                });
            }
        }

        best.ok_or(TopologyError::NotConnected {
            from: from_path,
            to: to_path,
        })
    }

    fn unwind(&self, mut node: NodeId, via: &HashMap<NodeId, Via>, from: (PathId, f64)) -> Vec<(PathId, f64, f64)> {
        let mut steps = Vec::new();
        loop {
            match via.get(&node) {
                Some(Via::Edge {
                    prev,
                    path_id,
                    forward,
                }) => {
                    if *forward {
                        steps.push((*path_id, 0.0, 1.0));
                    } else {
                        steps.push((*path_id, 1.0, 0.0));
                    }
                    node = *prev;
                }
                Some(Via::Origin { end }) => {
                    steps.push((from.0, from.1, *end));
                    break;
                }
                None => break,
            }
        }
        steps.reverse();
        steps
    }
}
