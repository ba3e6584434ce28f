//! The functional graph of `x -> (x * mult) mod m`.
//!
//! Everything a renderer needs is computed here as plain data:
//! - the directed edges of the map, in first-discovery order
//! - a fixed position on the unit circle for every node
//! - one normalized scalar per edge, used to pick the edge color
//!
//! Each call is independent and fully deterministic.

use crate::error::{CardioidError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// A node is a residue in `[0, modulus)`.
pub type Node = u64;

/// Scalar assigned to every edge when all edge distances are equal.
pub const UNIFORM_SCALAR: f64 = 0.5;

/// One application of the map. Never a self-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: Node,
    pub to: Node,
    /// `|to - from|`, recorded when the edge is discovered.
    pub distance: u64,
}

/// Directed graph of the map over the nodes `0..modulus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalGraph {
    pub modulus: u64,
    /// The multiplier as requested, before reduction.
    pub multiplier: u64,
    /// Edges in insertion order.
    pub edges: Vec<Edge>,
    /// Order in which nodes became the traversal cursor. A permutation of `0..modulus`.
    pub discovery: Vec<Node>,
}

impl FunctionalGraph {
    pub fn node_count(&self) -> u64 {
        self.modulus
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> {
        0..self.modulus
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The outgoing edge's target, or `None` for a self-loop node.
    pub fn successor(&self, node: Node) -> Option<Node> {
        self.edges.iter().find(|e| e.from == node).map(|e| e.to)
    }

    pub fn out_degree(&self, node: Node) -> usize {
        self.edges.iter().filter(|e| e.from == node).count()
    }

    pub fn distances(&self) -> impl Iterator<Item = u64> + '_ {
        self.edges.iter().map(|e| e.distance)
    }
}

/// A point on the unit circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Why the edge scalars could not be normalized the usual way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColoringFallback {
    /// The graph has no edges; the scalar sequence is empty.
    NoEdges,
    /// Every edge has the same distance; each scalar is [`UNIFORM_SCALAR`].
    UniformDistance,
}

/// Per-edge scalars in `[0, 1]`, aligned with [`FunctionalGraph::edges`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeColors {
    pub scalars: Vec<f64>,
    pub fallback: Option<ColoringFallback>,
}

/// Graph, layout and edge scalars for one `(modulus, multiplier)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub graph: FunctionalGraph,
    /// Indexed by node.
    pub positions: Vec<Position>,
    pub colors: EdgeColors,
}

impl Diagram {
    pub fn modulus(&self) -> u64 {
        self.graph.modulus
    }

    pub fn multiplier(&self) -> u64 {
        self.graph.multiplier
    }

    /// Edges zipped with their scalars.
    pub fn colored_edges(&self) -> impl Iterator<Item = (&Edge, f64)> + '_ {
        self.graph
            .edges
            .iter()
            .zip(self.colors.scalars.iter().copied())
    }
}

fn node_capacity(modulus: u64) -> Result<usize> {
    if modulus == 0 {
        return Err(CardioidError::invalid(
            "mod",
            modulus,
            "modulus must be at least 1",
        ));
    }
    usize::try_from(modulus)
        .map_err(|_| CardioidError::invalid("mod", modulus, "modulus exceeds addressable nodes"))
}

/// An empty buffer able to hold one `T` per node without reallocating.
fn node_buffer<T>(modulus: u64) -> Result<Vec<T>> {
    let capacity = node_capacity(modulus)?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(capacity)
        .map_err(|e| CardioidError::invalid("mod", modulus, format!("cannot allocate nodes: {e}")))?;
    Ok(buffer)
}

/// Products are taken in `u128`, so any `u64` multiplier is accepted.
fn step(current: Node, multiplier: u64, modulus: u64) -> Node {
    ((current as u128 * multiplier as u128) % modulus as u128) as Node
}

/// Build the functional graph of `x -> (x * multiplier) mod modulus`.
///
/// Nodes are scanned in ascending order. From each node not yet seen, the
/// orbit is followed until it reaches a node already seen or a fixed point.
/// Fixed points produce no edge. A node is marked seen when the walk lands on
/// it, so every node is the walk cursor exactly once.
pub fn build(modulus: u64, multiplier: u64) -> Result<FunctionalGraph> {
    let mut discovery: Vec<Node> = node_buffer(modulus)?;
    let mut visited: Vec<bool> = node_buffer(modulus)?;
    visited.resize(modulus as usize, false);
    let reduced = multiplier % modulus;
    let mut edges = Vec::new();

    for start in 0..modulus {
        if visited[start as usize] {
            continue;
        }

        let mut current = start;
        visited[current as usize] = true;
        discovery.push(current);

        loop {
            let next = step(current, reduced, modulus);
            if next == current {
                break;
            }

            edges.push(Edge {
                from: current,
                to: next,
                distance: current.abs_diff(next),
            });

            if visited[next as usize] {
                break;
            }
            visited[next as usize] = true;
            discovery.push(next);
            current = next;
        }
    }

    debug!(
        modulus,
        multiplier,
        edges = edges.len(),
        "Built functional graph"
    );

    Ok(FunctionalGraph {
        modulus,
        multiplier,
        edges,
        discovery,
    })
}

/// Place node `k` at angle `2πk / modulus` on the unit circle, counter-clockwise from `(1, 0)`.
pub fn layout(modulus: u64) -> Result<Vec<Position>> {
    let mut positions = node_buffer(modulus)?;
    let step = 2.0 * PI / modulus as f64;

    positions.extend((0..modulus).map(|k| {
        let (sin, cos) = (step * k as f64).sin_cos();
        Position { x: cos, y: sin }
    }));
    Ok(positions)
}

/// Normalize edge distances into `[0, 1]` via `(d - min) / (max - min)`.
///
/// With no edges the result is empty. When every distance is equal the
/// normalization is undefined and every edge gets [`UNIFORM_SCALAR`].
pub fn colorize(graph: &FunctionalGraph) -> EdgeColors {
    let bounds = graph
        .distances()
        .fold(None, |acc: Option<(u64, u64)>, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        });

    let Some((min_d, max_d)) = bounds else {
        debug!(modulus = graph.modulus, "No edges to color");
        return EdgeColors {
            scalars: Vec::new(),
            fallback: Some(ColoringFallback::NoEdges),
        };
    };

    if min_d == max_d {
        debug!(
            modulus = graph.modulus,
            distance = min_d,
            "Uniform edge distance, using constant scalar"
        );
        return EdgeColors {
            scalars: vec![UNIFORM_SCALAR; graph.edge_count()],
            fallback: Some(ColoringFallback::UniformDistance),
        };
    }

    let span = (max_d - min_d) as f64;
    EdgeColors {
        scalars: graph
            .distances()
            .map(|d| (d - min_d) as f64 / span)
            .collect(),
        fallback: None,
    }
}

/// Build the graph, the layout and the edge scalars for one request.
pub fn generate(modulus: u64, multiplier: u64) -> Result<Diagram> {
    let graph = build(modulus, multiplier)?;
    let positions = layout(modulus)?;
    let colors = colorize(&graph);

    Ok(Diagram {
        graph,
        positions,
        colors,
    })
}
