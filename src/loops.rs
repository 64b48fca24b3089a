// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Boundary loop builder: threads unpaired boundary edges into closed
//! vertex cycles

use crate::edges::BoundarySet;
use std::collections::{HashMap, HashSet};

/// Loops recovered from a boundary edge set, plus the boundary vertices
/// that could not be threaded into a clean cycle
#[derive(Debug, Clone, Default)]
pub struct LoopSet {
    /// Closed cycles of vertex indices, each covering a disjoint subset
    /// of boundary vertices. Traversal direction is chosen so that a cap
    /// triangulated in cycle order winds opposite the adjacent surface
    /// triangles.
    pub loops: Vec<Vec<usize>>,
    /// Boundary vertices with degree ≠ 2 (pinch points / non-manifold
    /// boundary). These and any chain touching them are left unfilled.
    pub skipped_vertices: usize,
}

/// Build closed loops from the boundary edge set.
///
/// Simple holes give every boundary vertex exactly two boundary
/// neighbors; such vertices are threaded neighbor-to-neighbor until the
/// walk returns to its start. Vertices violating the degree-2
/// precondition are excluded up front and any chain that runs into one
/// (or into a previously abandoned chain) is discarded rather than
/// mis-threaded.
pub fn build_loops(boundary: &BoundarySet) -> LoopSet {
    let mut neighbors: HashMap<usize, Vec<usize>> = HashMap::new();
    for edge in boundary.iter() {
        let (a, b) = edge.endpoints();
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }

    let pinched: HashSet<usize> = neighbors
        .iter()
        .filter(|(_, adjacent)| adjacent.len() != 2)
        .map(|(&vertex, _)| vertex)
        .collect();

    let mut visited: HashSet<usize> = pinched.clone();
    let mut loops = Vec::new();

    // Deterministic discovery order
    let mut starts: Vec<usize> = neighbors.keys().copied().collect();
    starts.sort_unstable();

    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut cycle = Vec::new();
        let mut prev = usize::MAX;
        let mut current = start;
        let closed = loop {
            visited.insert(current);
            cycle.push(current);
            let adjacent = &neighbors[&current];
            let next = if adjacent[0] != prev {
                adjacent[0]
            } else {
                adjacent[1]
            };
            if next == start {
                break true;
            }
            if visited.contains(&next) {
                // pinched vertex or remnant of an abandoned chain
                break false;
            }
            prev = current;
            current = next;
        };
        if closed && cycle.len() >= 3 {
            orient(&mut cycle, boundary);
            loops.push(cycle);
        }
    }

    LoopSet {
        loops,
        skipped_vertices: pinched.len(),
    }
}

/// A cap triangle sharing a boundary edge must traverse it opposite to
/// the existing triangle's winding; reverse the cycle if it runs the
/// same way.
fn orient(cycle: &mut [usize], boundary: &BoundarySet) {
    if let Some(direction) = boundary.winding(cycle[0], cycle[1]) {
        if direction == (cycle[0], cycle[1]) {
            cycle.reverse();
        }
    }
}
