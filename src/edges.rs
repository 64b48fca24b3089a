// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Edge ledger: canonical edge keys, XOR-style boundary extraction, and
//! incidence-parity closure checking

use crate::error::MeshError;
use crate::mesh::Mesh;
use crate::progress::{CancelToken, Pass, Report, SCAN_STEP};
use std::collections::HashMap;

/// Unordered edge stored as (min, max) so that (a, b) and (b, a)
/// compare and hash identically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    a: usize,
    b: usize,
}

impl Edge {
    pub fn new(x: usize, y: usize) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// Endpoints in canonical (min, max) order
    pub fn endpoints(&self) -> (usize, usize) {
        (self.a, self.b)
    }
}

/// Boundary edge set built by XOR accumulation: toggling an edge once
/// inserts it, toggling again removes it. After every triangle edge has
/// been toggled, the surviving edges are exactly the open boundary.
///
/// The direction each surviving edge was seen in (as its triangle wound
/// it) is retained so hole caps can be wound consistently with the
/// surrounding mesh.
#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    edges: HashMap<Edge, (usize, usize)>,
}

impl BoundarySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of canonical edge (x, y)
    pub fn toggle(&mut self, x: usize, y: usize) {
        let edge = Edge::new(x, y);
        if self.edges.remove(&edge).is_none() {
            self.edges.insert(edge, (x, y));
        }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.edges.contains_key(&Edge::new(x, y))
    }

    /// Direction the surviving edge was wound by its triangle, or `None`
    /// if the edge is not on the boundary
    pub fn winding(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        self.edges.get(&Edge::new(x, y)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Per-edge incidence counter for closure checking
#[derive(Debug, Clone, Default)]
pub struct IncidenceCounter {
    counts: HashMap<Edge, u32>,
}

impl IncidenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, x: usize, y: usize) {
        *self.counts.entry(Edge::new(x, y)).or_insert(0) += 1;
    }

    pub fn count(&self, x: usize, y: usize) -> u32 {
        self.counts.get(&Edge::new(x, y)).copied().unwrap_or(0)
    }

    /// A mesh is closed iff every edge has even incidence. Non-manifold
    /// edges shared by four or more triangles pass as long as the count
    /// stays even.
    pub fn all_even(&self) -> bool {
        self.counts.values().all(|&count| count % 2 == 0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Incremental closed-mesh check: accumulates edge incidence counts over
/// weld-canonicalized triangles, then reports whether every count is even
pub struct ClosurePass<'a> {
    mesh: &'a Mesh,
    weld: Vec<usize>,
    counter: IncidenceCounter,
    cursor: usize,
    token: CancelToken,
    last: Option<Report>,
}

const CLOSURE_PHASE: &str = "checking edge parity";

impl<'a> ClosurePass<'a> {
    /// Validates the mesh and remap up front; stepping never fails
    pub fn new(mesh: &'a Mesh, weld: Vec<usize>, token: CancelToken) -> Result<Self, MeshError> {
        mesh.validate()?;
        if weld.len() != mesh.vertex_count() {
            return Err(MeshError::WeldLengthMismatch {
                expected: mesh.vertex_count(),
                got: weld.len(),
            });
        }
        Ok(Self::with_weld(mesh, weld, token))
    }

    /// Skips validation; the caller has already validated the mesh
    pub(crate) fn with_weld(mesh: &'a Mesh, weld: Vec<usize>, token: CancelToken) -> Self {
        Self {
            mesh,
            weld,
            counter: IncidenceCounter::new(),
            cursor: 0,
            token,
            last: None,
        }
    }

    fn fraction(&self) -> f64 {
        let total = self.mesh.triangle_count();
        if total == 0 {
            1.0
        } else {
            self.cursor as f64 / total as f64
        }
    }
}

impl Pass for ClosurePass<'_> {
    type Output = bool;

    fn step(&mut self) -> Report {
        if let Some(last) = &self.last {
            if last.is_terminal() {
                return last.clone();
            }
        }
        if self.token.is_cancelled() {
            let report = Report::cancelled(self.fraction(), CLOSURE_PHASE);
            self.last = Some(report.clone());
            return report;
        }

        let total = self.mesh.triangle_count();
        let end = (self.cursor + SCAN_STEP).min(total);
        for t in self.cursor..end {
            let i0 = self.weld[self.mesh.indices[t * 3]];
            let i1 = self.weld[self.mesh.indices[t * 3 + 1]];
            let i2 = self.weld[self.mesh.indices[t * 3 + 2]];
            self.counter.increment(i0, i1);
            self.counter.increment(i1, i2);
            self.counter.increment(i2, i0);
        }
        self.cursor = end;

        let report = if self.cursor == total {
            Report::finished(CLOSURE_PHASE)
        } else {
            Report::running(self.fraction(), CLOSURE_PHASE)
        };
        self.last = Some(report.clone());
        report
    }

    fn into_output(self) -> Option<bool> {
        match &self.last {
            Some(report) if report.finished => Some(self.counter.all_even()),
            _ => None,
        }
    }
}
