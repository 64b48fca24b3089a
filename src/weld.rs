// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Vertex welding: coordinate-based union of coincident vertices

use crate::progress::{CancelToken, Pass, Report, WELD_STEP};
use nalgebra::Point3;

/// Squared-distance threshold for coincidence. This is an exact-duplicate
/// detector, not a merge tolerance: near-duplicates just above it stay
/// distinct.
pub const WELD_EPSILON_SQ: f64 = 1e-10;

/// Incremental vertex welder.
///
/// Produces a remap where `remap[i]` is the canonical index of the
/// cluster containing vertex `i`; the canonical index is always the
/// lowest original index in the cluster, so the remap is idempotent.
/// O(N²) over the vertex array, sized for edit-time assets.
pub struct WeldPass<'a> {
    vertices: &'a [Point3<f64>],
    remap: Vec<usize>,
    cursor: usize,
    token: CancelToken,
    last: Option<Report>,
}

const WELD_PHASE: &str = "welding vertices";

impl<'a> WeldPass<'a> {
    pub fn new(vertices: &'a [Point3<f64>], token: CancelToken) -> Self {
        Self {
            vertices,
            remap: (0..vertices.len()).collect(),
            cursor: 0,
            token,
            last: None,
        }
    }

    fn fraction(&self) -> f64 {
        if self.vertices.is_empty() {
            1.0
        } else {
            self.cursor as f64 / self.vertices.len() as f64
        }
    }
}

impl Pass for WeldPass<'_> {
    type Output = Vec<usize>;

    fn step(&mut self) -> Report {
        if let Some(last) = &self.last {
            if last.is_terminal() {
                return last.clone();
            }
        }
        if self.token.is_cancelled() {
            let report = Report::cancelled(self.fraction(), WELD_PHASE);
            self.last = Some(report.clone());
            return report;
        }

        let n = self.vertices.len();
        let end = (self.cursor + WELD_STEP).min(n);
        for i in self.cursor..end {
            if self.remap[i] != i {
                continue; // already absorbed into an earlier cluster
            }
            let base = self.vertices[i];
            for j in (i + 1)..n {
                if self.remap[j] == j && (self.vertices[j] - base).norm_squared() < WELD_EPSILON_SQ
                {
                    self.remap[j] = i;
                }
            }
        }
        self.cursor = end;

        let report = if self.cursor == n {
            Report::finished(WELD_PHASE)
        } else {
            Report::running(self.fraction(), WELD_PHASE)
        };
        self.last = Some(report.clone());
        report
    }

    fn into_output(self) -> Option<Vec<usize>> {
        let finished = self.last.as_ref().is_some_and(|report| report.finished);
        finished.then_some(self.remap)
    }
}

/// Synchronous weld for callers that do not need progress reporting
pub fn weld_remap(vertices: &[Point3<f64>]) -> Vec<usize> {
    let mut pass = WeldPass::new(vertices, CancelToken::new());
    loop {
        if pass.step().finished {
            break;
        }
    }
    pass.into_output().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{drive, Outcome};

    #[test]
    fn test_empty_input_yields_empty_remap() {
        assert!(weld_remap(&[]).is_empty());
    }

    #[test]
    fn test_duplicates_map_to_lowest_index() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1e-4), // squared distance 1e-8, above the 1e-10 threshold
        ];
        let remap = weld_remap(&vertices);
        assert_eq!(remap, vec![0, 1, 0, 1, 4]);
    }

    #[test]
    fn test_threshold_is_squared_distance() {
        // 1e-6 apart: squared distance 1e-12 is below the squared
        // epsilon, so this is a duplicate even though the linear
        // distance exceeds 1e-10
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1e-6),
            Point3::new(0.0, 0.0, 1e-4),
        ];
        let remap = weld_remap(&vertices);
        assert_eq!(remap, vec![0, 0, 2]);
    }

    #[test]
    fn test_remap_is_a_partition() {
        let vertices = vec![
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(-0.5, 0.5, 0.5),
        ];
        let remap = weld_remap(&vertices);
        for i in 0..remap.len() {
            assert_eq!(remap[remap[i]], remap[i]);
            assert!(remap[i] <= i);
        }
    }

    #[test]
    fn test_weld_idempotence() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let remap = weld_remap(&vertices);
        // Re-welding only the canonical representatives is a no-op
        let canonical: Vec<Point3<f64>> = remap
            .iter()
            .enumerate()
            .filter(|(i, &r)| *i == r)
            .map(|(i, _)| vertices[i])
            .collect();
        let again = weld_remap(&canonical);
        assert_eq!(again, (0..canonical.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_cancelled_weld_yields_no_output() {
        let vertices = vec![Point3::origin(); 4];
        let token = CancelToken::new();
        token.cancel();
        let outcome = drive(WeldPass::new(&vertices, token), |_| {});
        assert!(matches!(outcome, Outcome::Cancelled));
    }
}
