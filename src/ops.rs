// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Composite operations: hole filling and watertightness analysis.
//!
//! Both are themselves passes, chaining the primitive passes (weld,
//! boundary/closure scan, triangulation, volume) into one resumable
//! computation with a single progress ramp. Hole filling is pure: it
//! returns a new mesh and never touches the input, so a cancelled fill
//! trivially leaves the caller's mesh intact.

use crate::edges::{BoundarySet, ClosurePass};
use crate::error::MeshError;
use crate::loops::build_loops;
use crate::mesh::Mesh;
use crate::progress::{drive, CancelToken, Outcome, Pass, Report, SCAN_STEP};
use crate::triangulate::triangulate_loop;
use crate::volume::VolumePass;
use crate::weld::WeldPass;
use serde::Serialize;

/// Result of a completed hole-filling operation
#[derive(Debug, Clone, Serialize)]
pub struct FillOutcome {
    /// Input mesh plus cap triangles; vertices are never removed and no
    /// new vertices are inserted
    pub mesh: Mesh,
    /// Boundary loops that received at least one cap triangle
    pub loops_filled: usize,
    /// Loops filled with fewer than n-2 triangles (no ear found early)
    pub loops_incomplete: usize,
    /// Boundary vertices with degree ≠ 2, left unfilled
    pub skipped_vertices: usize,
    pub triangles_added: usize,
}

/// Result of a completed watertightness analysis
#[derive(Debug, Clone, Serialize)]
pub struct WatertightReport {
    pub is_closed: bool,
    /// Enclosed volume in cubic units; only computed (and only
    /// trustworthy) when the mesh is closed
    pub volume: Option<f64>,
}

const BOUNDARY_PHASE: &str = "scanning boundary";
const LOOPS_PHASE: &str = "building boundary loops";
const ASSEMBLE_PHASE: &str = "assembling mesh";
const DONE_PHASE: &str = "done";
const CANCELLED_PHASE: &str = "cancelled";

enum FillStage<'a> {
    Weld(WeldPass<'a>),
    Boundary {
        weld: Vec<usize>,
        boundary: BoundarySet,
        cursor: usize,
    },
    Triangulate {
        loops: Vec<Vec<usize>>,
        next: usize,
        new_triangles: Vec<[usize; 3]>,
        filled: usize,
        incomplete: usize,
        skipped: usize,
    },
    Assemble {
        new_triangles: Vec<[usize; 3]>,
        loops_filled: usize,
        incomplete: usize,
        skipped: usize,
    },
    Finished(FillOutcome),
    Halted,
}

/// Incremental hole filler: weld → boundary scan → loop build →
/// per-loop ear clipping → assemble a new mesh.
///
/// Progress ramps 0→0.25 through welding, 0.25→0.45 through the
/// boundary scan, 0.5→0.9 through triangulation (one loop per
/// increment), with assembly reported at 0.95.
pub struct FillPass<'a> {
    mesh: &'a Mesh,
    token: CancelToken,
    stage: FillStage<'a>,
    last: Option<Report>,
}

impl<'a> FillPass<'a> {
    /// Fails fast on malformed input before any increment runs
    pub fn new(mesh: &'a Mesh, token: CancelToken) -> Result<Self, MeshError> {
        mesh.validate()?;
        Ok(Self {
            mesh,
            stage: FillStage::Weld(WeldPass::new(&mesh.vertices, token.clone())),
            token,
            last: None,
        })
    }

    fn advance(&mut self, stage: FillStage<'a>) -> (FillStage<'a>, Report) {
        match stage {
            FillStage::Weld(mut pass) => {
                let report = pass.step();
                if report.cancelled {
                    return (FillStage::Halted, report.rescaled(0.0, 0.25));
                }
                if !report.finished {
                    return (FillStage::Weld(pass), report.rescaled(0.0, 0.25));
                }
                match pass.into_output() {
                    Some(weld) => (
                        FillStage::Boundary {
                            weld,
                            boundary: BoundarySet::new(),
                            cursor: 0,
                        },
                        Report::running(0.25, BOUNDARY_PHASE),
                    ),
                    None => (FillStage::Halted, Report::cancelled(0.25, CANCELLED_PHASE)),
                }
            }

            FillStage::Boundary {
                weld,
                mut boundary,
                cursor,
            } => {
                let total = self.mesh.triangle_count();
                if self.token.is_cancelled() {
                    let fraction = if total == 0 {
                        1.0
                    } else {
                        cursor as f64 / total as f64
                    };
                    return (
                        FillStage::Halted,
                        Report::cancelled(0.25 + 0.2 * fraction, BOUNDARY_PHASE),
                    );
                }
                let end = (cursor + SCAN_STEP).min(total);
                for t in cursor..end {
                    let i0 = weld[self.mesh.indices[t * 3]];
                    let i1 = weld[self.mesh.indices[t * 3 + 1]];
                    let i2 = weld[self.mesh.indices[t * 3 + 2]];
                    if i0 == i1 || i1 == i2 || i2 == i0 {
                        continue; // collapsed by welding, contributes no real edges
                    }
                    boundary.toggle(i0, i1);
                    boundary.toggle(i1, i2);
                    boundary.toggle(i2, i0);
                }
                if end < total {
                    let fraction = end as f64 / total as f64;
                    return (
                        FillStage::Boundary {
                            weld,
                            boundary,
                            cursor: end,
                        },
                        Report::running(0.25 + 0.2 * fraction, BOUNDARY_PHASE),
                    );
                }
                let loop_set = build_loops(&boundary);
                (
                    FillStage::Triangulate {
                        loops: loop_set.loops,
                        next: 0,
                        new_triangles: Vec::new(),
                        filled: 0,
                        incomplete: 0,
                        skipped: loop_set.skipped_vertices,
                    },
                    Report::running(0.5, LOOPS_PHASE),
                )
            }

            FillStage::Triangulate {
                loops,
                next,
                mut new_triangles,
                mut filled,
                mut incomplete,
                skipped,
            } => {
                if self.token.is_cancelled() {
                    let fraction = if loops.is_empty() {
                        1.0
                    } else {
                        next as f64 / loops.len() as f64
                    };
                    return (
                        FillStage::Halted,
                        Report::cancelled(0.5 + 0.4 * fraction, CANCELLED_PHASE),
                    );
                }
                if next >= loops.len() {
                    return (
                        FillStage::Assemble {
                            new_triangles,
                            loops_filled: filled,
                            incomplete,
                            skipped,
                        },
                        Report::running(0.95, ASSEMBLE_PHASE),
                    );
                }
                let cycle = &loops[next];
                let triangles = triangulate_loop(&self.mesh.vertices, cycle);
                // a loop that received no triangles at all is not "filled"
                if !triangles.is_empty() {
                    filled += 1;
                }
                if triangles.len() < cycle.len() - 2 {
                    incomplete += 1;
                }
                new_triangles.extend_from_slice(&triangles);
                let phase = format!("filling hole {}/{}", next + 1, loops.len());
                let fraction = (next + 1) as f64 / loops.len() as f64;
                (
                    FillStage::Triangulate {
                        loops,
                        next: next + 1,
                        new_triangles,
                        filled,
                        incomplete,
                        skipped,
                    },
                    Report::running(0.5 + 0.4 * fraction, phase),
                )
            }

            FillStage::Assemble {
                new_triangles,
                loops_filled,
                incomplete,
                skipped,
            } => {
                if self.token.is_cancelled() {
                    return (FillStage::Halted, Report::cancelled(0.95, ASSEMBLE_PHASE));
                }
                let mut mesh = self.mesh.clone();
                for triangle in &new_triangles {
                    mesh.add_triangle(*triangle);
                }
                let outcome = FillOutcome {
                    mesh,
                    loops_filled,
                    loops_incomplete: incomplete,
                    skipped_vertices: skipped,
                    triangles_added: new_triangles.len(),
                };
                (FillStage::Finished(outcome), Report::finished(DONE_PHASE))
            }

            FillStage::Finished(outcome) => {
                (FillStage::Finished(outcome), Report::finished(DONE_PHASE))
            }
            FillStage::Halted => (FillStage::Halted, Report::cancelled(0.0, CANCELLED_PHASE)),
        }
    }
}

impl Pass for FillPass<'_> {
    type Output = FillOutcome;

    fn step(&mut self) -> Report {
        if let Some(last) = &self.last {
            if last.is_terminal() {
                return last.clone();
            }
        }
        let stage = std::mem::replace(&mut self.stage, FillStage::Halted);
        let (stage, report) = self.advance(stage);
        self.stage = stage;
        self.last = Some(report.clone());
        report
    }

    fn into_output(self) -> Option<FillOutcome> {
        match self.stage {
            FillStage::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}

enum AnalyzeStage<'a> {
    Weld(WeldPass<'a>),
    Closure { pass: ClosurePass<'a>, weld: Vec<usize> },
    Volume(VolumePass<'a>),
    Finished(WatertightReport),
    Halted,
}

/// Incremental watertightness analysis: weld → edge-incidence parity →
/// signed-volume integration (closed meshes only).
///
/// Progress ramps 0→0.4 through welding, 0.4→0.8 through the parity
/// scan, 0.8→1.0 through volume integration.
pub struct AnalyzePass<'a> {
    mesh: &'a Mesh,
    token: CancelToken,
    stage: AnalyzeStage<'a>,
    last: Option<Report>,
}

impl<'a> AnalyzePass<'a> {
    /// Fails fast on malformed input before any increment runs
    pub fn new(mesh: &'a Mesh, token: CancelToken) -> Result<Self, MeshError> {
        mesh.validate()?;
        Ok(Self {
            mesh,
            stage: AnalyzeStage::Weld(WeldPass::new(&mesh.vertices, token.clone())),
            token,
            last: None,
        })
    }

    fn advance(&mut self, stage: AnalyzeStage<'a>) -> (AnalyzeStage<'a>, Report) {
        match stage {
            AnalyzeStage::Weld(mut pass) => {
                let report = pass.step();
                if report.cancelled {
                    return (AnalyzeStage::Halted, report.rescaled(0.0, 0.4));
                }
                if !report.finished {
                    return (AnalyzeStage::Weld(pass), report.rescaled(0.0, 0.4));
                }
                match pass.into_output() {
                    Some(weld) => {
                        let closure =
                            ClosurePass::with_weld(self.mesh, weld.clone(), self.token.clone());
                        (
                            AnalyzeStage::Closure {
                                pass: closure,
                                weld,
                            },
                            Report::running(0.4, "checking edge parity"),
                        )
                    }
                    None => (AnalyzeStage::Halted, Report::cancelled(0.4, CANCELLED_PHASE)),
                }
            }

            AnalyzeStage::Closure { mut pass, weld } => {
                let report = pass.step();
                if report.cancelled {
                    return (AnalyzeStage::Halted, report.rescaled(0.4, 0.8));
                }
                if !report.finished {
                    return (AnalyzeStage::Closure { pass, weld }, report.rescaled(0.4, 0.8));
                }
                match pass.into_output() {
                    Some(true) => (
                        AnalyzeStage::Volume(VolumePass::with_weld(
                            self.mesh,
                            weld,
                            self.token.clone(),
                        )),
                        Report::running(0.8, "integrating volume"),
                    ),
                    Some(false) => (
                        AnalyzeStage::Finished(WatertightReport {
                            is_closed: false,
                            volume: None,
                        }),
                        Report::finished(DONE_PHASE),
                    ),
                    None => (AnalyzeStage::Halted, Report::cancelled(0.8, CANCELLED_PHASE)),
                }
            }

            AnalyzeStage::Volume(mut pass) => {
                let report = pass.step();
                if report.cancelled {
                    return (AnalyzeStage::Halted, report.rescaled(0.8, 1.0));
                }
                if !report.finished {
                    return (AnalyzeStage::Volume(pass), report.rescaled(0.8, 1.0));
                }
                match pass.into_output() {
                    Some(volume) => (
                        AnalyzeStage::Finished(WatertightReport {
                            is_closed: true,
                            volume: Some(volume),
                        }),
                        Report::finished(DONE_PHASE),
                    ),
                    None => (AnalyzeStage::Halted, Report::cancelled(1.0, CANCELLED_PHASE)),
                }
            }

            AnalyzeStage::Finished(result) => {
                (AnalyzeStage::Finished(result), Report::finished(DONE_PHASE))
            }
            AnalyzeStage::Halted => {
                (AnalyzeStage::Halted, Report::cancelled(0.0, CANCELLED_PHASE))
            }
        }
    }
}

impl Pass for AnalyzePass<'_> {
    type Output = WatertightReport;

    fn step(&mut self) -> Report {
        if let Some(last) = &self.last {
            if last.is_terminal() {
                return last.clone();
            }
        }
        let stage = std::mem::replace(&mut self.stage, AnalyzeStage::Halted);
        let (stage, report) = self.advance(stage);
        self.stage = stage;
        self.last = Some(report.clone());
        report
    }

    fn into_output(self) -> Option<WatertightReport> {
        match self.stage {
            AnalyzeStage::Finished(result) => Some(result),
            _ => None,
        }
    }
}

/// Fill all boundary holes, returning a new mesh. The input is never
/// mutated; a cancelled fill produces `Outcome::Cancelled` and nothing
/// else.
pub fn fill_holes(mesh: &Mesh, token: &CancelToken) -> Result<Outcome<FillOutcome>, MeshError> {
    let pass = FillPass::new(mesh, token.clone())?;
    Ok(drive(pass, |_| {}))
}

/// Weld, check closure, and integrate volume in one operation
pub fn analyze_watertight(
    mesh: &Mesh,
    token: &CancelToken,
) -> Result<Outcome<WatertightReport>, MeshError> {
    let pass = AnalyzePass::new(mesh, token.clone())?;
    Ok(drive(pass, |_| {}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    /// Unit cube centered at the origin, 12 consistently-wound triangles
    fn unit_cube() -> Mesh {
        Mesh {
            vertices: vec![
                Point3::new(-0.5, -0.5, -0.5),
                Point3::new(0.5, -0.5, -0.5),
                Point3::new(0.5, 0.5, -0.5),
                Point3::new(-0.5, 0.5, -0.5),
                Point3::new(-0.5, -0.5, 0.5),
                Point3::new(0.5, -0.5, 0.5),
                Point3::new(0.5, 0.5, 0.5),
                Point3::new(-0.5, 0.5, 0.5),
            ],
            indices: vec![
                0, 2, 1, 0, 3, 2, // bottom
                4, 5, 6, 4, 6, 7, // top
                0, 1, 5, 0, 5, 4, // front
                2, 3, 7, 2, 7, 6, // back
                0, 4, 7, 0, 7, 3, // left
                1, 2, 6, 1, 6, 5, // right
            ],
        }
    }

    fn done<T>(outcome: Outcome<T>) -> T {
        match outcome {
            Outcome::Done(value) => value,
            Outcome::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[test]
    fn test_analyze_closed_cube() {
        let report = done(analyze_watertight(&unit_cube(), &CancelToken::new()).unwrap());
        assert!(report.is_closed);
        assert_relative_eq!(report.volume.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_analyze_open_cube() {
        let mut mesh = unit_cube();
        mesh.indices.truncate(33); // drop one triangle
        let report = done(analyze_watertight(&mesh, &CancelToken::new()).unwrap());
        assert!(!report.is_closed);
        assert_eq!(report.volume, None);
    }

    #[test]
    fn test_fill_restores_closure_and_volume() {
        let mut open = unit_cube();
        open.indices.truncate(33);

        let outcome = done(fill_holes(&open, &CancelToken::new()).unwrap());
        assert_eq!(outcome.loops_filled, 1);
        assert_eq!(outcome.loops_incomplete, 0);
        assert_eq!(outcome.triangles_added, 1);
        assert_eq!(outcome.mesh.triangle_count(), 12);

        let report = done(analyze_watertight(&outcome.mesh, &CancelToken::new()).unwrap());
        assert!(report.is_closed);
        assert_relative_eq!(report.volume.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fill_on_closed_mesh_adds_nothing() {
        let mesh = unit_cube();
        let outcome = done(fill_holes(&mesh, &CancelToken::new()).unwrap());
        assert_eq!(outcome.loops_filled, 0);
        assert_eq!(outcome.triangles_added, 0);
        assert_eq!(outcome.mesh, mesh);
    }

    #[test]
    fn test_fill_welds_duplicate_seams() {
        // Same open cube, but the hole's rim duplicates its vertices so
        // boundary edges only pair up after welding
        let mut mesh = unit_cube();
        mesh.indices.truncate(33);
        let dup = mesh.vertices[1];
        let extra = mesh.add_vertex(dup);
        // Retarget one triangle corner at the duplicate
        for index in mesh.indices.iter_mut() {
            if *index == 1 {
                *index = extra;
                break;
            }
        }

        let outcome = done(fill_holes(&mesh, &CancelToken::new()).unwrap());
        let report = done(analyze_watertight(&outcome.mesh, &CancelToken::new()).unwrap());
        assert!(report.is_closed);
    }

    #[test]
    fn test_degenerate_loop_is_not_counted_as_filled() {
        // Two zero-area triangles along a line: the boundary is a
        // four-vertex collinear loop where no ear exists, so the fill
        // emits nothing for it
        let mesh = Mesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 1, 3, 2],
        };

        let outcome = done(fill_holes(&mesh, &CancelToken::new()).unwrap());
        assert_eq!(outcome.loops_filled, 0);
        assert_eq!(outcome.loops_incomplete, 1);
        assert_eq!(outcome.triangles_added, 0);
        assert_eq!(outcome.mesh, mesh);
    }

    #[test]
    fn test_cancelled_fill_leaves_input_untouched() {
        let mut open = unit_cube();
        open.indices.truncate(33);
        let before = open.clone();

        let token = CancelToken::new();
        let pass = FillPass::new(&open, token.clone()).unwrap();
        let mut steps = 0;
        let outcome = drive(pass, |_| {
            steps += 1;
            if steps == 2 {
                token.cancel();
            }
        });

        assert!(outcome.is_cancelled());
        assert_eq!(open, before);
    }

    #[test]
    fn test_invalid_input_fails_before_stepping() {
        let mesh = Mesh {
            vertices: vec![Point3::origin(); 2],
            indices: vec![0, 1, 5],
        };
        assert!(FillPass::new(&mesh, CancelToken::new()).is_err());
        assert!(AnalyzePass::new(&mesh, CancelToken::new()).is_err());
    }
}
