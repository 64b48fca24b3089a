// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Meshmend mesh-repair engine
//!
//! Detects and closes boundary holes in indexed triangle meshes and
//! performs watertightness analysis: vertex welding, closed/open
//! classification, and signed-volume integration. Every long pass runs
//! in bounded increments with progress snapshots and cooperative
//! cancellation, so an editor-style host can drive it without blocking.

pub mod edges;
pub mod error;
pub mod io;
pub mod loops;
pub mod mesh;
pub mod ops;
pub mod progress;
pub mod triangulate;
pub mod volume;
pub mod weld;

pub use edges::{BoundarySet, ClosurePass, Edge, IncidenceCounter};
pub use error::MeshError;
pub use loops::{build_loops, LoopSet};
pub use mesh::Mesh;
pub use ops::{
    analyze_watertight, fill_holes, AnalyzePass, FillOutcome, FillPass, WatertightReport,
};
pub use progress::{drive, CancelToken, Outcome, Pass, Report};
pub use triangulate::triangulate_loop;
pub use volume::VolumePass;
pub use weld::{weld_remap, WeldPass};
