// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Signed-volume integration via the divergence theorem

use crate::error::MeshError;
use crate::mesh::Mesh;
use crate::progress::{CancelToken, Pass, Report, SCAN_STEP};

/// Incremental volume integrator: accumulates one signed tetrahedron
/// (triangle against the origin) per triangle in f64, then reports the
/// absolute value divided by six.
///
/// Only meaningful for a closed, consistently-wound mesh; callers check
/// closure first (see [`crate::edges::ClosurePass`]).
pub struct VolumePass<'a> {
    mesh: &'a Mesh,
    weld: Vec<usize>,
    sum: f64,
    cursor: usize,
    token: CancelToken,
    last: Option<Report>,
}

const VOLUME_PHASE: &str = "integrating volume";

impl<'a> VolumePass<'a> {
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

    pub(crate) fn with_weld(mesh: &'a Mesh, weld: Vec<usize>, token: CancelToken) -> Self {
        Self {
            mesh,
            weld,
            sum: 0.0,
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

impl Pass for VolumePass<'_> {
    type Output = f64;

    fn step(&mut self) -> Report {
        if let Some(last) = &self.last {
            if last.is_terminal() {
                return last.clone();
            }
        }
        if self.token.is_cancelled() {
            let report = Report::cancelled(self.fraction(), VOLUME_PHASE);
            self.last = Some(report.clone());
            return report;
        }

        let total = self.mesh.triangle_count();
        let end = (self.cursor + SCAN_STEP).min(total);
        for t in self.cursor..end {
            let p0 = self.mesh.vertices[self.weld[self.mesh.indices[t * 3]]].coords;
            let p1 = self.mesh.vertices[self.weld[self.mesh.indices[t * 3 + 1]]].coords;
            let p2 = self.mesh.vertices[self.weld[self.mesh.indices[t * 3 + 2]]].coords;
            self.sum += p0.dot(&p1.cross(&p2));
        }
        self.cursor = end;

        let report = if self.cursor == total {
            Report::finished(VOLUME_PHASE)
        } else {
            Report::running(self.fraction(), VOLUME_PHASE)
        };
        self.last = Some(report.clone());
        report
    }

    fn into_output(self) -> Option<f64> {
        match &self.last {
            Some(report) if report.finished => Some(self.sum.abs() / 6.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{drive, Outcome};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn unit_tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![0, 2, 1, 0, 1, 3, 1, 2, 3, 0, 3, 2],
        }
    }

    fn volume_of(mesh: &Mesh) -> f64 {
        let weld = (0..mesh.vertex_count()).collect();
        let pass = VolumePass::new(mesh, weld, CancelToken::new()).unwrap();
        match drive(pass, |_| {}) {
            Outcome::Done(volume) => volume,
            Outcome::Cancelled => panic!("volume pass cancelled"),
        }
    }

    #[test]
    fn test_tetrahedron_volume() {
        assert_relative_eq!(volume_of(&unit_tetrahedron()), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_volume_is_winding_sign_independent() {
        let mut flipped = unit_tetrahedron();
        for t in 0..flipped.triangle_count() {
            flipped.indices.swap(t * 3, t * 3 + 1);
        }
        assert_relative_eq!(volume_of(&flipped), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_mesh_volume_is_zero() {
        assert_eq!(volume_of(&Mesh::new()), 0.0);
    }
}
