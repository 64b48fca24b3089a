// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Indexed triangle mesh representation

use crate::error::MeshError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Indexed triangle mesh: vertex positions plus a flat triangle-index
/// array (three consecutive entries per triangle).
///
/// The engine only ever borrows a `Mesh`; repair passes return a new
/// mesh and leave the input untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub indices: Vec<usize>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(triangle_count * 3),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.vertices.len();
        self.vertices.push(position);
        index
    }

    /// Append a triangle
    pub fn add_triangle(&mut self, triangle: [usize; 3]) {
        self.indices.extend_from_slice(&triangle);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as index triplets
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Fail-fast input validation, run once before any incremental pass:
    /// the index array length must be a multiple of 3 and every index
    /// must address an existing vertex.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::RaggedIndexArray(self.indices.len()));
        }
        let vertex_count = self.vertices.len();
        for &index in &self.indices {
            if index >= vertex_count {
                return Err(MeshError::IndexOutOfBounds {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Total surface area in square units
    pub fn surface_area(&self) -> f64 {
        let mut area = 0.0;
        for [i0, i1, i2] in self.triangles() {
            let v0 = &self.vertices[i0];
            let v1 = &self.vertices[i1];
            let v2 = &self.vertices[i2];
            area += (v1 - v0).cross(&(v2 - v0)).norm() / 2.0;
        }
        area
    }

    /// Bounding box as [min_x, min_y, min_z, max_x, max_y, max_z],
    /// or `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<[f64; 6]> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut bbox = [
            f64::MAX,
            f64::MAX,
            f64::MAX,
            f64::MIN,
            f64::MIN,
            f64::MIN,
        ];
        for v in &self.vertices {
            for axis in 0..3 {
                bbox[axis] = bbox[axis].min(v[axis]);
                bbox[axis + 3] = bbox[axis + 3].max(v[axis]);
            }
        }
        Some(bbox)
    }

    /// Average vertex position, or `None` for an empty mesh
    pub fn centroid(&self) -> Option<[f64; 3]> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut sum = [0.0; 3];
        for v in &self.vertices {
            sum[0] += v.x;
            sum[1] += v.y;
            sum[2] += v.z;
        }
        let count = self.vertices.len() as f64;
        Some([sum[0] / count, sum[1] / count, sum[2] / count])
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn right_triangle() -> Mesh {
        Mesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(right_triangle().validate().is_ok());
        assert!(Mesh::new().validate().is_ok());
    }

    #[test]
    fn test_validate_ragged_indices() {
        let mut mesh = right_triangle();
        mesh.indices.push(0);
        assert_eq!(mesh.validate(), Err(MeshError::RaggedIndexArray(4)));
    }

    #[test]
    fn test_validate_index_out_of_bounds() {
        let mut mesh = right_triangle();
        mesh.indices = vec![0, 1, 7];
        assert_eq!(
            mesh.validate(),
            Err(MeshError::IndexOutOfBounds {
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_surface_area() {
        assert_relative_eq!(right_triangle().surface_area(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bounding_box_and_centroid() {
        let mesh = right_triangle();
        let bbox = mesh.bounding_box().unwrap();
        assert_eq!(bbox, [0.0, 0.0, 0.0, 2.0, 2.0, 0.0]);
        let centroid = mesh.centroid().unwrap();
        assert_relative_eq!(centroid[0], 2.0 / 3.0, epsilon = 1e-12);
        assert!(Mesh::new().bounding_box().is_none());
    }
}
