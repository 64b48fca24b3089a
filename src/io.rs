// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Binary STL import/export for the CLI. The core consumes raw
//! vertex/index arrays only; this module is the thin bridge to files.

use crate::mesh::Mesh;
use anyhow::{Context, Result};
use nalgebra::Point3;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

/// Read a binary or ASCII STL file into an indexed mesh. STL stores a
/// triangle soup; `stl_io` indexes exact-duplicate corners, and the
/// engine's weld pass handles the rest.
pub fn import_stl(path: &Path) -> Result<Mesh> {
    let mut file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("failed to open STL file: {}", path.display()))?;
    let stl = stl_io::read_stl(&mut file)
        .with_context(|| format!("failed to parse STL file: {}", path.display()))?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for vertex in &stl.vertices {
        mesh.add_vertex(Point3::new(
            vertex[0] as f64,
            vertex[1] as f64,
            vertex[2] as f64,
        ));
    }
    for face in &stl.faces {
        mesh.add_triangle([face.vertices[0], face.vertices[1], face.vertices[2]]);
    }
    mesh.validate()
        .with_context(|| format!("malformed mesh in {}", path.display()))?;
    Ok(mesh)
}

/// Write a mesh as binary STL, computing one face normal per triangle
pub fn export_stl(path: &Path, mesh: &Mesh) -> Result<()> {
    // write_stl needs the triangle count up front for the binary header,
    // so build the full list before streaming it out
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|[i0, i1, i2]| {
            let v0 = &mesh.vertices[i0];
            let v1 = &mesh.vertices[i1];
            let v2 = &mesh.vertices[i2];
            let normal = (v1 - v0).cross(&(v2 - v0));
            let unit = if normal.norm() > 0.0 {
                normal.normalize()
            } else {
                normal
            };
            stl_io::Triangle {
                normal: stl_io::Normal::new([unit.x as f32, unit.y as f32, unit.z as f32]),
                vertices: [
                    stl_io::Vertex::new([v0.x as f32, v0.y as f32, v0.z as f32]),
                    stl_io::Vertex::new([v1.x as f32, v1.y as f32, v1.z as f32]),
                    stl_io::Vertex::new([v2.x as f32, v2.y as f32, v2.z as f32]),
                ],
            }
        })
        .collect();

    let file = File::create(path)
        .with_context(|| format!("failed to create STL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())
        .with_context(|| format!("failed to write STL file: {}", path.display()))?;
    Ok(())
}
