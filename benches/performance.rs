// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Performance benchmarks for the repair passes

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meshmend::{analyze_watertight, fill_holes, weld_remap, CancelToken, Mesh};
use nalgebra::Point3;

/// Open tube: two rings of `segments` vertices, closed side wall,
/// both ends left as boundary loops
fn open_tube(segments: usize) -> Mesh {
    let mut mesh = Mesh::with_capacity(segments * 2, segments * 2);
    for ring in 0..2 {
        for i in 0..segments {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
            mesh.add_vertex(Point3::new(angle.cos(), angle.sin(), ring as f64));
        }
    }
    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.add_triangle([i, next, segments + i]);
        mesh.add_triangle([next, segments + next, segments + i]);
    }
    mesh
}

/// Triangle soup with every vertex duplicated per face
fn soup(mesh: &Mesh) -> Mesh {
    let mut soup = Mesh::with_capacity(mesh.indices.len(), mesh.triangle_count());
    for [i0, i1, i2] in mesh.triangles() {
        let a = soup.add_vertex(mesh.vertices[i0]);
        let b = soup.add_vertex(mesh.vertices[i1]);
        let c = soup.add_vertex(mesh.vertices[i2]);
        soup.add_triangle([a, b, c]);
    }
    soup
}

fn bench_weld(c: &mut Criterion) {
    let mesh = soup(&open_tube(256));
    c.bench_function("weld_soup_1536_vertices", |b| {
        b.iter(|| weld_remap(black_box(&mesh.vertices)))
    });
}

fn bench_fill(c: &mut Criterion) {
    let mesh = open_tube(48);
    let token = CancelToken::new();
    c.bench_function("fill_two_48gon_holes", |b| {
        b.iter(|| fill_holes(black_box(&mesh), &token))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let mesh = soup(&open_tube(256));
    let token = CancelToken::new();
    c.bench_function("analyze_soup_tube", |b| {
        b.iter(|| analyze_watertight(black_box(&mesh), &token))
    });
}

criterion_group!(benches, bench_weld, bench_fill, bench_analyze);
criterion_main!(benches);
