// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Ear-clipping triangulation of a single boundary loop

use nalgebra::{Point3, Vector3};

/// Squared cross-product magnitude below which a candidate ear is
/// considered degenerate
pub const CONVEX_EPSILON_SQ: f64 = 1e-6;

/// Barycentric denominator guard; a degenerate point-in-triangle test
/// counts as "outside", never as NaN
const BARY_DENOM_EPSILON: f64 = 1e-12;

/// Triangulate one closed loop by ear clipping.
///
/// Returns triangles referencing existing vertex indices only; a simple
/// loop of length n yields exactly n-2 triangles. If no ear can be
/// found before three vertices remain (non-simple or self-intersecting
/// loop), the partial fan built so far is returned; callers treat a
/// short result as a filled-but-imperfect hole, not a hard error.
/// O(n²) per loop.
pub fn triangulate_loop(vertices: &[Point3<f64>], cycle: &[usize]) -> Vec<[usize; 3]> {
    if cycle.len() < 3 {
        return Vec::new();
    }

    let mut points: Vec<Point3<f64>> = cycle.iter().map(|&i| vertices[i]).collect();
    let mut index_map: Vec<usize> = cycle.to_vec();
    let normal = loop_normal(&points);
    let mut triangles = Vec::with_capacity(cycle.len() - 2);

    let mut n = points.len();
    while n > 3 {
        let mut clipped = false;
        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            if !is_convex(&points[prev], &points[i], &points[next], &normal) {
                continue;
            }

            let mut blocked = false;
            for k in 0..n {
                if k == prev || k == i || k == next {
                    continue;
                }
                if point_in_triangle(&points[k], &points[prev], &points[i], &points[next]) {
                    blocked = true;
                    break;
                }
            }
            if blocked {
                continue;
            }

            triangles.push([index_map[prev], index_map[i], index_map[next]]);
            points.remove(i);
            index_map.remove(i);
            n -= 1;
            clipped = true;
            break;
        }
        if !clipped {
            return triangles; // no ear left: emit the partial fill
        }
    }

    triangles.push([index_map[0], index_map[1], index_map[2]]);
    triangles
}

/// Loop normal by Newell's method; for a planar CCW polygon this points
/// along the polygon normal with twice-the-area magnitude
fn loop_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for i in 0..points.len() {
        let p = points[i].coords;
        let q = points[(i + 1) % points.len()].coords;
        normal += p.cross(&q);
    }
    normal
}

/// A vertex is a convex corner when the turn at it has non-negligible
/// magnitude and agrees with the loop winding
fn is_convex(
    prev: &Point3<f64>,
    vertex: &Point3<f64>,
    next: &Point3<f64>,
    normal: &Vector3<f64>,
) -> bool {
    let turn = (vertex - prev).cross(&(next - vertex));
    turn.norm_squared() > CONVEX_EPSILON_SQ && turn.dot(normal) > 0.0
}

/// Barycentric containment test, boundary inclusive
fn point_in_triangle(
    point: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> bool {
    let u = b - a;
    let v = c - a;
    let w = point - a;
    let d00 = u.dot(&u);
    let d01 = u.dot(&v);
    let d11 = v.dot(&v);
    let d20 = w.dot(&u);
    let d21 = w.dot(&v);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < BARY_DENOM_EPSILON {
        return false; // collinear triangle can contain nothing
    }
    let s = (d11 * d20 - d01 * d21) / denom;
    let t = (d00 * d21 - d01 * d20) / denom;
    s >= 0.0 && t >= 0.0 && s + t <= 1.0
}
