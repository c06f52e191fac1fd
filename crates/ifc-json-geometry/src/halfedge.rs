// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Half-edge mesh construction
//!
//! Faces are kept as polygon loops. Holes are joined to their outer loop
//! with a keyhole bridge so every face stays a single cycle.

use crate::profile::Profile2D;
use ifc_json_model::HalfEdgeMesh;
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use rustc_hash::FxHashMap;

/// Incremental mesh builder with exact vertex welding
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: HalfEdgeMesh,
    lookup: FxHashMap<[u64; 3], usize>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of a vertex, reusing an identical earlier one
    pub fn vertex(&mut self, p: &Point3<f64>) -> usize {
        // +0.0 and -0.0 weld together
        let key = [p.x, p.y, p.z].map(|c| (c + 0.0).to_bits());
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.mesh.add_vertex([p.x, p.y, p.z]);
        self.lookup.insert(key, index);
        index
    }

    /// Add a polygon face, returning false when it degenerates
    ///
    /// Consecutive repeated vertices are collapsed; loops with fewer than
    /// three distinct corners are dropped.
    pub fn face(&mut self, points: &[Point3<f64>]) -> bool {
        let mut loop_verts: Vec<usize> = Vec::with_capacity(points.len());
        for p in points {
            let v = self.vertex(p);
            if loop_verts.last() != Some(&v) {
                loop_verts.push(v);
            }
        }
        while loop_verts.len() > 1 && loop_verts.first() == loop_verts.last() {
            loop_verts.pop();
        }
        if loop_verts.len() < 3 {
            return false;
        }
        self.mesh.add_face(&loop_verts);
        true
    }

    /// Add a face with holes, bridged into one loop
    pub fn face_with_holes(&mut self, outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> bool {
        self.face(&bridge_holes(outer, holes))
    }

    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    pub fn finish(self) -> HalfEdgeMesh {
        self.mesh
    }
}

/// Join hole loops into the outer loop through their closest vertex pairs
pub fn bridge_holes(outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> Vec<Point3<f64>> {
    let mut merged = outer.to_vec();
    for hole in holes.iter().filter(|h| !h.is_empty()) {
        if merged.is_empty() {
            break;
        }
        let mut best = (0, 0, f64::INFINITY);
        for (i, a) in merged.iter().enumerate() {
            for (j, b) in hole.iter().enumerate() {
                let d = (a - b).norm_squared();
                if d < best.2 {
                    best = (i, j, d);
                }
            }
        }
        let (i, j, _) = best;

        // outer[..=i], hole[j..], hole[..=j], outer[i..]
        let mut spliced = Vec::with_capacity(merged.len() + hole.len() + 2);
        spliced.extend_from_slice(&merged[..=i]);
        spliced.extend_from_slice(&hole[j..]);
        spliced.extend_from_slice(&hole[..=j]);
        spliced.extend_from_slice(&merged[i..]);
        merged = spliced;
    }
    merged
}

/// Extrude a profile lying in the XY plane
///
/// Produces the bottom cap (facing away from the extrusion), the top cap
/// and one quad per profile edge.
pub fn extrude(profile: &Profile2D, depth: f64, direction: &Vector3<f64>) -> HalfEdgeMesh {
    let offset = direction.normalize() * depth;

    let mut builder = MeshBuilder::new();
    let bottom_outer = lift(&profile.outer, Vector3::zeros());
    let top_outer = lift(&profile.outer, offset);
    let bottom_holes: Vec<_> = profile.holes.iter().map(|h| lift(h, Vector3::zeros())).collect();
    let top_holes: Vec<_> = profile.holes.iter().map(|h| lift(h, offset)).collect();

    let bottom_outer_rev: Vec<_> = bottom_outer.iter().rev().copied().collect();
    builder.face_with_holes(&bottom_outer_rev, &reversed(&bottom_holes));
    builder.face_with_holes(&top_outer, &top_holes);

    let sides =
        std::iter::once((&bottom_outer, &top_outer)).chain(bottom_holes.iter().zip(&top_holes));
    for (bottom, top) in sides {
        let n = bottom.len();
        for i in 0..n {
            let k = (i + 1) % n;
            builder.face(&[bottom[i], bottom[k], top[k], top[i]]);
        }
    }

    builder.finish()
}

fn lift(loop_2d: &[Point2<f64>], by: Vector3<f64>) -> Vec<Point3<f64>> {
    loop_2d
        .iter()
        .map(|p| Point3::new(p.x, p.y, 0.0) + by)
        .collect()
}

fn reversed(loops: &[Vec<Point3<f64>>]) -> Vec<Vec<Point3<f64>>> {
    loops
        .iter()
        .map(|l| l.iter().rev().copied().collect())
        .collect()
}

/// Transform every vertex of a mesh in place
pub fn transform_mesh(mesh: &mut HalfEdgeMesh, m: &Matrix4<f64>) {
    for v in &mut mesh.vertices {
        let p = m.transform_point(&Point3::new(v[0], v[1], v[2]));
        *v = [p.x, p.y, p.z];
    }
}

/// Scale every vertex of a mesh in place
pub fn scale_mesh(mesh: &mut HalfEdgeMesh, factor: f64) {
    if factor == 1.0 {
        return;
    }
    for v in &mut mesh.vertices {
        *v = v.map(|c| c * factor);
    }
}
