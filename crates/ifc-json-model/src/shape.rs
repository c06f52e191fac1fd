// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape data produced by a geometry kernel
//!
//! Meshes use a half-edge layout: every face points at one edge of its
//! boundary loop, every edge points at its origin vertex and at the next
//! edge of the same loop. A face with `n_edges == k` is recovered by
//! following `next` k times from its start edge.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Row-major identity transform
pub const IDENTITY: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// One directed edge of a face loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEdge {
    /// Origin vertex index
    pub vert: usize,
    /// Next edge index in the same loop
    pub next: usize,
}

/// A face referencing its boundary loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshFace {
    /// Start edge of the loop, `None` for a degenerate face
    pub edge: Option<usize>,
    /// Number of edges in the loop
    pub n_edges: usize,
}

/// Half-edge mesh
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HalfEdgeMesh {
    pub vertices: Vec<[f64; 3]>,
    pub edges: Vec<HalfEdge>,
    pub faces: Vec<MeshFace>,
}

impl HalfEdgeMesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, position: [f64; 3]) -> usize {
        self.vertices.push(position);
        self.vertices.len() - 1
    }

    /// Append a face whose loop visits `loop_verts` in order
    ///
    /// Edges are allocated contiguously and closed into a cycle. An empty
    /// loop produces a face without a start edge.
    pub fn add_face(&mut self, loop_verts: &[usize]) -> usize {
        let first = self.edges.len();
        let n = loop_verts.len();
        for (i, &vert) in loop_verts.iter().enumerate() {
            self.edges.push(HalfEdge {
                vert,
                next: first + (i + 1) % n,
            });
        }
        self.faces.push(MeshFace {
            edge: (n > 0).then_some(first),
            n_edges: n,
        });
        self.faces.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Group of meshes belonging to one representation item
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSet {
    pub meshes: Vec<HalfEdgeMesh>,
}

/// Tessellation of one geometric representation item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometricItem {
    /// Representation item that produced the meshes
    pub item_id: EntityId,
    pub meshsets: Vec<MeshSet>,
}

impl GeometricItem {
    /// Item with a single mesh set holding `meshes`
    pub fn from_meshes(item_id: EntityId, meshes: Vec<HalfEdgeMesh>) -> Self {
        Self {
            item_id,
            meshsets: vec![MeshSet { meshes }],
        }
    }

    /// Total number of faces across all mesh sets
    pub fn face_count(&self) -> usize {
        self.meshsets
            .iter()
            .flat_map(|set| &set.meshes)
            .map(HalfEdgeMesh::face_count)
            .sum()
    }
}

/// Shape of one product: placement transform plus tessellated items
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductShape {
    pub product_id: EntityId,
    /// Row-major 4x4 transform from item space to world space
    pub transform: [[f64; 4]; 4],
    pub items: Vec<GeometricItem>,
}

impl ProductShape {
    /// Shape with identity placement and no items
    pub fn new(product_id: EntityId) -> Self {
        Self {
            product_id,
            transform: IDENTITY,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|item| item.face_count() == 0)
    }
}

/// Lookup table from product to shape data
///
/// Keys are the decimal form of the product ID (`"42"` for `#42`); callers
/// with a raw string key look it up verbatim.
#[derive(Clone, Debug, Default)]
pub struct ShapeIndex {
    shapes: HashMap<String, Arc<ProductShape>>,
}

impl ShapeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index key for an entity ID
    pub fn key(id: EntityId) -> String {
        id.0.to_string()
    }

    /// Insert a shape under its product's key, replacing any previous one
    pub fn insert(&mut self, shape: ProductShape) {
        self.shapes
            .insert(Self::key(shape.product_id), Arc::new(shape));
    }

    /// Shape of an entity
    pub fn get(&self, id: EntityId) -> Option<&Arc<ProductShape>> {
        self.shapes.get(&Self::key(id))
    }

    /// Shape by raw key, matched verbatim
    pub fn get_by_key(&self, key: &str) -> Option<&Arc<ProductShape>> {
        self.shapes.get(key)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl FromIterator<ProductShape> for ShapeIndex {
    fn from_iter<I: IntoIterator<Item = ProductShape>>(iter: I) -> Self {
        let mut index = ShapeIndex::new();
        for shape in iter {
            index.insert(shape);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_face_closes_loop() {
        let mut mesh = HalfEdgeMesh::new();
        let a = mesh.add_vertex([0.0, 0.0, 0.0]);
        let b = mesh.add_vertex([1.0, 0.0, 0.0]);
        let c = mesh.add_vertex([0.0, 1.0, 0.0]);
        let face = mesh.add_face(&[a, b, c]);

        let start = mesh.faces[face].edge.unwrap();
        let mut edge = start;
        let mut seen = Vec::new();
        for _ in 0..mesh.faces[face].n_edges {
            seen.push(mesh.edges[edge].vert);
            edge = mesh.edges[edge].next;
        }
        assert_eq!(seen, vec![a, b, c]);
        assert_eq!(edge, start);
    }

    #[test]
    fn test_empty_face_has_no_start_edge() {
        let mut mesh = HalfEdgeMesh::new();
        let face = mesh.add_face(&[]);
        assert_eq!(mesh.faces[face], MeshFace { edge: None, n_edges: 0 });
    }

    #[test]
    fn test_shape_index_keys() {
        let index: ShapeIndex = vec![ProductShape::new(EntityId(42))].into_iter().collect();
        assert_eq!(ShapeIndex::key(EntityId(42)), "42");
        assert!(index.get(EntityId(42)).is_some());
        assert!(index.get_by_key("42").is_some());
        assert!(index.get_by_key("#42").is_none());
        assert!(index.get_by_key(" 42").is_none());
    }
}
