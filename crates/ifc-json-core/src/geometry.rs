// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry extraction
//!
//! Flattens the half-edge meshes of a [`ProductShape`] into plain
//! vertex/face lists. Every geometric item becomes one output mesh; faces
//! are recovered by walking each face's edge cycle.

use crate::document::{GeometryFragment, MeshFragment};
use ifc_json_model::{GeometricItem, HalfEdgeMesh, ProductShape};
use rustc_hash::FxHashMap;

/// Strategy for writing vertex records into an output mesh
pub trait VertexEmitter {
    /// Record a vertex position and return its index in `vertices`
    fn emit(&mut self, vertices: &mut Vec<[f64; 3]>, position: [f64; 3]) -> usize;
}

/// One vertex record per face corner
#[derive(Debug, Default)]
pub struct ExpandedVertices;

impl VertexEmitter for ExpandedVertices {
    fn emit(&mut self, vertices: &mut Vec<[f64; 3]>, position: [f64; 3]) -> usize {
        vertices.push(position);
        vertices.len() - 1
    }
}

/// Identical positions share one vertex record
#[derive(Debug, Default)]
pub struct SharedVertices {
    seen: FxHashMap<[u64; 3], usize>,
}

impl VertexEmitter for SharedVertices {
    fn emit(&mut self, vertices: &mut Vec<[f64; 3]>, position: [f64; 3]) -> usize {
        *self
            .seen
            .entry(position.map(f64::to_bits))
            .or_insert_with(|| {
                vertices.push(position);
                vertices.len() - 1
            })
    }
}

/// Converts product shapes into document geometry
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometryExtractor {
    shared_vertices: bool,
}

impl GeometryExtractor {
    pub fn new(shared_vertices: bool) -> Self {
        Self { shared_vertices }
    }

    /// Geometry fragment of a shape, `None` when there is no shape
    pub fn extract(&self, shape: Option<&ProductShape>) -> Option<GeometryFragment> {
        let shape = shape?;
        let meshes = shape
            .items
            .iter()
            .map(|item| {
                if self.shared_vertices {
                    item_mesh(item, &mut SharedVertices::default())
                } else {
                    item_mesh(item, &mut ExpandedVertices)
                }
            })
            .collect();

        Some(GeometryFragment {
            transform: shape.transform,
            meshes,
        })
    }
}

/// Flatten every mesh of an item into one output mesh
pub fn item_mesh(item: &GeometricItem, emitter: &mut dyn VertexEmitter) -> MeshFragment {
    let mut out = MeshFragment::default();
    for mesh in item.meshsets.iter().flat_map(|set| &set.meshes) {
        emit_faces(mesh, emitter, &mut out);
    }
    out
}

fn emit_faces(mesh: &HalfEdgeMesh, emitter: &mut dyn VertexEmitter, out: &mut MeshFragment) {
    for face in &mesh.faces {
        let mut indices = Vec::with_capacity(face.n_edges);
        let mut cursor = face.edge;
        for _ in 0..face.n_edges {
            let Some(edge) = cursor.and_then(|e| mesh.edges.get(e)) else {
                break;
            };
            let Some(&position) = mesh.vertices.get(edge.vert) else {
                break;
            };
            indices.push(emitter.emit(&mut out.vertices, position));
            cursor = Some(edge.next);
        }
        out.faces.push(indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_json_model::{EntityId, HalfEdge, MeshFace, MeshSet, IDENTITY};

    fn quad_pair() -> HalfEdgeMesh {
        let mut mesh = HalfEdgeMesh::new();
        for p in [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
        ] {
            mesh.add_vertex(p);
        }
        mesh.add_face(&[0, 1, 2, 3]);
        mesh.add_face(&[1, 4, 2]);
        mesh
    }

    fn shape(meshes: Vec<HalfEdgeMesh>) -> ProductShape {
        let mut shape = ProductShape::new(EntityId(9));
        shape.transform[0][3] = 5.0;
        shape.items.push(GeometricItem::from_meshes(EntityId(10), meshes));
        shape
    }

    #[test]
    fn test_absent_shape() {
        assert!(GeometryExtractor::default().extract(None).is_none());
    }

    #[test]
    fn test_expanded_vertices_per_corner() {
        let shape = shape(vec![quad_pair()]);
        let fragment = GeometryExtractor::default().extract(Some(&shape)).unwrap();

        assert_eq!(fragment.transform[0][3], 5.0);
        assert_eq!(fragment.transform[1], IDENTITY[1]);
        assert_eq!(fragment.meshes.len(), 1);

        let mesh = &fragment.meshes[0];
        assert_eq!(mesh.vertices.len(), 7);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(mesh.vertices[5], [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_shared_vertices_weld_within_mesh() {
        let shape = shape(vec![quad_pair()]);
        let fragment = GeometryExtractor::new(true).extract(Some(&shape)).unwrap();
        let mesh = &fragment.meshes[0];
        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.faces[1], vec![1, 4, 2]);
    }

    #[test]
    fn test_meshes_of_one_item_merge() {
        let shape = shape(vec![quad_pair(), quad_pair()]);
        let fragment = GeometryExtractor::default().extract(Some(&shape)).unwrap();
        let mesh = &fragment.meshes[0];
        assert_eq!(mesh.faces.len(), 4);
        assert_eq!(mesh.faces[3], vec![11, 12, 13]);
    }

    #[test]
    fn test_degenerate_and_dangling_faces() {
        let mut mesh = quad_pair();
        mesh.faces.push(MeshFace { edge: None, n_edges: 3 });
        mesh.faces.push(MeshFace { edge: Some(0), n_edges: 0 });
        // loop leaves the edge table after two steps
        let first = mesh.edges.len();
        mesh.edges.push(HalfEdge { vert: 0, next: first + 1 });
        mesh.edges.push(HalfEdge { vert: 1, next: 999 });
        mesh.faces.push(MeshFace { edge: Some(first), n_edges: 4 });

        let item = GeometricItem {
            item_id: EntityId(1),
            meshsets: vec![MeshSet { meshes: vec![mesh] }],
        };
        let out = item_mesh(&item, &mut ExpandedVertices);

        assert_eq!(out.faces[2], Vec::<usize>::new());
        assert_eq!(out.faces[3], Vec::<usize>::new());
        assert_eq!(out.faces[4].len(), 2);
        for face in &out.faces {
            assert!(face.iter().all(|&i| i < out.vertices.len()));
        }
    }
}
