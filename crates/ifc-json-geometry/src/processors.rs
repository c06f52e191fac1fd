// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry processors for representation items
//!
//! Each processor turns one family of IFC representation items into
//! half-edge meshes in the item's own coordinate system.

use crate::halfedge::{extrude, transform_mesh, MeshBuilder};
use crate::kernel::ShapeKernel;
use crate::placement::{resolve_direction, resolve_placement, resolve_point};
use crate::profile::extract_profile;
use crate::{Error, Result};
use ifc_json_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, EntityResolverExt, HalfEdgeMesh,
    IfcType,
};
use nalgebra::{Point3, Vector3};

/// Processor for one or more representation item types
///
/// Nested items (mapped items, boolean operands) are delegated back to the
/// kernel with `depth + 1`.
pub trait GeometryProcessor: Send + Sync {
    /// Tessellate an item into zero or more meshes
    fn process(
        &self,
        item: &DecodedEntity,
        kernel: &ShapeKernel,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>>;

    /// Item types handled by this processor
    fn supported_types(&self) -> Vec<IfcType>;
}

fn point_list_3d(list_id: EntityId, resolver: &dyn EntityResolver) -> Result<Vec<Point3<f64>>> {
    let list = resolver
        .get(list_id)
        .ok_or_else(|| Error::entity_not_found(list_id.0))?;
    // IfcCartesianPointList3D(CoordList)
    let coords = list
        .get_list(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing CoordList"))?;
    Ok(coords
        .iter()
        .filter_map(|c| c.as_list())
        .map(|c| {
            let v = |i: usize| c.get(i).and_then(|v| v.as_float()).unwrap_or(0.0);
            Point3::new(v(0), v(1), v(2))
        })
        .collect())
}

/// Convert 1-based STEP indices to points, through an optional PnIndex map
fn indexed_loop(
    indices: &[AttributeValue],
    points: &[Point3<f64>],
    pn_index: &[usize],
) -> Result<Vec<Point3<f64>>> {
    indices
        .iter()
        .map(|value| {
            let raw = value
                .as_integer()
                .filter(|&i| i >= 1)
                .ok_or_else(|| Error::geometry("Invalid coordinate index"))? as usize;
            let index = if pn_index.is_empty() {
                raw
            } else {
                *pn_index
                    .get(raw - 1)
                    .ok_or_else(|| Error::geometry(format!("PnIndex {} out of range", raw)))?
            };
            points
                .get(index.wrapping_sub(1))
                .copied()
                .ok_or_else(|| Error::geometry(format!("Coordinate index {} out of range", index)))
        })
        .collect()
}

fn pn_index(entity: &DecodedEntity, index: usize) -> Vec<usize> {
    entity
        .get_list(index)
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_integer())
                .filter(|&i| i >= 1)
                .map(|i| i as usize)
                .collect()
        })
        .unwrap_or_default()
}

/// Faceted B-reps and surface models built from poly-loop faces
///
/// Each shell becomes one mesh. Inner face bounds are bridged into the
/// outer loop.
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    pub fn new() -> Self {
        Self
    }

    fn loop_points(
        &self,
        bound: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Result<Vec<Point3<f64>>> {
        // IfcFaceBound(Bound, Orientation)
        let poly_loop = resolver
            .follow(bound, 0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing Bound"))?;
        if poly_loop.ifc_type != IfcType::IfcPolyLoop {
            return Err(Error::unsupported_type(poly_loop.ifc_type.class_name()));
        }
        // IfcPolyLoop(Polygon)
        let mut points = poly_loop
            .get_refs(0)
            .into_iter()
            .map(|id| resolve_point(id, resolver))
            .collect::<Result<Vec<_>>>()?;
        if bound.get_bool(1) == Some(false) {
            points.reverse();
        }
        Ok(points)
    }

    fn shell_mesh(&self, shell: &DecodedEntity, resolver: &dyn EntityResolver) -> HalfEdgeMesh {
        let mut builder = MeshBuilder::new();
        // IfcConnectedFaceSet(CfsFaces)
        for face in shell.get_refs(0).into_iter().filter_map(|id| resolver.get(id)) {
            // IfcFace(Bounds)
            let bounds: Vec<_> = face
                .get_refs(0)
                .into_iter()
                .filter_map(|id| resolver.get(id))
                .collect();
            let outer_at = bounds
                .iter()
                .position(|b| b.ifc_type == IfcType::IfcFaceOuterBound)
                .unwrap_or(0);

            let mut outer = Vec::new();
            let mut holes = Vec::new();
            for (i, bound) in bounds.iter().enumerate() {
                match self.loop_points(bound, resolver) {
                    Ok(points) if i == outer_at => outer = points,
                    Ok(points) => holes.push(points),
                    Err(e) => log::debug!("Skipping bound {} of face {}: {}", bound.id, face.id, e),
                }
            }
            if !builder.face_with_holes(&outer, &holes) {
                log::debug!("Dropped degenerate face {}", face.id);
            }
        }
        builder.finish()
    }
}

impl Default for FacetedBrepProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for FacetedBrepProcessor {
    fn process(
        &self,
        item: &DecodedEntity,
        _kernel: &ShapeKernel,
        resolver: &dyn EntityResolver,
        _depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>> {
        let shells: Vec<EntityId> = match item.ifc_type {
            // IfcFacetedBrep(Outer), IfcFacetedBrepWithVoids(Outer, Voids)
            IfcType::IfcFacetedBrep | IfcType::IfcFacetedBrepWithVoids => {
                let outer = item
                    .get_ref(0)
                    .ok_or_else(|| Error::invalid_attribute(0, "Missing Outer"))?;
                std::iter::once(outer).chain(item.get_refs(1)).collect()
            }
            // IfcShellBasedSurfaceModel(SbsmBoundary), IfcFaceBasedSurfaceModel(FbsmFaces)
            _ => item.get_refs(0),
        };

        Ok(shells
            .into_iter()
            .filter_map(|id| resolver.get(id))
            .map(|shell| self.shell_mesh(&shell, resolver))
            .filter(|mesh| !mesh.is_empty())
            .collect())
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![
            IfcType::IfcFacetedBrep,
            IfcType::IfcFacetedBrepWithVoids,
            IfcType::IfcShellBasedSurfaceModel,
            IfcType::IfcFaceBasedSurfaceModel,
        ]
    }
}

/// IfcTriangulatedFaceSet and IfcPolygonalFaceSet
pub struct FaceSetProcessor;

impl FaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FaceSetProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for FaceSetProcessor {
    fn process(
        &self,
        item: &DecodedEntity,
        _kernel: &ShapeKernel,
        resolver: &dyn EntityResolver,
        _depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>> {
        let coords_id = item
            .get_ref(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing Coordinates"))?;
        let points = point_list_3d(coords_id, resolver)?;
        let mut builder = MeshBuilder::new();

        match item.ifc_type {
            // IfcTriangulatedFaceSet(Coordinates, Normals, Closed, CoordIndex, PnIndex)
            IfcType::IfcTriangulatedFaceSet => {
                let pn = pn_index(item, 4);
                let triangles = item
                    .get_list(3)
                    .ok_or_else(|| Error::invalid_attribute(3, "Missing CoordIndex"))?;
                for triangle in triangles.iter().filter_map(|t| t.as_list()) {
                    builder.face(&indexed_loop(triangle, &points, &pn)?);
                }
            }
            // IfcPolygonalFaceSet(Coordinates, Closed, Faces, PnIndex)
            _ => {
                let pn = pn_index(item, 3);
                for face in item.get_refs(2).into_iter().filter_map(|id| resolver.get(id)) {
                    // IfcIndexedPolygonalFace(CoordIndex)
                    let outer = match face.get_list(0) {
                        Some(indices) => indexed_loop(indices, &points, &pn)?,
                        None => continue,
                    };
                    // IfcIndexedPolygonalFaceWithVoids(CoordIndex, InnerCoordIndices)
                    let holes = face
                        .get_list(1)
                        .map(|inner| {
                            inner
                                .iter()
                                .filter_map(|h| h.as_list())
                                .map(|h| indexed_loop(h, &points, &pn))
                                .collect::<Result<Vec<_>>>()
                        })
                        .transpose()?
                        .unwrap_or_default();
                    builder.face_with_holes(&outer, &holes);
                }
            }
        }

        let mesh = builder.finish();
        Ok(if mesh.is_empty() { Vec::new() } else { vec![mesh] })
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTriangulatedFaceSet, IfcType::IfcPolygonalFaceSet]
    }
}

/// IfcExtrudedAreaSolid
///
/// Extrudes the swept area along its direction and places the result with
/// the solid's Position.
pub struct ExtrudedAreaSolidProcessor;

impl ExtrudedAreaSolidProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExtrudedAreaSolidProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for ExtrudedAreaSolidProcessor {
    fn process(
        &self,
        item: &DecodedEntity,
        kernel: &ShapeKernel,
        resolver: &dyn EntityResolver,
        _depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>> {
        // IfcExtrudedAreaSolid(SweptArea, Position, ExtrudedDirection, Depth)
        let area = resolver
            .follow(item, 0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing SweptArea"))?;
        let depth = item
            .get_float(3)
            .ok_or_else(|| Error::invalid_attribute(3, "Missing Depth"))?;
        let direction = item
            .get_ref(2)
            .and_then(|id| resolve_direction(id, resolver))
            .unwrap_or_else(Vector3::z);

        let profile = extract_profile(&area, resolver, kernel.circle_segments())?;
        if profile.outer.len() < 3 {
            return Err(Error::profile("Swept area has fewer than 3 points"));
        }

        let mut mesh = extrude(&profile, depth, &direction);
        if let Some(position) = item.get_ref(1) {
            transform_mesh(&mut mesh, &resolve_placement(position, resolver)?);
        }
        Ok(vec![mesh])
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

/// IfcMappedItem: instanced representation maps
pub struct MappedItemProcessor;

impl MappedItemProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MappedItemProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for MappedItemProcessor {
    fn process(
        &self,
        item: &DecodedEntity,
        kernel: &ShapeKernel,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>> {
        // IfcMappedItem(MappingSource, MappingTarget)
        let source = resolver
            .follow(item, 0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing MappingSource"))?;
        // IfcRepresentationMap(MappingOrigin, MappedRepresentation)
        let representation = resolver
            .follow(&source, 1)
            .ok_or_else(|| Error::invalid_attribute(1, "Missing MappedRepresentation"))?;

        let mut transform = match item.get_ref(1) {
            Some(target) => resolve_placement(target, resolver)?,
            None => nalgebra::Matrix4::identity(),
        };
        if let Some(origin) = source.get_ref(0) {
            transform *= resolve_placement(origin, resolver)?;
        }

        let mut meshes = Vec::new();
        // IfcShapeRepresentation(ContextOfItems, Identifier, Type, Items)
        for nested in representation.get_refs(3).into_iter().filter_map(|id| resolver.get(id)) {
            meshes.extend(kernel.process_item(&nested, resolver, depth + 1)?);
        }
        for mesh in &mut meshes {
            transform_mesh(mesh, &transform);
        }
        Ok(meshes)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcMappedItem]
    }
}

/// Boolean results reduced to their first operand
///
/// Openings and clippings are not subtracted.
pub struct BooleanProcessor;

impl BooleanProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BooleanProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryProcessor for BooleanProcessor {
    fn process(
        &self,
        item: &DecodedEntity,
        kernel: &ShapeKernel,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Vec<HalfEdgeMesh>> {
        // IfcBooleanResult(Operator, FirstOperand, SecondOperand)
        let first = resolver
            .follow(item, 1)
            .ok_or_else(|| Error::invalid_attribute(1, "Missing FirstOperand"))?;
        kernel.process_item(&first, resolver, depth + 1)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcBooleanResult, IfcType::IfcBooleanClippingResult]
    }
}
