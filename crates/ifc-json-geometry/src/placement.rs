// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement resolution
//!
//! Turns IFC placement entities into 4x4 matrices: axis placements,
//! chains of local placements and cartesian transformation operators.

use crate::{Error, Result};
use ifc_json_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};
use rustc_hash::FxHashSet;

/// Local placement chains longer than this are treated as cyclic
const MAX_PLACEMENT_DEPTH: usize = 256;

/// Coordinates of an IfcCartesianPoint (missing components are zero)
pub fn cartesian_point(point: &DecodedEntity) -> Result<Point3<f64>> {
    if point.ifc_type != IfcType::IfcCartesianPoint {
        return Err(Error::unsupported_type(point.ifc_type.class_name()));
    }
    let coords = point
        .get_list(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing Coordinates"))?;
    let c = |i: usize| coords.get(i).and_then(|v| v.as_float()).unwrap_or(0.0);
    Ok(Point3::new(c(0), c(1), c(2)))
}

/// Resolve a point reference
pub fn resolve_point(id: EntityId, resolver: &dyn EntityResolver) -> Result<Point3<f64>> {
    let point = resolver
        .get(id)
        .ok_or_else(|| Error::entity_not_found(id.0))?;
    cartesian_point(&point)
}

/// Resolve a 2D point reference
pub fn resolve_point_2d(id: EntityId, resolver: &dyn EntityResolver) -> Result<Point2<f64>> {
    let p = resolve_point(id, resolver)?;
    Ok(Point2::new(p.x, p.y))
}

/// Resolve an IfcDirection (missing components are zero)
pub fn resolve_direction(id: EntityId, resolver: &dyn EntityResolver) -> Option<Vector3<f64>> {
    let direction = resolver.get(id)?;
    if direction.ifc_type != IfcType::IfcDirection {
        return None;
    }
    let ratios = direction.get_list(0)?;
    let c = |i: usize| ratios.get(i).and_then(|v| v.as_float()).unwrap_or(0.0);
    let v = Vector3::new(c(0), c(1), c(2));
    (v.norm() > f64::EPSILON).then_some(v)
}

/// Right-handed basis from a main axis and an approximate x direction
fn basis(z: Vector3<f64>, x_hint: Vector3<f64>) -> Matrix3<f64> {
    let z = z.normalize();
    let mut x = x_hint - z * x_hint.dot(&z);
    if x.norm() < 1e-12 {
        // hint parallel to the axis, pick any perpendicular
        let fallback = if z.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        x = fallback - z * fallback.dot(&z);
    }
    let x = x.normalize();
    let y = z.cross(&x);
    Matrix3::from_columns(&[x, y, z])
}

fn affine(rotation: Matrix3<f64>, origin: Vector3<f64>) -> Matrix4<f64> {
    let mut m = rotation.to_homogeneous();
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin);
    m
}

/// IfcAxis2Placement3D(Location, Axis, RefDirection)
pub fn axis2_placement_3d(
    placement: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Result<Matrix4<f64>> {
    let location = placement
        .get_ref(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing Location"))?;
    let origin = resolve_point(location, resolver)?;
    let axis = placement
        .get_ref(1)
        .and_then(|id| resolve_direction(id, resolver))
        .unwrap_or_else(Vector3::z);
    let ref_dir = placement
        .get_ref(2)
        .and_then(|id| resolve_direction(id, resolver))
        .unwrap_or_else(Vector3::x);

    Ok(affine(basis(axis, ref_dir), origin.coords))
}

/// IfcAxis2Placement2D(Location, RefDirection) as a transform in the XY plane
pub fn axis2_placement_2d(
    placement: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Result<Matrix4<f64>> {
    let location = placement
        .get_ref(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing Location"))?;
    let origin = resolve_point(location, resolver)?;
    let ref_dir = placement
        .get_ref(1)
        .and_then(|id| resolve_direction(id, resolver))
        .map(|d| Vector3::new(d.x, d.y, 0.0))
        .unwrap_or_else(Vector3::x);

    Ok(affine(basis(Vector3::z(), ref_dir), Vector3::new(origin.x, origin.y, 0.0)))
}

/// IfcCartesianTransformationOperator3D(Axis1, Axis2, LocalOrigin, Scale, Axis3)
/// and its non-uniform subtype (..., Scale2, Scale3)
pub fn transformation_operator(
    op: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Result<Matrix4<f64>> {
    let origin = op
        .get_ref(2)
        .ok_or_else(|| Error::invalid_attribute(2, "Missing LocalOrigin"))?;
    let origin = resolve_point(origin, resolver)?;

    let axis1 = op.get_ref(0).and_then(|id| resolve_direction(id, resolver));
    let axis3 = op.get_ref(4).and_then(|id| resolve_direction(id, resolver));
    let rotation = basis(
        axis3.unwrap_or_else(Vector3::z),
        axis1.unwrap_or_else(Vector3::x),
    );

    let scale = op.get_float(3).unwrap_or(1.0);
    let (sx, sy, sz) = if op.ifc_type == IfcType::IfcCartesianTransformationOperator3DnonUniform {
        (
            scale,
            op.get_float(5).unwrap_or(scale),
            op.get_float(6).unwrap_or(scale),
        )
    } else {
        (scale, scale, scale)
    };
    let scaled = rotation * Matrix3::from_diagonal(&Vector3::new(sx, sy, sz));

    Ok(affine(scaled, origin.coords))
}

/// Resolve any supported placement entity to a matrix
///
/// Local placements are followed up their PlacementRelTo chain to world
/// space. Unknown placement kinds resolve to the identity.
pub fn resolve_placement(id: EntityId, resolver: &dyn EntityResolver) -> Result<Matrix4<f64>> {
    let mut chain = Vec::new();
    let mut seen = FxHashSet::default();
    let mut next = Some(id);

    while let Some(current) = next.take() {
        if !seen.insert(current) || chain.len() >= MAX_PLACEMENT_DEPTH {
            log::warn!("Placement chain through {} does not terminate", id);
            break;
        }
        let placement = resolver
            .get(current)
            .ok_or_else(|| Error::entity_not_found(current.0))?;

        let local = match placement.ifc_type {
            // IfcLocalPlacement(PlacementRelTo, RelativePlacement)
            IfcType::IfcLocalPlacement => {
                next = placement.get_ref(0);
                match placement.get_ref(1).and_then(|rel| resolver.get(rel)) {
                    Some(relative) => relative_placement(&relative, resolver)?,
                    None => Matrix4::identity(),
                }
            }
            _ => relative_placement(&placement, resolver)?,
        };
        chain.push(local);
    }

    // chain runs leaf to root
    Ok(chain
        .into_iter()
        .rev()
        .fold(Matrix4::identity(), |world, local| world * local))
}

fn relative_placement(
    placement: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Result<Matrix4<f64>> {
    match placement.ifc_type {
        IfcType::IfcAxis2Placement3D => axis2_placement_3d(placement, resolver),
        IfcType::IfcAxis2Placement2D => axis2_placement_2d(placement, resolver),
        IfcType::IfcCartesianTransformationOperator3D
        | IfcType::IfcCartesianTransformationOperator3DnonUniform => {
            transformation_operator(placement, resolver)
        }
        _ => {
            log::debug!(
                "Unsupported placement {} ({}), using identity",
                placement.id,
                placement.ifc_type.class_name()
            );
            Ok(Matrix4::identity())
        }
    }
}

/// Row-major array form of a matrix
pub fn to_rows(m: &Matrix4<f64>) -> [[f64; 4]; 4] {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_json_model::IfcParser;
    use ifc_json_parser::StepParser;

    fn model(data: &str) -> std::sync::Arc<dyn ifc_json_model::IfcModel> {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            data
        );
        StepParser::new().parse(&content).unwrap()
    }

    #[test]
    fn test_nested_local_placement() {
        let model = model(
            "#1=IFCCARTESIANPOINT((10.,0.,0.));\n\
             #2=IFCAXIS2PLACEMENT3D(#1,$,$);\n\
             #3=IFCLOCALPLACEMENT($,#2);\n\
             #4=IFCCARTESIANPOINT((0.,5.,2.));\n\
             #5=IFCDIRECTION((0.,1.,0.));\n\
             #6=IFCAXIS2PLACEMENT3D(#4,$,#5);\n\
             #7=IFCLOCALPLACEMENT(#3,#6);",
        );
        let m = resolve_placement(EntityId(7), model.resolver()).unwrap();

        // translation composes through the parent
        assert_relative_eq!(m[(0, 3)], 10.0);
        assert_relative_eq!(m[(1, 3)], 5.0);
        assert_relative_eq!(m[(2, 3)], 2.0);

        // local x axis is rotated onto world y
        let x = m.transform_vector(&Vector3::x());
        assert_relative_eq!(x, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_cyclic_placement_terminates() {
        let model = model(
            "#1=IFCCARTESIANPOINT((1.,0.,0.));\n\
             #2=IFCAXIS2PLACEMENT3D(#1,$,$);\n\
             #3=IFCLOCALPLACEMENT(#4,#2);\n\
             #4=IFCLOCALPLACEMENT(#3,#2);",
        );
        let m = resolve_placement(EntityId(3), model.resolver()).unwrap();
        assert_relative_eq!(m[(0, 3)], 2.0);
    }

    #[test]
    fn test_transformation_operator_scale() {
        let model = model(
            "#1=IFCCARTESIANPOINT((1.,2.,3.));\n\
             #2=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#1,2.,$);",
        );
        let m = resolve_placement(EntityId(2), model.resolver()).unwrap();
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(3.0, 4.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_ref_direction_falls_back() {
        let b = basis(Vector3::z(), Vector3::z());
        assert_relative_eq!(b.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_rows_is_row_major() {
        let m = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        let rows = to_rows(&m);
        assert_eq!(rows[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[2], [0.0, 0.0, 1.0, 3.0]);
        assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
