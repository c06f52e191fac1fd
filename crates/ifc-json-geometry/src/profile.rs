// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D profile definitions and curve sampling

use crate::placement::{axis2_placement_2d, resolve_point_2d};
use crate::{Error, Result};
use ifc_json_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use nalgebra::{Matrix4, Point2, Point3};
use std::f64::consts::PI;

/// Composite curves nesting deeper than this are rejected
const MAX_CURVE_DEPTH: usize = 16;

/// 2D profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a profile, normalizing the outer loop to counter-clockwise
    pub fn new(mut outer: Vec<Point2<f64>>) -> Self {
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Add a hole, normalizing it to clockwise
    pub fn add_hole(&mut self, mut hole: Vec<Point2<f64>>) {
        if signed_area(&hole) > 0.0 {
            hole.reverse();
        }
        self.holes.push(hole);
    }

    /// Rectangle centered at the origin
    pub fn rectangle(width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self::new(vec![
            Point2::new(-hw, -hh),
            Point2::new(hw, -hh),
            Point2::new(hw, hh),
            Point2::new(-hw, hh),
        ])
    }

    /// Circle centered at the origin
    pub fn circle(radius: f64, segments: usize) -> Self {
        Self::new(circle_points(radius, segments))
    }

    /// Apply a 2D position transform to every loop
    pub fn transform(&mut self, m: &Matrix4<f64>) {
        let apply = |p: &mut Point2<f64>| {
            let q = m.transform_point(&Point3::new(p.x, p.y, 0.0));
            *p = Point2::new(q.x, q.y);
        };
        self.outer.iter_mut().for_each(apply);
        self.holes.iter_mut().flatten().for_each(apply);
    }
}

/// Shoelace area, positive for counter-clockwise loops
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

fn circle_points(radius: f64, segments: usize) -> Vec<Point2<f64>> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (segments as f64);
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Drop the closing point of a loop that repeats its start
fn open_loop(mut points: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    if points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (first - last).norm() < 1e-10 {
            points.pop();
        }
    }
    points
}

fn required(entity: &DecodedEntity, index: usize, name: &str) -> Result<f64> {
    entity
        .get_float(index)
        .ok_or_else(|| Error::invalid_attribute(index, format!("Missing {}", name)))
}

/// Build a profile from an IfcProfileDef entity
pub fn extract_profile(
    entity: &DecodedEntity,
    resolver: &dyn EntityResolver,
    segments: usize,
) -> Result<Profile2D> {
    let mut profile = match entity.ifc_type {
        // IfcRectangleProfileDef(ProfileType, ProfileName, Position, XDim, YDim)
        IfcType::IfcRectangleProfileDef => {
            Profile2D::rectangle(required(entity, 3, "XDim")?, required(entity, 4, "YDim")?)
        }
        // ... XDim, YDim, WallThickness, InnerFilletRadius, OuterFilletRadius
        IfcType::IfcRectangleHollowProfileDef => {
            let (x, y) = (required(entity, 3, "XDim")?, required(entity, 4, "YDim")?);
            let wall = required(entity, 5, "WallThickness")?;
            if 2.0 * wall >= x.min(y) {
                return Err(Error::profile("Wall thickness closes the hollow rectangle"));
            }
            let mut profile = Profile2D::rectangle(x, y);
            profile.add_hole(Profile2D::rectangle(x - 2.0 * wall, y - 2.0 * wall).outer);
            profile
        }
        // IfcCircleProfileDef(ProfileType, ProfileName, Position, Radius)
        IfcType::IfcCircleProfileDef => Profile2D::circle(required(entity, 3, "Radius")?, segments),
        // ... Radius, WallThickness
        IfcType::IfcCircleHollowProfileDef => {
            let radius = required(entity, 3, "Radius")?;
            let inner = radius - required(entity, 4, "WallThickness")?;
            if inner <= 0.0 {
                return Err(Error::profile("Invalid hollow circle: inner radius <= 0"));
            }
            let mut profile = Profile2D::circle(radius, segments);
            profile.add_hole(circle_points(inner, segments));
            profile
        }
        // IfcArbitraryClosedProfileDef(ProfileType, ProfileName, OuterCurve)
        IfcType::IfcArbitraryClosedProfileDef | IfcType::IfcArbitraryProfileDefWithVoids => {
            let outer_id = entity
                .get_ref(2)
                .ok_or_else(|| Error::invalid_attribute(2, "Missing OuterCurve"))?;
            let outer = curve_points(outer_id, resolver, segments)?;
            if outer.len() < 3 {
                return Err(Error::profile("Profile must have at least 3 points"));
            }
            let mut profile = Profile2D::new(outer);
            // InnerCurves at index 3
            for hole_id in entity.get_refs(3) {
                match curve_points(hole_id, resolver, segments) {
                    Ok(hole) if hole.len() >= 3 => profile.add_hole(hole),
                    Ok(_) => {}
                    Err(e) => log::debug!("Skipping inner curve {}: {}", hole_id, e),
                }
            }
            return Ok(profile);
        }
        // IfcIShapeProfileDef(..., OverallWidth, OverallDepth, WebThickness, FlangeThickness)
        IfcType::IfcIShapeProfileDef => {
            let hw = required(entity, 3, "OverallWidth")? / 2.0;
            let hd = required(entity, 4, "OverallDepth")? / 2.0;
            let hwt = required(entity, 5, "WebThickness")? / 2.0;
            let ft = required(entity, 6, "FlangeThickness")?;
            Profile2D::new(vec![
                Point2::new(-hw, -hd),
                Point2::new(hw, -hd),
                Point2::new(hw, -hd + ft),
                Point2::new(hwt, -hd + ft),
                Point2::new(hwt, hd - ft),
                Point2::new(hw, hd - ft),
                Point2::new(hw, hd),
                Point2::new(-hw, hd),
                Point2::new(-hw, hd - ft),
                Point2::new(-hwt, hd - ft),
                Point2::new(-hwt, -hd + ft),
                Point2::new(-hw, -hd + ft),
            ])
        }
        // IfcLShapeProfileDef(..., Depth, Width, Thickness)
        IfcType::IfcLShapeProfileDef => {
            let depth = required(entity, 3, "Depth")?;
            let width = entity.get_float(4).unwrap_or(depth);
            let t = required(entity, 5, "Thickness")?;
            Profile2D::new(vec![
                Point2::new(0.0, 0.0),
                Point2::new(width, 0.0),
                Point2::new(width, t),
                Point2::new(t, t),
                Point2::new(t, depth),
                Point2::new(0.0, depth),
            ])
        }
        _ => return Err(Error::unsupported_type(entity.ifc_type.class_name())),
    };

    // Parameterized profiles carry their Position at index 2
    if let Some(position) = entity.get_ref(2).and_then(|id| resolver.get(id)) {
        profile.transform(&axis2_placement_2d(&position, resolver)?);
    }
    Ok(profile)
}

/// Sample a bounded 2D curve into an open point loop
pub fn curve_points(
    curve_id: EntityId,
    resolver: &dyn EntityResolver,
    segments: usize,
) -> Result<Vec<Point2<f64>>> {
    curve_points_at(curve_id, resolver, segments, 0).map(open_loop)
}

fn curve_points_at(
    curve_id: EntityId,
    resolver: &dyn EntityResolver,
    segments: usize,
    depth: usize,
) -> Result<Vec<Point2<f64>>> {
    if depth > MAX_CURVE_DEPTH {
        return Err(Error::TooDeep(MAX_CURVE_DEPTH));
    }
    let curve = resolver
        .get(curve_id)
        .ok_or_else(|| Error::entity_not_found(curve_id.0))?;

    match curve.ifc_type {
        // IfcPolyline(Points)
        IfcType::IfcPolyline => curve
            .get_refs(0)
            .into_iter()
            .map(|id| resolve_point_2d(id, resolver))
            .collect(),
        // IfcIndexedPolyCurve(Points, Segments, SelfIntersect)
        IfcType::IfcIndexedPolyCurve => {
            let list_id = curve
                .get_ref(0)
                .ok_or_else(|| Error::invalid_attribute(0, "Missing Points"))?;
            let list = resolver
                .get(list_id)
                .ok_or_else(|| Error::entity_not_found(list_id.0))?;
            // IfcCartesianPointList2D(CoordList)
            let coords = list
                .get_list(0)
                .ok_or_else(|| Error::invalid_attribute(0, "Missing CoordList"))?;
            Ok(coords
                .iter()
                .filter_map(|c| c.as_list())
                .map(|c| {
                    let v = |i: usize| c.get(i).and_then(|v| v.as_float()).unwrap_or(0.0);
                    Point2::new(v(0), v(1))
                })
                .collect())
        }
        // IfcCompositeCurve(Segments, SelfIntersect)
        IfcType::IfcCompositeCurve => {
            let mut points: Vec<Point2<f64>> = Vec::new();
            for segment in curve.get_refs(0).into_iter().filter_map(|id| resolver.get(id)) {
                // IfcCompositeCurveSegment(Transition, SameSense, ParentCurve)
                let Some(parent) = segment.get_ref(2) else {
                    continue;
                };
                let mut part = curve_points_at(parent, resolver, segments, depth + 1)?;
                if segment.get_bool(1) == Some(false) {
                    part.reverse();
                }
                if let (Some(last), Some(first)) = (points.last(), part.first()) {
                    if (last - first).norm() < 1e-10 {
                        part.remove(0);
                    }
                }
                points.extend(part);
            }
            Ok(points)
        }
        // IfcCircle(Position, Radius)
        IfcType::IfcCircle => {
            let radius = required(&curve, 1, "Radius")?;
            let mut profile = Profile2D::circle(radius, segments);
            if let Some(position) = curve.get_ref(0).and_then(|id| resolver.get(id)) {
                profile.transform(&axis2_placement_2d(&position, resolver)?);
            }
            Ok(profile.outer)
        }
        _ => Err(Error::unsupported_type(curve.ifc_type.class_name())),
    }
}
