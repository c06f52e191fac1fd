// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-JSON Geometry Kernel
//!
//! Turns the body representations of IFC products into half-edge meshes.
//! The kernel works against the `EntityResolver` trait from
//! `ifc-json-model`, so it is independent of the parser implementation.
//!
//! ## Overview
//!
//! - **Placements**: local placement chains, axis placements and
//!   cartesian transformation operators resolved to 4x4 matrices
//! - **Profiles**: parameterized and arbitrary 2D profiles with holes
//! - **Processors**: extrusions, faceted B-reps, face sets, mapped items
//! - **Meshes**: polygon faces in half-edge form, no triangulation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_json_geometry::ShapeKernel;
//!
//! let kernel = ShapeKernel::new().with_circle_segments(32);
//! let shapes = kernel.build_index(model.as_ref());
//! println!("{} products with geometry", shapes.len());
//! ```

pub mod error;
pub mod halfedge;
pub mod kernel;
pub mod placement;
pub mod processors;
pub mod profile;

pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use error::{Error, Result};
pub use halfedge::{bridge_holes, extrude, MeshBuilder};
pub use kernel::{ShapeKernel, MAX_ITEM_DEPTH};
pub use placement::{resolve_placement, to_rows};
pub use processors::{
    BooleanProcessor, ExtrudedAreaSolidProcessor, FaceSetProcessor, FacetedBrepProcessor,
    GeometryProcessor, MappedItemProcessor,
};
pub use profile::{extract_profile, Profile2D};
