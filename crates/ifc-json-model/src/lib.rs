// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-JSON Model - Trait definitions and shared types for IFC conversion
//!
//! This crate provides the abstractions shared by the loader, the geometry
//! kernel and the document converter. A parsed model is only ever seen
//! through these traits, so the converter does not care which backend
//! produced it.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Entry point for parsing IFC content
//! - [`IfcModel`] - Read-only access to a parsed IFC model
//! - [`EntityResolver`] - Entity lookup and reference resolution
//! - [`PropertyReader`] - Access to property sets and quantities
//! - [`SpatialQuery`] - Aggregation and containment relations
//! - [`ShapeIndex`] - Half-edge shape data produced by a geometry kernel
//!
//! # Example
//!
//! ```ignore
//! use ifc_json_model::{IfcParser, IfcModel, EntityId};
//!
//! let model = parser.parse(ifc_content)?;
//! if let Some(entity) = model.resolver().get(EntityId(123)) {
//!     println!("{} ({})", entity.ifc_type.label(), entity.id);
//! }
//! ```

pub mod error;
pub mod properties;
pub mod resolver;
pub mod shape;
pub mod spatial;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use properties::*;
pub use resolver::*;
pub use shape::*;
pub use spatial::*;
pub use traits::*;
pub use types::*;
