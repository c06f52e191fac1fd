// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-JSON Core
//!
//! Converts IFC models into tree-shaped JSON documents and renders those
//! documents through Jsonnet templates.
//!
//! ## Overview
//!
//! - [`Converter`] parses a file, builds its shapes and produces a
//!   [`ModelDocument`]: project, flat entity list, spatial hierarchy and
//!   header metadata
//! - [`GraphWalker`] traverses the spatial relations with an owned
//!   visited set, so cyclic models terminate
//! - [`TemplateRenderer`] hands a document to a [`TemplateEvaluator`] and
//!   folds every failure into an `{error, type}` value
//! - [`Session`] ties both together with a document cache
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_json_core::Session;
//! use std::collections::BTreeMap;
//!
//! let session = Session::default();
//! let document = session.load_and_convert("model.ifc");
//! let report = session.render(
//!     &ifc_json_core::default_template(),
//!     None,
//!     &BTreeMap::new(),
//! );
//! ```

pub mod cache;
pub mod converter;
pub mod document;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod options;
pub mod render;
pub mod serializer;
pub mod session;
pub mod walker;

#[cfg(test)]
mod testing;

pub use cache::{CachedDocument, DocumentCache};
pub use converter::{Converter, LoadedModel};
pub use document::{EntityNode, GeometryFragment, HierarchyNode, MeshFragment, ModelDocument};
pub use error::{ConvertError, EvaluationError, RenderError, Result, TEMPLATE_ERROR};
pub use geometry::{ExpandedVertices, GeometryExtractor, SharedVertices, VertexEmitter};
pub use hierarchy::HierarchyBuilder;
pub use options::ConverterOptions;
pub use render::{
    default_template, element_type_template, JsonnetCommand, TemplateEvaluator, TemplateRenderer,
    CONTEXT_VAR,
};
pub use serializer::EntitySerializer;
pub use session::{LoadedSource, Session, SessionStatus};
pub use walker::{GraphWalker, VisitedSet};
