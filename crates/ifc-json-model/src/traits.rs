// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for IFC loading
//!
//! These traits define the main abstractions for working with IFC data.

use crate::{EntityResolver, ModelMetadata, PropertyReader, Result, SpatialQuery};
use std::path::Path;
use std::sync::Arc;

/// Main parsing interface - entry point for loading IFC content
pub trait IfcParser: Send + Sync {
    /// Parse IFC content and return a model
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;

    /// Read and parse an IFC file
    fn parse_file(&self, path: &Path) -> Result<Arc<dyn IfcModel>> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content)
    }
}

/// Core model interface - read-only access to a parsed IFC model
///
/// The model is thread-safe (`Send + Sync`) so geometry can be processed
/// in parallel over the same model.
pub trait IfcModel: Send + Sync {
    /// Entity resolver for lookups and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Property reader for property sets and quantities
    fn properties(&self) -> &dyn PropertyReader;

    /// Aggregation and containment relations
    fn spatial(&self) -> &dyn SpatialQuery;

    /// Unit scale factor (file length units to meters)
    fn unit_scale(&self) -> f64;

    /// File metadata (schema version, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;
}
