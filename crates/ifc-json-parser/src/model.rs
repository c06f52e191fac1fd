// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - Main IFC model implementation

use crate::properties::PropertyReaderImpl;
use crate::resolver::ResolverImpl;
use crate::scanner::{parse_header, EntityScanner};
use crate::spatial::SpatialQueryImpl;
use crate::units::extract_unit_scale;

use ifc_json_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, PropertyReader, Result, SpatialQuery,
};
use std::sync::Arc;

/// Parsed IFC model implementing the `IfcModel` trait
pub struct ParsedModel {
    resolver: Arc<ResolverImpl>,
    properties: PropertyReaderImpl,
    spatial: SpatialQueryImpl,
    /// Unit scale (file units to meters)
    unit_scale: f64,
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Parse IFC content and create a model
    ///
    /// Fails when the content is not an ISO 10303-21 exchange structure or
    /// declares a non-IFC schema. A file with an empty DATA section loads
    /// as an empty model.
    pub fn parse(content: &str, extract_properties: bool) -> Result<Self> {
        let trimmed = content.trim_start_matches('\u{feff}').trim_start();
        if !trimmed.starts_with("ISO-10303-21") {
            return Err(ParseError::format("missing ISO-10303-21 signature"));
        }
        if !content.contains("DATA;") {
            return Err(ParseError::format("missing DATA section"));
        }

        let metadata = parse_header(content);
        if !metadata.schema_version.is_empty()
            && !metadata.schema_version.to_ascii_uppercase().starts_with("IFC")
        {
            return Err(ParseError::UnsupportedSchema(metadata.schema_version));
        }

        let index = EntityScanner::build_index(content);
        log::debug!("Indexed {} entities", index.len());

        let resolver = Arc::new(ResolverImpl::new(content.to_string(), index));
        let unit_scale = extract_unit_scale(resolver.as_ref());

        let properties = if extract_properties {
            PropertyReaderImpl::new(resolver.clone())
        } else {
            PropertyReaderImpl::empty(resolver.clone())
        };
        let spatial = SpatialQueryImpl::build(resolver.as_ref());

        log::info!(
            "Parsed {} model: {} entities, unit scale {}",
            if metadata.schema_version.is_empty() {
                "unknown-schema"
            } else {
                metadata.schema_version.as_str()
            },
            resolver.entity_count(),
            unit_scale
        );

        Ok(Self {
            resolver,
            properties,
            spatial,
            unit_scale,
            metadata,
        })
    }
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn properties(&self) -> &dyn PropertyReader {
        &self.properties
    }

    fn spatial(&self) -> &dyn SpatialQuery {
        &self.spatial
    }

    fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
