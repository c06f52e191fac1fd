// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-JSON Parser - STEP/IFC model loader
//!
//! Implements the traits defined in `ifc-json-model`.
//!
//! # Features
//!
//! - **Fast tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Lazy entity decoding** - entities are parsed on first access
//! - **Relation indices** for spatial structure and property sets
//!
//! # Example
//!
//! ```ignore
//! use ifc_json_parser::StepParser;
//! use ifc_json_model::{IfcParser, IfcType};
//!
//! let model = StepParser::new().parse(ifc_content)?;
//! let walls = model.resolver().entities_by_type(&IfcType::IfcWall);
//! println!("Found {} walls", walls.len());
//! ```

mod model;
mod properties;
mod resolver;
mod scanner;
mod spatial;
mod tokenizer;
mod units;

pub use model::ParsedModel;
pub use scanner::{parse_header, EntityIndex, EntityScanner};
pub use tokenizer::{decode_step_string, parse_entity, Token};
pub use units::unit_label;

use ifc_json_model::{IfcModel, IfcParser, Result};
use std::sync::Arc;

/// Main STEP/IFC parser implementing `IfcParser`
pub struct StepParser {
    /// Whether to index property set relations
    pub extract_properties: bool,
}

impl Default for StepParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StepParser {
    /// Create a new parser with default settings
    pub fn new() -> Self {
        Self {
            extract_properties: true,
        }
    }

    /// Set whether to index property sets and quantities
    pub fn with_properties(mut self, enabled: bool) -> Self {
        self.extract_properties = enabled;
        self
    }
}

impl IfcParser for StepParser {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::parse(content, self.extract_properties)
            .map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Quick parse function for simple use cases
pub fn parse(content: &str) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse(content)
}
