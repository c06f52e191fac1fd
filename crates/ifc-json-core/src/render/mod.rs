// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Template rendering boundary
//!
//! A render exposes a context document to the evaluator as the external
//! `ifcData`, next to registered and per-call externals. Whatever goes
//! wrong inside the evaluator comes back as an `{error, type}` value; the
//! renderer itself keeps no state from one call to the next except the
//! registered externals.

mod evaluator;
mod templates;

pub use evaluator::{JsonnetCommand, TemplateEvaluator};
pub use templates::{default_template, element_type_template};

use crate::error::RenderError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// External through which templates receive the context document
pub const CONTEXT_VAR: &str = "ifcData";

/// Renders templates through a [`TemplateEvaluator`]
pub struct TemplateRenderer {
    evaluator: Box<dyn TemplateEvaluator>,
    externals: RwLock<BTreeMap<String, String>>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(Box::new(JsonnetCommand::new()))
    }
}

impl TemplateRenderer {
    pub fn new(evaluator: Box<dyn TemplateEvaluator>) -> Self {
        Self {
            evaluator,
            externals: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register an external for every later render, replacing any previous value
    pub fn add_external(&self, key: impl Into<String>, value: impl Into<String>) {
        self.externals.write().insert(key.into(), value.into());
    }

    pub fn clear_externals(&self) {
        self.externals.write().clear();
    }

    pub fn external_count(&self) -> usize {
        self.externals.read().len()
    }

    /// Render template source, errors folded into an envelope
    pub fn render(
        &self,
        source: &str,
        context: &Value,
        externals: &BTreeMap<String, String>,
    ) -> Value {
        self.try_render(source, context, externals, &[])
            .unwrap_or_else(envelope)
    }

    /// Render a template file, errors folded into an envelope
    ///
    /// The file's directory is searched by the template's imports.
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        context: &Value,
        externals: &BTreeMap<String, String>,
    ) -> Value {
        self.try_render_file(path.as_ref(), context, externals)
            .unwrap_or_else(envelope)
    }

    pub fn try_render_file(
        &self,
        path: &Path,
        context: &Value,
        externals: &BTreeMap<String, String>,
    ) -> Result<Value, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        let import_paths: Vec<PathBuf> = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .into_iter()
            .collect();
        self.try_render(&source, context, externals, &import_paths)
    }

    /// Render template source
    ///
    /// Call externals override registered ones; the context is inserted
    /// last and cannot be shadowed.
    pub fn try_render(
        &self,
        source: &str,
        context: &Value,
        externals: &BTreeMap<String, String>,
        import_paths: &[PathBuf],
    ) -> Result<Value, RenderError> {
        let mut merged = self.externals.read().clone();
        merged.extend(externals.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.insert(CONTEXT_VAR.to_string(), context.to_string());

        log::debug!(
            "Rendering {} bytes of template with {} externals",
            source.len(),
            merged.len()
        );

        let output = self.evaluator.evaluate(source, &merged, import_paths)?;
        Ok(serde_json::from_str(&output)?)
    }
}

fn envelope(err: RenderError) -> Value {
    log::warn!("Template rendering failed: {}", err);
    err.to_envelope()
}
