// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion and rendering session
//!
//! A `Session` owns all mutable state: the document cache, the current
//! model and the renderer's registered externals. Every operation is
//! usable on an empty session and reports failures as JSON values.
//!
//! Locks are taken current model first, then cache. A load swaps both
//! while holding the current-model write lock, so a reader holding the
//! current-model lock sees the cached document and the model of the same
//! load.

use crate::cache::DocumentCache;
use crate::converter::{Converter, LoadedModel};
use crate::document::{EntityNode, GeometryFragment, HierarchyNode};
use crate::error::{error_envelope, Result};
use crate::render::TemplateRenderer;
use ifc_json_model::EntityId;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A cached load source
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedSource {
    pub source: String,
    pub entity_count: usize,
}

/// Snapshot of session state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub loaded: Vec<LoadedSource>,
    pub current: Option<String>,
    pub external_count: usize,
}

pub struct Session {
    converter: Converter,
    cache: DocumentCache,
    current: RwLock<Option<Arc<LoadedModel>>>,
    renderer: TemplateRenderer,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Converter::default(), TemplateRenderer::default())
    }
}

impl Session {
    pub fn new(converter: Converter, renderer: TemplateRenderer) -> Self {
        Self {
            converter,
            cache: DocumentCache::new(),
            current: RwLock::new(None),
            renderer,
        }
    }

    /// Load a file and convert it
    ///
    /// On success the document is cached under the path and the model
    /// becomes current. Failures return `{error}` and leave state untouched.
    pub fn load_and_convert(&self, path: impl AsRef<Path>) -> Value {
        let path = path.as_ref();
        self.install(self.converter.load(path))
            .unwrap_or_else(|err| load_failure(&path.display().to_string(), err))
    }

    /// [`Session::load_and_convert`] for in-memory content
    pub fn load_str(&self, source: &str, content: &str) -> Value {
        self.install(self.converter.load_str(source, content))
            .unwrap_or_else(|err| load_failure(source, err))
    }

    fn install(&self, loaded: Result<LoadedModel>) -> Result<Value> {
        let loaded = loaded?;
        let document = loaded.to_value()?;
        let mut current = self.current.write();
        let cached = self
            .cache
            .insert(loaded.source(), document, loaded.entity_count());
        *current = Some(Arc::new(loaded));
        Ok(cached.as_ref().clone())
    }

    /// The most recently loaded model
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.current.read().clone()
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn entities_by_type(&self, tag: &str) -> Vec<EntityNode> {
        self.current()
            .map(|model| model.queries().entities_by_type(tag))
            .unwrap_or_default()
    }

    pub fn entity_geometry(&self, id: &str) -> Option<GeometryFragment> {
        self.current()?.queries().entity_geometry(id)
    }

    pub fn hierarchy(&self) -> Option<HierarchyNode> {
        self.current()?.queries().build_hierarchy()
    }

    pub fn containing_structure(&self, id: EntityId) -> Option<EntityNode> {
        self.current()?.queries().containing_structure(id)
    }

    /// Render template source
    ///
    /// Without a context the latest cached document is used, or `{}`.
    pub fn render(
        &self,
        source: &str,
        context: Option<&Value>,
        externals: &BTreeMap<String, String>,
    ) -> Value {
        let latest = self.fallback_context(context);
        let empty = json!({});
        let context = context.or(latest.as_deref()).unwrap_or(&empty);
        self.renderer.render(source, context, externals)
    }

    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        context: Option<&Value>,
        externals: &BTreeMap<String, String>,
    ) -> Value {
        let latest = self.fallback_context(context);
        let empty = json!({});
        let context = context.or(latest.as_deref()).unwrap_or(&empty);
        self.renderer.render_file(path, context, externals)
    }

    fn fallback_context(&self, context: Option<&Value>) -> Option<Arc<Value>> {
        match context {
            Some(_) => None,
            None => {
                let _current = self.current.read();
                self.cache.latest()
            }
        }
    }

    pub fn add_external(&self, key: impl Into<String>, value: impl Into<String>) {
        self.renderer.add_external(key, value);
    }

    pub fn clear_externals(&self) {
        self.renderer.clear_externals();
    }

    pub fn status(&self) -> SessionStatus {
        let current = self.current.read();
        SessionStatus {
            loaded: self
                .cache
                .sources()
                .into_iter()
                .map(|(source, entity_count)| LoadedSource {
                    source,
                    entity_count,
                })
                .collect(),
            current: current.as_ref().map(|model| model.source().to_string()),
            external_count: self.renderer.external_count(),
        }
    }
}

fn load_failure(source: &str, err: crate::error::ConvertError) -> Value {
    log::warn!("Loading {} failed: {}", source, err);
    error_envelope(format!("Failed to load IFC file: {}", err))
}
