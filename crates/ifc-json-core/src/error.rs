// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for conversion and rendering

use ifc_json_model::ParseError;
use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

/// `type` tag of every rendering error envelope
pub const TEMPLATE_ERROR: &str = "template_error";

/// Result type alias for conversion
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors while loading and converting a model
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The loader rejected the file
    #[error("{0}")]
    Load(#[from] ParseError),

    /// Document could not be turned into JSON
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors reported by a template evaluator
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// The template failed to evaluate
    #[error("{0}")]
    Failed(String),

    /// The evaluator program could not be started
    #[error("Failed to run evaluator '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// Scratch file handling failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvaluationError {
    pub fn failed(msg: impl Into<String>) -> Self {
        EvaluationError::Failed(msg.into())
    }
}

/// Errors while rendering a template
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    Evaluation(#[from] EvaluationError),

    /// Evaluator output is not JSON
    #[error("Template produced invalid JSON: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to read template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// `{error, type}` object handed back in place of a rendered document
    pub fn to_envelope(&self) -> Value {
        json!({ "error": self.to_string(), "type": TEMPLATE_ERROR })
    }
}

/// `{error}` object for failures outside rendering
pub fn error_envelope(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Whether a JSON value is an error envelope
pub fn is_error(value: &Value) -> bool {
    value.get("error").is_some()
}
