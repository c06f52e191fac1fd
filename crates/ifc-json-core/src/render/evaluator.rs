// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Template evaluators
//!
//! The renderer only needs "source text plus string externals in, JSON
//! text or an error out". [`JsonnetCommand`] provides that by running the
//! `jsonnet` program; every call is a fresh process, so no evaluator state
//! survives a failed template.

use crate::error::EvaluationError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Evaluates template source against string externals
pub trait TemplateEvaluator: Send + Sync {
    /// Evaluate `source` and return the output text
    ///
    /// Every entry of `externals` is visible to the template through
    /// `std.extVar(key)`; `import_paths` extend the import search path.
    fn evaluate(
        &self,
        source: &str,
        externals: &BTreeMap<String, String>,
        import_paths: &[PathBuf],
    ) -> Result<String, EvaluationError>;
}

/// Runs the `jsonnet` command-line evaluator
#[derive(Clone, Debug)]
pub struct JsonnetCommand {
    binary: PathBuf,
    max_stack: usize,
    max_trace: usize,
    gc_min_objects: Option<usize>,
    import_paths: Vec<PathBuf>,
}

impl Default for JsonnetCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonnetCommand {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("jsonnet"),
            max_stack: 200,
            max_trace: 20,
            gc_min_objects: Some(1000),
            import_paths: Vec::new(),
        }
    }

    /// Evaluator program, looked up on `PATH` when not absolute
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_max_stack(mut self, frames: usize) -> Self {
        self.max_stack = frames;
        self
    }

    pub fn with_max_trace(mut self, lines: usize) -> Self {
        self.max_trace = lines;
        self
    }

    /// GC threshold, `None` to leave the evaluator's default (go-jsonnet has no such flag)
    pub fn with_gc_min_objects(mut self, objects: Option<usize>) -> Self {
        self.gc_min_objects = objects;
        self
    }

    /// Directory searched by every `import`
    pub fn with_import_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_paths.push(dir.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command line for one evaluation, scratch files already written
    fn command(
        &self,
        template: &Path,
        externals: &[(&str, NamedTempFile)],
        import_paths: &[PathBuf],
    ) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-s")
            .arg(self.max_stack.to_string())
            .arg("-t")
            .arg(self.max_trace.to_string());
        if let Some(objects) = self.gc_min_objects {
            cmd.arg("--gc-min-objects").arg(objects.to_string());
        }
        for dir in self.import_paths.iter().chain(import_paths) {
            cmd.arg("-J").arg(dir);
        }
        for (key, file) in externals {
            let mut binding = std::ffi::OsString::from(format!("{}=", key));
            binding.push(file.path());
            cmd.arg("--ext-str-file").arg(binding);
        }
        cmd.arg(template)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

fn scratch_file(contents: &str, suffix: &str) -> Result<NamedTempFile, EvaluationError> {
    let mut file = tempfile::Builder::new()
        .prefix("ifc-json-")
        .suffix(suffix)
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

impl TemplateEvaluator for JsonnetCommand {
    fn evaluate(
        &self,
        source: &str,
        externals: &BTreeMap<String, String>,
        import_paths: &[PathBuf],
    ) -> Result<String, EvaluationError> {
        // externals go through files: the context document easily exceeds argv limits
        let template = scratch_file(source, ".jsonnet")?;
        let values = externals
            .iter()
            .map(|(key, value)| -> Result<_, EvaluationError> {
                Ok((key.as_str(), scratch_file(value, ".txt")?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .command(template.path(), &values, import_paths)
            .output()
            .map_err(|source| EvaluationError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::debug!("jsonnet failed ({}): {}", output.status, stderr);
            return Err(EvaluationError::Failed(if stderr.is_empty() {
                format!("jsonnet exited with {}", output.status)
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_limits() {
        let jsonnet = JsonnetCommand::new();
        let template = scratch_file("{}", ".jsonnet").unwrap();
        let cmd = jsonnet.command(template.path(), &[], &[]);

        assert_eq!(cmd.get_program(), "jsonnet");
        let args = args(&cmd);
        assert_eq!(&args[..6], ["-s", "200", "-t", "20", "--gc-min-objects", "1000"]);
        assert_eq!(args.last().map(String::as_str), template.path().to_str());
    }

    #[test]
    fn test_externals_and_import_paths() {
        let jsonnet = JsonnetCommand::new()
            .with_binary("/opt/bin/jsonnet")
            .with_max_stack(500)
            .with_gc_min_objects(None)
            .with_import_path("/lib/a");
        let template = scratch_file("{}", ".jsonnet").unwrap();
        let values = vec![("user", scratch_file("bob", ".txt").unwrap())];
        let cmd = jsonnet.command(template.path(), &values, &[PathBuf::from("/lib/b")]);

        let args = args(&cmd);
        assert_eq!(cmd.get_program(), "/opt/bin/jsonnet");
        assert!(!args.contains(&"--gc-min-objects".to_string()));
        assert_eq!(&args[..2], ["-s", "500"]);
        assert_eq!(&args[4..8], ["-J", "/lib/a", "-J", "/lib/b"]);
        assert_eq!(args[8], "--ext-str-file");
        assert_eq!(args[9], format!("user={}", values[0].1.path().display()));
        assert_eq!(std::fs::read_to_string(values[0].1.path()).unwrap(), "bob");
    }

    #[test]
    fn test_missing_binary() {
        let jsonnet = JsonnetCommand::new().with_binary("/nonexistent/jsonnet-binary");
        let err = jsonnet
            .evaluate("{}", &BTreeMap::new(), &[])
            .err()
            .unwrap();
        assert!(matches!(err, EvaluationError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/jsonnet-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_evaluator_output_and_failure() {
        let jsonnet = JsonnetCommand::new().with_binary(crate::testing::fake_jsonnet());
        let mut externals = BTreeMap::new();
        externals.insert("user".to_string(), "bob".to_string());

        let output = jsonnet.evaluate("user", &externals, &[]).unwrap();
        assert_eq!(output.trim(), "\"bob\"");

        let err = jsonnet.evaluate("fail", &externals, &[]).err().unwrap();
        match err {
            EvaluationError::Failed(message) => assert_eq!(message, "RUNTIME ERROR: boom"),
            other => panic!("unexpected error: {other}"),
        }

        let output = jsonnet.evaluate("user", &externals, &[]).unwrap();
        assert_eq!(output.trim(), "\"bob\"");
    }
}
