// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ifc-json` - convert IFC models to JSON and render Jsonnet templates

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ifc_json_core::error::is_error;
use ifc_json_core::{
    default_template, element_type_template, Converter, ConverterOptions, JsonnetCommand,
    Session, TemplateRenderer,
};
use ifc_json_model::EntityId;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "ifc-json",
    about = "Convert IFC models to JSON and render them through Jsonnet templates",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip geometry extraction
    #[arg(long, global = true)]
    no_geometry: bool,

    /// Weld identical vertices within each mesh
    #[arg(long, global = true)]
    shared_vertices: bool,

    /// Jsonnet evaluator program
    #[arg(long, global = true, env = "IFC_JSON_JSONNET", default_value = "jsonnet")]
    jsonnet: PathBuf,

    /// Additional Jsonnet import directory (repeatable)
    #[arg(short = 'J', long = "jpath", global = true)]
    import_paths: Vec<PathBuf>,

    /// External variable for templates as KEY=VALUE (repeatable)
    #[arg(long = "var", global = true, value_parser = parse_var)]
    vars: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a model and print the whole document
    Load {
        /// IFC file
        file: PathBuf,
    },

    /// List entities of one type
    Entities {
        /// IFC file
        file: PathBuf,

        /// Entity type: Wall, IfcWall or IFCWALL
        entity_type: String,
    },

    /// Print the geometry of one entity
    Geometry {
        /// IFC file
        file: PathBuf,

        /// Entity ID without the leading '#'
        id: String,
    },

    /// Print the spatial hierarchy
    Hierarchy {
        /// IFC file
        file: PathBuf,
    },

    /// Print the spatial structure holding an element
    Container {
        /// IFC file
        file: PathBuf,

        /// Entity ID without the leading '#'
        id: u32,
    },

    /// Render a template file
    Render {
        /// Jsonnet template file
        template: PathBuf,

        /// IFC file providing the context document
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Render template source given on the command line
    RenderSnippet {
        /// Jsonnet source
        source: String,

        /// IFC file providing the context document
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Print a built-in template
    Template {
        #[command(subcommand)]
        kind: TemplateKind,
    },

    /// Load models and report session state
    Status {
        /// IFC files to load first
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TemplateKind {
    /// Summary of every element grouped by type
    Default,
    /// Elements of one type with mesh statistics
    Element {
        /// Entity type: Wall, IfcWall or IFCWALL
        entity_type: String,
    },
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn session(global: &GlobalArgs) -> Session {
    let options = ConverterOptions::default()
        .with_geometry(!global.no_geometry)
        .with_shared_vertices(global.shared_vertices);

    let jsonnet = global
        .import_paths
        .iter()
        .fold(JsonnetCommand::new().with_binary(&global.jsonnet), |cmd, dir| {
            cmd.with_import_path(dir)
        });

    let renderer = TemplateRenderer::new(Box::new(jsonnet));
    renderer.add_external("timestamp", chrono::Utc::now().to_rfc3339());

    Session::new(Converter::new(options), renderer)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let global = &cli.global;
    let session = session(global);
    let vars: BTreeMap<String, String> = global.vars.iter().cloned().collect();

    match cli.command {
        Commands::Load { file } => document(load(&session, &file), global.pretty),
        Commands::Entities { file, entity_type } => {
            load_checked(&session, &file)?;
            emit(&session.entities_by_type(&entity_type), global.pretty)
        }
        Commands::Geometry { file, id } => {
            load_checked(&session, &file)?;
            emit(&session.entity_geometry(&id), global.pretty)
        }
        Commands::Hierarchy { file } => {
            load_checked(&session, &file)?;
            emit(&session.hierarchy(), global.pretty)
        }
        Commands::Container { file, id } => {
            load_checked(&session, &file)?;
            emit(&session.containing_structure(EntityId(id)), global.pretty)
        }
        Commands::Render { template, model } => {
            if let Some(model) = model {
                load_checked(&session, &model)?;
            }
            document(session.render_file(&template, None, &vars), global.pretty)
        }
        Commands::RenderSnippet { source, model } => {
            if let Some(model) = model {
                load_checked(&session, &model)?;
            }
            document(session.render(&source, None, &vars), global.pretty)
        }
        Commands::Template { kind } => {
            let source = match kind {
                TemplateKind::Default => default_template(),
                TemplateKind::Element { entity_type } => element_type_template(&entity_type),
            };
            print!("{}", source);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status { files } => {
            for file in &files {
                load_checked(&session, file)?;
            }
            emit(&session.status(), global.pretty)
        }
    }
}

fn load(session: &Session, file: &Path) -> Value {
    log::info!("Loading {}", file.display());
    session.load_and_convert(file)
}

fn load_checked(session: &Session, file: &Path) -> Result<()> {
    let document = load(session, file);
    match document.get("error").and_then(Value::as_str) {
        Some(message) => anyhow::bail!("{}", message),
        None => Ok(()),
    }
}

/// Print a document or error envelope; envelopes exit unsuccessfully
fn document(value: Value, pretty: bool) -> Result<ExitCode> {
    let failed = is_error(&value);
    emit(&value, pretty)?;
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<ExitCode> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", text);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("user=a=b"),
            Ok(("user".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_var("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ifc-json",
            "render-snippet",
            "{}",
            "--var",
            "user=b",
            "--pretty",
            "--no-geometry",
        ])
        .unwrap();
        assert!(cli.global.pretty);
        assert!(cli.global.no_geometry);
        assert_eq!(cli.global.vars, vec![("user".to_string(), "b".to_string())]);
    }
}
