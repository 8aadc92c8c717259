//! Document the web service functions of a Moodle plugin.
//!
//! Usage: `apidoc [--root DIR] [--config FILE] [--component NAME] [--json FILE] [SCRIPT_DIR]`
//!
//! Exits with status 1 if any diagnostic was recorded or the run aborted.

use apidoc::export::{export_json, export_json_pretty, inject_into_file};
use apidoc::{ApidocError, Diagnostics, Result};
use apidoc_php::{compile_all, ExtractorConfig};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SCRIPT_FILE: &str = "script.js";

#[derive(Parser, Debug)]
#[command(name = "apidoc")]
#[command(about = "Extract the web service API of a Moodle plugin as JSON")]
struct Args {
    /// Directory whose script.js gets the `const funcs = ...` declaration
    script_dir: Option<PathBuf>,

    /// Plugin root directory (contains db/services.php)
    #[arg(long)]
    root: Option<PathBuf>,

    /// JSON extractor configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Component prefix of registry entries
    #[arg(long)]
    component: Option<String>,

    /// Also write the functions as indented JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

impl Args {
    fn extractor_config(&self) -> Result<ExtractorConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::from_json_file(path)?,
            None => ExtractorConfig::default(),
        };
        if let Some(root) = &self.root {
            config = config.with_root(root);
        }
        if let Some(component) = &self.component {
            config = config.with_component(component);
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "apidoc=info".into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Returns the diagnostics recorded during the run
fn run(args: &Args) -> Result<Diagnostics> {
    let config = args.extractor_config()?;
    info!(root = %config.root.display(), "documenting services");

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&config, &mut diagnostics)?;

    if let Some(path) = &args.json {
        let json = export_json_pretty(&functions)?;
        fs::write(path, json).map_err(|e| ApidocError::io(path, e))?;
        info!(path = %path.display(), "wrote JSON");
    }

    if let Some(dir) = &args.script_dir {
        let script = dir.join(SCRIPT_FILE);
        inject_into_file(&script, &export_json(&functions)?)?;
        info!(path = %script.display(), functions = functions.len(), "updated script");
    }

    Ok(diagnostics)
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(diagnostics) if !diagnostics.has_failures() => ExitCode::SUCCESS,
        Ok(diagnostics) => {
            for diagnostic in diagnostics.records() {
                println!("{diagnostic}");
            }
            println!("\n{} problem(s) found", diagnostics.len());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
