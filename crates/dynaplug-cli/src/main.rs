//! Command-line probe for dynaplug plugin libraries.

mod check;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dynaplug_core::config::{defaults, env_vars};
use dynaplug_core::{library_filename, PluginManifest, SymbolNames};

use check::{check_entry, check_library, CheckReport};

/// Dynaplug - inspect shared-library plugins.
#[derive(Parser, Debug)]
#[command(name = "dynaplug")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a library exports a factory/destructor pair.
    Check {
        /// Path to the library.
        #[arg(required = true)]
        path: PathBuf,
        /// Factory symbol name.
        #[arg(long, default_value = defaults::FACTORY_SYMBOL)]
        factory: String,
        /// Destructor symbol name.
        #[arg(long, default_value = defaults::DESTRUCTOR_SYMBOL)]
        destructor: String,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check every plugin listed in a TOML manifest.
    Manifest {
        /// Path to the manifest file.
        #[arg(required = true)]
        file: PathBuf,
        /// Print the reports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the platform file name of a library.
    Filename {
        /// Bare library name, e.g. `foo` for `libfoo.so`.
        name: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_env(env_vars::LOG).unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "dynaplug={level},dynaplug_core={level},warn",
            level = default_level
        ))
    });

    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json_logging {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn emit(reports: &[CheckReport], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(reports).context("Failed to serialize report")?
        );
    } else {
        for report in reports {
            report.print();
        }
    }

    let failed = reports.iter().filter(|r| !r.ok).count();
    if failed > 0 {
        bail!("{} of {} plugin(s) failed", failed, reports.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Check {
            path,
            factory,
            destructor,
            json,
        } => {
            let symbols = SymbolNames::new(factory, destructor);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let report = check_library(&name, &path, &symbols);
            emit(&[report], json)
        }
        Command::Manifest { file, json } => {
            let manifest = PluginManifest::from_file(&file)
                .with_context(|| format!("Failed to load manifest {}", file.display()))?;
            tracing::info!("Checking {} plugin(s)", manifest.plugins.len());

            let reports: Vec<_> = manifest.plugins.iter().map(check_entry).collect();
            emit(&reports, json)
        }
        Command::Filename { name } => {
            println!("{}", library_filename(&name).to_string_lossy());
            Ok(())
        }
    }
}
