//! `filtergen`: turn a filter parameter record into an OpenSCAD file.
//!
//! # Commands
//!
//! - `filtergen build --params p.json -D num_bins=3 --out filter.scad`
//! - `filtergen check --params p.json` validates without building
//! - `filtergen defaults` prints the default record as JSON

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use filter_engine::{ParameterSet, check};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filtergen")]
#[command(about = "Generate helical inertial-separator filter parts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the parameter record comes from.
#[derive(clap::Args)]
struct ParamArgs {
    /// JSON parameter record; defaults apply to missing fields
    #[arg(long)]
    params: Option<PathBuf>,

    /// Override one parameter, e.g. `-D num_bins=3` or `-D CUT_FOR_VISIBILITY=true`
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the selected part and write it as OpenSCAD
    Build {
        #[command(flatten)]
        params: ParamArgs,

        /// Output file
        #[arg(long, default_value = "filter.scad")]
        out: PathBuf,

        /// `$fn` for 2D profiles in the emitted file
        #[arg(long, default_value_t = 64)]
        facets: u32,
    },

    /// Validate the parameters and list every issue
    Check {
        #[command(flatten)]
        params: ParamArgs,
    },

    /// Print the default parameter record
    Defaults,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build { params, out, facets } => build(&load(&params)?, &out, facets),
        Commands::Check { params } => validate(&load(&params)?),
        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&ParameterSet::default())?);
            Ok(())
        }
    }
}

fn load(args: &ParamArgs) -> Result<ParameterSet> {
    let mut params = match &args.params {
        Some(path) => ParameterSet::from_json_file(path)?,
        None => ParameterSet::default(),
    };
    for assignment in &args.overrides {
        params
            .apply_override(assignment)
            .with_context(|| format!("applying -D {assignment}"))?;
    }
    Ok(params)
}

fn build(params: &ParameterSet, out: &Path, facets: u32) -> Result<()> {
    let assembly = filter_engine::build(params)?;
    let scad = assembly.to_scad(facets)?;
    fs::write(out, &scad).with_context(|| format!("writing {}", out.display()))?;

    let bb = assembly.bounds()?;
    info!(path = %out.display(), bytes = scad.len(), "wrote OpenSCAD");
    println!("part:        {:?}", assembly.part);
    println!("parameters:  {}", params.fingerprint()?);
    println!("tree:        {}", assembly.fingerprint()?);
    println!(
        "bounds:      [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
        bb.min.x, bb.min.y, bb.min.z, bb.max.x, bb.max.y, bb.max.z
    );
    Ok(())
}

fn validate(params: &ParameterSet) -> Result<()> {
    let issues = check(params);
    if issues.is_empty() {
        println!("ok: {:?} parameters are feasible", params.part_to_generate);
        return Ok(());
    }
    for issue in &issues {
        println!("  - {issue}");
    }
    bail!("{} issue(s) found", issues.len())
}
