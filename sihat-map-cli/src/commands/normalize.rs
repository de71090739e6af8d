//! `normalize` command: convert a dataset file to GeoJSON.

use clap::Args;
use sihat_map::geometry::normalize;
use std::path::PathBuf;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Dataset file: GeoJSON, an array of features or geometries, or an
    /// ArcGIS feature set
    input: PathBuf,

    /// Write the FeatureCollection here instead of printing a summary
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

pub fn run(args: NormalizeArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("normalize");

    let bytes = std::fs::read(&args.input).map_err(|error| CliError::FileRead {
        path: args.input.clone(),
        error,
    })?;
    let raw: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|error| CliError::InvalidJson {
            path: args.input.clone(),
            error,
        })?;

    let collection = normalize(&raw);
    info!(
        input = %args.input.display(),
        features = collection.len(),
        "Dataset normalized"
    );

    println!("Features: {}", collection.len());
    match collection.bounds() {
        Some(bounds) => println!(
            "Bounds:   [{}, {}] - [{}, {}]",
            bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
        ),
        None => println!("Bounds:   (none)"),
    }

    if let Some(output) = args.output {
        let value = collection.to_value();
        let text = if args.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
        .map_err(|error| CliError::InvalidJson {
            path: output.clone(),
            error,
        })?;
        std::fs::write(&output, text).map_err(|error| CliError::FileWrite {
            path: output.clone(),
            error,
        })?;
        println!("Written:  {}", output.display());
    }

    Ok(())
}
