//! `inspect` command: load layers into a headless map.
//!
//! Runs the same lifecycle a browser embedding would (style load, icon
//! loading, registration, binding) and then shows the requested layers,
//! reporting feature counts, the camera and optionally a popup.

use clap::Args;
use parking_lot::Mutex;
use sihat_map::cache::{DatasetCache, FailureReason};
use sihat_map::engine::{EngineHandle, HeadlessEngine, MapEngine};
use sihat_map::fetch::AsyncReqwestClient;
use sihat_map::geometry::LngLat;
use sihat_map::interaction::PopupDetail;
use sihat_map::layer::LayerCatalog;
use sihat_map::manager::{LayerManager, LoadReport, ManagerOptions};
use std::sync::Arc;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Layer ids or filter panel ids (e.g. hospitals apotek elderly)
    #[arg(required = true)]
    layers: Vec<String>,

    /// Base URL for dataset and icon paths, overriding [data] base_url
    #[arg(long)]
    base_url: Option<String>,

    /// Fit the view to the last layer's data
    #[arg(long)]
    fit: bool,

    /// Render the popup for the feature at this position
    #[arg(long, value_name = "LNG,LAT", value_parser = parse_lng_lat)]
    popup_at: Option<LngLat>,

    /// Render the click popup instead of the hover summary
    #[arg(long, requires = "popup_at")]
    full: bool,

    /// Also show the default layers from the configuration
    #[arg(long)]
    with_defaults: bool,
}

fn parse_lng_lat(value: &str) -> Result<LngLat, String> {
    let (lng, lat) = value
        .split_once(',')
        .ok_or_else(|| "expected LNG,LAT".to_string())?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("invalid longitude '{}'", lng))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude '{}'", lat))?;
    Ok(LngLat::new(lng, lat))
}

pub fn run(args: InspectArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("inspect");
    let config = runner.config();

    let mut options = ManagerOptions::from_config(config);
    if let Some(base_url) = &args.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CliError::InvalidArgument(format!(
                "--base-url must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        options.base_url = Some(base_url.clone());
    }
    if !args.with_defaults {
        options = options.without_default_layers();
    }

    let engine = Arc::new(Mutex::new(HeadlessEngine::new(
        config.map.center,
        config.map.zoom,
    )));
    let client = Arc::new(runner.http_client()?);
    let catalog = Arc::new(LayerCatalog::banjarbaru()?);

    runner
        .runtime()?
        .block_on(inspect(args, engine, client, catalog, options))
}

async fn inspect(
    args: InspectArgs,
    engine: EngineHandle<HeadlessEngine>,
    client: Arc<AsyncReqwestClient>,
    catalog: Arc<LayerCatalog>,
    options: ManagerOptions,
) -> Result<(), CliError> {
    let mut manager = LayerManager::new(
        Arc::clone(&engine),
        client,
        catalog,
        DatasetCache::new(),
        options,
    );

    manager.begin_style_load()?;
    let report = manager.on_style_loaded().await?;
    print_report(&report);

    let last = args.layers.len().saturating_sub(1);
    for (index, id) in args.layers.iter().enumerate() {
        if manager.catalog().resolve(id).is_none() && manager.catalog().is_panel_item(id) {
            println!("{:<12} no dataset yet", id);
            continue;
        }
        match manager.load_and_show(id, args.fit && index == last).await {
            Ok(data) => println!("{:<12} {} features", id, data.len()),
            Err(e @ FailureReason::UnknownLayer(_)) => return Err(e.into()),
            Err(e) => println!("{:<12} shown without data: {}", id, e),
        }
    }

    println!();
    println!("Visible: {}", manager.visible_layers().join(", "));
    {
        let engine = engine.lock();
        let center = engine.center();
        println!(
            "View:    {:.5}, {:.5} at zoom {:.2}",
            center.lng,
            center.lat,
            engine.zoom()
        );
        if let Some(fit) = engine.last_fit() {
            println!(
                "Fitted:  [{}, {}] - [{}, {}]",
                fit.bounds.min_x, fit.bounds.min_y, fit.bounds.max_x, fit.bounds.max_y
            );
        }
        let missing = engine.layers_missing_icons();
        if !missing.is_empty() {
            println!("No icon: {}", missing.join(", "));
        }
    }
    let stats = manager.cache().stats();
    println!(
        "Cache:   {} datasets, {} hits, {} misses",
        stats.entries, stats.hits, stats.misses
    );

    if let Some(at) = args.popup_at {
        let detail = if args.full {
            PopupDetail::Full
        } else {
            PopupDetail::Summary
        };
        println!();
        match manager.popup_at(at, detail) {
            Some(html) => println!("{}", html),
            None => println!("No feature with a popup at {}, {}", at.lng, at.lat),
        }
    }

    manager.dispose();
    Ok(())
}

fn print_report(report: &LoadReport) {
    println!(
        "Style loaded: {} layers, {} handlers, {} icons",
        report.layers_registered, report.handlers_bound, report.icons_loaded
    );
    for name in &report.icons_failed {
        println!("  icon unavailable: {}", name);
    }
    for (id, reason) in &report.defaults_failed {
        println!("  default layer {} without data: {}", id, reason);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lng_lat() {
        assert_eq!(
            parse_lng_lat("114.8, -3.4").unwrap(),
            LngLat::new(114.8, -3.4)
        );
        assert!(parse_lng_lat("114.8").is_err());
        assert!(parse_lng_lat("east,-3.4").is_err());
    }
}
