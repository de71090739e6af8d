//! `layers` command: the built-in catalog and filter panel.

use sihat_map::layer::{LayerCatalog, ZoomRange};

use crate::error::CliError;

pub fn run() -> Result<(), CliError> {
    let catalog = LayerCatalog::banjarbaru()?;

    println!("Layers");
    println!("======");
    println!();
    println!("{:<12} {:<8} {:<22} {:<10} SOURCE", "ID", "MODE", "LABEL", "ZOOM");
    for descriptor in catalog.descriptors() {
        println!(
            "{:<12} {:<8} {:<22} {:<10} {}",
            descriptor.id(),
            descriptor.render_mode().as_str(),
            descriptor.label(),
            zoom_label(descriptor.zoom()),
            descriptor.source_url()
        );
        if !descriptor.aliases().is_empty() {
            println!("{:<12} aliases: {}", "", descriptor.aliases().join(", "));
        }
    }

    println!();
    println!("Filter panel");
    println!("============");
    for category in catalog.categories() {
        println!();
        let suffix = if category.coming_soon { " (coming soon)" } else { "" };
        println!("{}{}", category.title, suffix);
        for item in &category.items {
            let status = match catalog.resolve(&item.id) {
                Some(descriptor) => descriptor.id().to_string(),
                None => "no dataset".to_string(),
            };
            println!("  {:<16} {:<26} {:<10} {}", item.id, item.label, item.color, status);
        }
    }

    Ok(())
}

fn zoom_label(zoom: ZoomRange) -> String {
    match (zoom.min, zoom.max) {
        (None, None) => "any".to_string(),
        (Some(min), None) => format!("{}+", min),
        (None, Some(max)) => format!("<{}", max),
        (Some(min), Some(max)) => format!("{}-{}", min, max),
    }
}
