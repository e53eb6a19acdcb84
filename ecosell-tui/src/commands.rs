//! One-shot subcommands that print to stdout instead of opening the TUI.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ecosell_core::{
    geo::{directions_url, format_distance_km},
    model::ClassificationResult,
    pricing::{estimate_price, format_rupees, pricing, showcase},
    service::EcoSellService,
};

pub(crate) async fn classify(service: &EcoSellService, path: &Path, weight_kg: f64) -> Result<()> {
    let (image, result) = service
        .classify_file(path)
        .await
        .with_context(|| format!("could not classify {}", path.display()))?;

    let mut out = io::stdout().lock();
    if result == ClassificationResult::unknown() {
        writeln!(out, "{}: could not identify the item, try another photo", image.name)?;
        return Ok(());
    }

    let entry = pricing(result.category);
    writeln!(out, "{}: {}", image.name, entry.display_name)?;
    writeln!(
        out,
        "  confidence {}% (label: {})",
        result.confidence_percent(),
        result.label
    )?;
    writeln!(out, "  rate       {} / kg", format_rupees(entry.rate_per_kg))?;
    writeln!(
        out,
        "  estimate   {} for {weight_kg} kg",
        format_rupees(estimate_price(result.category, weight_kg))
    )?;
    Ok(())
}

pub(crate) async fn centers(service: &EcoSellService) -> Result<()> {
    let origin = service
        .locate()
        .await
        .context("could not determine your location; pass --lat and --lon")?;
    let nearby = service
        .nearby_centers(origin)
        .await
        .context("failed to load recycling centers")?;

    let mut out = io::stdout().lock();
    if nearby.centers.is_empty() {
        let radius_km = f64::from(service.settings().radius_meters) / 1_000.0;
        writeln!(out, "No centers found within {radius_km} km of {origin}.")?;
        return Ok(());
    }

    writeln!(out, "Recycling centers near {origin}:")?;
    for center in &nearby.centers {
        writeln!(
            out,
            "{:>8}  {}",
            format_distance_km(center.distance_meters),
            center.name
        )?;
        if let Some(phone) = &center.phone {
            writeln!(out, "          phone: {phone}")?;
        }
        writeln!(out, "          {}", directions_url(center))?;
    }
    Ok(())
}

pub(crate) fn prices() -> Result<()> {
    let mut out = io::stdout().lock();
    for entry in showcase() {
        writeln!(
            out,
            "{:<28} {} / kg",
            entry.display_name,
            format_rupees(entry.rate_per_kg)
        )?;
    }
    Ok(())
}
