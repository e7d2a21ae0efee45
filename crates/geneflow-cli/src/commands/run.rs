//! Run a scenario headless.

use anyhow::{Context, Result};
use colored::Colorize;
use geneflow::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Simulated seconds advanced per progress tick.
const FRAME: f64 = 0.1;

pub fn run(config_path: Option<&Path>, seconds: f64, snapshot: Option<&Path>, verbose: bool) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("{} Building cell...", "→".blue());
    let mut cell = Cell::new(config.sim, config.scenario).context("Invalid scenario")?;
    info!(seed = cell.config().seed, seconds, "Scenario loaded");
    println!(
        "  {} base pairs, {} genes, {} molecules",
        cell.dna().len().to_string().cyan(),
        cell.dna().genes().len().to_string().cyan(),
        cell.molecule_count().to_string().cyan()
    );

    println!("{} Running {} s...", "→".blue(), seconds.to_string().cyan());
    let frames = (seconds / FRAME).ceil().max(0.0) as u64;
    let pb = ProgressBar::new(frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut remaining = seconds;
    for _ in 0..frames {
        cell.step(remaining.min(FRAME));
        remaining -= FRAME;
        if verbose {
            for (t, event) in cell.drain_events() {
                if is_milestone(&event) {
                    pb.println(format!("  {:>8.2}s {:?}", t, event));
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    print_stats(&cell.stats());

    if let Some(path) = snapshot {
        let json = cell.snapshot_json()?;
        std::fs::write(path, json).with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        println!("  {} Snapshot written to {}", "✓".green(), path.display());
    }

    Ok(())
}

fn is_milestone(event: &CellEvent) -> bool {
    !matches!(
        event,
        CellEvent::Approaching { .. } | CellEvent::Attached { .. } | CellEvent::Detached { .. } | CellEvent::Hopped { .. }
    )
}

fn print_stats(stats: &CellStats) {
    println!();
    println!("{} Simulation complete!", "✓".green().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  Simulated time:      {:.2} s ({} ticks)", stats.time, stats.ticks);
    println!("  Molecules:           {}", stats.molecules.to_string().cyan());
    for (kind, count) in &stats.by_kind {
        println!("    {:<24} {}", kind, count);
    }
    println!("  Attached to DNA:     {}", stats.attached_to_dna.to_string().cyan());
    println!();
    println!("{}", "Expression".blue().bold());
    println!("  Transcriptions:      {}", stats.transcriptions_started.to_string().green());
    println!("  mRNAs released:      {}", stats.messenger_rnas_released.to_string().green());
    println!("  Translations:        {}", stats.translations_started.to_string().green());
    println!("  Proteins released:   {}", stats.proteins_released.to_string().green());
    println!("  mRNAs destroyed:     {}", stats.messenger_rnas_destroyed.to_string().yellow());
    println!("  Fragments released:  {}", stats.fragments_released.to_string().yellow());
    for (product, count) in &stats.products {
        println!("    product {:<16} {}", product.0, count);
    }
    println!("{}", "═".repeat(40).dimmed());
}
