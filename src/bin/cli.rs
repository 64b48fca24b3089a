// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Meshmend Team

//! Meshmend CLI

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use meshmend::{
    drive, io, AnalyzePass, CancelToken, FillPass, Mesh, Outcome, Report, WatertightReport,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "meshmend")]
#[command(about = "Mesh repair and volumetric analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check watertightness and integrate enclosed volume
    Analyze {
        /// Input STL file
        input: PathBuf,

        /// Material density for mass estimation (per cubic unit)
        #[arg(short, long)]
        density: Option<f64>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Close boundary holes and write the repaired mesh
    Fill {
        /// Input STL file
        input: PathBuf,

        /// Output STL file
        #[arg(short, long)]
        output: PathBuf,

        /// Emit fill statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            density,
            json,
        } => analyze_command(&input, density, json),
        Commands::Fill {
            input,
            output,
            json,
        } => fill_command(&input, &output, json),
        Commands::Version => {
            println!("meshmend v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(1000);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn track(bar: &ProgressBar, report: &Report) {
    bar.set_position((report.progress * 1000.0) as u64);
    bar.set_message(report.phase.clone());
}

fn analyze_command(input: &PathBuf, density: Option<f64>, json: bool) -> Result<()> {
    let mesh = io::import_stl(input)?;

    let bar = progress_bar();
    let pass = AnalyzePass::new(&mesh, CancelToken::new())?;
    let outcome = drive(pass, |report| track(&bar, report));
    bar.finish_and_clear();

    let report = match outcome {
        Outcome::Done(report) => report,
        Outcome::Cancelled => bail!("analysis cancelled"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis_json(&mesh, &report, density))?);
        return Ok(());
    }

    println!("{}", "Mesh analysis".bold());
    println!("  Vertices:     {}", mesh.vertex_count());
    println!("  Triangles:    {}", mesh.triangle_count());
    println!("  Surface area: {:.4}", mesh.surface_area());
    if let Some(bbox) = mesh.bounding_box() {
        println!(
            "  Bounds:       ({:.3}, {:.3}, {:.3}) – ({:.3}, {:.3}, {:.3})",
            bbox[0], bbox[1], bbox[2], bbox[3], bbox[4], bbox[5]
        );
    }
    if let Some(centroid) = mesh.centroid() {
        println!(
            "  Centroid:     ({:.3}, {:.3}, {:.3})",
            centroid[0], centroid[1], centroid[2]
        );
    }
    if report.is_closed {
        println!("  Watertight:   {}", "yes".green());
        if let Some(volume) = report.volume {
            println!("  Volume:       {volume:.6}");
            if let Some(density) = density {
                println!("  Mass:         {:.6}", volume * density);
            }
        }
    } else {
        println!("  Watertight:   {}", "no".red());
        println!("  Volume:       n/a (mesh is open; run `meshmend fill` first)");
    }
    Ok(())
}

fn analysis_json(
    mesh: &Mesh,
    report: &WatertightReport,
    density: Option<f64>,
) -> serde_json::Value {
    json!({
        "vertices": mesh.vertex_count(),
        "triangles": mesh.triangle_count(),
        "surface_area": mesh.surface_area(),
        "bounding_box": mesh.bounding_box(),
        "centroid": mesh.centroid(),
        "is_closed": report.is_closed,
        "volume": report.volume,
        "mass": report.volume.zip(density).map(|(v, d)| v * d),
    })
}

fn fill_command(input: &PathBuf, output: &PathBuf, json: bool) -> Result<()> {
    let mesh = io::import_stl(input)?;

    let bar = progress_bar();
    let pass = FillPass::new(&mesh, CancelToken::new())?;
    let outcome = drive(pass, |report| track(&bar, report));
    bar.finish_and_clear();

    let filled = match outcome {
        Outcome::Done(filled) => filled,
        Outcome::Cancelled => bail!("fill cancelled"),
    };

    io::export_stl(output, &filled.mesh)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "loops_filled": filled.loops_filled,
                "loops_incomplete": filled.loops_incomplete,
                "skipped_vertices": filled.skipped_vertices,
                "triangles_added": filled.triangles_added,
                "output": output,
            }))?
        );
        return Ok(());
    }

    if filled.loops_filled == 0 {
        println!("{}", "No holes found; mesh copied unchanged.".green());
    } else {
        println!(
            "{} {} hole(s) with {} triangle(s)",
            "Filled".green().bold(),
            filled.loops_filled,
            filled.triangles_added
        );
    }
    if filled.loops_incomplete > 0 {
        eprintln!(
            "{} {} loop(s) could only be partially filled",
            "warning:".yellow(),
            filled.loops_incomplete
        );
    }
    if filled.skipped_vertices > 0 {
        eprintln!(
            "{} {} non-manifold boundary vertex(es) left unfilled",
            "warning:".yellow(),
            filled.skipped_vertices
        );
    }
    println!("Wrote {}", output.display());
    Ok(())
}
