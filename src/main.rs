//! Crime Dashboard - South Wales street crime explorer
//!
//! Opens the interactive dashboard, or prints a summary with `--summary`.

use anyhow::{anyhow, Result};
use clap::Parser;
use crime_dashboard::charts::month_name;
use crime_dashboard::gui::CrimeDashboardApp;
use crime_dashboard::{
    DashboardConfig, DashboardConfigBuilder, DashboardSession, DashboardSummary,
};
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "crime-dashboard")]
#[command(about = "Explore South Wales street-level crime data", long_about = None)]
struct Args {
    /// Path to the street-level crime CSV
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a summary and exit instead of opening the window
    #[arg(long)]
    summary: bool,

    /// Print the summary as JSON (implies --summary, disables logging)
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of crime types to rank per region
    #[arg(long)]
    top_n: Option<usize>,

    /// Region to rank crime types for (repeatable)
    #[arg(short, long = "region")]
    regions: Vec<String>,
}

/// Initialize the tracing subscriber.
///
/// Nothing is installed in JSON mode so stdout only carries the report.
fn init_logging(level: &str, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<DashboardConfig> {
    let base = match &args.config {
        Some(path) => DashboardConfig::from_json_file(path)?,
        None => DashboardConfig::default(),
    };

    let mut builder = DashboardConfigBuilder::from_config(base);
    if let Some(path) = &args.data {
        builder = builder.data_path(path.clone());
    }
    if let Some(n) = args.top_n {
        builder = builder.top_n(n);
    }
    Ok(builder.build()?)
}

fn print_summary(summary: &DashboardSummary) {
    println!("Source: {}", summary.source.display());
    println!(
        "Rows: {} raw, {} inside the fence",
        summary.raw_rows, summary.clean_rows
    );

    println!("\nCrimes by month:");
    for m in &summary.monthly {
        println!("  {:<10} {:>8}", month_name(m.month_real), m.count);
    }

    println!("\nCrimes by region:");
    for r in &summary.regional {
        println!("  {:<24} {:>8}", r.region, r.count);
    }

    println!("\nCrimes by type:");
    for c in &summary.crime_types {
        println!("  {:<32} {:>8}", c.crime_type, c.count);
    }

    match &summary.trend {
        Some(trend) => {
            println!(
                "\nMonthly trend: slope {:.2}, r² {:.3}",
                trend.fit.slope, trend.fit.r_squared
            );
            println!("  {}", trend.verdict);
        }
        None => println!("\nMonthly trend: not enough months"),
    }

    for breakdown in &summary.region_breakdowns {
        println!("\nTop crime types in {}:", breakdown.region);
        if breakdown.top_types.is_empty() {
            println!("  0 crimes");
        }
        for (crime_type, count) in &breakdown.top_types {
            println!("  {:<32} {:>8}", crime_type, count);
        }
    }
}

fn run_headless(mut session: DashboardSession, regions: &[String], json: bool) -> Result<()> {
    let summary = session.summary(regions).map_err(|e| {
        error!("[{}] {}", e.error_code(), e);
        e
    })?;

    if json {
        println!("{}", summary.to_json()?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json);

    let config = build_config(&args)?;
    let session = DashboardSession::new(config);
    info!("Using crime data at {}", session.data_path().display());

    if args.summary || args.json {
        return run_headless(session, &args.regions, args.json);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Crime Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Crime Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(CrimeDashboardApp::new(cc, session)))),
    )
    .map_err(|e| anyhow!(e.to_string()))
}
