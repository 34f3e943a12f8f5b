//! # gedcheck CLI - Integrity checks for genealogical record graphs
//!
//! Command-line host for the gedcheck library. Operates on JSON graph
//! snapshots.
//!
//! ## Usage
//! ```bash
//! # List every problem in a tree
//! gedcheck scan family.json
//!
//! # Same, with place checks and media verification
//! gedcheck scan family.json --places --media-root ./media
//!
//! # Repair half links only, writing the result to a new file
//! gedcheck repair family.json --only half-child-link --only half-spouse-link -o fixed.json
//!
//! # Explain a data loop
//! gedcheck cycle family.json I42
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::*;
use gedcheck::media::FsMediaStore;
use gedcheck::progress::{BarProgress, NoProgress, ScanProgress};
use gedcheck::repair::DeclineInteraction;
use gedcheck::{
    detect_cycle, repair_all, Diagnosis, InspectionOptions, Problem, RecordGraph, Resolution,
    TreeInspector, XRef,
};
use humantime::format_duration;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// gedcheck CLI - find and repair damage in a record graph
#[derive(Parser)]
#[command(name = "gedcheck")]
#[command(version)]
#[command(about = "Inspect and repair the integrity of a genealogical record graph")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a graph and list its problems
    Scan {
        /// Graph snapshot (JSON)
        graph: PathBuf,

        #[command(flatten)]
        inspect: InspectArgs,

        /// Directory holding the tree's media files
        #[arg(long)]
        media_root: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Repair the problems found in a graph
    Repair {
        /// Graph snapshot (JSON)
        graph: PathBuf,

        #[command(flatten)]
        inspect: InspectArgs,

        /// Only repair these diagnoses (repeatable)
        #[arg(long, value_parser = parse_diagnosis)]
        only: Vec<Diagnosis>,

        /// Write the repaired graph here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would be repaired without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Check one individual for a data loop
    Cycle {
        /// Graph snapshot (JSON)
        graph: PathBuf,

        /// Identifier of the individual
        xref: String,
    },
}

/// Options shared by commands that scan
#[derive(clap::Args)]
struct InspectArgs {
    /// Report individuals without any recorded place
    #[arg(long)]
    places: bool,

    /// Thresholds file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Year living ages are computed at (defaults to the current year)
    #[arg(long)]
    reference_year: Option<i32>,
}

impl InspectArgs {
    fn options(&self) -> anyhow::Result<InspectionOptions> {
        let mut options = match &self.config {
            Some(path) => InspectionOptions::from_json_file(path)
                .with_context(|| format!("loading thresholds from {}", path.display()))?,
            None => InspectionOptions::default(),
        };
        options.check_individual_places |= self.places;
        if self.reference_year.is_some() {
            options.reference_year = self.reference_year;
        }
        Ok(options)
    }
}

fn parse_diagnosis(s: &str) -> Result<Diagnosis, String> {
    s.parse().map_err(|e: gedcheck::GedcheckError| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Scan { graph, inspect, media_root, json } => {
            cmd_scan(&graph, &inspect, media_root, json)
        }
        Commands::Repair { graph, inspect, only, output, dry_run } => {
            cmd_repair(&graph, &inspect, &only, output, dry_run)
        }
        Commands::Cycle { graph, xref } => cmd_cycle(&graph, &xref),
    }
}

/// Scan a graph and print its problems
fn cmd_scan(path: &Path, inspect: &InspectArgs, media_root: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let graph = load_graph(path)?;

    let mut builder = TreeInspector::builder().options(inspect.options()?);
    if let Some(root) = media_root {
        let tree_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        builder = builder.media_store(FsMediaStore::new(root, tree_name));
    }
    let inspector = builder.build()?;

    let mut bar = BarProgress::new("Checking records");
    let mut quiet = NoProgress;
    let progress: &mut dyn ScanProgress = if json { &mut quiet } else { &mut bar };
    let report = inspector.scan(&graph, progress);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_clean() {
        println!("{} No problems found", "✓".green().bold());
    } else {
        println!("{}", format!("Found {} problems:", report.problems.len()).yellow().bold());
        for problem in &report.problems {
            print_problem(&graph, problem);
        }
    }

    println!(
        "\n{}",
        format!(
            "{} records checked in {}",
            report.records_checked,
            format_duration(Duration::from_millis(report.elapsed_ms))
        )
        .dimmed()
    );
    Ok(())
}

/// Repair the actionable problems of a graph
fn cmd_repair(
    path: &Path,
    inspect: &InspectArgs,
    only: &[Diagnosis],
    output: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut graph = load_graph(path)?;
    let inspector = TreeInspector::new(inspect.options()?)?;

    let problems: Vec<Problem> = inspector
        .scan(&graph, &mut BarProgress::new("Checking records"))
        .into_problems()
        .into_iter()
        .filter(|p| only.is_empty() || only.contains(&p.diagnosis))
        .collect();

    if dry_run {
        let actionable: Vec<&Problem> = problems.iter().filter(|p| p.resolution.is_actionable()).collect();
        println!("{}", format!("Would repair {} problems:", actionable.len()).blue().bold());
        for problem in actionable {
            print_problem(&graph, problem);
        }
        return Ok(());
    }

    let report = repair_all(&mut graph, &problems, &mut DeclineInteraction);

    println!("{} {}", "✓".green().bold(), report.summary());
    for deferral in &report.deferred {
        println!("  {} {}", "→".yellow(), deferral);
    }
    for (xref, reason) in &report.failed {
        println!("  {} {}: {}", "✗".red(), xref, reason);
    }

    let target = output.unwrap_or_else(|| path.to_path_buf());
    graph
        .save(&target)
        .with_context(|| format!("writing {}", target.display()))?;
    println!("  Saved: {}", target.display().to_string().cyan());
    println!("\n{}", format!("Total time: {}", format_duration(round_ms(start.elapsed()))).dimmed());
    Ok(())
}

/// Look for a data loop through one individual
fn cmd_cycle(path: &Path, xref: &str) -> anyhow::Result<()> {
    let graph = load_graph(path)?;
    let xref = XRef::new(xref);
    let Some(individual) = graph.individual(&xref) else {
        bail!("no individual with identifier {}", xref);
    };

    match detect_cycle(&graph, individual) {
        Some(path) => {
            println!("{} Data loop in {:?} walk:", "✗".red().bold(), path.direction);
            println!("  {}", path.to_string().yellow());
        }
        None => println!("{} No data loop through {}", "✓".green().bold(), xref),
    }
    Ok(())
}

fn load_graph(path: &Path) -> anyhow::Result<RecordGraph> {
    RecordGraph::load(path).with_context(|| format!("loading graph from {}", path.display()))
}

fn print_problem(graph: &RecordGraph, problem: &Problem) {
    let resolution = problem.resolution.to_string();
    let resolution = match problem.resolution {
        Resolution::Skip => resolution.dimmed(),
        Resolution::Repair | Resolution::SetDeceased => resolution.green(),
        Resolution::Remove => resolution.red(),
        Resolution::Edit | Resolution::DefineSex => resolution.yellow(),
    };
    println!(
        "  [{:>12}] {} {}: {}",
        resolution,
        problem.record_name(graph).bold(),
        problem.diagnosis.to_string().cyan(),
        problem.detail
    );
}

fn round_ms(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}
