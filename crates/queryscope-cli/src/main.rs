//! Demo CLI (§6 "Configuration"): scans, parses and analyzes a single
//! SQL file against an empty catalog, then either prints a resolution
//! summary or, when `--complete-at` is given, the ranked completion
//! candidates at that cursor offset.

mod logger;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use queryscope::{Catalog, Script};

#[derive(Parser, Debug)]
#[command(name = "queryscope-cli", about = "Scan, parse, analyze and complete a SQL file")]
struct Args {
    /// Path to the SQL file to analyze.
    path: PathBuf,

    /// Rank this script is loaded into the catalog at.
    #[arg(long, default_value_t = 0)]
    rank: i64,

    /// Codepoint offset to place the cursor at and print completions for.
    #[arg(long)]
    complete_at: Option<u32>,

    /// Maximum number of completion candidates to print.
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

fn main() -> ExitCode {
    if let Err(err) = logger::init() {
        eprintln!("failed to initialize logger: {err}");
    }

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let text = std::fs::read_to_string(&args.path).map_err(|err| format!("reading {}: {err}", args.path.display()))?;

    let mut script = Script::from_text(0, &text);
    script.scan();
    script.parse().map_err(|err| err.to_string())?;

    let mut catalog = Catalog::new();
    let analyzed = script.analyze(catalog.inner_mut(), args.rank).map_err(|err| err.to_string())?;

    log::info!(
        "analyzed {}: {} table(s), {} reference(s), {} expression(s), {} error(s)",
        args.path.display(),
        analyzed.tables.len(),
        analyzed.table_references.len(),
        analyzed.expressions.len(),
        analyzed.errors.len(),
    );

    match args.complete_at {
        Some(offset) => print_completions(&script, &catalog, offset, args.limit),
        None => print_summary(&analyzed),
    }
}

fn print_summary(analyzed: &queryscope_analyzer::AnalyzedScript) -> Result<(), String> {
    for (idx, table_ref) in analyzed.table_references.iter().enumerate() {
        println!("table_reference[{idx}]: {:?}", table_ref.status);
    }
    for (idx, expr) in analyzed.expressions.iter().enumerate() {
        println!("expression[{idx}]: resolved={}", expr.kind.is_resolved());
    }
    for err in &analyzed.errors {
        println!("error: {:?} at {:?}: {}", err.kind, err.location, err.message);
    }
    Ok(())
}

fn print_completions(script: &Script, catalog: &Catalog, offset: u32, limit: usize) -> Result<(), String> {
    let cursor = script.move_cursor(offset).map_err(|err| err.to_string())?;
    let candidates = script.complete_at_cursor(catalog.inner(), &cursor, limit).map_err(|err| err.to_string())?;
    for candidate in &candidates {
        println!("{:>5}  {:?}  {}", candidate.score, candidate.kind, candidate.name);
    }
    Ok(())
}
