//! bugmatch CLI
//!
//! CLI tool for classifying URLs against a bugs database and inspecting it.

mod bench;
mod db;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use bm_core::{fuzzy_url_matcher, Classifier, MatchResult};

#[derive(Parser)]
#[command(name = "bm-cli")]
#[command(about = "bugmatch tracker classification tools")]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify URLs against a bugs database
    Classify {
        /// Bugs database (JSON)
        #[arg(short, long)]
        db: PathBuf,

        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Test a URL against an exception list
    Fuzzy {
        /// JSON array file of `host/path` strings, or an inline comma separated list
        #[arg(short, long)]
        entries: String,

        /// URL to test
        url: String,
    },

    /// Validate a bugs database
    Validate {
        /// Bugs database (JSON)
        #[arg(short, long)]
        db: PathBuf,
    },

    /// Dump bugs database info
    Info {
        /// Bugs database (JSON)
        #[arg(short, long)]
        db: PathBuf,
    },

    /// Measure classification throughput
    Bench {
        /// Bugs database (JSON)
        #[arg(short, long)]
        db: PathBuf,

        /// File with one URL per line
        #[arg(short, long)]
        urls: PathBuf,

        /// Passes over the URL list
        #[arg(short, long, default_value_t = 100)]
        iterations: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Classify { db, urls } => cmd_classify(&db, &urls),
        Commands::Fuzzy { entries, url } => cmd_fuzzy(&entries, &url),
        Commands::Validate { db } => cmd_validate(&db),
        Commands::Info { db } => cmd_info(&db),
        Commands::Bench { db, urls, iterations } => cmd_bench(&db, &urls, iterations),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_classify(db_path: &Path, urls: &[String]) -> Result<(), String> {
    let (store, _) = db::load_store(db_path)?;
    let classifier = Classifier::new(&store);

    for url in urls {
        match classifier.is_bug(url) {
            MatchResult::Matched(id) => println!("{url}\t{id}"),
            MatchResult::NoMatch => println!("{url}\t-"),
        }
    }

    Ok(())
}

fn cmd_fuzzy(entries: &str, url: &str) -> Result<(), String> {
    let entries = db::load_entries(entries)?;
    if fuzzy_url_matcher(url, &entries) {
        println!("match");
    } else {
        println!("no match");
    }
    Ok(())
}

fn cmd_validate(db_path: &Path) -> Result<(), String> {
    let (_, stats) = db::load_store(db_path)?;

    println!("Bugs database '{}' is valid", db_path.display());
    println!("  Version:     {}", stats.version);
    if stats.skipped > 0 {
        println!("  Skipped:     {} malformed entries", stats.skipped);
    }

    Ok(())
}

fn cmd_info(db_path: &Path) -> Result<(), String> {
    let (_, stats) = db::load_store(db_path)?;

    println!("Bugs database: {}", db_path.display());
    println!("  Version:     {}", stats.version);
    println!();
    println!("Host patterns:");
    println!("  Nodes:       {}", stats.host_nodes);
    println!("  Bugs:        {}", stats.host_bugs);
    println!("Host+path patterns:");
    println!("  Nodes:       {}", stats.host_path_nodes);
    println!("  Entries:     {}", stats.host_path_entries);
    println!("Path patterns: {}", stats.path_patterns);
    println!("Regex patterns: {}", stats.regex_patterns);
    println!("First-party exceptions: {} bugs", stats.exceptions);
    if stats.skipped > 0 {
        println!("Skipped:       {}", stats.skipped);
    }

    Ok(())
}

fn cmd_bench(db_path: &Path, urls_path: &Path, iterations: usize) -> Result<(), String> {
    let report = bench::run(&bench::BenchOptions {
        db_path,
        urls_path,
        iterations,
    })?;

    println!("Benchmark: {} URLs x {} iterations", report.urls, iterations.max(1));
    println!("  Matched:     {} / {}", report.matched, report.urls);
    println!("  Ops:         {}", report.ops);
    println!("  Time:        {:.1}ms", report.total_ms);
    println!("  Per op:      {:.0}ns", report.ns_per_op);
    println!("  Throughput:  {:.0} ops/s", report.ops_per_sec);

    Ok(())
}
