use std::hint::black_box;
use std::path::Path;
use std::time::Instant;

use bm_core::Classifier;

use crate::db;

pub struct BenchOptions<'a> {
    pub db_path: &'a Path,
    pub urls_path: &'a Path,
    pub iterations: usize,
}

pub struct BenchReport {
    pub urls: usize,
    pub ops: usize,
    pub matched: usize,
    pub total_ms: f64,
    pub ns_per_op: f64,
    pub ops_per_sec: f64,
}

pub fn run(options: &BenchOptions<'_>) -> Result<BenchReport, String> {
    let (store, _) = db::load_store(options.db_path)?;
    let urls = db::read_lines(options.urls_path)?;
    if urls.is_empty() {
        return Err(format!("No URLs in '{}'", options.urls_path.display()));
    }
    let iterations = options.iterations.max(1);

    let classifier = Classifier::new(&store);
    let matched = urls.iter().filter(|url| classifier.is_bug(url).is_match()).count();

    // Warmup
    for url in &urls {
        black_box(classifier.is_bug(url));
    }

    let start = Instant::now();
    for _ in 0..iterations {
        for url in &urls {
            black_box(classifier.is_bug(black_box(url)));
        }
    }
    let elapsed = start.elapsed();

    let ops = urls.len() * iterations;
    let total_ns = elapsed.as_nanos() as f64;
    let ns_per_op = total_ns / ops as f64;

    Ok(BenchReport {
        urls: urls.len(),
        ops,
        matched,
        total_ms: total_ns / 1_000_000.0,
        ns_per_op,
        ops_per_sec: if ns_per_op > 0.0 { 1e9 / ns_per_op } else { 0.0 },
    })
}
