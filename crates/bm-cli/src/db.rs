use std::fs;
use std::path::Path;
use std::time::Instant;

use bm_compiler::{compile_bugs_db, CompileStats};
use bm_core::{FuzzyEntry, PatternStore};

pub fn load_store(path: &Path) -> Result<(PatternStore, CompileStats), String> {
    let start = Instant::now();
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

    let (store, stats) = compile_bugs_db(&json)
        .map_err(|e| format!("Failed to compile '{}': {}", path.display(), e))?;

    log::info!(
        "Loaded '{}' (v{}) in {:.1}ms",
        path.display(),
        stats.version,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok((store, stats))
}

/// Read exception entries from a JSON array file, or parse a comma separated
/// inline list such as `example.com,*.cdn.net/static/*`.
pub fn load_entries(source: &str) -> Result<Vec<FuzzyEntry>, String> {
    let path = Path::new(source);
    if path.is_file() {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        let urls: Vec<String> = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid entry list '{}': {}", path.display(), e))?;
        return Ok(urls.iter().map(|url| FuzzyEntry::parse(url)).collect());
    }

    Ok(source
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(FuzzyEntry::parse)
        .collect())
}

pub fn read_lines(path: &Path) -> Result<Vec<String>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
