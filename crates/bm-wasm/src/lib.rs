//! WebAssembly bindings for bugmatch

use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use bm_compiler::{compile_bugs_db, CompileStats};
use bm_core::{fuzzy_url_matcher as match_fuzzy, BugId, FuzzyEntry, MatchResult, SharedStore};

static STORE: OnceLock<SharedStore> = OnceLock::new();

// =============================================================================
// Logging
// =============================================================================

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[bugmatch] {}", record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&message),
            log::Level::Warn => web_sys::console::warn_1(&message),
            _ => web_sys::console::log_1(&message),
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to the browser console. Safe to call repeatedly.
#[wasm_bindgen]
pub fn set_log_level(debug: bool) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });
}

// =============================================================================
// Store lifecycle
// =============================================================================

fn compile(db_json: &str) -> Result<(bm_core::PatternStore, CompileStats), JsValue> {
    compile_bugs_db(db_json).map_err(|e| JsValue::from_str(&format!("Failed to compile bugs db: {}", e)))
}

fn stats_object(stats: &CompileStats) -> JsValue {
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"version".into(), &JsValue::from(stats.version));
    let _ = js_sys::Reflect::set(&result, &"hostBugs".into(), &JsValue::from(stats.host_bugs as u32));
    let _ = js_sys::Reflect::set(&result, &"hostPathEntries".into(), &JsValue::from(stats.host_path_entries as u32));
    let _ = js_sys::Reflect::set(&result, &"pathPatterns".into(), &JsValue::from(stats.path_patterns as u32));
    let _ = js_sys::Reflect::set(&result, &"regexPatterns".into(), &JsValue::from(stats.regex_patterns as u32));
    let _ = js_sys::Reflect::set(&result, &"exceptions".into(), &JsValue::from(stats.exceptions as u32));
    let _ = js_sys::Reflect::set(&result, &"skipped".into(), &JsValue::from(stats.skipped as u32));
    result.into()
}

/// Compile and install the bugs database. Use `reload` for later versions.
#[wasm_bindgen]
pub fn init(db_json: &str) -> Result<JsValue, JsValue> {
    set_log_level(false);

    let (store, stats) = compile(db_json)?;
    STORE
        .set(SharedStore::new(store))
        .map_err(|_| JsValue::from_str("Already initialized. Use reload() to install a new database."))?;

    Ok(stats_object(&stats))
}

/// Replace the installed database in one swap. In-flight matches finish on
/// the old one.
#[wasm_bindgen]
pub fn reload(db_json: &str) -> Result<JsValue, JsValue> {
    let shared = STORE
        .get()
        .ok_or_else(|| JsValue::from_str("Not initialized. Call init() first."))?;

    let (store, stats) = compile(db_json)?;
    shared.replace(store);

    Ok(stats_object(&stats))
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    STORE.get().is_some()
}

#[wasm_bindgen]
pub fn get_store_info() -> JsValue {
    let result = js_sys::Object::new();
    match STORE.get() {
        Some(shared) => {
            let store = shared.load();
            let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(true));
            let _ = js_sys::Reflect::set(&result, &"version".into(), &JsValue::from(store.version()));
            let _ = js_sys::Reflect::set(
                &result,
                &"hostBugs".into(),
                &JsValue::from(store.host_trie().bug_count() as u32),
            );
            let _ = js_sys::Reflect::set(
                &result,
                &"regexPatterns".into(),
                &JsValue::from(store.regex_patterns().len() as u32),
            );
        }
        None => {
            let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(false));
        }
    }
    result.into()
}

// =============================================================================
// Matching
// =============================================================================

/// Bug id for `url`, or `false`.
#[wasm_bindgen]
pub fn is_bug(url: &str) -> JsValue {
    let result = match STORE.get() {
        Some(shared) => shared.is_bug(url),
        None => MatchResult::NoMatch,
    };

    match result {
        MatchResult::Matched(id) => JsValue::from(id.get()),
        MatchResult::NoMatch => JsValue::FALSE,
    }
}

/// Test `url` against an array of `host/path` strings.
#[wasm_bindgen]
pub fn fuzzy_url_matcher(url: &str, entries: JsValue) -> bool {
    let list = js_sys::Array::from(&entries);
    let entries: Vec<FuzzyEntry> = list
        .iter()
        .filter_map(|value| value.as_string())
        .map(|s| FuzzyEntry::parse(&s))
        .collect();

    match_fuzzy(url, &entries)
}

#[wasm_bindgen]
pub fn is_first_party_exception(bug_id: u32, tab_url: &str) -> bool {
    let (Some(shared), Some(bug_id)) = (STORE.get(), BugId::new(bug_id)) else {
        return false;
    };
    shared.is_first_party_exception(bug_id, tab_url)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use wasm_bindgen_test::*;

    use super::*;

    const DB: &str = r#"{
        "version": 3,
        "patterns": {
            "host": {"com": {"example": {"$": 1}}},
            "path": {"/pixel.gif": 2}
        },
        "firstPartyExceptions": {"1": ["example.com"]}
    }"#;

    #[wasm_bindgen_test]
    fn init_and_match() {
        if !is_initialized() {
            init(DB).expect("init should succeed");
        }
        assert_eq!(is_bug("https://cdn.example.com/x.js").as_f64(), Some(1.0));
        assert_eq!(is_bug("https://site.org/img/pixel.gif").as_f64(), Some(2.0));
        assert_eq!(is_bug("https://site.org/"), JsValue::FALSE);
        assert!(is_first_party_exception(1, "https://www.example.com/"));
        assert!(init(DB).is_err());

        let other = r#"{"version": 4, "patterns": {"host": {"com": {"example": {"$": 9}}}}}"#;
        assert!(init(other).is_err());
        assert_eq!(is_bug("https://cdn.example.com/x.js").as_f64(), Some(1.0));
    }

    #[wasm_bindgen_test]
    fn fuzzy_from_js_array() {
        let entries = js_sys::Array::new();
        entries.push(&JsValue::from_str("*.ads.example"));
        assert!(fuzzy_url_matcher("http://foo.ads.example/anything", entries.clone().into()));
        assert!(!fuzzy_url_matcher("http://example.org/", entries.into()));
        assert!(!fuzzy_url_matcher("http://example.org/", js_sys::Array::new().into()));
    }
}
