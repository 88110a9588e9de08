//! Structured logging for result sessions.
//!
//! Every record is one JSON line with `ts`, `run_id`, `seq`, `lvl`,
//! `component`, `event`, `msg` and a `data` object. Records go to
//! `LOG_DIR/<RUN_ID>/events.jsonl` (info and above) or `trace.jsonl`
//! (trace/debug). Set `LOG_STDERR=1` to also echo them to stderr.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::model::FitReport;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Input,    // Accepted and rejected results
    Analysis, // Moving-average heuristic
    Model,    // Training and forecasts
    Storage,  // Model slot reads/writes
    Fetch,    // Remote bootstrap fetch
    System,   // Startup, shutdown
    Profile,  // Timing scopes
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Input => "input",
            Domain::Analysis => "analysis",
            Domain::Model => "model",
            Domain::Storage => "storage",
            Domain::Fetch => "fetch",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
    echo: bool,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }

        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            run_id,
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            echo: std::env::var("LOG_STDERR")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    })
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["msg", "history_len"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    if ctx.echo {
        eprintln!("{}", line);
    }
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_result(index: usize, value: f64, bucket: &str, source: &str) {
    log(
        Level::Debug,
        Domain::Input,
        "result",
        obj(&[
            ("index", json!(index)),
            ("value", v_num(value)),
            ("bucket", v_str(bucket)),
            ("source", v_str(source)),
        ]),
    );
}

pub fn log_rejected(raw: &str, reason: &str) {
    log(
        Level::Warn,
        Domain::Input,
        "rejected",
        obj(&[("raw", v_str(raw)), ("msg", v_str(reason))]),
    );
}

pub fn log_analysis(history_len: usize, mean: Option<f64>, recommendation: &str) {
    log(
        Level::Debug,
        Domain::Analysis,
        "analysis",
        obj(&[
            ("history_len", json!(history_len)),
            ("mean", mean.map(v_num).unwrap_or(Value::Null)),
            ("recommendation", v_str(recommendation)),
        ]),
    );
}

pub fn log_fetch(url: &str, status: &str, count: usize, error: Option<&str>) {
    let level = if error.is_some() { Level::Error } else { Level::Info };
    log(
        level,
        Domain::Fetch,
        "fetch_initial",
        obj(&[
            ("url", v_str(url)),
            ("status", v_str(status)),
            ("count", json!(count)),
            ("msg", error.map(v_str).unwrap_or(Value::Null)),
        ]),
    );
}

pub fn log_training(history_len: usize, scale: f64, report: &FitReport) {
    log(
        Level::Info,
        Domain::Model,
        "trained",
        obj(&[
            ("history_len", json!(history_len)),
            ("scale", v_num(scale)),
            ("epochs_run", json!(report.epochs_run)),
            ("final_loss", v_num(report.final_loss)),
            ("stopped_early", json!(report.stopped_early)),
            ("elapsed_ms", v_num(report.elapsed.as_secs_f64() * 1000.0)),
        ]),
    );
}

pub fn log_forecast(history_len: usize, value: f64) {
    log(
        Level::Info,
        Domain::Model,
        "forecast",
        obj(&[("history_len", json!(history_len)), ("value", v_num(value))]),
    );
}

pub fn log_train_failed(history_len: usize, error: &str) {
    log(
        Level::Error,
        Domain::Model,
        "train_failed",
        obj(&[("history_len", json!(history_len)), ("msg", v_str(error))]),
    );
}

pub fn log_model_io(op: &str, path: &str, found: bool) {
    log(
        Level::Info,
        Domain::Storage,
        op,
        obj(&[("path", v_str(path)), ("found", json!(found))]),
    );
}

pub fn log_model_io_error(op: &str, path: &str, error: &str) {
    log(
        Level::Error,
        Domain::Storage,
        op,
        obj(&[("path", v_str(path)), ("msg", v_str(error))]),
    );
}

pub fn log_system(event: &str, fields: &[(&str, Value)]) {
    log(Level::Info, Domain::System, event, obj(fields));
}

// =============================================================================
// Field helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    module: &'static str,
    label: &'static str,
    started: Instant,
}

impl ProfileScope {
    pub fn new(module: &'static str, label: &'static str) -> Self {
        Self { module, label, started: Instant::now() }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        log(
            Level::Trace,
            Domain::Profile,
            "profile",
            obj(&[
                ("module", v_str(self.module)),
                ("label", v_str(self.label)),
                ("elapsed_ms", v_num(elapsed_ms)),
            ]),
        );
    }
}
