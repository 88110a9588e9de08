//! Replay a list of results through the session pipeline.
//!
//! Reads one value per line from stdin (blank lines and `#` comments are
//! skipped), retrains after every append once the history is long enough,
//! and prints the final analysis and prediction lines.
//!
//! Usage: replay < results.txt

use std::io::{self, BufRead};

use anyhow::Result;

use multiplierlab::dashboard;
use multiplierlab::model::{train_and_predict, ModelStore};
use multiplierlab::session::App;
use multiplierlab::state::Config;

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let slot = ModelStore::new(&cfg.model_dir, &cfg.model_key);
    let fit = cfg.fit_config();
    let mut app = App::new(&cfg);
    let mut rejected = 0usize;
    let mut failed_fits = 0usize;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let out = match app.submit(trimmed) {
            Ok(out) => out,
            Err(err) => {
                eprintln!("skipping {:?}: {}", trimmed, err);
                rejected += 1;
                continue;
            }
        };
        if let Some(history) = out.retrain {
            match train_and_predict(&history, &fit, &slot) {
                Ok(forecast) => app.apply_forecast(&forecast),
                Err(err) => {
                    eprintln!("fit at #{} failed: {}", out.index, err);
                    failed_fits += 1;
                }
            }
        }
    }

    println!("results={} rejected={} fits={} failed_fits={}", app.len(), rejected, app.retrain_requests(), failed_fits);
    println!("{}", app.analysis_line());
    if !app.prediction_line().is_empty() {
        println!("{}", app.prediction_line());
    }
    if std::env::var("DASHBOARD_PATH").is_ok() {
        dashboard::write(&app, &cfg.dashboard_path)?;
        println!("dashboard written to {}", cfg.dashboard_path.display());
    }
    Ok(())
}
