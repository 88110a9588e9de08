use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use multiplierlab::bootstrap::{bootstrap, ModelLoad};
use multiplierlab::feed::HttpResultSource;
use multiplierlab::logging::{log_system, v_str};
use multiplierlab::model::ModelStore;
use multiplierlab::repl::{self, print_help};
use multiplierlab::session::App;
use multiplierlab::state::Config;
use multiplierlab::trainer::Retrainer;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let slot = ModelStore::new(&cfg.model_dir, &cfg.model_key);
    let fit = cfg.fit_config();
    let mut app = App::new(&cfg);

    log_system(
        "startup",
        &[
            ("api_url", v_str(&cfg.api_url)),
            ("model_slot", v_str(&slot.path().display().to_string())),
        ],
    );

    let source = HttpResultSource::new(&cfg);
    let boot = bootstrap(&mut app, &source, &fit, &slot, cfg.min_train_len).await;
    println!("[{}] {} result(s) loaded", app.status.label(), boot.seeded);
    if let Some(Err(err)) = &boot.trained {
        eprintln!("initial training failed: {}", err);
    }
    if boot.model == ModelLoad::Unreadable {
        eprintln!("model slot {} is unreadable", slot.path().display());
    }
    println!("{}", app.prediction_line());
    print_help();

    let (mut retrainer, mut outcomes) = Retrainer::new(fit, slot);
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let session = repl::run(lines, &mut app, &mut retrainer, &mut outcomes, &cfg).await;

    log_system(
        "shutdown",
        &[
            ("history_len", json!(app.len())),
            ("fits", json!(retrainer.started())),
            ("coalesced", json!(retrainer.coalesced())),
            ("clean", json!(session.is_ok())),
        ],
    );
    session?;
    Ok(())
}
