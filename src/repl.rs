//! Interactive command loop over stdin lines and training outcomes.

use std::io::Write;

use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::dashboard;
use crate::model::PredictError;
use crate::present::render_tiles;
use crate::session::App;
use crate::state::Config;
use crate::trainer::{apply_outcome, drain, Retrainer, Submission, TrainOutcome};

enum Flow {
    Continue,
    Quit,
}

pub fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

pub fn print_help() {
    println!("Enter a result (e.g. 1.85) to log it.");
    println!("Commands: chart | tiles | status | export | help | quit");
}

fn report(result: Result<String, PredictError>) {
    match result {
        Ok(line) => println!("\n{}", line),
        Err(err) => eprintln!("\ntraining failed: {}", err),
    }
}

fn handle_line(line: &str, app: &mut App, retrainer: &mut Retrainer, cfg: &Config) -> Flow {
    match line.trim() {
        "" => {}
        "quit" | "exit" => return Flow::Quit,
        "help" => print_help(),
        "chart" => print!("{}", app.chart().render_text(40)),
        "tiles" => println!("{}", render_tiles(app.tiles())),
        "status" => {
            println!("{}", app.status.label());
            println!("{}", app.analysis_line());
            println!("{}", app.prediction_line());
            if let Some(next) = app.model_forecast() {
                println!("Current model on last result: {:.2}x", next);
            }
        }
        "export" => match dashboard::write(app, &cfg.dashboard_path) {
            Ok(()) => println!("dashboard written to {}", cfg.dashboard_path.display()),
            Err(err) => eprintln!("export failed: {:#}", err),
        },
        raw => match app.submit(raw) {
            Ok(out) => {
                println!("#{} {}", out.index, out.tile.ansi());
                println!("{}", app.analysis_line());
                if let Some(history) = out.retrain {
                    match retrainer.request(history) {
                        Submission::Started => println!("training on {} results...", out.index),
                        Submission::Queued => println!("training busy, queued latest history"),
                    }
                }
            }
            Err(err) => eprintln!("Please enter a valid result ({}).", err),
        },
    }
    Flow::Continue
}

/// Run until `quit`, end of input, or a read error. Pending fits are always
/// drained before returning, so their models reach the slot.
pub async fn run<R: AsyncBufRead + Unpin>(
    mut lines: Lines<R>,
    app: &mut App,
    retrainer: &mut Retrainer,
    outcomes: &mut UnboundedReceiver<TrainOutcome>,
    cfg: &Config,
) -> std::io::Result<()> {
    let mut read_error = None;
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        read_error = Some(err);
                        break;
                    }
                };
                if let Flow::Quit = handle_line(&line, app, retrainer, cfg) {
                    break;
                }
                prompt();
            }
            Some(outcome) = outcomes.recv() => {
                report(apply_outcome(app, outcome));
                retrainer.finished();
                prompt();
            }
        }
    }

    for result in drain(retrainer, outcomes, app).await {
        report(result);
    }

    match read_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
