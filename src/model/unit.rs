//! Single dense unit (`y = w*x + b`) fitted with mini-batch SGD on MSE loss.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::model::TrainError;

#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs: u32,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Wall-clock budget, checked after each completed epoch.
    pub budget: Duration,
    pub seed: Option<u64>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.01,
            batch_size: 32,
            budget: Duration::from_secs(5),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub epochs_run: u32,
    pub final_loss: f64,
    pub stopped_early: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearUnit {
    pub weight: f64,
    pub bias: f64,
}

impl LinearUnit {
    pub fn new(weight: f64, bias: f64) -> Self {
        Self { weight, bias }
    }

    /// Glorot-uniform weight for a 1x1 kernel, zero bias.
    pub fn init<R: Rng>(rng: &mut R) -> Self {
        let limit = (6.0_f64 / 2.0).sqrt();
        Self {
            weight: rng.gen_range(-limit..=limit),
            bias: 0.0,
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }

    pub fn mse(&self, xs: &[f64], ys: &[f64]) -> f64 {
        if xs.is_empty() {
            return 0.0;
        }
        xs.iter()
            .zip(ys)
            .map(|(x, y)| (self.predict(*x) - y).powi(2))
            .sum::<f64>()
            / xs.len() as f64
    }

    /// One gradient step over a batch; returns the batch loss before the step.
    fn step(&mut self, xs: &[f64], ys: &[f64], batch: &[usize], lr: f64) -> f64 {
        let n = batch.len() as f64;
        let mut loss = 0.0;
        let mut grad_w = 0.0;
        let mut grad_b = 0.0;
        for &i in batch {
            let err = self.predict(xs[i]) - ys[i];
            loss += err * err;
            grad_w += 2.0 * err * xs[i];
            grad_b += 2.0 * err;
        }
        self.weight -= lr * grad_w / n;
        self.bias -= lr * grad_b / n;
        loss / n
    }
}

/// Fit a fresh unit on `(xs, ys)` pairs.
pub fn fit(xs: &[f64], ys: &[f64], cfg: &FitConfig) -> Result<(LinearUnit, FitReport), TrainError> {
    if xs.len() != ys.len() {
        return Err(TrainError::ShapeMismatch { inputs: xs.len(), targets: ys.len() });
    }
    if xs.is_empty() {
        return Err(TrainError::InsufficientData { have: 0, need: 1 });
    }

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut unit = LinearUnit::init(&mut rng);
    let mut order: Vec<usize> = (0..xs.len()).collect();
    let batch_size = cfg.batch_size.max(1);

    let started = Instant::now();
    let mut report = FitReport {
        epochs_run: 0,
        final_loss: unit.mse(xs, ys),
        stopped_early: false,
        elapsed: Duration::ZERO,
    };

    for epoch in 0..cfg.epochs {
        order.shuffle(&mut rng);
        let mut epoch_loss = 0.0;
        for batch in order.chunks(batch_size) {
            let batch_loss = unit.step(xs, ys, batch, cfg.learning_rate);
            epoch_loss += batch_loss * batch.len() as f64;
        }
        epoch_loss /= xs.len() as f64;

        if !unit.weight.is_finite() || !unit.bias.is_finite() || !epoch_loss.is_finite() {
            return Err(TrainError::Diverged { epoch: epoch + 1 });
        }

        report.epochs_run = epoch + 1;
        report.final_loss = epoch_loss;

        // A slow epoch can overshoot; the check only runs between epochs.
        if started.elapsed() >= cfg.budget && report.epochs_run < cfg.epochs {
            report.stopped_early = true;
            break;
        }
    }

    report.elapsed = started.elapsed();
    Ok((unit, report))
}
