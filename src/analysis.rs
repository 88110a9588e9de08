//! Short-window moving-average heuristic over the result history.

/// Shown until the default window of 5 can be filled.
pub const NEED_MORE_DATA: &str = "Enter at least 5 results to see the analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Favorable,
    Wait,
}

impl Recommendation {
    pub fn advice(&self) -> &'static str {
        match self {
            Recommendation::Favorable => "It is a good moment to bet.",
            Recommendation::Wait => "It is better to wait.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Favorable => "favorable",
            Recommendation::Wait => "wait",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Analysis {
    NeedMoreData { have: usize, need: usize },
    Ready { window: usize, mean: f64, recommendation: Recommendation },
}

impl Analysis {
    pub fn line(&self) -> String {
        match self {
            Analysis::NeedMoreData { need, .. } => {
                format!("Enter at least {} results to see the analysis.", need)
            }
            Analysis::Ready { window, mean, recommendation } => format!(
                "Average of the last {} results: {:.2}x. {}",
                window,
                mean,
                recommendation.advice()
            ),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        match self {
            Analysis::Ready { mean, .. } => Some(*mean),
            Analysis::NeedMoreData { .. } => None,
        }
    }
}

/// Arithmetic mean of the most recent `window` values, `None` if fewer exist.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let recent = &values[values.len() - window..];
    Some(recent.iter().sum::<f64>() / window as f64)
}

/// Mean > threshold is favorable; equality waits.
pub fn classify(mean: f64, threshold: f64) -> Recommendation {
    if mean > threshold {
        Recommendation::Favorable
    } else {
        Recommendation::Wait
    }
}

pub fn analyze(values: &[f64], window: usize, threshold: f64) -> Analysis {
    match trailing_mean(values, window) {
        Some(mean) => Analysis::Ready {
            window,
            mean,
            recommendation: classify(mean, threshold),
        },
        None => Analysis::NeedMoreData {
            have: values.len(),
            need: window,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_need_more_data_below_window() {
        for n in 0..5 {
            let values = vec![3.0; n];
            let a = analyze(&values, 5, 2.0);
            assert_eq!(a, Analysis::NeedMoreData { have: n, need: 5 });
            assert_eq!(a.line(), NEED_MORE_DATA);
        }
    }

    #[test]
    fn test_mean_of_five_favorable() {
        let a = analyze(&[1.0, 3.0, 5.0, 2.0, 8.0], 5, 2.0);
        let mean = a.mean().unwrap();
        assert!((mean - 3.8).abs() < 1e-12);
        assert!(matches!(a, Analysis::Ready { recommendation: Recommendation::Favorable, .. }));
        assert_eq!(a.line(), "Average of the last 5 results: 3.80x. It is a good moment to bet.");
    }

    #[test]
    fn test_only_last_window_counts() {
        // 100.0 drops out of the window once five newer values arrive.
        let a = analyze(&[100.0, 1.0, 1.0, 1.0, 1.0, 1.0], 5, 2.0);
        assert_eq!(a.mean(), Some(1.0));
        assert!(matches!(a, Analysis::Ready { recommendation: Recommendation::Wait, .. }));
    }

    #[test]
    fn test_boundary_mean_equal_threshold_waits() {
        assert_eq!(classify(2.0, 2.0), Recommendation::Wait);
        assert_eq!(classify(2.0001, 2.0), Recommendation::Favorable);
        let a = analyze(&[2.0; 5], 5, 2.0);
        assert!(a.line().ends_with("It is better to wait."));
    }

    #[test]
    fn test_trailing_mean_zero_window() {
        assert_eq!(trailing_mean(&[1.0, 2.0], 0), None);
    }
}
