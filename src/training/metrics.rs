//! Evaluation metrics over VW's progressive predictions.
//!
//! ## Metrics Overview
//!
//! | Metric | What it measures                                  | Better |
//! |--------|---------------------------------------------------|--------|
//! | acc    | Fraction of examples predicted correctly          | higher |
//! | acc_w  | Same, each example counted by its metric weight   | higher |
//! | mse    | Mean squared error of the raw prediction          | lower  |
//! | mse_w  | Metric-weighted mean squared error                | lower  |
//!
//! ## Correctness
//!
//! When every label is -1 or 1 the task is binary and a prediction counts
//! as class 1 when it is positive. Otherwise predictions are rounded to the
//! nearest integer and compared with the label (multiclass output).
//!
//! Unweighted metrics ignore metric weights entirely; weights only ever
//! move the `_w` variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Acc,
    AccW,
    Mse,
    MseW,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Acc, Metric::AccW, Metric::Mse, Metric::MseW];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Acc => "acc",
            Metric::AccW => "acc_w",
            Metric::Mse => "mse",
            Metric::MseW => "mse_w",
        }
    }

    /// Lower values are better.
    pub fn is_loss(self) -> bool {
        matches!(self, Metric::Mse | Metric::MseW)
    }

    pub fn is_weighted(self) -> bool {
        matches!(self, Metric::AccW | Metric::MseW)
    }

    /// Whether `candidate` strictly improves on `incumbent`.
    ///
    /// NaN never improves on anything and anything finite improves on NaN.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        if incumbent.is_nan() {
            return true;
        }
        if self.is_loss() {
            candidate < incumbent
        } else {
            candidate > incumbent
        }
    }

    /// Parse a comma separated list such as `acc,acc_w`.
    pub fn parse_list(s: &str) -> Result<Vec<Metric>> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Metric::from_str)
            .collect()
    }

    /// Compute this metric over aligned labels, predictions and weights.
    pub fn compute(self, task: Task, labels: &[f64], predictions: &[f64], weights: &[f64]) -> f64 {
        let weights = if self.is_weighted() { Some(weights) } else { None };
        match self {
            Metric::Acc | Metric::AccW => accuracy(task, labels, predictions, weights),
            Metric::Mse | Metric::MseW => mean_squared_error(labels, predictions, weights),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::UnknownMetric(s.to_string()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How predictions are mapped to classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Labels are -1/1, prediction sign decides
    Binary,
    /// Prediction rounded to the nearest integer
    Multiclass,
}

impl Task {
    pub fn infer(labels: &[f64]) -> Self {
        if !labels.is_empty() && labels.iter().all(|&l| l == 1.0 || l == -1.0) {
            Task::Binary
        } else {
            Task::Multiclass
        }
    }

    pub fn predicted_class(self, prediction: f64) -> f64 {
        match self {
            Task::Binary => {
                if prediction > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Task::Multiclass => prediction.round(),
        }
    }
}

/// (Weighted) fraction of correct predictions.
///
/// Returns 0.0 for empty input or zero total weight.
pub fn accuracy(task: Task, labels: &[f64], predictions: &[f64], weights: Option<&[f64]>) -> f64 {
    weighted_mean(labels.len(), weights, |i| {
        if task.predicted_class(predictions[i]) == labels[i] {
            1.0
        } else {
            0.0
        }
    })
}

/// (Weighted) mean squared error of raw predictions.
pub fn mean_squared_error(labels: &[f64], predictions: &[f64], weights: Option<&[f64]>) -> f64 {
    weighted_mean(labels.len(), weights, |i| (predictions[i] - labels[i]).powi(2))
}

fn weighted_mean(n: usize, weights: Option<&[f64]>, value: impl Fn(usize) -> f64) -> f64 {
    if n == 0 {
        return 0.0;
    }

    let weight = |i: usize| weights.map_or(1.0, |w| w[i]);
    let total_weight: f64 = (0..n).map(weight).sum();
    if total_weight == 0.0 {
        return 0.0;
    }

    (0..n).map(|i| value(i) * weight(i)).sum::<f64>() / total_weight
}

/// Score a set of predictions with every requested metric.
pub fn evaluate(
    metrics: &[Metric],
    labels: &[f64],
    predictions: &[f64],
    weights: &[f64],
) -> Result<Vec<(Metric, f64)>> {
    if predictions.len() != labels.len() {
        return Err(Error::PredictionCount {
            expected: labels.len(),
            found: predictions.len(),
        });
    }

    let task = Task::infer(labels);
    Ok(metrics
        .iter()
        .map(|&m| (m, m.compute(task, labels, predictions, weights)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [f64; 3] = [1.0, 1.0, 2.0];
    const WEIGHTS: [f64; 3] = [0.1, 1.0, 1.0];

    #[test]
    fn test_parse_list() {
        let metrics = Metric::parse_list("acc, acc_w").unwrap();
        assert_eq!(metrics, vec![Metric::Acc, Metric::AccW]);
        assert!(matches!(
            Metric::parse_list("acc,auc"),
            Err(Error::UnknownMetric(name)) if name == "auc"
        ));
    }

    #[test]
    fn test_accuracy_ignores_weights() {
        let preds = [1.0, 1.0, 1.0];
        let scores = evaluate(&[Metric::Acc, Metric::AccW], &LABELS, &preds, &[1.0; 3]).unwrap();
        assert!((scores[0].1 - 2.0 / 3.0).abs() < 1e-9);
        assert!((scores[1].1 - 2.0 / 3.0).abs() < 1e-9);

        let scores = evaluate(&[Metric::Acc, Metric::AccW], &LABELS, &preds, &WEIGHTS).unwrap();
        assert!((scores[0].1 - 2.0 / 3.0).abs() < 1e-9);
        assert!((scores[1].1 - 1.1 / 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_accuracy_low() {
        // Only the light example is right
        let preds = [1.0, 0.0, 0.0];
        let acc_w = accuracy(Task::Multiclass, &LABELS, &preds, Some(&WEIGHTS));
        assert!((acc_w - 0.1 / 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_binary_task_thresholds() {
        let labels = [1.0, -1.0, 1.0, -1.0];
        let preds = [0.3, -0.7, -0.1, 0.0];
        assert_eq!(Task::infer(&labels), Task::Binary);
        assert!((accuracy(Task::Binary, &labels, &preds, None) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_multiclass_rounding() {
        assert_eq!(Task::infer(&LABELS), Task::Multiclass);
        assert_eq!(Task::Multiclass.predicted_class(1.6), 2.0);
        assert_eq!(Task::Multiclass.predicted_class(1.4), 1.0);
    }

    #[test]
    fn test_mse() {
        let labels = [1.0, 2.0];
        let preds = [2.0, 2.0];
        assert!((mean_squared_error(&labels, &preds, None) - 0.5).abs() < 1e-9);
        assert!((mean_squared_error(&labels, &preds, Some(&[3.0, 1.0])) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_zero_weight() {
        assert_eq!(accuracy(Task::Binary, &[], &[], None), 0.0);
        assert_eq!(accuracy(Task::Binary, &[1.0], &[1.0], Some(&[0.0])), 0.0);
    }

    #[test]
    fn test_prediction_count_mismatch() {
        let err = evaluate(&[Metric::Acc], &LABELS, &[1.0], &WEIGHTS).unwrap_err();
        assert!(matches!(
            err,
            Error::PredictionCount {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn test_improves() {
        assert!(Metric::Acc.improves(0.7, 0.6));
        assert!(!Metric::Acc.improves(0.6, 0.6));
        assert!(Metric::Mse.improves(0.1, 0.2));
        assert!(!Metric::Mse.improves(f64::NAN, 0.2));
        assert!(Metric::Mse.improves(0.3, f64::NAN));
    }
}
