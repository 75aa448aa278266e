use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::encoding::LabelEncoders;
use crate::error::PredictError;

/// Two-class probability for the batting side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinProbability {
    pub loss: f64,
    pub win: f64,
}

impl WinProbability {
    pub fn certain_win() -> Self {
        Self { loss: 0.0, win: 1.0 }
    }

    pub fn certain_loss() -> Self {
        Self { loss: 1.0, win: 0.0 }
    }

    /// Builds a pair from raw class scores, normalised so the two sum to 1.
    pub fn from_scores(loss: f64, win: f64) -> Self {
        let loss = if loss.is_finite() { loss.max(0.0) } else { 0.0 };
        let win = if win.is_finite() { win.max(0.0) } else { 0.0 };
        let sum = loss + win;
        if sum <= 0.0 {
            return Self { loss: 0.5, win: 0.5 };
        }
        let win = win / sum;
        Self {
            loss: 1.0 - win,
            win,
        }
    }
}

/// An opaque trained classifier: feature vector in, (loss, win) out.
pub trait WinScorer: Send + Sync {
    fn feature_count(&self) -> usize;
    fn predict_proba(&self, features: &[f64]) -> Result<WinProbability, PredictError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl WinScorer for LogisticModel {
    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<WinProbability, PredictError> {
        if features.len() != self.coefficients.len() {
            return Err(PredictError::FeatureCount {
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        let win = sigmoid(z);
        Ok(WinProbability::from_scores(1.0 - win, win))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerSpec {
    Logistic(LogisticModel),
}

impl WinScorer for ScorerSpec {
    fn feature_count(&self) -> usize {
        match self {
            ScorerSpec::Logistic(m) => m.feature_count(),
        }
    }

    fn predict_proba(&self, features: &[f64]) -> Result<WinProbability, PredictError> {
        match self {
            ScorerSpec::Logistic(m) => m.predict_proba(features),
        }
    }
}

/// Everything a live request needs from training: one scorer and one feature list per innings,
/// plus the categorical encoders fitted on the training table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model_inn1: ScorerSpec,
    pub model_inn2: ScorerSpec,
    pub label_encoders: LabelEncoders,
    pub features_inn1: Vec<String>,
    pub features_inn2: Vec<String>,
}

impl ModelBundle {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read model bundle {}", path.display()))?;
        let bundle: ModelBundle = serde_json::from_str(&raw)
            .with_context(|| format!("parse model bundle {}", path.display()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_inn1.feature_count() != self.features_inn1.len() {
            return Err(anyhow!(
                "innings 1 model has {} coefficients for {} features",
                self.model_inn1.feature_count(),
                self.features_inn1.len()
            ));
        }
        if self.model_inn2.feature_count() != self.features_inn2.len() {
            return Err(anyhow!(
                "innings 2 model has {} coefficients for {} features",
                self.model_inn2.feature_count(),
                self.features_inn2.len()
            ));
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_sum_to_one() {
        let model = LogisticModel {
            intercept: -0.3,
            coefficients: vec![0.02, -0.4, 0.15],
        };
        for x in [[0.0, 0.0, 0.0], [150.0, 3.0, 8.2], [-20.0, 10.0, 0.0]] {
            let p = model.predict_proba(&x).unwrap();
            assert!((p.win + p.loss - 1.0).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&p.win));
        }
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let model = LogisticModel {
            intercept: 0.0,
            coefficients: vec![1.0, 1.0],
        };
        assert!(matches!(
            model.predict_proba(&[1.0]),
            Err(PredictError::FeatureCount { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn degenerate_scores_fall_back_to_even() {
        let p = WinProbability::from_scores(0.0, f64::NAN);
        assert_eq!(p, WinProbability { loss: 0.5, win: 0.5 });
    }

    #[test]
    fn bundle_parses_tagged_models() {
        let raw = r#"{
            "model_inn1": {"kind": "logistic", "intercept": 0.1, "coefficients": [0.5]},
            "model_inn2": {"kind": "logistic", "intercept": 0.0, "coefficients": [0.2, -0.1]},
            "label_encoders": {"venue": ["Eden Gardens"]},
            "features_inn1": ["runs_so_far"],
            "features_inn2": ["runs_so_far", "required_run_rate"]
        }"#;
        let bundle: ModelBundle = serde_json::from_str(raw).unwrap();
        bundle.validate().unwrap();
        assert_eq!(bundle.model_inn2.feature_count(), 2);
        assert_eq!(bundle.features_inn2, ["runs_so_far", "required_run_rate"]);
    }
}
