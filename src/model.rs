use serde::{Deserialize, Serialize};

use crate::features::{slot, FEATURE_WIDTH};

/// Raw model output: a label token plus one probability per class. The
/// pipeline takes the maximum class probability as its confidence value.
#[derive(Debug, Clone)]
pub struct ModelPrediction {
    pub label: String,
    pub probabilities: Vec<f64>,
}

impl ModelPrediction {
    pub fn confidence(&self) -> f64 {
        self.probabilities.iter().copied().fold(0.0, f64::max)
    }
}

/// Boundary to the statistical classifier. Implementations consume the
/// fixed-width feature vector and must not fail; the decision engine treats
/// the returned label as an untrusted token and re-normalizes it.
pub trait UrlModel: Send + Sync {
    fn predict(&self, features: &[f64]) -> ModelPrediction;
}

/// Logistic regression over the named feature slots. Weight files are plain
/// JSON so retrained coefficients can be dropped in without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default = "default_positive_label")]
    pub positive_label: String,
    #[serde(default = "default_negative_label")]
    pub negative_label: String,
}

fn default_positive_label() -> String {
    "phishing".to_string()
}

fn default_negative_label() -> String {
    "legitimate".to_string()
}

impl LinearModel {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let model: LinearModel = serde_json::from_str(&content)?;
        Ok(model)
    }

    /// Load the weight file if configured and readable, otherwise fall back
    /// to the built-in coefficients.
    pub fn load_or_default(path: Option<&str>) -> Self {
        match path {
            Some(path) => match Self::from_file(path) {
                Ok(model) => {
                    log::info!("Loaded model weights from {path}");
                    model
                }
                Err(e) => {
                    log::warn!("Could not load model weights from {path}: {e}; using built-in weights");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}

impl Default for LinearModel {
    fn default() -> Self {
        // Hand-tuned coefficients on the named slots. Counts and lengths get
        // small weights, strong phishing markers large positive ones, and
        // trust markers (https, an established registration) negative ones.
        let mut weights = vec![0.0; FEATURE_WIDTH];
        weights[slot::URL_LENGTH] = 0.004;
        weights[slot::HOSTNAME_LENGTH] = 0.01;
        weights[slot::CONTAINS_IP] = 1.6;
        weights[slot::NB_DOTS] = 0.08;
        weights[slot::NB_HYPHENS] = 0.12;
        weights[slot::HAS_AT_SYMBOL] = 1.1;
        weights[slot::USES_HTTPS] = -0.9;
        weights[slot::DIGIT_RATIO] = 2.2;
        weights[slot::IS_SHORTENER] = 1.3;
        weights[slot::DOMAIN_AGE] = -0.3;
        weights[slot::SUSPICIOUS_WORD_COUNT] = 0.85;
        weights[slot::SUSPICIOUS_TLD] = 1.4;
        weights[slot::PATH_LENGTH] = 0.003;
        weights[slot::NB_SUBDOMAINS] = 0.35;
        weights[slot::NB_QUERY_MARK] = 0.25;
        weights[slot::HTTP_TOKEN_IN_PATH] = 0.2;
        weights[slot::EMPTY_TITLE] = 0.6;
        weights[slot::DNS_LOOKUP_FAILED] = 0.9;

        LinearModel {
            weights,
            bias: -2.4,
            positive_label: default_positive_label(),
            negative_label: default_negative_label(),
        }
    }
}

impl UrlModel for LinearModel {
    fn predict(&self, features: &[f64]) -> ModelPrediction {
        let z: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        let p = sigmoid(z);

        let label = if p >= 0.5 {
            self.positive_label.clone()
        } else {
            self.negative_label.clone()
        };

        ModelPrediction {
            label,
            probabilities: vec![1.0 - p, p],
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
