use serde::{Deserialize, Serialize};

use crate::config::{HeuristicConfig, SignalWeights};
use crate::features::SignalMap;

/// Final human-facing verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Legitimate,
    Suspicious,
    Phishing,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Legitimate => "Legitimate",
            Label::Suspicious => "Suspicious",
            Label::Phishing => "Phishing",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub label: Label,
    pub risk_score: u8,
    pub reasons: Vec<String>,
}

/// Map the model's raw label token onto the binary phishing/legitimate
/// split. Anything outside the known positive tokens is legitimate.
pub fn normalize_label(raw: &str) -> Label {
    match raw.trim().to_lowercase().as_str() {
        "1" | "phishing" | "phish" | "malicious" => Label::Phishing,
        _ => Label::Legitimate,
    }
}

/// Turn (raw label, probability, signals, risk score) into the final label
/// with its explanation, applying the policy overrides in precedence order:
/// low-confidence downgrade first, trusted-brand override last.
pub fn decide(
    raw_label: &str,
    probability: f64,
    signals: &SignalMap,
    risk_score: u8,
    url: &str,
    heuristics: &HeuristicConfig,
) -> Decision {
    let weights = &heuristics.weights;
    let mut label = normalize_label(raw_label);

    // A phishing call the model is not sure about is only suspicious. Never
    // promoted back.
    if label == Label::Phishing && probability < weights.downgrade_confidence {
        label = Label::Suspicious;
    }

    let mut reasons = assemble_reasons(signals, weights);
    if label == Label::Phishing && reasons.is_empty() {
        // A phishing verdict must never ship with zero explanation.
        reasons.push("Model prediction indicates phishing".to_string());
    }

    let mut score = risk_score;

    // Trusted-brand override, evaluated last: the signal set is not
    // brand-aware and misfires on well-known domains under marginal
    // confidence. Very high model confidence still wins.
    let url_lower = url.to_lowercase();
    let brand_match = heuristics
        .trusted_brands
        .iter()
        .any(|brand| url_lower.contains(brand.as_str()));
    if brand_match && probability < weights.override_confidence {
        label = Label::Legitimate;
        reasons = vec!["Trusted global brand override".to_string()];
        score = score.min(weights.override_score_cap as u8);
    }

    Decision {
        label,
        risk_score: score,
        reasons,
    }
}

/// One fixed sentence per triggering signal, in the signal table's order.
/// Thresholds match the risk scorer's, except domain age: "registered
/// recently" also covers age 0, which the scorer treats as unknown.
fn assemble_reasons(signals: &SignalMap, weights: &SignalWeights) -> Vec<String> {
    let mut reasons = Vec::new();

    if signals.contains_ip {
        reasons.push("URL contains an IP address".to_string());
    }
    if signals.is_shortener {
        reasons.push("Uses a URL shortening service".to_string());
    }
    if signals.domain_age < weights.young_domain_years {
        reasons.push("Domain was registered recently".to_string());
    }
    if signals.suspicious_word_count >= 1 {
        reasons.push("Suspicious keywords in URL".to_string());
    }
    if signals.dns_lookup_failed {
        reasons.push("Domain DNS lookup failed".to_string());
    }
    if signals.empty_title {
        reasons.push("Page has empty title".to_string());
    }
    if signals.nb_subdomains >= weights.subdomain_threshold {
        reasons.push("Many subdomains (possible squat)".to_string());
    }
    if signals.has_at_symbol {
        reasons.push("Contains '@' symbol".to_string());
    }
    if signals.digit_ratio > weights.digit_ratio_threshold {
        reasons.push("High digit ratio in URL".to_string());
    }
    if signals.suspicious_tld {
        reasons.push("Suspicious TLD".to_string());
    }

    reasons
}
