use crate::config::SignalWeights;
use crate::features::SignalMap;

/// Blend the model probability with weighted heuristic signals into a
/// 0-100 risk score.
///
/// The model carries the majority weight (`probability * 70`); signal
/// contributions are evaluated independently and their sum is capped at
/// `heuristic_cap`, so strong heuristic agreement can raise a low-confidence
/// score but never dominate the model.
pub fn risk_score(probability: f64, signals: &SignalMap, weights: &SignalWeights) -> u8 {
    let base = probability * 70.0;

    let mut heuristic = 0.0f64;

    if signals.contains_ip {
        heuristic += weights.contains_ip as f64;
    }
    if signals.is_shortener {
        heuristic += weights.is_shortener as f64;
    }
    if signals.domain_age > 0 && signals.domain_age < weights.young_domain_years {
        heuristic += weights.young_domain as f64;
    }
    if signals.suspicious_word_count >= 1 {
        heuristic += (weights.suspicious_words * signals.suspicious_word_count)
            .min(weights.suspicious_words_cap) as f64;
    }
    if signals.dns_lookup_failed {
        heuristic += weights.dns_lookup_failed as f64;
    }
    if signals.empty_title {
        heuristic += weights.empty_title as f64;
    }
    if signals.nb_subdomains >= weights.subdomain_threshold {
        heuristic += weights.many_subdomains as f64;
    }
    if signals.has_at_symbol {
        heuristic += weights.has_at_symbol as f64;
    }
    if signals.digit_ratio > weights.digit_ratio_threshold {
        heuristic += weights.digit_ratio as f64;
    }
    if signals.suspicious_tld {
        heuristic += weights.suspicious_tld as f64;
    }

    heuristic = heuristic.min(weights.heuristic_cap as f64);

    (base + heuristic).clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> SignalWeights {
        SignalWeights::default()
    }

    #[test]
    fn test_quiet_signals_score_model_only() {
        let signals = SignalMap::default();

        for p in [0.0, 0.1, 0.25, 0.5, 0.75, 0.99, 1.0] {
            assert_eq!(
                risk_score(p, &signals, &weights()),
                (p * 70.0).round() as u8
            );
        }
    }

    #[test]
    fn test_heuristic_contribution_is_capped_at_30() {
        // Every signal firing at once.
        let signals = SignalMap {
            contains_ip: true,
            is_shortener: true,
            suspicious_word_count: 5,
            dns_lookup_failed: true,
            empty_title: true,
            nb_subdomains: 4,
            has_at_symbol: true,
            digit_ratio: 0.5,
            suspicious_tld: true,
            ..SignalMap::default()
        };

        assert_eq!(risk_score(0.0, &signals, &weights()), 30);
        assert_eq!(risk_score(1.0, &signals, &weights()), 100);
    }

    #[test]
    fn test_keyword_points_cap() {
        let mut signals = SignalMap {
            suspicious_word_count: 1,
            ..SignalMap::default()
        };
        assert_eq!(risk_score(0.0, &signals, &weights()), 6);

        signals.suspicious_word_count = 2;
        assert_eq!(risk_score(0.0, &signals, &weights()), 12);

        // Three or more keywords stay at the 12-point cap.
        signals.suspicious_word_count = 7;
        assert_eq!(risk_score(0.0, &signals, &weights()), 12);
    }

    #[test]
    fn test_unknown_domain_age_adds_no_points() {
        // Age 0 means "recent or unknown"; the weight-table condition
        // requires a known (non-zero) age below the threshold, so the
        // default threshold of one year can never add points for it.
        let signals = SignalMap {
            domain_age: 0,
            ..SignalMap::default()
        };
        assert_eq!(risk_score(0.0, &signals, &weights()), 0);
    }

    #[test]
    fn test_young_domain_points_with_raised_threshold() {
        let mut w = weights();
        w.young_domain_years = 3;

        let signals = SignalMap {
            domain_age: 2,
            ..SignalMap::default()
        };
        assert_eq!(risk_score(0.0, &signals, &w), 8);

        let signals = SignalMap {
            domain_age: 5,
            ..SignalMap::default()
        };
        assert_eq!(risk_score(0.0, &signals, &w), 0);
    }

    #[test]
    fn test_threshold_edges() {
        let signals = SignalMap {
            digit_ratio: 0.2,
            nb_subdomains: 2,
            ..SignalMap::default()
        };
        // Exactly at the ratio threshold does not fire; one below the
        // subdomain threshold does not fire.
        assert_eq!(risk_score(0.0, &signals, &weights()), 0);

        let signals = SignalMap {
            digit_ratio: 0.21,
            nb_subdomains: 3,
            ..SignalMap::default()
        };
        assert_eq!(risk_score(0.0, &signals, &weights()), 10);
    }

    #[test]
    fn test_ip_login_scenario_score() {
        // http://192.168.1.1/login/secure/verify with model 0.92:
        // base 64.4, heuristics ip(10) + keywords(12 cap) + dns(8) +
        // digit ratio(6) = 36 -> capped at 30; total 94.
        let signals = SignalMap {
            contains_ip: true,
            suspicious_word_count: 3,
            dns_lookup_failed: true,
            digit_ratio: 9.0 / 37.0,
            ..SignalMap::default()
        };

        assert_eq!(risk_score(0.92, &signals, &weights()), 94);
    }
}
