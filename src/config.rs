use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_path: String,
    /// Optional JSON weight file for the URL model. Built-in weights are used
    /// when unset or unreadable.
    pub model_path: Option<String>,
    pub probe_timeout_seconds: Option<u64>,
    pub whois_timeout_seconds: Option<u64>,
    /// Answer network probes from canned data instead of the network.
    pub use_mock_probes: Option<bool>,
    pub heuristics: HeuristicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicConfig {
    pub shorteners: Vec<String>,
    pub suspicious_keywords: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub trusted_brands: Vec<String>,
    pub weights: SignalWeights,
}

/// Per-signal point contributions for the risk scorer. The heuristic sum is
/// capped at `heuristic_cap` so the model probability stays the primary term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    pub contains_ip: u32,
    pub is_shortener: u32,
    pub young_domain: u32,
    pub suspicious_words: u32,
    pub suspicious_words_cap: u32,
    pub dns_lookup_failed: u32,
    pub empty_title: u32,
    pub many_subdomains: u32,
    pub has_at_symbol: u32,
    pub digit_ratio: u32,
    pub suspicious_tld: u32,
    pub heuristic_cap: u32,
    pub digit_ratio_threshold: f64,
    pub subdomain_threshold: u32,
    pub young_domain_years: u32,
    /// Model confidence below which a phishing verdict is downgraded.
    pub downgrade_confidence: f64,
    /// Model confidence at or above which the trusted-brand override no
    /// longer applies.
    pub override_confidence: f64,
    /// Risk score ceiling applied by the trusted-brand override.
    pub override_score_cap: u32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        SignalWeights {
            contains_ip: 10,
            is_shortener: 12,
            young_domain: 8,
            suspicious_words: 6,
            suspicious_words_cap: 12,
            dns_lookup_failed: 8,
            empty_title: 4,
            many_subdomains: 4,
            has_at_symbol: 6,
            digit_ratio: 6,
            suspicious_tld: 6,
            heuristic_cap: 30,
            digit_ratio_threshold: 0.2,
            subdomain_threshold: 3,
            young_domain_years: 1,
            downgrade_confidence: 0.75,
            override_confidence: 0.85,
            override_score_cap: 20,
        }
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            shorteners: vec![
                "bit.ly".to_string(),
                "tinyurl".to_string(),
                "goo.gl".to_string(),
                "t.co".to_string(),
                "ow.ly".to_string(),
            ],
            suspicious_keywords: vec![
                "login".to_string(),
                "verify".to_string(),
                "secure".to_string(),
                "account".to_string(),
                "update".to_string(),
                "bank".to_string(),
                "confirm".to_string(),
                "signin".to_string(),
                "reset".to_string(),
            ],
            suspicious_tlds: vec![
                ".tk".to_string(),
                ".pw".to_string(),
                ".ml".to_string(),
                ".gq".to_string(),
            ],
            trusted_brands: vec![
                "paypal.com".to_string(),
                "google.com".to_string(),
                "amazon.com".to_string(),
                "microsoft.com".to_string(),
                "apple.com".to_string(),
                "github.com".to_string(),
                "youtube.com".to_string(),
                "facebook.com".to_string(),
                "linkedin.com".to_string(),
                "bankofamerica.com".to_string(),
            ],
            weights: SignalWeights::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "127.0.0.1:8000".to_string(),
            database_path: "/var/lib/phishguard/scans.db".to_string(),
            model_path: None,
            probe_timeout_seconds: Some(3),
            whois_timeout_seconds: Some(10),
            use_mock_probes: Some(false),
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn probe_timeout_seconds(&self) -> u64 {
        self.probe_timeout_seconds.unwrap_or(3)
    }

    pub fn whois_timeout_seconds(&self) -> u64 {
        self.whois_timeout_seconds.unwrap_or(10)
    }

    pub fn use_mock_probes(&self) -> bool {
        self.use_mock_probes.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_match_scoring_table() {
        let w = SignalWeights::default();
        assert_eq!(w.contains_ip, 10);
        assert_eq!(w.is_shortener, 12);
        assert_eq!(w.suspicious_words_cap, 12);
        assert_eq!(w.heuristic_cap, 30);
        assert_eq!(w.override_score_cap, 20);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.listen_addr, config.listen_addr);
        assert_eq!(
            parsed.heuristics.trusted_brands,
            config.heuristics.trusted_brands
        );
        assert_eq!(parsed.heuristics.weights.heuristic_cap, 30);
    }

    #[test]
    fn test_partial_yaml_uses_option_defaults() {
        let yaml = r#"
listen_addr: "0.0.0.0:9000"
database_path: "/tmp/scans.db"
heuristics:
  shorteners: ["bit.ly"]
  suspicious_keywords: ["login"]
  suspicious_tlds: [".tk"]
  trusted_brands: ["paypal.com"]
  weights:
    contains_ip: 10
    is_shortener: 12
    young_domain: 8
    suspicious_words: 6
    suspicious_words_cap: 12
    dns_lookup_failed: 8
    empty_title: 4
    many_subdomains: 4
    has_at_symbol: 6
    digit_ratio: 6
    suspicious_tld: 6
    heuristic_cap: 30
    digit_ratio_threshold: 0.2
    subdomain_threshold: 3
    young_domain_years: 1
    downgrade_confidence: 0.75
    override_confidence: 0.85
    override_score_cap: 20
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.probe_timeout_seconds(), 3);
        assert_eq!(config.whois_timeout_seconds(), 10);
        assert!(!config.use_mock_probes());
    }
}
