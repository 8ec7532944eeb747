use regex::Regex;

use crate::config::{Config, HeuristicConfig};
use crate::domain;
use crate::domain_age::DomainAgeChecker;
use crate::probes::{DnsChecker, PageProbe, ProbeOutcome};

/// Width of the numeric feature vector. This is a positional contract with
/// the trained model and must be preserved exactly.
pub const FEATURE_WIDTH: usize = 87;

/// Named feature slots, in wire order. Slots 16..36 are reserved zeros kept
/// for compatibility with the training data layout; everything past
/// `DNS_LOOKUP_FAILED` is zero padding up to `FEATURE_WIDTH`.
pub mod slot {
    pub const URL_LENGTH: usize = 0;
    pub const HOSTNAME_LENGTH: usize = 1;
    pub const CONTAINS_IP: usize = 2;
    pub const NB_DOTS: usize = 3;
    pub const NB_HYPHENS: usize = 4;
    pub const HAS_AT_SYMBOL: usize = 5;
    pub const USES_HTTPS: usize = 6;
    pub const DIGIT_RATIO: usize = 7;
    pub const IS_SHORTENER: usize = 8;
    pub const DOMAIN_AGE: usize = 9;
    pub const SUSPICIOUS_WORD_COUNT: usize = 10;
    pub const SUSPICIOUS_TLD: usize = 11;
    pub const PATH_LENGTH: usize = 12;
    pub const NB_SUBDOMAINS: usize = 13;
    pub const NB_QUERY_MARK: usize = 14;
    pub const HTTP_TOKEN_IN_PATH: usize = 15;
    pub const EMPTY_TITLE: usize = 36;
    pub const DNS_LOOKUP_FAILED: usize = 37;
}

/// Every signal computed for a URL, by name. Produced once per scan and
/// immutable afterwards; no signal is ever omitted. Network-derived signals
/// (`domain_age`, `empty_title`, `dns_lookup_failed`) hold their conservative
/// defaults until the probes report in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalMap {
    pub contains_ip: bool,
    pub nb_dots: u32,
    pub nb_hyphens: u32,
    pub nb_query_mark: u32,
    pub has_at_symbol: bool,
    pub uses_https: bool,
    pub digit_ratio: f64,
    pub is_shortener: bool,
    /// Years since registration; 0 means recently registered or unknown.
    pub domain_age: u32,
    pub suspicious_word_count: u32,
    pub suspicious_tld: bool,
    pub path_length: u32,
    pub nb_subdomains: u32,
    pub empty_title: bool,
    pub dns_lookup_failed: bool,
}

/// Fixed-width numeric encoding of a URL for the model collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Encode a URL and its signal map into the fixed feature layout.
pub fn feature_vector(url: &str, signals: &SignalMap) -> FeatureVector {
    let mut features = vec![0.0; FEATURE_WIDTH];

    features[slot::URL_LENGTH] = url.len() as f64;
    features[slot::HOSTNAME_LENGTH] = domain::fqdn(url).map_or(0.0, |host| host.len() as f64);
    features[slot::CONTAINS_IP] = flag(signals.contains_ip);
    features[slot::NB_DOTS] = signals.nb_dots as f64;
    features[slot::NB_HYPHENS] = signals.nb_hyphens as f64;
    features[slot::HAS_AT_SYMBOL] = flag(signals.has_at_symbol);
    features[slot::USES_HTTPS] = flag(signals.uses_https);
    features[slot::DIGIT_RATIO] = signals.digit_ratio;
    features[slot::IS_SHORTENER] = flag(signals.is_shortener);
    features[slot::DOMAIN_AGE] = signals.domain_age as f64;
    features[slot::SUSPICIOUS_WORD_COUNT] = signals.suspicious_word_count as f64;
    features[slot::SUSPICIOUS_TLD] = flag(signals.suspicious_tld);
    features[slot::PATH_LENGTH] = signals.path_length as f64;
    features[slot::NB_SUBDOMAINS] = signals.nb_subdomains as f64;
    features[slot::NB_QUERY_MARK] = signals.nb_query_mark as f64;
    features[slot::HTTP_TOKEN_IN_PATH] = flag(http_token_in_path(url));
    features[slot::EMPTY_TITLE] = flag(signals.empty_title);
    features[slot::DNS_LOOKUP_FAILED] = flag(signals.dns_lookup_failed);

    FeatureVector(features)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

// Literal "http" appearing after the scheme separator, a classic embedded
// redirect marker (e.g. http://evil.com/http://bank.com).
fn http_token_in_path(url: &str) -> bool {
    url.split("://").last().is_some_and(|rest| rest.contains("http"))
}

/// Derives the signal map and feature vector for a URL. Lexical signals are
/// pure string work; the network-derived ones come from best-effort probes
/// that never raise past this boundary.
pub struct SignalExtractor {
    heuristics: HeuristicConfig,
    ip_pattern: Regex,
    dns: DnsChecker,
    page: PageProbe,
    ages: DomainAgeChecker,
}

impl SignalExtractor {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            heuristics: config.heuristics.clone(),
            ip_pattern: Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b")?,
            dns: DnsChecker::new(config.probe_timeout_seconds(), config.use_mock_probes()),
            page: PageProbe::new(config.probe_timeout_seconds(), config.use_mock_probes())?,
            ages: DomainAgeChecker::new(config.whois_timeout_seconds(), config.use_mock_probes()),
        })
    }

    pub async fn extract(&self, url: &str) -> (FeatureVector, SignalMap) {
        let url = url.trim();
        let mut signals = self.lexical_signals(url);
        let registrable = domain::registrable_domain(url);

        // Each probe is independently time-bounded and fail-safe; one
        // hanging or failing never blocks or fails the others.
        let (age, title, resolved) = tokio::join!(
            self.probe_domain_age(registrable.as_deref()),
            self.page.title(url),
            self.probe_dns(registrable.as_deref()),
        );

        signals.domain_age = age;
        // A failed fetch observes nothing and must not assert emptiness.
        signals.empty_title = matches!(&title, ProbeOutcome::Observed(t) if t.is_empty());
        signals.dns_lookup_failed = !resolved;

        (feature_vector(url, &signals), signals)
    }

    /// Pure-string signals; network fields keep their defaults.
    pub fn lexical_signals(&self, url: &str) -> SignalMap {
        let lower = url.to_lowercase();

        let digit_count = url.chars().filter(|c| c.is_ascii_digit()).count();
        let digit_ratio = if url.is_empty() {
            0.0
        } else {
            digit_count as f64 / url.len() as f64
        };

        let path_length = if url.contains('/') {
            url.splitn(4, '/').last().map_or(0, |rest| rest.len()) as u32
        } else {
            0
        };

        SignalMap {
            contains_ip: self.ip_pattern.is_match(url),
            nb_dots: url.matches('.').count() as u32,
            nb_hyphens: url.matches('-').count() as u32,
            nb_query_mark: url.matches('?').count() as u32,
            has_at_symbol: url.contains('@'),
            uses_https: lower.starts_with("https"),
            digit_ratio,
            is_shortener: self
                .heuristics
                .shorteners
                .iter()
                .any(|s| url.contains(s.as_str())),
            suspicious_word_count: self
                .heuristics
                .suspicious_keywords
                .iter()
                .filter(|w| lower.contains(w.as_str()))
                .count() as u32,
            suspicious_tld: self
                .heuristics
                .suspicious_tlds
                .iter()
                .any(|t| lower.contains(t.as_str())),
            path_length,
            nb_subdomains: domain::fqdn(url)
                .map_or(0, |host| host.matches('.').count() as u32),
            ..SignalMap::default()
        }
    }

    async fn probe_domain_age(&self, registrable: Option<&str>) -> u32 {
        match registrable {
            Some(domain) => self.ages.age_years(domain).await.observed().unwrap_or(0),
            None => 0,
        }
    }

    async fn probe_dns(&self, registrable: Option<&str>) -> bool {
        match registrable {
            Some(domain) => self.dns.resolves(domain).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_extractor() -> SignalExtractor {
        let mut config = Config::default();
        config.use_mock_probes = Some(true);
        SignalExtractor::new(&config).unwrap()
    }

    #[test]
    fn test_vector_width_is_fixed() {
        let extractor = mock_extractor();
        let very_long = "x".repeat(10_000);

        for url in ["", "https://example.com", very_long.as_str()] {
            let signals = extractor.lexical_signals(url);
            assert_eq!(feature_vector(url, &signals).len(), FEATURE_WIDTH);
        }
    }

    #[test]
    fn test_ip_login_url_signals() {
        let extractor = mock_extractor();
        let signals = extractor.lexical_signals("http://192.168.1.1/login/secure/verify");

        assert!(signals.contains_ip);
        assert_eq!(signals.suspicious_word_count, 3); // login, secure, verify
        assert!(!signals.uses_https);
        assert_eq!(signals.nb_dots, 3);
        assert_eq!(signals.path_length, "login/secure/verify".len() as u32);
        assert_eq!(signals.nb_subdomains, 0); // IP hosts have no fqdn
    }

    #[test]
    fn test_lexical_counts() {
        let extractor = mock_extractor();
        let signals =
            extractor.lexical_signals("https://a.b.example.com/path?q=1?again@user");

        assert!(signals.uses_https);
        assert_eq!(signals.nb_query_mark, 2);
        assert!(signals.has_at_symbol);
        assert_eq!(signals.nb_subdomains, 3);
        assert!(!signals.contains_ip);
    }

    #[test]
    fn test_digit_ratio() {
        let extractor = mock_extractor();

        assert_eq!(extractor.lexical_signals("").digit_ratio, 0.0);
        let signals = extractor.lexical_signals("ab12");
        assert!((signals.digit_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_denylist_signals() {
        let extractor = mock_extractor();

        assert!(extractor.lexical_signals("https://bit.ly/3xYz").is_shortener);
        assert!(!extractor.lexical_signals("https://example.com").is_shortener);

        let signals = extractor.lexical_signals("https://mybank-secure-login.tk");
        assert!(signals.suspicious_tld);
        assert_eq!(signals.suspicious_word_count, 3); // bank, secure, login
        assert_eq!(signals.nb_hyphens, 2);
    }

    #[test]
    fn test_http_token_in_path() {
        assert!(http_token_in_path("http://evil.com/http://bank.com"));
        assert!(!http_token_in_path("https://example.com/page"));
    }

    #[test]
    fn test_named_slots() {
        let extractor = mock_extractor();
        let url = "http://192.168.1.1/login";
        let signals = extractor.lexical_signals(url);
        let features = feature_vector(url, &signals);

        assert_eq!(features.as_slice()[slot::CONTAINS_IP], 1.0);
        assert_eq!(features.as_slice()[slot::URL_LENGTH], url.len() as f64);
        assert_eq!(features.as_slice()[slot::HOSTNAME_LENGTH], 0.0);
        assert_eq!(features.as_slice()[slot::SUSPICIOUS_WORD_COUNT], 1.0);
        // Reserved block stays zeroed.
        assert!(features.as_slice()[16..36].iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_extraction_is_idempotent() {
        let extractor = mock_extractor();
        let url = "https://mail.example.com/login";

        let (features_a, signals_a) = extractor.extract(url).await;
        let (features_b, signals_b) = extractor.extract(url).await;

        assert_eq!(signals_a, signals_b);
        assert_eq!(features_a, features_b);
    }

    #[tokio::test]
    async fn test_probe_defaults() {
        let extractor = mock_extractor();

        // Fetch failure does not assert an empty title.
        let (_, signals) = extractor.extract("https://unreachable.example.com").await;
        assert!(!signals.empty_title);

        // An observed empty title does.
        let (_, signals) = extractor.extract("https://no-title.example.com").await;
        assert!(signals.empty_title);

        // IP hosts have no registrable domain to resolve.
        let (_, signals) = extractor.extract("http://192.168.1.1/x").await;
        assert!(signals.dns_lookup_failed);
        assert_eq!(signals.domain_age, 0);

        // Known mock domain: resolves, with a recorded age.
        let (_, signals) = extractor.extract("https://www.google.com").await;
        assert!(!signals.dns_lookup_failed);
        assert_eq!(signals.domain_age, 27);
    }
}
