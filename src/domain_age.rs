use anyhow::{anyhow, Result};
use chrono::{Datelike, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

use crate::probes::ProbeOutcome;

#[derive(Debug, Clone)]
struct CachedAge {
    age_years: Option<u32>,
    cached_at: SystemTime,
}

/// Looks up how many whole years ago a registrable domain was registered,
/// via WHOIS on TCP port 43. Results are cached per process; failures and
/// unknown domains are reported as `Failed` and scored by callers as the
/// conservative "recently registered / unknown" default.
#[derive(Debug, Clone)]
pub struct DomainAgeChecker {
    cache: Arc<RwLock<HashMap<String, CachedAge>>>,
    cache_ttl: Duration,
    timeout: Duration,
    use_mock: bool,
}

impl DomainAgeChecker {
    pub fn new(timeout_seconds: u64, use_mock: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl: Duration::from_secs(24 * 60 * 60), // 24 hours
            timeout: Duration::from_secs(timeout_seconds),
            use_mock,
        }
    }

    /// Age of the domain registration in whole years.
    pub async fn age_years(&self, domain: &str) -> ProbeOutcome<u32> {
        let domain = domain.to_lowercase();

        // WHOIS servers get queried with caller-supplied text; refuse
        // anything that does not look like a bare domain.
        if domain.is_empty()
            || !domain.contains('.')
            || !domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            log::debug!("Not a queryable domain: {domain}");
            return ProbeOutcome::Failed;
        }

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&domain) {
                let cache_age = SystemTime::now()
                    .duration_since(cached.cached_at)
                    .unwrap_or(Duration::from_secs(0));
                if cache_age < self.cache_ttl {
                    log::debug!("Using cached registration age for: {domain}");
                    return match cached.age_years {
                        Some(age) => ProbeOutcome::Observed(age),
                        None => ProbeOutcome::Failed,
                    };
                }
            }
        }

        let age_years = if self.use_mock {
            self.mock_age_years(&domain)
        } else {
            match self.fetch_age_years(&domain).await {
                Ok(age) => Some(age),
                Err(e) => {
                    log::debug!("WHOIS age lookup failed for {domain}: {e}");
                    None
                }
            }
        };

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                domain.clone(),
                CachedAge {
                    age_years,
                    cached_at: SystemTime::now(),
                },
            );
        }

        match age_years {
            Some(age) => ProbeOutcome::Observed(age),
            None => ProbeOutcome::Failed,
        }
    }

    async fn fetch_age_years(&self, domain: &str) -> Result<u32> {
        let server = Self::whois_server_for(domain);
        log::debug!("Using WHOIS server: {server} for domain: {domain}");

        match self.query_whois_server(server, domain).await {
            Ok(text) => {
                log::debug!("Got WHOIS response ({} chars)", text.len());
                self.age_from_whois_text(&text, domain)
            }
            Err(e) => {
                log::debug!("WHOIS query failed: {e}");
                self.try_fallback_whois_servers(domain).await
            }
        }
    }

    fn whois_server_for(domain: &str) -> &'static str {
        let tld = domain.split('.').next_back().unwrap_or(domain);

        match tld {
            "com" | "net" => "whois.verisign-grs.com",
            "org" => "whois.pir.org",
            "info" => "whois.afilias.net",
            "biz" => "whois.neulevel.biz",
            "uk" => "whois.nic.uk",
            "de" => "whois.denic.de",
            "tk" => "whois.dot.tk",
            "ml" => "whois.dot.ml",
            "gq" => "whois.dominio.gq",
            "pw" => "whois.nic.pw",
            _ => "whois.iana.org",
        }
    }

    /// Query a WHOIS server directly using TCP port 43
    async fn query_whois_server(&self, server: &str, domain: &str) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        log::debug!("Connecting to WHOIS server: {server}:43");

        let mut stream = timeout(self.timeout, TcpStream::connect(format!("{server}:43"))).await??;

        let query = format!("{domain}\r\n");
        stream.write_all(query.as_bytes()).await?;

        let mut response = String::new();
        timeout(self.timeout, stream.read_to_string(&mut response)).await??;

        if response.is_empty() {
            return Err(anyhow!("Empty WHOIS response"));
        }

        Ok(response)
    }

    async fn try_fallback_whois_servers(&self, domain: &str) -> Result<u32> {
        let fallback_servers = ["whois.iana.org", "whois.internic.net"];

        for server in fallback_servers {
            log::debug!("Trying fallback WHOIS server: {server}");
            match self.query_whois_server(server, domain).await {
                Ok(text) => {
                    if let Ok(age) = self.age_from_whois_text(&text, domain) {
                        return Ok(age);
                    }
                }
                Err(e) => {
                    log::debug!("Fallback server {server} failed: {e}");
                    continue;
                }
            }
        }

        Err(anyhow!("No WHOIS server returned a creation date"))
    }

    /// Parse the creation year out of a text WHOIS response and convert it
    /// to an age in whole calendar years.
    fn age_from_whois_text(&self, text: &str, domain: &str) -> Result<u32> {
        // Common labels for the registration date in WHOIS text
        let patterns = [
            r"(?i)creation\s*date[:\s]+([^\r\n]+)",
            r"(?i)created\s*on[:\s]+([^\r\n]+)",
            r"(?i)created[:\s]+([^\r\n]+)",
            r"(?i)registered\s*on[:\s]+([^\r\n]+)",
            r"(?i)registration\s*date[:\s]+([^\r\n]+)",
            r"(?i)domain\s*created[:\s]+([^\r\n]+)",
            r"(?i)registration_time[:\s]+([^\r\n]+)",
        ];

        for pattern in patterns {
            if let Ok(regex) = Regex::new(pattern) {
                if let Some(captures) = regex.captures(text) {
                    if let Some(date_match) = captures.get(1) {
                        let date_str = date_match.as_str().trim();
                        if let Some(year) = Self::parse_year(date_str) {
                            let age = (Utc::now().year() - year).max(0) as u32;
                            log::debug!(
                                "Creation date for {domain}: '{date_str}' ({age} years old)"
                            );
                            return Ok(age);
                        }
                        log::debug!("Could not parse date format: '{date_str}'");
                    }
                }
            }
        }

        Err(anyhow!("Could not parse creation date from WHOIS text"))
    }

    fn parse_year(date_str: &str) -> Option<i32> {
        let year_pattern = Regex::new(r"\b(19\d{2}|20\d{2})\b").ok()?;
        let year: i32 = year_pattern.captures(date_str)?.get(1)?.as_str().parse().ok()?;
        if year > Utc::now().year() {
            return None;
        }
        Some(year)
    }

    fn mock_age_years(&self, domain: &str) -> Option<u32> {
        log::debug!("Using mock registration data for domain: {domain}");

        let mock_data = HashMap::from([
            ("example.com", 28),
            ("google.com", 27),
            ("established.org", 10),
            ("fresh-registration.com", 0),
            ("suspicious.tk", 0),
        ]);

        mock_data.get(domain).copied()
    }
}
