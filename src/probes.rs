use regex::Regex;
use reqwest::Client;
use std::time::Duration;

/// Maximum page bytes read when probing for a title; avoids huge pages.
const MAX_BODY_BYTES: usize = 200_000;

/// Result of a best-effort network probe. `Failed` means the probe itself
/// could not observe anything; callers substitute their conservative default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome<T> {
    Observed(T),
    Failed,
}

impl<T> ProbeOutcome<T> {
    pub fn observed(self) -> Option<T> {
        match self {
            ProbeOutcome::Observed(value) => Some(value),
            ProbeOutcome::Failed => None,
        }
    }
}

/// DNS reachability check for registrable domains.
#[derive(Debug, Clone)]
pub struct DnsChecker {
    timeout: Duration,
    use_mock: bool,
}

impl DnsChecker {
    pub fn new(timeout_seconds: u64, use_mock: bool) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds),
            use_mock,
        }
    }

    /// True when the domain resolves to at least one address. Resolver
    /// errors and timeouts count as resolution failures, so this never
    /// raises past the probe boundary.
    pub async fn resolves(&self, domain: &str) -> bool {
        if self.use_mock {
            return self.mock_resolves(domain);
        }

        use hickory_resolver::TokioAsyncResolver;

        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                log::warn!("Could not build DNS resolver: {e}");
                return false;
            }
        };

        match tokio::time::timeout(self.timeout, resolver.lookup_ip(domain)).await {
            Ok(Ok(lookup)) => lookup.iter().next().is_some(),
            Ok(Err(e)) => {
                log::debug!("DNS lookup failed for {domain}: {e}");
                false
            }
            Err(_) => {
                log::debug!("DNS lookup timed out for {domain}");
                false
            }
        }
    }

    fn mock_resolves(&self, domain: &str) -> bool {
        log::debug!("Using mock DNS data for domain: {domain}");
        !(domain.ends_with(".invalid") || domain.starts_with("unresolvable."))
    }
}

/// Fetches a page and extracts its `<title>` text.
#[derive(Debug, Clone)]
pub struct PageProbe {
    client: Client,
    timeout: Duration,
    title_pattern: Regex,
    use_mock: bool,
}

impl PageProbe {
    pub fn new(timeout_seconds: u64, use_mock: bool) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            timeout,
            title_pattern: Regex::new(r"(?is)<title[^>]*>(.*?)</title>")?,
            use_mock,
        })
    }

    /// Fetch the page and return its trimmed title text. A page without a
    /// `<title>` observes an empty string; a failed fetch observes nothing,
    /// which callers must not treat as an empty title.
    pub async fn title(&self, url: &str) -> ProbeOutcome<String> {
        if self.use_mock {
            return self.mock_title(url);
        }

        match tokio::time::timeout(self.timeout, self.fetch_title(url)).await {
            Ok(Ok(title)) => ProbeOutcome::Observed(title),
            Ok(Err(e)) => {
                log::debug!("Page fetch failed for {url}: {e}");
                ProbeOutcome::Failed
            }
            Err(_) => {
                log::debug!("Page fetch timed out for {url}");
                ProbeOutcome::Failed
            }
        }
    }

    async fn fetch_title(&self, url: &str) -> anyhow::Result<String> {
        let mut response = self.client.get(url).send().await?;

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() >= MAX_BODY_BYTES {
                break;
            }
        }
        body.truncate(MAX_BODY_BYTES);

        let html = String::from_utf8_lossy(&body);
        let title = self
            .title_pattern
            .captures(&html)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        Ok(title)
    }

    fn mock_title(&self, url: &str) -> ProbeOutcome<String> {
        log::debug!("Using mock page data for URL: {url}");
        if url.contains("unreachable") {
            ProbeOutcome::Failed
        } else if url.contains("no-title") {
            ProbeOutcome::Observed(String::new())
        } else {
            ProbeOutcome::Observed("Mock Page".to_string())
        }
    }
}
