use std::net::IpAddr;
use url::Url;

/// Fully-qualified hostname of a URL, lower-cased. Returns `None` for IP
/// literals, single-label hosts, and input no parser can make sense of, so
/// malformed URLs degrade instead of erroring.
pub fn fqdn(raw: &str) -> Option<String> {
    let host = host_of(raw)?;
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    if !host.contains('.') {
        return None;
    }
    Some(host)
}

fn host_of(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = Url::parse(trimmed) {
        if let Some(host) = parsed.host_str() {
            return Some(host.trim_end_matches('.').to_lowercase());
        }
    }

    // Scheme-less input ("example.com/login") fails the strict parse; retry
    // with a default scheme before giving up.
    let parsed = Url::parse(&format!("http://{trimmed}")).ok()?;
    parsed
        .host_str()
        .map(|host| host.trim_end_matches('.').to_lowercase())
}

/// Registrable domain for WHOIS and DNS queries (removes subdomains).
/// e.g., "mail.nationalgeographic.com" -> "nationalgeographic.com"
pub fn registrable_domain(raw: &str) -> Option<String> {
    let host = fqdn(raw)?;
    let parts: Vec<&str> = host.split('.').collect();

    if parts.len() < 2 {
        return Some(host);
    }

    // Handle common two-part TLDs like .co.uk, .com.au, etc.
    if parts.len() >= 3 {
        let potential_tld = format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1]);
        let common_two_part_tlds = [
            "co.uk", "com.au", "co.jp", "co.kr", "com.br", "co.za", "com.mx", "co.in", "com.sg",
            "co.nz", "com.ar", "co.il", "org.uk", "net.au", "gov.uk", "ac.uk", "edu.au",
        ];

        if common_two_part_tlds.contains(&potential_tld.as_str()) {
            return Some(format!(
                "{}.{}.{}",
                parts[parts.len() - 3],
                parts[parts.len() - 2],
                parts[parts.len() - 1]
            ));
        }
    }

    Some(format!(
        "{}.{}",
        parts[parts.len() - 2],
        parts[parts.len() - 1]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn() {
        assert_eq!(
            fqdn("https://mail.google.com/inbox"),
            Some("mail.google.com".to_string())
        );
        assert_eq!(fqdn("example.com/login"), Some("example.com".to_string()));
        assert_eq!(fqdn("HTTPS://EXAMPLE.COM"), Some("example.com".to_string()));

        // IP literals and single labels have no fqdn
        assert_eq!(fqdn("http://192.168.1.1/login"), None);
        assert_eq!(fqdn("http://localhost:8080"), None);

        // Garbage degrades to None rather than erroring
        assert_eq!(fqdn(""), None);
        assert_eq!(fqdn("   "), None);
        assert_eq!(fqdn("not a url at all"), None);
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(
            registrable_domain("https://example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(
            registrable_domain("https://mail.google.com"),
            Some("google.com".to_string())
        );
        assert_eq!(
            registrable_domain("http://sub.domain.example.org/x"),
            Some("example.org".to_string())
        );

        // Two-part TLDs
        assert_eq!(
            registrable_domain("https://mail.example.co.uk"),
            Some("example.co.uk".to_string())
        );
        assert_eq!(
            registrable_domain("https://test.company.com.au"),
            Some("company.com.au".to_string())
        );

        // No registrable domain for IP hosts
        assert_eq!(registrable_domain("http://10.0.0.1/admin"), None);
    }
}
