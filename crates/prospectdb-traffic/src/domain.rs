//! Domain extraction from user-supplied website URLs.

use reqwest::Url;

use crate::error::TrafficError;

/// Reduces a website URL to the bare domain the provider expects: scheme
/// stripped, leading `www.` removed, lowercased.
///
/// Bare hostnames without a scheme are accepted (`shop.example.com`).
///
/// # Errors
///
/// Returns [`TrafficError::InvalidDomain`] when no hostname can be
/// extracted, or when the result is shorter than 3 characters or has no dot.
pub fn extract_domain(website_url: &str) -> Result<String, TrafficError> {
    let trimmed = website_url.trim();
    let invalid = || TrafficError::InvalidDomain {
        domain: trimmed.to_owned(),
    };

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;

    let lower = host.to_lowercase();
    let domain = lower.strip_prefix("www.").unwrap_or(&lower).to_owned();

    if domain.len() < 3 || !domain.contains('.') {
        return Err(TrafficError::InvalidDomain { domain });
    }

    Ok(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_www() {
        assert_eq!(
            extract_domain("https://www.example.com/shop").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn accepts_bare_hostname() {
        assert_eq!(extract_domain("shop.example.com").unwrap(), "shop.example.com");
    }

    #[test]
    fn lowercases_host() {
        assert_eq!(extract_domain("HTTP://Example.COM").unwrap(), "example.com");
    }

    #[test]
    fn keeps_non_www_subdomains() {
        assert_eq!(
            extract_domain("https://store.brand.co.uk").unwrap(),
            "store.brand.co.uk"
        );
    }

    #[test]
    fn rejects_host_without_dot() {
        assert!(matches!(
            extract_domain("https://localhost"),
            Err(TrafficError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            extract_domain("   "),
            Err(TrafficError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            extract_domain("ht!tp://///"),
            Err(TrafficError::InvalidDomain { .. })
        ));
    }
}
