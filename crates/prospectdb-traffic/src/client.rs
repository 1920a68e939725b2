//! HTTP client for the traffic-analytics provider.
//!
//! Wraps `reqwest` with provider-specific error handling and typed response
//! deserialization. Calls are not retried; a failure is terminal for the
//! request that made it.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::TrafficError;
use crate::types::RawSiteData;

const DEFAULT_ENDPOINT: &str =
    "https://api.apify.com/v2/acts/tri_angle~fast-similarweb-scraper/run-sync-get-dataset-items";

/// Client for the provider's run-sync dataset endpoint.
///
/// Use [`TrafficClient::new`] for production or
/// [`TrafficClient::with_base_url`] to point at a mock server in tests.
pub struct TrafficClient {
    client: Client,
    token: String,
    endpoint: Url,
    timeout_secs: u64,
}

impl TrafficClient {
    /// Creates a client pointed at the production provider endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, TrafficError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_ENDPOINT)
    }

    /// Creates a client with a custom endpoint URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TrafficError::InvalidEndpoint`] if
    /// `endpoint` is not a valid URL.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        endpoint: &str,
    ) -> Result<Self, TrafficError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("prospectdb/0.1 (traffic-enrichment)")
            .build()?;

        let endpoint = Url::parse(endpoint).map_err(|e| TrafficError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            endpoint,
            timeout_secs,
        })
    }

    /// Requests traffic analytics for a bare domain and returns the first
    /// dataset item.
    ///
    /// # Errors
    ///
    /// - [`TrafficError::NoData`] — the provider returned an empty dataset.
    /// - [`TrafficError::BadRequest`] / [`TrafficError::Unauthorized`] /
    ///   [`TrafficError::QuotaExceeded`] / [`TrafficError::RateLimited`] /
    ///   [`TrafficError::ProviderInternal`] /
    ///   [`TrafficError::UnexpectedStatus`] — non-2xx provider statuses.
    /// - [`TrafficError::Timeout`] — the bounded wait elapsed.
    /// - [`TrafficError::Http`] — network or TLS failure.
    /// - [`TrafficError::Deserialize`] — body is not the expected JSON.
    pub async fn fetch_site_traffic(&self, domain: &str) -> Result<RawSiteData, TrafficError> {
        tracing::debug!(domain = %domain, "requesting traffic analytics");

        let body = serde_json::json!({
            "websites": [domain],
            "maxItems": 1,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_status(status, domain));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let mut items: Vec<RawSiteData> =
            serde_json::from_str(&text).map_err(|e| TrafficError::Deserialize {
                context: format!("dataset items for {domain}"),
                source: e,
            })?;

        if items.is_empty() {
            tracing::info!(domain = %domain, "provider returned an empty dataset");
            return Err(TrafficError::NoData {
                domain: domain.to_owned(),
            });
        }

        Ok(items.swap_remove(0))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> TrafficError {
        if e.is_timeout() {
            TrafficError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            TrafficError::Http(e)
        }
    }

    fn map_status(status: StatusCode, domain: &str) -> TrafficError {
        match status {
            StatusCode::BAD_REQUEST => TrafficError::BadRequest {
                domain: domain.to_owned(),
            },
            StatusCode::UNAUTHORIZED => TrafficError::Unauthorized,
            StatusCode::PAYMENT_REQUIRED => TrafficError::QuotaExceeded,
            StatusCode::TOO_MANY_REQUESTS => TrafficError::RateLimited,
            s if s.is_server_error() => TrafficError::ProviderInternal {
                status: s.as_u16(),
            },
            s => TrafficError::UnexpectedStatus {
                status: s.as_u16(),
            },
        }
    }
}
