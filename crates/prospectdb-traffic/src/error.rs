use thiserror::Error;

/// Errors surfaced by the traffic-analytics provider integration.
///
/// Each variant maps to a distinct HTTP status at the API boundary; none of
/// them aborts anything beyond the request that triggered it.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// The input could not be reduced to a plausible domain.
    #[error("invalid domain \"{domain}\": expected a full URL or hostname such as https://example.com")]
    InvalidDomain { domain: String },

    /// The provider returned an empty dataset for the domain.
    #[error("no traffic data found for {domain}")]
    NoData { domain: String },

    /// HTTP 400 from the provider: the request for this domain was rejected.
    #[error("provider rejected the request for domain \"{domain}\"")]
    BadRequest { domain: String },

    /// HTTP 401: the provider token is invalid or expired.
    #[error("provider token is invalid or expired")]
    Unauthorized,

    /// HTTP 402: the provider account has exhausted its quota.
    #[error("provider quota exhausted")]
    QuotaExceeded,

    /// HTTP 429: the provider rate limit was hit.
    #[error("provider rate limit reached")]
    RateLimited,

    /// HTTP 5xx from the provider.
    #[error("provider internal error (status {status})")]
    ProviderInternal { status: u16 },

    /// Any other non-2xx status.
    #[error("unexpected provider status {status}")]
    UnexpectedStatus { status: u16 },

    /// The configured provider endpoint is not a usable URL.
    #[error("invalid provider endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The bounded client-side wait elapsed before the provider answered.
    #[error("traffic analysis timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
