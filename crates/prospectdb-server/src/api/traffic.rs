//! The traffic-analysis pipeline endpoint.
//!
//! Flow: validate and reduce the URL to a bare domain, fetch raw analytics
//! from the provider, normalize, derive business estimates, then merge the
//! result into the prospect record keyed by website. A persistence failure
//! is deliberately non-fatal: the analysis already succeeded from the
//! caller's point of view, so the handler logs the failure and ships the
//! report with a stub prospect reference instead.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use prospectdb_traffic::{
    estimate_business, extract_domain, normalize_site_data, TrafficError, TrafficReport,
};

use super::prospects::ProspectBody;
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct AnalyzeRequest {
    website_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct AnalyzeResponse {
    success: bool,
    data: TrafficReport,
    /// Absent when persistence degraded to a stub.
    prospect_id: Option<i64>,
    prospect_data: ProspectBody,
}

/// POST /api/v1/traffic/analyze
pub(in crate::api) async fn analyze_site_traffic(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let website_url = body
        .website_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("websiteUrl is required"))?;

    let domain = extract_domain(website_url).map_err(|e| map_traffic_error(&e))?;

    let Some(client) = state.traffic.clone() else {
        tracing::error!("traffic provider token is not configured");
        return Err(ApiError::internal(
            "traffic provider token is not configured on the backend",
        ));
    };

    tracing::info!(domain = %domain, "analyzing website traffic");

    let raw = client
        .fetch_site_traffic(&domain)
        .await
        .map_err(|e| map_traffic_error(&e))?;

    let report = normalize_site_data(&raw, &state.home_country);
    let estimates = estimate_business(&report);

    tracing::info!(
        domain = %domain,
        monthly_visits = estimates.estimated_monthly_visits,
        monthly_shipments = estimates.monthly_shipments,
        "traffic analysis complete"
    );

    let analysis = serde_json::json!({
        "normalized": report,
        "raw": raw,
        "analyzedAt": Utc::now(),
    });

    let site_name = report.basic.site_name.clone();
    let (prospect_id, prospect_data) = match prospectdb_db::upsert_from_analysis(
        &state.pool,
        &domain,
        site_name.as_deref(),
        &estimates,
        analysis,
    )
    .await
    {
        Ok(row) => (Some(row.id), ProspectBody::from(row)),
        Err(e) => {
            // Documented degrade-on-failure policy: the analysis result is
            // still returned; the prospect record just did not stick.
            tracing::error!(error = %e, domain = %domain, "prospect upsert failed; returning stub");
            let company_name = site_name.unwrap_or_else(|| domain.clone());
            (None, ProspectBody::stub(&domain, &company_name))
        }
    };

    Ok(Json(AnalyzeResponse {
        success: true,
        data: report,
        prospect_id,
        prospect_data,
    }))
}

/// Maps the provider-error taxonomy onto HTTP statuses and BDR-readable
/// messages.
fn map_traffic_error(e: &TrafficError) -> ApiError {
    match e {
        TrafficError::InvalidDomain { domain } => ApiError::bad_request(format!(
            "Invalid domain \"{domain}\". Provide a full URL such as https://example.com"
        )),
        TrafficError::NoData { .. } => {
            ApiError::not_found("No traffic data found for this website")
        }
        TrafficError::BadRequest { domain } => ApiError::bad_request(format!(
            "The provider rejected the request for domain \"{domain}\". Check that the URL is correct"
        )),
        TrafficError::Unauthorized => ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Traffic provider token is invalid or expired",
        ),
        TrafficError::QuotaExceeded => ApiError::new(
            StatusCode::PAYMENT_REQUIRED,
            "Traffic provider quota exhausted; check the subscription plan",
        ),
        TrafficError::RateLimited => ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Traffic provider rate limit reached; try again in a few minutes",
        ),
        TrafficError::ProviderInternal { .. } => {
            ApiError::internal("Traffic provider internal error")
        }
        TrafficError::UnexpectedStatus { status } => ApiError::new(
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            format!("Traffic provider error ({status})"),
        ),
        TrafficError::Timeout { seconds } => ApiError::new(
            StatusCode::REQUEST_TIMEOUT,
            format!(
                "Analysis timed out after {seconds}s. Traffic analysis can take longer; try again"
            ),
        ),
        TrafficError::InvalidEndpoint { .. } => {
            tracing::error!(error = %e, "traffic provider endpoint misconfigured");
            ApiError::internal("traffic provider endpoint is misconfigured")
        }
        TrafficError::Http(_) | TrafficError::Deserialize { .. } => {
            tracing::error!(error = %e, "traffic analysis failed");
            ApiError::internal("Internal error during traffic analysis")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{dead_pool, state_without_traffic};
    use super::super::{build_app, default_rate_limit_state, AppState};
    use super::*;
    use crate::middleware::AuthState;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn analyze_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/traffic/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[test]
    fn status_mapping_matches_error_taxonomy() {
        let cases: Vec<(TrafficError, StatusCode)> = vec![
            (
                TrafficError::InvalidDomain {
                    domain: "x".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                TrafficError::NoData {
                    domain: "x.example".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                TrafficError::BadRequest {
                    domain: "x.example".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (TrafficError::Unauthorized, StatusCode::UNAUTHORIZED),
            (TrafficError::QuotaExceeded, StatusCode::PAYMENT_REQUIRED),
            (TrafficError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                TrafficError::ProviderInternal { status: 502 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                TrafficError::UnexpectedStatus { status: 418 },
                StatusCode::IM_A_TEAPOT,
            ),
            (
                TrafficError::Timeout { seconds: 60 },
                StatusCode::REQUEST_TIMEOUT,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(map_traffic_error(&err).status, expected, "for {err:?}");
        }
    }

    #[test]
    fn timeout_message_mentions_that_analysis_may_need_more_time() {
        let err = map_traffic_error(&TrafficError::Timeout { seconds: 60 });
        assert!(err.message.contains("60s"));
        assert!(err.message.contains("can take longer"));
    }

    #[tokio::test]
    async fn missing_website_url_is_400() {
        let auth = AuthState::from_env(true).expect("auth");
        let app = build_app(state_without_traffic(), auth, default_rate_limit_state());

        let response = app
            .oneshot(analyze_request(serde_json::json!({})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("websiteUrl"));
    }

    #[tokio::test]
    async fn invalid_domain_is_400() {
        let auth = AuthState::from_env(true).expect("auth");
        let app = build_app(state_without_traffic(), auth, default_rate_limit_state());

        let response = app
            .oneshot(analyze_request(
                serde_json::json!({ "websiteUrl": "https://nodot" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_provider_token_is_500_configuration_error() {
        let auth = AuthState::from_env(true).expect("auth");
        let app = build_app(state_without_traffic(), auth, default_rate_limit_state());

        let response = app
            .oneshot(analyze_request(
                serde_json::json!({ "websiteUrl": "https://www.example.com" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("token"));
    }

    #[tokio::test]
    async fn provider_not_found_passes_through_as_404() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let traffic = prospectdb_traffic::TrafficClient::with_base_url("t", 5, &server.uri())
            .expect("client");
        let state = AppState {
            pool: dead_pool(),
            traffic: Some(Arc::new(traffic)),
            home_country: "IT".to_owned(),
        };
        let auth = AuthState::from_env(true).expect("auth");
        let app = build_app(state, auth, default_rate_limit_state());

        let response = app
            .oneshot(analyze_request(
                serde_json::json!({ "websiteUrl": "https://unknown.example" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn persistence_failure_degrades_to_stub_but_analysis_succeeds() {
        let server = MockServer::start().await;
        let dataset = serde_json::json!([{
            "url": "https://fastship.example",
            "name": "Fastship",
            "category": "Ecommerce",
            "engagements": {
                "visits": 20000.0,
                "timeOnSite": 120.0,
                "pagePerVisit": 3.5,
                "bounceRate": 0.35
            },
            "topCountries": [
                { "countryCode": "IT", "countryName": "Italy", "visitsShare": 0.7 },
                { "countryCode": "DE", "countryName": "Germany", "visitsShare": 0.3 }
            ]
        }]);
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&dataset))
            .mount(&server)
            .await;

        let traffic = prospectdb_traffic::TrafficClient::with_base_url("t", 5, &server.uri())
            .expect("client");
        // The pool points at a dead address, so the upsert fails and the
        // handler must fall back to the stub reference.
        let state = AppState {
            pool: dead_pool(),
            traffic: Some(Arc::new(traffic)),
            home_country: "IT".to_owned(),
        };
        let auth = AuthState::from_env(true).expect("auth");
        let app = build_app(state, auth, default_rate_limit_state());

        let response = app
            .oneshot(analyze_request(
                serde_json::json!({ "websiteUrl": "https://www.fastship.example" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["traffic"]["totalVisits"], 20_000);
        assert_eq!(json["data"]["basic"]["siteName"], "Fastship");
        assert!(json["prospectId"].is_null());
        assert_eq!(json["prospectData"]["companyName"], "Fastship");
        assert_eq!(json["prospectData"]["website"], "fastship.example");
        assert!(json["prospectData"]["id"].is_null());
        assert!(json["prospectData"]["businessInfo"]["monthlyShipments"].is_null());
    }
}
