//! Integration tests for `TrafficClient` using wiremock HTTP mocks.

use prospectdb_traffic::{TrafficClient, TrafficError};
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TrafficClient {
    TrafficClient::with_base_url("test-token", 30, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn fetch_returns_first_dataset_item() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "url": "https://fastship.example",
            "name": "Fastship",
            "category": "Ecommerce",
            "globalRank": { "rank": 48213 },
            "engagements": {
                "visits": 150000.0,
                "timeOnSite": 185.0,
                "pagePerVisit": 4.2,
                "bounceRate": 0.3
            },
            "trafficSources": { "direct": 0.4, "search": 0.4, "social": 0.2 },
            "topCountries": [
                { "countryCode": "IT", "countryName": "Italy", "visitsShare": 0.6 },
                { "countryCode": "DE", "countryName": "Germany", "visitsShare": 0.4 }
            ],
            "topKeywords": [
                { "name": "fast shipping", "estimatedValue": 120.5, "volume": 9000 }
            ]
        }
    ]);

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "websites": ["fastship.example"],
            "maxItems": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let data = client
        .fetch_site_traffic("fastship.example")
        .await
        .expect("should parse dataset item");

    assert_eq!(data.name.as_deref(), Some("Fastship"));
    assert_eq!(data.global_rank.unwrap().rank, Some(48_213));
    assert_eq!(data.engagements.unwrap().visits, Some(150_000.0));
    assert_eq!(data.top_countries.unwrap().len(), 2);
}

#[tokio::test]
async fn empty_dataset_maps_to_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("unknown.example")
        .await
        .expect_err("empty dataset should error");

    assert!(
        matches!(err, TrafficError::NoData { ref domain } if domain == "unknown.example"),
        "expected NoData, got: {err:?}"
    );
}

#[tokio::test]
async fn unauthorized_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("x.example")
        .await
        .expect_err("401 should error");
    assert!(matches!(err, TrafficError::Unauthorized), "got: {err:?}");
}

#[tokio::test]
async fn quota_exhaustion_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("x.example")
        .await
        .expect_err("402 should error");
    assert!(matches!(err, TrafficError::QuotaExceeded), "got: {err:?}");
}

#[tokio::test]
async fn rate_limit_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("x.example")
        .await
        .expect_err("429 should error");
    assert!(matches!(err, TrafficError::RateLimited), "got: {err:?}");
}

#[tokio::test]
async fn bad_request_carries_the_domain() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("bad.example")
        .await
        .expect_err("400 should error");
    assert!(
        matches!(err, TrafficError::BadRequest { ref domain } if domain == "bad.example"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn server_error_maps_to_provider_internal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("x.example")
        .await
        .expect_err("503 should error");
    assert!(
        matches!(err, TrafficError::ProviderInternal { status: 503 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn unexpected_status_is_preserved() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("x.example")
        .await
        .expect_err("418 should error");
    assert!(
        matches!(err, TrafficError::UnexpectedStatus { status: 418 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn slow_provider_maps_to_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = TrafficClient::with_base_url("test-token", 1, &server.uri())
        .expect("client construction should not fail");
    let err = client
        .fetch_site_traffic("slow.example")
        .await
        .expect_err("should time out");
    assert!(
        matches!(err, TrafficError::Timeout { seconds: 1 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_maps_to_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_site_traffic("x.example")
        .await
        .expect_err("garbage body should error");
    assert!(
        matches!(err, TrafficError::Deserialize { .. }),
        "got: {err:?}"
    );
}
