//! Integration tests for `OsrmClient` using wiremock HTTP mocks.
//!
//! The client is blocking, so it is built and called on a blocking task while
//! the mock server runs on the test runtime.

use roadsheet::config::RoutingConfig;
use roadsheet::error::RoutingError;
use roadsheet::routing::{resolve_pairs, OsrmClient, RouteService};
use roadsheet::types::{CoordinatePair, RouteSummary};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROUTE_PATH: &str = "/route/v1/driving/4.3517,50.8503;2.3522,48.8566";

fn config(server: &MockServer) -> RoutingConfig {
    RoutingConfig {
        base_url: format!("{}/route/v1/driving", server.uri()),
        timeout_seconds: 5,
    }
}

async fn route(config: RoutingConfig) -> Result<RouteSummary, RoutingError> {
    tokio::task::spawn_blocking(move || {
        let client = OsrmClient::new(&config).expect("client construction should not fail");
        client.route("4.3517,50.8503", "2.3522,48.8566")
    })
    .await
    .expect("blocking task should not panic")
}

#[tokio::test(flavor = "multi_thread")]
async fn route_returns_first_route() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "code": "Ok",
        "routes": [
            { "distance": 1033101.5, "duration": 143222.4, "weight": 143222.4 },
            { "distance": 1100000.0, "duration": 150000.0, "weight": 150000.0 }
        ],
        "waypoints": []
    });

    Mock::given(method("GET"))
        .and(path(ROUTE_PATH))
        .and(query_param("overview", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let summary = route(config(&server)).await.expect("should parse route");

    assert_eq!(summary.distance, 1033101.5);
    assert_eq!(summary.duration, 143222.4);
}

#[tokio::test(flavor = "multi_thread")]
async fn route_reports_service_code() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "code": "NoSegment",
        "message": "Could not find a matching segment for coordinate"
    });

    Mock::given(method("GET"))
        .and(path(ROUTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let err = route(config(&server)).await.unwrap_err();

    match err {
        RoutingError::Service { code, message } => {
            assert_eq!(code, "NoSegment");
            assert!(message.contains("matching segment"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn route_without_routes_is_no_route() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": "Ok", "routes": [] })),
        )
        .mount(&server)
        .await;

    let err = route(config(&server)).await.unwrap_err();
    assert!(matches!(err, RoutingError::NoRoute));
}

#[tokio::test(flavor = "multi_thread")]
async fn route_http_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = route(config(&server)).await.unwrap_err();
    assert!(matches!(err, RoutingError::Http(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn resolve_pairs_records_failures_per_pair() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROUTE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "Ok",
            "routes": [{ "distance": 1033101.5, "duration": 143222.4 }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = config(&server);
    let pairs = tokio::task::spawn_blocking(move || {
        let client = OsrmClient::new(&config).expect("client construction should not fail");
        let mut pairs = vec![
            CoordinatePair::new("50.8503, 4.3517", "48.8566, 2.3522", "C3", "D3"),
            CoordinatePair::new("51.2194, 4.4025", "51.0543, 3.7174", "C5", "D5"),
        ];
        resolve_pairs(&mut pairs, &client);
        pairs
    })
    .await
    .expect("blocking task should not panic");

    assert_eq!(pairs[0].api_result().map(|r| r.distance), Some(1033101.5));
    assert!(!pairs[0].has_errors());
    assert!(pairs[1].api_result().is_none());
    assert_eq!(pairs[1].errors().len(), 1);
    assert!(pairs[1].errors()[0].starts_with("Failed API request: "));
}
