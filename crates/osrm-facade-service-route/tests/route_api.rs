use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};

use osrm_facade_service_route::app;
use osrm_facade_service_shared::test_utils::{
    FakeOsrm, FakeReply, MADRID_FROM, MADRID_TO, test_config, test_state, unreachable_base_url,
};
use osrm_facade_service_shared::{
    AllowedOrigins, AppState, MetricsConfig, PROBLEM_INVALID_REQUEST, init_metrics,
};

fn server(state: AppState) -> TestServer {
    TestServer::new(app(state)).expect("test server")
}

fn madrid_body() -> Value {
    json!({ "from": MADRID_FROM, "to": MADRID_TO })
}

#[tokio::test]
async fn returns_route_for_madrid_sample() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let object = body.as_object().expect("object body");
    assert_eq!(object.len(), 3, "unexpected fields in {body}");
    assert!(body["distance_m"].as_f64().unwrap() > 0.0);
    assert!(body["duration_s"].as_f64().unwrap() > 0.0);
    assert_eq!(body["geometry"]["type"], "LineString");
    assert!(!body["geometry"]["coordinates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn forwards_coordinates_in_lon_lat_order() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    server.post("/route").json(&madrid_body()).await;

    let seen = fake.requests();
    assert_eq!(seen.len(), 1);
    let target = &seen[0];
    assert!(
        target.starts_with("/route/v1/driving/-3.6893,40.4066;-3.6834,40.4723?"),
        "unexpected upstream query {target}"
    );
    assert!(target.contains("overview=full"));
    assert!(target.contains("geometries=geojson"));
    assert!(target.contains("steps=false"));
    assert!(target.contains("alternatives=false"));
}

#[tokio::test]
async fn fastest_selection_returns_primary_route() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let body: Value = server.post("/route").json(&madrid_body()).await.json();

    assert_eq!(body["distance_m"], 9120.4);
    assert_eq!(body["duration_s"], 742.1);
}

#[tokio::test]
async fn shortest_selection_requests_alternatives_and_picks_min_distance() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let mut config = test_config(fake.base_url());
    config.osrm.selection = osrm_facade_lib::RouteSelection::Shortest;
    let server = server(AppState::new(config).unwrap());

    let body: Value = server.post("/route").json(&madrid_body()).await.json();

    assert_eq!(body["distance_m"], 8430.0);
    assert_eq!(body["geometry"]["coordinates"].as_array().unwrap().len(), 3);
    assert!(fake.requests()[0].contains("alternatives=true"));
}

#[tokio::test]
async fn missing_field_is_bad_request() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let response = server
        .post("/route")
        .json(&json!({ "from": MADRID_FROM }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let problem: Value = response.json();
    assert_eq!(problem["type"], PROBLEM_INVALID_REQUEST);
    assert!(problem["detail"].as_str().unwrap().contains("'to'"));
    assert!(fake.requests().is_empty(), "upstream must not be called");
}

#[tokio::test]
async fn malformed_pairs_are_bad_request() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let bodies = [
        json!({}),
        json!({ "from": null, "to": MADRID_TO }),
        json!({ "from": [40.4066], "to": MADRID_TO }),
        json!({ "from": [40.4066, -3.6893, 0.0], "to": MADRID_TO }),
        json!({ "from": ["40.4066", "-3.6893"], "to": MADRID_TO }),
        json!({ "from": MADRID_FROM, "to": "40.4723,-3.6834" }),
        json!({ "from": MADRID_FROM, "to": { "lat": 40.4723, "lon": -3.6834 } }),
        json!({ "from": [123.0, 0.0], "to": MADRID_TO }),
        json!([MADRID_FROM, MADRID_TO]),
    ];

    for body in bodies {
        let response = server.post("/route").json(&body).await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "body {body} should be rejected"
        );
    }
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").text("from=1,2&to=3,4").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn json_without_content_type_is_accepted() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let response = server
        .post("/route")
        .text(madrid_body().to_string())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_bad_request() {
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    let response = server
        .post("/route")
        .bytes(Bytes::from(vec![b' '; 3 * 1024 * 1024]))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let problem: Value = response.json();
    assert_eq!(problem["type"], PROBLEM_INVALID_REQUEST);
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn upstream_no_route_is_not_found() {
    let fake = FakeOsrm::start(FakeReply::no_route()).await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/route-not-found");
}

#[tokio::test]
async fn upstream_empty_routes_is_not_found() {
    let fake = FakeOsrm::start(FakeReply::json(
        StatusCode::OK,
        json!({ "code": "Ok", "routes": [], "waypoints": [] }),
    ))
    .await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upstream_server_error_is_bad_gateway() {
    let fake = FakeOsrm::start(FakeReply::raw(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal error",
    ))
    .await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/upstream-failure");
    assert!(problem["detail"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn upstream_rejection_is_bad_gateway() {
    let fake = FakeOsrm::start(FakeReply::json(
        StatusCode::BAD_REQUEST,
        json!({ "code": "InvalidQuery", "message": "Query string malformed close to position 28" }),
    ))
    .await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn upstream_garbage_is_bad_gateway() {
    let fake = FakeOsrm::start(FakeReply::raw(StatusCode::OK, "<html>proxy</html>")).await;
    let server = server(test_state(fake.base_url()));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let server = server(test_state(&unreachable_base_url().await));

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn slow_upstream_times_out_as_bad_gateway() {
    let fake =
        FakeOsrm::start(FakeReply::madrid_routes().with_delay(Duration::from_secs(3))).await;
    let mut config = test_config(fake.base_url());
    config.osrm.timeout = Duration::from_millis(200);
    let server = server(AppState::new(config).unwrap());

    let response = server.post("/route").json(&madrid_body()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let problem: Value = response.json();
    assert!(
        problem["detail"]
            .as_str()
            .unwrap()
            .contains("did not respond"),
        "unexpected problem {problem}"
    );
}

#[tokio::test]
async fn health_is_ok_even_when_upstream_is_down() {
    let server = server(test_state(&unreachable_base_url().await));

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn health_live_reports_service_identity() {
    let server = server(test_state(&unreachable_base_url().await));

    let body: Value = server.get("/health/live").await.json();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "osrm-facade-service-route");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn request_id_is_echoed_and_used_as_problem_instance() {
    let fake = FakeOsrm::start(FakeReply::no_route()).await;
    let server = server(test_state(fake.base_url()));

    let response = server
        .post("/route")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-madrid-1"),
        )
        .json(&madrid_body())
        .await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-madrid-1"
    );
    let problem: Value = response.json();
    assert_eq!(problem["instance"], "req-madrid-1");
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let server = server(test_state(&unreachable_base_url().await));

    let response = server.get("/health").await;

    let id = response.headers().get("x-request-id").unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin_by_default() {
    let server = server(test_state(&unreachable_base_url().await));

    let response = server
        .method(Method::OPTIONS, "/route")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example.com"))
        .add_header(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        )
        .await;

    assert!(response.status_code().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn cors_respects_origin_list() {
    let mut config = test_config(&unreachable_base_url().await);
    config.cors.origins = AllowedOrigins::List(vec!["https://app.example.com".to_string()]);
    let server = server(AppState::new(config).unwrap());

    let allowed = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example.com"))
        .await;
    assert_eq!(
        allowed
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://app.example.com"
    );

    let denied = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://evil.example.com"))
        .await;
    assert!(
        denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn cors_disabled_adds_no_headers() {
    let mut config = test_config(&unreachable_base_url().await);
    config.cors.enabled = false;
    let server = server(AppState::new(config).unwrap());

    let response = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example.com"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn metrics_endpoint_renders_route_counters() {
    // Only test in this binary that installs the global recorder.
    init_metrics(&MetricsConfig::default()).expect("install recorder");
    let fake = FakeOsrm::start(FakeReply::madrid_routes()).await;
    let server = server(test_state(fake.base_url()));

    server.post("/route").json(&madrid_body()).await;
    let response = server.get("/metrics").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let text = response.text();
    assert!(
        text.contains("osrm_facade_routes_calculated_total"),
        "missing route counter in {text}"
    );
    assert!(text.contains("http_requests_total"));
}
