//! HTTP-level tests for the Home worker adapter.

use std::time::Duration;

use futures_util::StreamExt;
use gpurouter_core::{BackendError, GenerateRequest, HomeBackendPort, PreprocessRequest, Timeouts};
use gpurouter_runtime::HomeHttpClient;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HomeHttpClient {
    let timeouts = Timeouts {
        health: Duration::from_millis(300),
        ..Timeouts::default()
    };
    HomeHttpClient::new(format!("{}/", server.uri()), timeouts).unwrap()
}

fn generate_request() -> GenerateRequest {
    GenerateRequest {
        image_data: "aW1n".to_string(),
        params: json!({"num_lines": 2000}),
    }
}

#[tokio::test]
async fn health_report_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"gpu_available": true, "gpu_busy": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server).health().await.unwrap();
    assert!(report.gpu_available);
    assert!(report.gpu_busy);
    assert!(!report.is_ready());
}

#[tokio::test]
async fn slow_health_probe_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"gpu_available": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client(&server).health().await.unwrap_err();
    assert_eq!(err, BackendError::Timeout(Duration::from_millis(300)));
}

#[tokio::test]
async fn preprocess_posts_wire_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/preprocess"))
        .and(body_json(json!({
            "imageData": "aW1n",
            "num_nails": 240,
            "image_resolution": 500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cached": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .preprocess(&PreprocessRequest {
            image_data: "aW1n".to_string(),
            num_nails: 240,
            image_resolution: 500,
        })
        .await
        .unwrap();
    assert_eq!(result, json!({"cached": true}));
}

#[tokio::test]
async fn busy_worker_maps_to_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).generate(&generate_request()).await.unwrap_err();
    assert_eq!(err, BackendError::Busy);
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).generate(&generate_request()).await.unwrap_err();
    assert_eq!(err, BackendError::Status { status: 500 });
}

#[tokio::test]
async fn unreachable_worker_is_transport_error() {
    let client = HomeHttpClient::new("http://127.0.0.1:9", Timeouts::default()).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn generate_stream_yields_frames() {
    let server = MockServer::start().await;
    let body = concat!(
        "{\"type\":\"new_line\",\"start\":0,\"end\":4}\n",
        "\n",
        "{\"type\":\"final_sequence\",\"sequence\":[0,4]}\n",
    );
    Mock::given(method("POST"))
        .and(path("/generate_stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .expect(1)
        .mount(&server)
        .await;

    let feed = client(&server)
        .generate_stream(&generate_request())
        .await
        .unwrap();
    let frames: Vec<String> = feed.map(Result::unwrap).collect().await;

    assert_eq!(frames.len(), 2);
    assert!(frames[1].contains("final_sequence"));
}
