//! End-to-end tests: axum application in front of a wiremock identity endpoint.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cognito_proxy::{app, Config, ProxyState};
use http_body_util::BodyExt;
use test_utils::fixtures::{self, BOUNDARY_HEADER, FOREIGN_VPCE, ORIGIN, TRUSTED_VPCE};
use tower::ServiceExt;
use wiremock::matchers::{body_bytes, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_with(identity_url: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars = fixtures::env_vars(Some(identity_url));
    vars.extend(extra.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
    Config::from_lookup(fixtures::lookup(vars)).expect("valid test config")
}

fn build_app(config: &Config) -> Router {
    let state = ProxyState::from_config(config).expect("state");
    app(config, state)
}

fn auth_request(source: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::AUTHORIZATION, "Bearer abc")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(source) = source {
        builder = builder.header(BOUNDARY_HEADER, source);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

async fn read_body(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

fn assert_cors(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type,Authorization,Cache-Control,X-Amz-User-Target,X-Amz-User-Agent"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");
}

#[tokio::test]
async fn trusted_request_is_forwarded_and_relayed() {
    let server = MockServer::start().await;
    let body = fixtures::initiate_auth_body();

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header_eq("authorization", "Bearer abc"))
        .and(header_eq("content-type", "application/json"))
        .and(body_bytes(body.clone().into_bytes()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-amzn-requestid", "req-123")
                .set_body_raw(fixtures::initiate_auth_result(), "application/x-amz-json-1.1"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_with(&server.uri(), &[]);
    let response = build_app(&config)
        .oneshot(auth_request(Some(TRUSTED_VPCE), &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()["x-amzn-requestid"], "req-123");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-amz-json-1.1"
    );
    assert_eq!(read_body(response).await, fixtures::initiate_auth_result().into_bytes());
}

#[tokio::test]
async fn foreign_endpoint_is_denied_without_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_with(&server.uri(), &[]);
    let app = build_app(&config);

    for source in [Some(FOREIGN_VPCE), None] {
        let response = app
            .clone()
            .oneshot(auth_request(source, &fixtures::initiate_auth_body()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(read_body(response).await, br#"{"message":"Forbidden"}"#.to_vec());
    }

    server.verify().await;
}

#[tokio::test]
async fn upstream_errors_are_relayed_verbatim() {
    for status in [400u16, 500] {
        let server = MockServer::start().await;
        let error_body = format!(r#"{{"__type":"NotAuthorizedException","code":{status}}}"#);
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(error_body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_with(&server.uri(), &[]);
        let response = build_app(&config)
            .oneshot(auth_request(Some(TRUSTED_VPCE), "{}"))
            .await
            .expect("response");

        assert_eq!(response.status().as_u16(), status);
        assert_cors(&response);
        assert_eq!(read_body(response).await, error_body.into_bytes());
    }
}

#[tokio::test]
async fn preflight_returns_cors_and_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("OPTIONS"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_with(&server.uri(), &[]);
    let app = build_app(&config);

    for with_auth in [false, true] {
        let mut builder = Request::builder()
            .method("OPTIONS")
            .uri("/")
            .header(BOUNDARY_HEADER, TRUSTED_VPCE)
            .header(header::ORIGIN, "https://evil.example.net")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST");
        if with_auth {
            builder = builder.header(header::AUTHORIZATION, "Bearer abc");
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert!(read_body(response).await.is_empty());
    }
}

#[tokio::test]
async fn other_routes_and_methods_are_forbidden() {
    let server = MockServer::start().await;
    let config = config_with(&server.uri(), &[]);
    let app = build_app(&config);

    for (verb, uri) in [("GET", "/"), ("POST", "/oauth2/token"), ("DELETE", "/")] {
        let request = Request::builder()
            .method(verb)
            .uri(uri)
            .header(BOUNDARY_HEADER, TRUSTED_VPCE)
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{verb} {uri}");
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected_inside_the_boundary_only() {
    let server = MockServer::start().await;
    let config = config_with(&server.uri(), &[("MAX_BODY_BYTES", "16")]);
    let app = build_app(&config);
    let big = "x".repeat(64);

    let inside = app
        .clone()
        .oneshot(auth_request(Some(TRUSTED_VPCE), &big))
        .await
        .expect("response");
    assert_eq!(inside.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let outside = app
        .oneshot(auth_request(Some(FOREIGN_VPCE), &big))
        .await
        .expect("response");
    assert_eq!(outside.status(), StatusCode::FORBIDDEN);

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let config = config_with("http://127.0.0.1:1/", &[]);
    let response = build_app(&config)
        .oneshot(auth_request(Some(TRUSTED_VPCE), "{}"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_cors(&response);
    let body = String::from_utf8(read_body(response).await).expect("utf8");
    assert!(!body.contains("127.0.0.1"));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = config_with(&server.uri(), &[("REQUEST_TIMEOUT", "1")]);
    let response = build_app(&config)
        .oneshot(auth_request(Some(TRUSTED_VPCE), "{}"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}
