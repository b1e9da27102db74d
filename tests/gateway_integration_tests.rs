//! Integration Tests for the Gateway Pipeline
//!
//! Full request/response cycles against a mock backend on a local port.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

use common::{
    body_to_json, closed_addr, gateway_with, gateway_with_config, test_config, MockBackend,
    GZIP_BODY,
};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// == Static Routes ==

#[tokio::test]
async fn test_static_route_never_touches_cache_or_backend() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({
            "/health": {"GET": {"target": "static_response", "response": {"status": "ok"}}},
            "/users": {"GET": {"target": backend.url("/users")}}
        }),
        10,
        60,
    );
    let app = gateway.app();

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_to_json(response.into_body()).await,
            json!({"status": "ok"})
        );
    }

    assert_eq!(backend.hits(), 0);
    assert!(gateway.state().cache.is_empty().await);
    let stats = gateway.shutdown().await;
    assert_eq!(stats.hits + stats.misses, 0);
}

// == Caching ==

#[tokio::test]
async fn test_second_get_served_from_cache() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/users/{id}": {"GET": {"target": backend.url("/users/{id}")}}}),
        10,
        60,
    );
    let app = gateway.app();

    let first = app.clone().oneshot(get("/users/42")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_json = body_to_json(first.into_body()).await;
    assert_eq!(first_json["path"], "/users/42");

    let second = app.clone().oneshot(get("/users/42")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(
        second.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(second.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(body_to_json(second.into_body()).await, first_json);

    assert_eq!(backend.hits(), 1);
    assert!(gateway.state().cache.contains_key("GET:/users/42").await);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_distinct_paths_are_cached_separately() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/users/{id}": {"GET": {"target": backend.url("/users/{id}")}}}),
        10,
        60,
    );
    let app = gateway.app();

    app.clone().oneshot(get("/users/1")).await.unwrap();
    app.clone().oneshot(get("/users/2")).await.unwrap();
    app.clone().oneshot(get("/users/1")).await.unwrap();

    assert_eq!(backend.hits(), 2);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_query_string_forwarded_and_part_of_key() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/users": {"GET": {"target": backend.url("/users")}}}),
        10,
        60,
    );
    let app = gateway.app();

    let response = app.clone().oneshot(get("/users?page=2")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["query"], "page=2");

    app.clone().oneshot(get("/users?page=3")).await.unwrap();
    app.clone().oneshot(get("/users?page=2")).await.unwrap();

    assert_eq!(backend.hits(), 2);
    assert!(gateway.state().cache.contains_key("GET:/users?page=2").await);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_cache_expires_after_ttl() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/products": {"GET": {"target": backend.url("/products")}}}),
        10,
        1,
    );
    let app = gateway.app();

    app.clone().oneshot(get("/products")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    app.clone().oneshot(get("/products")).await.unwrap();

    assert_eq!(backend.hits(), 2);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_cache_capacity_evicts_lru() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/items/{id}": {"GET": {"target": backend.url("/items/{id}")}}}),
        2,
        60,
    );
    let app = gateway.app();

    app.clone().oneshot(get("/items/a")).await.unwrap();
    app.clone().oneshot(get("/items/b")).await.unwrap();
    // Served from cache, promotes a
    app.clone().oneshot(get("/items/a")).await.unwrap();
    app.clone().oneshot(get("/items/c")).await.unwrap();

    let cache = &gateway.state().cache;
    assert_eq!(cache.len().await, 2);
    assert!(cache.contains_key("GET:/items/a").await);
    assert!(!cache.contains_key("GET:/items/b").await);
    assert!(cache.contains_key("GET:/items/c").await);
    assert_eq!(backend.hits(), 3);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_non_ok_get_is_not_cached() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/broken": {"GET": {"target": backend.url("/fail")}}}),
        10,
        60,
    );
    let app = gateway.app();

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/broken")).await.unwrap();
        // Backend status is relayed as-is
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert_eq!(backend.hits(), 2);
    assert!(gateway.state().cache.is_empty().await);
    gateway.shutdown().await;
}

// == Non-GET Methods ==

#[tokio::test]
async fn test_post_is_never_cached_and_body_is_forwarded() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/users/create": {"POST": {"target": backend.url("/users/create")}}}),
        10,
        60,
    );
    let app = gateway.app();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/users/create")
                    .header("content-type", "application/json")
                    .header("x-test-header", "forwarded")
                    .body(Body::from(r#"{"name":"Ivy"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_to_json(response.into_body()).await;
        assert_eq!(json["method"], "POST");
        assert_eq!(json["body"], r#"{"name":"Ivy"}"#);
        assert_eq!(json["x_test_header"], "forwarded");
    }

    assert_eq!(backend.hits(), 2);
    assert!(gateway.state().cache.is_empty().await);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_put_and_delete_use_resolved_targets() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({
            "/users/{id}/update": {"PUT": {"target": backend.url("/users/{id}/update")}},
            "/users/{id}": {"DELETE": {"target": backend.url("/users/{id}/delete")}}
        }),
        10,
        60,
    );
    let app = gateway.app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/users/7/update")
                .body(Body::from("renamed"))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["path"], "/users/7/update");
    assert_eq!(json["body"], "renamed");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/users/7")
                .body(Body::from("ignored"))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["method"], "DELETE");
    assert_eq!(json["path"], "/users/7/delete");
    // Only POST and PUT carry a body to the backend
    assert_eq!(json["body"], "");

    gateway.shutdown().await;
}

// == Routing Precedence ==

#[tokio::test]
async fn test_overlapping_patterns_follow_table_order() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({
            "/a/{x}": {"GET": {"target": backend.url("/first/{x}")}},
            "/a/b": {"POST": {"target": backend.url("/second")}}
        }),
        10,
        60,
    );
    let app = gateway.app();

    let response = app.clone().oneshot(get("/a/b")).await.unwrap();
    assert_eq!(body_to_json(response.into_body()).await["path"], "/first/b");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/a/b")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_to_json(response.into_body()).await["path"], "/second");

    gateway.shutdown().await;
}

// == Content Type Passthrough ==

#[tokio::test]
async fn test_backend_content_type_is_relayed() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/readme": {"GET": {"target": backend.url("/text")}}}),
        10,
        60,
    );
    let app = gateway.app();

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/readme")).await.unwrap();
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"plain body");
    }

    assert_eq!(backend.hits(), 1);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_backend_content_encoding_is_relayed() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/report": {"GET": {"target": backend.url("/gzip/report")}}}),
        10,
        60,
    );
    let app = gateway.app();

    // Second reply comes from the cache and must keep the encoding too
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/report")
                    .header(header::ACCEPT_ENCODING, "gzip, deflate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_ENCODING).unwrap(), "gzip");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], GZIP_BODY);
    }

    assert_eq!(backend.hits(), 1);
    gateway.shutdown().await;
}

// == Request Bodies ==

#[tokio::test]
async fn test_oversized_body_is_dropped_and_request_still_forwarded() {
    let backend = MockBackend::start().await;
    let config = api_gateway::Config {
        max_body_bytes: 16,
        ..test_config(10, 60)
    };
    let gateway = gateway_with_config(
        json!({"/upload": {"POST": {"target": backend.url("/upload")}}}),
        &config,
    );

    let response = gateway
        .app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/upload")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("x".repeat(64)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["method"], "POST");
    assert_eq!(json["body"], "");
    assert_eq!(backend.hits(), 1);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_body_within_limit_is_forwarded() {
    let backend = MockBackend::start().await;
    let config = api_gateway::Config {
        max_body_bytes: 16,
        ..test_config(10, 60)
    };
    let gateway = gateway_with_config(
        json!({"/upload": {"PUT": {"target": backend.url("/upload")}}}),
        &config,
    );

    let response = gateway
        .app()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/upload")
                .body(Body::from("small"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(body_to_json(response.into_body()).await["body"], "small");
    gateway.shutdown().await;
}

// == Failures ==

#[tokio::test]
async fn test_no_matching_route() {
    let gateway = gateway_with(json!({}), 10, 60);

    let response = gateway.app().oneshot(get("/anything")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Route not found");
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_backend() {
    let addr = closed_addr().await;
    let gateway = gateway_with(
        json!({"/down": {"GET": {"target": format!("http://{}/down", addr)}}}),
        10,
        60,
    );

    let response = gateway.app().oneshot(get("/down")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Backend request failed");
    assert!(gateway.state().cache.is_empty().await);
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/slow": {"GET": {"target": backend.url("/slow")}}}),
        10,
        60,
    );

    let response = gateway.app().oneshot(get("/slow")).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Backend request timed out");
    gateway.shutdown().await;
}

#[tokio::test]
async fn test_relative_target_is_rejected() {
    let gateway = gateway_with(
        json!({"/odd": {"GET": {"target": "/not/absolute"}}}),
        10,
        60,
    );

    let response = gateway.app().oneshot(get("/odd")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    gateway.shutdown().await;
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests() {
    let backend = MockBackend::start().await;
    let gateway = gateway_with(
        json!({"/items/{id}": {"GET": {"target": backend.url("/items/{id}")}}}),
        100,
        60,
    );
    let app = gateway.app();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let response = app.oneshot(get(&format!("/items/{}", i % 5))).await.unwrap();
                assert_eq!(response.status(), StatusCode::OK);
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    // Concurrent misses may each reach the backend, but no more than once per request
    assert!(backend.hits() >= 5 && backend.hits() <= 20);
    assert_eq!(gateway.state().cache.len().await, 5);
    gateway.shutdown().await;
}
