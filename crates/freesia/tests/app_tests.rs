//! HTTP-level tests for freesia
//!
//! Every test builds an [`App`], seals it into an axum service and drives it
//! with `tower::ServiceExt::oneshot`, so routing, dispatch and handler
//! conversion are exercised together.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use freesia::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tower::ServiceExt;

async fn h1(_ctx: RequestContext) -> &'static str {
    "h1"
}

async fn h2(_ctx: RequestContext, age: i64) -> String {
    format!("age {}", age)
}

async fn user(_ctx: RequestContext, name: String) -> String {
    format!("user {}", name)
}

async fn admin(_ctx: RequestContext) -> &'static str {
    "admin"
}

async fn price(_ctx: RequestContext, amount: f64) -> String {
    format!("{:.2}", amount)
}

async fn echo(ctx: RequestContext) -> String {
    let who = ctx.query.get("who").cloned().unwrap_or_default();
    format!("{} {}", who, ctx.text().unwrap_or_default())
}

fn scenario_app() -> App {
    let mut app = App::new();
    app.get("/test", h1)
        .unwrap()
        .get("/test/<int:age>", h2)
        .unwrap()
        .get("/users/<name>", user)
        .unwrap()
        .get("/users/admin", admin)
        .unwrap()
        .get("/price/<float:amount>", price)
        .unwrap()
        .post("/echo", echo)
        .unwrap();
    app
}

async fn send(app: App, method: &str, uri: &str) -> Response {
    app.into_router()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[rstest]
#[case("GET", "/test", StatusCode::OK, "h1")]
#[case("GET", "/test/5", StatusCode::OK, "age 5")]
#[case("GET", "/test/-3", StatusCode::OK, "age -3")]
#[case("GET", "/users/admin", StatusCode::OK, "admin")]
#[case("GET", "/users/bob", StatusCode::OK, "user bob")]
#[case("GET", "/users/John%20Doe", StatusCode::OK, "user John Doe")]
#[case("GET", "/users/a%2Fb", StatusCode::OK, "user a%2Fb")]
#[case("GET", "/price/2.5", StatusCode::OK, "2.50")]
#[tokio::test]
async fn test_dispatch_success(
    #[case] method: &str,
    #[case] uri: &str,
    #[case] status: StatusCode,
    #[case] body: &str,
) {
    let response = send(scenario_app(), method, uri).await;
    assert_eq!(response.status(), status);
    assert_eq!(body_text(response).await, body);
}

#[rstest]
#[case("GET", "/test/abc", StatusCode::NOT_FOUND)]
#[case("GET", "/nope", StatusCode::NOT_FOUND)]
#[case("GET", "/users/a/b", StatusCode::NOT_FOUND)]
#[case("GET", "/price/1.2.3", StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_dispatch_failures(#[case] method: &str, #[case] uri: &str, #[case] status: StatusCode) {
    let response = send(scenario_app(), method, uri).await;
    assert_eq!(response.status(), status);
}

#[tokio::test]
async fn test_static_rule_with_space_matches_encoded_request() {
    let mut app = App::new();
    app.get("/with space", h1).unwrap();

    let response = send(app, "GET", "/with%20space").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "h1");
}

#[tokio::test]
async fn test_static_method_not_allowed_sets_allow() {
    let response = send(scenario_app(), "POST", "/test").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET");
}

#[tokio::test]
async fn test_dynamic_method_not_allowed_sets_allow() {
    let mut app = App::new();
    app.get("/items/<int:id>", h2)
        .unwrap()
        .put("/items/<int:id>", h2)
        .unwrap()
        .post("/other/<name>", user)
        .unwrap();

    let response = send(app, "POST", "/items/4").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, PUT");
}

#[tokio::test]
async fn test_request_context_reaches_handler() {
    let response = scenario_app()
        .into_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo?who=mike")
                .body(Body::from("hi there"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "mike hi there");
}

#[tokio::test]
async fn test_group_routes_are_served_under_prefix() {
    let mut group = Group::new("users", "/api/users");
    group.get("/<int:age>", h2).get("", h1);

    let mut app = App::new();
    app.register_group(group).unwrap();
    let service = app.into_router();

    let response = service
        .clone()
        .oneshot(Request::get("/api/users/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "age 7");

    let response = service
        .oneshot(Request::get("/api/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "h1");
}

#[tokio::test]
async fn test_method_view_dispatch() {
    async fn show(_ctx: RequestContext, name: String) -> String {
        format!("show {}", name)
    }
    async fn remove(_ctx: RequestContext, name: String) -> (StatusCode, String) {
        (StatusCode::ACCEPTED, format!("removed {}", name))
    }

    let mut app = App::new();
    app.add_view("/person/<name>", MethodView::new("Person").get(show).delete(remove))
        .unwrap()
        .post("/people/<name>", user)
        .unwrap();
    let service = app.into_router();

    let response = service
        .clone()
        .oneshot(Request::get("/person/mike").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "show mike");

    let response = service
        .clone()
        .oneshot(Request::delete("/person/mike").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = service
        .oneshot(Request::post("/person/mike").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "DELETE, GET");
}

#[tokio::test]
async fn test_custom_filter_end_to_end() {
    async fn flag(_ctx: RequestContext, on: bool) -> String {
        if on { "on".into() } else { "off".into() }
    }

    let mut app = App::new();
    app.set_filter(
        "bool",
        FilterSpec::new(
            "true|false",
            |raw| {
                raw.parse::<bool>()
                    .map(Value::Bool)
                    .map_err(|_| DecodeError::invalid(raw, "bool"))
            },
            |v| v.to_string(),
        ),
    );
    app.get("/flags/<bool:on>", flag).unwrap();

    let response = send(app, "GET", "/flags/false").await;
    assert_eq!(body_text(response).await, "off");
}

#[tokio::test]
async fn test_type_mismatch_is_bad_request() {
    // the parameter count matches, so only the request fails
    async fn wants_bool(_ctx: RequestContext, on: bool) -> String {
        on.to_string()
    }

    let mut app = App::new();
    app.get("/n/<int:v>", wants_bool).unwrap();

    let response = send(app, "GET", "/n/1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
