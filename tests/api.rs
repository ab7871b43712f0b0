//! End-to-end tests over the full router, backed by the in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use taskboard::{
    app::build_app,
    config::AppConfig,
    state::AppState,
    store::{DocumentStore, MemoryStore},
};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::provisioned());
        let state = AppState::from_parts(
            store.clone() as Arc<dyn DocumentStore>,
            Arc::new(AppConfig::fake()),
        );
        Self {
            app: build_app(state),
            store,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {}", t));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/auth/register",
                None,
                Some(json!({"email": email, "password": "secret1", "name": "A"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_task(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .send("POST", "/api/tasks", Some(token), Some(json!({"title": title})))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }
}

#[tokio::test]
async fn root_and_health() {
    let t = TestApp::new();
    let (status, body) = t.send("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = t.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    t.store.fail_next(1).await;
    let (status, body) = t.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "ERROR");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn end_to_end_task_lifecycle() {
    let t = TestApp::new();
    let (token, _) = t.register("a@x.com").await;

    let task = t.create_task(&token, "buy milk").await;
    assert_eq!(task["completed"], false);
    assert_eq!(task["description"], "");
    let id = task["id"].as_str().unwrap().to_string();

    let (status, list) = t.send("GET", "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([task.clone()]));

    let (status, body) = t
        .send("DELETE", &format!("/api/tasks/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = t
        .send("GET", &format!("/api/tasks/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = t
        .send("DELETE", &format!("/api/tasks/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_login_and_me() {
    let t = TestApp::new();
    let (_, user_id) = t.register("a@x.com").await;

    let (status, body) = t
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = t.send("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["name"], "A");
    assert!(me.get("password").is_none());

    let (status, body) = t
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "wrong-one"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn duplicate_registration_is_rejected_and_first_user_kept() {
    let t = TestApp::new();
    let (_, first_id) = t.register("a@x.com").await;

    let (status, body) = t
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@x.com", "password": "another1", "name": "B"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(t.store.item_count("Users").await, 1);

    // The original password still works.
    let (status, body) = t
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], first_id.as_str());
    assert_eq!(body["user"]["name"], "A");
}

#[tokio::test]
async fn malformed_bodies_are_400_with_error_field() {
    let t = TestApp::new();
    let (status, body) = t
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@x.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = t
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@x.com", "password": "12345", "name": "A"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (token, _) = t.register("a@x.com").await;
    let (status, body) = t
        .send("POST", "/api/tasks", Some(&token), Some(json!({"description": "no title"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let t = TestApp::new();
    for (method, uri) in [
        ("GET", "/auth/me"),
        ("GET", "/api/tasks"),
        ("GET", "/api/tasks/x"),
        ("DELETE", "/api/tasks/x"),
    ] {
        let (status, body) = t.send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(body["error"].is_string());

        let (status, _) = t.send(method, uri, Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn client_supplied_owner_is_ignored() {
    let t = TestApp::new();
    let (token, user_id) = t.register("a@x.com").await;

    let (status, task) = t
        .send(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({"title": "mine", "userId": "someone-else"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["userId"], user_id.as_str());
}

#[tokio::test]
async fn other_users_get_403_without_content() {
    let t = TestApp::new();
    let (owner, _) = t.register("a@x.com").await;
    let (intruder, _) = t.register("b@x.com").await;
    let task = t.create_task(&owner, "private").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(json!({"title": "hijacked"}))),
        ("DELETE", None),
    ] {
        let (status, res) = t.send(method, &uri, Some(&intruder), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", method);
        assert!(!res.to_string().contains("private"));
    }

    let (status, list) = t.send("GET", "/api/tasks", Some(&intruder), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    let (status, still) = t.send("GET", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still, task);
}

#[tokio::test]
async fn partial_update_preserves_fields() {
    let t = TestApp::new();
    let (token, _) = t.register("a@x.com").await;
    let (_, task) = t
        .send(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({"title": "buy milk", "description": "2 litres"})),
        )
        .await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, updated) = t
        .send("PUT", &uri, Some(&token), Some(json!({"completed": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["title"], "buy milk");
    assert_eq!(updated["description"], "2 litres");
    assert_eq!(updated["createdAt"], task["createdAt"]);
    assert_eq!(updated["id"], task["id"]);
    assert_eq!(updated["userId"], task["userId"]);

    let (status, _) = t
        .send("PUT", "/api/tasks/missing", Some(&token), Some(json!({"title": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_during_request_is_500_without_details() {
    let t = TestApp::new();
    let (token, _) = t.register("a@x.com").await;

    t.store.fail_next(1).await;
    let (status, body) = t.send("GET", "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn unknown_routes_and_methods_answer_with_json_errors() {
    let t = TestApp::new();

    let (status, body) = t.send("GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");

    let (status, body) = t.send("PATCH", "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");

    let (status, body) = t.send("POST", "/health", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["error"].is_string());
}
