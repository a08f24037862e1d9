//! In-process harness for router tests.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::auth::jwt::TokenService;
use crate::config::Config;
use crate::database::{CredentialStore, MemoryStore};
use crate::server::{AppState, build_router};

#[derive(Clone)]
pub struct TestApp {
    router: Router,
    pub tokens: Arc<TokenService>,
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

impl TestApp {
    pub fn new(require_auth: bool) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), require_auth)
    }

    pub fn with_store(store: Arc<dyn CredentialStore>, require_auth: bool) -> Self {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            "REQUIRE_AUTH" => Some(require_auth.to_string()),
            _ => None,
        })
        .unwrap();
        let tokens = Arc::new(TokenService::new(&config.jwt_secret).unwrap());
        let state = AppState {
            store,
            tokens: tokens.clone(),
            config: Arc::new(config),
        };
        Self {
            router: build_router(state),
            tokens,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn raw_post(&self, uri: &str, raw: &'static str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(raw))
            .unwrap();
        self.send(request).await
    }

    /// Register a user and return its id
    pub async fn register(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post("/register", None, json!({"username": username, "password": password}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Log in and return the bearer token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post("/login", None, json!({"username": username, "password": password}))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}
