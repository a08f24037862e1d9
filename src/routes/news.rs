//! News CRUD routes

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::models::AuthUser;
use crate::database::{NewNews, News, NewsUpdate};
use crate::error::{AppError, AppResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Only read when the service runs without the auth gate
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("news '{}' not found", id))
}

fn non_blank(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(AppError::Validation(format!("{} must not be empty", field))),
        other => Ok(other),
    }
}

/// `GET /news`
pub async fn list_news(State(app_state): State<AppState>) -> AppResult<Json<Vec<News>>> {
    let news = app_state.store.list_news().await?;
    Ok(Json(news))
}

/// `GET /news/{id}`
pub async fn get_news(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<News>> {
    app_state
        .store
        .get_news(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// `POST /news`
///
/// With the auth gate on, the author is the token subject (which must still
/// name a stored user) and any `author` field in the body is ignored. Without it, the body must name the author.
pub async fn create_news(
    State(app_state): State<AppState>,
    user: Option<AuthUser>,
    payload: Result<Json<CreateNewsRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<News>)> {
    let Json(payload) = payload?;

    let author = if app_state.config.require_auth {
        let user = user.ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;
        // A valid token can outlive its user (memory store restart, deleted row).
        if app_state.store.find_user_by_id(&user.id).await?.is_none() {
            tracing::warn!("Token subject {} no longer exists", user.id);
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }
        user.id
    } else {
        match (user, payload.author) {
            (Some(user), _) => user.id,
            (None, Some(author)) if !author.trim().is_empty() => author,
            (None, _) => return Err(AppError::Validation("title, body and author are required".to_string())),
        }
    };

    if payload.title.trim().is_empty() || payload.body.trim().is_empty() {
        return Err(AppError::Validation("title and body are required".to_string()));
    }

    let draft = NewNews {
        id: Uuid::new_v4().to_string(),
        title: payload.title,
        body: payload.body,
        author,
    };

    let news = app_state.store.insert_news(draft).await?;
    tracing::info!("Created news id={} author={}", news.id, news.author);

    Ok((StatusCode::CREATED, Json(news)))
}

/// `PUT /news/{id}`
///
/// Absent fields keep their stored value. Ownership is not enforced; edits by
/// someone other than the author are logged.
pub async fn update_news(
    State(app_state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNewsRequest>, JsonRejection>,
) -> AppResult<Json<News>> {
    let Json(payload) = payload?;

    let update = NewsUpdate {
        title: non_blank("title", payload.title)?,
        body: non_blank("body", payload.body)?,
        author: if app_state.config.require_auth {
            None
        } else {
            non_blank("author", payload.author)?
        },
    };

    let news = app_state.store.update_news(&id, update).await.map_err(|e| match e {
        crate::database::StoreError::NotFound => not_found(&id),
        other => other.into(),
    })?;

    match &user {
        Some(user) if user.id != news.author => {
            tracing::info!("News {} (author {}) updated by {}", news.id, news.author, user.id);
        }
        _ => tracing::debug!("Updated news id={}", news.id),
    }

    Ok(Json(news))
}

/// `DELETE /news/{id}`
pub async fn delete_news(
    State(app_state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    app_state.store.delete_news(&id).await.map_err(|e| match e {
        crate::database::StoreError::NotFound => not_found(&id),
        other => other.into(),
    })?;

    let by = user.map(|u| u.id).unwrap_or_else(|| "anonymous".to_string());
    tracing::info!("Deleted news id={} by {}", id, by);

    Ok(StatusCode::NO_CONTENT)
}

pub fn create_news_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_news).post(create_news))
        .route("/news/{id}", get(get_news).put(update_news).delete(delete_news))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::collections::HashSet;

    async fn authed(app: &TestApp) -> (String, String) {
        let id = app.register("alice", "pw1").await;
        let token = app.login("alice", "pw1").await;
        (id, token)
    }

    #[tokio::test]
    async fn news_routes_require_a_token() {
        let app = TestApp::new(true);

        let (status, body) = app.get("/news", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header is missing");

        let (status, _) = app.post("/news", Some("bogus"), json!({"title": "T", "body": "B"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_vanished_user_cannot_create() {
        let app = TestApp::new(true);
        let token = app.tokens.issue("user-from-before-restart").unwrap();

        let (status, body) = app.post("/news", Some(&token), json!({"title": "T", "body": "B"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");

        let (_, list) = app.get("/news", Some(&token)).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn empty_list_is_an_empty_array() {
        let app = TestApp::new(true);
        let (_, token) = authed(&app).await;

        let (status, body) = app.get("/news", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips_fields() {
        let app = TestApp::new(true);
        let (user_id, token) = authed(&app).await;

        let (status, created) = app
            .post("/news", Some(&token), json!({"title": "Título", "body": "Corpo ✓", "author": "ignored"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["author"], user_id.as_str());

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = app.get(&format!("/news/{}", id), Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
        assert_eq!(fetched["title"], "Título");
        assert_eq!(fetched["body"], "Corpo ✓");
    }

    #[tokio::test]
    async fn create_validates_required_fields() {
        let app = TestApp::new(true);
        let (_, token) = authed(&app).await;

        let (status, _) = app.post("/news", Some(&token), json!({"title": "T"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.post("/news", Some(&token), json!({"title": " ", "body": "B"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn created_at_does_not_decrease() {
        let app = TestApp::new(true);
        let (_, token) = authed(&app).await;

        for i in 0..5 {
            app.post("/news", Some(&token), json!({"title": format!("T{}", i), "body": "B"})).await;
        }

        let (_, list) = app.get("/news", Some(&token)).await;
        let stamps: Vec<chrono::DateTime<chrono::Utc>> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|n| serde_json::from_value(n["created_at"].clone()).unwrap())
            .collect();
        assert_eq!(stamps.len(), 5);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let app = TestApp::new(true);
        let (_, token) = authed(&app).await;

        let (status, _) = app.get("/news/does-not-exist", Some(&token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.put("/news/does-not-exist", Some(&token), json!({"title": "T2"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.delete("/news/does-not-exist", Some(&token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
    }

    #[tokio::test]
    async fn update_rejects_blank_fields() {
        let app = TestApp::new(true);
        let (_, token) = authed(&app).await;
        let (_, created) = app.post("/news", Some(&token), json!({"title": "T", "body": "B"})).await;
        let path = format!("/news/{}", created["id"].as_str().unwrap());

        let (status, _) = app.put(&path, Some(&token), json!({"body": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn any_authenticated_user_may_update() {
        let app = TestApp::new(true);
        let (alice_id, alice) = authed(&app).await;
        app.register("bob", "pw2").await;
        let bob = app.login("bob", "pw2").await;

        let (_, created) = app.post("/news", Some(&alice), json!({"title": "T", "body": "B"})).await;
        let path = format!("/news/{}", created["id"].as_str().unwrap());

        let (status, updated) = app.put(&path, Some(&bob), json!({"body": "B2"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["author"], alice_id.as_str());
        assert_eq!(updated["body"], "B2");
        assert_eq!(updated["title"], "T");
    }

    #[tokio::test]
    async fn unauthenticated_mode_takes_author_from_body() {
        let app = TestApp::new(false);
        let alice = app.register("alice", "pw1").await;
        let bob = app.register("bob", "pw2").await;

        let (status, _) = app.post("/news", None, json!({"title": "T", "body": "B"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .post("/news", None, json!({"title": "T", "body": "B", "author": "ghost"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, created) = app
            .post("/news", None, json!({"title": "T", "body": "B", "author": alice}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["author"], alice.as_str());

        let path = format!("/news/{}", created["id"].as_str().unwrap());
        let (status, updated) = app.put(&path, None, json!({"author": bob})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["author"], bob.as_str());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_yield_distinct_records() {
        let app = TestApp::new(true);
        let (_, token) = authed(&app).await;

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let app = app.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    app.post("/news", Some(&token), json!({"title": format!("T{}", i), "body": "B"}))
                        .await
                })
            })
            .collect();

        for handle in handles {
            let (status, _) = handle.await.unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, list) = app.get("/news", Some(&token)).await;
        let items: &Vec<Value> = list.as_array().unwrap();
        let ids: HashSet<&str> = items.iter().map(|n| n["id"].as_str().unwrap()).collect();
        assert_eq!(items.len(), 100);
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test]
    async fn end_to_end_lifecycle() {
        let app = TestApp::new(true);

        let (status, user) = app
            .post("/register", None, json!({"username": "alice", "password": "pw1"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let alice_id = user["id"].as_str().unwrap().to_string();

        let (status, login) = app
            .post("/login", None, json!({"username": "alice", "password": "pw1"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = login["token"].as_str().unwrap().to_string();

        let (status, created) = app.post("/news", Some(&token), json!({"title": "T", "body": "B"})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["author"], alice_id.as_str());
        let path = format!("/news/{}", created["id"].as_str().unwrap());

        let (status, fetched) = app.get(&path, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = app.put(&path, Some(&token), json!({"title": "T2"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "T2");
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["created_at"], created["created_at"]);

        let (status, _) = app.delete(&path, Some(&token)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.get(&path, Some(&token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
