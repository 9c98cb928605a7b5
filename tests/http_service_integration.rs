//! Integration tests for the HTTP service
//!
//! Drives `HttpService` against a stub backend on an ephemeral port

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use elove::core::{HttpService, PhotoReconciler, RemoteService, SwipeSession};
use elove::types::{Direction, EncodedImage, Error, HistoryKind, PendingIntent, RatingRequest};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

/// Request bodies the stub received, in arrival order
#[derive(Clone, Default)]
struct Recorded(Arc<Mutex<Vec<Value>>>);

impl Recorded {
    fn push(&self, body: Value) {
        self.0.lock().unwrap().push(body);
    }

    fn all(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "message": "EloVe API is running!" }))
}

async fn discover(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "User not found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "users": [
                { "id": "u2", "name": "Bea", "age": 27, "bio": "hi", "photo_url": "", "elo_rating": 1250.0 },
                { "id": "u3", "name": "Cal", "age": "29", "elo_rating": 1180.5 }
            ]
        })),
    )
}

async fn rate(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.push(body);
    Json(json!({
        "success": true,
        "mutual_match": true,
        "rating_change_rater": 4.5,
        "new_rater_rating": 1204.5,
        "match_id": "m1"
    }))
}

async fn upload(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.push(body);
    Json(json!({
        "success": true,
        "photo": { "id": "p1", "url": "/uploads/u1_p1.jpg", "is_main": true }
    }))
}

async fn photos(Path(id): Path<String>) -> Json<Value> {
    if id != "u9" {
        return Json(json!({ "success": false, "error": "Database locked" }));
    }
    Json(json!({
        "success": true,
        "photos": [
            { "id": "p1", "url": "/uploads/u9_p1.jpg", "is_main": false },
            { "id": "p2", "url": "/uploads/u9_p2.jpg", "is_main": true },
            { "id": "p3", "url": "/uploads/u9_p3.jpg", "is_main": false }
        ]
    }))
}

async fn history(Path(id): Path<String>, Query(query): Query<Vec<(String, String)>>) -> Json<Value> {
    let limit = query
        .iter()
        .find(|(k, _)| k == "limit")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    Json(json!({
        "success": true,
        "history": [{
            "id": format!("r-{limit}"),
            "rater_id": id,
            "rated_id": "u2",
            "rating": 7,
            "is_match": true,
            "type": "given",
            "created_at": "2024-05-01T12:30:00.123456"
        }]
    }))
}

async fn stats() -> &'static str {
    "<html>proxy error</html>"
}

async fn spawn_stub() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/users/:id/discover", get(discover))
        .route("/api/users/:id/photos", get(photos))
        .route("/api/users/:id/history", get(history))
        .route("/api/rate", post(rate))
        .route("/api/photos/upload", post(upload))
        .route("/api/stats", get(stats))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api/"), recorded)
}

fn client(base_url: &str) -> HttpService {
    HttpService::new(base_url, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (url, _) = spawn_stub().await;
    assert_eq!(client(&url).health().await.unwrap(), "EloVe API is running!");
}

#[tokio::test]
async fn test_discover_parses_ordered_batch() {
    let (url, _) = spawn_stub().await;
    let users = client(&url).discover("u1").await.unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Bea", "Cal"]);
    assert_eq!(users[1].bio, "");
    assert_eq!(users[1].elo_rating, 1180.5);
    assert_eq!(users[0].age, 27);
    assert_eq!(users[1].age, 29);
}

#[tokio::test]
async fn test_error_status_maps_to_service_error() {
    let (url, _) = spawn_stub().await;
    let err = client(&url).discover("missing").await.unwrap_err();

    assert_eq!(
        err,
        Error::Service {
            message: "User not found".to_string(),
            status: 404
        }
    );
    assert_eq!(err.info().status_code, 404);
}

#[tokio::test]
async fn test_success_false_is_service_error() {
    let (url, _) = spawn_stub().await;
    let err = client(&url).fetch_photos("u1").await.unwrap_err();
    assert_eq!(err.info().message, "Database locked");
    assert!(matches!(err, Error::Service { .. }));
}

#[tokio::test]
async fn test_load_all_puts_main_photo_first() {
    let (url, _) = spawn_stub().await;
    let mut photos = PhotoReconciler::new(Arc::new(client(&url)));

    assert_eq!(photos.load_all("u9").await.unwrap(), 3);
    assert_eq!(photos.main_photo_id(), Some("p2"));
    let ids: Vec<&str> = photos.photos().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p1", "p3"]);
    assert!(photos.photos().iter().all(|p| !p.is_new));
}

#[tokio::test]
async fn test_non_json_body_is_unknown() {
    let (url, _) = spawn_stub().await;
    let err = client(&url).app_stats().await.unwrap_err();
    assert_eq!(err.info().status_code, -1);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/api")).health().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.info().status_code, 0);
    assert_eq!(err.info().message, "Network error - cannot connect to server");
}

#[tokio::test]
async fn test_rating_request_shape() {
    let (url, recorded) = spawn_stub().await;
    let intent = PendingIntent::new("u2", Direction::Pass);
    let outcome = client(&url)
        .submit_rating(&RatingRequest::from_intent("u1", &intent))
        .await
        .unwrap();

    assert!(outcome.mutual_match);
    assert_eq!(outcome.rating_change_rater, 4.5);
    assert_eq!(outcome.match_id.as_deref(), Some("m1"));
    assert_eq!(outcome.rated_tier, None);
    assert_eq!(
        recorded.all(),
        vec![json!({ "rater_id": "u1", "rated_id": "u2", "rating": 5, "is_match": false })]
    );
}

#[tokio::test]
async fn test_upload_sends_data_uri() {
    let (url, recorded) = spawn_stub().await;
    let photo = client(&url)
        .upload_photo("u1", &EncodedImage::jpeg("QUJD"))
        .await
        .unwrap();

    assert_eq!(photo.id, "p1");
    assert!(photo.is_main);
    assert_eq!(
        recorded.all(),
        vec![json!({ "user_id": "u1", "photo": "data:image/jpeg;base64,QUJD" })]
    );
}

#[tokio::test]
async fn test_history_passes_limit_and_parses_naive_timestamps() {
    let (url, _) = spawn_stub().await;
    let history = client(&url).rating_history("u1", 20).await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "r-20");
    assert_eq!(history[0].kind, HistoryKind::Given);
    assert_eq!(history[0].created_at.to_rfc3339(), "2024-05-01T12:30:00.123456+00:00");
}

#[tokio::test]
async fn test_session_over_http() {
    let (url, recorded) = spawn_stub().await;
    let service = Arc::new(client(&url));
    let session = SwipeSession::new(service, "u1", 400.0);

    assert_eq!(session.refresh().await.unwrap(), 2);
    session.drag_start();
    session.drag_end(-200.0, 0.0).unwrap().unwrap();
    session.set_rating(3).unwrap();
    let report = session.confirm().await.unwrap();

    assert_eq!(report.candidate.name, "Bea");
    assert_eq!(report.direction, Direction::Pass);
    assert_eq!(session.current().unwrap().name, "Cal");
    assert_eq!(recorded.all()[0]["rating"], json!(3));
    assert_eq!(recorded.all()[0]["is_match"], json!(false));
}
