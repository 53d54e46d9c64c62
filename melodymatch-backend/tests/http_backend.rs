#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use melodymatch_backend::HttpBackend;
use melodymatch_core::{Backend, BackendConfig, CoreError, CredentialMode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Likes = Arc<Mutex<Vec<Value>>>;

const SESSION: &str = "JSESSIONID=valid";

async fn authenticate(headers: HeaderMap) -> StatusCode {
    let has_session = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(SESSION));
    if has_session {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn recommendations(
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let genre = params.get("genre").cloned().unwrap_or_default();
    if genre == "broken" {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!([
        {
            "id": "t1",
            "name": genre,
            "artists": ["A", "B"],
            "imageUrl": "https://i.example/t1.jpg",
            "previewUrl": "https://p.example/t1.mp3"
        },
        {
            "id": "t2",
            "name": "No Preview",
            "artists": ["C"],
            "imageUrl": "https://i.example/t2.jpg",
            "previewUrl": null
        }
    ])))
}

async fn liked_song(State(likes): State<Likes>, Json(body): Json<Value>) -> StatusCode {
    likes.lock().unwrap().push(body);
    StatusCode::OK
}

async fn create_playlist() -> Json<Value> {
    Json(json!("Playlist created with 2 songs"))
}

async fn serve(likes: Likes) -> String {
    let app = Router::new()
        .route("/authenticate", post(authenticate))
        .route("/getRecommendations", get(recommendations))
        .route("/likedSong", post(liked_song))
        .route("/createPlaylist", post(create_playlist))
        .with_state(likes);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base_url: &str, credentials: CredentialMode) -> BackendConfig {
    let mut config = BackendConfig::new(base_url);
    config.credentials = credentials;
    config.session_cookie = Some(SESSION.to_string());
    config
}

#[tokio::test]
async fn test_session_cookie_is_forwarded() {
    let base = serve(Likes::default()).await;

    let backend = HttpBackend::new(&config(&base, CredentialMode::Include)).unwrap();
    assert!(backend.probe_session().await.unwrap());
}

#[tokio::test]
async fn test_omitted_credentials_are_rejected() {
    let base = serve(Likes::default()).await;

    let backend = HttpBackend::new(&config(&base, CredentialMode::Omit)).unwrap();
    assert!(!backend.probe_session().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_backend_is_an_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend =
        HttpBackend::new(&config(&format!("http://{addr}"), CredentialMode::Include)).unwrap();
    assert!(matches!(
        backend.probe_session().await,
        Err(CoreError::NetworkError(_))
    ));
}

#[tokio::test]
async fn test_fetch_recommendations_decodes_items() {
    let base = serve(Likes::default()).await;
    let backend = HttpBackend::new(&config(&base, CredentialMode::Include)).unwrap();

    let items = backend.fetch_recommendations("hip hop").await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "t1");
    assert_eq!(items[0].title, "hip hop");
    assert_eq!(items[0].performers_display(), "A, B");
    assert_eq!(items[0].preview(), Some("https://p.example/t1.mp3"));
    assert_eq!(items[1].preview(), None);
}

#[tokio::test]
async fn test_fetch_failure_reports_status() {
    let base = serve(Likes::default()).await;
    let backend = HttpBackend::new(&config(&base, CredentialMode::Include)).unwrap();

    let result = backend.fetch_recommendations("broken").await;
    assert!(matches!(
        result,
        Err(CoreError::BackendStatus {
            endpoint: "getRecommendations",
            status: 500
        })
    ));
}

#[tokio::test]
async fn test_like_posts_track_ids() {
    let likes = Likes::default();
    let base = serve(likes.clone()).await;
    let backend = HttpBackend::new(&config(&base, CredentialMode::Include)).unwrap();

    backend.like_item("t1").await.unwrap();

    let recorded = likes.lock().unwrap().clone();
    assert_eq!(recorded, vec![json!({ "trackIds": ["t1"] })]);
}

#[tokio::test]
async fn test_playlist_message() {
    let base = serve(Likes::default()).await;
    let backend = HttpBackend::new(&config(&base, CredentialMode::Include)).unwrap();

    let message = backend.request_playlist_creation().await.unwrap();
    assert_eq!(message, "Playlist created with 2 songs");
}

#[tokio::test]
async fn test_sign_in_url_points_at_backend() {
    let base = serve(Likes::default()).await;
    let backend = HttpBackend::new(&config(&base, CredentialMode::Include)).unwrap();

    assert_eq!(
        backend.sign_in_url().unwrap().as_str(),
        format!("{base}/oauth2/authorization/spotify")
    );
}
