use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use cliptube_backend::config::AppConfig;
use cliptube_backend::entities::{subscriptions, users, videos, watch_history};
use cliptube_backend::infrastructure::database;
use cliptube_backend::services::account::AccountService;
use cliptube_backend::services::profile::ProfileService;
use cliptube_backend::services::storage::StorageService;
use cliptube_backend::utils::auth::create_access_token;
use cliptube_backend::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

struct MockStorageService {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStorageService {
    fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_image(&self, key: &str, data: Vec<u8>) -> anyhow::Result<String> {
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(format!("http://blobs.test/cliptube/{}", key))
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(key))
    }
}

async fn setup() -> (axum::Router, DatabaseConnection, AppConfig) {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let storage = Arc::new(MockStorageService::new());
    let config = AppConfig::development();
    let accounts = Arc::new(AccountService::new(
        db.clone(),
        storage.clone(),
        config.clone(),
    ));
    let app = create_app(AppState {
        db: db.clone(),
        storage,
        accounts,
        config: config.clone(),
    });
    (app, db, config)
}

async fn seed_user(db: &DatabaseConnection, username: &str) -> users::Model {
    users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        full_name: Set(format!("{username} full name")),
        password_hash: Set("unused-in-these-tests".to_string()),
        avatar_url: Set(format!("http://blobs.test/avatars/{username}.png")),
        cover_image_url: Set(None),
        refresh_token: Set(None),
        created_at: Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .unwrap()
}

async fn seed_subscription(db: &DatabaseConnection, subscriber: &str, channel: &str) {
    subscriptions::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        subscriber_id: Set(subscriber.to_string()),
        channel_id: Set(channel.to_string()),
        created_at: Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn seed_video(db: &DatabaseConnection, owner: &str, title: &str) -> videos::Model {
    videos::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        owner_id: Set(owner.to_string()),
        title: Set(title.to_string()),
        description: Set(format!("{title} description")),
        video_url: Set(format!("http://blobs.test/videos/{title}.mp4")),
        thumbnail_url: Set(format!("http://blobs.test/thumbs/{title}.png")),
        duration: Set(120.5),
        views: Set(42),
        is_published: Set(true),
        created_at: Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .unwrap()
}

async fn seed_watch(db: &DatabaseConnection, user: &str, video: &str) {
    watch_history::ActiveModel {
        user_id: Set(user.to_string()),
        video_id: Set(video.to_string()),
        watched_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

fn bearer(config: &AppConfig, user: &users::Model) -> String {
    let token = create_access_token(
        &user.id,
        &user.username,
        &config.access_token_secret,
        config.access_token_ttl_minutes,
    )
    .unwrap();
    format!("Bearer {token}")
}

async fn get_json(app: &axum::Router, uri: &str, auth: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("Authorization", auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_channel_profile_counts_and_membership() {
    let (app, db, config) = setup().await;

    let channel = seed_user(&db, "channel").await;
    let sub1 = seed_user(&db, "sub1").await;
    let sub2 = seed_user(&db, "sub2").await;
    let sub3 = seed_user(&db, "sub3").await;
    let outsider = seed_user(&db, "outsider").await;

    // 3 subscribers to the channel
    seed_subscription(&db, &sub1.id, &channel.id).await;
    seed_subscription(&db, &sub2.id, &channel.id).await;
    seed_subscription(&db, &sub3.id, &channel.id).await;
    // The channel itself subscribes to 2 others
    seed_subscription(&db, &channel.id, &sub1.id).await;
    seed_subscription(&db, &channel.id, &outsider.id).await;

    // Viewed by one of the subscribers
    let (status, json) = get_json(&app, "/channels/channel", &bearer(&config, &sub1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["subscribersCount"], 3);
    assert_eq!(json["channelsSubscribedToCount"], 2);
    assert_eq!(json["isSubscribed"], true);
    assert_eq!(json["fullName"], "channel full name");
    assert_eq!(json["username"], "channel");
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("refreshToken").is_none());

    // Viewed by a non-subscriber
    let (status, json) = get_json(&app, "/channels/channel", &bearer(&config, &outsider)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["isSubscribed"], false);
}

#[tokio::test]
async fn test_channel_profile_unknown_username() {
    let (app, db, config) = setup().await;
    let viewer = seed_user(&db, "viewer").await;

    let (status, _) = get_json(&app, "/channels/ghost", &bearer(&config, &viewer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_channel_profile_blank_username() {
    let (_, db, _) = setup().await;

    let err = ProfileService::channel_profile(&db, "   ", "viewer-id")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        cliptube_backend::api::error::AppError::BadRequest(_)
    ));
}

#[tokio::test]
async fn test_channel_profile_username_is_case_insensitive() {
    let (app, db, config) = setup().await;
    let channel = seed_user(&db, "mixedcase").await;

    let (status, json) = get_json(&app, "/channels/MixedCase", &bearer(&config, &channel)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "mixedcase");
}

#[tokio::test]
async fn test_watch_history_order_and_owner_projection() {
    let (app, db, config) = setup().await;

    let owner = seed_user(&db, "creator").await;
    let watcher = seed_user(&db, "watcher").await;

    let v1 = seed_video(&db, &owner.id, "first").await;
    let v2 = seed_video(&db, &owner.id, "second").await;
    let v3 = seed_video(&db, &owner.id, "third").await;

    // Watched out of creation order; retrieval must follow viewing order
    seed_watch(&db, &watcher.id, &v2.id).await;
    seed_watch(&db, &watcher.id, &v1.id).await;
    seed_watch(&db, &watcher.id, &v3.id).await;

    let (status, json) = get_json(&app, "/users/me/watch-history", &bearer(&config, &watcher)).await;
    assert_eq!(status, StatusCode::OK);

    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["title"], "second");
    assert_eq!(entries[1]["title"], "first");
    assert_eq!(entries[2]["title"], "third");

    // Owner is a reduced summary, not the raw id
    let owner_json = entries[0]["owner"].as_object().unwrap();
    assert_eq!(owner_json.len(), 3);
    assert_eq!(owner_json["fullName"], "creator full name");
    assert_eq!(owner_json["username"], "creator");
    assert!(owner_json["avatar"].as_str().is_some());
}

#[tokio::test]
async fn test_watch_history_empty_for_new_user() {
    let (app, db, config) = setup().await;
    let watcher = seed_user(&db, "fresh").await;

    let (status, json) = get_json(&app, "/users/me/watch-history", &bearer(&config, &watcher)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_watch_history_is_scoped_to_the_caller() {
    let (app, db, config) = setup().await;

    let owner = seed_user(&db, "creator").await;
    let watcher = seed_user(&db, "watcher").await;
    let other = seed_user(&db, "other").await;
    let v1 = seed_video(&db, &owner.id, "mine").await;
    let v2 = seed_video(&db, &owner.id, "theirs").await;

    seed_watch(&db, &watcher.id, &v1.id).await;
    seed_watch(&db, &other.id, &v2.id).await;

    let (status, json) = get_json(&app, "/users/me/watch-history", &bearer(&config, &watcher)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "mine");
}
