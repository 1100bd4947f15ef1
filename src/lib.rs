pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::account::AccountService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::refresh_token,
        api::handlers::auth::change_password,
        api::handlers::users::get_current_user,
        api::handlers::users::update_profile,
        api::handlers::users::update_avatar,
        api::handlers::users::update_cover_image,
        api::handlers::channels::get_channel_profile,
        api::handlers::channels::get_watch_history,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::LoginRequest,
            api::handlers::auth::LoginResponse,
            api::handlers::auth::RefreshRequest,
            api::handlers::auth::TokenResponse,
            api::handlers::auth::ChangePasswordRequest,
            api::handlers::auth::MessageResponse,
            api::handlers::users::UserResponse,
            api::handlers::users::UpdateProfileRequest,
            api::handlers::health::HealthResponse,
            services::profile::ChannelProfile,
            services::profile::VideoOwner,
            services::profile::WatchHistoryEntry,
        )
    ),
    tags(
        (name = "auth", description = "Account lifecycle endpoints"),
        (name = "users", description = "Profile endpoints"),
        (name = "channels", description = "Channel and watch-history endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub accounts: Arc<AccountService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/refresh-token", post(api::handlers::auth::refresh_token))
        .route(
            "/logout",
            post(api::handlers::auth::logout).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/change-password",
            post(api::handlers::auth::change_password).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/users/me",
            get(api::handlers::users::get_current_user)
                .patch(api::handlers::users::update_profile)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/users/me/avatar",
            patch(api::handlers::users::update_avatar).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/users/me/cover-image",
            patch(api::handlers::users::update_cover_image).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/users/me/watch-history",
            get(api::handlers::channels::get_watch_history).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/channels/:username",
            get(api::handlers::channels::get_channel_profile).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_image_size + 1024 * 1024, // multipart overhead
        ))
        .with_state(state)
}
