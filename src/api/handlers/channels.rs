use crate::api::error::AppError;
use crate::services::profile::{ChannelProfile, ProfileService, WatchHistoryEntry};
use crate::utils::auth::AccessClaims;
use axum::{
    Extension, Json,
    extract::{Path, State},
};

#[utoipa::path(
    get,
    path = "/channels/{username}",
    params(
        ("username" = String, Path, description = "Channel username")
    ),
    responses(
        (status = 200, description = "Channel profile with subscriber counts", body = ChannelProfile),
        (status = 400, description = "Blank username"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Channel not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_channel_profile(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(username): Path<String>,
) -> Result<Json<ChannelProfile>, AppError> {
    let profile = ProfileService::channel_profile(&state.db, &username, &claims.sub).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/users/me/watch-history",
    responses(
        (status = 200, description = "Watched videos in viewing order", body = [WatchHistoryEntry]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_watch_history(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<WatchHistoryEntry>>, AppError> {
    let history = ProfileService::watch_history(&state.db, &claims.sub).await?;
    Ok(Json(history))
}
