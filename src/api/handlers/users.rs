use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use crate::services::account::ImageUpload;
use crate::utils::auth::AccessClaims;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Public projection of a user record; password hash and refresh token are
/// never part of it.
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar_url,
            cover_image: user.cover_image_url,
        }
    }
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_current_user(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<UserResponse>, AppError> {
    let user = Users::find_by_id(&claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Missing required field"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = state
        .accounts
        .update_profile(&claims.sub, &payload.full_name, &payload.email)
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .ok_or_else(|| AppError::BadRequest("No file found in request".to_string()))?;

    let filename = field.file_name().unwrap_or("image.png").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .to_vec();

    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    Ok(ImageUpload { filename, data })
}

#[utoipa::path(
    patch,
    path = "/users/me/avatar",
    request_body(content = Object, description = "Avatar image file", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Upload failed")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_avatar(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, AppError> {
    let upload = read_image_field(&mut multipart).await?;
    let updated = state.accounts.update_avatar(&claims.sub, upload).await?;

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    patch,
    path = "/users/me/cover-image",
    request_body(content = Object, description = "Cover image file", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Cover image updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Upload failed")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_cover_image(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, AppError> {
    let upload = read_image_field(&mut multipart).await?;
    let updated = state
        .accounts
        .update_cover_image(&claims.sub, upload)
        .await?;

    Ok(Json(UserResponse::from(updated)))
}
