use crate::api::error::AppError;
use crate::api::handlers::users::UserResponse;
use crate::services::account::{ImageUpload, NewAccount};
use crate::utils::auth::AccessClaims;
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = Object, description = "fullName, username, email, password text fields plus avatar (required) and coverImage (optional) files", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Missing required field or avatar"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let mut full_name = String::new();
    let mut username = String::new();
    let mut email = String::new();
    let mut password = String::new();
    let mut avatar: Option<ImageUpload> = None;
    let mut cover_image: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "fullName" => {
                full_name = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "username" => {
                username = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "email" => {
                email = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "password" => {
                password = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "avatar" | "coverImage" => {
                let filename = field.file_name().unwrap_or("image.png").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();
                let upload = ImageUpload { filename, data };
                if name == "avatar" {
                    avatar = Some(upload);
                } else {
                    cover_image = Some(upload);
                }
            }
            _ => {}
        }
    }

    let created = state
        .accounts
        .register(NewAccount {
            full_name,
            username,
            email,
            password,
            avatar,
            cover_image,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Neither username nor email given"),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "User not found")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (user, tokens) = state
        .accounts
        .login(
            payload.username.as_deref(),
            payload.email.as_deref(),
            &payload.password,
        )
        .await?;

    let secure = state.config.cookie_secure;
    let jar = jar
        .add(session_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            secure,
        ))
        .add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            secure,
        ));

    Ok((
        jar,
        Json(LoginResponse {
            user: UserResponse::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cleared", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    state.accounts.logout(&claims.sub).await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 401, description = "Missing, invalid or already-rotated refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    // Cookie is the trusted path; the body is a fallback for non-browser
    // clients.
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| AppError::Unauthorized("Refresh token missing".to_string()))?;

    let tokens = state.accounts.refresh_session(&presented).await?;

    let secure = state.config.cookie_secure;
    let jar = jar
        .add(session_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token.clone(),
            secure,
        ))
        .add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token.clone(),
            secure,
        ));

    Ok((
        jar,
        Json(TokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Incorrect old password")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .accounts
        .change_password(&claims.sub, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
