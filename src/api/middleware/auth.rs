use crate::utils::auth::validate_access_token;
use crate::{AppState, entities::prelude::Users};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::EntityTrait;

/// Accepts the access token from an `Authorization: Bearer` header or the
/// `accessToken` session cookie.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let token = match bearer {
        Some(t) => Some(t),
        None => CookieJar::from_headers(req.headers())
            .get("accessToken")
            .map(|c| c.value().to_string()),
    };

    if let Some(token) = token {
        let secret = &state.config.access_token_secret;

        if let Ok(claims) = validate_access_token(&token, secret) {
            // Check if user still exists in DB
            let user_exists = Users::find_by_id(claims.sub.clone())
                .one(&state.db)
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
                .is_some();

            if user_exists {
                req.extensions_mut().insert(claims);
                return Ok(next.run(req).await);
            }
        }
    }

    Err(StatusCode::UNAUTHORIZED)
}
