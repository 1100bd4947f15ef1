use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by short-lived access tokens. Self-contained proof of
/// identity; never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    pub sub: String, // user id
    pub username: String,
    pub exp: usize,
}

/// Claims carried by refresh tokens. The `jti` makes every minted token
/// unique, so rotation always produces a different string even within the
/// same second.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: usize,
    pub jti: String,
}

pub fn create_access_token(
    user_id: &str,
    username: &str,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(ttl_minutes))
        .expect("valid timestamp")
        .timestamp();

    let claims = AccessClaims {
        sub: user_id.to_owned(),
        username: username.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn create_refresh_token(user_id: &str, secret: &str, ttl_days: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(ttl_days))
        .expect("valid timestamp")
        .timestamp();

    let claims = RefreshClaims {
        sub: user_id.to_owned(),
        exp: expiration as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<AccessClaims> {
    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims> {
    let token_data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
