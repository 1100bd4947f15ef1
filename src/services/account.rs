use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{prelude::*, users};
use crate::services::storage::StorageService;
use crate::utils::auth::{create_access_token, create_refresh_token, validate_refresh_token};
use crate::utils::password::{hash_password, verify_password};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// An image received from a multipart request, ready for the blob store.
pub struct ImageUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    fn storage_key(&self, prefix: &str) -> String {
        let extension = self.filename.split('.').next_back().unwrap_or("png");
        format!("{}/{}.{}", prefix, Uuid::new_v4(), extension)
    }
}

pub struct NewAccount {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<ImageUpload>,
    pub cover_image: Option<ImageUpload>,
}

/// Access/refresh pair minted together at login or refresh. The refresh
/// token's persisted copy on the user record is the sole source of truth.
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates registration, authentication, session refresh and credential
/// rotation. Holds no per-request state; everything durable lives on the
/// user record.
pub struct AccountService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
}

impl AccountService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    pub async fn register(&self, input: NewAccount) -> Result<users::Model, AppError> {
        let full_name = required(&input.full_name, "Full name is required")?;
        let username = required(&input.username, "Username is required")?.to_lowercase();
        let email = required(&input.email, "Email is required")?;
        // Blank check only; the password is stored as given, whitespace
        // included, so login verifies the exact registered string.
        required(&input.password, "Password is required")?;

        let existing = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(&username))
                    .add(users::Column::Email.eq(&email)),
            )
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(
                "User with this username or email already exists".to_string(),
            ));
        }

        let avatar = input
            .avatar
            .ok_or_else(|| AppError::BadRequest("Avatar image is required".to_string()))?;

        // Avatar is mandatory: a failed upload aborts registration.
        let avatar_url = self
            .storage
            .upload_image(&avatar.storage_key("avatars"), avatar.data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to upload avatar: {e}")))?;

        // Cover image is optional: attempted only when a file was provided,
        // and a failed upload leaves the field empty instead of aborting.
        let cover_image_url = match input.cover_image {
            Some(cover) => match self
                .storage
                .upload_image(&cover.storage_key("covers"), cover.data)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Cover image upload failed, continuing without it: {e}");
                    None
                }
            },
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let user = users::ActiveModel {
            id: Set(id.clone()),
            username: Set(username.clone()),
            email: Set(email),
            full_name: Set(full_name),
            password_hash: Set(hash_password(&input.password)?),
            avatar_url: Set(avatar_url),
            cover_image_url: Set(cover_image_url),
            refresh_token: Set(None),
            created_at: Set(Some(Utc::now())),
        };

        user.insert(&self.db).await?;

        let created = Users::find_by_id(&id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Internal("User was not created".to_string()))?;

        info!("👤 Registered user {} ({})", username, id);

        Ok(created)
    }

    pub async fn login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<(users::Model, SessionTokens), AppError> {
        let username = username.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());
        if username.is_none() && email.is_none() {
            return Err(AppError::BadRequest(
                "Username or email is required".to_string(),
            ));
        }

        let mut condition = Condition::any();
        if let Some(username) = username {
            condition = condition.add(users::Column::Username.eq(username.to_lowercase()));
        }
        if let Some(email) = email {
            condition = condition.add(users::Column::Email.eq(email));
        }

        let user = Users::find()
            .filter(condition)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }

        let tokens = self.issue_session(&user).await?;
        Ok((user, tokens))
    }

    /// Mints a fresh access/refresh pair and persists the refresh token,
    /// overwriting whatever was stored before. Concurrent logins race on this
    /// write; last write wins and earlier sessions lose refresh validity.
    async fn issue_session(&self, user: &users::Model) -> Result<SessionTokens, AppError> {
        let access_token = create_access_token(
            &user.id,
            &user.username,
            &self.config.access_token_secret,
            self.config.access_token_ttl_minutes,
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign access token: {e}")))?;

        let refresh_token = create_refresh_token(
            &user.id,
            &self.config.refresh_token_secret,
            self.config.refresh_token_ttl_days,
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {e}")))?;

        let mut active: users::ActiveModel = user.clone().into();
        active.refresh_token = Set(Some(refresh_token.clone()));
        active.update(&self.db).await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Clears the stored refresh token. Idempotent: logging out twice is not
    /// an error.
    pub async fn logout(&self, user_id: &str) -> Result<(), AppError> {
        if let Some(user) = Users::find_by_id(user_id).one(&self.db).await? {
            let mut active: users::ActiveModel = user.into();
            active.refresh_token = Set(None);
            active.update(&self.db).await?;
        }
        Ok(())
    }

    /// Rotation-on-use: a presented refresh token is valid only if it matches
    /// the stored copy byte for byte, and a successful refresh replaces it.
    pub async fn refresh_session(&self, presented: &str) -> Result<SessionTokens, AppError> {
        let claims = validate_refresh_token(presented, &self.config.refresh_token_secret)
            .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        let user = Users::find_by_id(&claims.sub)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

        if user.refresh_token.as_deref() != Some(presented) {
            return Err(AppError::Unauthorized(
                "Refresh token is expired or already used".to_string(),
            ));
        }

        self.issue_session(&user).await
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Incorrect old password".to_string(),
            ));
        }

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.update(&self.db).await?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<users::Model, AppError> {
        let full_name = required(full_name, "Full name is required")?;
        let email = required(email, "Email is required")?;

        let taken = Users::find()
            .filter(users::Column::Email.eq(&email))
            .filter(users::Column::Id.ne(user_id))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict(
                "Email is already in use by another account".to_string(),
            ));
        }

        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut active: users::ActiveModel = user.into();
        active.full_name = Set(full_name);
        active.email = Set(email);
        let updated = active.update(&self.db).await?;

        Ok(updated)
    }

    pub async fn update_avatar(
        &self,
        user_id: &str,
        upload: ImageUpload,
    ) -> Result<users::Model, AppError> {
        let url = self
            .storage
            .upload_image(&upload.storage_key("avatars"), upload.data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to upload avatar: {e}")))?;

        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut active: users::ActiveModel = user.into();
        active.avatar_url = Set(url);
        let updated = active.update(&self.db).await?;

        Ok(updated)
    }

    pub async fn update_cover_image(
        &self,
        user_id: &str,
        upload: ImageUpload,
    ) -> Result<users::Model, AppError> {
        let url = self
            .storage
            .upload_image(&upload.storage_key("covers"), upload.data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to upload cover image: {e}")))?;

        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut active: users::ActiveModel = user.into();
        active.cover_image_url = Set(Some(url));
        let updated = active.update(&self.db).await?;

        Ok(updated)
    }
}

fn required(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(message.to_string()));
    }
    Ok(trimmed.to_string())
}
