use crate::api::error::AppError;
use crate::entities::{prelude::*, subscriptions, users, videos, watch_history};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// A channel's public profile as seen by a particular viewer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: u64,
    pub channels_subscribed_to_count: u64,
    pub is_subscribed: bool,
}

/// Owner summary embedded in watch-history entries instead of the raw id.
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub owner: VideoOwner,
}

/// Read-only aggregations over users, subscriptions and watch history.
/// Joins are explicit application-level ones: fetch ids, then batch-fetch
/// the related rows.
pub struct ProfileService;

impl ProfileService {
    pub async fn channel_profile(
        db: &DatabaseConnection,
        username: &str,
        viewer_id: &str,
    ) -> Result<ChannelProfile, AppError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username is required".to_string()));
        }

        let channel = Users::find()
            .filter(users::Column::Username.eq(&username))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

        let subscribers_count = Subscriptions::find()
            .filter(subscriptions::Column::ChannelId.eq(&channel.id))
            .count(db)
            .await?;

        let channels_subscribed_to_count = Subscriptions::find()
            .filter(subscriptions::Column::SubscriberId.eq(&channel.id))
            .count(db)
            .await?;

        let is_subscribed = Subscriptions::find()
            .filter(subscriptions::Column::ChannelId.eq(&channel.id))
            .filter(subscriptions::Column::SubscriberId.eq(viewer_id))
            .count(db)
            .await?
            > 0;

        Ok(ChannelProfile {
            full_name: channel.full_name,
            username: channel.username,
            email: channel.email,
            avatar: channel.avatar_url,
            cover_image: channel.cover_image_url,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        })
    }

    pub async fn watch_history(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<Vec<WatchHistoryEntry>, AppError> {
        let entries = WatchHistory::find()
            .filter(watch_history::Column::UserId.eq(user_id))
            .order_by_asc(watch_history::Column::Id)
            .all(db)
            .await?;

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids: Vec<String> = entries.iter().map(|e| e.video_id.clone()).collect();
        let videos_by_id: HashMap<String, videos::Model> = Videos::find()
            .filter(videos::Column::Id.is_in(video_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        let owner_ids: Vec<String> = videos_by_id
            .values()
            .map(|v| v.owner_id.clone())
            .collect();
        let owners_by_id: HashMap<String, users::Model> = Users::find()
            .filter(users::Column::Id.is_in(owner_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        // Assemble in stored order; entries whose video or owner has been
        // deleted are skipped rather than surfaced as holes.
        let mut history = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(video) = videos_by_id.get(&entry.video_id) else {
                continue;
            };
            let Some(owner) = owners_by_id.get(&video.owner_id) else {
                continue;
            };
            history.push(WatchHistoryEntry {
                id: video.id.clone(),
                title: video.title.clone(),
                description: video.description.clone(),
                video_url: video.video_url.clone(),
                thumbnail_url: video.thumbnail_url.clone(),
                duration: video.duration,
                views: video.views,
                owner: VideoOwner {
                    full_name: owner.full_name.clone(),
                    username: owner.username.clone(),
                    avatar: owner.avatar_url.clone(),
                },
            });
        }

        Ok(history)
    }
}
