use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed edge: `subscriber_id` follows `channel_id`. Read-only for this
/// service; only counted and membership-checked.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubscriberId",
        to = "super::users::Column::Id"
    )]
    Subscriber,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ChannelId",
        to = "super::users::Column::Id"
    )]
    Channel,
}

impl ActiveModelBehavior for ActiveModel {}
