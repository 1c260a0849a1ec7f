//! Users table (minimal profile entity).
//!
//! Accounts are resolved upstream; the engine only keeps the display profile
//! used to default nicknames and avatars.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

/// Display profile of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub user_id: String,
    pub nickname: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub nickname: String,
    pub avatar_url: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Profile> for ActiveModel {
    fn from(profile: &Profile) -> Self {
        Self {
            id: ActiveValue::Set(profile.user_id.clone()),
            nickname: ActiveValue::Set(profile.nickname.clone()),
            avatar_url: ActiveValue::Set(profile.avatar_url.clone()),
            created_at: ActiveValue::Set(profile.created_at),
        }
    }
}

impl From<Model> for Profile {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.id,
            nickname: model.nickname,
            avatar_url: model.avatar_url,
            created_at: model.created_at,
        }
    }
}
