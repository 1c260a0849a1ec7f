use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*, sea_query::OnConflict};

use crate::{
    EngineError, ResultEngine,
    users::{self, Profile},
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create or refresh the display profile used to default member names.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        nickname: &str,
        avatar_url: Option<&str>,
    ) -> ResultEngine<Profile> {
        let nickname = normalize_required_name(nickname, "nickname")?;
        let avatar_url = normalize_optional_text(avatar_url).unwrap_or_default();
        let profile = Profile {
            user_id: user_id.to_string(),
            nickname,
            avatar_url,
            created_at: Utc::now(),
        };
        with_tx!(self, |db_tx| {
            users::Entity::insert(users::ActiveModel::from(&profile))
                .on_conflict(
                    OnConflict::column(users::Column::Id)
                        .update_columns([users::Column::Nickname, users::Column::AvatarUrl])
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
            self.profile(&db_tx, user_id)
                .await?
                .map(Profile::from)
                .ok_or_else(|| EngineError::Internal(format!("profile {user_id} missing after upsert")))
        })
    }

    pub async fn profile_of(&self, user_id: &str) -> ResultEngine<Option<Profile>> {
        with_tx!(self, |db_tx| {
            Ok(self.profile(&db_tx, user_id).await?.map(Profile::from))
        })
    }
}
