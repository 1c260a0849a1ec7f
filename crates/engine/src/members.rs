//! Members of a book. A member with no `user_id` is a ledger placeholder
//! ("virtual" member) that an account can bind to later.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "member" => Ok(Self::Member),
            other => Err(EngineError::Internal(format!(
                "invalid member role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Option<String>,
    pub role: MemberRole,
    pub nickname: String,
    pub avatar_url: String,
    /// Owner-authored note; only shown to the book owner.
    pub remark: Option<String>,
    pub balance: Amount,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        book_id: Uuid,
        user_id: Option<String>,
        role: MemberRole,
        nickname: String,
        avatar_url: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            book_id,
            user_id,
            role,
            nickname,
            avatar_url,
            remark: None,
            balance: Amount::ZERO,
            joined_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == MemberRole::Owner
    }

    pub fn is_virtual(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub book_id: String,
    pub user_id: Option<String>,
    pub role: String,
    pub nickname: String,
    pub avatar_url: String,
    pub remark: Option<String>,
    pub balance_minor: i64,
    pub joined_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::books::Entity",
        from = "Column::BookId",
        to = "super::books::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Books,
}

impl Related<super::books::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Books.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Member> for ActiveModel {
    fn from(value: &Member) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            book_id: ActiveValue::Set(value.book_id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            nickname: ActiveValue::Set(value.nickname.clone()),
            avatar_url: ActiveValue::Set(value.avatar_url.clone()),
            remark: ActiveValue::Set(value.remark.clone()),
            balance_minor: ActiveValue::Set(value.balance.hundredths()),
            joined_at: ActiveValue::Set(value.joined_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "member")?,
            book_id: parse_uuid(&model.book_id, "book")?,
            user_id: model.user_id,
            role: MemberRole::try_from(model.role.as_str())?,
            nickname: model.nickname,
            avatar_url: model.avatar_url,
            remark: model.remark,
            balance: Amount::new(model.balance_minor),
            joined_at: model.joined_at,
            updated_at: model.updated_at,
        })
    }
}
