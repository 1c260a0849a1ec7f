//! A `Book` is the shared container members record balances in. It is either
//! a scorebook (points between players) or a ledger (money owed to the owner).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookKind {
    Scorebook,
    Ledger,
}

impl BookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scorebook => "scorebook",
            Self::Ledger => "ledger",
        }
    }
}

impl TryFrom<&str> for BookKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "scorebook" => Ok(Self::Scorebook),
            "ledger" => Ok(Self::Ledger),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid book kind: {other}"
            ))),
        }
    }
}

/// Lifecycle state. Deletion is tracked separately by `deleted_at`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Recording,
    Ended,
}

impl BookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Ended => "ended",
        }
    }
}

impl TryFrom<&str> for BookStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "recording" => Ok(Self::Recording),
            "ended" => Ok(Self::Ended),
            other => Err(EngineError::Internal(format!(
                "invalid book status: {other}"
            ))),
        }
    }
}

/// Who moved the book to `ended`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Owner,
    Idle,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Idle => "idle",
        }
    }
}

impl TryFrom<&str> for EndReason {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "idle" => Ok(Self::Idle),
            other => Err(EngineError::Internal(format!(
                "invalid end reason: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub kind: BookKind,
    pub name: String,
    pub location_text: Option<String>,
    pub owner_user_id: String,
    pub status: BookStatus,
    pub invite_code: String,
    pub share_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<EndReason>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn new(
        kind: BookKind,
        name: String,
        location_text: Option<String>,
        owner_user_id: &str,
        invite_code: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            location_text,
            owner_user_id: owner_user_id.to_string(),
            status: BookStatus::Recording,
            invite_code,
            share_disabled: false,
            created_at: now,
            updated_at: now,
            ended_at: None,
            end_reason: None,
            deleted_at: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.status == BookStatus::Recording
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id
    }

    pub(crate) fn require_recording(&self) -> ResultEngine<()> {
        if !self.is_recording() {
            return Err(EngineError::BookEnded(format!("book {} is not recording", self.id)));
        }
        Ok(())
    }

    pub(crate) fn require_kind(&self, kind: BookKind) -> ResultEngine<()> {
        if self.kind != kind {
            return Err(EngineError::InvalidArgument(format!(
                "book {} is not a {}",
                self.id,
                kind.as_str()
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub name: String,
    pub location_text: Option<String>,
    pub owner_user_id: String,
    pub status: String,
    #[sea_orm(unique)]
    pub invite_code: String,
    pub share_disabled: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub ended_at: Option<DateTimeUtc>,
    pub end_reason: Option<String>,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::members::Entity")]
    Members,
    #[sea_orm(has_many = "super::transfers::Entity")]
    Transfers,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::transfers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transfers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Book> for ActiveModel {
    fn from(value: &Book) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            location_text: ActiveValue::Set(value.location_text.clone()),
            owner_user_id: ActiveValue::Set(value.owner_user_id.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            invite_code: ActiveValue::Set(value.invite_code.clone()),
            share_disabled: ActiveValue::Set(value.share_disabled),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            ended_at: ActiveValue::Set(value.ended_at),
            end_reason: ActiveValue::Set(value.end_reason.map(|r| r.as_str().to_string())),
            deleted_at: ActiveValue::Set(value.deleted_at),
        }
    }
}

impl TryFrom<Model> for Book {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "book")?,
            kind: BookKind::try_from(model.kind.as_str())?,
            name: model.name,
            location_text: model.location_text,
            owner_user_id: model.owner_user_id,
            status: BookStatus::try_from(model.status.as_str())?,
            invite_code: model.invite_code,
            share_disabled: model.share_disabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
            ended_at: model.ended_at,
            end_reason: model
                .end_reason
                .as_deref()
                .map(EndReason::try_from)
                .transpose()?,
            deleted_at: model.deleted_at,
        })
    }
}
