//! Transfer primitives.
//!
//! A `Transfer` moves `amount` from one member to another inside the same
//! book. A zero amount marks a remark event: it logs an annotation change and
//! has no balance effect.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, EngineError, util::parse_uuid};

/// Ledger record direction, relative to the owner member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Owner pays the member.
    Income,
    /// Member pays the owner.
    Expense,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for RecordKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid record kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub book_id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Uuid,
    pub amount: Amount,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub fn new(
        book_id: Uuid,
        from_member_id: Uuid,
        to_member_id: Uuid,
        amount: Amount,
        note: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            from_member_id,
            to_member_id,
            amount,
            note,
            created_at: Utc::now(),
        }
    }

    pub fn is_remark(&self) -> bool {
        self.amount.is_zero()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub book_id: String,
    pub from_member_id: String,
    pub to_member_id: String,
    pub amount_minor: i64,
    pub note: String,
    pub created_at: DateTimeUtc,
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

impl From<&Transfer> for ActiveModel {
    fn from(value: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            book_id: ActiveValue::Set(value.book_id.to_string()),
            from_member_id: ActiveValue::Set(value.from_member_id.to_string()),
            to_member_id: ActiveValue::Set(value.to_member_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount.hundredths()),
            note: ActiveValue::Set(value.note.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transfer")?,
            book_id: parse_uuid(&model.book_id, "book")?,
            from_member_id: parse_uuid(&model.from_member_id, "member")?,
            to_member_id: parse_uuid(&model.to_member_id, "member")?,
            amount: Amount::new(model.amount_minor),
            note: model.note,
            created_at: model.created_at,
        })
    }
}
