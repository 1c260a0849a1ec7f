//! Domain events emitted after a mutation commits.
//!
//! Events serialize as `{"type": "...", "data": {...}}` frames and are pushed
//! to the book's realtime room by the caller. Remarks never appear in events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{Amount, Book, EndReason, EndedBook, Member, MemberRole, Transfer};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: Uuid,
    pub nickname: String,
    pub avatar_url: String,
    pub role: MemberRole,
    pub balance: Amount,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            nickname: member.nickname.clone(),
            avatar_url: member.avatar_url.clone(),
            role: member.role,
            balance: member.balance,
            joined_at: member.joined_at,
            updated_at: member.updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Uuid,
    pub amount: Amount,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BookEvent {
    #[serde(rename = "book.created")]
    BookCreated { id: Uuid },
    #[serde(rename = "book.updated", rename_all = "camelCase")]
    BookUpdated {
        id: Uuid,
        name: String,
        share_disabled: bool,
        updated_at: DateTime<Utc>,
    },
    #[serde(rename = "book.ended", rename_all = "camelCase")]
    BookEnded {
        id: Uuid,
        ended_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
        winners: Vec<MemberView>,
        auto_ended: bool,
    },
    #[serde(rename = "member.joined")]
    MemberJoined { member: MemberView },
    #[serde(rename = "member.updated")]
    MemberUpdated { member: MemberView },
    #[serde(rename = "record.created")]
    RecordCreated { record: RecordView },
}

impl BookEvent {
    pub fn book_created(book: &Book) -> Self {
        Self::BookCreated { id: book.id }
    }

    pub fn book_updated(book: &Book) -> Self {
        Self::BookUpdated {
            id: book.id,
            name: book.name.clone(),
            share_disabled: book.share_disabled,
            updated_at: book.updated_at,
        }
    }

    pub fn book_ended(ended: &EndedBook) -> Self {
        Self::BookEnded {
            id: ended.book.id,
            ended_at: ended.book.ended_at,
            updated_at: ended.book.updated_at,
            winners: ended.winners.iter().map(MemberView::from).collect(),
            auto_ended: ended.book.end_reason == Some(EndReason::Idle),
        }
    }

    pub fn member_joined(member: &Member) -> Self {
        Self::MemberJoined {
            member: member.into(),
        }
    }

    pub fn member_updated(member: &Member) -> Self {
        Self::MemberUpdated {
            member: member.into(),
        }
    }

    /// `redact_note` hides the note for rooms shared with non-owner readers.
    pub fn record_created(transfer: &Transfer, redact_note: bool) -> Self {
        Self::RecordCreated {
            record: RecordView {
                id: transfer.id,
                from_member_id: transfer.from_member_id,
                to_member_id: transfer.to_member_id,
                amount: transfer.amount,
                note: if redact_note {
                    String::new()
                } else {
                    transfer.note.clone()
                },
                created_at: transfer.created_at,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
