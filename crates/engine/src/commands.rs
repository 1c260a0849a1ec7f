//! Command structs for engine operations.
//!
//! These types group parameters for write operations (book creation, joins,
//! member edits, transfers), keeping call sites readable and avoiding long
//! argument lists.

use uuid::Uuid;

use crate::{Amount, BookKind, RecordKind};

/// Hard cap for any listing page.
pub const MAX_PAGE_SIZE: u64 = 200;

/// Offset pagination. A missing or zero `limit` falls back to the listing's
/// default page size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Page {
    #[must_use]
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    /// Returns `(limit, offset)` with the default applied and the cap enforced.
    pub(crate) fn resolve(self, default_limit: u64) -> (u64, u64) {
        let limit = self
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default_limit)
            .min(MAX_PAGE_SIZE);
        (limit, self.offset)
    }
}

/// Create a book owned by `owner_user_id`.
#[derive(Clone, Debug)]
pub struct CreateBookCmd {
    pub owner_user_id: String,
    pub kind: BookKind,
    pub name: String,
    pub location_text: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

impl CreateBookCmd {
    #[must_use]
    pub fn new(owner_user_id: impl Into<String>, kind: BookKind, name: impl Into<String>) -> Self {
        Self {
            owner_user_id: owner_user_id.into(),
            kind,
            name: name.into(),
            location_text: None,
            nickname: None,
            avatar_url: None,
        }
    }

    #[must_use]
    pub fn location_text(mut self, location_text: impl Into<String>) -> Self {
        self.location_text = Some(location_text.into());
        self
    }

    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    #[must_use]
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

/// Update book metadata. At least one field must be set.
#[derive(Clone, Debug)]
pub struct UpdateBookCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub name: Option<String>,
    pub share_disabled: Option<bool>,
}

impl UpdateBookCmd {
    #[must_use]
    pub fn new(book_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            name: None,
            share_disabled: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn share_disabled(mut self, share_disabled: bool) -> Self {
        self.share_disabled = Some(share_disabled);
        self
    }
}

/// Self-service join of a scorebook.
#[derive(Clone, Debug)]
pub struct JoinCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

impl JoinCmd {
    #[must_use]
    pub fn new(book_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            nickname: None,
            avatar_url: None,
        }
    }

    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    #[must_use]
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

/// Owner adds a virtual member to a ledger.
#[derive(Clone, Debug)]
pub struct AddMemberCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub remark: Option<String>,
}

impl AddMemberCmd {
    #[must_use]
    pub fn new(book_id: Uuid, user_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            nickname: nickname.into(),
            avatar_url: None,
            remark: None,
        }
    }

    #[must_use]
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    #[must_use]
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// Edit a ledger member. `remark: Some("")` clears the remark.
#[derive(Clone, Debug)]
pub struct UpdateMemberCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub member_id: Uuid,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub remark: Option<String>,
}

impl UpdateMemberCmd {
    #[must_use]
    pub fn new(book_id: Uuid, user_id: impl Into<String>, member_id: Uuid) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            member_id,
            nickname: None,
            avatar_url: None,
            remark: None,
        }
    }

    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    #[must_use]
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    #[must_use]
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// Link the caller's account to a virtual ledger member.
#[derive(Clone, Debug)]
pub struct BindMemberCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub member_id: Uuid,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

impl BindMemberCmd {
    #[must_use]
    pub fn new(book_id: Uuid, user_id: impl Into<String>, member_id: Uuid) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            member_id,
            nickname: None,
            avatar_url: None,
        }
    }

    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    #[must_use]
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

/// Move `amount` from the caller's member to `to_member_id` in a scorebook.
#[derive(Clone, Debug)]
pub struct RecordTransferCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub to_member_id: Uuid,
    pub amount: Amount,
    pub note: Option<String>,
}

impl RecordTransferCmd {
    #[must_use]
    pub fn new(
        book_id: Uuid,
        user_id: impl Into<String>,
        to_member_id: Uuid,
        amount: Amount,
    ) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            to_member_id,
            amount,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Owner records an income or expense against a ledger member.
#[derive(Clone, Debug)]
pub struct LedgerRecordCmd {
    pub book_id: Uuid,
    pub user_id: String,
    pub member_id: Uuid,
    pub kind: RecordKind,
    pub amount: Amount,
    pub note: Option<String>,
}

impl LedgerRecordCmd {
    #[must_use]
    pub fn new(
        book_id: Uuid,
        user_id: impl Into<String>,
        member_id: Uuid,
        kind: RecordKind,
        amount: Amount,
    ) -> Self {
        Self {
            book_id,
            user_id: user_id.into(),
            member_id,
            kind,
            amount,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
