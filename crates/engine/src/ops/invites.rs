use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Book, BookKind, BookStatus, EngineError, JoinCmd, ResultEngine, books,
    invite::normalize_invite_code,
};

use super::{Engine, JoinOutcome, with_tx};

/// What an invite link reveals before joining.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvitePreview {
    pub book_id: Uuid,
    pub kind: BookKind,
    pub name: String,
    pub status: BookStatus,
    pub share_disabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Book> for InvitePreview {
    fn from(book: &Book) -> Self {
        Self {
            book_id: book.id,
            kind: book.kind,
            name: book.name.clone(),
            status: book.status,
            share_disabled: book.share_disabled,
            updated_at: book.updated_at,
        }
    }
}

impl Engine {
    /// Look up a live book by invite code. Codes match case-insensitively.
    pub async fn resolve_invite(&self, code: &str) -> ResultEngine<InvitePreview> {
        let code = normalize_invite_code(code)
            .ok_or_else(|| EngineError::InvalidArgument("invite code is empty".to_string()))?;
        with_tx!(self, |db_tx| {
            let model = books::Entity::find()
                .filter(books::Column::InviteCode.eq(code))
                .filter(books::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("invite".to_string()))?;
            let book = Book::try_from(model)?;
            if book.kind == BookKind::Ledger && book.share_disabled {
                return Err(EngineError::Forbidden("share disabled".to_string()));
            }
            Ok(InvitePreview::from(&book))
        })
    }

    /// Resolve an invite code and join the scorebook behind it.
    pub async fn join_by_code(
        &self,
        code: &str,
        user_id: &str,
        nickname: Option<&str>,
        avatar_url: Option<&str>,
    ) -> ResultEngine<JoinOutcome> {
        let preview = self.resolve_invite(code).await?;
        let mut cmd = JoinCmd::new(preview.book_id, user_id);
        if let Some(nickname) = nickname {
            cmd = cmd.nickname(nickname);
        }
        if let Some(avatar_url) = avatar_url {
            cmd = cmd.avatar_url(avatar_url);
        }
        self.join_book(cmd).await
    }
}
