use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, DbErr, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Book, BookKind, BookStatus, CreateBookCmd, EndReason, EngineError, Member, MemberRole, Page,
    ResultEngine, UpdateBookCmd, books, members, transfers,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

/// Invite code allocation attempts before book creation gives up.
const INVITE_CODE_ATTEMPTS: usize = 5;

/// Default page size for book listings.
const BOOKS_PAGE_SIZE: u64 = 20;

const DEFAULT_OWNER_NICKNAME: &str = "Owner";

/// A book row as seen by one of its members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub book: Book,
    pub member_count: u64,
    pub transfer_count: u64,
    pub my_member_id: Uuid,
    pub my_role: MemberRole,
}

/// Book with its members, as seen by `me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub me: Member,
    /// Ordered by join time. Remarks are blank unless `me` is the owner.
    pub members: Vec<Member>,
}

/// Result of ending a book: the final row plus its top members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndedBook {
    pub book: Book,
    pub winners: Vec<Member>,
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl Engine {
    /// Create a book and its owner member in one transaction.
    pub async fn create_book(&self, cmd: CreateBookCmd) -> ResultEngine<(Book, Member)> {
        let name = normalize_required_name(&cmd.name, "book name")?;
        let location_text = normalize_optional_text(cmd.location_text.as_deref());

        for attempt in 1..=INVITE_CODE_ATTEMPTS {
            let book = Book::new(
                cmd.kind,
                name.clone(),
                location_text.clone(),
                &cmd.owner_user_id,
                self.invite_codes.generate(),
            );
            match self.insert_book(book, &cmd).await {
                Ok(created) => {
                    tracing::info!(book_id = %created.0.id, kind = cmd.kind.as_str(), "book created");
                    return Ok(created);
                }
                Err(EngineError::Database(err)) if is_unique_violation(&err) => {}
                Err(err) => return Err(err),
            }
            tracing::warn!(attempt, "invite code collision, retrying");
        }
        Err(EngineError::Internal(
            "could not allocate a unique invite code".to_string(),
        ))
    }

    /// Insert the book first so an invite code collision fails on the unique
    /// index before anything else is read.
    async fn insert_book(&self, book: Book, cmd: &CreateBookCmd) -> ResultEngine<(Book, Member)> {
        with_tx!(self, |db_tx| {
            books::ActiveModel::from(&book).insert(&db_tx).await?;
            let profile = self.profile(&db_tx, &cmd.owner_user_id).await?;
            let nickname = normalize_optional_text(cmd.nickname.as_deref())
                .or_else(|| profile.as_ref().map(|p| p.nickname.clone()))
                .unwrap_or_else(|| DEFAULT_OWNER_NICKNAME.to_string());
            let avatar_url = normalize_optional_text(cmd.avatar_url.as_deref())
                .or_else(|| profile.map(|p| p.avatar_url))
                .unwrap_or_default();
            let owner = Member::new(
                book.id,
                Some(cmd.owner_user_id.clone()),
                MemberRole::Owner,
                nickname,
                avatar_url,
            );
            members::ActiveModel::from(&owner).insert(&db_tx).await?;
            Ok((book, owner))
        })
    }

    /// Books `user_id` is a member of, optionally restricted to one kind.
    pub async fn list_books(
        &self,
        user_id: &str,
        kind: Option<BookKind>,
        page: Page,
    ) -> ResultEngine<Vec<BookSummary>> {
        let (limit, offset) = page.resolve(BOOKS_PAGE_SIZE);
        with_tx!(self, |db_tx| {
            let mut query = books::Entity::find()
                .join(JoinType::InnerJoin, books::Relation::Members.def())
                .filter(members::Column::UserId.eq(user_id))
                .filter(books::Column::DeletedAt.is_null());
            if let Some(kind) = kind {
                query = query.filter(books::Column::Kind.eq(kind.as_str()));
            }
            if kind == Some(BookKind::Ledger) {
                query = query.order_by_asc(Expr::cust(
                    "CASE WHEN books.status = 'recording' THEN 0 ELSE 1 END",
                ));
            }
            let book_models = query
                .order_by_desc(books::Column::UpdatedAt)
                .offset(offset)
                .limit(limit)
                .all(&db_tx)
                .await?;
            let ids: Vec<String> = book_models.iter().map(|b| b.id.clone()).collect();

            let member_counts = self.count_by_book(&db_tx, &ids, CountTarget::Members).await?;
            let transfer_counts = self.count_by_book(&db_tx, &ids, CountTarget::Transfers).await?;
            let mine: HashMap<String, Member> = members::Entity::find()
                .filter(members::Column::BookId.is_in(ids.clone()))
                .filter(members::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| Ok((model.book_id.clone(), Member::try_from(model)?)))
                .collect::<ResultEngine<_>>()?;

            let mut summaries = Vec::with_capacity(book_models.len());
            for model in book_models {
                let me = mine.get(&model.id).ok_or_else(|| {
                    EngineError::Internal(format!("missing membership for book {}", model.id))
                })?;
                let member_count = member_counts.get(&model.id).copied().unwrap_or(0);
                let transfer_count = transfer_counts.get(&model.id).copied().unwrap_or(0);
                summaries.push(BookSummary {
                    my_member_id: me.id,
                    my_role: me.role,
                    book: Book::try_from(model)?,
                    member_count,
                    transfer_count,
                });
            }
            Ok(summaries)
        })
    }

    async fn count_by_book(
        &self,
        db: &DatabaseTransaction,
        book_ids: &[String],
        target: CountTarget,
    ) -> ResultEngine<HashMap<String, u64>> {
        let rows: Vec<(String, i64)> = match target {
            CountTarget::Members => {
                members::Entity::find()
                    .select_only()
                    .column(members::Column::BookId)
                    .column_as(members::Column::Id.count(), "count")
                    .filter(members::Column::BookId.is_in(book_ids.to_vec()))
                    .group_by(members::Column::BookId)
                    .into_tuple()
                    .all(db)
                    .await?
            }
            CountTarget::Transfers => {
                transfers::Entity::find()
                    .select_only()
                    .column(transfers::Column::BookId)
                    .column_as(transfers::Column::Id.count(), "count")
                    .filter(transfers::Column::BookId.is_in(book_ids.to_vec()))
                    .group_by(transfers::Column::BookId)
                    .into_tuple()
                    .all(db)
                    .await?
            }
        };
        Ok(rows
            .into_iter()
            .map(|(book_id, count)| (book_id, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    /// Book with members and balances. Remarks are only visible to the owner.
    pub async fn book_detail(&self, book_id: Uuid, user_id: &str) -> ResultEngine<BookDetail> {
        with_tx!(self, |db_tx| {
            let book = self.require_visible_book(&db_tx, book_id).await?;
            let me = self.require_member(&db_tx, book_id, user_id).await?;
            let owner_view = book.is_owner(user_id);
            let members = members::Entity::find()
                .filter(members::Column::BookId.eq(book_id.to_string()))
                .order_by_asc(members::Column::JoinedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| {
                    let mut member = Member::try_from(model)?;
                    if !owner_view {
                        member.remark = None;
                    }
                    Ok(member)
                })
                .collect::<ResultEngine<Vec<_>>>()?;
            let mut me = me;
            if !owner_view {
                me.remark = None;
            }
            Ok(BookDetail { book, me, members })
        })
    }

    /// Owner-only rename and share toggle.
    pub async fn update_book(&self, cmd: UpdateBookCmd) -> ResultEngine<Book> {
        if cmd.name.is_none() && cmd.share_disabled.is_none() {
            return Err(EngineError::InvalidArgument(
                "nothing to update".to_string(),
            ));
        }
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "book name"))
            .transpose()?;
        let UpdateBookCmd {
            book_id,
            user_id,
            share_disabled,
            ..
        } = cmd;
        self.with_book_lock(book_id, |engine, db_tx, book| {
            Box::pin(async move {
                engine.require_owner(db_tx, &book, &user_id).await?;
                if share_disabled.is_some() && book.kind != BookKind::Ledger {
                    return Err(EngineError::InvalidArgument(
                        "only ledgers can disable sharing".to_string(),
                    ));
                }
                let mut model: books::ActiveModel = (&book).into();
                if let Some(name) = name {
                    model.name = ActiveValue::Set(name);
                }
                if let Some(share_disabled) = share_disabled {
                    model.share_disabled = ActiveValue::Set(share_disabled);
                }
                model.updated_at = ActiveValue::Set(Utc::now());
                Book::try_from(model.update(db_tx).await?)
            })
        })
        .await
    }

    /// Owner ends a recording book.
    ///
    /// A book that is no longer recording is reported as `NotFound`: the
    /// status guard matched no recording book.
    pub async fn end_book(&self, book_id: Uuid, user_id: &str) -> ResultEngine<EndedBook> {
        let user_id = user_id.to_string();
        let ended = self
            .with_book_lock(book_id, |engine, db_tx, book| {
                Box::pin(async move {
                    engine.require_owner(db_tx, &book, &user_id).await?;
                    let now = Utc::now();
                    let result = books::Entity::update_many()
                        .col_expr(books::Column::Status, Expr::value(BookStatus::Ended.as_str()))
                        .col_expr(books::Column::EndedAt, Expr::value(now))
                        .col_expr(books::Column::UpdatedAt, Expr::value(now))
                        .col_expr(books::Column::EndReason, Expr::value(EndReason::Owner.as_str()))
                        .filter(books::Column::Id.eq(book_id.to_string()))
                        .filter(books::Column::Status.eq(BookStatus::Recording.as_str()))
                        .exec(db_tx)
                        .await?;
                    if result.rows_affected == 0 {
                        return Err(EngineError::NotFound("recording book".to_string()));
                    }
                    let book = engine.require_visible_book(db_tx, book_id).await?;
                    let winners = engine.winners_in(db_tx, book_id).await?;
                    Ok(EndedBook { book, winners })
                })
            })
            .await?;
        tracing::info!(book_id = %book_id, "book ended by owner");
        Ok(ended)
    }

    /// Owner soft-deletes an ended book.
    pub async fn delete_book(&self, book_id: Uuid, user_id: &str) -> ResultEngine<Book> {
        let user_id = user_id.to_string();
        self.with_book_lock(book_id, |engine, db_tx, book| {
            Box::pin(async move {
                engine.require_owner(db_tx, &book, &user_id).await?;
                if book.status != BookStatus::Ended {
                    return Err(EngineError::BookNotEnded(format!(
                        "book {book_id} must be ended before deletion"
                    )));
                }
                let now = Utc::now();
                let mut model: books::ActiveModel = (&book).into();
                model.deleted_at = ActiveValue::Set(Some(now));
                model.updated_at = ActiveValue::Set(now);
                Book::try_from(model.update(db_tx).await?)
            })
        })
        .await
    }

    /// Current top members of a live book.
    pub async fn winners(&self, book_id: Uuid) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            self.require_visible_book(&db_tx, book_id).await?;
            self.winners_in(&db_tx, book_id).await
        })
    }

    /// Fails with `Internal` unless the book has exactly one owner member.
    pub async fn check_owner_invariant(&self, book_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let owners = members::Entity::find()
                .filter(members::Column::BookId.eq(book_id.to_string()))
                .filter(members::Column::Role.eq(MemberRole::Owner.as_str()))
                .count(&db_tx)
                .await?;
            if owners == 1 {
                Ok(())
            } else {
                tracing::error!(book_id = %book_id, owners, "owner invariant violated");
                Err(EngineError::Internal(format!(
                    "book {book_id} has {owners} owners"
                )))
            }
        })
    }
}

#[derive(Clone, Copy)]
enum CountTarget {
    Members,
    Transfers,
}
