use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Book, EngineError, Member, MemberRole, ResultEngine, books, members, users};

use super::Engine;

/// Number of members reported when a book ends.
pub(super) const WINNERS: u64 = 3;

impl Engine {
    /// Take the write lock on a live book row and return it.
    ///
    /// A guarded no-op write acquires the lock: a row lock on servers, the
    /// database write lock on SQLite. It leaves `updated_at` alone; mutations
    /// that change the book call `touch_book`. The row is re-read
    /// afterwards so status checks see the committed state.
    pub(super) async fn lock_book(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
    ) -> ResultEngine<Book> {
        let touched = books::Entity::update_many()
            .col_expr(books::Column::Id, Expr::col(books::Column::Id).into())
            .filter(books::Column::Id.eq(book_id.to_string()))
            .filter(books::Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        if touched.rows_affected == 0 {
            return Err(EngineError::NotFound("book".to_string()));
        }
        let model = books::Entity::find_by_id(book_id.to_string())
            .lock_exclusive()
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("book".to_string()))?;
        Book::try_from(model)
    }

    /// Bump the book's `updated_at`, which orders book listings.
    pub(super) async fn touch_book(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
    ) -> ResultEngine<()> {
        books::Entity::update_many()
            .col_expr(books::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(books::Column::Id.eq(book_id.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Read a live (not deleted) book without locking it.
    pub(super) async fn require_visible_book(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
    ) -> ResultEngine<Book> {
        let model = books::Entity::find_by_id(book_id.to_string())
            .filter(books::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("book".to_string()))?;
        Book::try_from(model)
    }

    pub(super) async fn member_of_user(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Option<Member>> {
        members::Entity::find()
            .filter(members::Column::BookId.eq(book_id.to_string()))
            .filter(members::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    /// The caller's member in the book, or `Forbidden`.
    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Member> {
        self.member_of_user(db, book_id, user_id)
            .await?
            .ok_or_else(|| EngineError::Forbidden("not a member of this book".to_string()))
    }

    /// The owner's member row, only when `user_id` owns the book.
    pub(super) async fn require_owner(
        &self,
        db: &DatabaseTransaction,
        book: &Book,
        user_id: &str,
    ) -> ResultEngine<Member> {
        if !book.is_owner(user_id) {
            return Err(EngineError::Forbidden("only the owner can do this".to_string()));
        }
        let owner = self.require_member(db, book.id, user_id).await?;
        if owner.role != MemberRole::Owner {
            return Err(EngineError::Internal(format!(
                "owner of book {} has no owner member",
                book.id
            )));
        }
        Ok(owner)
    }

    /// A member of this book by id, or `NotFound`.
    pub(super) async fn require_book_member(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<Member> {
        let model = members::Entity::find_by_id(member_id.to_string())
            .filter(members::Column::BookId.eq(book_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("member".to_string()))?;
        Member::try_from(model)
    }

    /// Top members by positive balance, earliest update first on ties.
    pub(super) async fn winners_in(
        &self,
        db: &DatabaseTransaction,
        book_id: Uuid,
    ) -> ResultEngine<Vec<Member>> {
        members::Entity::find()
            .filter(members::Column::BookId.eq(book_id.to_string()))
            .filter(members::Column::BalanceMinor.gt(0))
            .order_by_desc(members::Column::BalanceMinor)
            .order_by_asc(members::Column::UpdatedAt)
            .limit(WINNERS)
            .all(db)
            .await?
            .into_iter()
            .map(Member::try_from)
            .collect()
    }

    pub(super) async fn profile(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Option<users::Model>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }
}
