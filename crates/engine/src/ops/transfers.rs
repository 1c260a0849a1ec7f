use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Amount, Book, BookKind, EngineError, LedgerRecordCmd, Member, Page, RecordKind,
    RecordTransferCmd, ResultEngine, Transfer, members, transfers,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

const SCOREBOOK_PAGE_SIZE: u64 = 50;
const LEDGER_PAGE_SIZE: u64 = 20;

impl Engine {
    /// Insert a transfer and move its amount between the two members.
    ///
    /// Must run under the book lock; balances are read-modify-written.
    pub(super) async fn insert_transfer(
        &self,
        db: &DatabaseTransaction,
        book: &Book,
        from: &Member,
        to: &Member,
        amount: Amount,
        note: String,
    ) -> ResultEngine<Transfer> {
        if from.id == to.id {
            return Err(EngineError::InvalidArgument(
                "cannot transfer to the same member".to_string(),
            ));
        }
        let transfer = Transfer::new(book.id, from.id, to.id, amount, note);
        transfers::ActiveModel::from(&transfer).insert(db).await?;

        if !amount.is_zero() {
            let overflow = || EngineError::InvalidArgument("balance out of range".to_string());
            let to_balance = to.balance.checked_add(amount).ok_or_else(overflow)?;
            let from_balance = from.balance.checked_sub(amount).ok_or_else(overflow)?;
            self.set_balance(db, to, to_balance).await?;
            self.set_balance(db, from, from_balance).await?;
        }
        self.touch_book(db, book.id).await?;
        Ok(transfer)
    }

    async fn set_balance(
        &self,
        db: &DatabaseTransaction,
        member: &Member,
        balance: Amount,
    ) -> ResultEngine<()> {
        members::ActiveModel {
            id: ActiveValue::Set(member.id.to_string()),
            balance_minor: ActiveValue::Set(balance.hundredths()),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    /// Move points from the caller's member to another scorebook member.
    pub async fn record_transfer(&self, cmd: RecordTransferCmd) -> ResultEngine<Transfer> {
        let amount = cmd.amount.require_positive()?;
        let RecordTransferCmd {
            book_id,
            user_id,
            to_member_id,
            note,
            ..
        } = cmd;
        let note = normalize_optional_text(note.as_deref()).unwrap_or_default();
        let transfer = self
            .with_book_lock(book_id, |engine, db_tx, book| {
                Box::pin(async move {
                    book.require_kind(BookKind::Scorebook)?;
                    book.require_recording()?;
                    let from = engine.require_member(db_tx, book.id, &user_id).await?;
                    if from.id == to_member_id {
                        return Err(EngineError::InvalidArgument(
                            "cannot transfer to yourself".to_string(),
                        ));
                    }
                    let to = engine.require_book_member(db_tx, book.id, to_member_id).await?;
                    engine
                        .insert_transfer(db_tx, &book, &from, &to, amount, note)
                        .await
                })
            })
            .await?;
        tracing::debug!(book_id = %book_id, transfer_id = %transfer.id, amount = %transfer.amount, "transfer recorded");
        Ok(transfer)
    }

    /// Owner records money flowing between a member and themselves.
    ///
    /// `Expense` moves the amount member → owner, `Income` owner → member.
    /// The direction is fixed in the stored `from`/`to` ids.
    pub async fn add_ledger_record(&self, cmd: LedgerRecordCmd) -> ResultEngine<Transfer> {
        let amount = cmd.amount.require_positive()?;
        let LedgerRecordCmd {
            book_id,
            user_id,
            member_id,
            kind,
            note,
            ..
        } = cmd;
        let note = normalize_optional_text(note.as_deref()).unwrap_or_default();
        self.with_book_lock(book_id, |engine, db_tx, book| {
            Box::pin(async move {
                book.require_kind(BookKind::Ledger)?;
                let owner = engine.require_owner(db_tx, &book, &user_id).await?;
                book.require_recording()?;
                let member = engine.require_book_member(db_tx, book.id, member_id).await?;
                if member.id == owner.id {
                    return Err(EngineError::InvalidArgument(
                        "records need a member other than the owner".to_string(),
                    ));
                }
                let (from, to) = match kind {
                    RecordKind::Expense => (&member, &owner),
                    RecordKind::Income => (&owner, &member),
                };
                engine
                    .insert_transfer(db_tx, &book, from, to, amount, note)
                    .await
            })
        })
        .await
    }

    /// Newest-first transfer page for a member of the book.
    ///
    /// Ledger readers other than the owner never see remark events or notes.
    pub async fn list_transfers(
        &self,
        book_id: Uuid,
        user_id: &str,
        page: Page,
    ) -> ResultEngine<Vec<Transfer>> {
        with_tx!(self, |db_tx| {
            let book = self.require_visible_book(&db_tx, book_id).await?;
            self.require_member(&db_tx, book_id, user_id).await?;
            let restricted = book.kind == BookKind::Ledger && !book.is_owner(user_id);
            let default_limit = match book.kind {
                BookKind::Scorebook => SCOREBOOK_PAGE_SIZE,
                BookKind::Ledger => LEDGER_PAGE_SIZE,
            };
            let (limit, offset) = page.resolve(default_limit);

            let mut query =
                transfers::Entity::find().filter(transfers::Column::BookId.eq(book_id.to_string()));
            if restricted {
                query = query.filter(transfers::Column::AmountMinor.ne(0));
            }
            query
                .order_by_desc(transfers::Column::CreatedAt)
                .offset(offset)
                .limit(limit)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| {
                    let mut transfer = Transfer::try_from(model)?;
                    if restricted {
                        transfer.note.clear();
                    }
                    Ok(transfer)
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
