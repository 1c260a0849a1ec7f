use chrono::{Duration, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{Book, BookKind, BookStatus, EndReason, ResultEngine, books};

use super::{Engine, EndedBook, with_tx};

/// Last activity of a book: its newest transfer, or its creation time.
const LAST_ACTIVITY: &str = "COALESCE((SELECT MAX(transfers.created_at) FROM transfers \
     WHERE transfers.book_id = books.id), books.created_at)";

impl Engine {
    /// End every recording scorebook with no activity for `inactive_for`.
    ///
    /// Returns only the books this call ended; a book already ended by its
    /// owner or by an earlier sweep is never reported twice. A threshold that
    /// is zero or negative disables the sweep.
    pub async fn end_inactive_books(&self, inactive_for: Duration) -> ResultEngine<Vec<EndedBook>> {
        if inactive_for <= Duration::zero() {
            tracing::warn!(
                inactive_secs = inactive_for.num_seconds(),
                "inactivity threshold is not positive, skipping sweep"
            );
            return Ok(Vec::new());
        }
        let now = Utc::now();
        let cutoff = now - inactive_for;
        with_tx!(self, |db_tx| {
            let result = books::Entity::update_many()
                .col_expr(books::Column::Status, Expr::value(BookStatus::Ended.as_str()))
                .col_expr(books::Column::EndedAt, Expr::value(now))
                .col_expr(books::Column::UpdatedAt, Expr::value(now))
                .col_expr(books::Column::EndReason, Expr::value(EndReason::Idle.as_str()))
                .filter(books::Column::Kind.eq(BookKind::Scorebook.as_str()))
                .filter(books::Column::Status.eq(BookStatus::Recording.as_str()))
                .filter(books::Column::DeletedAt.is_null())
                .filter(Expr::expr(Expr::cust(LAST_ACTIVITY)).lt(cutoff))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Ok(Vec::new());
            }

            let models = books::Entity::find()
                .filter(books::Column::EndReason.eq(EndReason::Idle.as_str()))
                .filter(books::Column::EndedAt.eq(now))
                .all(&db_tx)
                .await?;
            let mut ended = Vec::with_capacity(models.len());
            for model in models {
                let book = Book::try_from(model)?;
                let winners = self.winners_in(&db_tx, book.id).await?;
                ended.push(EndedBook { book, winners });
            }
            tracing::info!(count = ended.len(), "ended inactive books");
            Ok(ended)
        })
    }
}
