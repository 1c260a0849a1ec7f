use std::{future::Future, pin::Pin, sync::Arc};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{Book, InviteCodes, RandomInviteCodes, ResultEngine};

mod access;
mod books;
mod invites;
mod members;
mod profiles;
mod sweep;
mod transfers;

pub use books::{BookDetail, BookSummary, EndedBook};
pub use invites::InvitePreview;
pub use members::{JoinOutcome, MemberUpdate};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Future returned by the closures run under [`Engine::with_book_lock`].
pub(crate) type TxFuture<'a, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'a>>;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    invite_codes: Arc<dyn InviteCodes>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Unit of work for every book mutation.
    ///
    /// Opens a transaction, takes the write lock on the book row (rejecting
    /// absent or deleted books with `NotFound`) and hands the fresh row to
    /// `f`. The transaction commits only if `f` succeeds.
    pub(crate) async fn with_book_lock<T, F>(&self, book_id: Uuid, f: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a Engine, &'a DatabaseTransaction, Book) -> TxFuture<'a, T> + Send,
    {
        with_tx!(self, |db_tx| {
            match self.lock_book(&db_tx, book_id).await {
                Ok(book) => f(self, &db_tx, book).await,
                Err(err) => Err(err),
            }
        })
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    invite_codes: Option<Arc<dyn InviteCodes>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the invite code source (defaults to [`RandomInviteCodes`]).
    pub fn invite_codes(mut self, invite_codes: Arc<dyn InviteCodes>) -> EngineBuilder {
        self.invite_codes = Some(invite_codes);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            invite_codes: self
                .invite_codes
                .unwrap_or_else(|| Arc::new(RandomInviteCodes::default())),
        })
    }
}
