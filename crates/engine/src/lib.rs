//! Book transaction engine.
//!
//! Books hold members with zero-sum balances. Every balance or lifecycle
//! mutation runs as one database transaction that first takes the book's
//! row lock, so concurrent writers on the same book serialize while
//! different books proceed independently.

pub use books::{Book, BookKind, BookStatus, EndReason};
pub use commands::{
    AddMemberCmd, BindMemberCmd, CreateBookCmd, JoinCmd, LedgerRecordCmd, MAX_PAGE_SIZE, Page,
    RecordTransferCmd, UpdateBookCmd, UpdateMemberCmd,
};
pub use error::EngineError;
pub use events::BookEvent;
pub use invite::{
    INVITE_ALPHABET, INVITE_CODE_LEN, InviteCodes, RandomInviteCodes, normalize_invite_code,
};
pub use members::{Member, MemberRole};
pub use money::Amount;
pub use ops::{
    BookDetail, BookSummary, Engine, EngineBuilder, EndedBook, InvitePreview, JoinOutcome,
    MemberUpdate,
};
pub use transfers::{RecordKind, Transfer};
pub use users::Profile;

mod books;
mod commands;
pub mod database;
mod error;
pub mod events;
mod invite;
mod members;
mod money;
mod ops;
mod transfers;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
