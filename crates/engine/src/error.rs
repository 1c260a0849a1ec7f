//! The module contains the errors the engine can return.
//!
//! Each variant is a sentinel outcome the HTTP layer maps to a status code:
//!
//! - [`NotFound`] the book, member or invite does not exist or was deleted.
//! - [`Forbidden`] the caller lacks the required role or membership.
//! - [`InvalidArgument`] malformed input (self-transfer, bad amount, empty name).
//! - [`BookEnded`] a mutation was attempted on a book that is not recording.
//! - [`BookNotEnded`] a delete was attempted before the book ended.
//! - [`Conflict`] the target state already exists (e.g. an already linked member).
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`InvalidArgument`]: EngineError::InvalidArgument
//!  [`BookEnded`]: EngineError::BookEnded
//!  [`BookNotEnded`]: EngineError::BookNotEnded
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Book ended: {0}")]
    BookEnded(String),
    #[error("Book not ended: {0}")]
    BookNotEnded(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::BookEnded(a), Self::BookEnded(b)) => a == b,
            (Self::BookNotEnded(a), Self::BookNotEnded(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
