use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{CurrentUser, ServerState, router, run_with_listener, spawn_with_listener};

mod books;
mod invites;
mod members;
pub mod realtime;
mod server;
pub mod sweep;
mod transfers;
mod user;
mod views;
mod ws;

pub mod types {
    pub mod book {
        pub use api_types::book::{
            BookCreated, BookDetailView, BookEndedView, BookKind, BookListQuery,
            BookListResponse, BookNew, BookStatus, BookSummaryView, BookUpdate, BookView,
        };
    }

    pub mod member {
        pub use api_types::member::{
            BindRequest, JoinRequest, JoinResponse, MemberNew, MemberRole, MemberUpdate,
            MemberUpdateResponse, MemberView, MyMemberUpdate,
        };
    }

    pub mod transfer {
        pub use api_types::transfer::{
            LedgerRecordNew, RecordKind, TransferListQuery, TransferListResponse, TransferNew,
            TransferView,
        };
    }

    pub mod invite {
        pub use api_types::invite::InvitePreview;
    }

    pub mod user {
        pub use api_types::user::{ProfileUpdate, ProfileView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::BookEnded(_) | EngineError::BookNotEnded(_) | EngineError::Conflict(_) => {
            StatusCode::CONFLICT
        }
        EngineError::Internal(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Internal(detail) => {
            tracing::error!("internal error: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
