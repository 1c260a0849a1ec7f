//! Book API endpoints

use api_types::book::{
    BookCreated, BookDetailView, BookEndedView, BookListQuery, BookListResponse, BookNew,
    BookUpdate, BookView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{BookEvent, CreateBookCmd, Page, UpdateBookCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views::{book_view, detail_view, ended_view, engine_kind, member_view, summary_view},
};

/// Handle requests for creating a new book owned by the caller
pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<BookNew>,
) -> Result<(StatusCode, Json<BookCreated>), ServerError> {
    let mut cmd = CreateBookCmd::new(user_id, engine_kind(payload.kind), payload.name);
    if let Some(location_text) = payload.location_text {
        cmd = cmd.location_text(location_text);
    }
    if let Some(nickname) = payload.nickname {
        cmd = cmd.nickname(nickname);
    }
    if let Some(avatar_url) = payload.avatar_url {
        cmd = cmd.avatar_url(avatar_url);
    }

    let (book, owner) = state.engine.create_book(cmd).await?;
    state.hub.broadcast(book.id, &BookEvent::book_created(&book));

    Ok((
        StatusCode::CREATED,
        Json(BookCreated {
            book: book_view(&book),
            owner: member_view(&owner),
        }),
    ))
}

/// Handle requests for listing the caller's books
pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<BookListQuery>,
) -> Result<Json<BookListResponse>, ServerError> {
    let books = state
        .engine
        .list_books(
            &user_id,
            query.kind.map(engine_kind),
            Page::new(query.limit, query.offset),
        )
        .await?;

    Ok(Json(BookListResponse {
        books: books.iter().map(summary_view).collect(),
    }))
}

pub async fn detail(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookDetailView>, ServerError> {
    let detail = state.engine.book_detail(book_id, &user_id).await?;
    Ok(Json(detail_view(&detail)))
}

pub async fn update(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<BookUpdate>,
) -> Result<Json<BookView>, ServerError> {
    let mut cmd = UpdateBookCmd::new(book_id, user_id);
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(share_disabled) = payload.share_disabled {
        cmd = cmd.share_disabled(share_disabled);
    }

    let book = state.engine.update_book(cmd).await?;
    state.hub.broadcast(book.id, &BookEvent::book_updated(&book));
    Ok(Json(book_view(&book)))
}

pub async fn end(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookEndedView>, ServerError> {
    let ended = state.engine.end_book(book_id, &user_id).await?;
    state.hub.broadcast(book_id, &BookEvent::book_ended(&ended));
    Ok(Json(ended_view(&ended)))
}

pub async fn delete(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_book(book_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
