//! Transfer and ledger record API endpoints

use api_types::transfer::{
    LedgerRecordNew, TransferListQuery, TransferListResponse, TransferNew, TransferView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Amount, BookEvent, LedgerRecordCmd, Page, RecordTransferCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views::{engine_record_kind, transfer_view},
};

/// Newest-first page of a book's transfers
pub async fn list(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Query(query): Query<TransferListQuery>,
) -> Result<Json<TransferListResponse>, ServerError> {
    let transfers = state
        .engine
        .list_transfers(book_id, &user_id, Page::new(query.limit, query.offset))
        .await?;

    Ok(Json(TransferListResponse {
        transfers: transfers.iter().map(transfer_view).collect(),
    }))
}

/// Scorebook transfer from the caller to another member
pub async fn create(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let amount = Amount::try_from(payload.amount)?;
    let mut cmd = RecordTransferCmd::new(book_id, user_id, payload.to_member_id, amount);
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let transfer = state.engine.record_transfer(cmd).await?;
    state
        .hub
        .broadcast(book_id, &BookEvent::record_created(&transfer, false));
    Ok((StatusCode::CREATED, Json(transfer_view(&transfer))))
}

/// Ledger income/expense recorded by the owner
pub async fn record(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<LedgerRecordNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let amount = Amount::try_from(payload.amount)?;
    let mut cmd = LedgerRecordCmd::new(
        book_id,
        user_id,
        payload.member_id,
        engine_record_kind(payload.kind),
        amount,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let transfer = state.engine.add_ledger_record(cmd).await?;
    // Ledger rooms include non-owner members; notes stay with the owner.
    state
        .hub
        .broadcast(book_id, &BookEvent::record_created(&transfer, true));
    Ok((StatusCode::CREATED, Json(transfer_view(&transfer))))
}
