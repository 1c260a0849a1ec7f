//! Invite API endpoints

use api_types::{
    invite::InvitePreview,
    member::{JoinRequest, JoinResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::BookEvent;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views::{invite_view, member_view},
};

/// Public preview of the book behind an invite code
pub async fn preview(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<InvitePreview>, ServerError> {
    let preview = state.engine.resolve_invite(&code).await?;
    Ok(Json(invite_view(&preview)))
}

pub async fn join(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ServerError> {
    let outcome = state
        .engine
        .join_by_code(
            &code,
            &user_id,
            payload.nickname.as_deref(),
            payload.avatar_url.as_deref(),
        )
        .await?;
    if outcome.joined {
        state.hub.broadcast(
            outcome.member.book_id,
            &BookEvent::member_joined(&outcome.member),
        );
    }
    Ok(Json(JoinResponse {
        member: member_view(&outcome.member),
        joined: outcome.joined,
    }))
}
