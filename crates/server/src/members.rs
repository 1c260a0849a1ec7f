//! Member API endpoints

use api_types::member::{
    BindRequest, JoinRequest, JoinResponse, MemberNew, MemberUpdate, MemberUpdateResponse,
    MemberView, MyMemberUpdate,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AddMemberCmd, BindMemberCmd, BookEvent, JoinCmd, UpdateMemberCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views::{member_view, transfer_view},
};

/// Join a scorebook. Repeating the call is harmless.
pub async fn join(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ServerError> {
    let mut cmd = JoinCmd::new(book_id, user_id);
    if let Some(nickname) = payload.nickname {
        cmd = cmd.nickname(nickname);
    }
    if let Some(avatar_url) = payload.avatar_url {
        cmd = cmd.avatar_url(avatar_url);
    }

    let outcome = state.engine.join_book(cmd).await?;
    if outcome.joined {
        state
            .hub
            .broadcast(book_id, &BookEvent::member_joined(&outcome.member));
    }
    Ok(Json(JoinResponse {
        member: member_view(&outcome.member),
        joined: outcome.joined,
    }))
}

pub async fn update_me(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<MyMemberUpdate>,
) -> Result<Json<MemberView>, ServerError> {
    let member = state
        .engine
        .update_my_profile(
            book_id,
            &user_id,
            payload.nickname.as_deref(),
            payload.avatar_url.as_deref(),
        )
        .await?;
    state
        .hub
        .broadcast(book_id, &BookEvent::member_updated(&member));
    Ok(Json(member_view(&member)))
}

/// Owner adds an unlinked member to a ledger
pub async fn add(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberView>), ServerError> {
    let mut cmd = AddMemberCmd::new(book_id, user_id, payload.nickname);
    if let Some(avatar_url) = payload.avatar_url {
        cmd = cmd.avatar_url(avatar_url);
    }
    if let Some(remark) = payload.remark {
        cmd = cmd.remark(remark);
    }

    let member = state.engine.add_member(cmd).await?;
    state
        .hub
        .broadcast(book_id, &BookEvent::member_joined(&member));
    Ok((StatusCode::CREATED, Json(member_view(&member))))
}

pub async fn update(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path((book_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MemberUpdate>,
) -> Result<Json<MemberUpdateResponse>, ServerError> {
    let mut cmd = UpdateMemberCmd::new(book_id, user_id, member_id);
    if let Some(nickname) = payload.nickname {
        cmd = cmd.nickname(nickname);
    }
    if let Some(avatar_url) = payload.avatar_url {
        cmd = cmd.avatar_url(avatar_url);
    }
    if let Some(remark) = payload.remark {
        cmd = cmd.remark(remark);
    }

    let update = state.engine.update_member(cmd).await?;
    state
        .hub
        .broadcast(book_id, &BookEvent::member_updated(&update.member));
    Ok(Json(MemberUpdateResponse {
        member: member_view(&update.member),
        remark_event: update.remark_event.as_ref().map(transfer_view),
    }))
}

/// Link the caller to an unlinked ledger member
pub async fn bind(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path((book_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<BindRequest>,
) -> Result<Json<MemberView>, ServerError> {
    let mut cmd = BindMemberCmd::new(book_id, user_id, member_id);
    if let Some(nickname) = payload.nickname {
        cmd = cmd.nickname(nickname);
    }
    if let Some(avatar_url) = payload.avatar_url {
        cmd = cmd.avatar_url(avatar_url);
    }

    let member = state.engine.bind_member(cmd).await?;
    state
        .hub
        .broadcast(book_id, &BookEvent::member_updated(&member));
    Ok(Json(member_view(&member)))
}
