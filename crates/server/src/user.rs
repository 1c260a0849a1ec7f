//! Profile API endpoints

use api_types::user::{ProfileUpdate, ProfileView};
use axum::{Extension, Json, extract::State};
use engine::EngineError;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views::profile_view,
};

/// Handle requests for creating or refreshing the caller's profile
pub async fn upsert(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state
        .engine
        .upsert_profile(&user_id, &payload.nickname, payload.avatar_url.as_deref())
        .await?;
    Ok(Json(profile_view(&profile)))
}

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state
        .engine
        .profile_of(&user_id)
        .await?
        .ok_or_else(|| EngineError::NotFound("profile".to_string()))?;
    Ok(Json(profile_view(&profile)))
}
