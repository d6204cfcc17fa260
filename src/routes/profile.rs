use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::profile_dto::UpdateProfilePayload, error::Result, middleware::auth::AuthUser,
    models::user::Profile, AppState,
};

/// Returns the caller's profile, creating it from the token on first access.
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Caller profile", body = Profile))
)]
#[axum::debug_handler]
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> Result<impl IntoResponse> {
    let profile = state.profile_service.ensure(&user).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    patch,
    path = "/api/me",
    request_body = UpdateProfilePayload,
    responses((status = 200, description = "Profile updated", body = Profile))
)]
#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.profile_service.ensure(&user).await?;
    let profile = state
        .profile_service
        .update_name(user.id, &payload.full_name)
        .await?;
    Ok(Json(profile))
}
