use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::meeting_dto::CreateMeetingPayload,
    error::Result,
    middleware::auth::AuthUser,
    models::meeting::{Meeting, Recording},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/courses/{id}/meetings",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateMeetingPayload,
    responses(
        (status = 201, description = "Meeting scheduled on Zoom and stored", body = Meeting),
        (status = 502, description = "Zoom rejected the request")
    )
)]
#[axum::debug_handler]
pub async fn create_meeting(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CreateMeetingPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let meeting = state
        .meeting_service
        .create(&user, course_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/meetings",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses((status = 200, description = "Meetings with their recordings"))
)]
#[axum::debug_handler]
pub async fn list_meetings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let meetings = state.meeting_service.list(&user, course_id).await?;
    Ok(Json(meetings))
}

#[utoipa::path(
    post,
    path = "/api/meetings/{id}/recordings/sync",
    params(("id" = Uuid, Path, description = "Meeting ID")),
    responses(
        (status = 200, description = "Recordings fetched from Zoom and stored", body = [Recording]),
        (status = 502, description = "Zoom rejected the request")
    )
)]
#[axum::debug_handler]
pub async fn sync_recordings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(meeting_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let recordings = state
        .meeting_service
        .sync_recordings(&user, meeting_id)
        .await?;
    Ok(Json(recordings))
}
