use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::stream_dto::{CreateCommentPayload, CreatePostPayload, StreamQuery},
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

const DEFAULT_PAGE: i64 = 20;
const MAX_PAGE: i64 = 100;

#[axum::debug_handler]
pub async fn get_stream(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let items = state
        .stream_service
        .list(&user, course_id, limit, query.before)
        .await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CreatePostPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state
        .stream_service
        .create_post(&user, course_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[axum::debug_handler]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.stream_service.delete_post(&user, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let comment = state
        .stream_service
        .add_comment(&user, post_id, &payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[axum::debug_handler]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.stream_service.delete_comment(&user, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
