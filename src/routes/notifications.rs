use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::message_dto::UnreadCountResponse,
    dto::notification_dto::{MarkedReadResponse, NotificationListQuery},
    error::Result,
    middleware::auth::AuthUser,
    models::notification::Notification,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(("limit" = Option<i64>, Query, description = "Page size, 1 to 200")),
    responses((status = 200, description = "Newest first", body = [Notification]))
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse> {
    let rows = state
        .notification_service
        .list(user.id, query.limit())
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread",
    responses((status = 200, description = "Unread notifications", body = UnreadCountResponse))
)]
#[axum::debug_handler]
pub async fn unread_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let unread = state.notification_service.unread_count(user.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.notification_service.mark_read(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses((status = 200, description = "Every notification marked as read", body = MarkedReadResponse))
)]
#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_all_read(user.id).await?;
    Ok(Json(MarkedReadResponse { updated }))
}
