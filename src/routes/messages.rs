use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::message_dto::{SendMessagePayload, UnreadCountResponse},
    error::Result,
    middleware::auth::AuthUser,
    models::message::{ConversationSummary, CreateMessage, Message},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessagePayload,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 404, description = "Recipient not found")
    )
)]
#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.profile_service.ensure(&user).await?;
    let message = state
        .message_service
        .create(CreateMessage {
            sender_id: user.id,
            recipient_id: payload.recipient_id,
            content: payload.content,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/messages",
    responses((status = 200, description = "Latest message per partner", body = [ConversationSummary]))
)]
#[axum::debug_handler]
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let conversations = state.message_service.list_conversations(user.id).await?;
    Ok(Json(conversations))
}

/// Returns the whole conversation and marks the partner's messages as read.
#[utoipa::path(
    get,
    path = "/api/messages/{user_id}",
    params(("user_id" = Uuid, Path, description = "Conversation partner")),
    responses((status = 200, description = "Messages, oldest first", body = [Message]))
)]
#[axum::debug_handler]
pub async fn get_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(partner_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let messages = state
        .message_service
        .get_conversation(user.id, partner_id)
        .await?;
    let marked = state.message_service.mark_as_read(user.id, partner_id).await?;
    if marked > 0 {
        tracing::debug!(user_id = %user.id, %partner_id, marked, "messages marked as read");
    }
    Ok(Json(messages))
}

#[utoipa::path(
    get,
    path = "/api/messages/unread",
    responses((status = 200, description = "Unread messages addressed to the caller", body = UnreadCountResponse))
)]
#[axum::debug_handler]
pub async fn unread_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let unread = state.message_service.unread_count(user.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}
