use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::evaluation_dto::{CreateEvaluationPayload, EvaluationSummary, UpdateEvaluationPayload},
    error::Result,
    middleware::auth::AuthUser,
    models::evaluation::Evaluation,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/courses/{id}/evaluations",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateEvaluationPayload,
    responses(
        (status = 201, description = "Evaluation created with its questions"),
        (status = 400, description = "Invalid window, question or answer key"),
        (status = 403, description = "Caller is not a course teacher")
    )
)]
#[axum::debug_handler]
pub async fn create_evaluation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CreateEvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let detail = state
        .evaluation_service
        .create(&user, course_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/evaluations",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses((status = 200, description = "Evaluations with their current status", body = [EvaluationSummary]))
)]
#[axum::debug_handler]
pub async fn list_evaluations(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let evaluations = state.evaluation_service.list(&user, course_id).await?;
    Ok(Json(evaluations))
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{id}",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Evaluation with questions; answer keys only for teachers"),
        (status = 403, description = "Not started yet")
    )
)]
#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.evaluation_service.get(&user, id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    patch,
    path = "/api/evaluations/{id}",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    request_body = UpdateEvaluationPayload,
    responses((status = 200, description = "Evaluation updated", body = Evaluation))
)]
#[axum::debug_handler]
pub async fn update_evaluation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let evaluation = state.evaluation_service.update(&user, id, payload).await?;
    Ok(Json(evaluation))
}

#[utoipa::path(
    delete,
    path = "/api/evaluations/{id}",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    responses((status = 204, description = "Evaluation, questions and submissions deleted"))
)]
#[axum::debug_handler]
pub async fn delete_evaluation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.evaluation_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
