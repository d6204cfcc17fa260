use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::evaluation_dto::{
        GradeAnswerPayload, SubmitEvaluationPayload, SubmitEvaluationResponse, UploadedAnswerFile,
    },
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::submission::{Submission, SubmissionListItem},
    routes::materials::file_response,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct AnswerFileQuery {
    pub path: String,
}

#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/submissions",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    request_body = SubmitEvaluationPayload,
    responses(
        (status = 201, description = "Submission scored", body = SubmitEvaluationResponse),
        (status = 400, description = "Evaluation not available or malformed answer"),
        (status = 409, description = "Already submitted")
    )
)]
#[axum::debug_handler]
pub async fn submit_evaluation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(evaluation_id): Path<Uuid>,
    Json(payload): Json<SubmitEvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state
        .submission_service
        .submit(&user, evaluation_id, payload.answers)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/submissions",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    responses((status = 200, description = "All submissions of the evaluation", body = [SubmissionListItem]))
)]
#[axum::debug_handler]
pub async fn list_submissions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(evaluation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let rows = state.submission_service.list(&user, evaluation_id).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/submission",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "The caller's submission", body = Submission),
        (status = 404, description = "Not submitted yet")
    )
)]
#[axum::debug_handler]
pub async fn my_submission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(evaluation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let submission = state
        .submission_service
        .mine(&user, evaluation_id)
        .await?
        .ok_or_else(|| Error::NotFound("No submission for this evaluation".into()))?;
    Ok(Json(submission))
}

#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission with every answer and its question"),
        (status = 403, description = "Not the owner nor a course teacher")
    )
)]
#[axum::debug_handler]
pub async fn review_submission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(submission_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let review = state.submission_service.review(&user, submission_id).await?;
    Ok(Json(review))
}

#[utoipa::path(
    post,
    path = "/api/submissions/{id}/grade",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = GradeAnswerPayload,
    responses(
        (status = 200, description = "Answer graded and score recomputed", body = Submission),
        (status = 400, description = "Points out of range")
    )
)]
#[axum::debug_handler]
pub async fn grade_answer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(submission_id): Path<Uuid>,
    Json(payload): Json<GradeAnswerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let submission = state
        .submission_service
        .grade_answer(&user, submission_id, payload)
        .await?;
    Ok(Json(submission))
}

#[utoipa::path(
    delete,
    path = "/api/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses((status = 204, description = "Submission removed; the student may submit again"))
)]
#[axum::debug_handler]
pub async fn delete_submission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(submission_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.submission_service.delete(&user, submission_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/files",
    params(("id" = Uuid, Path, description = "Evaluation ID")),
    responses((status = 201, description = "File stored; submit its path as the answer", body = UploadedAnswerFile))
)]
#[axum::debug_handler]
pub async fn upload_answer_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(evaluation_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("answer").to_string();
        let data = field.bytes().await?;
        let uploaded = state
            .submission_service
            .upload_answer_file(&user, evaluation_id, &file_name, data)
            .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }
    Err(Error::BadRequest("Missing field: file".into()))
}

#[axum::debug_handler]
pub async fn download_answer_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(evaluation_id): Path<Uuid>,
    Query(query): Query<AnswerFileQuery>,
) -> Result<Response> {
    let file = state
        .submission_service
        .open_answer_file(&user, evaluation_id, &query.path)
        .await?;
    let name = query.path.rsplit('/').next().unwrap_or("answer");
    Ok(file_response(file, name, "application/octet-stream"))
}
