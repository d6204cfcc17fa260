use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    error::Result, middleware::auth::AuthUser, models::gradebook::Gradebook,
    services::export_service::ExportService, AppState,
};

#[utoipa::path(
    get,
    path = "/api/courses/{id}/gradebook",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses((status = 200, description = "Students × evaluations; students only get their own row", body = Gradebook))
)]
#[axum::debug_handler]
pub async fn get_gradebook(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let book = state.gradebook_service.for_course(&user, course_id).await?;
    Ok(Json(book))
}

/// Export the course gradebook as XLSX
#[utoipa::path(
    get,
    path = "/api/courses/{id}/gradebook/export",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "XLSX workbook"),
        (status = 403, description = "Caller is not a course teacher")
    )
)]
#[axum::debug_handler]
pub async fn export_gradebook(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let book = state
        .gradebook_service
        .export_for_teacher(&user, course_id)
        .await?;
    let course = state.course_service.get_by_id(course_id).await?;

    let buffer = ExportService::generate_gradebook_xlsx(&course.name, &book)?;
    let filename = format!(
        "calificaciones_{}_{}.xlsx",
        course.name.replace(' ', "_"),
        chrono::Utc::now().format("%Y%m%d")
    );
    let disposition = format!(
        "attachment; filename=\"{}\"",
        crate::services::storage_service::sanitize_file_name(&filename)
    );

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
