use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    middleware::auth::AuthUser,
    services::material_service::NewMaterial,
    services::storage_service::sanitize_file_name,
    AppState,
};

/// Streams a stored blob back as an attachment.
pub(crate) fn file_response(file: tokio::fs::File, name: &str, mime_type: &str) -> Response {
    let body = Body::from_stream(ReaderStream::new(file));
    let disposition = format!("attachment; filename=\"{}\"", sanitize_file_name(name));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn upload_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut week: Option<i16> = None;
    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if name == "week" {
            let raw = field.text().await?;
            let parsed = raw
                .trim()
                .parse::<i16>()
                .map_err(|_| Error::BadRequest(format!("Invalid week: {}", raw.trim())))?;
            week = Some(parsed);
        } else if name == "file" {
            let file_name = field.file_name().unwrap_or("file").to_string();
            let mime_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            file = Some((file_name, mime_type, data));
        }
    }

    let week = week.ok_or_else(|| Error::BadRequest("Missing field: week".into()))?;
    let (file_name, mime_type, data) =
        file.ok_or_else(|| Error::BadRequest("Missing field: file".into()))?;

    let material = state
        .material_service
        .upload(
            &user,
            course_id,
            NewMaterial {
                week,
                file_name,
                mime_type,
                data,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

#[axum::debug_handler]
pub async fn list_materials(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let weeks = state.material_service.list_by_week(&user, course_id).await?;
    Ok(Json(weeks))
}

#[axum::debug_handler]
pub async fn download_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path(material_id): Path<Uuid>,
) -> Result<Response> {
    let (material, file) = state.material_service.open(&user, material_id).await?;
    Ok(file_response(file, &material.name, &material.mime_type))
}

#[axum::debug_handler]
pub async fn delete_material(
    State(state): State<AppState>,
    user: AuthUser,
    Path(material_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.material_service.delete(&user, material_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
