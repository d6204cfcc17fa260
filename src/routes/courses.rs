use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::course_dto::{CourseResponse, CreateCoursePayload, JoinCoursePayload, UpdateCoursePayload},
    error::Result,
    middleware::auth::AuthUser,
    models::course::{CourseMember, CourseRole, CourseSummary},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCoursePayload,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 403, description = "Caller is not a teacher")
    )
)]
#[axum::debug_handler]
pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCoursePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let course = state.course_service.create(&user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse::new(course, CourseRole::Teacher)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    responses((status = 200, description = "Courses the caller belongs to", body = [CourseSummary]))
)]
#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let courses = state.course_service.list_for_user(user.id).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = CourseResponse),
        (status = 404, description = "Course not found or caller is not a member")
    )
)]
#[axum::debug_handler]
pub async fn get_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (course, role) = state.course_service.get(&user, id).await?;
    Ok(Json(CourseResponse::new(course, role)))
}

#[utoipa::path(
    patch,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCoursePayload,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 403, description = "Caller is not a course teacher")
    )
)]
#[axum::debug_handler]
pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCoursePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let course = state.course_service.update(&user, id, payload).await?;
    Ok(Json(CourseResponse::new(course, CourseRole::Teacher)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Caller is not a course teacher")
    )
)]
#[axum::debug_handler]
pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.course_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/code",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses((status = 200, description = "New join code issued", body = CourseResponse))
)]
#[axum::debug_handler]
pub async fn regenerate_code(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let course = state.course_service.regenerate_code(&user, id).await?;
    Ok(Json(CourseResponse::new(course, CourseRole::Teacher)))
}

#[utoipa::path(
    post,
    path = "/api/courses/join",
    request_body = JoinCoursePayload,
    responses(
        (status = 200, description = "Enrolled as student", body = CourseResponse),
        (status = 400, description = "The code does not match any course"),
        (status = 409, description = "Already enrolled")
    )
)]
#[axum::debug_handler]
pub async fn join_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<JoinCoursePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let course = state.course_service.join(&user, &payload.code).await?;
    Ok(Json(CourseResponse::new(course, CourseRole::Student)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/members",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses((status = 200, description = "Course members", body = [CourseMember]))
)]
#[axum::debug_handler]
pub async fn list_members(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let members = state.course_service.members(&user, id).await?;
    Ok(Json(members))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
        ("user_id" = Uuid, Path, description = "Member to remove")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Students can only remove themselves")
    )
)]
#[axum::debug_handler]
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    state.course_service.remove_member(&user, id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
