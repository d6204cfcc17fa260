pub mod courses;
pub mod docs;
pub mod evaluations;
pub mod gradebook;
pub mod health;
pub mod materials;
pub mod meetings;
pub mod messages;
pub mod notifications;
pub mod profile;
pub mod realtime;
pub mod stream;
pub mod submissions;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};

use crate::{
    middleware::{
        auth::require_bearer_auth,
        rate_limit::{rps_middleware, RateLimiter},
    },
    AppState,
};

/// Full application router. Every `/api` route except the realtime socket and
/// the Zoom webhook requires a bearer token.
pub fn router(state: AppState) -> Router {
    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/docs/openapi.json", get(docs::openapi_json))
        .route("/api/realtime", get(realtime::realtime_ws))
        .route("/api/webhooks/zoom", post(webhook::handle_zoom_webhook));

    let course_api = Router::new()
        .route(
            "/api/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/api/courses/join", post(courses::join_course))
        .route(
            "/api/courses/:id",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/api/courses/:id/code", post(courses::regenerate_code))
        .route("/api/courses/:id/members", get(courses::list_members))
        .route(
            "/api/courses/:id/members/:user_id",
            delete(courses::remove_member),
        )
        .route(
            "/api/courses/:id/stream",
            get(stream::get_stream).post(stream::create_post),
        )
        .route("/api/posts/:id", delete(stream::delete_post))
        .route("/api/posts/:id/comments", post(stream::add_comment))
        .route("/api/comments/:id", delete(stream::delete_comment))
        .route(
            "/api/courses/:id/materials",
            get(materials::list_materials).post(materials::upload_material),
        )
        .route(
            "/api/materials/:id",
            get(materials::download_material).delete(materials::delete_material),
        );

    let evaluation_api = Router::new()
        .route(
            "/api/courses/:id/evaluations",
            get(evaluations::list_evaluations).post(evaluations::create_evaluation),
        )
        .route(
            "/api/evaluations/:id",
            get(evaluations::get_evaluation)
                .patch(evaluations::update_evaluation)
                .delete(evaluations::delete_evaluation),
        )
        .route(
            "/api/evaluations/:id/submissions",
            get(submissions::list_submissions).post(submissions::submit_evaluation),
        )
        .route(
            "/api/evaluations/:id/submission",
            get(submissions::my_submission),
        )
        .route(
            "/api/evaluations/:id/files",
            get(submissions::download_answer_file).post(submissions::upload_answer_file),
        )
        .route(
            "/api/submissions/:id",
            get(submissions::review_submission).delete(submissions::delete_submission),
        )
        .route("/api/submissions/:id/grade", post(submissions::grade_answer))
        .route("/api/courses/:id/gradebook", get(gradebook::get_gradebook))
        .route(
            "/api/courses/:id/gradebook/export",
            get(gradebook::export_gradebook),
        );

    let communication_api = Router::new()
        .route("/api/me", get(profile::get_me).patch(profile::update_me))
        .route(
            "/api/messages",
            get(messages::list_conversations).post(messages::send_message),
        )
        .route("/api/messages/unread", get(messages::unread_messages))
        .route("/api/messages/:user_id", get(messages::get_conversation))
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread",
            get(notifications::unread_notifications),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/:id/read",
            post(notifications::mark_notification_read),
        )
        .route(
            "/api/courses/:id/meetings",
            get(meetings::list_meetings).post(meetings::create_meeting),
        )
        .route(
            "/api/meetings/:id/recordings/sync",
            post(meetings::sync_recordings),
        );

    // Layers added later run first: auth resolves the caller before the limiter keys on it.
    let protected_api = course_api
        .merge(evaluation_api)
        .merge(communication_api)
        .route_layer(from_fn_with_state(
            RateLimiter::new(state.config.api_rps),
            rps_middleware,
        ))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    let body_limit = state.config.max_upload_mb * 1024 * 1024;

    base_routes
        .merge(protected_api)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
