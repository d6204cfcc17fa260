use axum::Json;
use utoipa::OpenApi;

use crate::dto::{course_dto, evaluation_dto, meeting_dto, message_dto, notification_dto, profile_dto};
use crate::models::{
    course, evaluation, gradebook, material, meeting, message, notification, post, question,
    submission, user,
};
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::courses::create_course,
        routes::courses::list_courses,
        routes::courses::get_course,
        routes::courses::update_course,
        routes::courses::delete_course,
        routes::courses::regenerate_code,
        routes::courses::join_course,
        routes::courses::list_members,
        routes::courses::remove_member,
        routes::evaluations::create_evaluation,
        routes::evaluations::list_evaluations,
        routes::evaluations::get_evaluation,
        routes::evaluations::update_evaluation,
        routes::evaluations::delete_evaluation,
        routes::submissions::submit_evaluation,
        routes::submissions::list_submissions,
        routes::submissions::my_submission,
        routes::submissions::review_submission,
        routes::submissions::grade_answer,
        routes::submissions::delete_submission,
        routes::submissions::upload_answer_file,
        routes::gradebook::get_gradebook,
        routes::gradebook::export_gradebook,
        routes::messages::send_message,
        routes::messages::list_conversations,
        routes::messages::get_conversation,
        routes::messages::unread_messages,
        routes::notifications::list_notifications,
        routes::notifications::unread_notifications,
        routes::notifications::mark_notification_read,
        routes::notifications::mark_all_notifications_read,
        routes::profile::get_me,
        routes::profile::update_me,
        routes::meetings::create_meeting,
        routes::meetings::list_meetings,
        routes::meetings::sync_recordings,
    ),
    components(
        schemas(
            course_dto::CreateCoursePayload,
            course_dto::UpdateCoursePayload,
            course_dto::JoinCoursePayload,
            course_dto::CourseResponse,
            course::Course,
            course::CourseRole,
            course::CourseSummary,
            course::CourseMember,
            evaluation_dto::CreateQuestion,
            evaluation_dto::CreateEvaluationPayload,
            evaluation_dto::UpdateEvaluationPayload,
            evaluation_dto::EvaluationSummary,
            evaluation_dto::SubmitAnswer,
            evaluation_dto::SubmitEvaluationPayload,
            evaluation_dto::SubmitEvaluationResponse,
            evaluation_dto::GradeAnswerPayload,
            evaluation_dto::UploadedAnswerFile,
            evaluation::Evaluation,
            evaluation::EvaluationStatus,
            question::QuestionType,
            submission::Submission,
            submission::Answer,
            submission::SubmissionListItem,
            material::Material,
            post::Post,
            post::Comment,
            gradebook::Gradebook,
            gradebook::GradebookColumn,
            gradebook::GradebookRow,
            gradebook::GradebookCell,
            message_dto::SendMessagePayload,
            message_dto::UnreadCountResponse,
            message::Message,
            message::ConversationSummary,
            notification_dto::MarkedReadResponse,
            notification::Notification,
            profile_dto::UpdateProfilePayload,
            user::Profile,
            user::UserRole,
            meeting_dto::CreateMeetingPayload,
            meeting::Meeting,
            meeting::Recording,
        )
    ),
    tags(
        (name = "aula-virtual", description = "Aula Virtual course management API")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
