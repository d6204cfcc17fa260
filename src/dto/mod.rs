pub mod course_dto;
pub mod evaluation_dto;
pub mod meeting_dto;
pub mod message_dto;
pub mod notification_dto;
pub mod profile_dto;
pub mod stream_dto;
