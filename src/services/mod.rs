pub mod access;
pub mod course_service;
pub mod evaluation_service;
pub mod export_service;
pub mod gradebook_service;
pub mod grading_service;
pub mod material_service;
pub mod meeting_service;
pub mod message_service;
pub mod notification_service;
pub mod profile_service;
pub mod realtime_service;
pub mod storage_service;
pub mod stream_service;
pub mod submission_service;
pub mod zoom_service;
