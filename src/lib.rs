pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    course_service::CourseService, evaluation_service::EvaluationService,
    gradebook_service::GradebookService, material_service::MaterialService,
    meeting_service::MeetingService, message_service::MessageService,
    notification_service::NotificationService, profile_service::ProfileService,
    realtime_service::RealtimeHub, storage_service::StorageService, stream_service::StreamService,
    submission_service::SubmissionService, zoom_service::ZoomClient,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub hub: RealtimeHub,
    pub profile_service: ProfileService,
    pub course_service: CourseService,
    pub stream_service: StreamService,
    pub material_service: MaterialService,
    pub evaluation_service: EvaluationService,
    pub submission_service: SubmissionService,
    pub gradebook_service: GradebookService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
    pub meeting_service: MeetingService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self> {
        let hub = RealtimeHub::default();
        let storage = StorageService::new(config.storage_dir.clone());
        let zoom = ZoomClient::new(config.zoom.clone())?;

        let notification_service = NotificationService::new(pool.clone(), hub.clone());
        let profile_service = ProfileService::new(pool.clone());
        let course_service = CourseService::new(pool.clone());
        let stream_service = StreamService::new(pool.clone(), notification_service.clone());
        let material_service =
            MaterialService::new(pool.clone(), storage.clone(), notification_service.clone());
        let evaluation_service = EvaluationService::new(pool.clone(), notification_service.clone());
        let submission_service = SubmissionService::new(
            pool.clone(),
            evaluation_service.clone(),
            storage,
            notification_service.clone(),
        );
        let gradebook_service = GradebookService::new(pool.clone());
        let message_service = MessageService::new(pool.clone(), hub.clone());
        let meeting_service = MeetingService::new(pool.clone(), zoom, notification_service.clone());

        Ok(Self {
            pool,
            config: Arc::new(config),
            hub,
            profile_service,
            course_service,
            stream_service,
            material_service,
            evaluation_service,
            submission_service,
            gradebook_service,
            message_service,
            notification_service,
            meeting_service,
        })
    }
}
