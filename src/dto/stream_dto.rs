use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePostPayload {
    #[validate(length(min = 1, max = 10000), custom(function = "crate::utils::validation::not_blank"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCommentPayload {
    #[validate(length(min = 1, max = 4000), custom(function = "crate::utils::validation::not_blank"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamQuery {
    pub limit: Option<i64>,
    pub before: Option<chrono::DateTime<chrono::Utc>>,
}
