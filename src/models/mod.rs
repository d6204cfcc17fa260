pub mod course;
pub mod evaluation;
pub mod gradebook;
pub mod material;
pub mod meeting;
pub mod message;
pub mod notification;
pub mod post;
pub mod question;
pub mod submission;
pub mod user;
