// Core moderation module - banned-term detection and management.

pub mod moderation_models;
pub mod moderation_service;
pub mod retry_policy;
pub mod term_detection;

pub use moderation_models::*;
pub use moderation_service::*;
pub use retry_policy::{RetryPolicy, TokioSleeper};
