// Discord commands module.
// Each feature gets its own command file.

pub mod banned_words;

pub mod general;

use crate::core::moderation::ModerationService;
use crate::infra::moderation::SqliteTermStore;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event.
pub struct Data {
    pub moderation: Arc<ModerationService<SqliteTermStore>>,
}
