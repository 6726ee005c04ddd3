// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "formatting.rs"]
pub mod formatting;

#[path = "moderation/message_filter.rs"]
pub mod moderation;

// Re-export command types for convenience
pub use commands::{Context, Data, Error};
