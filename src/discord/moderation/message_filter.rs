// Discord-specific banned-word handling - adapts serenity messages to the
// core moderation service.

use crate::core::moderation::{InboundMessage, MessageChannel, ModerationError, ModerationOutcome};
use crate::discord::formatting::split_for_discord;
use crate::discord::{Data, Error};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

/// The channel a message arrived on, as seen by the moderation service.
struct SerenityChannel<'a> {
    ctx: &'a serenity::Context,
    message: &'a serenity::Message,
}

#[async_trait]
impl<'a> MessageChannel for SerenityChannel<'a> {
    async fn delete_message(&self) -> Result<(), ModerationError> {
        self.message
            .delete(&self.ctx.http)
            .await
            .map_err(|e| ModerationError::DeliveryFailed(e.to_string()))
    }

    async fn publish(&self, text: &str) -> Result<(), ModerationError> {
        // A near-limit message grows past 2000 characters once redacted
        for chunk in split_for_discord(text) {
            self.message
                .channel_id
                .say(&self.ctx.http, chunk)
                .await
                .map_err(|e| ModerationError::DeliveryFailed(e.to_string()))?;
        }
        Ok(())
    }
}

fn to_inbound(msg: &serenity::Message) -> InboundMessage {
    InboundMessage {
        body: msg.content.clone(),
        community_id: msg.guild_id.map(|id| id.to_string()),
        author_is_automated: msg.author.bot,
        author_display_name: msg.author.name.clone(),
    }
}

/// Check a message for banned words, deleting and republishing it redacted.
///
/// Returns an error only when the term list could not be loaded.
pub async fn handle_message_for_banned_words(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<ModerationOutcome, Error> {
    let channel = SerenityChannel { ctx, message: msg };

    let outcome = data
        .moderation
        .moderate_message(&to_inbound(msg), &channel)
        .await?;

    if let ModerationOutcome::Redacted {
        deleted, published, ..
    } = &outcome
    {
        tracing::info!(
            guild_id = msg.guild_id.map(|id| id.get()),
            channel_id = msg.channel_id.get(),
            author_id = msg.author.id.get(),
            deleted,
            published,
            "Redacted message containing a banned word"
        );
    }

    Ok(outcome)
}
