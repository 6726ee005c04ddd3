// Discord commands for managing the banned-word list.
//
// Same shape as the other command files:
// 1. Extract the guild id and arguments from Discord
// 2. Call the moderation service
// 3. Reply with the result
//
// Store failures are reported back to the invoker, never propagated to poise.

use crate::core::moderation::BannedTerm;
use crate::discord::formatting::split_for_discord;
use crate::discord::{Context, Error};

const GUILD_ONLY_REPLY: &str = "This command can only be used in a server!";
const NO_TERMS_REPLY: &str = "No banned words found.";

/// Bans a word from being said in the server
#[poise::command(
    slash_command,
    rename = "ban-word",
    default_member_permissions = "MANAGE_MESSAGES"
)]
pub async fn ban_word(
    ctx: Context<'_>,
    #[description = "Word to ban"] word: String,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(GUILD_ONLY_REPLY).await?;
        return Ok(());
    };
    ctx.defer().await?;

    let reply = match ctx
        .data()
        .moderation
        .add_term(&guild_id.to_string(), &word)
        .await
    {
        Ok(_) => format!("Banned word \"{}\"", word),
        Err(e) => {
            tracing::error!(guild_id = guild_id.get(), "Error in ban-word command: {}", e);
            format!("Error banning word: {}", e)
        }
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Unbans a word from being said in the server
#[poise::command(
    slash_command,
    rename = "unban-word",
    default_member_permissions = "MANAGE_MESSAGES"
)]
pub async fn unban_word(
    ctx: Context<'_>,
    #[description = "Word to unban"] word: String,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(GUILD_ONLY_REPLY).await?;
        return Ok(());
    };
    ctx.defer().await?;

    let reply = match ctx
        .data()
        .moderation
        .remove_term(&guild_id.to_string(), &word)
        .await
    {
        Ok(()) => format!("Unbanned word \"{}\"", word),
        Err(e) => {
            tracing::error!(guild_id = guild_id.get(), "Error in unban-word command: {}", e);
            format!("Error unbanning word: {}", e)
        }
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Lists all banned words
#[poise::command(slash_command, rename = "list-banned-words")]
pub async fn list_banned_words(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(GUILD_ONLY_REPLY).await?;
        return Ok(());
    };
    ctx.defer().await?;

    match ctx.data().moderation.list_terms(&guild_id.to_string()).await {
        Ok(terms) => {
            for chunk in format_term_list(&terms) {
                ctx.say(chunk).await?;
            }
        }
        Err(e) => {
            tracing::error!(
                guild_id = guild_id.get(),
                "Error in list-banned-words command: {}",
                e
            );
            ctx.say(format!("Error listing banned words: {}", e)).await?;
        }
    }

    Ok(())
}

/// Render the term list as one or more messages that fit Discord's limit.
pub fn format_term_list(terms: &[BannedTerm]) -> Vec<String> {
    if terms.is_empty() {
        return vec![NO_TERMS_REPLY.to_string()];
    }

    let mut body = String::from("Banned words:");
    for term in terms {
        body.push('\n');
        body.push_str(&term.text);
    }

    split_for_discord(&body)
}
