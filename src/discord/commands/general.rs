use crate::discord::{Context, Error};

/// Simple test command
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    ctx.say("Pong!").await?;
    Ok(())
}
