//! `/verify code` — self-service redemption of a one-time token.
//!
//! All replies are ephemeral; only the invoker learns the outcome. A
//! successful link goes to the audit sink.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
};

use crate::discord::{options, reply_ephemeral, Deps, SlashCommand, BACKEND_DOWN};
use crate::link::{self, LinkOutcome};

pub struct Verify;

#[async_trait]
impl SlashCommand for Verify {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Links your Discord account to your BYOND account.")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "code",
                    "The one-time code obtained in game.",
                )
                .required(true),
            )
    }

    async fn execute(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<()> {
        let resolved = interaction.data.options();
        let code = options::str_option(&resolved, "code").context("missing code option")?;
        let chat_id = interaction.user.id.to_string();

        let outcome = link::verify_by_token(&deps.api, &chat_id, code).await;

        let content = match &outcome {
            LinkOutcome::Created { ckey, .. } => {
                log::info!(
                    "Verified user [{}]({}) with ckey `{}`",
                    interaction.user.name,
                    chat_id,
                    ckey
                );
                deps.audit.record(
                    &ctx.http,
                    format!("<@{chat_id}> linked their account to the BYOND account `{ckey}`."),
                );

                format!("Your Discord account is now linked to the BYOND account `{ckey}`.")
            }
            LinkOutcome::InvalidToken => {
                "The code does not match the expected shape, please enter it as shown.\n\
                 For example: `/verify 123-456`"
                    .to_string()
            }
            LinkOutcome::NotFound => "The code is invalid.".to_string(),
            LinkOutcome::CkeyAlreadyLinked { existing_chat_id } => {
                format!("This code belongs to the Discord account <@{existing_chat_id}>.")
            }
            LinkOutcome::ChatAlreadyLinked { existing_ckey } => {
                format!(
                    "Your Discord account is already linked to the BYOND account `{existing_ckey}`."
                )
            }
            LinkOutcome::TransportFailure => BACKEND_DOWN.to_string(),
            LinkOutcome::Removed { .. } | LinkOutcome::NotLinked => {
                log::warn!("verify: outcome outside the verify contract: {outcome:?}");
                BACKEND_DOWN.to_string()
            }
        };

        reply_ephemeral(ctx, interaction, content).await
    }
}
