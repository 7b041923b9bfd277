//! `/force-verify user ckey` — operator link creation bypassing the one-time
//! token. Same conflict mapping as `/verify`; the ckey comes straight from
//! the operator and is case-normalized before the registry call.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    Permissions,
};

use crate::discord::{options, reply, Deps, SlashCommand, BACKEND_DOWN};
use crate::link::{self, LinkOutcome};

pub struct ForceVerify;

#[async_trait]
impl SlashCommand for ForceVerify {
    fn name(&self) -> &'static str {
        "force-verify"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Links a Discord account to a BYOND account.")
            .default_member_permissions(Permissions::MANAGE_CHANNELS)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::User,
                    "user",
                    "The Discord account to link.",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "ckey",
                    "The ckey of the BYOND account to link.",
                )
                .required(true)
                .set_autocomplete(true),
            )
    }

    async fn execute(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<()> {
        let resolved = interaction.data.options();
        let user = options::user_option(&resolved, "user").context("missing user option")?;
        let ckey = options::str_option(&resolved, "ckey").context("missing ckey option")?;

        let chat_id = user.id.to_string();
        let invoker = interaction.user.id;

        let outcome = link::force_link(&deps.api, &chat_id, ckey).await;

        let content = match &outcome {
            LinkOutcome::Created { ckey, .. } => {
                log::info!(
                    "Force-verified user [{}]({}) with ckey `{}` by [{}]({})",
                    user.name,
                    chat_id,
                    ckey,
                    interaction.user.name,
                    invoker
                );
                deps.audit.record(
                    &ctx.http,
                    format!(
                        "<@{chat_id}> was linked to the BYOND account `{ckey}` by <@{invoker}>."
                    ),
                );

                format!("<@{chat_id}> is now linked to the BYOND account `{ckey}`.")
            }
            LinkOutcome::NotFound => "Player not found.".to_string(),
            LinkOutcome::CkeyAlreadyLinked { existing_chat_id } => {
                format!("That ckey is already linked to the Discord account <@{existing_chat_id}>!")
            }
            LinkOutcome::ChatAlreadyLinked { existing_ckey } => {
                format!(
                    "That Discord account is already linked to the BYOND account \
                     `{existing_ckey}`!"
                )
            }
            LinkOutcome::TransportFailure => BACKEND_DOWN.to_string(),
            LinkOutcome::Removed { .. } | LinkOutcome::NotLinked | LinkOutcome::InvalidToken => {
                log::warn!("force-verify: outcome outside the verify contract: {outcome:?}");
                BACKEND_DOWN.to_string()
            }
        };

        reply(ctx, interaction, content).await
    }

    async fn autocomplete(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<()> {
        let Some(focused) = interaction.data.autocomplete() else {
            return Ok(());
        };
        crate::discord::autocomplete::respond_ckey(deps, ctx, interaction, focused.value).await
    }
}
