//! `/unverify user|ckey` — operator removal of an identity pair from either
//! side. Successful removals go to the audit sink with the operator named.

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    Permissions,
};

use crate::discord::{options, reply, Deps, SlashCommand, BACKEND_DOWN};
use crate::link::{self, LinkOutcome};

pub struct Unverify;

#[async_trait]
impl SlashCommand for Unverify {
    fn name(&self) -> &'static str {
        "unverify"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Removes the link between a Discord account and a BYOND account.")
            .default_member_permissions(Permissions::MANAGE_CHANNELS)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "user",
                    "Removes the link by Discord account.",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::User,
                        "user",
                        "The Discord account to unlink.",
                    )
                    .required(true),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "ckey",
                    "Removes the link by BYOND account.",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "ckey",
                        "The ckey of the BYOND account to unlink.",
                    )
                    .required(true)
                    .set_autocomplete(true),
                ),
            )
    }

    async fn execute(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<()> {
        let resolved = interaction.data.options();
        let Some((sub, args)) = options::subcommand(&resolved) else {
            bail!("unverify invoked without a subcommand");
        };
        let invoker = interaction.user.id;

        let content = match sub {
            "user" => {
                let user = options::user_option(args, "user").context("missing user option")?;
                let chat_id = user.id.to_string();

                match link::unlink_by_chat_id(&deps.api, &chat_id).await {
                    LinkOutcome::Removed { ckey, .. } => {
                        log::info!(
                            "Unverified user [{}]({}) with ckey `{}` by [{}]({})",
                            user.name,
                            chat_id,
                            ckey,
                            interaction.user.name,
                            invoker
                        );
                        deps.audit.record(
                            &ctx.http,
                            format!(
                                "The link between <@{chat_id}> and the BYOND account `{ckey}` \
                                 was removed by <@{invoker}>."
                            ),
                        );

                        format!(
                            "The link between <@{chat_id}> and the BYOND account `{ckey}` \
                             has been removed."
                        )
                    }
                    LinkOutcome::NotLinked => "That account is not linked.".to_string(),
                    LinkOutcome::NotFound => "Account not found.".to_string(),
                    outcome => failure(sub, &outcome),
                }
            }
            "ckey" => {
                let ckey = options::str_option(args, "ckey").context("missing ckey option")?;

                match link::unlink_by_ckey(&deps.api, ckey).await {
                    LinkOutcome::Removed { ckey, chat_id } => {
                        log::info!(
                            "Unverified ckey `{}` from ({}) by [{}]({})",
                            ckey,
                            chat_id,
                            interaction.user.name,
                            invoker
                        );
                        deps.audit.record(
                            &ctx.http,
                            format!(
                                "The link between <@{chat_id}> and the BYOND account `{ckey}` \
                                 was removed by <@{invoker}>."
                            ),
                        );

                        format!(
                            "The link between the BYOND account `{ckey}` and <@{chat_id}> \
                             has been removed."
                        )
                    }
                    LinkOutcome::NotFound => "Player not found.".to_string(),
                    LinkOutcome::NotLinked => "That account is not linked.".to_string(),
                    outcome => failure(sub, &outcome),
                }
            }
            other => bail!("unverify invoked with unknown subcommand: {other}"),
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

fn failure(sub: &str, outcome: &LinkOutcome) -> String {
    if !matches!(outcome, LinkOutcome::TransportFailure) {
        log::warn!("unverify {sub}: outcome outside the unverify contract: {outcome:?}");
    }
    BACKEND_DOWN.to_string()
}
