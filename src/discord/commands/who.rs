//! `/who ckey|user|character` — resolve an identity pair from either side,
//! or look a player up by character name.

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    Permissions,
};

use crate::api::types::{IcName, LinkedUser};
use crate::api::ApiClient;
use crate::discord::autocomplete::{self, EXACT_MATCH_SUFFIX};
use crate::discord::{options, reply, Deps, SlashCommand, BACKEND_DOWN};
use crate::link;

pub struct Who;

#[async_trait]
impl SlashCommand for Who {
    fn name(&self) -> &'static str {
        "who"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Shows the player's Discord account.")
            .default_member_permissions(Permissions::MANAGE_ROLES)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "ckey",
                    "Shows the player's Discord account by ckey.",
                )
                .add_sub_option(
                    CreateCommandOption::new(CommandOptionType::String, "ckey", "The player's ckey")
                        .required(true)
                        .set_autocomplete(true),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "user",
                    "Shows the player's ckey by Discord account.",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::User,
                        "user",
                        "The player's Discord account",
                    )
                    .required(true),
                ),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "character",
                    "Shows the player's ckey by character name.",
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "character",
                        "The name of the player's character",
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
            bail!("who invoked without a subcommand");
        };

        let content = match sub {
            "ckey" => {
                let ckey = options::str_option(args, "ckey").context("missing ckey option")?;
                by_ckey(&deps.api, &link::normalize_ckey(ckey)).await
            }
            "user" => {
                let user = options::user_option(args, "user").context("missing user option")?;
                by_chat_id(&deps.api, &user.id.to_string()).await
            }
            "character" => {
                let name =
                    options::str_option(args, "character").context("missing character option")?;
                by_character(&deps.api, name).await
            }
            other => bail!("who invoked with unknown subcommand: {other}"),
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

        match focused.name {
            "ckey" => autocomplete::respond_ckey(deps, ctx, interaction, focused.value).await,
            "character" => {
                autocomplete::respond_character(deps, ctx, interaction, focused.value).await
            }
            _ => Ok(()),
        }
    }
}

async fn by_ckey(api: &ApiClient, ckey: &str) -> String {
    match api.get("player/discord/", &[("ckey", ckey)]).await {
        Ok(response) if response.status == StatusCode::OK => match response.json::<LinkedUser>() {
            Ok(user) => format!("The player's Discord account: <@{}>", user.id),
            Err(err) => {
                log::warn!("who ckey: undecodable 200 body: {err}");
                BACKEND_DOWN.to_string()
            }
        },
        Ok(response) if response.status == StatusCode::NOT_FOUND => "Player not found.".to_string(),
        Ok(response) if response.status == StatusCode::CONFLICT => {
            "The player's Discord account is not linked.".to_string()
        }
        Ok(response) => {
            log::warn!("who ckey: unexpected registry status {}", response.status);
            BACKEND_DOWN.to_string()
        }
        Err(err) => {
            log::warn!("who ckey: {err}");
            BACKEND_DOWN.to_string()
        }
    }
}

async fn by_chat_id(api: &ApiClient, chat_id: &str) -> String {
    match api.get("player/discord/", &[("discord_id", chat_id)]).await {
        Ok(response) if response.status == StatusCode::OK => match response.text() {
            Ok(ckey) => format!("The player's ckey: `{ckey}`"),
            Err(err) => {
                log::warn!("who user: undecodable 200 body: {err}");
                BACKEND_DOWN.to_string()
            }
        },
        Ok(response) if response.status == StatusCode::NOT_FOUND => "Player not found.".to_string(),
        Ok(response) if response.status == StatusCode::CONFLICT => {
            "The player's Discord account is not linked.".to_string()
        }
        Ok(response) => {
            log::warn!("who user: unexpected registry status {}", response.status);
            BACKEND_DOWN.to_string()
        }
        Err(err) => {
            log::warn!("who user: {err}");
            BACKEND_DOWN.to_string()
        }
    }
}

async fn by_character(api: &ApiClient, typed: &str) -> String {
    // A value picked from the autocomplete list carries the suffix and must
    // match the stored name exactly; free-typed text is a prefix search.
    let (name, exact) = match typed.strip_suffix(EXACT_MATCH_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (typed, false),
    };

    let entries = match api.get("autocomplete/ic_name", &[("ic_name", name)]).await {
        Ok(response) if response.status == StatusCode::OK => {
            match response.json::<Vec<IcName>>() {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!("who character: undecodable 200 body: {err}");
                    return BACKEND_DOWN.to_string();
                }
            }
        }
        Ok(response) => {
            log::warn!("who character: unexpected registry status {}", response.status);
            return BACKEND_DOWN.to_string();
        }
        Err(err) => {
            log::warn!("who character: {err}");
            return BACKEND_DOWN.to_string();
        }
    };

    character_matches(entries, name, exact)
}

fn character_matches(entries: Vec<IcName>, name: &str, exact: bool) -> String {
    let matches: Vec<IcName> = if exact {
        entries.into_iter().filter(|entry| entry.name == name).collect()
    } else {
        entries
    };

    if matches.is_empty() {
        return "Player not found.".to_string();
    }

    matches
        .iter()
        .map(|entry| format!("{} - `{}`", entry.name, entry.ckey))
        .collect::<Vec<_>>()
        .join("\n")
}
