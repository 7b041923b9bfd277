//! `/characters ckey` — staff lookup of every character a player has played.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    Permissions,
};

use crate::api::types::CharacterCounts;
use crate::discord::{options, reply, Deps, SlashCommand, BACKEND_DOWN};
use crate::link;

pub struct Characters;

#[async_trait]
impl SlashCommand for Characters {
    fn name(&self) -> &'static str {
        "characters"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Lists every character the player has played so far.")
            .default_member_permissions(Permissions::MANAGE_ROLES)
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "ckey", "The player's ckey")
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
        let ckey = options::str_option(&resolved, "ckey").context("missing ckey option")?;
        let ckey = link::normalize_ckey(ckey);

        let content = match deps.api.get("player/characters", &[("ckey", &ckey)]).await {
            Ok(response) if response.status == StatusCode::OK => {
                match response.json::<CharacterCounts>() {
                    Ok(characters) => character_list(&characters),
                    Err(err) => {
                        log::warn!("characters: undecodable 200 body: {err}");
                        BACKEND_DOWN.to_string()
                    }
                }
            }
            Ok(response) if response.status == StatusCode::NOT_FOUND => {
                "Player not found.".to_string()
            }
            Ok(response) => {
                log::warn!("characters: unexpected registry status {}", response.status);
                BACKEND_DOWN.to_string()
            }
            Err(err) => {
                log::warn!("characters: {err}");
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

fn character_list(characters: &[(String, u64)]) -> String {
    if characters.is_empty() {
        return "The player has never played a character.".to_string();
    }

    characters
        .iter()
        .map(|(name, _)| format!("``{name}``"))
        .collect::<Vec<_>>()
        .join(", ")
}
