//! Shared autocomplete providers for ckey and character-name options.
//!
//! Providers are best-effort: a backend failure responds with an empty
//! choice set rather than surfacing an error to the typing user.

use anyhow::{Context as _, Result};
use reqwest::StatusCode;
use serenity::all::{
    CommandInteraction, Context, CreateAutocompleteResponse, CreateInteractionResponse,
};

use crate::api::types::IcName;
use crate::discord::Deps;

/// Discord caps autocomplete responses at 25 choices.
const MAX_CHOICES: usize = 25;

/// Suffix appended to character-name choice values so a follow-up lookup can
/// tell a picked choice from free-typed text and match it exactly.
pub const EXACT_MATCH_SUFFIX: char = '\u{00AD}';

/// Suggests ckeys matching the typed prefix.
pub async fn respond_ckey(
    deps: &Deps,
    ctx: &Context,
    interaction: &CommandInteraction,
    typed: &str,
) -> Result<()> {
    let ckeys = match deps.api.get("autocomplete/ckey", &[("ckey", typed)]).await {
        Ok(response) if response.status == StatusCode::OK => {
            response.json::<Vec<String>>().unwrap_or_default()
        }
        Ok(response) => {
            log::debug!("ckey autocomplete: registry status {}", response.status);
            Vec::new()
        }
        Err(err) => {
            log::debug!("ckey autocomplete: {err}");
            Vec::new()
        }
    };

    let choices = ckeys
        .into_iter()
        .take(MAX_CHOICES)
        .map(|ckey| (ckey.clone(), ckey))
        .collect();

    respond(ctx, interaction, choices).await
}

/// Suggests character names matching the typed prefix, deduplicated, with
/// the exact-match suffix baked into each choice value.
pub async fn respond_character(
    deps: &Deps,
    ctx: &Context,
    interaction: &CommandInteraction,
    typed: &str,
) -> Result<()> {
    let entries = match deps
        .api
        .get("autocomplete/ic_name", &[("ic_name", typed)])
        .await
    {
        Ok(response) if response.status == StatusCode::OK => {
            response.json::<Vec<IcName>>().unwrap_or_default()
        }
        Ok(response) => {
            log::debug!("character autocomplete: registry status {}", response.status);
            Vec::new()
        }
        Err(err) => {
            log::debug!("character autocomplete: {err}");
            Vec::new()
        }
    };

    let choices = unique_names(entries)
        .into_iter()
        .take(MAX_CHOICES)
        .map(|name| {
            let value = format!("{name}{EXACT_MATCH_SUFFIX}");
            (name, value)
        })
        .collect();

    respond(ctx, interaction, choices).await
}

fn unique_names(entries: Vec<IcName>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

async fn respond(
    ctx: &Context,
    interaction: &CommandInteraction,
    choices: Vec<(String, String)>,
) -> Result<()> {
    let mut response = CreateAutocompleteResponse::new();
    for (name, value) in choices {
        response = response.add_string_choice(name, value);
    }

    interaction
        .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(response))
        .await
        .context("failed to send autocomplete response")
}
