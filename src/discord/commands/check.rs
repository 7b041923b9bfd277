//! `/check` — live round status.
//!
//! The only deferred command: the status call can outlive the platform reply
//! deadline, so the interaction is acknowledged first and finalized with an
//! edit.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serenity::all::{
    CommandInteraction, Context, CreateActionRow, CreateButton, CreateCommand,
    EditInteractionResponse,
};

use crate::api::types::{LiveStatus, ServerStatus};
use crate::discord::{Deps, SlashCommand, BACKEND_DOWN};

const CONNECT_URL: &str = "https://turkb.us/connect";

const CLOSED: &str = "The server is closed or a new round is starting.";

pub struct Check;

#[async_trait]
impl SlashCommand for Check {
    fn name(&self) -> &'static str {
        "check"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Shows the current round status.")
    }

    async fn execute(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<()> {
        interaction
            .defer(&ctx.http)
            .await
            .context("failed to defer check reply")?;

        let (content, live) = match deps.api.get("server", &[]).await {
            Ok(response) if response.status == StatusCode::OK => {
                match response.json::<Vec<ServerStatus>>() {
                    Ok(servers) => status_content(&servers),
                    Err(err) => {
                        log::warn!("check: undecodable server status body: {err}");
                        (BACKEND_DOWN.to_string(), false)
                    }
                }
            }
            Ok(response) => {
                log::warn!("check: unexpected registry status {}", response.status);
                (BACKEND_DOWN.to_string(), false)
            }
            Err(err) => {
                log::warn!("check: {err}");
                (BACKEND_DOWN.to_string(), false)
            }
        };

        let mut edit = EditInteractionResponse::new().content(content);
        if live {
            edit = edit.components(vec![CreateActionRow::Buttons(vec![
                CreateButton::new_link(CONNECT_URL).label("Connect"),
            ])]);
        }

        interaction
            .edit_response(&ctx.http, edit)
            .await
            .context("failed to edit check reply")?;
        Ok(())
    }
}

/// Builds the reply for the first reported server and whether the connect
/// button should be attached. A down server never produces round details.
fn status_content(servers: &[ServerStatus]) -> (String, bool) {
    match servers.first() {
        Some(ServerStatus::Live(live)) => (round_summary(live), true),
        Some(ServerStatus::Down(_)) | None => (CLOSED.to_string(), false),
    }
}

fn round_summary(live: &LiveStatus) -> String {
    let phase = if live.gamestate <= 2 {
        "starting"
    } else if live.gamestate == 3 {
        "in progress"
    } else {
        "about to end"
    };

    format!(
        "Round #{}: {} players on {}, {}.",
        live.round_id, live.players, live.map, phase
    )
}
