//! `submissionDenyButton` — permanent button on submission threads.
//!
//! Only usable by staff inside a guild thread; anyone else gets a silent
//! no-op. Locking and archiving the thread are two independent best-effort
//! steps so a failure in one is reported on its own.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditThread, Permissions,
};

use crate::discord::{Deps, PermanentButton};

pub const CUSTOM_ID: &str = "submissionDenyButton";

pub struct DenySubmission;

#[async_trait]
impl PermanentButton for DenySubmission {
    fn custom_id(&self) -> &'static str {
        CUSTOM_ID
    }

    async fn execute(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &ComponentInteraction,
    ) -> Result<()> {
        // Guild members only; the permission check is the authorization
        // boundary for component interactions and fails silently.
        let Some(member) = &interaction.member else {
            return Ok(());
        };
        if !member
            .permissions
            .is_some_and(|permissions| permissions.contains(Permissions::MANAGE_ROLES))
        {
            return Ok(());
        }

        let channel = interaction
            .channel_id
            .to_channel(ctx)
            .await
            .context("failed to fetch the interaction channel")?;
        let is_thread = channel
            .guild()
            .is_some_and(|channel| channel.thread_metadata.is_some());
        if !is_thread {
            return Ok(());
        }

        let submitter = parse_mention(&interaction.message.content);

        interaction
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new().content("The submission was denied."),
                ),
            )
            .await
            .context("failed to reply to the deny button")?;

        // Lock, then archive. Each step carries its own failure handling;
        // a failed lock must not suppress the archive attempt or vice versa.
        if let Err(err) = interaction
            .channel_id
            .edit_thread(&ctx.http, EditThread::new().locked(true))
            .await
        {
            log::warn!("deny: failed to lock thread {}: {err}", interaction.channel_id);
            follow_up(ctx, interaction, "The thread could not be locked.").await;
        }
        if let Err(err) = interaction
            .channel_id
            .edit_thread(&ctx.http, EditThread::new().archived(true))
            .await
        {
            log::warn!("deny: failed to archive thread {}: {err}", interaction.channel_id);
            follow_up(ctx, interaction, "The thread could not be archived.").await;
        }

        let submitter_label = match &submitter {
            Some(id) => format!("<@{id}>"),
            None => "an unknown user".to_string(),
        };

        log::info!(
            "Denied submission of ({}) by [{}]({})",
            submitter.as_deref().unwrap_or("unknown-user"),
            interaction.user.name,
            interaction.user.id
        );
        deps.audit.record(
            &ctx.http,
            format!(
                "The submission by {submitter_label} was denied by <@{}>: <#{}>",
                interaction.user.id, interaction.channel_id
            ),
        );

        Ok(())
    }
}

async fn follow_up(ctx: &Context, interaction: &ComponentInteraction, content: &str) {
    if let Err(err) = interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new().content(content),
        )
        .await
    {
        log::warn!("deny: follow-up failed: {err}");
    }
}

/// Extracts the submitter's id from the first user mention in the thread's
/// opening message.
fn parse_mention(content: &str) -> Option<String> {
    let start = content.find("<@")? + 2;
    let rest = &content[start..];
    let end = rest.find('>')?;
    let id = rest[..end].trim_start_matches('!');

    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}
