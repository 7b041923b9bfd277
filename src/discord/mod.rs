//! Discord integration: dispatch core, command/button handlers, audit sink.
//!
//! Every inbound interaction is routed through the registries here to exactly
//! one handler. Handlers are registered once at startup from the static
//! manifests; adding a command or button is one manifest entry. Faults inside
//! a handler (error results and panics alike) are contained to that one
//! interaction and logged, never propagated to the gateway loop.

pub mod audit;
pub mod autocomplete;
pub mod buttons;
pub mod commands;
pub mod options;

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use futures_util::FutureExt;
use serenity::all::{
    ChannelId, CommandInteraction, ComponentInteraction, Context, CreateCommand,
    CreateInteractionResponse, CreateInteractionResponseMessage, EventHandler, GuildId,
    Interaction, Ready,
};

use crate::api::ApiClient;
use crate::config::Config;
use crate::discord::audit::Audit;

/// Generic user-facing failure text for backend trouble. The details go to
/// the log, not the user.
pub const BACKEND_DOWN: &str = "The backend could not be reached, please try again later.";

/// Shared handler dependencies, built once at startup.
pub struct Deps {
    pub api: ApiClient,
    pub audit: Audit,
}

/// A slash command: schema declaration plus executor, selected by name.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// The command name interactions are dispatched by.
    fn name(&self) -> &'static str;

    /// Declares the command schema registered with the guild, including its
    /// declarative permission requirement.
    fn register(&self) -> CreateCommand;

    /// Runs the command. Exactly one reply (immediate, or deferred then
    /// edited) per control path.
    async fn execute(&self, deps: &Deps, ctx: &Context, interaction: &CommandInteraction)
        -> Result<()>;

    /// Responds to an autocomplete request for one of this command's
    /// options. Commands without autocompleted options keep the default.
    async fn autocomplete(
        &self,
        _deps: &Deps,
        _ctx: &Context,
        _interaction: &CommandInteraction,
    ) -> Result<()> {
        Ok(())
    }
}

/// A permanent message component, selected by the stable custom id embedded
/// at message-creation time. Authorization is the handler's own first step;
/// unauthorized presses return silently.
#[async_trait]
pub trait PermanentButton: Send + Sync {
    fn custom_id(&self) -> &'static str;

    async fn execute(
        &self,
        deps: &Deps,
        ctx: &Context,
        interaction: &ComponentInteraction,
    ) -> Result<()>;
}

/// The static command manifest. New command = one entry here.
pub fn command_manifest() -> Vec<Box<dyn SlashCommand>> {
    vec![
        Box::new(commands::characters::Characters),
        Box::new(commands::check::Check),
        Box::new(commands::verify::Verify),
        Box::new(commands::unverify::Unverify),
        Box::new(commands::force_verify::ForceVerify),
        Box::new(commands::who::Who),
    ]
}

/// The static button manifest.
pub fn button_manifest() -> Vec<Box<dyn PermanentButton>> {
    vec![Box::new(buttons::deny_submission::DenySubmission)]
}

/// Lookup table from command name to handler.
pub struct CommandRegistry {
    entries: HashMap<&'static str, Box<dyn SlashCommand>>,
}

impl CommandRegistry {
    pub fn new(manifest: Vec<Box<dyn SlashCommand>>) -> Self {
        let mut entries = HashMap::with_capacity(manifest.len());
        for command in manifest {
            if let Some(previous) = entries.insert(command.name(), command) {
                log::warn!(
                    "duplicate command manifest entry: {}, keeping the later one",
                    previous.name()
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&dyn SlashCommand> {
        self.entries.get(name).map(AsRef::as_ref)
    }

    /// The schema set registered with the guild at startup.
    pub fn registrations(&self) -> Vec<CreateCommand> {
        self.entries.values().map(|command| command.register()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup table from component custom id to handler.
pub struct ButtonRegistry {
    entries: HashMap<&'static str, Box<dyn PermanentButton>>,
}

impl ButtonRegistry {
    pub fn new(manifest: Vec<Box<dyn PermanentButton>>) -> Self {
        let mut entries = HashMap::with_capacity(manifest.len());
        for button in manifest {
            if let Some(previous) = entries.insert(button.custom_id(), button) {
                log::warn!(
                    "duplicate button manifest entry: {}, keeping the later one",
                    previous.custom_id()
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, custom_id: &str) -> Option<&dyn PermanentButton> {
        self.entries.get(custom_id).map(AsRef::as_ref)
    }
}

/// Runs one executor, containing any failure to its own interaction.
///
/// Both error results and panics end up as log lines; nothing propagates to
/// the dispatch loop, so one broken handler cannot take concurrent or future
/// interactions down with it.
pub async fn isolate<F>(kind: &str, id: &str, work: F)
where
    F: Future<Output = Result<()>>,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::error!("{kind} handler '{id}' failed: {err:#}"),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            log::error!("{kind} handler '{id}' panicked: {message}");
        }
    }
}

/// Sends the single immediate reply for an interaction.
pub async fn reply(
    ctx: &Context,
    interaction: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().content(content),
            ),
        )
        .await
        .context("failed to send interaction reply")
}

/// Like [`reply`], but visible only to the invoker.
pub async fn reply_ephemeral(
    ctx: &Context,
    interaction: &CommandInteraction,
    content: impl Into<String>,
) -> Result<()> {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await
        .context("failed to send interaction reply")
}

/// Gateway event handler: builds the registries once and routes every
/// interaction to exactly one executor.
pub struct Handler {
    guild_id: GuildId,
    deps: Deps,
    commands: CommandRegistry,
    buttons: ButtonRegistry,
}

impl Handler {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            guild_id: GuildId::new(config.guild_id),
            deps: Deps {
                api: ApiClient::new(&config.api)?,
                audit: Audit::new(ChannelId::new(config.log.verify_channel)),
            },
            commands: CommandRegistry::new(command_manifest()),
            buttons: ButtonRegistry::new(button_manifest()),
        })
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("Connected as {}", ready.user.name);

        match self
            .guild_id
            .set_commands(&ctx.http, self.commands.registrations())
            .await
        {
            Ok(registered) => log::info!("Registered {} guild commands", registered.len()),
            Err(err) => log::error!("Failed to register guild commands: {err}"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                let name = command.data.name.clone();
                match self.commands.get(&name) {
                    Some(handler) => {
                        isolate("command", &name, handler.execute(&self.deps, &ctx, &command))
                            .await;
                    }
                    // Unknown names come from stale messages; not an error.
                    None => log::debug!("ignoring unknown command: {name}"),
                }
            }
            Interaction::Autocomplete(command) => {
                let name = command.data.name.clone();
                if let Some(handler) = self.commands.get(&name) {
                    isolate(
                        "autocomplete",
                        &name,
                        handler.autocomplete(&self.deps, &ctx, &command),
                    )
                    .await;
                }
            }
            Interaction::Component(component) => {
                let custom_id = component.data.custom_id.clone();
                match self.buttons.get(&custom_id) {
                    Some(handler) => {
                        isolate(
                            "button",
                            &custom_id,
                            handler.execute(&self.deps, &ctx, &component),
                        )
                        .await;
                    }
                    None => log::debug!("ignoring unknown component: {custom_id}"),
                }
            }
            _ => {}
        }
    }
}
