//! Centcom - Discord bot bridging the game server account backend with the
//! staff guild.
//!
//! Staff query player history, link or unlink Discord accounts to BYOND
//! accounts, and check live server status through slash commands and one
//! permanent button. The account registry is the single source of truth for
//! the identity mapping; this process only proposes mutations and reports
//! outcomes.
//!
//! # Module Structure
//!
//! - `api`: registry HTTP client and payload types
//! - `link`: account-link state machine (verify / unverify / force-verify)
//! - `discord`: dispatch core, command and button handlers, audit sink
//! - `config` / `logging` / `errors`: startup plumbing

pub mod api;
pub mod config;
pub mod discord;
pub mod errors;
pub mod link;
pub mod logging;

// Re-export commonly used types for convenience
pub use api::{ApiClient, ApiResponse};
pub use config::Config;
pub use errors::ApiError;
pub use link::LinkOutcome;
