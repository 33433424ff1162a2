/// Discord Interactions
///
/// Request verification, interaction payloads and responses, the slash-command
/// definitions, and the REST calls that complete deferred interactions.

use anyhow::Result;
use async_trait::async_trait;

pub mod commands;
pub mod interaction;
pub mod rest;
pub mod verify;

pub use commands::{futures_command, CommandDef, CommandScope, RegisteredCommand};
pub use interaction::{Interaction, InteractionResponse};
pub use rest::{attachment_payload, DiscordRest, DEFAULT_API_BASE, FUTURES_FILENAME};
pub use verify::{InteractionVerifier, VerifyError, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Terminal edits of a deferred interaction's `@original` message.
#[async_trait]
pub trait InteractionNotifier: Send + Sync {
    /// Replace the placeholder with exactly one PNG attachment and no text.
    async fn edit_original_png(&self, application_id: &str, token: &str, png: Vec<u8>) -> Result<()>;

    async fn edit_original_text(&self, application_id: &str, token: &str, content: &str) -> Result<()>;
}

/// Bot-token channel uploads.
#[async_trait]
pub trait ChannelPoster: Send + Sync {
    async fn post_png(&self, channel_id: &str, png: Vec<u8>, filename: &str) -> Result<()>;
}
