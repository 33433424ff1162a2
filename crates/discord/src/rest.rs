use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::commands::{CommandDef, CommandScope, RegisteredCommand};
use crate::{ChannelPoster, InteractionNotifier};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const FUTURES_FILENAME: &str = "futures.png";

/// Discord REST calls used by the server and the command sync tool.
/// Webhook calls authenticate with the interaction token; channel and command
/// calls need the bot token.
#[derive(Clone)]
pub struct DiscordRest {
    client: Client,
    api_base: String,
    bot_token: Option<String>,
}

/// `payload_json` for a message whose only content is one attached image.
pub fn attachment_payload(filename: &str) -> Value {
    json!({
        "content": "",
        "attachments": [{ "id": 0, "filename": filename }],
        "allowed_mentions": { "parse": [] },
    })
}

fn png_form(png: Vec<u8>, filename: &str) -> Result<Form> {
    let part = Part::bytes(png)
        .file_name(filename.to_string())
        .mime_str("image/png")?;
    Ok(Form::new()
        .text("payload_json", attachment_payload(filename).to_string())
        .part("files[0]", part))
}

async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("{} failed: {} {}", what, status, body.chars().take(300).collect::<String>())
}

impl DiscordRest {
    pub fn new(api_base: impl Into<String>, bot_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("build discord http client")?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    pub fn has_bot_token(&self) -> bool {
        self.bot_token.is_some()
    }

    fn original_url(&self, application_id: &str, token: &str) -> String {
        format!("{}/webhooks/{}/{}/messages/@original", self.api_base, application_id, token)
    }

    fn bot(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.bot_token.as_deref().context("DISCORD_TOKEN not set")?;
        Ok(req.header(reqwest::header::AUTHORIZATION, format!("Bot {token}")))
    }

    fn commands_url(&self, application_id: &str, scope: &CommandScope) -> String {
        match scope {
            CommandScope::Global => format!("{}/applications/{}/commands", self.api_base, application_id),
            CommandScope::Guild(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.api_base, application_id, guild
            ),
        }
    }

    pub async fn list_commands(&self, application_id: &str, scope: &CommandScope) -> Result<Vec<RegisteredCommand>> {
        let req = self.bot(self.client.get(self.commands_url(application_id, scope)))?;
        let resp = check(req.send().await?, "list commands").await?;
        Ok(resp.json().await?)
    }

    pub async fn delete_command(&self, application_id: &str, scope: &CommandScope, command_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.commands_url(application_id, scope), command_id);
        let req = self.bot(self.client.delete(url))?;
        check(req.send().await?, "delete command").await?;
        Ok(())
    }

    /// Bulk overwrite: the registered set becomes exactly `commands`.
    pub async fn overwrite_commands(
        &self,
        application_id: &str,
        scope: &CommandScope,
        commands: &[CommandDef],
    ) -> Result<Vec<RegisteredCommand>> {
        let req = self.bot(self.client.put(self.commands_url(application_id, scope)))?;
        let resp = check(req.json(commands).send().await?, "overwrite commands").await?;
        let registered: Vec<RegisteredCommand> = resp.json().await?;
        info!("{} {} command(s) registered", registered.len(), scope.label());
        Ok(registered)
    }
}

#[async_trait]
impl InteractionNotifier for DiscordRest {
    async fn edit_original_png(&self, application_id: &str, token: &str, png: Vec<u8>) -> Result<()> {
        let bytes = png.len();
        let resp = self
            .client
            .patch(self.original_url(application_id, token))
            .multipart(png_form(png, FUTURES_FILENAME)?)
            .send()
            .await?;
        check(resp, "edit @original").await?;
        debug!("edited @original with {} byte PNG", bytes);
        Ok(())
    }

    async fn edit_original_text(&self, application_id: &str, token: &str, content: &str) -> Result<()> {
        let resp = self
            .client
            .patch(self.original_url(application_id, token))
            .json(&json!({ "content": content, "allowed_mentions": { "parse": [] } }))
            .send()
            .await?;
        check(resp, "edit @original").await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelPoster for DiscordRest {
    async fn post_png(&self, channel_id: &str, png: Vec<u8>, filename: &str) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let req = self.bot(self.client.post(url))?;
        check(req.multipart(png_form(png, filename)?).send().await?, "channel post").await?;
        info!("posted {} to channel {}", filename, channel_id);
        Ok(())
    }
}
