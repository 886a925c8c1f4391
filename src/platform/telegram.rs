use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Recipient};
use tracing::{debug, info};

use crate::error::RelayError;
use crate::platform::{Media, Messenger, OutgoingMessage};

/// Telegram's limit for plain text messages
const MAX_TEXT_LEN: usize = 4096;
/// Telegram's limit for photo captions
const MAX_CAPTION_LEN: usize = 1024;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Photo captions are limited to 1024 UTF-16 code units; emoji count twice.
fn fits_photo_caption(caption: &str) -> bool {
    caption.encode_utf16().count() <= MAX_CAPTION_LEN
}

/// Startup listing line for one destination.
pub fn describe_destination(title: Option<&str>, destination: &str) -> String {
    format!("- {} | ID: {}", title.unwrap_or("Unnamed"), destination)
}

/// Parse a configured destination: a numeric chat id or a public `@username`.
pub fn parse_destination(destination: &str) -> Result<Recipient, RelayError> {
    let destination = destination.trim();
    if let Some(username) = destination.strip_prefix('@') {
        if !username.is_empty() && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Ok(Recipient::ChannelUsername(destination.to_string()));
        }
    } else if let Ok(id) = destination.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    Err(RelayError::InvalidDestination(destination.to_string()))
}

/// [`Messenger`] backed by the Telegram Bot API.
pub struct TelegramMessenger {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramMessenger {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
            http: reqwest::Client::new(),
        }
    }

    /// Check the token against the Bot API and return the bot's username.
    pub async fn handshake(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .context("Telegram getMe failed")?;
        Ok(me.username().to_string())
    }

    /// Resolve a destination's display name: the chat title, or its @username.
    pub async fn chat_title(&self, destination: &str) -> Result<Option<String>> {
        let recipient = parse_destination(destination)?;
        let chat = self
            .bot
            .get_chat(recipient)
            .await
            .with_context(|| format!("getChat failed for {}", destination))?;
        Ok(chat
            .title()
            .map(str::to_string)
            .or_else(|| chat.username().map(|u| format!("@{u}"))))
    }

    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_TEXT_LEN) {
            self.bot
                .send_message(recipient.clone(), chunk)
                .await
                .context("sendMessage failed")?;
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn fetch_media(&self, url: &str) -> Result<Media> {
        debug!("Fetching poster: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Poster request returned {}", status);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .context("Failed to read poster body")?;
        if bytes.is_empty() {
            anyhow::bail!("Poster body is empty");
        }

        Ok(Media {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn send(&self, destination: &str, message: &OutgoingMessage) -> Result<()> {
        let recipient = parse_destination(destination)?;

        match message {
            OutgoingMessage::Text(text) => self.send_text(&recipient, text).await,
            OutgoingMessage::Media { media, caption } => {
                let photo = InputFile::memory(media.bytes.clone()).file_name(media.file_name());
                if fits_photo_caption(caption) {
                    self.bot
                        .send_photo(recipient, photo)
                        .caption(caption.clone())
                        .await
                        .context("sendPhoto failed")?;
                } else {
                    info!("Caption too long for a photo, sending it separately");
                    self.bot
                        .send_photo(recipient.clone(), photo)
                        .await
                        .context("sendPhoto failed")?;
                    self.send_text(&recipient, caption).await?;
                }
                Ok(())
            }
        }
    }
}
