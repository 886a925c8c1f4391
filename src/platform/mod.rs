pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// A downloaded image, ready to be attached to a message.
#[derive(Debug, Clone)]
pub struct Media {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the server, if any. Not validated.
    pub content_type: Option<String>,
}

impl Media {
    /// File name to present to the platform, derived from the content type.
    pub fn file_name(&self) -> &'static str {
        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/png") => "poster.png",
            Some(ct) if ct.starts_with("image/webp") => "poster.webp",
            Some(ct) if ct.starts_with("image/gif") => "poster.gif",
            _ => "poster.jpg",
        }
    }
}

/// What gets delivered to a destination.
#[derive(Debug, Clone)]
pub enum OutgoingMessage {
    Text(String),
    Media { media: Media, caption: String },
}

/// The messaging platform, as seen by the relay.
///
/// Session setup and transport belong to the implementation; the relay only
/// downloads media and sends messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Download an image so it can be attached to a message. Any content type
    /// is accepted.
    async fn fetch_media(&self, url: &str) -> Result<Media>;

    /// Deliver a message to one destination.
    async fn send(&self, destination: &str, message: &OutgoingMessage) -> Result<()>;
}
