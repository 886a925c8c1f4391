use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::event::DEFAULT_EVENT_TYPE;
use crate::platform::telegram::parse_destination;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    /// Chat ids or `@usernames`, messaged in this order.
    #[serde(default)]
    pub destinations: Vec<String>,
    /// Used when a payload carries no `EventType`.
    #[serde(default = "default_event_type")]
    pub default_event_type: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_event_type() -> String {
    DEFAULT_EVENT_TYPE.to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

impl Config {
    /// Address the webhook listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&content)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Override file values with `JELLYRELAY_*` variables, if set.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = var("JELLYRELAY_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(list) = var("JELLYRELAY_DESTINATIONS") {
            self.relay.destinations = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(port) = var("JELLYRELAY_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("JELLYRELAY_PORT is not a valid port: {}", port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token is empty");
        }
        if self.relay.destinations.is_empty() {
            anyhow::bail!("relay.destinations must list at least one chat");
        }
        for destination in &self.relay.destinations {
            parse_destination(destination)?;
        }
        Ok(())
    }
}
