//! jellyrelay setup wizard.
//!
//! Prompts for the Telegram bot token, the destination chats and the listen
//! port, then writes `config.toml` to the project root (`JELLYRELAY_ROOT`,
//! default: current directory).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    destinations: &'a str,
    port: u16,
}

/// Quote and escape a value as a TOML string.
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let destinations = p
        .destinations
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(toml_string)
        .collect::<Vec<_>>()
        .join(", ");

    let bot_token = toml_string(p.bot_token);
    let port = p.port;

    format!(
        r#"[server]
host = "0.0.0.0"
port = {port}

[telegram]
bot_token = {bot_token}

[relay]
# Numeric chat ids (groups/channels start with -100) or public @usernames.
destinations = [{destinations}]
# default_event_type = "New Content Added"
"#
    )
}

// ── Wizard ─────────────────────────────────────────────────────────────────────

fn run(project_root: &Path) -> Result<()> {
    println!("=== jellyrelay setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let bot_token = read_line("Telegram bot token: ")?;
    let destinations = read_line("Destination chats (comma-separated ids or @usernames): ")?;
    let port = match read_line("Listen port [3000]: ")? {
        p if p.is_empty() => 3000,
        p => p
            .parse()
            .with_context(|| format!("Not a valid port: {p}"))?,
    };

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        destinations: &destinations,
        port,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the relay with:  cargo run");
    println!("   Then point the media server webhook at http://<host>:{port}/newcontent");
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Resolve project root: prefer JELLYRELAY_ROOT env, fall back to cwd.
    let project_root =
        PathBuf::from(std::env::var("JELLYRELAY_ROOT").unwrap_or_else(|_| ".".to_string()));

    run(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
