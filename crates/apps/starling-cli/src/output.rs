//! Rendering: every command produces one output struct, rendered either as
//! a colored human summary or as JSON for scripts.

use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub trait Render: Serialize {
    fn render_human(&self) -> String;

    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
pub struct InitOutput {
    pub peer_id: String,
    pub identity_path: String,
}

impl Render for InitOutput {
    fn render_human(&self) -> String {
        format!(
            "{} identity ready\n  peer id: {}\n  keyfile: {}",
            "✓".green(),
            self.peer_id,
            self.identity_path
        )
    }
}

#[derive(Serialize)]
pub struct WhoamiOutput {
    pub peer_id: String,
    #[serde(rename = "routingAddress")]
    pub routing_address: String,
}

impl Render for WhoamiOutput {
    fn render_human(&self) -> String {
        format!("peer id:         {}\nrouting address: {}", self.peer_id.bold(), self.routing_address)
    }
}

#[derive(Serialize)]
pub struct PeerRow {
    #[serde(rename = "peerId")]
    pub peer_id: String,
    #[serde(rename = "routingAddress")]
    pub routing_address: String,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    pub priority: u32,
}

#[derive(Serialize)]
pub struct PeersOutput(pub Vec<PeerRow>);

impl Render for PeersOutput {
    fn render_human(&self) -> String {
        if self.0.is_empty() {
            return "no peers known".dimmed().to_string();
        }
        let mut lines = vec![format!("{:<18} {:<24} {:<10} priority", "peer", "routing address", "channel")];
        for row in &self.0 {
            lines.push(format!(
                "{:<18} {:<24} {:<10} {}",
                truncate(&row.peer_id, 16),
                row.routing_address,
                row.channel_id.as_deref().unwrap_or("-"),
                row.priority
            ));
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
pub struct ChannelsOutput(pub Vec<PeerRow>);

impl Render for ChannelsOutput {
    fn render_human(&self) -> String {
        let with_channel: Vec<&PeerRow> = self.0.iter().filter(|row| row.channel_id.is_some()).collect();
        if with_channel.is_empty() {
            return "no open channels".dimmed().to_string();
        }
        let mut lines = vec![format!("{:<18} {:<24} channel", "peer", "routing address")];
        for row in with_channel {
            lines.push(format!(
                "{:<18} {:<24} {}",
                truncate(&row.peer_id, 16),
                row.routing_address,
                row.channel_id.as_deref().unwrap_or("-")
            ));
        }
        lines.join("\n")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max])
    }
}
