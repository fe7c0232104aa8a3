use std::str::FromStr;

use anyhow::{anyhow, Result};

use super::{PlaybackController, PlaybackSnapshot};

/// Commands a user can send to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Pause,
    Resume,
    Toggle,
    Cancel,
}

impl FromStr for PlaybackCommand {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Ok(Self::Pause),
            "r" | "resume" | "continue" => Ok(Self::Resume),
            "" | "space" | "toggle" => Ok(Self::Toggle),
            "q" | "quit" | "stop" | "cancel" => Ok(Self::Cancel),
            other => Err(anyhow!("unknown command: {other}")),
        }
    }
}

/// Runs a command against the controller. Returns the resulting snapshot,
/// or `None` once the run has been cancelled.
pub async fn apply(
    controller: &PlaybackController,
    command: PlaybackCommand,
) -> Result<Option<PlaybackSnapshot>> {
    match command {
        PlaybackCommand::Pause => controller.pause().await.map(Some),
        PlaybackCommand::Resume => controller.resume().await.map(Some),
        PlaybackCommand::Toggle => controller.toggle_pause().await.map(Some),
        PlaybackCommand::Cancel => controller.cancel().await.map(|_| None),
    }
}
