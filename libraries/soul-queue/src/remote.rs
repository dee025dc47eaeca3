//! Remote (platform media session) commands
//!
//! Hardware media keys, lock-screen controls and similar surfaces send one of
//! a handful of commands; each maps onto the engine's public operations.

use crate::backend::PlaybackBackend;
use crate::engine::QueueEngine;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Command from a platform media session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteCommand {
    NextTrack,
    PreviousTrack,
    Play,
    Pause,
    /// Pause and rewind the current track
    Stop,
}

impl<B: PlaybackBackend> QueueEngine<B> {
    /// Apply a remote command
    pub async fn handle_remote_command(&mut self, command: RemoteCommand) -> Result<()> {
        tracing::debug!("Remote command: {:?}", command);

        match command {
            RemoteCommand::NextTrack => self.skip_to_next().await,
            RemoteCommand::PreviousTrack => self.skip_to_previous().await,
            RemoteCommand::Play => self.toggle_playing(Some(true)).await,
            RemoteCommand::Pause => self.toggle_playing(Some(false)).await,
            RemoteCommand::Stop => {
                self.toggle_playing(Some(false)).await?;
                self.restart_current();
                Ok(())
            }
        }
    }
}
