//! Background tasks for the application.
//!
//! Call `spawn_all` once during startup. Flip the shutdown flag to `true` and
//! await the returned handle to stop them.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::services::OverlayPlayer;

/// Spawn the overlay player loop.
pub fn spawn_all(player: OverlayPlayer, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move { player.run(shutdown).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::SimulatedSynthesizer;
    use crate::services::{PlaybackTimings, QueueStore};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_spawned_player_stops_on_shutdown() {
        let player = OverlayPlayer::new(
            QueueStore::in_memory("donations"),
            Arc::new(SimulatedSynthesizer::new(10.0)),
            PlaybackTimings::default(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_all(player, shutdown_rx);

        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
