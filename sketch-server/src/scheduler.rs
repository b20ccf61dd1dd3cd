use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::room::RoomCommand;

/// One countdown per room. Arming replaces any previous countdown, and the
/// expiry is tagged with the round generation it was armed for so the
/// session can reject a late firing.
#[derive(Debug, Default)]
pub struct RoundScheduler {
    armed: Option<(u64, JoinHandle<()>)>,
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_generation(&self) -> Option<u64> {
        self.armed.as_ref().map(|(generation, _)| *generation)
    }

    /// Start the countdown for `generation`. The task holds only a weak
    /// sender so a pending timer never keeps a room alive.
    pub fn arm(
        &mut self,
        generation: u64,
        duration: Duration,
        commands: mpsc::WeakSender<RoomCommand>,
    ) {
        self.cancel();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(RoomCommand::RoundTimeout { generation }).await;
            }
        });
        debug!("Round timer armed for generation {} ({:?})", generation, duration);
        self.armed = Some((generation, handle));
    }

    pub fn cancel(&mut self) {
        if let Some((generation, handle)) = self.armed.take() {
            handle.abort();
            debug!("Round timer for generation {} cancelled", generation);
        }
    }
}

impl Drop for RoundScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
