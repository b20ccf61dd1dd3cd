use crate::{RoomEvent, Session};
use std::time::{Duration, Instant};

/// Thresholds for dropping idle players and retiring abandoned rooms.
#[derive(Debug, Clone)]
pub struct RoomCleanup {
    pub room_grace: Duration,       // room with nobody online
    pub player_grace: Duration,     // offline player keeps their seat
    pub inactivity_limit: Duration, // no accepted command at all
}

impl Default for RoomCleanup {
    fn default() -> Self {
        Self {
            room_grace: Duration::from_secs(300),       // 5 minutes
            player_grace: Duration::from_secs(60),      // 1 minute
            inactivity_limit: Duration::from_secs(1800), // 30 minutes
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Empty,
    Inactive,
}

impl RoomCleanup {
    pub fn new(room_grace: Duration, player_grace: Duration, inactivity_limit: Duration) -> Self {
        Self {
            room_grace,
            player_grace,
            inactivity_limit,
        }
    }

    /// Whether the room should be closed, and why.
    pub fn should_evict(&self, session: &Session, now: Instant) -> Option<EvictionReason> {
        let empty_for = session
            .empty_since()
            .map(|since| now.saturating_duration_since(since));
        if empty_for.is_some_and(|empty_for| empty_for >= self.room_grace) {
            return Some(EvictionReason::Empty);
        }

        if now.saturating_duration_since(session.last_activity()) >= self.inactivity_limit {
            return Some(EvictionReason::Inactive);
        }

        None
    }

    /// Drop players whose grace period ran out.
    pub fn prune_players(&self, session: &mut Session, now: Instant) -> Vec<RoomEvent> {
        session.prune_offline(now, self.player_grace)
    }
}
