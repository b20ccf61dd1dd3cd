use chrono::{DateTime, Utc};
use sketch_types::{
    GameEndReason, Guess, GuessOutcome, Player, PlayerId, Room, RoomId, RoomPhase, RoomSummary,
    RoundEndReason, Stroke, StrokePoint,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    RoomEvent, RoundScoring, SessionError, StrokeLog, WordBank, is_correct_guess, validate_points,
};

pub const MIN_PLAYERS_TO_START: usize = 2;
pub const DEFAULT_MAX_ROUNDS: u32 = 5;
pub const DEFAULT_TIME_PER_ROUND: u32 = 60;

/// Settings fixed when a room is created.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub host_name: String,
    pub room_name: Option<String>,
    pub max_rounds: u32,
    pub time_per_round: u32, // seconds
}

impl RoomConfig {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            room_name: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            time_per_round: DEFAULT_TIME_PER_ROUND,
        }
    }

    pub fn with_rounds(mut self, max_rounds: u32, time_per_round: u32) -> Self {
        self.max_rounds = max_rounds;
        self.time_per_round = time_per_round;
        self
    }

    pub fn with_name(mut self, room_name: impl Into<String>) -> Self {
        self.room_name = Some(room_name.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Seat {
    player: Player,
    join_seq: u64,
    offline_since: Option<Instant>,
}

/// Authoritative state of one room. Every method that changes state either
/// fails without touching anything or returns the events describing the
/// change, in order. Callers are expected to serialize access.
#[derive(Debug)]
pub struct Session {
    id: RoomId,
    name: String,
    host_id: PlayerId,
    created_at: DateTime<Utc>,
    max_rounds: u32,
    time_per_round: u32,
    phase: RoomPhase,
    round_number: u32,
    current_player_id: Option<PlayerId>,
    current_word: Option<String>,
    previous_word: Option<String>,
    round_ends_at: Option<DateTime<Utc>>,
    round_generation: u64,
    seats: Vec<Seat>, // join order
    next_join_seq: u64,
    drawer_seq: Option<u64>,
    guesses: Vec<Guess>,
    strokes: StrokeLog,
    scoring: RoundScoring,
    words: Arc<WordBank>,
    empty_since: Option<Instant>,
    last_activity: Instant,
}

impl Session {
    /// Open a room in the lobby with its host seated.
    pub fn create(
        id: RoomId,
        config: RoomConfig,
        words: Arc<WordBank>,
        now: Instant,
    ) -> Result<(Self, Player), SessionError> {
        let host_name = config.host_name.trim();
        if host_name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if config.max_rounds == 0 {
            return Err(SessionError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        if config.time_per_round == 0 {
            return Err(SessionError::InvalidConfig(
                "time_per_round must be at least 1 second".to_string(),
            ));
        }

        let name = config
            .room_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}'s room", host_name));

        let host = Player {
            id: Uuid::new_v4(),
            room_id: id,
            name: host_name.to_string(),
            score: 0,
            is_host: true,
            is_online: true,
        };

        let session = Self {
            id,
            name,
            host_id: host.id,
            created_at: Utc::now(),
            max_rounds: config.max_rounds,
            time_per_round: config.time_per_round,
            phase: RoomPhase::Lobby,
            round_number: 1,
            current_player_id: None,
            current_word: None,
            previous_word: None,
            round_ends_at: None,
            round_generation: 0,
            seats: vec![Seat {
                player: host.clone(),
                join_seq: 0,
                offline_since: None,
            }],
            next_join_seq: 1,
            drawer_seq: None,
            guesses: Vec::new(),
            strokes: StrokeLog::default(),
            scoring: RoundScoring::default(),
            words,
            empty_since: None,
            last_activity: now,
        };

        info!("Room {} created by {} ({})", id, host.name, host.id);
        Ok((session, host))
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != RoomPhase::GameEnded
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Incremented whenever a round starts or the game ends. A timer armed
    /// for an older generation is stale.
    pub fn round_generation(&self) -> u64 {
        self.round_generation
    }

    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.time_per_round))
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player_id
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// When the room last lost its final online player, if it has none now.
    pub fn empty_since(&self) -> Option<Instant> {
        self.empty_since
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.seats
            .iter()
            .find(|seat| seat.player.id == player_id)
            .map(|seat| &seat.player)
    }

    pub fn players(&self) -> Vec<Player> {
        self.seats.iter().map(|seat| seat.player.clone()).collect()
    }

    pub fn online_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.player.is_online).count()
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn strokes(&self) -> &[Stroke] {
        self.strokes.strokes()
    }

    /// Full, unredacted room state.
    pub fn room(&self) -> Room {
        Room {
            id: self.id,
            name: self.name.clone(),
            host_id: self.host_id,
            current_player_id: self.current_player_id,
            current_word: self.current_word.clone(),
            round_number: self.round_number,
            max_rounds: self.max_rounds,
            time_per_round: self.time_per_round,
            is_active: self.is_active(),
            phase: self.phase,
            players: self.players(),
            round_ends_at: self.round_ends_at.map(|at| at.to_rfc3339()),
            created_at: self.created_at.to_rfc3339(),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        self.room().summary()
    }

    pub fn join(&mut self, name: &str, now: Instant) -> Result<(Player, Vec<RoomEvent>), SessionError> {
        if self.phase == RoomPhase::GameEnded {
            return Err(SessionError::RoomInactive);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let player = Player {
            id: Uuid::new_v4(),
            room_id: self.id,
            name: name.to_string(),
            score: 0,
            is_host: false,
            is_online: true,
        };
        self.seats.push(Seat {
            player: player.clone(),
            join_seq: self.next_join_seq,
            offline_since: None,
        });
        self.next_join_seq += 1;
        self.touch(now);

        info!("Player {} ({}) joined room {}", player.name, player.id, self.id);
        Ok((player.clone(), vec![RoomEvent::PlayerJoined { player }]))
    }

    /// Reattach a known player, typically after a dropped connection.
    pub fn rejoin(
        &mut self,
        player_id: PlayerId,
        now: Instant,
    ) -> Result<(Player, Vec<RoomEvent>), SessionError> {
        let seat = self.seat_mut(player_id)?;
        let was_offline = !seat.player.is_online;
        seat.player.is_online = true;
        seat.offline_since = None;
        let player = seat.player.clone();
        self.touch(now);

        if !was_offline {
            return Ok((player, Vec::new()));
        }
        info!("Player {} is back in room {}", player_id, self.id);
        Ok((player.clone(), vec![RoomEvent::PlayerJoined { player }]))
    }

    /// Mark a player offline. The seat is kept so the player can rejoin.
    pub fn leave(&mut self, player_id: PlayerId, now: Instant) -> Result<Vec<RoomEvent>, SessionError> {
        let seat = self.seat_mut(player_id)?;
        if !seat.player.is_online {
            return Ok(Vec::new());
        }
        seat.player.is_online = false;
        seat.offline_since = Some(now);
        let player = seat.player.clone();
        self.touch(now);

        info!("Player {} went offline in room {}", player_id, self.id);
        Ok(vec![RoomEvent::PlayerLeft {
            player,
            removed: false,
        }])
    }

    /// Drop players who have been offline for at least `grace`. The host's
    /// seat and the seat of an active drawer are kept.
    pub fn prune_offline(&mut self, now: Instant, grace: Duration) -> Vec<RoomEvent> {
        let drawing = match self.phase {
            RoomPhase::RoundActive => self.current_player_id,
            _ => None,
        };
        let host_id = self.host_id;

        let (removed, kept): (Vec<Seat>, Vec<Seat>) =
            std::mem::take(&mut self.seats).into_iter().partition(|seat| {
                seat.offline_since
                    .is_some_and(|since| now.saturating_duration_since(since) >= grace)
                    && seat.player.id != host_id
                    && Some(seat.player.id) != drawing
            });
        self.seats = kept;

        removed
            .into_iter()
            .map(|seat| {
                info!("Dropped offline player {} from room {}", seat.player.id, self.id);
                RoomEvent::PlayerLeft {
                    player: seat.player,
                    removed: true,
                }
            })
            .collect()
    }

    /// Lobby -> RoundActive. Host only, needs enough online players. The host
    /// draws first.
    pub fn start_game(&mut self, player_id: PlayerId, now: Instant) -> Result<Vec<RoomEvent>, SessionError> {
        let host_seq = self.seat(self.host_id)?.join_seq;
        self.seat(player_id)?;
        match self.phase {
            RoomPhase::Lobby => {}
            RoomPhase::GameEnded => return Err(SessionError::RoomInactive),
            _ => return Err(SessionError::AlreadyStarted),
        }
        if player_id != self.host_id {
            return Err(SessionError::NotHost);
        }
        if self.online_count() < MIN_PLAYERS_TO_START {
            return Err(SessionError::NotEnoughPlayers {
                required: MIN_PLAYERS_TO_START,
            });
        }

        self.begin_round(host_seq)?;
        self.touch(now);
        info!("Game started in room {} with {} players", self.id, self.online_count());
        Ok(vec![RoomEvent::RoomUpdated { room: self.room() }])
    }

    /// Record a guess. A correct one pays out at most once per player per
    /// round and ends the round immediately.
    pub fn submit_guess(
        &mut self,
        player_id: PlayerId,
        text: &str,
        now: Instant,
    ) -> Result<(GuessOutcome, Vec<RoomEvent>), SessionError> {
        let player_name = self.seat(player_id)?.player.name.clone();
        if self.phase != RoomPhase::RoundActive {
            return Err(SessionError::RoomNotActive);
        }
        if self.current_player_id == Some(player_id) {
            return Err(SessionError::IsDrawer);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyGuess);
        }
        let Some(word) = self.current_word.as_deref() else {
            return Err(SessionError::RoomNotActive);
        };

        let is_correct = is_correct_guess(text, word);
        let points_awarded = if is_correct {
            self.scoring.award_once(player_id)
        } else {
            0
        };
        if points_awarded > 0 {
            self.seat_mut(player_id)?.player.score += points_awarded;
        }

        let guess = Guess {
            id: Uuid::new_v4(),
            room_id: self.id,
            player_id,
            player_name,
            text: text.to_string(),
            is_correct,
            round_number: self.round_number,
            created_at: Utc::now().to_rfc3339(),
        };
        self.guesses.push(guess.clone());
        self.touch(now);

        let mut events = vec![RoomEvent::GuessSubmitted { guess }];
        if is_correct {
            events.extend(self.end_round(RoundEndReason::Guessed, Some(player_id)));
        }

        let outcome = GuessOutcome {
            accepted: true,
            is_correct,
            points_awarded,
        };
        Ok((outcome, events))
    }

    pub fn submit_stroke(
        &mut self,
        player_id: PlayerId,
        points: Vec<StrokePoint>,
        now: Instant,
    ) -> Result<Vec<RoomEvent>, SessionError> {
        self.ensure_drawing(player_id)?;
        validate_points(&points)?;
        self.strokes.check_capacity(points.len())?;

        let stroke = self.strokes.append(self.id, player_id, points);
        self.touch(now);
        Ok(vec![RoomEvent::StrokeAppended { stroke }])
    }

    /// Drawer wipes the canvas mid-round.
    pub fn clear_canvas(&mut self, player_id: PlayerId, now: Instant) -> Result<Vec<RoomEvent>, SessionError> {
        self.ensure_drawing(player_id)?;

        self.strokes.clear();
        self.touch(now);
        Ok(vec![RoomEvent::StrokesCleared {
            round_number: self.round_number,
        }])
    }

    /// Timer expiry for the round identified by `generation`. Fails with
    /// `StaleRound` when that round is already over.
    pub fn round_timeout(&mut self, generation: u64) -> Result<Vec<RoomEvent>, SessionError> {
        if self.phase != RoomPhase::RoundActive || generation != self.round_generation {
            return Err(SessionError::StaleRound { generation });
        }
        Ok(self.end_round(RoundEndReason::TimedOut, None))
    }

    /// Host stops the game from any non-terminal phase.
    pub fn end_game(&mut self, player_id: PlayerId, now: Instant) -> Result<Vec<RoomEvent>, SessionError> {
        self.seat(player_id)?;
        if self.phase == RoomPhase::GameEnded {
            return Err(SessionError::RoomInactive);
        }
        if player_id != self.host_id {
            return Err(SessionError::NotHost);
        }
        self.touch(now);
        Ok(self.finish_game(GameEndReason::HostEnded))
    }

    fn ensure_drawing(&self, player_id: PlayerId) -> Result<(), SessionError> {
        self.seat(player_id)?;
        if self.phase != RoomPhase::RoundActive {
            return Err(SessionError::RoomNotActive);
        }
        if self.current_player_id != Some(player_id) {
            return Err(SessionError::NotDrawer);
        }
        Ok(())
    }

    fn begin_round(&mut self, drawer_seq: u64) -> Result<(), SessionError> {
        let drawer = self
            .seats
            .iter()
            .find(|seat| seat.join_seq == drawer_seq)
            .map(|seat| seat.player.id)
            .ok_or(SessionError::NotEnoughPlayers {
                required: MIN_PLAYERS_TO_START,
            })?;
        let word = self
            .words
            .pick(self.previous_word.as_deref(), &mut rand::rng())
            .ok_or(SessionError::NoWords)?;

        self.round_generation += 1;
        self.scoring.reset();
        self.phase = RoomPhase::RoundActive;
        self.drawer_seq = Some(drawer_seq);
        self.current_player_id = Some(drawer);
        self.current_word = Some(word);
        self.round_ends_at =
            Some(Utc::now() + chrono::Duration::seconds(i64::from(self.time_per_round)));

        debug!(
            "Room {} round {}/{} (generation {}) drawn by {}",
            self.id, self.round_number, self.max_rounds, self.round_generation, drawer
        );
        Ok(())
    }

    /// RoundActive -> RoundEnding -> RoundActive | GameEnded, all in one step.
    fn end_round(&mut self, reason: RoundEndReason, solver_id: Option<PlayerId>) -> Vec<RoomEvent> {
        self.phase = RoomPhase::RoundEnding;
        let word = self.current_word.take().unwrap_or_default();
        self.previous_word = Some(word.clone());
        self.round_ends_at = None;

        info!(
            "Room {} round {} ended ({:?}), word was '{}'",
            self.id, self.round_number, reason, word
        );
        let mut events = vec![RoomEvent::RoundEnded {
            round_number: self.round_number,
            word,
            reason,
            solver_id,
        }];

        if self.round_number >= self.max_rounds {
            events.extend(self.finish_game(GameEndReason::RoundsCompleted));
            return events;
        }

        let Some(next_seq) = self.next_drawer_seq() else {
            events.extend(self.finish_game(GameEndReason::RoundsCompleted));
            return events;
        };

        self.strokes.clear();
        self.round_number += 1;
        events.push(RoomEvent::StrokesCleared {
            round_number: self.round_number,
        });

        match self.begin_round(next_seq) {
            Ok(()) => events.push(RoomEvent::RoomUpdated { room: self.room() }),
            Err(e) => {
                warn!("Room {} could not start the next round: {}", self.id, e);
                events.extend(self.finish_game(GameEndReason::RoundsCompleted));
            }
        }
        events
    }

    fn finish_game(&mut self, reason: GameEndReason) -> Vec<RoomEvent> {
        self.phase = RoomPhase::GameEnded;
        self.current_word = None;
        self.current_player_id = None;
        self.round_ends_at = None;
        self.round_generation += 1;

        let mut final_scores = self.players();
        final_scores.sort_by(|a, b| b.score.cmp(&a.score));

        info!(
            "Game in room {} ended ({:?}) | Final standings: {:?}",
            self.id,
            reason,
            final_scores
                .iter()
                .map(|p| format!("{}: {}", p.name, p.score))
                .collect::<Vec<_>>()
        );
        vec![
            RoomEvent::RoomUpdated { room: self.room() },
            RoomEvent::GameEnded {
                reason,
                final_scores,
            },
        ]
    }

    /// Next seat after the last drawer in join order, wrapping around.
    /// Online players are preferred; if nobody is online every seat counts.
    fn next_drawer_seq(&self) -> Option<u64> {
        for online_only in [true, false] {
            let seqs: Vec<u64> = self
                .seats
                .iter()
                .filter(|seat| !online_only || seat.player.is_online)
                .map(|seat| seat.join_seq)
                .collect();
            if seqs.is_empty() {
                continue;
            }
            let next = match self.drawer_seq {
                Some(last) => seqs.iter().find(|&&seq| seq > last).or(seqs.first()),
                None => seqs.first(),
            };
            return next.copied();
        }
        None
    }

    fn touch(&mut self, now: Instant) {
        self.last_activity = now;
        if self.online_count() == 0 {
            self.empty_since.get_or_insert(now);
        } else {
            self.empty_since = None;
        }
    }

    fn seat(&self, player_id: PlayerId) -> Result<&Seat, SessionError> {
        self.seats
            .iter()
            .find(|seat| seat.player.id == player_id)
            .ok_or(SessionError::PlayerNotFound(player_id))
    }

    fn seat_mut(&mut self, player_id: PlayerId) -> Result<&mut Seat, SessionError> {
        self.seats
            .iter_mut()
            .find(|seat| seat.player.id == player_id)
            .ok_or(SessionError::PlayerNotFound(player_id))
    }
}
