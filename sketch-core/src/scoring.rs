use sketch_types::PlayerId;
use std::collections::HashSet;

/// Points for the first correct guess a player makes in a round.
pub const CORRECT_GUESS_POINTS: u32 = 10;

/// Comparison form of a guess or word: trimmed and lowercased.
pub fn normalize_guess(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn is_correct_guess(text: &str, word: &str) -> bool {
    normalize_guess(text) == normalize_guess(word)
}

/// Tracks who has already been paid in the current round so a player is
/// credited at most once, however many correct guesses reach the queue.
#[derive(Debug, Default, Clone)]
pub struct RoundScoring {
    awarded: HashSet<PlayerId>,
}

impl RoundScoring {
    /// Forget all awards at the start of a round.
    pub fn reset(&mut self) {
        self.awarded.clear();
    }

    /// Points owed for a correct guess: the bonus the first time, zero after.
    pub fn award_once(&mut self, player_id: PlayerId) -> u32 {
        if self.awarded.insert(player_id) {
            CORRECT_GUESS_POINTS
        } else {
            0
        }
    }
}
