//! Persistence of games and leaderboard rows
//!
//! This module defines the trait the engine uses to keep games and best
//! scores beyond a single request. Durable backends live outside the
//! crate; [`MemoryStore`] is a process-local implementation that still
//! round-trips every game through its serialized form.

use dashmap::DashMap;

use crate::{contact::UserId, game::Game, leaderboard::LeaderboardEntry, token::Token};

/// Trait for saving and loading engine state
///
/// Implementations are shared between concurrent requests, so every
/// method takes `&self`. The engine treats the store as reliable once
/// invoked; implementations should log and swallow their own failures.
pub trait Store: Send + Sync {
    /// Loads the game bound to `token`, if any
    fn load(&self, token: &Token) -> Option<Game>;

    /// Saves a game under its own token, replacing any previous version
    fn save(&self, game: &Game);

    /// Forgets the game bound to `token`
    fn discard(&self, token: &Token);

    /// Inserts or replaces a user's leaderboard row
    fn upsert_score(&self, entry: &LeaderboardEntry);

    /// Returns every stored leaderboard row, in no particular order
    fn scores(&self) -> Vec<LeaderboardEntry>;
}

/// In-memory store keeping games as JSON documents
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Serialized games keyed by token
    games: DashMap<Token, String>,
    /// Leaderboard rows keyed by user
    scores: DashMap<UserId, LeaderboardEntry>,
}

impl MemoryStore {
    /// Number of games currently stored
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no game is stored
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl Store for MemoryStore {
    fn load(&self, token: &Token) -> Option<Game> {
        let document = self.games.get(token)?;
        serde_json::from_str(document.value())
            .inspect_err(|e| log::warn!("dropping undecodable game {token}: {e}"))
            .ok()
    }

    fn save(&self, game: &Game) {
        match serde_json::to_string(game) {
            Ok(document) => {
                self.games.insert(game.token(), document);
            }
            Err(e) => log::error!("failed to encode game {}: {e}", game.token()),
        }
    }

    fn discard(&self, token: &Token) {
        self.games.remove(token);
    }

    fn upsert_score(&self, entry: &LeaderboardEntry) {
        self.scores.insert(entry.user.clone(), entry.clone());
    }

    fn scores(&self) -> Vec<LeaderboardEntry> {
        self.scores.iter().map(|row| row.value().clone()).collect()
    }
}
