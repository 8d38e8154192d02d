//! # Friend Guess Game Library
//!
//! This library provides the game-session engine for a guess-the-friend
//! elimination game. A player is dealt a board of their own contacts, one
//! of whom is secretly the target, and eliminates or guesses candidates
//! until they find the target or run out of options. It handles board
//! construction, the per-game state machine, hints, scoring, resumption
//! by token, and the cross-user leaderboard.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use itertools::Itertools;
use serde::Serialize;

pub mod constants;

pub mod contact;
pub mod game;
pub mod hint;
pub mod leaderboard;
pub mod pool;
pub mod registry;
pub mod store;
pub mod token;

/// Replies sent back to the calling layer
///
/// Each variant is the JSON body of one engine operation, so the HTTP
/// layer can forward it without knowing the engine's types.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum Reply {
    /// Outcome of an elimination or guess
    Verdict(game::Verdict),
    /// Next hint about the target
    Hint(hint::HintReply),
    /// The target's id at the end of a game
    Reveal(contact::CandidateId),
    /// Top of the leaderboard
    Leaderboard(TruncatedVec<leaderboard::LeaderboardEntry>),
}

impl Reply {
    /// Converts the reply to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// A truncated vector that maintains the exact count while limiting displayed items
///
/// This structure is useful for displaying a limited number of items while
/// still showing the total count. For example, showing "120 players" but only
/// listing the top 10.
#[derive(Debug, Clone, Serialize)]
pub struct TruncatedVec<T> {
    /// The exact total count of items
    exact_count: usize,
    /// The truncated list of items (up to the limit)
    items: Vec<T>,
}

impl<T: Clone> TruncatedVec<T> {
    /// Creates a new truncated vector from an iterator
    ///
    /// # Arguments
    ///
    /// * `list` - An iterator over items to include
    /// * `limit` - Maximum number of items to include in the truncated vector
    /// * `exact_count` - The exact total count of items (may be larger than limit)
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the truncated items
    pub fn items(&self) -> &[T] {
        &self.items
    }
}
