//! Leaderboard and ranking functionality
//!
//! This module keeps each user's best finished-game score and ranks users
//! by it. Standings are cached in descending order so that the landing
//! page query never sorts, and every improvement is written through to
//! the [`Store`].

use std::{collections::HashMap, sync::Arc};

use itertools::Itertools;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    TruncatedVec,
    contact::{Owner, UserId},
    game::Score,
    store::Store,
};

/// A user's row on the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// The ranked user
    pub user: UserId,
    /// Display name at the time of the best score
    pub name: String,
    /// Best points across all finished games
    pub best: u64,
}

/// Cached ranking state rebuilt after every improvement
#[derive(Debug, Default)]
struct Standings {
    /// Best row per user
    rows: HashMap<UserId, LeaderboardEntry>,
    /// Rows ordered best-first, ties by user id
    descending: Vec<LeaderboardEntry>,
    /// Zero-based position of each user in `descending`
    positions: HashMap<UserId, usize>,
}

impl Standings {
    /// Recomputes the ordered view from `rows`
    fn rank(&mut self) {
        self.descending = self
            .rows
            .values()
            .sorted_by(|a, b| b.best.cmp(&a.best).then_with(|| a.user.cmp(&b.user)))
            .cloned()
            .collect_vec();

        self.positions = self
            .descending
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.user.clone(), position))
            .collect();
    }
}

impl From<Vec<LeaderboardEntry>> for Standings {
    /// Rebuilds standings from stored rows
    ///
    /// When a store returns several rows for one user, the best one wins.
    fn from(entries: Vec<LeaderboardEntry>) -> Self {
        let rows = entries
            .into_iter()
            .into_grouping_map_by(|entry| entry.user.clone())
            .max_by_key(|_, entry| entry.best);

        let mut standings = Self {
            rows,
            ..Self::default()
        };
        standings.rank();
        standings
    }
}

/// Ranks users by their best finished-game score
///
/// Readers share the standings concurrently; recording a score takes the
/// write lock for the duration of the update.
pub struct Leaderboard<S> {
    /// Where improved rows are persisted
    store: Arc<S>,
    /// Current ranking
    standings: RwLock<Standings>,
}

impl<S: Store> Leaderboard<S> {
    /// Creates a leaderboard seeded from the rows already in `store`
    pub fn new(store: Arc<S>) -> Self {
        let standings = Standings::from(store.scores());
        Self {
            store,
            standings: RwLock::new(standings),
        }
    }

    /// Records the final score of a finished game
    ///
    /// Only a strictly higher score replaces a user's existing row, so a
    /// user's best never goes down and ties keep the earlier row.
    ///
    /// # Arguments
    ///
    /// * `owner` - The user who played the game
    /// * `score` - The game's final score
    ///
    /// # Returns
    ///
    /// `true` if the user's row was created or improved
    pub fn record(&self, owner: &Owner, score: Score) -> bool {
        let mut standings = self.standings.write();

        if standings
            .rows
            .get(&owner.id)
            .is_some_and(|entry| entry.best >= score.points)
        {
            return false;
        }

        let entry = LeaderboardEntry {
            user: owner.id.clone(),
            name: owner.name.clone(),
            best: score.points,
        };
        self.store.upsert_score(&entry);
        standings.rows.insert(owner.id.clone(), entry);
        standings.rank();

        log::info!("new best for {}: {}", owner.id, score.points);
        true
    }

    /// Returns the best `n` rows, best first
    ///
    /// Equal scores are ordered by user id so the result is stable.
    ///
    /// # Returns
    ///
    /// A TruncatedVec of at most `n` rows whose exact count is the number
    /// of ranked users
    pub fn top(&self, n: usize) -> TruncatedVec<LeaderboardEntry> {
        let standings = self.standings.read();
        TruncatedVec::new(
            standings.descending.iter().cloned(),
            n,
            standings.descending.len(),
        )
    }

    /// Zero-based rank of a user, if they have a row
    pub fn position(&self, user: &UserId) -> Option<usize> {
        self.standings.read().positions.get(user).copied()
    }

    /// Best score of a user, if they have a row
    pub fn best(&self, user: &UserId) -> Option<u64> {
        self.standings.read().rows.get(user).map(|entry| entry.best)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{game::Outcome, store::MemoryStore};

    fn score(points: u64) -> Score {
        Score {
            points,
            eliminated: 0,
            misses: 0,
            slips: 0,
            outcome: Some(Outcome::Won),
        }
    }

    fn leaderboard() -> Leaderboard<MemoryStore> {
        Leaderboard::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_record_keeps_best() {
        let board = leaderboard();
        let owner = Owner::new("u1", "One");

        assert!(board.record(&owner, score(50)));
        assert!(!board.record(&owner, score(20)));
        assert!(!board.record(&owner, score(50)));
        assert_eq!(board.best(&owner.id), Some(50));

        assert!(!board.record(&Owner::new("u1", "Renamed Early"), score(50)));
        assert_eq!(board.top(1).items()[0].name, "One");

        assert!(board.record(&Owner::new("u1", "Renamed"), score(90)));
        assert_eq!(board.best(&owner.id), Some(90));
        assert_eq!(board.top(1).items()[0].name, "Renamed");
        assert_eq!(board.top(10).exact_count(), 1);
    }

    #[test]
    fn test_top_sorted_and_truncated() {
        let board = leaderboard();
        for (id, points) in [("a", 10), ("b", 70), ("c", 40), ("d", 90)] {
            board.record(&Owner::new(id, id.to_uppercase()), score(points));
        }

        let top = board.top(3);
        let bests = top.items().iter().map(|e| e.best).collect_vec();

        assert_eq!(bests, vec![90, 70, 40]);
        assert_eq!(top.exact_count(), 4);
        assert!(board.top(0).items().is_empty());
        assert_eq!(board.top(10).items().len(), 4);
    }

    #[test]
    fn test_top_ties_ordered_by_user() {
        let board = leaderboard();
        board.record(&Owner::new("zed", "Zed"), score(30));
        board.record(&Owner::new("amy", "Amy"), score(30));
        board.record(&Owner::new("max", "Max"), score(30));

        let users = board
            .top(10)
            .items()
            .iter()
            .map(|e| e.user.to_string())
            .collect_vec();

        assert_eq!(users, vec!["amy", "max", "zed"]);
    }

    #[test]
    fn test_position() {
        let board = leaderboard();
        board.record(&Owner::new("a", "A"), score(10));
        board.record(&Owner::new("b", "B"), score(20));

        assert_eq!(board.position(&UserId::from("b")), Some(0));
        assert_eq!(board.position(&UserId::from("a")), Some(1));
        assert_eq!(board.position(&UserId::from("c")), None);
    }

    #[test]
    fn test_leaderboard_reloads_from_store() {
        let store = Arc::new(MemoryStore::default());
        {
            let board = Leaderboard::new(store.clone());
            board.record(&Owner::new("a", "A"), score(10));
            board.record(&Owner::new("b", "B"), score(20));
        }

        let board = Leaderboard::new(store);
        let top = board.top(10);

        assert_eq!(top.exact_count(), 2);
        assert_eq!(top.items()[0].user, UserId::from("b"));
    }

    #[test]
    fn test_standings_from_duplicate_rows() {
        let row = |best| LeaderboardEntry {
            user: UserId::from("a"),
            name: "A".to_owned(),
            best,
        };
        let standings = Standings::from(vec![row(10), row(30), row(20)]);

        assert_eq!(standings.descending, vec![row(30)]);
    }
}
