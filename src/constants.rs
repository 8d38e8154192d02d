//! Configuration constants for the guessing game engine
//!
//! This module contains the limits, defaults, and scoring weights used
//! throughout the engine, grouped by the component that consumes them.

/// Game board configuration constants
pub mod game {
    /// Default number of cards (pool slots) shown to the player
    pub const CARDS: usize = 12;
    /// Minimum number of cards a game may be configured with
    pub const MIN_CARDS: usize = 2;
    /// Maximum number of cards a game may be configured with
    pub const MAX_CARDS: usize = 64;
}

/// Contact validation constants
pub mod contact {
    /// Maximum length of a directory id in bytes
    pub const MAX_ID_LENGTH: usize = 64;
    /// Maximum length of a contact display name in bytes
    pub const MAX_NAME_LENGTH: usize = 100;
}

/// Scoring weights
pub mod scoring {
    /// Points awarded for guessing the target
    pub const WIN_POINTS: u64 = 100;
    /// Points awarded for each correct elimination
    pub const ELIMINATION_POINTS: u64 = 10;
    /// Points deducted for each wrong guess
    pub const MISS_PENALTY: u64 = 25;
    /// Points deducted for each attempt to eliminate the target
    pub const SLIP_PENALTY: u64 = 25;
}

/// Leaderboard constants
pub mod leaderboard {
    /// Number of rows shown on the landing page
    pub const TOP_LIMIT: usize = 10;
}
