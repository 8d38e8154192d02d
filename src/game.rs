//! Core game logic and state management
//!
//! This module contains the game session entity: the secret target, the
//! board of candidates, the elimination and guess history, the hint
//! cursor, and the scoring derived from them. All state transitions go
//! through the methods on [`Game`], which reject anything once the game
//! has reached a terminal outcome.

use std::{collections::HashSet, fmt::Display};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::{
        game::{CARDS, MAX_CARDS, MIN_CARDS},
        scoring::{ELIMINATION_POINTS, MISS_PENALTY, SLIP_PENALTY, WIN_POINTS},
    },
    contact::{CandidateId, Contact, Owner},
    hint::{self, Hint, HintReply},
    pool::Pool,
    token::Token,
};

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The target was guessed
    Won,
    /// Attempts ran out before the target was guessed
    Lost,
}

/// Lifecycle phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// Moves and hints are accepted
    Active,
    /// Terminal; every further move is rejected
    Finished(Outcome),
}

/// Per-game configuration
///
/// These options shape the board and the losing condition. They are
/// validated once by the registry before any game is built with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Options {
    /// Number of cards on the board, placeholders included
    #[garde(range(min = MIN_CARDS, max = MAX_CARDS))]
    cards: usize,
    /// Wrong guesses allowed before the game is lost (None means unlimited)
    #[garde(range(min = 1))]
    max_misses: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cards: CARDS,
            max_misses: None,
        }
    }
}

impl Options {
    /// Sets the board size
    #[must_use]
    pub fn with_cards(mut self, cards: usize) -> Self {
        self.cards = cards;
        self
    }

    /// Sets the number of wrong guesses allowed
    #[must_use]
    pub fn with_max_misses(mut self, max_misses: Option<usize>) -> Self {
        self.max_misses = max_misses;
        self
    }

    /// Number of cards on the board
    pub fn cards(&self) -> usize {
        self.cards
    }

    /// Wrong guesses allowed, if limited
    pub fn max_misses(&self) -> Option<usize> {
        self.max_misses
    }
}

/// Errors reported to callers of game operations
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The selection is blank, a placeholder, or not on the board
    #[error("selection is not a candidate in this game")]
    InvalidSelection,
    /// The game already reached a terminal outcome
    #[error("game is already finished")]
    Finished,
    /// No game is bound to the token
    #[error("no game in progress")]
    NoGame,
    /// The contact list had nobody who could be the target
    #[error("no playable contacts")]
    NoContacts,
}

/// Broad category of an [`Error`], for mapping onto client responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The request itself was malformed or not allowed in this state
    Validation,
    /// Something the request depends on does not exist
    Precondition,
}

impl Error {
    /// Returns the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSelection | Self::Finished => ErrorKind::Validation,
            Self::NoGame | Self::NoContacts => ErrorKind::Precondition,
        }
    }
}

/// Progress summary of a game
///
/// While the game is active this is a live indicator; once finished it
/// is the final score and never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    /// Points earned so far (higher is better)
    pub points: u64,
    /// Correct eliminations
    pub eliminated: usize,
    /// Wrong guesses
    pub misses: usize,
    /// Refused attempts to eliminate the target
    pub slips: usize,
    /// Terminal outcome, once there is one
    pub outcome: Option<Outcome>,
}

impl Display for Score {
    /// Formats the score as the text shown to the player
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = isize::try_from(self.points).unwrap_or(isize::MAX);
        write!(f, "{}", pluralizer::pluralize("point", count, true))?;
        match self.outcome {
            Some(Outcome::Won) => write!(f, ", won"),
            Some(Outcome::Lost) => write!(f, ", lost"),
            None => Ok(()),
        }
    }
}

/// Result of an elimination or guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Whether the move was the right call
    pub accepted: bool,
    /// Score after the move
    pub score: Score,
}

/// A single guess-the-friend session
///
/// A game belongs to one owner and is reachable through one token. Its
/// target and board are fixed at creation; only the elimination and
/// guess sets, the hint cursor, and the state move afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// The user playing
    owner: Owner,
    /// Resumption key this game is bound to
    token: Token,
    /// The secret candidate
    target: CandidateId,
    /// The board shown to the player
    pool: Pool,
    /// Candidates removed from consideration
    eliminated: HashSet<CandidateId>,
    /// Candidates formally guessed
    guessed: HashSet<CandidateId>,
    /// Attempts to eliminate the target
    #[serde(default)]
    slips: usize,
    /// Clues about the target, least specific first
    hints: Vec<Hint>,
    /// Index of the next clue to hand out
    hint_cursor: usize,
    /// Current phase
    state: State,
    /// Configuration the game was built with
    options: Options,
}

impl Game {
    /// Creates a new game with a random target drawn from `contacts`
    ///
    /// # Arguments
    ///
    /// * `owner` - The user the game belongs to
    /// * `token` - Resumption key to bind the game to
    /// * `contacts` - The owner's contact list
    /// * `options` - Board and losing-condition configuration
    /// * `rng` - Random source for the target, the sample, and the shuffle
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContacts`] if no contact is playable.
    pub fn new(
        owner: Owner,
        token: Token,
        contacts: &[Contact],
        options: Options,
        rng: &mut fastrand::Rng,
    ) -> Result<Self, Error> {
        let playable = contacts
            .iter()
            .filter(|contact| contact.is_playable())
            .collect_vec();
        let target = rng
            .choice(playable)
            .cloned()
            .ok_or(Error::NoContacts)?;

        let hints = hint::hints_for(&target);
        let target_id = target.id.clone();
        let pool = Pool::build(target, contacts, options.cards, rng);

        Ok(Self {
            owner,
            token,
            target: target_id,
            pool,
            eliminated: HashSet::new(),
            guessed: HashSet::new(),
            slips: 0,
            hints,
            hint_cursor: 0,
            state: State::Active,
            options,
        })
    }

    /// The user this game belongs to
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// The token this game is bound to
    pub fn token(&self) -> Token {
        self.token
    }

    /// The board shown to the player
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// The current phase
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the game reached a terminal outcome
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished(_))
    }

    /// Whether any elimination or guess has been recorded
    ///
    /// A refused elimination of the target counts as a move.
    pub fn has_moves(&self) -> bool {
        self.slips > 0 || !self.eliminated.is_empty() || !self.guessed.is_empty()
    }

    /// Candidates eliminated so far
    pub fn eliminated(&self) -> &HashSet<CandidateId> {
        &self.eliminated
    }

    /// Candidates guessed so far
    pub fn guessed(&self) -> &HashSet<CandidateId> {
        &self.guessed
    }

    /// The target's id, for the end-of-game reveal
    pub fn reveal(&self) -> &CandidateId {
        &self.target
    }

    /// Whether `id` designates a real candidate on the board
    pub fn valid_guess(&self, id: &str) -> bool {
        !id.trim().is_empty() && self.pool.contains(id)
    }

    /// Number of wrong guesses
    fn misses(&self) -> usize {
        self.guessed.iter().filter(|id| **id != self.target).count()
    }

    /// Non-target candidates that are neither eliminated nor guessed
    fn remaining(&self) -> usize {
        self.pool
            .ids()
            .filter(|id| {
                **id != self.target && !self.eliminated.contains(*id) && !self.guessed.contains(*id)
            })
            .count()
    }

    /// Checks that a move is allowed and resolves the selected candidate
    ///
    /// # Errors
    ///
    /// * `Error::Finished` - The game already ended
    /// * `Error::InvalidSelection` - `id` is not a real candidate on the board
    fn select(&self, id: &str) -> Result<CandidateId, Error> {
        if self.is_finished() {
            return Err(Error::Finished);
        }
        if !self.valid_guess(id) {
            return Err(Error::InvalidSelection);
        }
        Ok(CandidateId::from(id))
    }

    /// Removes a candidate from consideration
    ///
    /// Eliminating someone other than the target is the right call and is
    /// recorded. Eliminating the target is refused and costs a slip, so the
    /// board cannot be swept blind to find out who the target is. Eliminating
    /// a candidate already ruled out is refused without changing anything.
    ///
    /// # Errors
    ///
    /// * `Error::Finished` - The game already ended
    /// * `Error::InvalidSelection` - `id` is not a real candidate on the board
    pub fn eliminate(&mut self, id: &str) -> Result<Verdict, Error> {
        let id = self.select(id)?;

        if id == self.target {
            self.slips += 1;
        }
        let accepted =
            id != self.target && !self.guessed.contains(&id) && self.eliminated.insert(id.clone());
        log::debug!("game {} eliminate {id}: {accepted}", self.token);

        Ok(Verdict {
            accepted,
            score: self.score(),
        })
    }

    /// Formally guesses the target
    ///
    /// A correct guess wins the game. A wrong guess is recorded as a miss
    /// and loses the game when no other candidate is left to try or the
    /// configured miss limit is reached.
    ///
    /// # Errors
    ///
    /// * `Error::Finished` - The game already ended
    /// * `Error::InvalidSelection` - `id` is not a real candidate on the board
    pub fn guess(&mut self, id: &str) -> Result<Verdict, Error> {
        let id = self.select(id)?;

        let accepted = id == self.target;
        self.guessed.insert(id);

        if accepted {
            self.state = State::Finished(Outcome::Won);
        } else if self.remaining() == 0
            || self
                .options
                .max_misses
                .is_some_and(|max| self.misses() >= max)
        {
            self.state = State::Finished(Outcome::Lost);
        }
        log::debug!("game {} guess: {accepted}, {:?}", self.token, self.state);

        Ok(Verdict {
            accepted,
            score: self.score(),
        })
    }

    /// Hands out the next clue about the target
    ///
    /// Once every clue has been given this keeps returning
    /// [`HintReply::Exhausted`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Finished` if the game already ended.
    pub fn next_hint(&mut self) -> Result<HintReply, Error> {
        if self.is_finished() {
            return Err(Error::Finished);
        }

        let Some(hint) = self.hints.get(self.hint_cursor).cloned() else {
            return Ok(HintReply::Exhausted);
        };
        self.hint_cursor += 1;

        Ok(HintReply::Clue {
            number: self.hint_cursor,
            remaining: self.hints.len() - self.hint_cursor,
            hint,
        })
    }

    /// Computes the current score
    ///
    /// Each correct elimination earns [`ELIMINATION_POINTS`], a win adds
    /// [`WIN_POINTS`], each wrong guess costs [`MISS_PENALTY`], and each
    /// attempt to eliminate the target costs [`SLIP_PENALTY`], never going
    /// below zero.
    pub fn score(&self) -> Score {
        let eliminated = self.eliminated.len();
        let misses = self.misses();
        let outcome = match self.state {
            State::Active => None,
            State::Finished(outcome) => Some(outcome),
        };

        let earned = ELIMINATION_POINTS * eliminated as u64
            + if outcome == Some(Outcome::Won) {
                WIN_POINTS
            } else {
                0
            };

        let penalty = MISS_PENALTY * misses as u64 + SLIP_PENALTY * self.slips as u64;

        Score {
            points: earned.saturating_sub(penalty),
            eliminated,
            misses,
            slips: self.slips,
            outcome,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::contact::Attribute;

    fn owner() -> Owner {
        Owner::new("owner", "Owner")
    }

    fn contacts(count: usize) -> Vec<Contact> {
        (0..count)
            .map(|i| Contact::new(format!("c{i}"), format!("Contact {i}")))
            .collect()
    }

    fn game_with(count: usize, options: Options) -> Game {
        let mut rng = fastrand::Rng::with_seed(9);
        Game::new(owner(), Token::new(), &contacts(count), options, &mut rng).unwrap()
    }

    fn game(count: usize) -> Game {
        game_with(count, Options::default().with_cards(6))
    }

    fn non_targets(game: &Game) -> Vec<String> {
        game.pool()
            .ids()
            .filter(|id| *id != game.reveal())
            .map(|id| id.as_str().to_owned())
            .collect()
    }

    fn first_non_target(game: &Game) -> String {
        non_targets(game).remove(0)
    }

    #[test]
    fn test_new_game_invariants() {
        let game = game(4);

        assert_eq!(game.pool().len(), 6);
        assert_eq!(game.pool().placeholders(), 2);
        assert!(game.pool().contains(game.reveal().as_str()));
        assert_eq!(game.state(), State::Active);
        assert!(!game.has_moves());
    }

    #[test]
    fn test_new_game_without_contacts() {
        let mut rng = fastrand::Rng::with_seed(1);
        let result = Game::new(owner(), Token::new(), &[], Options::default(), &mut rng);
        assert_eq!(result.unwrap_err(), Error::NoContacts);

        let blank = vec![Contact::new(" ", "Nobody")];
        let result = Game::new(owner(), Token::new(), &blank, Options::default(), &mut rng);
        assert_eq!(result.unwrap_err(), Error::NoContacts);
    }

    #[test]
    fn test_valid_guess() {
        let game = game(4);
        let target = game.reveal().as_str().to_owned();

        assert!(game.valid_guess(&target));
        assert!(!game.valid_guess(""));
        assert!(!game.valid_guess("   "));
        assert!(!game.valid_guess("stranger"));
    }

    #[test]
    fn test_eliminate_target_is_refused_and_costs_a_slip() {
        let mut game = game(4);
        let target = game.reveal().as_str().to_owned();
        let id = first_non_target(&game);
        game.eliminate(&id).unwrap();

        let verdict = game.eliminate(&target).unwrap();

        assert!(!verdict.accepted);
        assert_eq!(game.eliminated().len(), 1);
        assert!(!game.eliminated().contains(target.as_str()));
        assert_eq!(game.state(), State::Active);
        assert_eq!(verdict.score.slips, 1);
        assert_eq!(verdict.score.points, 0);
    }

    #[test]
    fn test_slip_alone_counts_as_a_move() {
        let mut game = game(4);
        let target = game.reveal().as_str().to_owned();

        game.eliminate(&target).unwrap();

        assert!(game.has_moves());
    }

    #[test]
    fn test_sweeping_the_board_scores_below_careful_play() {
        let mut careful = game(8);
        let mut blind = careful.clone();
        let target = careful.reveal().as_str().to_owned();

        for id in non_targets(&careful) {
            assert!(careful.eliminate(&id).unwrap().accepted);
        }
        let best = careful.guess(&target).unwrap().score;

        let board = blind
            .pool()
            .ids()
            .map(|id| id.as_str().to_owned())
            .collect_vec();
        let refused = board
            .into_iter()
            .filter(|id| !blind.eliminate(id).unwrap().accepted)
            .collect_vec();
        assert_eq!(refused, vec![target.clone()]);
        let swept = blind.guess(&refused[0]).unwrap().score;

        assert_eq!(swept.outcome, Some(Outcome::Won));
        assert_eq!(swept.eliminated, best.eliminated);
        assert!(swept.points < best.points);
        assert_eq!(swept.points, best.points - SLIP_PENALTY);
    }

    #[test]
    fn test_eliminate_non_target() {
        let mut game = game(4);
        let id = first_non_target(&game);

        let verdict = game.eliminate(&id).unwrap();
        assert!(verdict.accepted);
        assert_eq!(verdict.score.eliminated, 1);
        assert_eq!(verdict.score.points, ELIMINATION_POINTS);

        let again = game.eliminate(&id).unwrap();
        assert!(!again.accepted);
        assert_eq!(game.eliminated().len(), 1);
    }

    #[test]
    fn test_eliminate_invalid_is_rejected() {
        let mut game = game(4);

        assert_eq!(game.eliminate(""), Err(Error::InvalidSelection));
        assert_eq!(game.eliminate("stranger"), Err(Error::InvalidSelection));
        assert!(!game.has_moves());
    }

    #[test]
    fn test_guess_target_wins() {
        let mut game = game(4);
        let target = game.reveal().as_str().to_owned();

        let verdict = game.guess(&target).unwrap();

        assert!(verdict.accepted);
        assert_eq!(game.state(), State::Finished(Outcome::Won));
        assert_eq!(verdict.score.outcome, Some(Outcome::Won));
        assert_eq!(verdict.score.points, WIN_POINTS);
    }

    #[test]
    fn test_guess_target_wins_after_history() {
        let mut game = game(4);
        let target = game.reveal().as_str().to_owned();
        let others = non_targets(&game);

        game.eliminate(&others[0]).unwrap();
        game.guess(&others[1]).unwrap();
        let verdict = game.guess(&target).unwrap();

        assert!(verdict.accepted);
        assert_eq!(game.state(), State::Finished(Outcome::Won));
        assert_eq!(
            verdict.score.points,
            WIN_POINTS + ELIMINATION_POINTS - MISS_PENALTY
        );
    }

    #[test]
    fn test_wrong_guess_is_a_miss() {
        let mut game = game(4);
        let id = first_non_target(&game);

        let verdict = game.guess(&id).unwrap();

        assert!(!verdict.accepted);
        assert_eq!(verdict.score.misses, 1);
        assert_eq!(verdict.score.points, 0);
        assert_eq!(game.state(), State::Active);
    }

    #[test]
    fn test_eliminate_after_wrong_guess_is_refused() {
        let mut game = game(4);
        let id = first_non_target(&game);

        game.guess(&id).unwrap();
        assert!(!game.eliminate(&id).unwrap().accepted);
        assert!(game.eliminated().is_empty());
    }

    #[test]
    fn test_running_out_of_candidates_loses() {
        let mut game = game(4);
        let others = non_targets(&game);
        assert_eq!(others.len(), 3);

        game.eliminate(&others[0]).unwrap();
        game.guess(&others[1]).unwrap();
        assert_eq!(game.state(), State::Active);

        let verdict = game.guess(&others[2]).unwrap();
        assert!(!verdict.accepted);
        assert_eq!(game.state(), State::Finished(Outcome::Lost));
        assert_eq!(verdict.score.outcome, Some(Outcome::Lost));
    }

    #[test]
    fn test_max_misses_loses() {
        let mut game = game_with(4, Options::default().with_cards(6).with_max_misses(Some(1)));
        let id = first_non_target(&game);

        game.guess(&id).unwrap();

        assert_eq!(game.state(), State::Finished(Outcome::Lost));
    }

    #[test]
    fn test_finished_game_rejects_everything() {
        let mut game = game(4);
        let target = game.reveal().as_str().to_owned();
        let other = first_non_target(&game);
        game.guess(&target).unwrap();
        let score = game.score();

        for _ in 0..2 {
            assert_eq!(game.eliminate(&other), Err(Error::Finished));
            assert_eq!(game.guess(&other), Err(Error::Finished));
            assert_eq!(game.guess(&target), Err(Error::Finished));
            assert_eq!(game.next_hint(), Err(Error::Finished));
        }
        assert_eq!(game.score(), score);
        assert!(game.eliminated().is_empty());
    }

    #[test]
    fn test_eliminate_all_then_guess_is_best_score() {
        let mut game = game(5);
        let target = game.reveal().as_str().to_owned();
        let others = non_targets(&game);
        assert_eq!(others.len(), 4);

        for id in &others {
            let verdict = game.eliminate(id).unwrap();
            assert!(verdict.accepted);
        }
        let verdict = game.guess(&target).unwrap();

        assert!(verdict.accepted);
        assert_eq!(verdict.score.points, WIN_POINTS + 4 * ELIMINATION_POINTS);
    }

    #[test]
    fn test_hints_exhaust_and_stay_exhausted() {
        let list = vec![
            Contact::new("a", "Alice")
                .with(Attribute::Gender, "female")
                .with(Attribute::Location, "Paris"),
        ];
        let mut rng = fastrand::Rng::with_seed(2);
        let mut game =
            Game::new(owner(), Token::new(), &list, Options::default(), &mut rng).unwrap();

        let k = 3;
        for i in 1..=k {
            match game.next_hint().unwrap() {
                HintReply::Clue {
                    number, remaining, ..
                } => {
                    assert_eq!(number, i);
                    assert_eq!(remaining, k - i);
                }
                HintReply::Exhausted => panic!("ran out of hints early"),
            }
        }
        assert_eq!(game.next_hint().unwrap(), HintReply::Exhausted);
        assert_eq!(game.next_hint().unwrap(), HintReply::Exhausted);
        assert!(!game.has_moves());
    }

    #[test]
    fn test_score_display() {
        let mut game = game(4);
        assert_eq!(game.score().to_string(), "0 points");

        let id = first_non_target(&game);
        game.eliminate(&id).unwrap();
        assert_eq!(game.score().to_string(), "10 points");

        let target = game.reveal().as_str().to_owned();
        game.guess(&target).unwrap();
        assert_eq!(game.score().to_string(), "110 points, won");
    }

    #[test]
    fn test_options_validation() {
        assert!(Options::default().validate().is_ok());
        assert!(Options::default().with_cards(1).validate().is_err());
        assert!(Options::default().with_cards(MAX_CARDS + 1).validate().is_err());
        assert!(Options::default().with_max_misses(Some(0)).validate().is_err());
        assert!(Options::default().with_max_misses(Some(3)).validate().is_ok());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::InvalidSelection.kind(), ErrorKind::Validation);
        assert_eq!(Error::Finished.kind(), ErrorKind::Validation);
        assert_eq!(Error::NoGame.kind(), ErrorKind::Precondition);
        assert_eq!(Error::NoContacts.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_game_serde_round_trip_keeps_progress() {
        let mut game = game(4);
        let id = first_non_target(&game);
        game.eliminate(&id).unwrap();
        game.next_hint().unwrap();

        let json = serde_json::to_string(&game).unwrap();
        let back: Game = serde_json::from_str(&json).unwrap();

        assert_eq!(back.reveal(), game.reveal());
        assert_eq!(back.pool(), game.pool());
        assert_eq!(back.eliminated(), game.eliminated());
        assert_eq!(back.score(), game.score());
        assert_eq!(back.token(), game.token());
    }
}
