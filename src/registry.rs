//! Token-keyed game registry
//!
//! The registry is the only way to create, resume, mutate, or discard a
//! game. Each live token owns a slot guarded by its own mutex; every
//! operation holds that lock from lookup to save, so requests carrying the
//! same token are serialized and observe a single game. Slots exist only
//! for games in play: lookups never create them, and reset or finished
//! games give theirs up.

use std::sync::Arc;

use dashmap::DashMap;
use garde::Validate;
use parking_lot::Mutex;

use crate::{
    contact::{CandidateId, Contact, Owner},
    game::{Error, Game, Options, Verdict},
    hint::HintReply,
    leaderboard::Leaderboard,
    store::Store,
    token::Token,
};

/// Per-token slot, `None` until a game is loaded or created
type Slot = Arc<Mutex<Option<Game>>>;

/// Resolves, creates, and mutates games by token
pub struct Registry<S> {
    /// Slots of games in play
    slots: DashMap<Token, Slot>,
    /// Durable game storage
    store: Arc<S>,
    /// Best scores across users
    leaderboard: Leaderboard<S>,
    /// Options every new game is built with
    options: Options,
    /// Random source for new games
    rng: Mutex<fastrand::Rng>,
}

impl<S: Store> Registry<S> {
    /// Creates a registry backed by `store`
    ///
    /// # Errors
    ///
    /// Returns the validation report if `options` are out of range.
    pub fn new(store: Arc<S>, options: Options) -> Result<Self, garde::Report> {
        options.validate()?;
        Ok(Self {
            slots: DashMap::new(),
            leaderboard: Leaderboard::new(store.clone()),
            store,
            options,
            rng: Mutex::new(fastrand::Rng::new()),
        })
    }

    /// Replaces the random source with a seeded one
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            ..self
        }
    }

    /// The leaderboard fed by games finished through this registry
    pub fn leaderboard(&self) -> &Leaderboard<S> {
        &self.leaderboard
    }

    /// Returns the slot for `token`, creating an empty one if needed
    fn slot(&self, token: Token) -> Slot {
        self.slots.entry(token).or_default().value().clone()
    }

    /// Returns the slot for `token` only if a game is bound to it
    ///
    /// A game found in the store but not yet in memory gets a slot; an
    /// unknown token never does.
    fn existing_slot(&self, token: Token) -> Option<Slot> {
        if let Some(slot) = self.slots.get(&token) {
            return Some(slot.value().clone());
        }
        let game = self.store.load(&token)?;
        Some(
            self.slots
                .entry(token)
                .or_insert_with(|| Arc::new(Mutex::new(Some(game))))
                .value()
                .clone(),
        )
    }

    /// Drops the slot for `token` from the map
    ///
    /// Must be called while holding `slot`'s lock. The slot is only removed
    /// when nobody else holds a handle to it; a request already waiting on
    /// the lock keeps the slot alive and finds it empty or finished.
    fn evict(&self, token: Token, slot: &Slot) {
        self.slots.remove_if(&token, |_, current| {
            Arc::ptr_eq(current, slot) && Arc::strong_count(current) == 2
        });
    }

    /// Fills an empty slot from the store
    fn hydrate(&self, token: Token, game: &mut Option<Game>) {
        if game.is_none() {
            *game = self.store.load(&token);
        }
    }

    /// Looks up the game bound to `token` without creating one
    ///
    /// # Returns
    ///
    /// A snapshot of the game, or `None` if nothing is bound to the token
    pub fn resolve(&self, token: Token) -> Option<Game> {
        let Some(slot) = self.slots.get(&token).map(|slot| slot.value().clone()) else {
            return self.store.load(&token);
        };
        let mut game = slot.lock();
        self.hydrate(token, &mut game);
        game.clone()
    }

    /// Resumes the owner's game for `token`, or starts a fresh one
    ///
    /// A game that belongs to the same owner and has at least one move
    /// recorded is returned unchanged. Anything else bound to the token,
    /// including a game nobody has played yet, is discarded and replaced.
    ///
    /// # Arguments
    ///
    /// * `owner` - The authenticated user
    /// * `token` - The session's resumption key
    /// * `contacts` - The owner's pre-fetched contact list
    ///
    /// # Errors
    ///
    /// Returns `Error::NoContacts` if a new game is needed and no contact
    /// is playable.
    pub fn make_or_resume(
        &self,
        owner: &Owner,
        token: Token,
        contacts: &[Contact],
    ) -> Result<Game, Error> {
        let slot = self.slot(token);
        let mut game = slot.lock();
        self.hydrate(token, &mut game);

        if let Some(existing) = game.as_ref() {
            if existing.owner().id == owner.id && existing.has_moves() {
                log::info!("resuming game {token}");
                let resumed = existing.clone();
                if resumed.is_finished() {
                    self.evict(token, &slot);
                }
                return Ok(resumed);
            }
        }

        if game.take().is_some() {
            log::info!("discarding game {token}");
        }
        self.store.discard(&token);

        let built = {
            let mut rng = self.rng.lock();
            Game::new(owner.clone(), token, contacts, self.options, &mut rng)
        };
        let fresh = built.inspect_err(|_| self.evict(token, &slot))?;
        self.store.save(&fresh);
        log::info!("started game {token} for {}", owner.id);

        Ok(game.insert(fresh).clone())
    }

    /// Abandons whatever game is bound to `token`
    pub fn reset(&self, token: Token) {
        if let Some(slot) = self.slots.get(&token).map(|slot| slot.value().clone()) {
            let mut game = slot.lock();
            if game.take().is_some() {
                log::info!("reset game {token}");
            }
            self.store.discard(&token);
            self.evict(token, &slot);
        } else {
            self.store.discard(&token);
        }
    }

    /// Runs a mutation against the game bound to `token`
    ///
    /// The mutated game is saved on success. If the mutation finished the
    /// game, its final score is recorded on the leaderboard and the slot is
    /// dropped; the finished game stays readable from the store.
    fn with_game<R>(
        &self,
        token: Token,
        mutation: impl FnOnce(&mut Game) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let slot = self.existing_slot(token).ok_or(Error::NoGame)?;
        let mut guard = slot.lock();
        self.hydrate(token, &mut guard);
        let Some(game) = guard.as_mut() else {
            self.evict(token, &slot);
            return Err(Error::NoGame);
        };

        let was_finished = game.is_finished();
        let result = mutation(&mut *game);
        if result.is_ok() {
            self.store.save(game);
        }

        if game.is_finished() {
            if !was_finished {
                let score = game.score();
                log::info!("game {token} finished: {score}");
                self.leaderboard.record(game.owner(), score);
            }
            self.evict(token, &slot);
        }

        result
    }

    /// Eliminates a candidate in the game bound to `token`
    ///
    /// # Errors
    ///
    /// * `Error::NoGame` - Nothing is bound to the token
    /// * `Error::Finished` - The game already ended
    /// * `Error::InvalidSelection` - `id` is not a real candidate on the board
    pub fn eliminate(&self, token: Token, id: &str) -> Result<Verdict, Error> {
        self.with_game(token, |game| game.eliminate(id))
    }

    /// Guesses the target in the game bound to `token`
    ///
    /// # Errors
    ///
    /// * `Error::NoGame` - Nothing is bound to the token
    /// * `Error::Finished` - The game already ended
    /// * `Error::InvalidSelection` - `id` is not a real candidate on the board
    pub fn guess(&self, token: Token, id: &str) -> Result<Verdict, Error> {
        self.with_game(token, |game| game.guess(id))
    }

    /// Hands out the next hint of the game bound to `token`
    ///
    /// # Errors
    ///
    /// * `Error::NoGame` - Nothing is bound to the token
    /// * `Error::Finished` - The game already ended
    pub fn next_hint(&self, token: Token) -> Result<HintReply, Error> {
        self.with_game(token, Game::next_hint)
    }

    /// Reveals the target of the game bound to `token`
    ///
    /// # Errors
    ///
    /// Returns `Error::NoGame` if nothing is bound to the token.
    pub fn reveal(&self, token: Token) -> Result<CandidateId, Error> {
        self.resolve(token)
            .map(|game| game.reveal().clone())
            .ok_or(Error::NoGame)
    }
}
