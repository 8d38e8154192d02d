//! Candidate pool construction
//!
//! The pool is the board of cards a player sees: the target, a sample of
//! the owner's other contacts, and inert placeholder cards padding the
//! board to a fixed size. It is shuffled once when built and never
//! reordered or shrunk afterwards.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::contact::{CandidateId, Contact};

/// A single card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// A real contact that may be eliminated or guessed
    Candidate(Contact),
    /// Padding with no backing identity
    Empty,
}

impl Slot {
    /// Returns the contact behind this card, if any
    pub fn contact(&self) -> Option<&Contact> {
        match self {
            Self::Candidate(contact) => Some(contact),
            Self::Empty => None,
        }
    }
}

/// The ordered, fixed-size board of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pool(Vec<Slot>);

impl Pool {
    /// Builds a shuffled board of exactly `cards` slots around `target`
    ///
    /// Contacts that are not playable, that repeat an earlier id, or that
    /// share the target's id are dropped. When more contacts remain than
    /// fit on the board a uniform sample is taken; when fewer remain the
    /// board is padded with [`Slot::Empty`].
    ///
    /// # Arguments
    ///
    /// * `target` - The secret contact, always placed on the board
    /// * `contacts` - The owner's contact list
    /// * `cards` - Board size, at least 1
    /// * `rng` - Random source used for sampling and shuffling
    pub fn build(
        target: Contact,
        contacts: &[Contact],
        cards: usize,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let mut others = contacts
            .iter()
            .filter(|contact| contact.id != target.id && contact.is_playable())
            .unique_by(|contact| contact.id.clone())
            .cloned()
            .collect_vec();

        let room = cards.saturating_sub(1);
        if others.len() > room {
            rng.shuffle(&mut others);
            others.truncate(room);
        }

        let mut slots = std::iter::once(target)
            .chain(others)
            .map(Slot::Candidate)
            .collect_vec();
        slots.resize(cards.max(1), Slot::Empty);
        rng.shuffle(&mut slots);

        Self(slots)
    }

    /// Number of cards on the board, placeholders included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the board has no cards at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the cards in display order
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.0.iter()
    }

    /// Iterates over the real contacts in display order
    pub fn candidates(&self) -> impl Iterator<Item = &Contact> {
        self.0.iter().filter_map(Slot::contact)
    }

    /// Looks up a real contact by id
    pub fn candidate(&self, id: &str) -> Option<&Contact> {
        self.candidates().find(|contact| contact.id.as_str() == id)
    }

    /// Whether `id` names a real contact on the board
    pub fn contains(&self, id: &str) -> bool {
        self.candidate(id).is_some()
    }

    /// Number of placeholder cards
    pub fn placeholders(&self) -> usize {
        self.0.iter().filter(|slot| matches!(slot, Slot::Empty)).count()
    }

    /// Ids of every real contact on the board
    pub fn ids(&self) -> impl Iterator<Item = &CandidateId> {
        self.candidates().map(|contact| &contact.id)
    }
}
