//! Hint sequence about the target
//!
//! Each game precomputes a finite, ordered list of clues about its
//! target, from vague profile facts down to the initial of their name.
//! The game walks it with a cursor and never rewinds.

use rustrict::CensorStr;
use serde::{Deserialize, Serialize};

use crate::contact::{Attribute, Contact};

/// A single clue about the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hint {
    /// A profile fact
    Attribute {
        /// Which fact this is
        attribute: Attribute,
        /// The fact's value, cleaned for display
        value: String,
    },
    /// First letter of the target's name
    Initial(char),
}

/// Result of asking a game for its next hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HintReply {
    /// The next clue in the sequence
    Clue {
        /// 1-based position of this clue
        number: usize,
        /// How many clues are still left after this one
        remaining: usize,
        /// The clue itself
        hint: Hint,
    },
    /// Every clue has already been handed out
    Exhausted,
}

/// Builds the hint sequence for a target, least specific first
///
/// Blank profile values are skipped and the rest are censored before
/// being shown to the player. The sequence ends with the name initial
/// when the name contains a letter.
pub fn hints_for(target: &Contact) -> Vec<Hint> {
    target
        .profile
        .iter()
        .filter_map(|(attribute, value)| {
            let value = rustrict::trim_whitespace(value.as_deref()?);
            (!value.is_empty()).then(|| Hint::Attribute {
                attribute,
                value: value.censor(),
            })
        })
        .chain(
            target
                .name
                .chars()
                .find(|c| c.is_alphabetic())
                .and_then(|c| c.to_uppercase().next())
                .map(Hint::Initial),
        )
        .collect()
}
