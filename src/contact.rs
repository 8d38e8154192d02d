//! Players and the contacts they guess between
//!
//! Contacts arrive already fetched from the owner's directory. The engine
//! only needs an id, a display name, and whatever optional profile facts
//! the directory exposed, which later feed the hint sequence.

use std::borrow::Borrow;

use enum_map::{Enum, EnumMap};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants::contact::{MAX_ID_LENGTH, MAX_NAME_LENGTH};

/// Directory id of a contact, as handed to us by the directory collaborator
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Validate,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
#[garde(transparent)]
pub struct CandidateId(#[garde(length(min = 1, max = MAX_ID_LENGTH))] String);

impl CandidateId {
    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty or contains only whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl Borrow<str> for CandidateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identity of an authenticated user
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct UserId(String);

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// The user a game belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Stable user identity
    pub id: UserId,
    /// Display name shown on the leaderboard
    pub name: String,
}

impl Owner {
    /// Creates an owner from an id and display name
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Optional profile facts a contact may carry
///
/// Variants are declared from least to most specific; hints are handed
/// out in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum Attribute {
    /// Self-reported gender
    Gender,
    /// Where the contact grew up
    Hometown,
    /// Where the contact currently lives
    Location,
    /// Most recent school
    Education,
    /// Most recent employer
    Work,
}

/// Profile facts keyed by attribute
pub type Profile = EnumMap<Attribute, Option<String>>;

/// A single entry of the owner's contact list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Contact {
    /// Directory id
    #[garde(dive)]
    pub id: CandidateId,
    /// Display name
    #[garde(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: String,
    /// Known profile facts
    #[garde(skip)]
    pub profile: Profile,
}

impl Contact {
    /// Creates a contact with an empty profile
    pub fn new(id: impl Into<CandidateId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile: Profile::default(),
        }
    }

    /// Sets a profile fact, returning the updated contact
    #[must_use]
    pub fn with(mut self, attribute: Attribute, value: impl Into<String>) -> Self {
        self.profile[attribute] = Some(value.into());
        self
    }

    /// Whether the contact can take part in a game
    pub fn is_playable(&self) -> bool {
        !self.id.is_blank() && self.validate().is_ok()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_contact_playable() {
        assert!(Contact::new("100", "Ada Lovelace").is_playable());
    }

    #[test]
    fn test_contact_blank_id_not_playable() {
        assert!(!Contact::new("", "Ada").is_playable());
        assert!(!Contact::new("   ", "Ada").is_playable());
    }

    #[test]
    fn test_contact_name_bounds() {
        assert!(!Contact::new("1", "").is_playable());
        assert!(!Contact::new("1", "a".repeat(MAX_NAME_LENGTH + 1)).is_playable());
        assert!(Contact::new("1", "a".repeat(MAX_NAME_LENGTH)).is_playable());
    }

    #[test]
    fn test_contact_id_too_long() {
        assert!(!Contact::new("9".repeat(MAX_ID_LENGTH + 1), "Ada").is_playable());
    }

    #[test]
    fn test_contact_with_profile() {
        let contact = Contact::new("1", "Ada")
            .with(Attribute::Hometown, "London")
            .with(Attribute::Work, "Difference Engine");

        assert_eq!(contact.profile[Attribute::Hometown].as_deref(), Some("London"));
        assert_eq!(contact.profile[Attribute::Gender], None);
    }

    #[test]
    fn test_candidate_id_serializes_transparently() {
        let id = CandidateId::from("12345");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12345\"");
        assert_eq!(id.to_string(), "12345");
    }

    #[test]
    fn test_contact_serde_keeps_profile() {
        let contact = Contact::new("7", "Grace").with(Attribute::Education, "Yale");
        let json = serde_json::to_string(&contact).unwrap();
        let back: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contact);
    }
}
