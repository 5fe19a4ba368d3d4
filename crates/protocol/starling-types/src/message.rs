//! The signed-message data model (§3) shared by every component.

use starling_crypto::{Hash, PeerId, Signature, Timestamp};

use crate::constants::kind_range;

/// A tag is an ordered list of strings; by convention the first element is
/// the tag name (`tags[0]`).
pub type Tag = Vec<String>;

/// Author-signed record distributed via the gossip relay.
///
/// `id` is the content hash of the message's canonical encoding and MUST
/// recompute deterministically from the other fields; `signature` is a
/// signature over `id`, verified against `author`. Mutating any field
/// without re-signing invalidates both invariants.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignedMessage {
    pub id: Hash,
    pub author: PeerId,
    pub created_at: Timestamp,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub signature: Signature,
}

/// The storage-semantics class a `kind` value belongs to (§3 Kind classes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClass {
    /// Not stored; delivered only to currently-matching subscribers.
    Ephemeral,
    /// Stored indefinitely by id.
    Regular,
    /// At most one per `(author, kind)`.
    Replaceable,
    /// At most one per `(author, kind, dTagValue)`.
    ParameterizedReplaceable,
}

/// Classify a kind by the numeric range it falls into.
pub fn classify(kind: u16) -> KindClass {
    if kind_range::REPLACEABLE.contains(&kind) {
        KindClass::Replaceable
    } else if kind_range::EPHEMERAL.contains(&kind) {
        KindClass::Ephemeral
    } else if kind_range::PARAMETERIZED_REPLACEABLE.contains(&kind) {
        KindClass::ParameterizedReplaceable
    } else {
        KindClass::Regular
    }
}

/// The first element of the first tag named `name`, if any.
pub fn first_tag_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.first().map(|n| n.as_str()) == Some(name))
        .and_then(|t| t.get(1))
        .map(|s| s.as_str())
}

/// The `d` tag value used to key a parameterized-replaceable message's slot.
/// Absent `d` tag and an explicit empty `["d",""]` are the same slot.
pub fn d_tag_value(tags: &[Tag]) -> &str {
    first_tag_value(tags, "d").unwrap_or("")
}

impl SignedMessage {
    pub fn kind_class(&self) -> KindClass {
        classify(self.kind)
    }

    /// `(author, kind)` replaceable-slot identity, if this kind is replaceable.
    pub fn replaceable_slot(&self) -> Option<(PeerId, u16)> {
        matches!(self.kind_class(), KindClass::Replaceable).then_some((self.author, self.kind))
    }

    /// `(author, kind, dTagValue)` parameterized-replaceable-slot identity.
    pub fn parameterized_slot(&self) -> Option<(PeerId, u16, String)> {
        matches!(self.kind_class(), KindClass::ParameterizedReplaceable)
            .then(|| (self.author, self.kind, d_tag_value(&self.tags).to_string()))
    }

    /// Ids (or addressable `a` references) this message requests deletion of.
    /// Only meaningful when `kind == KIND_DELETION`.
    pub fn deletion_targets(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.first().map(|n| n.as_str()) == Some("e"))
            .filter_map(|t| t.get(1))
            .map(|s| s.as_str())
            .collect()
    }
}
