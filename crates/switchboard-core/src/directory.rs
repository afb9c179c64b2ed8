//! Keyword directory.

use std::collections::HashMap;

use switchboard_proto::PeerId;

use crate::registry::ConnectionRegistry;

/// Maps each live identity to its self-declared discovery keyword.
///
/// Keywords are non-unique; collisions are legal and resolved by the
/// caller picking the earliest-registered match. Matching is exact
/// string equality — no prefix or fuzzy matching.
#[derive(Debug, Default)]
pub struct KeywordDirectory {
    keywords: HashMap<PeerId, String>,
}

impl KeywordDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the keyword for an identity. Last write wins.
    pub fn set_keyword(&mut self, peer: PeerId, keyword: String) {
        self.keywords.insert(peer, keyword);
    }

    /// The keyword currently declared by an identity, if any.
    pub fn keyword_of(&self, peer: PeerId) -> Option<&str> {
        self.keywords.get(&peer).map(String::as_str)
    }

    /// Drop any keyword association. Invoked on disconnect.
    pub fn clear(&mut self, peer: PeerId) {
        self.keywords.remove(&peer);
    }

    /// All live identities whose keyword equals `keyword`, excluding the
    /// searcher, in registration order. A fresh scan every call: the
    /// result reflects current state only.
    pub fn find_by_keyword(
        &self,
        registry: &ConnectionRegistry,
        keyword: &str,
        excluding: PeerId,
    ) -> Vec<PeerId> {
        registry
            .iter()
            .filter(|peer| *peer != excluding)
            .filter(|peer| self.keyword_of(*peer) == Some(keyword))
            .collect()
    }
}
