//! Query filters for the event store (§4.2).
//!
//! A single `Filter` matches a message if every populated field matches;
//! multiple filters passed to `queryMany` OR together.

use starling_crypto::{PeerId, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Match if `id` starts with any of these prefixes (hex).
    pub ids: Vec<String>,
    /// Match if `author` starts with any of these prefixes (hex).
    pub authors: Vec<String>,
    pub kinds: Vec<u16>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
    /// `#tagName -> allowed values`; matches any tag whose first element is
    /// `tagName` and whose second element is in the list.
    pub tags: Vec<(String, Vec<String>)>,
    /// Applied after ordering; `None` means unbounded.
    pub limit: Option<usize>,
}

impl Filter {
    pub fn matches(
        &self,
        id_hex: &str,
        author_hex: &str,
        kind: u16,
        created_at: Timestamp,
        tags: &[crate::Tag],
    ) -> bool {
        if !self.ids.is_empty() && !self.ids.iter().any(|p| id_hex.starts_with(p.as_str())) {
            return false;
        }
        if !self.authors.is_empty()
            && !self.authors.iter().any(|p| author_hex.starts_with(p.as_str()))
        {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&kind) {
            return false;
        }
        if let Some(since) = self.since {
            if created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if created_at > until {
                return false;
            }
        }
        for (name, values) in &self.tags {
            let matched = tags.iter().any(|t| {
                t.first().map(|n| n.as_str()) == Some(name.as_str())
                    && t.get(1).map(|v| values.iter().any(|allowed| allowed == v))
                        .unwrap_or(false)
            });
            if !matched {
                return false;
            }
        }
        true
    }

    /// Whether `author` (as a [`PeerId`]) satisfies this filter's author list.
    pub fn matches_author(&self, author: &PeerId) -> bool {
        if self.authors.is_empty() {
            return true;
        }
        let hex = starling_crypto::peer_id_to_string(author);
        self.authors.iter().any(|p| hex.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let f = Filter::default();
        assert!(f.matches("abc", "def", 1, 0, &[]));
    }

    #[test]
    fn kind_filter_restricts() {
        let f = Filter {
            kinds: vec![1, 2],
            ..Default::default()
        };
        assert!(f.matches("a", "b", 1, 0, &[]));
        assert!(!f.matches("a", "b", 3, 0, &[]));
    }

    #[test]
    fn tag_filter_requires_match() {
        let f = Filter {
            tags: vec![("d".to_string(), vec!["profile".to_string()])],
            ..Default::default()
        };
        let tags = vec![vec!["d".to_string(), "profile".to_string()]];
        assert!(f.matches("a", "b", 1, 0, &tags));
        assert!(!f.matches("a", "b", 1, 0, &[]));
    }

    #[test]
    fn since_until_bound_created_at() {
        let f = Filter {
            since: Some(100),
            until: Some(200),
            ..Default::default()
        };
        assert!(f.matches("a", "b", 1, 150, &[]));
        assert!(!f.matches("a", "b", 1, 50, &[]));
        assert!(!f.matches("a", "b", 1, 250, &[]));
    }
}
