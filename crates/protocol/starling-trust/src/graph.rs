//! The follow graph and its BFS operations (§4.6).

use std::collections::{HashMap, HashSet, VecDeque};

use starling_crypto::PeerId;
use starling_types::{followed_keys, SignedMessage};

/// Directed follow edges built from the newest follow-list record per
/// author. `following[a]` is who `a` follows.
#[derive(Debug, Default, Clone)]
pub struct FollowGraph {
    following: HashMap<PeerId, HashSet<PeerId>>,
}

impl FollowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a set of follow-list records. Callers are
    /// expected to have already resolved replaceable-slot duplicates (the
    /// event store only ever holds the newest per author), so this simply
    /// reads one edge set per message.
    pub fn from_follow_lists<'a>(records: impl IntoIterator<Item = &'a SignedMessage>) -> Self {
        let mut following: HashMap<PeerId, HashSet<PeerId>> = HashMap::new();
        for record in records {
            following
                .entry(record.author)
                .or_default()
                .extend(followed_keys(&record.tags));
        }
        Self { following }
    }

    pub fn set_following(&mut self, author: PeerId, follows: impl IntoIterator<Item = PeerId>) {
        self.following.insert(author, follows.into_iter().collect());
    }

    pub fn follows(&self, author: &PeerId, target: &PeerId) -> bool {
        self.following.get(author).is_some_and(|set| set.contains(target))
    }

    /// Peers who follow `target` — the reverse of the stored `following` edges.
    pub fn followers(&self, target: &PeerId) -> HashSet<PeerId> {
        self.following
            .iter()
            .filter(|(_, follows)| follows.contains(target))
            .map(|(author, _)| *author)
            .collect()
    }

    /// BFS hop distance from `from` to `to` along follow edges, capped at
    /// `max_hops`. `None` means unreachable within that many hops
    /// (the spec's `∞`).
    pub fn distance(&self, from: &PeerId, to: &PeerId, max_hops: u32) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(*from);
        queue.push_back((*from, 0u32));

        while let Some((current, hops)) = queue.pop_front() {
            if hops >= max_hops {
                continue;
            }
            let Some(neighbors) = self.following.get(&current) else {
                continue;
            };
            for &next in neighbors {
                if next == *to {
                    return Some(hops + 1);
                }
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        None
    }

    /// `|followers(a) ∩ followers(b)|`.
    pub fn mutuals(&self, a: &PeerId, b: &PeerId) -> usize {
        let followers_a = self.followers(a);
        let followers_b = self.followers(b);
        followers_a.intersection(&followers_b).count()
    }
}
