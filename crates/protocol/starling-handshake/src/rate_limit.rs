//! Per-peer handshake rate limiting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use starling_crypto::PeerId;

/// Fixed-window limiter: at most `max_per_window` handshake requests per peer
/// per `window`, reset once the window elapses.
pub struct HandshakeRateLimiter {
    peers: Mutex<HashMap<PeerId, (u32, Instant)>>,
    max_per_window: u32,
    window: Duration,
}

impl HandshakeRateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self { peers: Mutex::new(HashMap::new()), max_per_window, window }
    }

    /// True if `peer` is still within its quota for the current window.
    pub fn check(&self, peer: PeerId) -> bool {
        let now = Instant::now();
        let mut peers = self.peers.lock().expect("rate limiter lock poisoned");
        let entry = peers.entry(peer).or_insert((0, now));
        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            true
        } else if entry.0 < self.max_per_window {
            entry.0 += 1;
            true
        } else {
            false
        }
    }
}

impl Default for HandshakeRateLimiter {
    /// 5 handshake attempts per peer per 60 seconds.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}
