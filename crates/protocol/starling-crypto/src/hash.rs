//! Content hashing used to compute canonical signed-message ids.
//!
//! ```text
//! H(content) = SHA256(0x00 || len(content) as u64be || content)
//! ```

use sha2::{Digest, Sha256};

use crate::Hash;

const DOMAIN_CONTENT: u8 = 0x00;

/// Compute the domain-separated content hash of the given bytes.
pub fn content_hash(content: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([DOMAIN_CONTENT]);
    hasher.update((content.len() as u64).to_be_bytes());
    hasher.update(content);
    let result: [u8; 32] = hasher.finalize().into();
    Hash(result)
}

/// Verify that `content` hashes to `expected`.
pub fn verify_content(content: &[u8], expected: &Hash) -> bool {
    content_hash(content).0 == expected.0
}
