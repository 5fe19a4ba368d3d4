//! Sealing/opening the JSON payloads carried inside a handshake message's
//! `content`. `content` is an opaque UTF-8 string, so the sealed bytes are
//! base64-encoded rather than stored raw.

use base64::Engine;
use serde::{de::DeserializeOwned, Serialize};
use starling_crypto::{SealPrivateKey, SealPublicKey};

use crate::error::{HandshakeError, Result};

fn engine() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Serialize `payload` to JSON, seal it to `peer_pub`, and base64-encode the
/// result for use as a message's `content`.
pub fn seal_payload<T: Serialize>(
    self_priv: &SealPrivateKey,
    peer_pub: &SealPublicKey,
    payload: &T,
) -> Result<String> {
    let plaintext = serde_json::to_vec(payload)?;
    let sealed = starling_crypto::seal::seal(self_priv, peer_pub, &plaintext);
    Ok(engine().encode(sealed))
}

/// Reverse of [`seal_payload`]: base64-decode, open, and parse as JSON.
pub fn open_payload<T: DeserializeOwned>(
    self_priv: &SealPrivateKey,
    peer_pub: &SealPublicKey,
    content: &str,
) -> Result<T> {
    let sealed = engine()
        .decode(content)
        .map_err(|_| HandshakeError::Open(starling_crypto::CryptoError::SealOpenFailed))?;
    let plaintext = starling_crypto::seal::open(self_priv, peer_pub, &sealed)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn seal_then_open_roundtrips() {
        let (a_priv, a_pub) = starling_crypto::seal::generate_seal_keypair();
        let (b_priv, b_pub) = starling_crypto::seal::generate_seal_keypair();

        let content = seal_payload(&a_priv, &b_pub, &Sample { value: 42 }).unwrap();
        let opened: Sample = open_payload(&b_priv, &a_pub, &content).unwrap();
        assert_eq!(opened, Sample { value: 42 });
    }

    #[test]
    fn garbage_content_fails_to_open() {
        let (_, a_pub) = starling_crypto::seal::generate_seal_keypair();
        let (b_priv, _) = starling_crypto::seal::generate_seal_keypair();
        let result: Result<Sample> = open_payload(&b_priv, &a_pub, "not-base64!!");
        assert!(result.is_err());
    }
}
