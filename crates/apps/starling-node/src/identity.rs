//! Load-or-generate the node's signing and sealing keypairs (§10.4).
//!
//! `PrivateKey`/`SealPrivateKey` carry no serde impl by design (they are
//! zeroized secrets, never meant to cross a wire or log line), so
//! persistence here is a hand-rolled hex file rather than `serde_json`: one
//! line per secret, `signing=<64 hex>` / `seal=<64 hex>`.

use std::fs;
use std::path::Path;

use ed25519_dalek::SigningKey;
use starling_crypto::{PeerId, PrivateKey, PublicKey, SealPrivateKey, SealPublicKey};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{NodeError, Result};

pub struct NodeIdentity {
    pub peer: PeerId,
    pub signing_key: PrivateKey,
    pub public_key: PublicKey,
    pub seal_key: SealPrivateKey,
    pub seal_public_key: SealPublicKey,
}

fn hex_decode_32(s: &str) -> Result<[u8; 32]> {
    let bytes = hex_decode(s)?;
    bytes
        .try_into()
        .map_err(|_| NodeError::Identity("expected a 32-byte hex secret".to_string()))
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(s.get(i..i + 2).unwrap_or(""), 16)
                .map_err(|e| NodeError::Identity(format!("invalid hex in identity file: {e}")))
        })
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl NodeIdentity {
    fn from_secrets(signing_bytes: [u8; 32], seal_bytes: [u8; 32]) -> Self {
        let signing_key = PrivateKey::from_bytes(signing_bytes);
        let verifying_key = SigningKey::from_bytes(&signing_bytes).verifying_key();
        let public_key = PublicKey::from_bytes(verifying_key.to_bytes());
        let peer = starling_crypto::peer_id_from_public_key(&public_key);

        let seal_key = SealPrivateKey::from_bytes(seal_bytes);
        let seal_public_key = SealPublicKey::from_bytes(
            X25519PublicKey::from(&StaticSecret::from(seal_bytes)).to_bytes(),
        );

        Self { peer, signing_key, public_key, seal_key, seal_public_key }
    }

    fn generate() -> Self {
        let (signing_key, public_key) = starling_crypto::generate_identity();
        let (seal_key, seal_public_key) = starling_crypto::generate_seal_keypair();
        let peer = starling_crypto::peer_id_from_public_key(&public_key);
        Self { peer, signing_key, public_key, seal_key, seal_public_key }
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| NodeError::Identity(e.to_string()))?;
        }
        let contents = format!(
            "signing={}\nseal={}\n",
            hex_encode(self.signing_key.as_bytes()),
            hex_encode(self.seal_key.as_bytes()),
        );
        fs::write(path, contents).map_err(|e| NodeError::Identity(e.to_string()))
    }

    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| NodeError::Identity(e.to_string()))?;
        let mut signing = None;
        let mut seal = None;
        for line in raw.lines() {
            if let Some(hex) = line.strip_prefix("signing=") {
                signing = Some(hex_decode_32(hex)?);
            } else if let Some(hex) = line.strip_prefix("seal=") {
                seal = Some(hex_decode_32(hex)?);
            }
        }
        let signing = signing.ok_or_else(|| NodeError::Identity("identity file missing signing key".to_string()))?;
        let seal = seal.ok_or_else(|| NodeError::Identity("identity file missing seal key".to_string()))?;
        Ok(Self::from_secrets(signing, seal))
    }

    /// Env vars take priority (hex-encoded secrets, never logged), then an
    /// on-disk keyfile, then generate-and-persist a fresh identity.
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if let (Ok(signing_hex), Ok(seal_hex)) =
            (std::env::var("STARLING_SIGNING_KEY"), std::env::var("STARLING_SEAL_KEY"))
        {
            return Ok(Self::from_secrets(hex_decode_32(&signing_hex)?, hex_decode_32(&seal_hex)?));
        }
        if path.exists() {
            return Self::load(path);
        }
        let identity = Self::generate();
        identity.save(path)?;
        Ok(identity)
    }
}

impl std::fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeIdentity").field("peer", &self.peer).finish_non_exhaustive()
    }
}
