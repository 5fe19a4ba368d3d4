//! Serde implementations for crypto newtypes.
//!
//! All types serialize as hex (or `star1...` for PeerId) in human-readable
//! formats like JSON, and as raw bytes in binary formats like CBOR.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{Hash, PeerId, PublicKey, SealPublicKey, Signature};

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("invalid hex: {e}")))
        .collect()
}

macro_rules! hex_serde {
    ($ty:ty, $len:expr, $ctor:expr) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&to_hex(&self.0))
                } else {
                    serializer.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let bytes = if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    from_hex(&s).map_err(de::Error::custom)?
                } else {
                    Vec::deserialize(deserializer)?
                };
                if bytes.len() != $len {
                    return Err(de::Error::custom(format!(
                        "{} must be {} bytes, got {}",
                        stringify!($ty),
                        $len,
                        bytes.len()
                    )));
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(&bytes);
                Ok($ctor(arr))
            }
        }
    };
}

hex_serde!(Hash, 32, Hash);
hex_serde!(PublicKey, 32, PublicKey);
hex_serde!(Signature, 64, Signature);
hex_serde!(SealPublicKey, 32, SealPublicKey);

impl Serialize for PeerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&crate::peer_id_to_string(self))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            crate::peer_id_from_string(&s).map_err(de::Error::custom)
        } else {
            let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
            if bytes.len() != 32 {
                return Err(de::Error::custom(format!(
                    "PeerId must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            Ok(PeerId(arr))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{content_hash, generate_identity, peer_id_from_public_key, sign};

    #[test]
    fn hash_serde_json_roundtrip() {
        let hash = content_hash(b"test content");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json.len(), 66);
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn peer_id_serde_json_uses_prefix() {
        let (_, public_key) = generate_identity();
        let peer_id = peer_id_from_public_key(&public_key);
        let json = serde_json::to_string(&peer_id).unwrap();
        assert!(json.contains("star1"));
        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, peer_id);
    }

    #[test]
    fn signature_serde_json_roundtrip() {
        let (sk, _) = generate_identity();
        let sig = sign(&sk, b"test message");
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn rejects_short_hash() {
        let result: Result<Hash, _> = serde_json::from_str("\"aabbccdd\"");
        assert!(result.is_err());
    }
}
