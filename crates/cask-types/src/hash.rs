use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// Hex digits in a rendered hash; the key codec embeds exactly this many
/// between the key separators.
const HEX_LEN: usize = 64;

/// Content address of a chunk: the BLAKE3 digest of its payload.
///
/// A hash is only obtained by hashing a payload ([`ChunkHash::of`]) or by
/// parsing the hex form stored in keys and head records
/// ([`ChunkHash::from_hex`]), so every value in circulation addresses some
/// byte sequence. The hex rendering never contains the `/` key separator,
/// which lets hashes embed into the key namespace without escaping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkHash([u8; 32]);

impl ChunkHash {
    /// The content address of `data`. Identical payloads always produce the
    /// same hash, which is what deduplicates identical chunks.
    pub fn of(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Whether `data` is the payload this hash addresses.
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::of(data) == *self
    }

    /// Hex rendering, as embedded in store keys (64 digits, lowercase).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First eight hex digits, for log output.
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(8);
        hex
    }

    /// Parse the hex form back into a hash. Anything other than exactly 64
    /// hex digits is rejected, including the empty string.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        if s.len() != HEX_LEN {
            return Err(AddressError::InvalidLength {
                expected: HEX_LEN,
                actual: s.len(),
            });
        }
        let mut digest = [0u8; 32];
        hex::decode_to_slice(s, &mut digest)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(digest))
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({}..)", self.short_hex())
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
