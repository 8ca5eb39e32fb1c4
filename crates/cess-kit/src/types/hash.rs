//! Hash and fixed-length identifier types.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use blake2::Blake2b;
use blake2::digest::Digest;
use blake2::digest::consts::U32;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{InputError, ParseHashError};

type Blake2b256 = Blake2b<U32>;

/// A 32-byte hash used for block hashes, transaction hashes and the genesis hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Encode, Decode)]
pub struct H256([u8; 32]);

/// Hash of the block a transaction was included in.
pub type BlockHash = H256;

/// Hash of an encoded extrinsic, used as the transaction identifier.
pub type TxHash = H256;

impl H256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0; 32]);

    /// Hash the given data with blake2b-256.
    pub fn blake2_256(data: &[u8]) -> Self {
        Self(Blake2b256::digest(data).into())
    }

    /// Create from raw 32 bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw 32 bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a Vec<u8>.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl FromStr for H256 {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| ParseHashError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for H256 {
    type Error = ParseHashError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseHashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for H256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for H256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", self)
    }
}

impl Serialize for H256 {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// FileHash
// ============================================================================

/// Content hash of a file, segment or fragment.
///
/// On chain this is the 64 ASCII characters of a hex SHA-256 digest, stored
/// as a fixed 64-byte array. Parsing a string of any other length fails
/// before anything is sent to the node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct FileHash([u8; FileHash::LEN]);

impl FileHash {
    /// Length of a content hash in bytes.
    pub const LEN: usize = 64;

    /// Create from the raw 64 bytes.
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw 64 bytes.
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Parse every hash in a list, failing on the first malformed entry.
    pub fn parse_all<S: AsRef<str>>(hashes: &[S]) -> Result<Vec<FileHash>, ParseHashError> {
        hashes.iter().map(|h| h.as_ref().parse()).collect()
    }
}

impl FromStr for FileHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LEN {
            return Err(ParseHashError::InvalidLength {
                expected: Self::LEN,
                actual: s.len(),
            });
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseHashError::InvalidCharacter(c));
        }
        let mut arr = [0u8; Self::LEN];
        arr.copy_from_slice(s.as_bytes());
        Ok(Self(arr))
    }
}

impl Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl Debug for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHash({})", self)
    }
}

impl Serialize for FileHash {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FileHash {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// PeerId
// ============================================================================

/// Network address advertised by a storage provider or gateway (a 38-byte
/// libp2p peer id).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct PeerId([u8; PeerId::LEN]);

impl PeerId {
    /// Length of a peer id in bytes.
    pub const LEN: usize = 38;

    /// Create from the raw 38 bytes.
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw 38 bytes.
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PeerId {
    type Error = InputError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; Self::LEN] = bytes.try_into().map_err(|_| InputError::PeerId {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for PeerId {
    type Err = InputError;

    /// Parse the base58 text form of a peer id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec().map_err(|_| InputError::PeerId {
            expected: Self::LEN,
            actual: 0,
        })?;
        Self::try_from(bytes.as_slice())
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self)
    }
}
