//! Cryptographic key types.
//!
//! Accounts are identified by a 32-byte public key (`AccountId32` on chain).
//! Keys are sr25519 by default, derived from mnemonics the same way Substrate
//! tooling derives them, so a phrase resolves to the same account it has on
//! chain. Ed25519 keys are supported as well. Signatures are tagged with
//! their key type and encode as the chain's `MultiSignature`.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use bip39::Mnemonic;
use ed25519_dalek::{Signer as _, Verifier as _, VerifyingKey};
use parity_scale_codec::{Decode, Encode, Input, Output};
use rand::RngCore;
use rand::rngs::OsRng;
use schnorrkel::{ExpansionMode, MiniSecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseAddressError, ParseKeyError, SignerError};

use super::address;

/// Signing context of sr25519 signatures on Substrate chains.
const SR25519_CONTEXT: &[u8] = b"substrate";

// ============================================================================
// KeyType
// ============================================================================

/// Signature scheme of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Schnorr over Ristretto25519, the Substrate default.
    #[default]
    Sr25519,
    Ed25519,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Sr25519 => "sr25519",
            KeyType::Ed25519 => "ed25519",
        }
    }

    /// Variant index in the chain's `MultiSignature` enum.
    pub fn multi_signature_index(&self) -> u8 {
        match self {
            KeyType::Ed25519 => 0,
            KeyType::Sr25519 => 1,
        }
    }

    fn from_multi_signature_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(KeyType::Ed25519),
            1 => Some(KeyType::Sr25519),
            _ => None,
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 32-byte account public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Create from raw 32 bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw 32 bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as an SS58 address with the given network prefix.
    pub fn to_ss58(&self, prefix: u16) -> String {
        address::encode(self, prefix)
    }

    /// Decode an SS58 address of any network prefix.
    pub fn from_ss58(s: &str) -> Result<Self, ParseAddressError> {
        address::decode(s).map(|(_, key)| key)
    }

    /// Verify a signature over `message`, using the signature's key type.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match signature.key_type {
            KeyType::Sr25519 => {
                let (Ok(key), Ok(sig)) = (
                    schnorrkel::PublicKey::from_bytes(&self.0),
                    schnorrkel::Signature::from_bytes(&signature.data),
                ) else {
                    return false;
                };
                key.verify_simple(SR25519_CONTEXT, message, &sig).is_ok()
            }
            KeyType::Ed25519 => {
                let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
                    return false;
                };
                let sig = ed25519_dalek::Signature::from_bytes(&signature.data);
                key.verify(message, &sig).is_ok()
            }
        }
    }
}

impl FromStr for PublicKey {
    type Err = ParseKeyError;

    /// Parse the `0x`-prefixed hex form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| ParseKeyError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = ParseKeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| ParseKeyError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SecretKey
// ============================================================================

/// A secret key: the 32-byte seed of an sr25519 or ed25519 key pair.
///
/// For sr25519 the seed is the mini secret key, expanded the way Substrate
/// expands it.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    key_type: KeyType,
    seed: [u8; 32],
}

impl SecretKey {
    /// Generate a new random sr25519 key.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_bytes(seed)
    }

    /// Create an sr25519 key from its 32-byte mini secret.
    pub const fn from_bytes(seed: [u8; 32]) -> Self {
        Self {
            key_type: KeyType::Sr25519,
            seed,
        }
    }

    /// Create an ed25519 key from its 32-byte seed.
    pub const fn ed25519_from_bytes(seed: [u8; 32]) -> Self {
        Self {
            key_type: KeyType::Ed25519,
            seed,
        }
    }

    /// Derive an sr25519 key from a BIP-39 mnemonic (no derivation path,
    /// empty password).
    pub fn from_mnemonic(phrase: &str) -> Result<Self, SignerError> {
        mnemonic_seed(phrase).map(Self::from_bytes)
    }

    /// Derive an ed25519 key from a BIP-39 mnemonic.
    pub fn ed25519_from_mnemonic(phrase: &str) -> Result<Self, SignerError> {
        mnemonic_seed(phrase).map(Self::ed25519_from_bytes)
    }

    /// Generate a fresh 12-word mnemonic and the sr25519 key derived from it.
    pub fn generate_with_mnemonic() -> Result<(String, Self), SignerError> {
        let phrase = generate_seed_phrase()?;
        let key = Self::from_mnemonic(&phrase)?;
        Ok((phrase, key))
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Get the raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.seed
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        match self.key_type {
            KeyType::Sr25519 => PublicKey(self.sr25519_keypair().public.to_bytes()),
            KeyType::Ed25519 => PublicKey(
                ed25519_dalek::SigningKey::from_bytes(&self.seed)
                    .verifying_key()
                    .to_bytes(),
            ),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let data = match self.key_type {
            KeyType::Sr25519 => {
                let context = schnorrkel::signing_context(SR25519_CONTEXT);
                self.sr25519_keypair()
                    .sign(context.bytes(message))
                    .to_bytes()
            }
            KeyType::Ed25519 => ed25519_dalek::SigningKey::from_bytes(&self.seed)
                .sign(message)
                .to_bytes(),
        };
        Signature {
            key_type: self.key_type,
            data,
        }
    }

    fn sr25519_keypair(&self) -> schnorrkel::Keypair {
        MiniSecretKey::from_bytes(&self.seed)
            .expect("mini secret key is 32 bytes")
            .expand_to_keypair(ExpansionMode::Ed25519)
    }
}

impl FromStr for SecretKey {
    type Err = SignerError;

    /// Parse a `0x`-prefixed hex sr25519 seed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let bytes =
            hex::decode(digits).map_err(|e| SignerError::InvalidSecretKey(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SignerError::InvalidSecretKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_bytes(arr))
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({}:{})", self.key_type, self.public_key())
    }
}

/// The 32-byte seed Substrate derives from a mnemonic: the first half of
/// PBKDF2-HMAC-SHA512 over the mnemonic's entropy.
fn mnemonic_seed(phrase: &str) -> Result<[u8; 32], SignerError> {
    let mnemonic = Mnemonic::parse(phrase.trim()).map_err(|_| SignerError::InvalidSeedPhrase)?;
    let seed = substrate_bip39::seed_from_entropy(&mnemonic.to_entropy(), "")
        .map_err(|_| SignerError::InvalidSeedPhrase)?;
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&seed[..32]);
    Ok(bytes)
}

/// Generate a random 12-word BIP-39 phrase.
pub fn generate_seed_phrase() -> Result<String, SignerError> {
    let mut entropy = [0u8; 16];
    OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| SignerError::KeyDerivationFailed(format!("failed to generate mnemonic: {e}")))?;
    Ok(mnemonic.to_string())
}

// ============================================================================
// Signature
// ============================================================================

/// A 64-byte signature tagged with its key type.
///
/// Encodes as the chain's `MultiSignature`: variant index, then the bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    key_type: KeyType,
    data: [u8; 64],
}

impl Signature {
    /// Create an sr25519 signature from raw 64 bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            key_type: KeyType::Sr25519,
            data: bytes,
        }
    }

    /// Create an ed25519 signature from raw 64 bytes.
    pub const fn ed25519_from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            key_type: KeyType::Ed25519,
            data: bytes,
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Get the raw 64 bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.data
    }
}

impl Encode for Signature {
    fn size_hint(&self) -> usize {
        65
    }

    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        dest.push_byte(self.key_type.multi_signature_index());
        dest.write(&self.data);
    }
}

impl Decode for Signature {
    fn decode<I: Input>(input: &mut I) -> Result<Self, parity_scale_codec::Error> {
        let key_type = KeyType::from_multi_signature_index(input.read_byte()?)
            .ok_or("unsupported MultiSignature variant")?;
        let data = <[u8; 64]>::decode(input)?;
        Ok(Self { key_type, data })
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}:0x{})", self.key_type, hex::encode(self.data))
    }
}
