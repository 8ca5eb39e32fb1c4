//! Error types for cess-kit.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) — Main error type, returned by every SDK operation
//!   - [`ChainError`] — failures reported by the chain-client collaborator
//!     (transport loss, RPC errors, undecodable payloads, node-side rejection)
//!   - [`InputError`] — caller input rejected before any network call
//!     - [`ParseHashError`], [`ParseKeyError`], [`ParseAddressError`]
//!   - [`SignerError`] — key loading and signing failures
//!   - [`ErasureError`] — segment encode/restore failures
//!
//! None of these are retried automatically. A caller that wants to retry a
//! transaction re-invokes the whole operation so that a fresh nonce is read.
//!
//! # Example
//!
//! ```rust,no_run
//! use cess_kit::*;
//!
//! # async fn example(cess: Cess) -> Result<(), Error> {
//! let owner = cess.signer_public_key().unwrap().clone();
//! match cess.create_bucket(&owner, "photos").await {
//!     Ok(receipt) => println!("included in {}", receipt.block_hash),
//!     Err(Error::ConnectionUnavailable) => cess.reconnect().await?,
//!     Err(Error::SubmissionTimedOut { tx_hash, .. }) => {
//!         println!("{} may still land later", tx_hash);
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::{BlockHash, TxHash};

/// Error parsing a 32-byte hash or a fixed-length content hash.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid character {0:?} in content hash")]
    InvalidCharacter(char),
}

/// Error parsing a public or secret key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Error parsing an SS58 address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid address length: {0} bytes")]
    InvalidLength(usize),

    #[error("Unsupported address prefix byte: {0:#04x}")]
    InvalidPrefix(u8),

    #[error("Address checksum mismatch")]
    InvalidChecksum,
}

/// Error during key loading or signing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Invalid seed phrase")]
    InvalidSeedPhrase,

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Caller input rejected before anything is sent to the node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid content hash: {0}")]
    Hash(#[from] ParseHashError),

    #[error("Invalid address: {0}")]
    Address(#[from] ParseAddressError),

    #[error("Invalid key: {0}")]
    Key(#[from] ParseKeyError),

    #[error("Invalid peer id: expected {expected} bytes, got {actual}")]
    PeerId { expected: usize, actual: usize },

    #[error("Unknown role name: '{0}'")]
    UnknownRole(String),

    #[error("Invalid bucket name: {0}")]
    BucketName(String),

    #[error("An earnings account is required to register a storage provider")]
    MissingEarningsAccount,
}

// ============================================================================
// Chain collaborator errors
// ============================================================================

/// Failures reported by the chain-client collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error: {message} (code: {code})")]
    Rpc { code: i64, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Extrinsic rejected: {0}")]
    Rejected(String),

    #[error("Status subscription closed before inclusion")]
    SubscriptionClosed,
}

impl ChainError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        ChainError::Transport(message.into())
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        ChainError::Decode(message.into())
    }

    /// Returns true if the connection to the node itself is gone.
    ///
    /// Transport failures clear the liveness flag of the session they were
    /// observed on, so later callers fail fast with
    /// [`Error::ConnectionUnavailable`].
    pub fn is_transport(&self) -> bool {
        matches!(self, ChainError::Transport(_))
    }
}

/// Error during erasure coding of a segment file.
#[derive(Debug, Error)]
pub enum ErasureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("Invalid segment size: expected {expected} bytes, got {actual}")]
    InvalidSize { expected: u64, actual: u64 },

    #[error("Invalid shard configuration: {0}")]
    Config(String),

    #[error("Reed-Solomon error: {0}")]
    Codec(String),

    #[error("Shards failed verification after reconstruction")]
    Corrupted,
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for cess-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Connection ───
    #[error("Chain connection unavailable; reconnect before submitting")]
    ConnectionUnavailable,

    #[error("No reachable endpoint among {attempted:?}")]
    NoReachableEndpoint {
        attempted: Vec<String>,
        last_error: Option<ChainError>,
    },

    // ─── Configuration ───
    #[error("No signer configured. Call .mnemonic() or .signer() on CessBuilder.")]
    NoSigner,

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ─── Input ───
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    // ─── Account ───
    #[error("Account lookup failed: {0}")]
    AccountLookupFailed(#[source] ChainError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // ─── Transaction ───
    #[error("Cannot construct call {call}: {reason}")]
    CallConstructionFailed { call: String, reason: String },

    #[error("Signing failed: {0}")]
    SigningFailed(#[from] SignerError),

    #[error("Submission rejected: {source}")]
    SubmissionRejected {
        tx_hash: Option<TxHash>,
        source: ChainError,
    },

    #[error("Transaction {tx_hash} was not included within {timeout:?}")]
    SubmissionTimedOut { tx_hash: TxHash, timeout: Duration },

    #[error("Cannot decode events of block {block_hash}: {reason}")]
    EventDecodeFailed {
        tx_hash: TxHash,
        block_hash: BlockHash,
        reason: String,
    },

    #[error("Transaction failed: event {event} not found in block {block_hash}")]
    ExpectedEventAbsent {
        tx_hash: TxHash,
        block_hash: BlockHash,
        event: String,
    },

    // ─── Queries ───
    #[error("Storage query failed: {0}")]
    Query(#[source] ChainError),

    #[error("Cannot decode storage value {item}: {reason}")]
    StorageDecode { item: String, reason: String },

    // ─── Erasure coding ───
    #[error(transparent)]
    Erasure(#[from] ErasureError),

    // ─── Serialization ───
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The transaction hash this error refers to, if the extrinsic was built.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Error::SubmissionRejected { tx_hash, .. } => *tx_hash,
            Error::SubmissionTimedOut { tx_hash, .. }
            | Error::EventDecodeFailed { tx_hash, .. }
            | Error::ExpectedEventAbsent { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }

    /// Returns true if this error means the caller input was malformed.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<ParseHashError> for Error {
    fn from(e: ParseHashError) -> Self {
        Error::InvalidInput(e.into())
    }
}

impl From<ParseAddressError> for Error {
    fn from(e: ParseAddressError) -> Self {
        Error::InvalidInput(e.into())
    }
}

impl From<ParseKeyError> for Error {
    fn from(e: ParseKeyError) -> Self {
        Error::InvalidInput(e.into())
    }
}
