//! A transaction lifecycle client for the CESS storage chain.
//!
//! **cess-kit** signs, submits and confirms CESS extrinsics: bucket and file
//! management, storage proofs and role registration for gateways and storage
//! providers. Every transaction is confirmed by its inclusion in a block and
//! by the pallet event that proves it took effect.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cess_kit::*;
//!
//! # async fn example(connector: Arc<dyn Connector>) -> Result<(), Error> {
//! // Configure once
//! let cess = Cess::builder(["wss://testnet-rpc0.cess.cloud/ws/"])
//!     .mnemonic("bottom drive obey lake curtain smoke basket hold race lonely fit walk")?
//!     .connect(connector)
//!     .await?;
//!
//! // Create a bucket and wait for the chain to confirm it
//! let owner = *cess.signer_public_key().unwrap();
//! let receipt = cess.create_bucket(&owner, "photos").await?;
//! println!("Included in {}", receipt.block_hash);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! 1. **Single entry point**: Everything hangs off the [`Cess`] client
//! 2. **One transaction at a time**: Submissions from one client are serialized
//!    so every transaction gets a fresh, distinct nonce
//! 3. **Confirmed or failed**: A call returns only once the transaction is in a
//!    block with its success event, or with a specific [`Error`]
//! 4. **Pluggable transport**: RPC, storage hashing and event decoding come from
//!    a [`ChainClient`]
//!
//! # Core Types
//!
//! - [`PublicKey`], [`SecretKey`] - sr25519 (default) and ed25519 keys, SS58 addresses
//! - [`FileHash`] - 64-character content hash
//! - [`PeerId`] - 38-byte network address of a gateway or storage provider
//! - [`H256`] - 32-byte block and transaction hash
//!
//! # Erasure Coding
//!
//! The [`erasure`] module splits file segments into Reed-Solomon shards and
//! restores them.

pub mod client;
pub mod erasure;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    ChainError, ErasureError, Error, InputError, ParseAddressError, ParseHashError, ParseKeyError,
    SignerError,
};
pub use types::*;

// Re-export client types
pub use client::{
    AccountState, Cess, CessBuilder, ChainClient, ChainFuture, ChainSession, ConnectionManager,
    Connector, DEFAULT_TX_TIMEOUT, InMemorySigner, MAX_SUBMITTED_IDLE_FILE_META,
    RegistrationAction, RoleRegistration, SdkConfig, SignFuture, Signer, SigningIdentity,
    SigningKey, TxKind, TxReceipt, TxStatus, TxWatch,
};
