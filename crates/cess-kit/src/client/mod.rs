//! Client module for submitting and confirming CESS transactions.
//!
//! - [`Cess`] — The main client, the single entry point for all operations
//! - [`CessBuilder`] — Fluent builder for configuring the client
//! - [`SdkConfig`] — Serializable configuration (JSON or environment)
//! - [`ConnectionManager`] — Owns the live [`ChainSession`] and reconnects
//!
//! # Transaction lifecycle
//!
//! Every transaction runs the same sequence under one per-instance lock:
//!
//! 1. liveness check
//! 2. call construction against the runtime metadata
//! 3. fresh account nonce read
//! 4. signing
//! 5. submission and [inclusion wait](ConfirmationOutcome)
//! 6. [success event lookup](TxKind::expected_event)
//!
//! Read-only queries skip the lock.
//!
//! # Chain client
//!
//! RPC transport, storage-key hashing and event decoding are provided by a
//! chain-client library plugged in through [`Connector`] and [`ChainClient`].

mod account;
mod cess;
mod chain;
mod confirm;
mod events;
mod extrinsic;
mod filebank;
mod query;
mod role;
mod session;
mod signer;

pub use account::AccountState;
pub use cess::{Cess, CessBuilder, DEFAULT_TX_TIMEOUT, SdkConfig, TxReceipt};
pub use chain::{ChainClient, ChainFuture, Connector, TxStatus, TxWatch};
pub use confirm::ConfirmationOutcome;
pub use events::{
    DeleteFileEvent, EventName, Inclusion, ReplaceFillerEvent, TransferReportEvent, TxKind,
    expect_event,
};
pub use extrinsic::{Call, CallName, PendingCall, SignatureOptions, SignedExtrinsic};
pub use filebank::MAX_SUBMITTED_IDLE_FILE_META;
pub use role::{RegistrationAction, RoleRegistration};
pub use session::{ChainSession, ConnectionManager};
pub use signer::{InMemorySigner, SignFuture, Signer, SigningBackend, SigningIdentity, SigningKey};
