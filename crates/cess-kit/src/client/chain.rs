//! The chain-client boundary.
//!
//! Storage-key hashing, RPC dispatch and metadata-driven event decoding are
//! provided by an underlying chain-client library. This module defines the
//! object-safe traits that library is consumed through, so any RPC backend
//! (or an in-memory test node) can be plugged into [`Cess`](crate::Cess).

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::error;

use crate::error::ChainError;
use crate::types::{
    BlockHash, ChainProperties, EventRecord, RuntimeMetadata, RuntimeVersion, StorageKey, TxHash,
};

/// Boxed future returned by collaborator methods.
pub type ChainFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ChainError>> + Send + 'a>>;

/// Opens connections to nodes.
pub trait Connector: Send + Sync {
    /// Connect to `endpoint` and complete the handshake.
    fn connect<'a>(&'a self, endpoint: &'a str) -> ChainFuture<'a, Arc<dyn ChainClient>>;
}

/// A live connection to one node.
pub trait ChainClient: Send + Sync {
    /// Fetch and decode the runtime metadata.
    fn metadata(&self) -> ChainFuture<'_, RuntimeMetadata>;

    /// Fetch the genesis block hash.
    fn genesis_hash(&self) -> ChainFuture<'_, BlockHash>;

    /// Fetch the current runtime version.
    fn runtime_version(&self) -> ChainFuture<'_, RuntimeVersion>;

    /// Fetch the chain properties (token symbol, decimals, address format).
    fn properties(&self) -> ChainFuture<'_, ChainProperties>;

    /// Build the hashed key of a storage item. `keys` are the SCALE-encoded
    /// map keys, in order.
    fn storage_key(
        &self,
        metadata: &RuntimeMetadata,
        pallet: &str,
        item: &str,
        keys: &[Vec<u8>],
    ) -> Result<StorageKey, ChainError>;

    /// Read a raw storage value, at `at` or at the best block.
    /// `Ok(None)` if the value is not set.
    fn storage<'a>(
        &'a self,
        key: &'a StorageKey,
        at: Option<BlockHash>,
    ) -> ChainFuture<'a, Option<Vec<u8>>>;

    /// Submit an encoded extrinsic and watch its status.
    fn submit_and_watch(&self, extrinsic: Vec<u8>) -> ChainFuture<'_, TxWatch>;

    /// Decode a raw `System.Events` value.
    fn decode_events(
        &self,
        metadata: &RuntimeMetadata,
        raw: &[u8],
    ) -> Result<Vec<EventRecord>, ChainError>;
}

// ============================================================================
// Transaction status subscription
// ============================================================================

/// A status notification for a watched extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Future,
    Ready,
    Broadcast(Vec<String>),
    InBlock(BlockHash),
    Retracted(BlockHash),
    FinalityTimeout(BlockHash),
    Finalized(BlockHash),
    Usurped(TxHash),
    Dropped,
    Invalid,
}

/// An open status subscription.
///
/// Yields status notifications and, in parallel, transport errors. The
/// node-side subscription is released when the watch is dropped.
pub struct TxWatch {
    pub(crate) statuses: BoxStream<'static, TxStatus>,
    pub(crate) errors: BoxStream<'static, ChainError>,
    pub(crate) guard: SubscriptionGuard,
}

impl TxWatch {
    /// Bundle the two streams with the hook that unsubscribes on the node.
    pub fn new(
        statuses: BoxStream<'static, TxStatus>,
        errors: BoxStream<'static, ChainError>,
        on_unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            statuses,
            errors,
            guard: SubscriptionGuard::new(on_unsubscribe),
        }
    }
}

impl fmt::Debug for TxWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxWatch").finish_non_exhaustive()
    }
}

/// Runs the unsubscribe hook exactly once, on drop.
pub(crate) struct SubscriptionGuard {
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    fn new(on_drop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_drop: Some(Box::new(on_drop)),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.on_drop.take() {
            unsubscribe();
        }
    }
}

/// Run a synchronous collaborator call, turning a panic into a decode error.
pub(crate) fn guard_panic<T>(
    what: &str,
    f: impl FnOnce() -> Result<T, ChainError>,
) -> Result<T, ChainError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(what, panic = %message, "Recovered panic in chain client");
            Err(ChainError::Decode(format!("panic in {what}: {message}")))
        }
    }
}
