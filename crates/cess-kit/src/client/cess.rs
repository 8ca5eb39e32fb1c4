//! The main Cess client.

use std::sync::Arc;
use std::time::Duration;

use parity_scale_codec::Encode;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::account::{self, AccountPolicy};
use super::chain::Connector;
use super::confirm::{self, ConfirmationOutcome};
use super::events::{self, Inclusion, TxKind};
use super::extrinsic::{PendingCall, SignatureOptions, SignedExtrinsic};
use super::session::{ChainSession, ConnectionManager};
use super::signer::{InMemorySigner, Signer, SigningIdentity};
use crate::error::{ChainError, Error};
use crate::types::{BlockHash, CESS_SS58_PREFIX, PublicKey, TxHash};

/// How long a submission waits for block inclusion unless configured.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(15);

/// The result of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt<T = ()> {
    /// Hash of the submitted extrinsic.
    pub tx_hash: TxHash,
    /// Block the extrinsic was included in.
    pub block_hash: BlockHash,
    /// Data carried by the success event, if the call has any.
    pub payload: T,
}

impl<T> TxReceipt<T> {
    pub(crate) fn new(inclusion: &Inclusion, payload: T) -> Self {
        Self {
            tx_hash: inclusion.tx_hash,
            block_hash: inclusion.block_hash,
            payload,
        }
    }
}

/// The main client for the CESS chain.
///
/// Cloning is cheap; clones share the connection and the submission lock,
/// so transactions from all clones are serialized.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use cess_kit::*;
///
/// # async fn example(connector: Arc<dyn Connector>) -> Result<(), Error> {
/// let cess = Cess::builder(["wss://testnet-rpc0.cess.cloud/ws/"])
///     .mnemonic("bottom drive obey lake curtain smoke basket hold race lonely fit walk")?
///     .connect(connector)
///     .await?;
///
/// let owner = *cess.signer_public_key().unwrap();
/// let receipt = cess.create_bucket(&owner, "photos").await?;
/// println!("bucket created in block {}", receipt.block_hash);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cess {
    inner: Arc<CessInner>,
}

struct CessInner {
    connection: ConnectionManager,
    identity: Option<SigningIdentity>,
    timeout: Duration,
    ss58_prefix: u16,
    submission: Mutex<()>,
}

impl Cess {
    /// Create a builder for the given RPC endpoints (tried in order).
    pub fn builder(endpoints: impl IntoIterator<Item = impl Into<String>>) -> CessBuilder {
        CessBuilder::new(endpoints.into_iter().map(Into::into).collect())
    }

    /// Connect using a loaded [`SdkConfig`].
    pub async fn from_config(
        config: SdkConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Cess, Error> {
        config.into_builder()?.connect(connector).await
    }

    /// Whether the connection was live at last check.
    pub fn is_live(&self) -> bool {
        self.inner.connection.is_live()
    }

    /// Re-establish the chain session, trying every endpoint in order.
    pub async fn reconnect(&self) -> Result<(), Error> {
        self.inner.connection.reconnect().await
    }

    /// The current session snapshot.
    pub fn session(&self) -> Option<Arc<ChainSession>> {
        self.inner.connection.session()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.inner.connection
    }

    /// The public key of the configured signer.
    pub fn signer_public_key(&self) -> Option<&PublicKey> {
        self.inner.identity.as_ref().map(|i| i.public_key())
    }

    /// The SS58 address of the configured signer.
    pub fn signer_address(&self) -> Option<&str> {
        self.inner.identity.as_ref().map(|i| i.address())
    }

    pub fn ss58_prefix(&self) -> u16 {
        self.inner.ss58_prefix
    }

    /// The fixed inclusion timeout of this instance.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    // ========================================================================
    // Submission pipeline
    // ========================================================================

    /// Submit one transaction of `kind` and wait for its success event.
    pub(crate) async fn transact<A: Encode + ?Sized>(
        &self,
        kind: TxKind,
        args: &A,
    ) -> Result<Inclusion, Error> {
        let call = PendingCall::new(kind.call(), args)?;
        let permit = self.submission_permit().await;
        self.transact_locked(&permit, kind, call, AccountPolicy::RequireExisting)
            .await
    }

    /// Take the per-instance submission lock.
    ///
    /// Callers that must read chain state and then decide what to submit
    /// hold the permit across both steps.
    pub(crate) async fn submission_permit(&self) -> MutexGuard<'_, ()> {
        self.inner.submission.lock().await
    }

    /// Resolve the nonce, sign, submit and confirm `call` under `_permit`.
    pub(crate) async fn transact_locked(
        &self,
        _permit: &MutexGuard<'_, ()>,
        kind: TxKind,
        call: PendingCall,
        policy: AccountPolicy,
    ) -> Result<Inclusion, Error> {
        let identity = self.identity()?;
        let session = self.inner.connection.live_session()?;

        let call = call.resolve(session.metadata())?;
        let expected = kind.expected_event();
        if !session.metadata().has_event(expected.pallet, expected.variant) {
            return Err(Error::CallConstructionFailed {
                call: call.name().to_string(),
                reason: format!("runtime does not emit {expected}"),
            });
        }

        let account = account::resolve(&session, identity.public_key())
            .await
            .map_err(|e| {
                self.note_failure(&session, &e);
                Error::AccountLookupFailed(e)
            })?;
        let nonce = policy.nonce_for(&account, identity.address())?;

        let options = SignatureOptions::immortal(&session, nonce);
        let key = identity.signer().key();
        let extrinsic = SignedExtrinsic::sign(&call, &options, &key).await?;
        let tx_hash = extrinsic.hash();
        debug!(call = %call.name(), nonce, tx_hash = %tx_hash, "Submitting extrinsic");

        let watch = match session.client().submit_and_watch(extrinsic.into_bytes()).await {
            Ok(watch) => watch,
            Err(e) => {
                self.note_failure(&session, &e);
                warn!(tx_hash = %tx_hash, error = %e, "Submission failed");
                return Err(Error::SubmissionRejected {
                    tx_hash: Some(tx_hash),
                    source: e,
                });
            }
        };

        match confirm::await_inclusion(watch, self.inner.timeout, tx_hash).await {
            ConfirmationOutcome::Included(block_hash) => {
                info!(call = %call.name(), tx_hash = %tx_hash, block = %block_hash, "Included in block");
                let raw = events::fetch_log(&session, block_hash).await.map_err(|e| {
                    self.note_failure(&session, &e);
                    Error::EventDecodeFailed {
                        tx_hash,
                        block_hash,
                        reason: format!("cannot fetch event log: {e}"),
                    }
                })?;
                events::resolve(&session, kind, tx_hash, block_hash, raw.as_deref())
            }
            ConfirmationOutcome::SubmissionError(e) => {
                self.note_failure(&session, &e);
                warn!(tx_hash = %tx_hash, error = %e, "Transaction rejected");
                Err(Error::SubmissionRejected {
                    tx_hash: Some(tx_hash),
                    source: e,
                })
            }
            ConfirmationOutcome::TimedOut => Err(Error::SubmissionTimedOut {
                tx_hash,
                timeout: self.inner.timeout,
            }),
        }
    }

    pub(crate) fn identity(&self) -> Result<&SigningIdentity, Error> {
        self.inner.identity.as_ref().ok_or(Error::NoSigner)
    }

    pub(crate) fn live_session(&self) -> Result<Arc<ChainSession>, Error> {
        self.inner.connection.live_session()
    }

    /// Clear liveness if `error` means the transport is gone.
    pub(crate) fn note_failure(&self, session: &Arc<ChainSession>, error: &ChainError) {
        if error.is_transport() {
            self.inner.connection.mark_unreachable(session);
        }
    }
}

impl std::fmt::Debug for Cess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cess")
            .field("connection", &self.inner.connection)
            .field("signer", &self.signer_address())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

// ============================================================================
// CessBuilder
// ============================================================================

/// Builder for creating a [`Cess`] client.
///
/// # Example
///
/// ```rust,ignore
/// use cess_kit::*;
///
/// let cess = Cess::builder(["ws://127.0.0.1:9944", "ws://127.0.0.1:9945"])
///     .secret_key("0x...")?
///     .timeout(std::time::Duration::from_secs(30))
///     .connect(connector)
///     .await?;
/// ```
pub struct CessBuilder {
    endpoints: Vec<String>,
    signer: Option<Arc<dyn Signer>>,
    timeout: Duration,
    ss58_prefix: u16,
}

impl CessBuilder {
    fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            signer: None,
            timeout: DEFAULT_TX_TIMEOUT,
            ss58_prefix: CESS_SS58_PREFIX,
        }
    }

    /// Set the signer for transactions.
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Sign with the key derived from a BIP-39 mnemonic.
    pub fn mnemonic(self, phrase: impl AsRef<str>) -> Result<Self, Error> {
        let signer = InMemorySigner::from_mnemonic(phrase)?;
        Ok(self.signer(signer))
    }

    /// Sign with a `0x`-hex secret seed.
    pub fn secret_key(self, secret_key: impl AsRef<str>) -> Result<Self, Error> {
        let signer = InMemorySigner::new(secret_key)?;
        Ok(self.signer(signer))
    }

    /// Set how long a submission waits for block inclusion.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the SS58 prefix used to render addresses.
    pub fn ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }

    /// Connect to the first reachable endpoint and build the client.
    pub async fn connect(self, connector: Arc<dyn Connector>) -> Result<Cess, Error> {
        if self.timeout.is_zero() {
            return Err(Error::Config("transaction timeout must be non-zero".into()));
        }
        let connection = ConnectionManager::connect(connector, self.endpoints).await?;
        let identity = self
            .signer
            .map(|signer| SigningIdentity::new(signer, self.ss58_prefix));
        if let Some(identity) = &identity {
            info!(address = identity.address(), "Signer configured");
        }

        Ok(Cess {
            inner: Arc::new(CessInner {
                connection,
                identity,
                timeout: self.timeout,
                ss58_prefix: self.ss58_prefix,
                submission: Mutex::new(()),
            }),
        })
    }
}

// ============================================================================
// SdkConfig
// ============================================================================

/// Serializable client configuration.
///
/// ```json
/// {
///   "endpoints": ["ws://127.0.0.1:9944"],
///   "mnemonic": "bottom drive obey lake ...",
///   "timeout_secs": 15,
///   "ss58_prefix": 11330
/// }
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub endpoints: Vec<String>,
    pub mnemonic: Option<String>,
    pub timeout_secs: Option<u64>,
    pub ss58_prefix: Option<u16>,
}

impl SdkConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read configuration from environment variables.
    ///
    /// - `CESS_RPC_ENDPOINTS`: comma-separated endpoint list
    /// - `CESS_MNEMONIC` (optional): signer mnemonic
    /// - `CESS_TX_TIMEOUT_SECS` (optional): inclusion timeout in seconds
    /// - `CESS_SS58_PREFIX` (optional): address prefix
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, using the `from_env` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let endpoints = lookup("CESS_RPC_ENDPOINTS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let timeout_secs = lookup("CESS_TX_TIMEOUT_SECS")
            .map(|v| {
                v.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("CESS_TX_TIMEOUT_SECS is not a number: {v}"))
                })
            })
            .transpose()?;

        let ss58_prefix = lookup("CESS_SS58_PREFIX")
            .map(|v| {
                v.trim()
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("CESS_SS58_PREFIX is not a u16: {v}")))
            })
            .transpose()?;

        Ok(Self {
            endpoints,
            mnemonic: lookup("CESS_MNEMONIC").filter(|m| !m.trim().is_empty()),
            timeout_secs,
            ss58_prefix,
        })
    }

    /// Turn the configuration into a builder.
    pub fn into_builder(self) -> Result<CessBuilder, Error> {
        if self.endpoints.is_empty() {
            return Err(Error::Config("no RPC endpoints configured".into()));
        }
        let mut builder = Cess::builder(self.endpoints);
        if let Some(phrase) = self.mnemonic {
            builder = builder.mnemonic(phrase)?;
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(prefix) = self.ss58_prefix {
            builder = builder.ss58_prefix(prefix);
        }
        Ok(builder)
    }
}

impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("endpoints", &self.endpoints)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("ss58_prefix", &self.ss58_prefix)
            .finish()
    }
}
