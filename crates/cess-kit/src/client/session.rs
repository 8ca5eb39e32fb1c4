//! Connection management.
//!
//! A [`ChainSession`] is an immutable snapshot of one node connection together
//! with everything derived from it at handshake time. The
//! [`ConnectionManager`] owns the current session and a liveness flag and swaps
//! the session wholesale on reconnect. Readers clone the `Arc` and keep using
//! their snapshot even if a reconnect happens meanwhile.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::chain::{ChainClient, Connector, guard_panic};
use crate::error::{ChainError, Error};
use crate::types::{BlockHash, ChainProperties, RuntimeMetadata, RuntimeVersion, StorageKey};

/// A fully initialized connection to one node.
pub struct ChainSession {
    client: Arc<dyn ChainClient>,
    endpoint: String,
    metadata: RuntimeMetadata,
    genesis_hash: BlockHash,
    runtime_version: RuntimeVersion,
    properties: ChainProperties,
    events_key: StorageKey,
}

impl ChainSession {
    /// Connect to `endpoint` and fetch everything a session needs.
    ///
    /// Fails unless every part is present, so a half-built session never
    /// escapes this function.
    async fn establish(connector: &dyn Connector, endpoint: &str) -> Result<Self, ChainError> {
        let client = connector.connect(endpoint).await?;

        let metadata = client.metadata().await?;
        if metadata.is_empty() {
            return Err(ChainError::decode("runtime metadata has no pallets"));
        }
        if !metadata.has_storage("System", "Events") {
            return Err(ChainError::decode("runtime metadata lacks System.Events"));
        }

        let genesis_hash = client.genesis_hash().await?;
        if genesis_hash.is_zero() {
            return Err(ChainError::decode("genesis hash is zero"));
        }

        let runtime_version = client.runtime_version().await?;
        let properties = client.properties().await?;

        let events_key = guard_panic("storage_key", || {
            client.storage_key(&metadata, "System", "Events", &[])
        })?;
        if events_key.is_empty() {
            return Err(ChainError::decode("empty System.Events storage key"));
        }

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            metadata,
            genesis_hash,
            runtime_version,
            properties,
            events_key,
        })
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// The endpoint this session is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn metadata(&self) -> &RuntimeMetadata {
        &self.metadata
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis_hash
    }

    pub fn runtime_version(&self) -> &RuntimeVersion {
        &self.runtime_version
    }

    pub fn properties(&self) -> &ChainProperties {
        &self.properties
    }

    /// Storage key of the `System.Events` log.
    pub fn events_key(&self) -> &StorageKey {
        &self.events_key
    }
}

impl std::fmt::Debug for ChainSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSession")
            .field("endpoint", &self.endpoint)
            .field("genesis_hash", &self.genesis_hash)
            .field("runtime_version", &self.runtime_version)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

#[derive(Default)]
struct ConnectionState {
    session: Option<Arc<ChainSession>>,
    live: bool,
}

/// Owns the current [`ChainSession`] and its liveness flag.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    endpoints: Vec<String>,
    state: RwLock<ConnectionState>,
    reconnect_lock: Mutex<()>,
}

impl ConnectionManager {
    /// Create a manager and connect to the first reachable endpoint.
    pub async fn connect(
        connector: Arc<dyn Connector>,
        endpoints: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, Error> {
        let endpoints: Vec<String> = endpoints
            .into_iter()
            .map(Into::into)
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if endpoints.is_empty() {
            return Err(Error::Config("no RPC endpoints configured".to_string()));
        }

        let manager = Self {
            connector,
            endpoints,
            state: RwLock::new(ConnectionState::default()),
            reconnect_lock: Mutex::new(()),
        };
        manager.reconnect().await?;
        Ok(manager)
    }

    /// Try every endpoint in order and publish the first complete session.
    ///
    /// On failure the liveness flag stays cleared and the previous session is
    /// left in place but unusable for submissions.
    pub async fn reconnect(&self) -> Result<(), Error> {
        let _serial = self.reconnect_lock.lock().await;

        let mut last_error = None;
        for endpoint in &self.endpoints {
            debug!(endpoint = %endpoint, "Connecting");
            match ChainSession::establish(&*self.connector, endpoint).await {
                Ok(session) => {
                    info!(
                        endpoint = %endpoint,
                        genesis = %session.genesis_hash,
                        spec_version = session.runtime_version.spec_version,
                        "Chain session established"
                    );
                    let mut state = self.write();
                    state.session = Some(Arc::new(session));
                    state.live = true;
                    return Ok(());
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Endpoint unreachable");
                    last_error = Some(e);
                }
            }
        }

        self.write().live = false;
        Err(Error::NoReachableEndpoint {
            attempted: self.endpoints.clone(),
            last_error,
        })
    }

    /// The last known liveness. Advisory only: a live flag does not
    /// guarantee the next request succeeds.
    pub fn is_live(&self) -> bool {
        self.read().live
    }

    /// The configured endpoints, in failover order.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// The current session snapshot, live or not.
    pub fn session(&self) -> Option<Arc<ChainSession>> {
        self.read().session.clone()
    }

    /// The current session, or `ConnectionUnavailable` if the link is down.
    pub(crate) fn live_session(&self) -> Result<Arc<ChainSession>, Error> {
        let state = self.read();
        match (&state.session, state.live) {
            (Some(session), true) => Ok(session.clone()),
            _ => Err(Error::ConnectionUnavailable),
        }
    }

    /// Clear the liveness flag after a transport failure on `session`.
    ///
    /// A failure seen on an older session does not affect a newer one.
    pub(crate) fn mark_unreachable(&self, session: &Arc<ChainSession>) {
        let mut state = self.write();
        let current = state
            .session
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, session));
        if current && state.live {
            warn!(endpoint = %session.endpoint, "Connection lost");
            state.live = false;
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ConnectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConnectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoints", &self.endpoints)
            .field("live", &self.is_live())
            .finish()
    }
}
