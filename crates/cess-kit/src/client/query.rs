//! Read-only storage queries.
//!
//! Queries do not consume a nonce, so they never take the submission lock and
//! may run concurrently with each other and with an in-flight transaction.
//! An unset storage value is `Ok(None)`, not an error.

use std::sync::Arc;

use parity_scale_codec::{DecodeAll, Encode};
use tracing::trace;

use super::account::{self, AccountState};
use super::chain::guard_panic;
use super::cess::Cess;
use super::session::ChainSession;
use crate::error::Error;
use crate::types::{
    AccountInfo, BucketInfo, FileHash, FileMetadata, MinerInfo, PeerId, PublicKey, StorageOrder,
};

impl Cess {
    /// Nonce and existence of `public_key`'s account, read fresh from the chain.
    pub async fn account_state(&self, public_key: &PublicKey) -> Result<AccountState, Error> {
        let session = self.live_session()?;
        account::resolve(&session, public_key).await.map_err(|e| {
            self.note_failure(&session, &e);
            Error::AccountLookupFailed(e)
        })
    }

    /// `System.Account` of `account`.
    pub async fn account_info(&self, account: &PublicKey) -> Result<Option<AccountInfo>, Error> {
        let session = self.live_session()?;
        self.read_storage(&session, "System", "Account", &[account.encode()])
            .await
    }

    /// The bucket `name` owned by `owner`.
    pub async fn bucket_info(
        &self,
        owner: &PublicKey,
        name: &str,
    ) -> Result<Option<BucketInfo>, Error> {
        let session = self.live_session()?;
        self.read_storage(
            &session,
            "FileBank",
            "Bucket",
            &[owner.encode(), name.encode()],
        )
        .await
    }

    /// Raw names of every bucket owned by `owner`.
    pub async fn bucket_list(&self, owner: &PublicKey) -> Result<Option<Vec<Vec<u8>>>, Error> {
        let session = self.live_session()?;
        self.read_storage(&session, "FileBank", "UserBucketList", &[owner.encode()])
            .await
    }

    /// Names of every bucket owned by `owner`; empty if there are none.
    pub async fn all_bucket_names(&self, owner: &PublicKey) -> Result<Vec<String>, Error> {
        let names = self.bucket_list(owner).await?.unwrap_or_default();
        Ok(names
            .iter()
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect())
    }

    /// Metadata of the file with content hash `file_hash`.
    pub async fn file_metadata(&self, file_hash: &str) -> Result<Option<FileMetadata>, Error> {
        let hash: FileHash = file_hash.parse()?;
        let session = self.live_session()?;
        self.read_storage(&session, "FileBank", "File", &[hash.encode()])
            .await
    }

    /// The pending storage order for `file_hash`, if its upload has not completed.
    pub async fn storage_order(&self, file_hash: &str) -> Result<Option<StorageOrder>, Error> {
        let hash: FileHash = file_hash.parse()?;
        let session = self.live_session()?;
        self.read_storage(&session, "FileBank", "DealMap", &[hash.encode()])
            .await
    }

    /// Number of idle files `miner` still has to replace.
    pub async fn pending_replacements(&self, miner: &PublicKey) -> Result<Option<u32>, Error> {
        let session = self.live_session()?;
        self.read_storage(
            &session,
            "FileBank",
            "PendingReplacements",
            &[miner.encode()],
        )
        .await
    }

    /// Registration record of the storage provider `miner`.
    pub async fn storage_miner(&self, miner: &PublicKey) -> Result<Option<MinerInfo>, Error> {
        let session = self.live_session()?;
        self.read_storage(&session, "Sminer", "MinerItems", &[miner.encode()])
            .await
    }

    /// The peer id registered by the gateway `account`.
    pub async fn gateway_peer_id(&self, account: &PublicKey) -> Result<Option<PeerId>, Error> {
        let session = self.live_session()?;
        self.read_storage(&session, "Oss", "Oss", &[account.encode()])
            .await
    }

    /// Read and decode one storage value through `session`.
    pub(crate) async fn read_storage<T: DecodeAll>(
        &self,
        session: &Arc<ChainSession>,
        pallet: &str,
        item: &str,
        keys: &[Vec<u8>],
    ) -> Result<Option<T>, Error> {
        let key = guard_panic("storage_key", || {
            session
                .client()
                .storage_key(session.metadata(), pallet, item, keys)
        })
        .map_err(Error::Query)?;

        let raw = session.client().storage(&key, None).await.map_err(|e| {
            self.note_failure(session, &e);
            Error::Query(e)
        })?;
        trace!(pallet, item, found = raw.is_some(), "Storage read");

        raw.map(|raw| {
            T::decode_all(&mut raw.as_slice()).map_err(|e| Error::StorageDecode {
                item: format!("{pallet}.{item}"),
                reason: e.to_string(),
            })
        })
        .transpose()
    }
}
