//! Deciding whether an included transaction succeeded.
//!
//! Every transaction kind has exactly one success event. Once the extrinsic
//! is in a block, that block's `System.Events` log is fetched and decoded,
//! and the transaction succeeded if and only if the event is present.
//!
//! A log that cannot be fetched or decoded is always an error
//! ([`Error::EventDecodeFailed`]), never a silent success.

use std::fmt::{self, Display};

use parity_scale_codec::{Decode, Encode};
use tracing::{debug, warn};

use super::chain::guard_panic;
use super::extrinsic::CallName;
use super::session::ChainSession;
use crate::error::{ChainError, Error};
use crate::types::{BlockHash, EventRecord, FileHash, PublicKey, TxHash};

/// A `Pallet.Event` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventName {
    pub pallet: &'static str,
    pub variant: &'static str,
}

impl EventName {
    const fn new(pallet: &'static str, variant: &'static str) -> Self {
        Self { pallet, variant }
    }
}

impl Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet, self.variant)
    }
}

/// The transactions this client submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    CreateBucket,
    DeleteBucket,
    UploadDeclaration,
    DeleteFile,
    FileReport,
    ReplaceIdleFiles,
    SubmitIdleMetadata,
    RegisterGateway,
    RegisterStorageProvider,
    UpdateGatewayAddress,
    UpdateStorageProviderAddress,
    UpdateEarningsAccount,
    ExitGateway,
    ExitStorageProvider,
}

impl TxKind {
    /// The runtime call this kind submits.
    pub fn call(self) -> CallName {
        match self {
            TxKind::CreateBucket => CallName::CREATE_BUCKET,
            TxKind::DeleteBucket => CallName::DELETE_BUCKET,
            TxKind::UploadDeclaration => CallName::UPLOAD_DECLARATION,
            TxKind::DeleteFile => CallName::DELETE_FILE,
            TxKind::FileReport => CallName::TRANSFER_REPORT,
            TxKind::ReplaceIdleFiles => CallName::REPLACE_FILE_REPORT,
            TxKind::SubmitIdleMetadata => CallName::UPLOAD_FILLER,
            TxKind::RegisterGateway => CallName::OSS_REGISTER,
            TxKind::RegisterStorageProvider => CallName::SMINER_REGISTER,
            TxKind::UpdateGatewayAddress => CallName::OSS_UPDATE,
            TxKind::UpdateStorageProviderAddress => CallName::SMINER_UPDATE_PEER_ID,
            TxKind::UpdateEarningsAccount => CallName::SMINER_UPDATE_BENEFICIARY,
            TxKind::ExitGateway => CallName::OSS_DESTROY,
            TxKind::ExitStorageProvider => CallName::MINER_EXIT_PREP,
        }
    }

    /// The event whose presence marks success.
    pub fn expected_event(self) -> EventName {
        match self {
            TxKind::CreateBucket => EventName::new("FileBank", "CreateBucket"),
            TxKind::DeleteBucket => EventName::new("FileBank", "DeleteBucket"),
            TxKind::UploadDeclaration => EventName::new("FileBank", "UploadDeclaration"),
            TxKind::DeleteFile => EventName::new("FileBank", "DeleteFile"),
            TxKind::FileReport => EventName::new("FileBank", "TransferReport"),
            TxKind::ReplaceIdleFiles => EventName::new("FileBank", "ReplaceFiller"),
            TxKind::SubmitIdleMetadata => EventName::new("FileBank", "FillerUpload"),
            TxKind::RegisterGateway => EventName::new("Oss", "OssRegister"),
            TxKind::RegisterStorageProvider => EventName::new("Sminer", "Registered"),
            TxKind::UpdateGatewayAddress => EventName::new("Oss", "OssUpdate"),
            TxKind::UpdateStorageProviderAddress => EventName::new("Sminer", "UpdataIp"),
            TxKind::UpdateEarningsAccount => EventName::new("Sminer", "UpdataBeneficiary"),
            TxKind::ExitGateway => EventName::new("Oss", "OssDestroy"),
            TxKind::ExitStorageProvider => EventName::new("Sminer", "MinerExitPrep"),
        }
    }
}

/// Find the first record matching `event`.
pub fn expect_event<'a>(records: &'a [EventRecord], event: EventName) -> Option<&'a EventRecord> {
    records.iter().find(|r| r.is(event.pallet, event.variant))
}

/// A transaction that was included and emitted its success event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    pub tx_hash: TxHash,
    pub block_hash: BlockHash,
    pub event: EventRecord,
}

impl Inclusion {
    /// Decode the success event's fields as `T`.
    pub fn payload<T: Decode>(&self) -> Result<T, Error> {
        self.event
            .decode_fields()
            .map_err(|e| Error::EventDecodeFailed {
                tx_hash: self.tx_hash,
                block_hash: self.block_hash,
                reason: format!("{}.{}: {e}", self.event.pallet, self.event.variant),
            })
    }
}

/// Fetch the raw event log of `block_hash`. `None` if the block has none.
pub(crate) async fn fetch_log(
    session: &ChainSession,
    block_hash: BlockHash,
) -> Result<Option<Vec<u8>>, ChainError> {
    session
        .client()
        .storage(session.events_key(), Some(block_hash))
        .await
}

/// Decode a block's event log and look for `kind`'s success event.
pub(crate) fn resolve(
    session: &ChainSession,
    kind: TxKind,
    tx_hash: TxHash,
    block_hash: BlockHash,
    raw: Option<&[u8]>,
) -> Result<Inclusion, Error> {
    let records = match raw {
        Some(raw) => guard_panic("decode_events", || {
            session.client().decode_events(session.metadata(), raw)
        })
        .map_err(|e| Error::EventDecodeFailed {
            tx_hash,
            block_hash,
            reason: e.to_string(),
        })?,
        None => Vec::new(),
    };
    debug!(tx_hash = %tx_hash, block = %block_hash, events = records.len(), "Event log decoded");

    let expected = kind.expected_event();
    match expect_event(&records, expected) {
        Some(event) => Ok(Inclusion {
            tx_hash,
            block_hash,
            event: event.clone(),
        }),
        None => {
            warn!(tx_hash = %tx_hash, block = %block_hash, event = %expected, "Expected event absent");
            Err(Error::ExpectedEventAbsent {
                tx_hash,
                block_hash,
                event: expected.to_string(),
            })
        }
    }
}

// ============================================================================
// Event payloads
// ============================================================================

/// Fields of `FileBank.DeleteFile`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DeleteFileEvent {
    pub operator: PublicKey,
    pub owner: PublicKey,
    pub failed_list: Vec<FileHash>,
}

/// Fields of `FileBank.TransferReport`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferReportEvent {
    pub acc: PublicKey,
    pub failed_list: Vec<FileHash>,
}

/// Fields of `FileBank.ReplaceFiller`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ReplaceFillerEvent {
    pub acc: PublicKey,
    pub filler_list: Vec<FileHash>,
}
