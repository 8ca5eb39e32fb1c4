//! SCALE-encoded on-chain records.
//!
//! Field order matches the runtime's storage layout; do not reorder.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::{FileHash, PeerId, PublicKey};

/// `System.Account` balance part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AccountData {
    pub free: u128,
    pub reserved: u128,
    pub frozen: u128,
    pub flags: u128,
}

/// `System.Account` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct AccountInfo {
    pub nonce: u32,
    pub consumers: u32,
    pub providers: u32,
    pub sufficients: u32,
    pub data: AccountData,
}

/// `Sminer.MinerItems` record for a registered storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MinerInfo {
    pub beneficiary: PublicKey,
    pub peer_id: PeerId,
    pub collaterals: u128,
    pub debt: u128,
    pub state: Vec<u8>,
    pub idle_space: u128,
    pub service_space: u128,
    pub lock_space: u128,
}

impl MinerInfo {
    /// The miner state as text (`positive`, `frozen`, `exit`, ...).
    pub fn state_str(&self) -> String {
        String::from_utf8_lossy(&self.state).into_owned()
    }
}

/// `FileBank.Bucket` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct BucketInfo {
    pub object_list: Vec<FileHash>,
    pub authority: Vec<PublicKey>,
}

/// A segment and the fragments it was erasure-coded into.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct SegmentList {
    pub hash: FileHash,
    pub fragment_list: Vec<FileHash>,
}

/// The owner-side description of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct UserBrief {
    pub user: PublicKey,
    pub file_name: Vec<u8>,
    pub bucket_name: Vec<u8>,
}

impl UserBrief {
    pub fn new(user: PublicKey, file_name: &str, bucket_name: &str) -> Self {
        Self {
            user,
            file_name: file_name.as_bytes().to_vec(),
            bucket_name: bucket_name.as_bytes().to_vec(),
        }
    }
}

/// `FileBank.File` record.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct FileMetadata {
    pub segment_list: Vec<SegmentList>,
    pub owner: Vec<UserBrief>,
    pub file_size: u128,
    pub completion: u32,
    pub state: u8,
}

/// `FileBank.DealMap` record: an upload that has been declared but not yet
/// fully stored by the assigned miners.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StorageOrder {
    pub stage: u8,
    pub count: u8,
    pub file_size: u128,
    pub segment_list: Vec<SegmentList>,
    pub user: UserBrief,
    pub complete_list: Vec<PublicKey>,
}

/// Idle (filler) file metadata as submitted by a TEE worker.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct IdleMetadata {
    pub size: u64,
    pub block_num: u32,
    pub block_size: u32,
    pub scan_size: u32,
    pub acc: PublicKey,
    pub hash: FileHash,
}

/// Loosely typed idle file description, validated into [`IdleMetadata`]
/// before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleFileMeta {
    pub size: u64,
    pub block_num: u32,
    pub block_size: u32,
    pub scan_size: u32,
    pub miner_acc: Vec<u8>,
    pub hash: String,
}

impl IdleFileMeta {
    /// Validate into typed metadata; `None` if the account or hash is malformed.
    pub fn to_metadata(&self) -> Option<IdleMetadata> {
        let acc = PublicKey::try_from(self.miner_acc.as_slice()).ok()?;
        let hash = self.hash.parse().ok()?;
        Some(IdleMetadata {
            size: self.size,
            block_num: self.block_num,
            block_size: self.block_size,
            scan_size: self.scan_size,
            acc,
            hash,
        })
    }
}
