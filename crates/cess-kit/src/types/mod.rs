//! Core types for the CESS chain.
//!
//! Hand-written counterparts of the runtime types this client reads and
//! writes, SCALE encoded with `parity-scale-codec`.

pub mod address;
mod hash;
mod key;
mod metadata;
mod role;
mod storage;

pub use hash::{BlockHash, FileHash, H256, PeerId, TxHash};
pub use key::{KeyType, PublicKey, SecretKey, Signature, generate_seed_phrase};
pub use metadata::{
    ChainProperties, EventRecord, PalletMetadata, Phase, RuntimeMetadata, RuntimeVersion,
    StorageKey,
};
pub use role::Role;
pub use storage::{
    AccountData, AccountInfo, BucketInfo, FileMetadata, IdleFileMeta, IdleMetadata, MinerInfo,
    SegmentList, StorageOrder, UserBrief,
};

/// Default SS58 address prefix of the CESS network.
pub const CESS_SS58_PREFIX: u16 = 11330;

/// Planck units per whole token (18 decimals).
pub const TOKEN_PRECISION: u128 = 1_000_000_000_000_000_000;
