//! Call construction, signing and extrinsic encoding.
//!
//! Wire format of a signed extrinsic (transaction version 4):
//!
//! ```text
//! Compact(len) ++ 0x84
//!     ++ MultiAddress::Id(0x00 ++ public key)
//!     ++ MultiSignature(0x01 sr25519 | 0x00 ed25519 ++ signature)
//!     ++ extra: era ++ Compact(nonce) ++ Compact(tip)
//!     ++ call: pallet index ++ call index ++ SCALE args
//! ```
//!
//! The signature covers `call ++ extra ++ spec_version ++ transaction_version
//! ++ genesis hash ++ era block hash`, hashed with blake2-256 first when the
//! payload exceeds 256 bytes.

use std::fmt::{self, Display};

use parity_scale_codec::{Compact, Encode};

use super::chain::guard_panic;
use super::session::ChainSession;
use super::signer::SigningKey;
use crate::error::{Error, SignerError};
use crate::types::{BlockHash, H256, PublicKey, RuntimeMetadata, TxHash};

/// Signed extrinsic, transaction format version 4.
const SIGNED_EXTRINSIC_V4: u8 = 0x84;
/// `MultiAddress::Id`
const ADDRESS_ID: u8 = 0x00;
/// Immortal era.
const ERA_IMMORTAL: u8 = 0x00;
/// Payloads longer than this are hashed before signing.
const MAX_UNHASHED_PAYLOAD: usize = 256;

/// A `Pallet.call` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallName {
    pub pallet: &'static str,
    pub call: &'static str,
}

impl CallName {
    pub const fn new(pallet: &'static str, call: &'static str) -> Self {
        Self { pallet, call }
    }

    pub const CREATE_BUCKET: Self = Self::new("FileBank", "create_bucket");
    pub const DELETE_BUCKET: Self = Self::new("FileBank", "delete_bucket");
    pub const UPLOAD_DECLARATION: Self = Self::new("FileBank", "upload_declaration");
    pub const DELETE_FILE: Self = Self::new("FileBank", "delete_file");
    pub const TRANSFER_REPORT: Self = Self::new("FileBank", "transfer_report");
    pub const REPLACE_FILE_REPORT: Self = Self::new("FileBank", "replace_file_report");
    pub const UPLOAD_FILLER: Self = Self::new("FileBank", "upload_filler");
    pub const MINER_EXIT_PREP: Self = Self::new("FileBank", "miner_exit_prep");
    pub const OSS_REGISTER: Self = Self::new("Oss", "register");
    pub const OSS_UPDATE: Self = Self::new("Oss", "update");
    pub const OSS_DESTROY: Self = Self::new("Oss", "destroy");
    pub const SMINER_REGISTER: Self = Self::new("Sminer", "regnstk");
    pub const SMINER_UPDATE_PEER_ID: Self = Self::new("Sminer", "update_peer_id");
    pub const SMINER_UPDATE_BENEFICIARY: Self = Self::new("Sminer", "update_beneficiary");
}

impl Display for CallName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet, self.call)
    }
}

// ============================================================================
// Calls
// ============================================================================

/// A call whose arguments are encoded but whose indices are not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    name: CallName,
    args: Vec<u8>,
}

impl PendingCall {
    /// Encode `args` (a value or tuple, in declaration order) for `name`.
    pub fn new<A: Encode + ?Sized>(name: CallName, args: &A) -> Result<Self, Error> {
        let args = guard_panic("call arguments", || Ok(args.encode())).map_err(|e| {
            Error::CallConstructionFailed {
                call: name.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { name, args })
    }

    pub fn name(&self) -> CallName {
        self.name
    }

    /// Resolve pallet and call indices against the runtime metadata.
    pub fn resolve(self, metadata: &RuntimeMetadata) -> Result<Call, Error> {
        let (pallet_index, call_index) = metadata
            .call_index(self.name.pallet, self.name.call)
            .ok_or_else(|| Error::CallConstructionFailed {
                call: self.name.to_string(),
                reason: "not found in runtime metadata".to_string(),
            })?;
        Ok(Call {
            name: self.name,
            pallet_index,
            call_index,
            args: self.args,
        })
    }
}

/// A call ready to be signed. Built per submission, never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    name: CallName,
    pallet_index: u8,
    call_index: u8,
    args: Vec<u8>,
}

impl Call {
    pub fn name(&self) -> CallName {
        self.name
    }

    pub fn indices(&self) -> (u8, u8) {
        (self.pallet_index, self.call_index)
    }
}

impl Encode for Call {
    fn size_hint(&self) -> usize {
        2 + self.args.len()
    }

    fn encode_to<T: parity_scale_codec::Output + ?Sized>(&self, dest: &mut T) {
        dest.push_byte(self.pallet_index);
        dest.push_byte(self.call_index);
        dest.write(&self.args);
    }
}

// ============================================================================
// Signing
// ============================================================================

/// Signed extension values for one extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOptions {
    pub nonce: u32,
    pub tip: u128,
    pub spec_version: u32,
    pub transaction_version: u32,
    pub genesis_hash: BlockHash,
    /// Era checkpoint; the genesis hash for immortal extrinsics.
    pub block_hash: BlockHash,
}

impl SignatureOptions {
    /// Immortal, tip-free options for the session's runtime.
    pub fn immortal(session: &ChainSession, nonce: u32) -> Self {
        let version = session.runtime_version();
        Self {
            nonce,
            tip: 0,
            spec_version: version.spec_version,
            transaction_version: version.transaction_version,
            genesis_hash: session.genesis_hash(),
            block_hash: session.genesis_hash(),
        }
    }

    fn encode_extra(&self, out: &mut Vec<u8>) {
        out.push(ERA_IMMORTAL);
        Compact(self.nonce).encode_to(out);
        Compact(self.tip).encode_to(out);
    }

    fn encode_additional(&self, out: &mut Vec<u8>) {
        self.spec_version.encode_to(out);
        self.transaction_version.encode_to(out);
        out.extend_from_slice(self.genesis_hash.as_bytes());
        out.extend_from_slice(self.block_hash.as_bytes());
    }
}

/// An encoded, signed extrinsic. Submitted at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExtrinsic {
    call: CallName,
    nonce: u32,
    signer: PublicKey,
    bytes: Vec<u8>,
    hash: TxHash,
}

impl SignedExtrinsic {
    /// Sign `call` with `key` and encode the extrinsic.
    pub async fn sign(
        call: &Call,
        options: &SignatureOptions,
        key: &SigningKey,
    ) -> Result<Self, SignerError> {
        let call_bytes = call.encode();

        let mut payload = call_bytes.clone();
        options.encode_extra(&mut payload);
        options.encode_additional(&mut payload);
        let signature = if payload.len() > MAX_UNHASHED_PAYLOAD {
            key.sign(H256::blake2_256(&payload).as_bytes()).await?
        } else {
            key.sign(&payload).await?
        };

        let mut body = Vec::with_capacity(1 + 33 + 65 + 16 + call_bytes.len());
        body.push(SIGNED_EXTRINSIC_V4);
        body.push(ADDRESS_ID);
        body.extend_from_slice(key.public_key().as_bytes());
        signature.encode_to(&mut body);
        options.encode_extra(&mut body);
        body.extend_from_slice(&call_bytes);

        let mut bytes = Compact(body.len() as u32).encode();
        bytes.extend_from_slice(&body);
        let hash = H256::blake2_256(&bytes);

        Ok(Self {
            call: call.name(),
            nonce: options.nonce,
            signer: *key.public_key(),
            bytes,
            hash,
        })
    }

    pub fn call(&self) -> CallName {
        self.call
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn signer(&self) -> &PublicKey {
        &self.signer
    }

    /// The transaction hash (blake2-256 of the encoded extrinsic).
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
