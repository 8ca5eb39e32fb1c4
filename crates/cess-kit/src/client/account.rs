//! Account resolution.
//!
//! The signing account's record is read fresh from `System.Account` right
//! before every extrinsic is built. Nothing here is cached: the nonce must
//! reflect every transaction already consumed.

use parity_scale_codec::Decode;
use tracing::trace;

use super::chain::guard_panic;
use super::session::ChainSession;
use crate::error::{ChainError, Error};
use crate::types::{AccountInfo, PublicKey};

/// The on-chain state of an account at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    /// The account exists.
    Existing(AccountInfo),
    /// No record: a fresh account that has never held funds.
    NotFound,
}

impl AccountState {
    /// The nonce the next extrinsic must use. Zero for a fresh account.
    pub fn next_nonce(&self) -> u32 {
        match self {
            AccountState::Existing(info) => info.nonce,
            AccountState::NotFound => 0,
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, AccountState::Existing(_))
    }
}

/// Read the current account record of `public_key`.
pub(crate) async fn resolve(
    session: &ChainSession,
    public_key: &PublicKey,
) -> Result<AccountState, ChainError> {
    let key = guard_panic("storage_key", || {
        session.client().storage_key(
            session.metadata(),
            "System",
            "Account",
            &[public_key.as_bytes().to_vec()],
        )
    })?;

    let Some(raw) = session.client().storage(&key, None).await? else {
        trace!(account = %public_key, "Account not found");
        return Ok(AccountState::NotFound);
    };

    let info = AccountInfo::decode(&mut raw.as_slice())
        .map_err(|e| ChainError::decode(format!("System.Account: {e}")))?;
    trace!(account = %public_key, nonce = info.nonce, "Account resolved");
    Ok(AccountState::Existing(info))
}

/// Whether a submission may proceed for an account without a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccountPolicy {
    /// A missing account is an error.
    RequireExisting,
    /// A missing account submits with nonce 0 (first registration).
    AllowNew,
}

impl AccountPolicy {
    pub(crate) fn nonce_for(
        self,
        state: &AccountState,
        address: &str,
    ) -> Result<u32, Error> {
        match (self, state) {
            (AccountPolicy::RequireExisting, AccountState::NotFound) => {
                Err(Error::AccountNotFound(address.to_string()))
            }
            _ => Ok(state.next_nonce()),
        }
    }
}
