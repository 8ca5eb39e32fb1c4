//! Role registration, update and exit.
//!
//! Registration first reads the identity's current on-chain record and then
//! picks exactly one of: register, update the network address, update the
//! earnings account, or do nothing. The read and the submission happen under
//! one submission permit so no other transaction from this instance can land
//! in between.

use tracing::info;

use super::account::AccountPolicy;
use super::cess::{Cess, TxReceipt};
use super::events::TxKind;
use super::extrinsic::PendingCall;
use crate::error::{Error, InputError};
use crate::types::{MinerInfo, PeerId, PublicKey, Role, TOKEN_PRECISION};

/// What [`Cess::register_role`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    /// A new registration was submitted.
    Registered,
    /// The role existed with another network address; it was updated.
    AddressUpdated,
    /// The storage provider's earnings account was changed.
    EarningsUpdated,
    /// The on-chain record already matched; nothing was submitted.
    Unchanged,
}

/// Outcome of [`Cess::register_role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistration {
    pub action: RegistrationAction,
    /// The transaction, unless the action is `Unchanged`.
    pub receipt: Option<TxReceipt>,
    /// The earnings account in effect afterwards (storage providers only).
    pub earnings_account: Option<String>,
}

impl Cess {
    /// Register the signer for `role`, or bring an existing registration up
    /// to date.
    ///
    /// `peer_id` is the network address to advertise. For storage providers,
    /// `earnings` is the SS58 beneficiary account (required for a first
    /// registration) and `pledge` the collateral in whole tokens; both are
    /// ignored for gateways.
    pub async fn register_role(
        &self,
        role: Role,
        peer_id: &[u8],
        earnings: Option<&str>,
        pledge: u64,
    ) -> Result<RoleRegistration, Error> {
        let peer_id = PeerId::try_from(peer_id)?;
        let earnings = earnings.map(PublicKey::from_ss58).transpose()?;

        let permit = self.submission_permit().await;
        let signer = *self.identity()?.public_key();
        let session = self.live_session()?;

        let plan = match role {
            Role::Gateway => {
                let stored: Option<PeerId> = self
                    .read_storage(&session, "Oss", "Oss", &[signer.as_bytes().to_vec()])
                    .await?;
                plan_gateway(stored, peer_id)?
            }
            Role::StorageProvider => {
                let stored: Option<MinerInfo> = self
                    .read_storage(&session, "Sminer", "MinerItems", &[signer.as_bytes().to_vec()])
                    .await?;
                plan_storage_provider(stored, peer_id, earnings, pledge)?
            }
        };

        let prefix = self.ss58_prefix();
        let earnings_account = plan.earnings.map(|pk| pk.to_ss58(prefix));
        let Some((kind, call)) = plan.submit else {
            info!(role = %role, "Registration already up to date");
            return Ok(RoleRegistration {
                action: RegistrationAction::Unchanged,
                receipt: None,
                earnings_account,
            });
        };

        let inclusion = self
            .transact_locked(&permit, kind, call, AccountPolicy::AllowNew)
            .await?;
        info!(role = %role, action = ?plan.action, tx_hash = %inclusion.tx_hash, "Registration submitted");
        Ok(RoleRegistration {
            action: plan.action,
            receipt: Some(TxReceipt::new(&inclusion, ())),
            earnings_account,
        })
    }

    /// [`register_role`](Self::register_role) with a role name such as
    /// `"oss"`, `"deoss"`, `"bucket"` or `"sminer"`.
    pub async fn register_role_by_name(
        &self,
        role: &str,
        peer_id: &[u8],
        earnings: Option<&str>,
        pledge: u64,
    ) -> Result<RoleRegistration, Error> {
        let role: Role = role.parse()?;
        self.register_role(role, peer_id, earnings, pledge).await
    }

    /// Leave `role`. For storage providers this starts the exit procedure.
    pub async fn exit_role(&self, role: Role) -> Result<TxReceipt, Error> {
        let kind = match role {
            Role::Gateway => TxKind::ExitGateway,
            Role::StorageProvider => TxKind::ExitStorageProvider,
        };
        let inclusion = self.transact(kind, &()).await?;
        Ok(TxReceipt::new(&inclusion, ()))
    }
}

/// The decision taken from the pre-read.
#[derive(Debug)]
struct Plan {
    action: RegistrationAction,
    submit: Option<(TxKind, PendingCall)>,
    earnings: Option<PublicKey>,
}

impl Plan {
    fn unchanged(earnings: Option<PublicKey>) -> Self {
        Self {
            action: RegistrationAction::Unchanged,
            submit: None,
            earnings,
        }
    }

    fn submit(
        action: RegistrationAction,
        kind: TxKind,
        call: PendingCall,
        earnings: Option<PublicKey>,
    ) -> Self {
        Self {
            action,
            submit: Some((kind, call)),
            earnings,
        }
    }
}

fn plan_gateway(stored: Option<PeerId>, peer_id: PeerId) -> Result<Plan, Error> {
    let plan = match stored {
        Some(current) if current == peer_id => Plan::unchanged(None),
        Some(_) => Plan::submit(
            RegistrationAction::AddressUpdated,
            TxKind::UpdateGatewayAddress,
            PendingCall::new(TxKind::UpdateGatewayAddress.call(), &peer_id)?,
            None,
        ),
        None => Plan::submit(
            RegistrationAction::Registered,
            TxKind::RegisterGateway,
            PendingCall::new(TxKind::RegisterGateway.call(), &peer_id)?,
            None,
        ),
    };
    Ok(plan)
}

fn plan_storage_provider(
    stored: Option<MinerInfo>,
    peer_id: PeerId,
    earnings: Option<PublicKey>,
    pledge: u64,
) -> Result<Plan, Error> {
    let Some(miner) = stored else {
        let beneficiary = earnings.ok_or(InputError::MissingEarningsAccount)?;
        // u64::MAX * 10^18 fits in u128
        let collateral = u128::from(pledge) * TOKEN_PRECISION;
        let call = PendingCall::new(
            TxKind::RegisterStorageProvider.call(),
            &(beneficiary, peer_id, collateral),
        )?;
        return Ok(Plan::submit(
            RegistrationAction::Registered,
            TxKind::RegisterStorageProvider,
            call,
            Some(beneficiary),
        ));
    };

    if miner.peer_id != peer_id {
        return Ok(Plan::submit(
            RegistrationAction::AddressUpdated,
            TxKind::UpdateStorageProviderAddress,
            PendingCall::new(TxKind::UpdateStorageProviderAddress.call(), &peer_id)?,
            Some(miner.beneficiary),
        ));
    }

    match earnings {
        Some(beneficiary) if beneficiary != miner.beneficiary => Ok(Plan::submit(
            RegistrationAction::EarningsUpdated,
            TxKind::UpdateEarningsAccount,
            PendingCall::new(TxKind::UpdateEarningsAccount.call(), &beneficiary)?,
            Some(beneficiary),
        )),
        _ => Ok(Plan::unchanged(Some(miner.beneficiary))),
    }
}
