//! Integration tests for role registration, update and exit.

use cess_kit::*;
use parity_scale_codec::{Decode, Encode};

use crate::mock_node::*;

fn peer(byte: u8) -> [u8; 38] {
    [byte; 38]
}

fn earnings() -> String {
    bob().public_key().to_ss58(CESS_SS58_PREFIX)
}

// =============================================================================
// Gateway
// =============================================================================

#[tokio::test]
async fn test_gateway_first_registration_from_fresh_account() {
    // No System.Account record: registration submits with nonce 0
    let node = MockNode::new();
    let cess = connect(&node, &alice()).await;

    let outcome = cess
        .register_role(Role::Gateway, &peer(1), None, 0)
        .await
        .unwrap();

    assert_eq!(outcome.action, RegistrationAction::Registered);
    assert!(outcome.earnings_account.is_none());
    let receipt = outcome.receipt.unwrap();
    let submitted = &node.submissions()[0];
    assert_eq!(submitted.kind, TxKind::RegisterGateway);
    assert_eq!(submitted.nonce, 0);
    assert_eq!(submitted.tx_hash, receipt.tx_hash);

    let stored = cess
        .gateway_peer_id(&alice().public_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, PeerId::from_bytes(peer(1)));
}

#[tokio::test]
async fn test_gateway_same_peer_is_noop() {
    let node = funded_node(&alice(), 4);
    node.set_storage(
        "Oss",
        "Oss",
        &[alice().public_key().encode()],
        &PeerId::from_bytes(peer(1)),
    );
    let cess = connect(&node, &alice()).await;

    let outcome = cess
        .register_role(Role::Gateway, &peer(1), None, 0)
        .await
        .unwrap();

    assert_eq!(outcome.action, RegistrationAction::Unchanged);
    assert!(outcome.receipt.is_none());
    assert!(node.submissions().is_empty());
    assert_eq!(node.account_nonce(&alice().public_key()), Some(4));
}

#[tokio::test]
async fn test_gateway_new_peer_updates_address() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    cess.register_role(Role::Gateway, &peer(1), None, 0)
        .await
        .unwrap();
    let outcome = cess
        .register_role(Role::Gateway, &peer(2), None, 0)
        .await
        .unwrap();

    assert_eq!(outcome.action, RegistrationAction::AddressUpdated);
    let submissions = node.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[1].kind, TxKind::UpdateGatewayAddress);
    assert_eq!(submissions[1].nonce, 1);
    assert_eq!(submissions[1].args, PeerId::from_bytes(peer(2)).encode());
}

#[tokio::test]
async fn test_register_by_name() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let outcome = cess
        .register_role_by_name("DeOSS", &peer(3), None, 0)
        .await
        .unwrap();
    assert_eq!(outcome.action, RegistrationAction::Registered);
    assert_eq!(node.submissions()[0].kind, TxKind::RegisterGateway);

    let err = cess
        .register_role_by_name("validator", &peer(3), None, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(InputError::UnknownRole(_))));
}

#[tokio::test]
async fn test_exit_gateway() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    cess.register_role(Role::Gateway, &peer(1), None, 0)
        .await
        .unwrap();
    cess.exit_role(Role::Gateway).await.unwrap();

    assert_eq!(node.submissions()[1].kind, TxKind::ExitGateway);
    let stored = cess.gateway_peer_id(&alice().public_key()).await.unwrap();
    assert!(stored.is_none());
}

// =============================================================================
// Storage provider
// =============================================================================

#[tokio::test]
async fn test_storage_provider_registration() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let outcome = cess
        .register_role(Role::StorageProvider, &peer(5), Some(earnings().as_str()), 4000)
        .await
        .unwrap();

    assert_eq!(outcome.action, RegistrationAction::Registered);
    assert_eq!(outcome.earnings_account, Some(earnings()));

    let submitted = &node.submissions()[0];
    assert_eq!(submitted.kind, TxKind::RegisterStorageProvider);
    let (beneficiary, peer_id, collateral) =
        <(PublicKey, PeerId, u128)>::decode(&mut submitted.args.as_slice()).unwrap();
    assert_eq!(beneficiary, bob().public_key());
    assert_eq!(peer_id, PeerId::from_bytes(peer(5)));
    assert_eq!(collateral, 4000 * TOKEN_PRECISION);

    let miner = cess
        .storage_miner(&alice().public_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(miner.beneficiary, bob().public_key());
    assert_eq!(miner.collaterals, 4000 * TOKEN_PRECISION);
}

#[tokio::test]
async fn test_storage_provider_requires_earnings_account() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let err = cess
        .register_role(Role::StorageProvider, &peer(5), None, 4000)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidInput(InputError::MissingEarningsAccount)
    ));
    assert!(node.submissions().is_empty());
}

#[tokio::test]
async fn test_storage_provider_unchanged_reports_current_earnings() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    cess.register_role(Role::StorageProvider, &peer(5), Some(earnings().as_str()), 4000)
        .await
        .unwrap();
    let outcome = cess
        .register_role(Role::StorageProvider, &peer(5), None, 4000)
        .await
        .unwrap();

    assert_eq!(outcome.action, RegistrationAction::Unchanged);
    assert_eq!(outcome.earnings_account, Some(earnings()));
    assert_eq!(node.submissions().len(), 1);
}

#[tokio::test]
async fn test_storage_provider_updates() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    cess.register_role(Role::StorageProvider, &peer(5), Some(earnings().as_str()), 4000)
        .await
        .unwrap();

    let outcome = cess
        .register_role(Role::StorageProvider, &peer(6), None, 0)
        .await
        .unwrap();
    assert_eq!(outcome.action, RegistrationAction::AddressUpdated);
    assert_eq!(node.submissions()[1].kind, TxKind::UpdateStorageProviderAddress);

    let carol = SecretKey::from_bytes([0xc0; 32]).public_key();
    let outcome = cess
        .register_role(
            Role::StorageProvider,
            &peer(6),
            Some(carol.to_ss58(CESS_SS58_PREFIX).as_str()),
            0,
        )
        .await
        .unwrap();
    assert_eq!(outcome.action, RegistrationAction::EarningsUpdated);
    assert_eq!(outcome.earnings_account, Some(carol.to_ss58(CESS_SS58_PREFIX)));
    assert_eq!(node.submissions()[2].kind, TxKind::UpdateEarningsAccount);

    let miner = cess
        .storage_miner(&alice().public_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(miner.peer_id, PeerId::from_bytes(peer(6)));
    assert_eq!(miner.beneficiary, carol);
}

#[tokio::test]
async fn test_exit_storage_provider() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let receipt = cess.exit_role(Role::StorageProvider).await.unwrap();
    let submitted = &node.submissions()[0];
    assert_eq!(submitted.kind, TxKind::ExitStorageProvider);
    assert_eq!(submitted.tx_hash, receipt.tx_hash);
}

// =============================================================================
// Input validation
// =============================================================================

#[tokio::test]
async fn test_malformed_registration_input_is_rejected_locally() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let err = cess
        .register_role(Role::Gateway, &[1; 37], None, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidInput(InputError::PeerId {
            expected: 38,
            actual: 37
        })
    ));

    let err = cess
        .register_role(Role::StorageProvider, &peer(5), Some("not-an-address"), 0)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());

    assert_eq!(node.storage_reads(), 0);
    assert!(node.submissions().is_empty());
}
