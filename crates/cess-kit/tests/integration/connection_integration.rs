//! Integration tests for connection setup, failover and liveness.

use std::time::Duration;

use cess_kit::*;

use crate::mock_node::*;

const PRIMARY: &str = "ws://10.0.0.1:9944";
const SECONDARY: &str = "ws://10.0.0.2:9944";

#[tokio::test]
async fn test_connect_establishes_session() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    assert!(cess.is_live());
    let session = cess.session().unwrap();
    assert_eq!(session.endpoint(), ENDPOINT);
    assert_eq!(session.genesis_hash(), GENESIS);
    assert_eq!(session.runtime_version().spec_version, SPEC_VERSION);
    assert_eq!(session.properties().ss58_format, CESS_SS58_PREFIX);
    assert!(session.metadata().call_index("FileBank", "create_bucket").is_some());
    assert_eq!(cess.timeout(), DEFAULT_TX_TIMEOUT);
}

#[tokio::test]
async fn test_connect_falls_back_to_next_endpoint() {
    init_tracing();
    let connector = MockConnector::new(MockNode::new());
    connector.set_reachable(PRIMARY, false);

    let cess = Cess::builder([PRIMARY, SECONDARY])
        .connect(connector.clone())
        .await
        .unwrap();

    assert_eq!(cess.session().unwrap().endpoint(), SECONDARY);
    assert_eq!(connector.attempts(), vec![PRIMARY, SECONDARY]);
}

#[tokio::test]
async fn test_connect_fails_when_no_endpoint_reachable() {
    init_tracing();
    let connector = MockConnector::new(MockNode::new());
    connector.set_reachable(PRIMARY, false);
    connector.set_reachable(SECONDARY, false);

    let err = Cess::builder([PRIMARY, SECONDARY])
        .connect(connector)
        .await
        .unwrap_err();

    match err {
        Error::NoReachableEndpoint {
            attempted,
            last_error,
        } => {
            assert_eq!(attempted, vec![PRIMARY, SECONDARY]);
            assert!(last_error.unwrap().is_transport());
        }
        other => panic!("Expected NoReachableEndpoint, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_endpoint_list_is_config_error() {
    let connector = MockConnector::new(MockNode::new());
    let err = Cess::builder(["", "  "]).connect(connector).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_zero_timeout_is_config_error() {
    let connector = MockConnector::new(MockNode::new());
    let err = Cess::builder([ENDPOINT])
        .timeout(Duration::ZERO)
        .connect(connector)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_from_config() {
    let config = SdkConfig::from_json(&format!(
        r#"{{"endpoints": ["{ENDPOINT}"], "timeout_secs": 5, "ss58_prefix": 42}}"#
    ))
    .unwrap();
    let cess = Cess::from_config(config, MockConnector::new(MockNode::new()))
        .await
        .unwrap();

    assert_eq!(cess.timeout(), Duration::from_secs(5));
    assert_eq!(cess.ss58_prefix(), 42);
    assert!(cess.signer_public_key().is_none());
}

#[tokio::test]
async fn test_signer_address_uses_prefix() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let expected = alice().public_key().to_ss58(CESS_SS58_PREFIX);
    assert_eq!(cess.signer_address(), Some(expected.as_str()));
    assert!(expected.starts_with("cX"));
}

#[tokio::test]
async fn test_transport_failure_clears_liveness() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    node.push(Behavior::Disconnect);
    let err = cess.create_bucket(&owner, "photos").await.unwrap_err();
    match err {
        Error::SubmissionRejected {
            tx_hash: Some(_),
            source,
        } => assert!(source.is_transport()),
        other => panic!("Expected SubmissionRejected, got: {other:?}"),
    }
    assert!(!cess.is_live());

    // Fails fast without touching the node
    let reads = node.storage_reads();
    let err = cess.create_bucket(&owner, "photos").await.unwrap_err();
    assert!(matches!(err, Error::ConnectionUnavailable));
    assert_eq!(node.storage_reads(), reads);
    assert_eq!(node.submissions().len(), 1);
}

#[tokio::test]
async fn test_reconnect_restores_liveness() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    node.push(Behavior::Disconnect);
    cess.create_bucket(&owner, "photos").await.unwrap_err();
    assert!(!cess.is_live());

    cess.reconnect().await.unwrap();
    assert!(cess.is_live());
    let receipt = cess.create_bucket(&owner, "photos").await.unwrap();
    assert_eq!(node.submissions().last().unwrap().tx_hash, receipt.tx_hash);
}

#[tokio::test]
async fn test_failed_reconnect_keeps_stale_session() {
    init_tracing();
    let node = funded_node(&alice(), 0);
    let connector = MockConnector::new(node.clone());
    let cess = Cess::builder([PRIMARY])
        .signer(InMemorySigner::from_secret_key(alice()))
        .connect(connector.clone())
        .await
        .unwrap();

    connector.set_reachable(PRIMARY, false);
    let err = cess.reconnect().await.unwrap_err();
    assert!(matches!(err, Error::NoReachableEndpoint { .. }));

    assert!(!cess.is_live());
    assert!(cess.session().is_some());
    let err = cess
        .create_bucket(&alice().public_key(), "photos")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConnectionUnavailable));
}

#[tokio::test]
async fn test_query_transport_failure_clears_liveness() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    node.set_down(true);
    let err = cess.account_info(&alice().public_key()).await.unwrap_err();
    assert!(matches!(err, Error::Query(ChainError::Transport(_))));
    assert!(!cess.is_live());
}

#[tokio::test]
async fn test_incomplete_handshake_falls_back_to_next_endpoint() {
    init_tracing();
    for fault in [
        HandshakeFault::MetadataError,
        HandshakeFault::EmptyMetadata,
        HandshakeFault::ZeroGenesis,
        HandshakeFault::StorageKeyPanic,
    ] {
        let faulty = MockNode::new();
        faulty.set_handshake_fault(Some(fault));
        let connector = MockConnector::new(MockNode::new());
        connector.route(PRIMARY, faulty);

        let cess = Cess::builder([PRIMARY, SECONDARY])
            .connect(connector.clone())
            .await
            .unwrap();

        let session = cess.session().unwrap();
        assert_eq!(session.endpoint(), SECONDARY, "{fault:?}");
        assert_eq!(session.genesis_hash(), GENESIS);
        assert!(!session.events_key().is_empty());
        assert_eq!(connector.attempts(), vec![PRIMARY, SECONDARY]);
    }
}

#[tokio::test]
async fn test_runtime_without_event_log_is_rejected() {
    init_tracing();
    let node = MockNode::new();
    node.set_metadata(
        RuntimeMetadata::new().with_pallet("FileBank", PalletMetadata::new(1).call("create_bucket", 5)),
    );

    let err = Cess::builder([ENDPOINT])
        .connect(MockConnector::new(node))
        .await
        .unwrap_err();
    match err {
        Error::NoReachableEndpoint { last_error, .. } => {
            assert!(matches!(last_error, Some(ChainError::Decode(_))));
        }
        other => panic!("Expected NoReachableEndpoint, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_handshake_on_reconnect_keeps_snapshot_intact() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let before = cess.session().unwrap();
    let events_key = before.events_key().clone();

    for fault in [HandshakeFault::EmptyMetadata, HandshakeFault::ZeroGenesis] {
        node.set_handshake_fault(Some(fault));
        let err = cess.reconnect().await.unwrap_err();
        assert!(matches!(err, Error::NoReachableEndpoint { .. }), "{fault:?}");
        assert!(!cess.is_live());

        // The published session is still the complete one from before
        let current = cess.session().unwrap();
        assert!(std::sync::Arc::ptr_eq(&current, &before));
        assert!(!current.metadata().is_empty());
        assert_eq!(current.genesis_hash(), GENESIS);
        assert_eq!(current.events_key(), &events_key);
    }

    node.set_handshake_fault(None);
    cess.reconnect().await.unwrap();
    assert!(cess.is_live());
    let after = cess.session().unwrap();
    assert!(!std::sync::Arc::ptr_eq(&after, &before));
    // The old snapshot is unchanged by the swap
    assert_eq!(before.events_key(), &events_key);
    cess.create_bucket(&alice().public_key(), "photos").await.unwrap();
}

#[tokio::test]
async fn test_event_log_transport_failure_clears_liveness() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    node.push(Behavior::IncludeThenDisconnect);
    let err = cess
        .create_bucket(&alice().public_key(), "photos")
        .await
        .unwrap_err();

    match err {
        Error::EventDecodeFailed {
            tx_hash, reason, ..
        } => {
            assert_eq!(tx_hash, node.submissions()[0].tx_hash);
            assert!(reason.contains("cannot fetch event log"));
        }
        other => panic!("Expected EventDecodeFailed, got: {other:?}"),
    }
    assert!(!cess.is_live());
    assert_eq!(node.open_subscriptions(), 0);
}
