//! Integration tests for read-only storage queries.

use cess_kit::*;
use parity_scale_codec::Encode;

use crate::mock_node::*;

#[tokio::test]
async fn test_account_state() {
    let node = funded_node(&alice(), 12);
    let cess = connect(&node, &alice()).await;

    let state = cess.account_state(&alice().public_key()).await.unwrap();
    assert!(state.exists());
    assert_eq!(state.next_nonce(), 12);

    let state = cess.account_state(&bob().public_key()).await.unwrap();
    assert_eq!(state, AccountState::NotFound);
    assert_eq!(state.next_nonce(), 0);
}

#[tokio::test]
async fn test_account_info() {
    let node = funded_node(&alice(), 3);
    let cess = connect(&node, &alice()).await;

    let info = cess
        .account_info(&alice().public_key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.nonce, 3);
    assert_eq!(info.data.free, 1_000 * TOKEN_PRECISION);

    assert!(cess.account_info(&bob().public_key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_bucket_queries() {
    let node = funded_node(&alice(), 0);
    let owner = alice().public_key();
    let object: FileHash = file_hash('7').parse().unwrap();
    node.set_storage(
        "FileBank",
        "Bucket",
        &[owner.encode(), "photos".encode()],
        &BucketInfo {
            object_list: vec![object],
            authority: vec![owner],
        },
    );
    node.set_storage(
        "FileBank",
        "UserBucketList",
        &[owner.encode()],
        &vec![b"photos".to_vec(), b"videos".to_vec()],
    );
    let cess = connect(&node, &alice()).await;

    let bucket = cess.bucket_info(&owner, "photos").await.unwrap().unwrap();
    assert_eq!(bucket.object_list, vec![object]);
    assert_eq!(bucket.authority, vec![owner]);
    assert!(cess.bucket_info(&owner, "music").await.unwrap().is_none());

    assert_eq!(
        cess.all_bucket_names(&owner).await.unwrap(),
        vec!["photos", "videos"]
    );
    assert!(cess.all_bucket_names(&bob().public_key()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_metadata() {
    let node = funded_node(&alice(), 0);
    let owner = alice().public_key();
    let hash: FileHash = file_hash('f').parse().unwrap();
    let metadata = FileMetadata {
        segment_list: vec![SegmentList {
            hash: file_hash('1').parse().unwrap(),
            fragment_list: vec![file_hash('2').parse().unwrap()],
        }],
        owner: vec![UserBrief::new(owner, "cat.jpg", "photos")],
        file_size: 4096,
        completion: 100,
        state: 1,
    };
    node.set_storage("FileBank", "File", &[hash.encode()], &metadata);
    let cess = connect(&node, &alice()).await;

    let found = cess.file_metadata(&file_hash('f')).await.unwrap();
    assert_eq!(found, Some(metadata));
    assert!(cess.file_metadata(&file_hash('e')).await.unwrap().is_none());
}

#[tokio::test]
async fn test_storage_order() {
    let node = funded_node(&alice(), 0);
    let hash: FileHash = file_hash('d').parse().unwrap();
    let order = StorageOrder {
        stage: 1,
        count: 2,
        file_size: 16 << 20,
        segment_list: vec![SegmentList {
            hash: file_hash('3').parse().unwrap(),
            fragment_list: vec![file_hash('4').parse().unwrap()],
        }],
        user: UserBrief::new(alice().public_key(), "video.mp4", "videos"),
        complete_list: vec![bob().public_key()],
    };
    node.set_storage("FileBank", "DealMap", &[hash.encode()], &order);
    let cess = connect(&node, &alice()).await;

    let found = cess.storage_order(&file_hash('d')).await.unwrap();
    assert_eq!(found, Some(order));
    assert!(cess.storage_order(&file_hash('c')).await.unwrap().is_none());

    let reads = node.storage_reads();
    let err = cess.storage_order("not-a-hash").await.unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(node.storage_reads(), reads);
}

#[tokio::test]
async fn test_pending_replacements() {
    let node = funded_node(&alice(), 0);
    node.set_storage(
        "FileBank",
        "PendingReplacements",
        &[alice().public_key().encode()],
        &5u32,
    );
    let cess = connect(&node, &alice()).await;

    let pending = cess
        .pending_replacements(&alice().public_key())
        .await
        .unwrap();
    assert_eq!(pending, Some(5));
}

#[tokio::test]
async fn test_malformed_storage_value() {
    let node = funded_node(&alice(), 0);
    node.set_raw_storage(
        "Sminer",
        "MinerItems",
        &[alice().public_key().encode()],
        vec![1, 2, 3],
    );
    let cess = connect(&node, &alice()).await;

    let err = cess
        .storage_miner(&alice().public_key())
        .await
        .unwrap_err();
    match err {
        Error::StorageDecode { item, .. } => assert_eq!(item, "Sminer.MinerItems"),
        other => panic!("Expected StorageDecode, got: {other:?}"),
    }
    // Decode failures leave the connection alone
    assert!(cess.is_live());
}

#[tokio::test]
async fn test_queries_run_while_submission_in_flight() {
    let node = funded_node(&alice(), 0);
    node.set_inclusion_delay(std::time::Duration::from_millis(50));
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    let submitting = {
        let cess = cess.clone();
        tokio::spawn(async move { cess.create_bucket(&owner, "photos").await })
    };
    tokio::task::yield_now().await;

    // Not blocked by the submission lock
    let info = cess.account_info(&owner).await.unwrap().unwrap();
    assert_eq!(info.nonce, 0);

    submitting.await.unwrap().unwrap();
    assert_eq!(node.account_nonce(&owner), Some(1));
}
