//! Integration tests for bucket and file transactions.

use cess_kit::client::{DeleteFileEvent, ReplaceFillerEvent, TransferReportEvent};
use cess_kit::*;
use parity_scale_codec::{Decode, Encode};

use crate::mock_node::*;

#[tokio::test]
async fn test_create_and_delete_bucket() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    cess.create_bucket(&owner, "photos").await.unwrap();
    assert_eq!(cess.all_bucket_names(&owner).await.unwrap(), vec!["photos"]);

    cess.delete_bucket(&owner, "photos").await.unwrap();
    let kinds: Vec<TxKind> = node.submissions().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![TxKind::CreateBucket, TxKind::DeleteBucket]);
}

#[tokio::test]
async fn test_blank_bucket_name_rejected_locally() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    let err = cess
        .create_bucket(&alice().public_key(), "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(InputError::BucketName(_))));
    assert_eq!(node.storage_reads(), 0);
    assert!(node.submissions().is_empty());
}

#[tokio::test]
async fn test_malformed_hashes_never_reach_the_node() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();
    let short = "a".repeat(63);

    let err = cess.delete_file(&owner, &[short.as_str()]).await.unwrap_err();
    assert!(err.is_invalid_input());

    let err = cess
        .report_files(&[file_hash('a'), "zz".repeat(32)])
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());

    let err = cess.replace_files(&[short.as_str()]).await.unwrap_err();
    assert!(err.is_invalid_input());

    let user = UserBrief::new(owner, "cat.jpg", "photos");
    let err = cess
        .upload_declaration(&short, &[], &user)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());

    let err = cess.file_metadata(&short).await.unwrap_err();
    assert!(err.is_invalid_input());

    assert_eq!(node.storage_reads(), 0);
    assert!(node.submissions().is_empty());
}

#[tokio::test]
async fn test_upload_declaration() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    let segment = SegmentList {
        hash: file_hash('1').parse().unwrap(),
        fragment_list: vec![file_hash('2').parse().unwrap(), file_hash('3').parse().unwrap()],
    };
    let user = UserBrief::new(owner, "cat.jpg", "photos");
    cess.upload_declaration(&file_hash('f'), &[segment.clone()], &user)
        .await
        .unwrap();

    let submitted = &node.submissions()[0];
    assert_eq!(submitted.kind, TxKind::UploadDeclaration);
    let (hash, segments, brief) =
        <(FileHash, Vec<SegmentList>, UserBrief)>::decode(&mut submitted.args.as_slice()).unwrap();
    assert_eq!(hash.to_string(), file_hash('f'));
    assert_eq!(segments, vec![segment]);
    assert_eq!(brief, user);
}

#[tokio::test]
async fn test_delete_file_reports_failed_hashes() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();
    let failed: FileHash = file_hash('b').parse().unwrap();

    node.push(Behavior::IncludeWithFields(
        DeleteFileEvent {
            operator: owner,
            owner,
            failed_list: vec![failed],
        }
        .encode(),
    ));
    let receipt = cess
        .delete_file(&owner, &[file_hash('a'), file_hash('b')])
        .await
        .unwrap();

    assert_eq!(receipt.payload, vec![failed]);
    assert_eq!(receipt.tx_hash, node.submissions()[0].tx_hash);
}

#[tokio::test]
async fn test_payload_decode_failure() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    // Success event present but its fields are empty
    node.push(Behavior::Include);
    let err = cess
        .delete_file(&owner, &[file_hash('a')])
        .await
        .unwrap_err();

    match err {
        Error::EventDecodeFailed { reason, .. } => {
            assert!(reason.contains("FileBank.DeleteFile"));
        }
        other => panic!("Expected EventDecodeFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_report_files() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    node.push(Behavior::IncludeWithFields(
        TransferReportEvent {
            acc: alice().public_key(),
            failed_list: vec![file_hash('c').parse().unwrap()],
        }
        .encode(),
    ));
    let receipt = cess
        .report_files(&[file_hash('c'), file_hash('d')])
        .await
        .unwrap();

    assert_eq!(receipt.payload, vec![file_hash('c')]);
    assert_eq!(node.submissions()[0].kind, TxKind::FileReport);
}

#[tokio::test]
async fn test_replace_files() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;

    node.push(Behavior::IncludeWithFields(
        ReplaceFillerEvent {
            acc: alice().public_key(),
            filler_list: vec![file_hash('e').parse().unwrap()],
        }
        .encode(),
    ));
    let receipt = cess.replace_files(&[file_hash('4')]).await.unwrap();

    assert_eq!(receipt.payload, vec![file_hash('e')]);
    assert_eq!(node.submissions()[0].kind, TxKind::ReplaceIdleFiles);
}

#[tokio::test]
async fn test_submit_idle_files_filters_and_caps() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let tee = bob().public_key();

    let good = IdleFileMeta {
        size: 8 * 1024 * 1024,
        block_num: 8,
        block_size: 1024,
        scan_size: 16,
        miner_acc: alice().public_key().as_bytes().to_vec(),
        hash: file_hash('9'),
    };
    let bad = IdleFileMeta {
        hash: "nothex".to_string(),
        ..good.clone()
    };
    let mut files = vec![bad];
    files.extend(std::iter::repeat_n(good, 35));

    cess.submit_idle_files(&tee, &files).await.unwrap();

    let submitted = &node.submissions()[0];
    assert_eq!(submitted.kind, TxKind::SubmitIdleMetadata);
    let (account, metadata) =
        <(PublicKey, Vec<IdleMetadata>)>::decode(&mut submitted.args.as_slice()).unwrap();
    assert_eq!(account, tee);
    assert_eq!(metadata.len(), MAX_SUBMITTED_IDLE_FILE_META);
    assert!(metadata.iter().all(|m| m.acc == alice().public_key()));
}

#[tokio::test]
async fn test_idle_metadata_without_filler_event_fails() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let files = vec![IdleFileMeta {
        size: 8 * 1024 * 1024,
        miner_acc: alice().public_key().as_bytes().to_vec(),
        hash: file_hash('9'),
        ..Default::default()
    }];

    node.push(Behavior::IncludeWithEvents(vec![EventRecord::new(
        Phase::ApplyExtrinsic(1),
        "System",
        "ExtrinsicSuccess",
        vec![],
    )]));
    let err = cess
        .submit_idle_files(&bob().public_key(), &files)
        .await
        .unwrap_err();
    match err {
        Error::ExpectedEventAbsent { event, .. } => assert_eq!(event, "FileBank.FillerUpload"),
        other => panic!("Expected ExpectedEventAbsent, got: {other:?}"),
    }
    assert_eq!(node.submissions().len(), 1);
}

#[tokio::test]
async fn test_large_call_is_signed_over_hash() {
    let node = funded_node(&alice(), 0);
    let cess = connect(&node, &alice()).await;
    let owner = alice().public_key();

    // Twenty hashes push the signing payload past 256 bytes
    let hashes: Vec<String> = (0..20).map(|_| file_hash('a')).collect();
    node.push(Behavior::IncludeWithFields(
        DeleteFileEvent {
            operator: owner,
            owner,
            failed_list: vec![],
        }
        .encode(),
    ));
    let receipt = cess.delete_file(&owner, &hashes).await.unwrap();

    assert!(receipt.payload.is_empty());
    assert!(node.submissions()[0].signature_valid);
}
