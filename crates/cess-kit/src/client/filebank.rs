//! Bucket and file transactions (`FileBank` pallet).
//!
//! Content hashes are validated before anything is sent: a hash of the wrong
//! length is [`Error::InvalidInput`] and never reaches the node.

use super::cess::{Cess, TxReceipt};
use super::events::{DeleteFileEvent, ReplaceFillerEvent, TransferReportEvent, TxKind};
use crate::error::{Error, InputError};
use crate::types::{FileHash, IdleFileMeta, IdleMetadata, PublicKey, SegmentList, UserBrief};

/// Most idle file entries submitted in one `upload_filler` call.
pub const MAX_SUBMITTED_IDLE_FILE_META: usize = 30;

impl Cess {
    /// Create bucket `name` for `owner`.
    pub async fn create_bucket(&self, owner: &PublicKey, name: &str) -> Result<TxReceipt, Error> {
        let name = bucket_name(name)?;
        let inclusion = self.transact(TxKind::CreateBucket, &(owner, name)).await?;
        Ok(TxReceipt::new(&inclusion, ()))
    }

    /// Delete bucket `name` of `owner`.
    pub async fn delete_bucket(&self, owner: &PublicKey, name: &str) -> Result<TxReceipt, Error> {
        let name = bucket_name(name)?;
        let inclusion = self.transact(TxKind::DeleteBucket, &(owner, name)).await?;
        Ok(TxReceipt::new(&inclusion, ()))
    }

    /// Declare an upload of `file_hash`, split into `segments`, on behalf of `user`.
    pub async fn upload_declaration(
        &self,
        file_hash: &str,
        segments: &[SegmentList],
        user: &UserBrief,
    ) -> Result<TxReceipt, Error> {
        let hash: FileHash = file_hash.parse()?;
        let inclusion = self
            .transact(TxKind::UploadDeclaration, &(hash, segments, user))
            .await?;
        Ok(TxReceipt::new(&inclusion, ()))
    }

    /// Delete files of `owner`. The payload lists the hashes that could not
    /// be deleted.
    pub async fn delete_file<S: AsRef<str>>(
        &self,
        owner: &PublicKey,
        file_hashes: &[S],
    ) -> Result<TxReceipt<Vec<FileHash>>, Error> {
        let hashes = FileHash::parse_all(file_hashes)?;
        let inclusion = self.transact(TxKind::DeleteFile, &(owner, hashes)).await?;
        let event: DeleteFileEvent = inclusion.payload()?;
        Ok(TxReceipt::new(&inclusion, event.failed_list))
    }

    /// Report that the signer stored the given files. The payload lists the
    /// hashes the chain did not accept.
    pub async fn submit_file_report(
        &self,
        file_hashes: &[FileHash],
    ) -> Result<TxReceipt<Vec<FileHash>>, Error> {
        let inclusion = self.transact(TxKind::FileReport, &file_hashes).await?;
        let event: TransferReportEvent = inclusion.payload()?;
        Ok(TxReceipt::new(&inclusion, event.failed_list))
    }

    /// [`submit_file_report`](Self::submit_file_report) with string hashes.
    pub async fn report_files<S: AsRef<str>>(
        &self,
        file_hashes: &[S],
    ) -> Result<TxReceipt<Vec<String>>, Error> {
        let hashes = FileHash::parse_all(file_hashes)?;
        let receipt = self.submit_file_report(&hashes).await?;
        Ok(stringify(receipt))
    }

    /// Replace idle (filler) files with service files. The payload lists the
    /// filler hashes that were replaced.
    pub async fn replace_idle_files(
        &self,
        file_hashes: &[FileHash],
    ) -> Result<TxReceipt<Vec<FileHash>>, Error> {
        let inclusion = self.transact(TxKind::ReplaceIdleFiles, &file_hashes).await?;
        let event: ReplaceFillerEvent = inclusion.payload()?;
        Ok(TxReceipt::new(&inclusion, event.filler_list))
    }

    /// [`replace_idle_files`](Self::replace_idle_files) with string hashes.
    pub async fn replace_files<S: AsRef<str>>(
        &self,
        file_hashes: &[S],
    ) -> Result<TxReceipt<Vec<String>>, Error> {
        let hashes = FileHash::parse_all(file_hashes)?;
        let receipt = self.replace_idle_files(&hashes).await?;
        Ok(stringify(receipt))
    }

    /// Submit idle file metadata certified by the TEE worker `tee_account`.
    pub async fn submit_idle_metadata(
        &self,
        tee_account: &PublicKey,
        idle_files: &[IdleMetadata],
    ) -> Result<TxReceipt, Error> {
        let inclusion = self
            .transact(TxKind::SubmitIdleMetadata, &(tee_account, idle_files))
            .await?;
        Ok(TxReceipt::new(&inclusion, ()))
    }

    /// Validate loose idle file descriptions and submit them.
    ///
    /// Entries with a malformed account or hash are skipped; at most
    /// [`MAX_SUBMITTED_IDLE_FILE_META`] entries are sent.
    pub async fn submit_idle_files(
        &self,
        tee_account: &PublicKey,
        idle_files: &[IdleFileMeta],
    ) -> Result<TxReceipt, Error> {
        let metadata = select_idle_metadata(idle_files);
        self.submit_idle_metadata(tee_account, &metadata).await
    }
}

fn bucket_name(name: &str) -> Result<Vec<u8>, InputError> {
    if name.trim().is_empty() {
        return Err(InputError::BucketName("name is empty".into()));
    }
    Ok(name.as_bytes().to_vec())
}

fn select_idle_metadata(idle_files: &[IdleFileMeta]) -> Vec<IdleMetadata> {
    idle_files
        .iter()
        .filter_map(IdleFileMeta::to_metadata)
        .take(MAX_SUBMITTED_IDLE_FILE_META)
        .collect()
}

fn stringify(receipt: TxReceipt<Vec<FileHash>>) -> TxReceipt<Vec<String>> {
    TxReceipt {
        tx_hash: receipt.tx_hash,
        block_hash: receipt.block_hash,
        payload: receipt.payload.iter().map(ToString::to_string).collect(),
    }
}
