//! Reed-Solomon redundancy for file segments.
//!
//! A segment is split into data shards plus parity shards. Each shard is
//! written next to the segment and named by the hex SHA-256 of its contents,
//! which is also the fragment hash declared on chain.
//!
//! ```rust,no_run
//! use cess_kit::erasure::{self, ErasureConfig};
//!
//! # fn example() -> Result<(), cess_kit::ErasureError> {
//! let config = ErasureConfig::default();
//! let shards = erasure::encode_segment("segment.bin", &config)?;
//! erasure::restore_segment("restored.bin", &shards, &config)?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use reed_solomon_erasure::galois_8::ReedSolomon;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ErasureError;

/// Size of one segment in bytes (16 MiB).
pub const SEGMENT_SIZE: u64 = 16 * 1024 * 1024;
/// Data shards per segment.
pub const DATA_SHARDS: usize = 2;
/// Parity shards per segment.
pub const PARITY_SHARDS: usize = 1;

/// Shard layout of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErasureConfig {
    pub data_shards: usize,
    pub parity_shards: usize,
    /// Exact size a segment must have to be encoded.
    pub segment_size: u64,
}

impl Default for ErasureConfig {
    fn default() -> Self {
        Self {
            data_shards: DATA_SHARDS,
            parity_shards: PARITY_SHARDS,
            segment_size: SEGMENT_SIZE,
        }
    }
}

impl ErasureConfig {
    /// Total number of shards.
    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    fn codec(&self) -> Result<ReedSolomon, ErasureError> {
        if self.segment_size == 0 {
            return Err(ErasureError::Config("segment size is zero".into()));
        }
        ReedSolomon::new(self.data_shards, self.parity_shards)
            .map_err(|e| ErasureError::Config(format!("{e:?}")))
    }

    fn segment_len(&self) -> Result<usize, ErasureError> {
        usize::try_from(self.segment_size)
            .map_err(|_| ErasureError::Config("segment size exceeds address space".into()))
    }
}

/// Split the segment at `path` into shards and write them beside it.
///
/// Returns the shard paths, data shards first. A shard file that already
/// exists is left untouched.
pub fn encode_segment(
    path: impl AsRef<Path>,
    config: &ErasureConfig,
) -> Result<Vec<PathBuf>, ErasureError> {
    let path = path.as_ref();
    let codec = config.codec()?;

    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(ErasureError::NotAFile(path.to_path_buf()));
    }
    if meta.len() != config.segment_size {
        return Err(ErasureError::InvalidSize {
            expected: config.segment_size,
            actual: meta.len(),
        });
    }

    let data = fs::read(path)?;
    let mut shards = split(&data, config);
    codec
        .encode(&mut shards)
        .map_err(|e| ErasureError::Codec(format!("{e:?}")))?;

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut paths = Vec::with_capacity(shards.len());
    for shard in &shards {
        let shard_path = dir.join(hex::encode(Sha256::digest(shard)));
        if !shard_path.exists() {
            fs::write(&shard_path, shard)?;
        }
        paths.push(shard_path);
    }

    debug!(segment = %path.display(), shards = paths.len(), "Segment encoded");
    Ok(paths)
}

/// Rebuild a segment from its shards and write it to `out`.
///
/// `shards` lists shard paths in the order [`encode_segment`] returned them;
/// missing or unreadable files count as lost. Nothing is done if `out`
/// already exists.
pub fn restore_segment(
    out: impl AsRef<Path>,
    shards: &[PathBuf],
    config: &ErasureConfig,
) -> Result<(), ErasureError> {
    let out = out.as_ref();
    if out.exists() {
        debug!(out = %out.display(), "Segment already restored");
        return Ok(());
    }

    let codec = config.codec()?;
    if shards.len() > config.total_shards() {
        return Err(ErasureError::Config(format!(
            "{} shard paths for {} shards",
            shards.len(),
            config.total_shards()
        )));
    }

    let mut loaded: Vec<Option<Vec<u8>>> = shards.iter().map(|p| fs::read(p).ok()).collect();
    loaded.resize(config.total_shards(), None);

    let complete = loaded.iter().all(Option::is_some);
    if !(complete && verify(&codec, &loaded)) {
        codec
            .reconstruct(&mut loaded[..])
            .map_err(|e| ErasureError::Codec(format!("{e:?}")))?;
        if !verify(&codec, &loaded) {
            return Err(ErasureError::Corrupted);
        }
    }

    let mut segment: Vec<u8> = loaded
        .into_iter()
        .take(config.data_shards)
        .flatten()
        .flatten()
        .collect();
    segment.truncate(config.segment_len()?);
    fs::write(out, &segment)?;

    debug!(out = %out.display(), bytes = segment.len(), "Segment restored");
    Ok(())
}

/// Equal data shards followed by zeroed parity shards.
fn split(data: &[u8], config: &ErasureConfig) -> Vec<Vec<u8>> {
    let shard_len = data.len().div_ceil(config.data_shards);
    let mut shards: Vec<Vec<u8>> = data
        .chunks(shard_len.max(1))
        .map(|chunk| {
            let mut shard = chunk.to_vec();
            shard.resize(shard_len, 0);
            shard
        })
        .collect();
    shards.resize(config.total_shards(), vec![0; shard_len]);
    shards
}

fn verify(codec: &ReedSolomon, shards: &[Option<Vec<u8>>]) -> bool {
    let Some(present) = shards.iter().cloned().collect::<Option<Vec<_>>>() else {
        return false;
    };
    codec.verify(&present).unwrap_or(false)
}
