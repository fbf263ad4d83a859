//! Error taxonomy for sampling and stamp issuance.

use hive_common::cac::CacError;
use hive_common::crypto::CryptoError;
use hive_common::postage::StampError as StampFormatError;
use thiserror::Error;

/// Backend failure of a key-value store.
#[derive(Debug, Error)]
#[error("store backend: {0}")]
pub struct StoreError(pub String);

/// Chunk retrieval errors. `NotFound` is non-fatal per item during
/// sampling.
#[derive(Debug, Error)]
pub enum GetError {
    #[error("chunk not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Batch lookup errors. A missing batch is fatal for the call that needed
/// it.
#[derive(Debug, Error)]
pub enum BatchStoreError {
    #[error("batch not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by a sampler run. Per-item problems (missing chunks,
/// invalid stamps, invalid chunks) are counted, not raised.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("database closed")]
    DbClosed,
    #[error("sampler stopped due to ongoing evictions")]
    Stopped,
    #[error("sampling cancelled")]
    Cancelled,
    #[error("sampler: failed iteration: {0}")]
    Index(String),
    #[error("sampler: failed transforming chunk: {0}")]
    Transform(#[from] hive_common::bmt::BmtError),
    #[error("sampler: failed creating sample hash: {0}")]
    Assembly(#[from] CacError),
    #[error("sampler task failed: {0}")]
    Task(String),
}

impl SamplerError {
    /// Recover a `SamplerError` funneled through the boxed error channel
    /// of the reserve index visitor.
    pub(crate) fn from_boxed(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        match err.downcast::<SamplerError>() {
            Ok(e) => *e,
            Err(other) => SamplerError::Index(other.to_string()),
        }
    }
}

/// Stamp issuance and verification errors.
#[derive(Debug, Error)]
pub enum StampError {
    #[error("bucket full")]
    BucketFull,
    #[error("invalid batch signature")]
    InvalidBatchSignature,
    #[error("batch not usable yet")]
    NotUsable,
    #[error("batch not found")]
    BatchNotFound,
    #[error("invalid stamp: {0}")]
    Format(StampFormatError),
    #[error("stamp store: {0}")]
    Store(#[from] StoreError),
    #[error("stamp signing: {0}")]
    Signer(#[from] CryptoError),
}

impl From<StampFormatError> for StampError {
    fn from(err: StampFormatError) -> Self {
        match err {
            StampFormatError::InvalidBatchSignature => StampError::InvalidBatchSignature,
            StampFormatError::Crypto(e) => StampError::Signer(e),
            other => StampError::Format(other),
        }
    }
}

impl From<BatchStoreError> for StampError {
    fn from(err: BatchStoreError) -> Self {
        match err {
            BatchStoreError::NotFound => StampError::BatchNotFound,
            BatchStoreError::Store(e) => StampError::Store(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_sampler_error_roundtrip() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(SamplerError::DbClosed);
        assert!(matches!(
            SamplerError::from_boxed(boxed),
            SamplerError::DbClosed
        ));

        let other: Box<dyn std::error::Error + Send + Sync> =
            Box::new(StoreError("disk gone".into()));
        match SamplerError::from_boxed(other) {
            SamplerError::Index(msg) => assert!(msg.contains("disk gone")),
            e => panic!("unexpected: {e:?}"),
        }
    }

    #[test]
    fn test_stamp_error_conversions() {
        let e: StampError = StampFormatError::InvalidBatchSignature.into();
        assert!(matches!(e, StampError::InvalidBatchSignature));

        let e: StampError = BatchStoreError::NotFound.into();
        assert!(matches!(e, StampError::BatchNotFound));
    }
}
