//! Postage stamps and batches.
//!
//! A batch is a prepaid allowance over the chunk address space, split into
//! collision buckets; a stamp is the signed assertion that a chunk occupies
//! a slot of a batch at a point in time.

pub mod batch;
pub mod stamp;

pub use batch::{bucket_index, bucket_upper_bound, split_index, to_bucket, Batch, BatchId};
pub use stamp::{recover_batch_owner, to_sign_digest, Stamp, StampError, STAMP_SIZE};
