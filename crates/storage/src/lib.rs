//! hive-storage
//!
//! Reserve sampling and postage stamp issuance over an external chunk
//! store. The sampler draws the verifiable reserve sample a node submits
//! to the storage-incentive lottery; the stamper issues at-most-once
//! postage stamps per (batch, chunk address).
//!
//! ## Modules
//! - `store`: the external contracts (reserve index, chunk getter, batch
//!   store, stamp store)
//! - `mem`: in-memory store backend for tests and local runs
//! - `sampler`: the three-stage reserve sampling pipeline
//! - `issuer` / `stamper`: per-batch bucket accounting and stamp issuance
//! - `keyed_lock`: the injected per-batch critical section
//! - `cancellation`: one-shot cancellation latch
//! - `metrics`: run counters and per-run statistics
//! - `config`: sampler tuning knobs

pub mod cancellation;
pub mod config;
pub mod error;
pub mod issuer;
pub mod keyed_lock;
pub mod mem;
pub mod metrics;
pub mod sampler;
pub mod stamper;
pub mod store;

pub use cancellation::CancellationToken;
pub use config::ReserveConfig;
pub use error::{BatchStoreError, GetError, SamplerError, StampError, StoreError};
pub use issuer::StampIssuer;
pub use keyed_lock::KeyedMutex;
pub use mem::{MemBatchStore, MemChunkStore, MemStampStore};
pub use sampler::{Reserve, Sample, SampleEntry, SAMPLE_SIZE};
pub use stamper::{BatchStamper, PresignedStamper, Stamper};
pub use store::{BatchStore, ChunkGetter, ChunkItem, GetMode, IndexItem, ReserveIndex, StampItem, StampStore};
