//! Reserve sampling.
//!
//! To enter a lottery round a node proves its reserve by drawing a
//! deterministic sample: the 16 chunks whose anchor-keyed transformed
//! addresses are smallest across the reserve. Sampling is a three-stage
//! pipeline:
//!
//! ```text
//! iterate addresses -> fetch chunk, keyed hash -> select top-k, validate
//!   (1 task)             (N workers)               (caller's loop)
//! ```
//!
//! Every blocking step observes three stop signals: the caller's context,
//! database close, and the eviction-triggered sampler stop. The selected
//! sample is independent of worker scheduling because selection is a total
//! order over 32-byte transformed addresses.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use hive_common::bmt::BmtHasher;
use hive_common::cac::Cac;
use hive_common::postage::Stamp;
use hive_common::{chunk, Chunk, ChunkAddress};

use crate::cancellation::CancellationToken;
use crate::config::ReserveConfig;
use crate::error::SamplerError;
use crate::metrics::{SampleStats, SamplerMetrics};
use crate::stamper::valid_stamp;
use crate::store::{BatchStore, ChunkGetter, ChunkItem, GetMode, ReserveIndex};

/// Number of entries in a reserve sample.
pub const SAMPLE_SIZE: usize = 16;

/// One selected chunk: its anchor-keyed transformed address and the stored
/// chunk item it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleEntry {
    pub transformed_address: ChunkAddress,
    pub chunk_item: ChunkItem,
}

/// The reserve sample of a round: at most [`SAMPLE_SIZE`] entries in
/// ascending transformed-address order, their concatenated content, and
/// the content's chunk address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub items: Vec<SampleEntry>,
    pub sample_content: Vec<u8>,
    pub hash: ChunkAddress,
}

/// A node's reserve view: index, local getter and trusted batches, plus
/// the sampler run state. At most one sampler run is active at a time.
pub struct Reserve {
    index: Arc<dyn ReserveIndex>,
    getter: Arc<dyn ChunkGetter>,
    batches: Arc<dyn BatchStore>,
    overlay: ChunkAddress,
    config: ReserveConfig,
    metrics: SamplerMetrics,
    closed: CancellationToken,
    sampling: parking_lot::Mutex<Option<CancellationToken>>,
}

impl Reserve {
    pub fn new(
        index: Arc<dyn ReserveIndex>,
        getter: Arc<dyn ChunkGetter>,
        batches: Arc<dyn BatchStore>,
        overlay: ChunkAddress,
        config: ReserveConfig,
    ) -> Self {
        Reserve {
            index,
            getter,
            batches,
            overlay,
            config,
            metrics: SamplerMetrics::default(),
            closed: CancellationToken::new(),
            sampling: parking_lot::Mutex::new(None),
        }
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    /// Signal that the underlying database is closing. Aborts a running
    /// sample with `DbClosed`.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Eviction hook: stop the current sampler run, if any. Idempotent.
    pub fn stop_sampling_if_running(&self) {
        let sampling = self.sampling.lock();
        if let Some(signal) = sampling.as_ref() {
            signal.cancel();
        }
    }

    fn start_sampling(&self) -> CancellationToken {
        let signal = CancellationToken::new();
        *self.sampling.lock() = Some(signal.clone());
        signal
    }

    fn reset_sampling_state(&self) {
        *self.sampling.lock() = None;
    }

    /// Draw the reserve sample for a round: the [`SAMPLE_SIZE`] chunks at
    /// or beyond `storage_radius` whose anchor-keyed transformed addresses
    /// are smallest, excluding chunks stamped after `consensus_time_ns`.
    pub async fn reserve_sample(
        &self,
        ctx: &CancellationToken,
        anchor: &[u8],
        storage_radius: u8,
        consensus_time_ns: u64,
    ) -> Result<Sample, SamplerError> {
        let started = Instant::now();
        let stats = Arc::new(SampleStats::default());
        let stop = self.start_sampling();
        let result = self
            .run_sample(ctx, &stop, anchor, storage_radius, consensus_time_ns, &stats)
            .await;
        self.reset_sampling_state();

        match result {
            Ok(sample) => {
                self.metrics.inc_successful_runs();
                info!(
                    duration = ?started.elapsed(),
                    storage_radius,
                    consensus_time_ns,
                    items = sample.items.len(),
                    hash = %sample.hash,
                    stats = %stats,
                    "sampler done"
                );
                Ok(sample)
            }
            Err(err) => {
                self.metrics.inc_failed_runs();
                if matches!(err, SamplerError::Stopped) {
                    self.metrics.inc_stopped_runs();
                }
                debug!(error = %err, stats = %stats, "sampler run failed");
                Err(err)
            }
        }
    }

    async fn run_sample(
        &self,
        ctx: &CancellationToken,
        stop: &CancellationToken,
        anchor: &[u8],
        storage_radius: u8,
        consensus_time_ns: u64,
        stats: &Arc<SampleStats>,
    ) -> Result<Sample, SamplerError> {
        // first failure cancels the group; the other stages unwind through
        // this token and report no error of their own
        let abort = CancellationToken::new();
        let capacity = self.config.channel_capacity.max(1);
        let (addr_tx, addr_rx) = mpsc::channel::<ChunkAddress>(capacity);
        let addr_rx = Arc::new(tokio::sync::Mutex::new(addr_rx));
        let (entry_tx, mut entry_rx) = mpsc::channel::<SampleEntry>(capacity);

        let mut tasks: JoinSet<Result<(), SamplerError>> = JoinSet::new();

        // stage 1: iterate the reserve index from the radius boundary
        {
            let index = self.index.clone();
            let start = self.overlay.neighbourhood(storage_radius);
            let ctx = ctx.clone();
            let closed = self.closed.clone();
            let abort = abort.clone();
            let stats = stats.clone();
            tasks.spawn_blocking(move || {
                let iteration_started = Instant::now();
                let res = index.iterate(&start, &mut |item| {
                    if ctx.is_cancelled() {
                        return Err(SamplerError::Cancelled.into());
                    }
                    if closed.is_cancelled() {
                        return Err(SamplerError::DbClosed.into());
                    }
                    if abort.is_cancelled() {
                        return Ok(true);
                    }
                    match addr_tx.blocking_send(item.address) {
                        Ok(()) => {
                            stats.inc_iterated();
                            Ok(false)
                        }
                        // receivers are gone: the pipeline is unwinding
                        Err(_) => Ok(true),
                    }
                });
                stats.add_iteration_duration(iteration_started.elapsed());
                res.map_err(|err| {
                    let err = SamplerError::from_boxed(err);
                    abort.cancel();
                    err
                })
            });
        }

        // stage 2: fetch chunks and compute anchor-keyed digests
        for _ in 0..self.config.workers.max(1) {
            let addr_rx = addr_rx.clone();
            let entry_tx = entry_tx.clone();
            let getter = self.getter.clone();
            let ctx = ctx.clone();
            let closed = self.closed.clone();
            let stop = stop.clone();
            let abort = abort.clone();
            let stats = stats.clone();
            let anchor = anchor.to_vec();
            tasks.spawn(async move {
                let mut hasher = BmtHasher::keyed(&anchor);
                loop {
                    let addr = {
                        let mut rx = addr_rx.lock().await;
                        tokio::select! {
                            next = rx.recv() => match next {
                                Some(addr) => addr,
                                None => break,
                            },
                            _ = ctx.cancelled() => return Err(SamplerError::Cancelled),
                            _ = closed.cancelled() => return Err(SamplerError::DbClosed),
                            _ = stop.cancelled() => return Err(SamplerError::Stopped),
                            _ = abort.cancelled() => return Ok(()),
                        }
                    };

                    let get_started = Instant::now();
                    let item = match getter.get(GetMode::Sync, &addr).await {
                        Ok(item) => {
                            stats.add_get_duration(get_started.elapsed());
                            item
                        }
                        Err(_) => {
                            stats.inc_not_found();
                            continue;
                        }
                    };

                    if item.timestamp > consensus_time_ns {
                        stats.inc_new_ignored();
                        continue;
                    }

                    let hash_started = Instant::now();
                    let transformed = match hasher.sum(&item.data) {
                        Ok(digest) => digest,
                        Err(err) => {
                            abort.cancel();
                            return Err(SamplerError::Transform(err));
                        }
                    };
                    stats.add_hash_duration(hash_started.elapsed());

                    let entry = SampleEntry {
                        transformed_address: transformed.into(),
                        chunk_item: item,
                    };
                    tokio::select! {
                        sent = entry_tx.send(entry) => {
                            if sent.is_err() {
                                return Ok(());
                            }
                        }
                        _ = ctx.cancelled() => return Err(SamplerError::Cancelled),
                        _ = closed.cancelled() => return Err(SamplerError::DbClosed),
                        _ = stop.cancelled() => return Err(SamplerError::Stopped),
                        _ = abort.cancelled() => return Ok(()),
                    }
                }
                Ok(())
            });
        }
        // the workers hold the only live channel handles from here on, so
        // stage teardown closes both channels
        drop(addr_rx);
        drop(entry_tx);

        // stage 3: keep the smallest transformed addresses, validating
        // stamps and chunk integrity only for actual candidates
        let mut items: Vec<SampleEntry> = Vec::with_capacity(SAMPLE_SIZE);
        while let Some(entry) = entry_rx.recv().await {
            let current_max = items
                .last()
                .map(|e| e.transformed_address)
                .unwrap_or(ChunkAddress::ZERO);
            if items.len() >= SAMPLE_SIZE && entry.transformed_address > current_max {
                continue;
            }

            let validation_started = Instant::now();
            let item = &entry.chunk_item;
            let chunk = Chunk::new(item.address, item.data.clone());
            let stamp = Stamp::new(item.batch_id, item.index, item.timestamp, item.signature);
            match valid_stamp(&chunk, &stamp.to_bytes(), self.batches.as_ref()).await {
                Ok(_) => {
                    if chunk::valid(&chunk) {
                        insert(&mut items, entry);
                    } else {
                        stats.inc_invalid_chunk();
                        debug!(chunk_address = %chunk.address(), "chunk data invalid");
                    }
                }
                Err(err) => {
                    stats.inc_invalid_stamp();
                    debug!(chunk_address = %chunk.address(), error = %err, "invalid stamp for chunk");
                }
            }
            stats.add_validation_duration(validation_started.elapsed());
        }

        let mut failure: Option<SamplerError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => Err(SamplerError::Task(err.to_string())),
            };
            if let Err(err) = outcome {
                abort.cancel();
                failure.get_or_insert(err);
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let mut sample_content = Vec::with_capacity(items.len() * 64);
        for entry in &items {
            sample_content.extend_from_slice(entry.chunk_item.address.as_slice());
            sample_content.extend_from_slice(entry.transformed_address.as_slice());
        }
        let content_chunk = Cac::new(&sample_content)?;

        Ok(Sample {
            items,
            sample_content,
            hash: content_chunk.address(),
        })
    }
}

/// Ordered insert of a candidate. Keeps the buffer ascending by
/// transformed address, drops the largest entry past [`SAMPLE_SIZE`]; on a
/// transformed-address tie the earlier arrival keeps its place.
fn insert(items: &mut Vec<SampleEntry>, entry: SampleEntry) {
    match items
        .iter()
        .position(|e| entry.transformed_address < e.transformed_address)
    {
        Some(at) => {
            items.insert(at, entry);
            items.truncate(SAMPLE_SIZE);
        }
        None => {
            if items.len() < SAMPLE_SIZE {
                items.push(entry);
            }
        }
    }
}
