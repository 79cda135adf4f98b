use std::panic::AssertUnwindSafe;
use std::sync::{Arc, mpsc};

use crate::assets::decode::ImageIngestor;
use crate::assets::raster::Raster;
use crate::extract::{SubjectExtractor, extract_checked};
use crate::foundation::error::{TexturaError, TexturaResult};
use crate::layers::store::ProcessedImageSet;

/// Sequence number of one upload, increasing in submission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// What to do with a completion when a newer upload has been submitted since.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupersedePolicy {
    /// Apply every successful completion in the order it arrives; the last one to finish wins.
    #[default]
    LastCompletionWins,
    /// Apply only the completion of the most recent submission; older ones are discarded.
    LatestSubmissionOnly,
}

/// Loading indicator state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProcessingState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// At least one upload is being ingested or extracted.
    Processing,
    /// The most recent completion produced an image pair.
    Ready,
    /// The most recent completion failed; the previous image pair (if any) is unchanged.
    Failed(String),
}

impl ProcessingState {
    /// `true` while work is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

/// Options for the processing pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineOpts {
    /// Supersede behavior for racing uploads.
    pub policy: SupersedePolicy,
    /// Override the number of worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl PipelineOpts {
    /// Return options with a different supersede policy.
    pub fn with_policy(mut self, policy: SupersedePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return options with an explicit worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

/// Result of handling one completion on the owning thread.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A new image pair is ready to be stored.
    Ready(Generation, ProcessedImageSet),
    /// Ingestion or extraction failed.
    Failed(Generation, TexturaError),
    /// The completion was superseded and dropped.
    Discarded(Generation),
}

struct Completion {
    generation: Generation,
    outcome: TexturaResult<ProcessedImageSet>,
}

/// Runs ingest then extract off the owning thread and hands results back in completion order.
///
/// Adapter work is never cancelled. Which completions are surfaced is governed by
/// [`SupersedePolicy`].
pub struct ProcessingPipeline {
    ingestor: Arc<dyn ImageIngestor>,
    extractor: Arc<dyn SubjectExtractor>,
    pool: rayon::ThreadPool,
    opts: PipelineOpts,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    next_generation: u64,
    latest: Option<Generation>,
    in_flight: usize,
    settled: ProcessingState,
}

impl std::fmt::Debug for ProcessingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingPipeline")
            .field("opts", &self.opts)
            .field("latest", &self.latest)
            .field("in_flight", &self.in_flight)
            .field("settled", &self.settled)
            .finish_non_exhaustive()
    }
}

impl ProcessingPipeline {
    /// Create a pipeline over the given adapters.
    pub fn new(
        ingestor: Arc<dyn ImageIngestor>,
        extractor: Arc<dyn SubjectExtractor>,
        opts: PipelineOpts,
    ) -> TexturaResult<Self> {
        let pool = build_thread_pool(opts.threads)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            ingestor,
            extractor,
            pool,
            opts,
            tx,
            rx,
            next_generation: 1,
            latest: None,
            in_flight: 0,
            settled: ProcessingState::Idle,
        })
    }

    /// Options in effect.
    pub fn opts(&self) -> PipelineOpts {
        self.opts
    }

    /// Most recently submitted generation.
    pub fn latest_generation(&self) -> Option<Generation> {
        self.latest
    }

    /// Number of submissions whose completion has not been handled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Current loading indicator state.
    pub fn state(&self) -> ProcessingState {
        if self.in_flight > 0 {
            ProcessingState::Processing
        } else {
            self.settled.clone()
        }
    }

    /// Start ingest and extraction for `bytes`. Returns immediately.
    pub fn submit(&mut self, bytes: Vec<u8>) -> Generation {
        let generation = Generation(self.next_generation);
        self.next_generation += 1;
        self.latest = Some(generation);
        self.in_flight += 1;
        tracing::debug!(%generation, bytes = bytes.len(), "upload submitted");

        let ingestor = Arc::clone(&self.ingestor);
        let extractor = Arc::clone(&self.extractor);
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let outcome = run_job(ingestor.as_ref(), extractor.as_ref(), &bytes);
            // The receiver only goes away with the pipeline itself.
            let _ = tx.send(Completion {
                generation,
                outcome,
            });
        });
        generation
    }

    /// Handle every completion that has already arrived, without blocking.
    pub fn poll(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while self.in_flight > 0 {
            match self.rx.try_recv() {
                Ok(c) => events.push(self.handle(c)),
                Err(_) => break,
            }
        }
        events
    }

    /// Block until the next completion arrives. Returns `None` when nothing is in flight.
    pub fn wait_next(&mut self) -> Option<PipelineEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let c = self.rx.recv().ok()?;
        Some(self.handle(c))
    }

    /// Block until every submission has completed.
    pub fn wait(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Some(ev) = self.wait_next() {
            events.push(ev);
        }
        events
    }

    fn handle(&mut self, c: Completion) -> PipelineEvent {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion {
            generation,
            outcome,
        } = c;

        let stale = self.opts.policy == SupersedePolicy::LatestSubmissionOnly
            && Some(generation) != self.latest;
        if stale {
            tracing::debug!(%generation, latest = ?self.latest, "discarding superseded completion");
            return PipelineEvent::Discarded(generation);
        }

        match outcome {
            Ok(images) => {
                tracing::debug!(
                    %generation,
                    width = images.size().width,
                    height = images.size().height,
                    "processing completed"
                );
                self.settled = ProcessingState::Ready;
                PipelineEvent::Ready(generation, images)
            }
            Err(err) => {
                tracing::warn!(%generation, error = %err, "processing failed");
                self.settled = ProcessingState::Failed(err.to_string());
                PipelineEvent::Failed(generation, err)
            }
        }
    }
}

#[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
fn run_job(
    ingestor: &dyn ImageIngestor,
    extractor: &dyn SubjectExtractor,
    bytes: &[u8],
) -> TexturaResult<ProcessedImageSet> {
    let source: Raster = guarded(|| ingestor.ingest(bytes), TexturaError::ingestion)
        .map_err(|e| match e {
            TexturaError::Ingestion(_) => e,
            other => TexturaError::ingestion(other.to_string()),
        })?;
    let source = source.flattened();
    let subject = guarded(|| extract_checked(extractor, &source), TexturaError::extraction)?;
    ProcessedImageSet::new(source, subject)
}

/// Run one adapter stage, turning a panic into that stage's error.
fn guarded<T>(
    stage: impl FnOnce() -> TexturaResult<T>,
    on_panic: fn(&'static str) -> TexturaError,
) -> TexturaResult<T> {
    std::panic::catch_unwind(AssertUnwindSafe(stage))
        .unwrap_or_else(|_| Err(on_panic("adapter panicked")))
}

fn build_thread_pool(threads: Option<usize>) -> TexturaResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(TexturaError::validation("threads must be > 0 when provided"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("textura-proc-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TexturaError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/processing.rs"]
mod tests;
