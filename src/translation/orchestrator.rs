/*!
 * Translation run orchestration.
 *
 * The orchestrator filters the dataset down to records that still need
 * translation, cuts them into batches, starts one worker per provider and
 * merges the results back into a position-indexed copy of the dataset. It
 * is the only owner of that buffer. Progress is checkpointed at a fixed
 * cadence and on interruption; the checkpoint is removed once the final
 * output has been written.
 */

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;
use crate::language_utils::TargetScript;
use crate::protection::PlaceholderCodec;
use crate::providers::Provider;
use crate::records::{Batch, BatchResult, Glossary, OutputBuffer, Record, partition_batches};
use crate::translation::checkpoint::ProgressStore;
use crate::translation::prompts::BatchPromptBuilder;
use crate::translation::worker::{WorkerContext, WorkerExit, WorkerSettings, run_worker};

/// How often the merge loop wakes up without results
pub const RESULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing started yet
    Idle,
    /// Filtering and enqueueing batches
    Dispatching,
    /// Workers are translating
    Running,
    /// Every batch merged and output written
    Completed,
    /// Stopped by an external signal
    Interrupted,
    /// Every worker stopped before the run finished
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Run parameters
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Records per batch
    pub batch_size: usize,
    /// Completed batches between checkpoints
    pub checkpoint_every: usize,
    /// Worker pacing and retries
    pub worker: WorkerSettings,
    /// Source language name used in prompts
    pub source_language: String,
    /// Target language name used in prompts
    pub target_language: String,
    /// Free-form description of the game
    pub game_context: Option<String>,
}

/// Counters describing a finished or stopped run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Final state
    pub state: RunState,
    /// Records in the dataset
    pub total_records: usize,
    /// Records sent to workers
    pub dispatched_records: usize,
    /// Records that received a translation
    pub translated_records: usize,
    /// Batches created
    pub total_batches: usize,
    /// Batches merged
    pub completed_batches: usize,
}

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Output written, checkpoint removed
    Completed(RunSummary),
    /// Checkpoint written, no output
    Interrupted(RunSummary),
}

impl RunOutcome {
    /// Summary of the run
    pub fn summary(&self) -> &RunSummary {
        match self {
            Self::Completed(summary) | Self::Interrupted(summary) => summary,
        }
    }
}

/// Drives one translation run
pub struct Orchestrator {
    providers: Vec<Arc<dyn Provider>>,
    codec: PlaceholderCodec,
    glossary: Arc<Glossary>,
    target_script: Arc<TargetScript>,
    store: ProgressStore,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Create an orchestrator with one provider per credential
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        codec: PlaceholderCodec,
        glossary: Arc<Glossary>,
        target_script: Arc<TargetScript>,
        store: ProgressStore,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            providers,
            codec,
            glossary,
            target_script,
            store,
            options,
        }
    }

    /// Persistence used by this run
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Records that still need translation
    ///
    /// Text values that are not blank and hold fewer than two characters of
    /// the target script. Already translated records fall out here, which is
    /// what makes resuming from a checkpoint work.
    pub fn select_pending(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|record| record.text().is_some_and(|text| self.target_script.needs_translation(text)))
            .cloned()
            .collect()
    }

    fn transition(&self, from: RunState, to: RunState) {
        info!("Run state: {} -> {}", from, to);
    }

    /// Translate every pending record of `records`
    ///
    /// `progress` is called with `(completed, total)` batches after each
    /// merge. Cancelling `cancel` checkpoints the current buffer and returns
    /// [`RunOutcome::Interrupted`].
    pub async fn run<F>(
        &self,
        records: Vec<Record>,
        cancel: CancellationToken,
        progress: F,
    ) -> Result<RunOutcome, TranslationError>
    where
        F: Fn(usize, usize),
    {
        self.transition(RunState::Idle, RunState::Dispatching);

        let pending = self.select_pending(&records);
        let dispatched_records = pending.len();
        let mut buffer = OutputBuffer::new(records);
        let batches = partition_batches(pending, self.options.batch_size);
        let total = batches.len();

        let mut summary = RunSummary {
            state: RunState::Dispatching,
            total_records: buffer.len(),
            dispatched_records,
            translated_records: 0,
            total_batches: total,
            completed_batches: 0,
        };

        info!(
            "{} of {} records need translation, {} batch(es) of up to {}",
            dispatched_records,
            buffer.len(),
            total,
            self.options.batch_size
        );

        if total == 0 {
            self.transition(RunState::Dispatching, RunState::Completed);
            self.store.write_output(buffer.records())?;
            self.store.clear_checkpoint()?;
            summary.state = RunState::Completed;
            return Ok(RunOutcome::Completed(summary));
        }

        let (work_tx, work_rx) = mpsc::unbounded_channel::<Batch>();
        for batch in batches {
            // The receiver is alive in this scope
            let _ = work_tx.send(batch);
        }
        drop(work_tx);

        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<BatchResult>();
        let worker_cancel = cancel.child_token();
        let handles = self.spawn_workers(Arc::new(Mutex::new(work_rx)), result_tx, &worker_cancel);

        self.transition(RunState::Dispatching, RunState::Running);
        summary.state = RunState::Running;

        let mut ticker = tokio::time::interval(RESULT_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while summary.completed_batches < total {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.transition(RunState::Running, RunState::Interrupted);
                    worker_cancel.cancel();
                    for handle in &handles {
                        handle.abort();
                    }
                    self.store.save_checkpoint(buffer.records())?;
                    warn!(
                        "Interrupted after {} of {} batches; progress saved to {:?}",
                        summary.completed_batches,
                        total,
                        self.store.checkpoint_path()
                    );
                    summary.state = RunState::Interrupted;
                    return Ok(RunOutcome::Interrupted(summary));
                }
                message = result_rx.recv() => match message {
                    Some(result) => {
                        summary.translated_records += buffer.apply(&result);
                        summary.completed_batches += 1;
                        progress(summary.completed_batches, total);

                        if summary.completed_batches % self.options.checkpoint_every.max(1) == 0
                            && summary.completed_batches < total
                        {
                            self.store.save_checkpoint(buffer.records())?;
                        }
                    }
                    None => {
                        self.transition(RunState::Running, RunState::Aborted);
                        self.store.save_checkpoint(buffer.records())?;
                        error!(
                            "All workers stopped after {} of {} batches; progress saved to {:?}",
                            summary.completed_batches,
                            total,
                            self.store.checkpoint_path()
                        );
                        return Err(TranslationError::WorkersExhausted {
                            completed: summary.completed_batches,
                            total,
                            checkpoint: self.store.checkpoint_path().to_path_buf(),
                        });
                    }
                },
                _ = ticker.tick() => {
                    let alive = handles.iter().filter(|h| !h.is_finished()).count();
                    debug!(
                        "{} of {} batches merged, {} worker(s) alive",
                        summary.completed_batches,
                        total,
                        alive
                    );
                }
            }
        }

        self.transition(RunState::Running, RunState::Completed);
        for handle in handles {
            match handle.await {
                Ok(exit) => debug!("Worker finished: {:?}", exit),
                Err(e) => warn!("Worker task failed: {}", e),
            }
        }

        self.store.write_output(buffer.records())?;
        self.store.clear_checkpoint()?;
        summary.state = RunState::Completed;
        info!(
            "Translated {} of {} dispatched records",
            summary.translated_records, summary.dispatched_records
        );
        Ok(RunOutcome::Completed(summary))
    }

    fn spawn_workers(
        &self,
        queue: Arc<Mutex<mpsc::UnboundedReceiver<Batch>>>,
        results: mpsc::UnboundedSender<BatchResult>,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<WorkerExit>> {
        let prompt_builder = BatchPromptBuilder::new(&self.options.source_language, &self.options.target_language)
            .with_game_context(self.options.game_context.as_deref());
        let context = Arc::new(WorkerContext {
            codec: self.codec.clone(),
            glossary: self.glossary.clone(),
            prompt_builder,
            settings: self.options.worker.clone(),
        });

        info!("Starting {} worker(s)", self.providers.len());
        self.providers
            .iter()
            .enumerate()
            .map(|(i, provider)| {
                tokio::spawn(run_worker(
                    format!("worker-{}", i),
                    provider.clone(),
                    queue.clone(),
                    results.clone(),
                    context.clone(),
                    cancel.clone(),
                ))
            })
            .collect()
    }
}
