/*!
 * Batch workers.
 *
 * A worker is a task bound to one provider, i.e. one credential. It pulls
 * batches from the shared work queue, protects every record, sends one
 * prompt per batch, validates and restores the answer, and hands a
 * `BatchResult` back to the orchestrator. Each worker owns its rate limiter;
 * nothing is synchronized across workers except the queue itself.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::TranslationError;
use crate::protection::{PlaceholderCodec, Protected, restore};
use crate::providers::Provider;
use crate::records::{Batch, BatchResult, Glossary, TranslatedEntry};
use crate::translation::prompts::{BatchPromptBuilder, PromptEntry};
use crate::translation::response::{ResponseItem, decode_response, salvage_response};

/// Shared receiving end of the work queue
pub type WorkQueue = Arc<Mutex<mpsc::UnboundedReceiver<Batch>>>;

/// Minimum spacing between calls made with one credential
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Limiter allowing `requests_per_minute` calls per minute
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let delay_ms = 60_000 / requests_per_minute.max(1) as u64;
        Self {
            min_interval: Duration::from_millis(delay_ms),
            last_call: None,
        }
    }

    /// Configured spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a call made at `now` would have to wait
    pub fn delay_at(&self, now: Instant) -> Duration {
        match self.last_call {
            Some(last) => self.min_interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleep until the next call is allowed and record it
    pub async fn wait(&mut self) {
        let delay = self.delay_at(Instant::now());
        if !delay.is_zero() {
            debug!("Rate limiting, waiting {:.2}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
        self.last_call = Some(Instant::now());
    }
}

/// Retry and pacing settings for workers
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Call budget per credential
    pub requests_per_minute: u32,
    /// Attempts per batch, first call included
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

/// Everything a worker needs besides its provider and channels
#[derive(Debug)]
pub struct WorkerContext {
    /// Codec shared by every worker
    pub codec: PlaceholderCodec,
    /// Glossary sent with every prompt
    pub glossary: Arc<Glossary>,
    /// Prompt builder for the language pair
    pub prompt_builder: BatchPromptBuilder,
    /// Retry and pacing settings
    pub settings: WorkerSettings,
}

/// What one batch produced
#[derive(Debug)]
pub struct BatchOutcome {
    /// Result handed to the orchestrator
    pub result: BatchResult,
    /// Whether an attempt fully succeeded
    pub succeeded: bool,
    /// Provider calls made
    pub attempts: u32,
    /// The final attempt was refused for the credential
    pub credential_rejected: bool,
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue is closed and empty
    QueueDrained,
    /// The run was cancelled
    Cancelled,
    /// The credential was rejected by the service
    CredentialRejected,
    /// Nobody listens for results anymore
    ResultsClosed,
}

/// Worker loop: dequeue, translate, report, until the queue is drained
pub async fn run_worker(
    name: String,
    provider: Arc<dyn Provider>,
    queue: WorkQueue,
    results: mpsc::UnboundedSender<BatchResult>,
    context: Arc<WorkerContext>,
    cancel: CancellationToken,
) -> WorkerExit {
    let mut limiter = RateLimiter::per_minute(context.settings.requests_per_minute);
    info!("[{}] Started with {}", name, provider.name());

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("[{}] Cancelled while waiting for work", name);
                return WorkerExit::Cancelled;
            }
            batch = async { queue.lock().await.recv().await } => batch,
        };

        let Some(batch) = next else {
            info!("[{}] Queue drained, stopping", name);
            return WorkerExit::QueueDrained;
        };

        info!("[{}] Processing batch #{} ({} records)", name, batch.batch_id, batch.len());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("[{}] Cancelled during batch #{}", name, batch.batch_id);
                return WorkerExit::Cancelled;
            }
            outcome = process_batch(&name, provider.as_ref(), &batch, &context, &mut limiter) => outcome,
        };

        let retire = outcome.credential_rejected;
        if results.send(outcome.result).is_err() {
            warn!("[{}] Result channel closed, stopping", name);
            return WorkerExit::ResultsClosed;
        }
        if retire {
            error!("[{}] Credential rejected by {}, retiring worker", name, provider.name());
            return WorkerExit::CredentialRejected;
        }
    }
}

/// Translate one batch with bounded retries
///
/// Records are protected once; every attempt resends the same prompt. After
/// the last failed attempt the result holds whatever could be salvaged from
/// the most recent response.
pub async fn process_batch(
    worker: &str,
    provider: &dyn Provider,
    batch: &Batch,
    context: &WorkerContext,
    limiter: &mut RateLimiter,
) -> BatchOutcome {
    let protected: Vec<(u64, Protected)> = batch
        .records
        .iter()
        .map(|record| (record.index, context.codec.protect(record.text().unwrap_or_default())))
        .collect();

    let entries: Vec<PromptEntry> = protected
        .iter()
        .map(|(index, p)| PromptEntry {
            index: *index,
            text: p.text.clone(),
        })
        .collect();
    let expected: Vec<u64> = entries.iter().map(|e| e.index).collect();
    let prompt = context.prompt_builder.build(&entries, &context.glossary);

    let max_attempts = context.settings.max_attempts.max(1);
    let mut last_response: Option<String> = None;
    let mut last_error: Option<TranslationError> = None;
    let mut attempts = 0;

    while attempts < max_attempts {
        attempts += 1;
        limiter.wait().await;

        let start = Instant::now();
        match provider.complete(&prompt).await {
            Ok(raw) => {
                debug!("[{}] Batch #{} answered in {:?}", worker, batch.batch_id, start.elapsed());
                match decode_response(&raw, &expected) {
                    Ok(items) => {
                        let results = restore_items(items, &protected);
                        info!(
                            "[{}] Batch #{} translated ({} of {} records)",
                            worker,
                            batch.batch_id,
                            results.len(),
                            batch.len()
                        );
                        return BatchOutcome {
                            result: BatchResult { batch_id: batch.batch_id, results },
                            succeeded: true,
                            attempts,
                            credential_rejected: false,
                        };
                    }
                    Err(e) => {
                        warn!("[{}] Batch #{} attempt {} rejected: {}", worker, batch.batch_id, attempts, e);
                        last_response = Some(raw);
                        last_error = Some(e);
                    }
                }
            }
            Err(e) => {
                warn!("[{}] Batch #{} attempt {} failed: {}", worker, batch.batch_id, attempts, e);
                last_error = Some(TranslationError::Provider(e));
            }
        }

        if attempts < max_attempts {
            tokio::time::sleep(context.settings.retry_delay).await;
        }
    }

    let salvaged = last_response
        .as_deref()
        .map(|raw| salvage_response(raw, &expected))
        .unwrap_or_default();
    let results = restore_items(salvaged, &protected);
    error!(
        "[{}] Abandoning batch #{} after {} attempt(s), salvaged {} of {} records: {}",
        worker,
        batch.batch_id,
        attempts,
        results.len(),
        batch.len(),
        last_error.as_ref().map(|e| e.to_string()).unwrap_or_default()
    );

    let credential_rejected = matches!(
        &last_error,
        Some(TranslationError::Provider(e)) if e.is_credential_failure()
    );

    BatchOutcome {
        result: BatchResult { batch_id: batch.batch_id, results },
        succeeded: false,
        attempts,
        credential_rejected,
    }
}

/// Restore each translation with its own record's replacements
///
/// Output follows batch order; empty translations are dropped.
fn restore_items(items: Vec<ResponseItem>, protected: &[(u64, Protected)]) -> Vec<TranslatedEntry> {
    let mut by_index: HashMap<u64, String> = items
        .into_iter()
        .map(|item| (item.index, item.translation))
        .collect();

    protected
        .iter()
        .filter_map(|(index, p)| {
            let translation = by_index.remove(index)?;
            if translation.is_empty() {
                return None;
            }
            Some(TranslatedEntry {
                index: *index,
                value: restore(&translation, &p.replacements),
            })
        })
        .collect()
}
