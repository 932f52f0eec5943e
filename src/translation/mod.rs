/*!
 * Batch translation of string tables using AI providers.
 *
 * This module contains the concurrent translation machinery. It is split
 * into several submodules:
 *
 * - `orchestrator`: Run lifecycle, dispatch, merge and checkpoint cadence
 * - `worker`: Per-credential workers with rate limiting and retries
 * - `prompts`: Prompt templates and builders for batch translation
 * - `response`: Strict decoding of model responses
 * - `checkpoint`: Checkpoint and output persistence
 */

// Re-export main types for easier usage
pub use self::checkpoint::ProgressStore;
pub use self::orchestrator::{
    Orchestrator, OrchestratorOptions, RESULT_POLL_INTERVAL, RunOutcome, RunState, RunSummary,
};
pub use self::prompts::{BatchPromptBuilder, PromptEntry, PromptTemplate};
pub use self::worker::{RateLimiter, WorkerSettings};

// Submodules
pub mod checkpoint;
pub mod orchestrator;
pub mod prompts;
pub mod response;
pub mod worker;
