/*!
 * # GSTL - Game String Table Localizer
 *
 * A Rust library for classifying and machine-translating the free-text
 * records of a game's string table.
 *
 * ## Features
 *
 * - Score records and split them into safe, review and skipped tiers
 * - Protect placeholders, markup and escapes behind opaque tokens
 * - Translate batches concurrently, one worker per API key:
 *   - Google Gemini API
 *   - OpenAI-compatible chat completions API
 * - Per-key rate limiting and bounded retries
 * - Periodic checkpoints and resume after interruption
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `records`: Dataset records, batches, output buffer and glossary
 * - `protection`: Placeholder protection and restoration
 * - `classifier`: Translatability scoring and partitioning
 * - `translation`: Concurrent batch translation:
 *   - `translation::orchestrator`: Run lifecycle and result merging
 *   - `translation::worker`: Rate-limited workers with retries
 *   - `translation::prompts`: Batch prompt construction
 *   - `translation::response`: Strict response decoding
 *   - `translation::checkpoint`: Checkpoint and output persistence
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code and script utilities
 * - `providers`: Client implementations for LLM services
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod classifier;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod protection;
pub mod providers;
pub mod records;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use classifier::{Classifier, Partition, Verdict};
pub use errors::{AppError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match};
pub use protection::{PlaceholderCodec, TokenCounter};
pub use records::{Glossary, OutputBuffer, Record};
