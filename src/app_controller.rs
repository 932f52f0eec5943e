use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::classifier::{Classifier, Partition, classify_records};
use crate::errors::{AppError, TranslationError};
use crate::file_utils::FileManager;
use crate::language_utils::TargetScript;
use crate::protection::PlaceholderCodec;
use crate::providers::{self, Provider, mask_key};
use crate::records::{Glossary, Record, parse_records};
use crate::translation::{Orchestrator, OrchestratorOptions, ProgressStore, RunOutcome};

// @module: Application controller for the classify, translate and merge commands

/// File names written by the classify command
pub const SAFE_FILE_NAME: &str = "_1_safe_to_translate.json";
pub const REVIEW_FILE_NAME: &str = "_2_needs_review.json";
pub const SKIPPED_FILE_NAME: &str = "_3_skipped_technical.json";

/// Counts reported by the merge command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub total_records: usize,
    pub updated_records: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Token source shared by every command run through this controller
    codec: PlaceholderCodec,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self {
            config,
            codec: PlaceholderCodec::new(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Placeholder codec handed to the classifier and to translation workers
    pub fn codec(&self) -> &PlaceholderCodec {
        &self.codec
    }

    fn read_records(path: &Path) -> Result<Vec<Record>> {
        if !FileManager::file_exists(path) {
            return Err(anyhow!("Input file does not exist: {:?}", path));
        }
        let content = FileManager::read_to_string(path)?;
        let records = parse_records(&content).with_context(|| format!("Failed to parse records from {:?}", path))?;
        Ok(records)
    }

    fn progress_bar(len: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Build the classifier for the configured target language
    pub fn classifier(&self) -> Result<Classifier> {
        let target_script = TargetScript::for_language(&self.config.target_language)?;
        Ok(Classifier::new(self.codec.clone(), Arc::new(target_script)))
    }

    /// Split the input file into safe, review and skipped tiers on disk
    pub fn classify(&self) -> Result<Partition> {
        let input = &self.config.input_file;
        let records = Self::read_records(input)?;
        info!("Classifying {} records from {:?}", records.len(), input);

        let classifier = self.classifier()?;
        let thresholds = &self.config.classification;
        let progress_bar = Self::progress_bar(records.len() as u64, "records");

        let partition = classify_records(
            &classifier,
            records,
            thresholds.safe_translation_threshold,
            thresholds.base_translation_threshold,
            |_, _| progress_bar.inc(1),
        );
        progress_bar.finish_and_clear();

        let output_dir = &thresholds.output_dir;
        FileManager::ensure_dir(output_dir)?;
        FileManager::write_json_atomic(output_dir.join(SAFE_FILE_NAME), &partition.safe)?;
        FileManager::write_json_atomic(output_dir.join(REVIEW_FILE_NAME), &partition.review)?;
        FileManager::write_json_atomic(output_dir.join(SKIPPED_FILE_NAME), &partition.skipped)?;

        info!("Classification finished, results in {:?}", output_dir);
        info!("  - Safe to translate: {}", partition.safe.len());
        info!("  - Needs review: {}", partition.review.len());
        info!("  - Skipped technical: {}", partition.skipped.len());

        Ok(partition)
    }

    /// Providers for every usable credential
    pub fn build_providers(&self) -> Result<Vec<Arc<dyn Provider>>> {
        let translation = &self.config.translation;
        let keys = translation.usable_api_keys();
        if keys.is_empty() {
            return Err(AppError::Config(
                "No usable API keys configured (placeholders containing 'YOUR_' are ignored)".to_string(),
            )
            .into());
        }
        for key in &keys {
            debug!("Using {} credential {}", translation.provider, mask_key(key));
        }
        Ok(providers::create_providers(translation.provider, &keys, &translation.provider_settings()))
    }

    fn orchestrator(&self, providers: Vec<Arc<dyn Provider>>) -> Result<Orchestrator> {
        let config = &self.config;
        let glossary = Glossary::load(&config.glossary_file)
            .with_context(|| format!("Failed to load glossary {:?}", config.glossary_file))?;
        info!("Glossary: {} term(s)", glossary.len());

        let target_script = TargetScript::for_language(&config.target_language)?;
        let store = ProgressStore::new(&config.checkpoint_file, &config.output_file);
        let options = OrchestratorOptions {
            batch_size: config.batching.effective_batch_size(),
            checkpoint_every: config.batching.checkpoint_every,
            worker: config.translation.worker_settings(),
            source_language: config.source_language_name()?,
            target_language: config.target_language_name()?,
            game_context: config.translation.game_context.clone(),
        };

        Ok(Orchestrator::new(
            providers,
            self.codec.clone(),
            Arc::new(glossary),
            Arc::new(target_script),
            store,
            options,
        ))
    }

    /// Translate the input file, resuming from the checkpoint when present
    ///
    /// Ctrl+C checkpoints the run and returns successfully.
    pub async fn translate(&self) -> Result<RunOutcome> {
        let providers = self.build_providers()?;
        let cancel = CancellationToken::new();

        let signal_token = cancel.clone();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, saving progress...");
                signal_token.cancel();
            }
        });

        let outcome = self.translate_with(providers, cancel).await;
        signal_task.abort();
        outcome
    }

    /// Run translation with explicit providers and cancellation token
    pub async fn translate_with(
        &self,
        providers: Vec<Arc<dyn Provider>>,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        let orchestrator = self.orchestrator(providers)?;
        let store = orchestrator.store().clone();

        let records = match store.load_checkpoint()? {
            Some(records) => {
                info!("Resuming from checkpoint {:?} ({} records)", store.checkpoint_path(), records.len());
                records
            }
            None => Self::read_records(&self.config.input_file)?,
        };

        let progress_bar = Self::progress_bar(0, "batches");
        let bar = progress_bar.clone();
        let result = orchestrator
            .run(records, cancel, move |completed, total| {
                bar.set_length(total as u64);
                bar.set_position(completed as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        match result {
            Ok(RunOutcome::Completed(summary)) => {
                info!(
                    "Translation complete: {} of {} dispatched record(s) translated. Output saved to {:?}",
                    summary.translated_records,
                    summary.dispatched_records,
                    store.output_path()
                );
                Ok(RunOutcome::Completed(summary))
            }
            Ok(RunOutcome::Interrupted(summary)) => {
                warn!(
                    "Translation interrupted after {}/{} batches. Progress saved to {:?}, run again to resume.",
                    summary.completed_batches,
                    summary.total_batches,
                    store.checkpoint_path()
                );
                Ok(RunOutcome::Interrupted(summary))
            }
            Err(e @ TranslationError::WorkersExhausted { .. }) => {
                error!("{}", e);
                Err(AppError::Translation(e).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Translation run failed")),
        }
    }

    /// Merge the translated file back into the original dataset
    pub fn merge(&self) -> Result<MergeReport> {
        let merge = &self.config.merge;
        let original = Self::read_records(&merge.original_file)?;
        info!("Read {} records from original file {:?}", original.len(), merge.original_file);
        let translated = Self::read_records(&merge.translated_file)?;
        info!("Read {} translated records from {:?}", translated.len(), merge.translated_file);

        let (merged, report) = merge_records(original, translated)?;
        info!("Updated {} record(s)", report.updated_records);

        FileManager::write_json_atomic(&merge.final_output_file, &merged)
            .with_context(|| format!("Failed to write {:?}", merge.final_output_file))?;
        info!("Final dataset saved to {:?}", merge.final_output_file);
        Ok(report)
    }

    /// Path of the merged dataset
    pub fn final_output_path(&self) -> PathBuf {
        self.config.merge.final_output_file.clone()
    }
}

/// Overwrite original values with translated ones by index
///
/// Translated entries whose index is not in the original are ignored.
pub fn merge_records(original: Vec<Record>, translated: Vec<Record>) -> Result<(Vec<Record>, MergeReport)> {
    let expected = original.len();
    let positions: HashMap<u64, usize> = original
        .iter()
        .enumerate()
        .map(|(position, record)| (record.index, position))
        .collect();

    let mut merged = original;
    let mut updated_records = 0;
    for record in translated {
        match positions.get(&record.index) {
            Some(&position) => {
                merged[position].value = record.value;
                updated_records += 1;
            }
            None => debug!("Translated index {} not present in original", record.index),
        }
    }

    if merged.len() != expected {
        return Err(anyhow!(
            "Merged dataset has {} records, original has {}",
            merged.len(),
            expected
        ));
    }

    Ok((
        merged,
        MergeReport {
            total_records: expected,
            updated_records,
        },
    ))
}
