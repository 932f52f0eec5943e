/*!
 * Interrupt and resume behavior of translation runs
 */

use std::sync::Arc;

use gstl::app_controller::Controller;
use gstl::language_utils::TargetScript;
use gstl::protection::PlaceholderCodec;
use gstl::providers::Provider;
use gstl::providers::mock::{MOCK_TRANSLATION_SUFFIX, MockProvider};
use gstl::records::{Glossary, Record};
use gstl::translation::{Orchestrator, OrchestratorOptions, ProgressStore, RunOutcome, WorkerSettings};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::common::{create_temp_dir, create_test_file, read_records, sentence_records, test_config};

fn single_record_config(dir: &std::path::Path) -> gstl::app_config::Config {
    let mut config = test_config(dir);
    config.batching.initial_batch_size = 1;
    config.batching.min_batch_size = 1;
    config.batching.checkpoint_every = 100;
    config
}

fn write_input(dir: &std::path::Path, records: &[Record]) {
    create_test_file(dir, "strings.json", &serde_json::to_string(records).unwrap()).unwrap();
}

#[tokio::test]
async fn test_resume_afterInterrupt_shouldMatchUninterruptedRun() {
    let records = sentence_records(10);

    // Uninterrupted reference run
    let reference_dir = create_temp_dir().unwrap();
    write_input(reference_dir.path(), &records);
    let reference = Controller::with_config(single_record_config(reference_dir.path())).unwrap();
    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(MockProvider::working())];
    reference.translate_with(providers, CancellationToken::new()).await.unwrap();
    let expected = read_records(&reference_dir.path().join("strings_translated.json")).unwrap();

    // Interrupted after three batches
    let dir = create_temp_dir().unwrap();
    write_input(dir.path(), &records);
    let config = single_record_config(dir.path());
    let store = ProgressStore::new(&config.checkpoint_file, &config.output_file);
    let stalling: Vec<Arc<dyn Provider>> = vec![Arc::new(MockProvider::stalling_after(3))];
    let orchestrator = Orchestrator::new(
        stalling,
        PlaceholderCodec::new(),
        Arc::new(Glossary::default()),
        Arc::new(TargetScript::for_language("vi").unwrap()),
        store.clone(),
        OrchestratorOptions {
            batch_size: 1,
            checkpoint_every: 100,
            worker: WorkerSettings {
                requests_per_minute: 60_000,
                max_attempts: 2,
                retry_delay: Duration::from_millis(1),
            },
            source_language: "English".to_string(),
            target_language: "Vietnamese".to_string(),
            game_context: None,
        },
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let outcome = orchestrator
        .run(records.clone(), cancel, move |completed, _| {
            if completed == 3 {
                trigger.cancel();
            }
        })
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Interrupted(_)));
    assert!(!store.output_path().exists());
    let checkpoint = store.load_checkpoint().unwrap().unwrap();
    let translated = checkpoint
        .iter()
        .filter(|r| r.text().is_some_and(|t| t.ends_with(MOCK_TRANSLATION_SUFFIX)))
        .count();
    assert_eq!(translated, 3);

    // Resume through the controller, which picks up the checkpoint
    let resumed_provider = MockProvider::working();
    let counter = resumed_provider.clone();
    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(resumed_provider)];
    let controller = Controller::with_config(config).unwrap();
    let outcome = controller
        .translate_with(providers, CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert_eq!(outcome.summary().dispatched_records, 7);
    assert_eq!(counter.request_count(), 7);
    assert!(!store.has_checkpoint());

    let resumed = read_records(store.output_path()).unwrap();
    assert_eq!(resumed, expected);
}

#[tokio::test]
async fn test_resume_withCompletedCheckpoint_shouldDispatchNothing() {
    let dir = create_temp_dir().unwrap();
    let config = single_record_config(dir.path());
    let done: Vec<Record> = sentence_records(4)
        .into_iter()
        .map(|r| Record::new(r.index, MockProvider::translate_text(r.text().unwrap_or_default())))
        .collect();
    create_test_file(dir.path(), "strings_checkpoint.json", &serde_json::to_string(&done).unwrap()).unwrap();

    let provider = MockProvider::working();
    let counter = provider.clone();
    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(provider)];
    let controller = Controller::with_config(config).unwrap();
    let outcome = controller
        .translate_with(providers, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.summary().total_batches, 0);
    assert_eq!(counter.request_count(), 0);
    assert_eq!(read_records(&dir.path().join("strings_translated.json")).unwrap(), done);
    assert!(!dir.path().join("strings_checkpoint.json").exists());
}
