/*!
 * End-to-end tests of the classify, translate and merge commands
 */

use std::sync::Arc;

use gstl::app_controller::{Controller, REVIEW_FILE_NAME, SAFE_FILE_NAME, SKIPPED_FILE_NAME};
use gstl::providers::Provider;
use gstl::providers::mock::{MOCK_TRANSLATION_SUFFIX, MockProvider};
use gstl::records::Record;
use gstl::translation::RunOutcome;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::common::{create_temp_dir, create_test_file, create_test_string_table, read_records, test_config};

#[test]
fn test_classify_withStringTable_shouldWriteThreeTiers() {
    let dir = create_temp_dir().unwrap();
    create_test_string_table(dir.path(), "strings.json").unwrap();
    let controller = Controller::with_config(test_config(dir.path())).unwrap();

    let partition = controller.classify().unwrap();

    let output_dir = dir.path().join("classified");
    let safe = read_records(&output_dir.join(SAFE_FILE_NAME)).unwrap();
    let review = read_records(&output_dir.join(REVIEW_FILE_NAME)).unwrap();
    let skipped = read_records(&output_dir.join(SKIPPED_FILE_NAME)).unwrap();

    assert_eq!(safe.len() + review.len() + skipped.len(), 8);
    assert_eq!(partition.total(), 8);
    assert!(safe.iter().any(|r| r.index == 0));
    assert!(skipped.iter().any(|r| r.index == 6 && r.value == json!(42)));
    assert!(skipped.iter().any(|r| r.index == 7));
}

#[test]
fn test_classify_withMissingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(test_config(dir.path())).unwrap();
    assert!(controller.classify().is_err());
}

#[tokio::test]
async fn test_translateWith_withWorkingMocks_shouldWriteOutputForPendingRecords() {
    let dir = create_temp_dir().unwrap();
    create_test_string_table(dir.path(), "strings.json").unwrap();
    create_test_file(dir.path(), "glossary.json", r#"{"summit": "đỉnh núi"}"#).unwrap();
    let mut config = test_config(dir.path());
    config.batching.initial_batch_size = 3;
    config.batching.min_batch_size = 1;
    let controller = Controller::with_config(config).unwrap();

    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(MockProvider::working().with_label("a")),
        Arc::new(MockProvider::working().with_label("b")),
    ];
    let outcome = controller.translate_with(providers, CancellationToken::new()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    let output = read_records(&dir.path().join("strings_translated.json")).unwrap();
    assert_eq!(output.len(), 8);
    assert_eq!(
        output[1].text(),
        Some(format!("Press <b>{{0}}</b> to open the map.{}", MOCK_TRANSLATION_SUFFIX).as_str())
    );
    // Already translated, blank and non-text records are left alone
    assert_eq!(output[5].text(), Some(""));
    assert_eq!(output[6].value, json!(42));
    assert_eq!(output[7].text(), Some("Bạn đã đến đỉnh núi."));
    assert!(!dir.path().join("strings_checkpoint.json").exists());
}

#[tokio::test]
async fn test_translate_withOnlyPlaceholderKeys_shouldFailBeforeDispatch() {
    let dir = create_temp_dir().unwrap();
    create_test_string_table(dir.path(), "strings.json").unwrap();
    let controller = Controller::with_config(test_config(dir.path())).unwrap();

    assert!(controller.translate().await.is_err());
    assert!(!dir.path().join("strings_translated.json").exists());
}

#[tokio::test]
async fn test_translateWith_withRejectedCredentials_shouldKeepCheckpoint() {
    let dir = create_temp_dir().unwrap();
    create_test_string_table(dir.path(), "strings.json").unwrap();
    let mut config = test_config(dir.path());
    config.batching.initial_batch_size = 1;
    config.batching.min_batch_size = 1;
    let controller = Controller::with_config(config).unwrap();

    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(MockProvider::auth_failing())];
    let error = controller.translate_with(providers, CancellationToken::new()).await.unwrap_err();

    assert!(format!("{:#}", error).contains("strings_checkpoint.json"));
    assert!(dir.path().join("strings_checkpoint.json").exists());
    assert!(!dir.path().join("strings_translated.json").exists());
}

#[tokio::test]
async fn test_classifyThenTranslate_shouldDrawTokensFromOneCounter() {
    let dir = create_temp_dir().unwrap();
    create_test_string_table(dir.path(), "strings.json").unwrap();
    let mut config = test_config(dir.path());
    config.batching.initial_batch_size = 3;
    config.batching.min_batch_size = 1;
    let controller = Controller::with_config(config).unwrap();
    let counter = Arc::clone(controller.codec().counter());

    controller.classify().unwrap();
    let after_classify = counter.issued();
    assert!(after_classify > 0);

    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(MockProvider::working())];
    controller.translate_with(providers, CancellationToken::new()).await.unwrap();
    assert!(counter.issued() > after_classify);
}

#[test]
fn test_merge_shouldOverwriteByIndexAndKeepCount() {
    let dir = create_temp_dir().unwrap();
    let original = vec![Record::new(0, "Hello"), Record::new(1, "Sword"), Record::new(2, "Goodbye")];
    let translated = vec![Record::new(2, "Tạm biệt"), Record::new(0, "Xin chào")];
    create_test_file(dir.path(), "strings.json", &serde_json::to_string(&original).unwrap()).unwrap();
    create_test_file(dir.path(), "strings_translated.json", &serde_json::to_string(&translated).unwrap()).unwrap();
    let controller = Controller::with_config(test_config(dir.path())).unwrap();

    let report = controller.merge().unwrap();

    assert_eq!(report.total_records, 3);
    assert_eq!(report.updated_records, 2);
    let merged = read_records(&controller.final_output_path()).unwrap();
    let values: Vec<Option<&str>> = merged.iter().map(|r| r.text()).collect();
    assert_eq!(values, vec![Some("Xin chào"), Some("Sword"), Some("Tạm biệt")]);
}
