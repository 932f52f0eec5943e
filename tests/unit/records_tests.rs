/*!
 * Tests for records, batching and the output buffer
 */

use gstl::records::{
    BatchResult, Glossary, OutputBuffer, Record, TranslatedEntry, parse_records, partition_batches,
};

use crate::common::sentence_records;

fn results_for(records: &[Record], batch_size: usize) -> Vec<BatchResult> {
    partition_batches(records.to_vec(), batch_size)
        .into_iter()
        .map(|batch| BatchResult {
            batch_id: batch.batch_id,
            results: batch
                .records
                .iter()
                .map(|r| TranslatedEntry { index: r.index, value: format!("vi:{}", r.index) })
                .collect(),
        })
        .collect()
}

#[test]
fn test_outputBuffer_withPermutedResults_shouldMergeIdentically() {
    let records = sentence_records(12);
    let results = results_for(&records, 5);

    let mut in_order = OutputBuffer::new(records.clone());
    for result in &results {
        in_order.apply(result);
    }

    let mut reversed = OutputBuffer::new(records.clone());
    for result in results.iter().rev() {
        reversed.apply(result);
    }

    let mut interleaved = OutputBuffer::new(records);
    for position in [1usize, 2, 0] {
        interleaved.apply(&results[position]);
    }

    assert_eq!(in_order.records(), reversed.records());
    assert_eq!(in_order.records(), interleaved.records());
    assert_eq!(in_order.records()[11].text(), Some("vi:11"));
}

#[test]
fn test_outputBuffer_apply_shouldKeepLengthAndIgnoreUnknownIndex() {
    let mut buffer = OutputBuffer::new(sentence_records(3));
    let applied = buffer.apply(&BatchResult {
        batch_id: 0,
        results: vec![
            TranslatedEntry { index: 1, value: "một".to_string() },
            TranslatedEntry { index: 77, value: "lost".to_string() },
        ],
    });

    assert_eq!(applied, 1);
    assert_eq!(buffer.len(), 3);
    let indices: Vec<u64> = buffer.records().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(buffer.records()[1].text(), Some("một"));
}

#[test]
fn test_partitionBatches_shouldPreserveOrderAndSize() {
    let batches = partition_batches(sentence_records(7), 3);

    assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![3, 3, 1]);
    assert_eq!(batches.iter().map(|b| b.batch_id).collect::<Vec<_>>(), vec![0, 1, 2]);
    let flattened: Vec<u64> = batches.iter().flat_map(|b| b.records.iter().map(|r| r.index)).collect();
    assert_eq!(flattened, (0..7).collect::<Vec<_>>());
}

#[test]
fn test_parseRecords_withMissingIndices_shouldUsePositionAndKeepExtraFields() {
    let records = parse_records(r#"[{"value": "a", "key": "k0"}, {"index": 5, "value": "b"}, {"value": "c"}]"#).unwrap();

    assert_eq!(records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 5, 2]);
    assert_eq!(records[0].extra.get("key"), Some(&serde_json::json!("k0")));

    let round_trip = serde_json::to_string(&records[0]).unwrap();
    assert!(round_trip.contains("\"key\":\"k0\""));
}

#[test]
fn test_parseRecords_withDuplicateIndex_shouldFail() {
    assert!(parse_records(r#"[{"index": 1, "value": "a"}, {"index": 1, "value": "b"}]"#).is_err());
}

#[test]
fn test_glossary_fromJson_shouldKeepFileOrderAndSkipNonText() {
    let glossary = Glossary::from_json_str(r#"{"Sword": "Kiếm", "Count": 3, "Shield": "Khiên"}"#).unwrap();
    assert_eq!(
        glossary.terms(),
        &[("Sword".to_string(), "Kiếm".to_string()), ("Shield".to_string(), "Khiên".to_string())]
    );
}
