/*!
 * Translatability classification for string-table records.
 *
 * Every string goes through three stages: input normalization, a set of hard
 * rejection rules that are independent of any threshold, and a heuristic
 * score computed on the text left once all protected placeholders have been
 * stripped. A record is accepted at a threshold when its score reaches it.
 */

use std::fmt;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::language_utils::{CJK_REGEX, TargetScript};
use crate::protection::{PlaceholderCodec, strip_tokens};
use crate::records::Record;

static PATCH_NOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[(?:[\d.]+|Internal Test Version \d+)\s+Patch Notes\]$").expect("Invalid patch note regex")
});

static CODE_OPERATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"==|!=|<=|>=|&&|\|\|").expect("Invalid operator regex"));

static METHOD_CALL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\w+\(.*\)").expect("Invalid method call regex"));

static DOT_SEPARATED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+(?:\.[a-zA-Z0-9_-]+)+$").expect("Invalid dotted regex"));

/// camelCase, PascalCase, kebab-case, snake_case, SCREAMING_SNAKE
static IDENTIFIER_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[a-z]+[A-Z][a-zA-Z0-9]*$",
        r"^[A-Z][a-zA-Z0-9]+$",
        r"^[a-z0-9]+(?:-[a-z0-9]+)+$",
        r"^[a-z0-9_]+(?:_[a-z0-9]+)+$",
        r"^[A-Z_]+[A-Z0-9_]*[A-Z_]+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid identifier regex"))
    .collect()
});

static CAMEL_HUMP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z]+[A-Z]").expect("Invalid camel hump regex"));

static KEYWORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:null|void|int|string|bool|var|let|const|true|false)\b").expect("Invalid keyword regex")
});

/// Function words that mark ordinary English prose
const COMMON_WORDS: [&str; 12] = ["the", "is", "you", "are", "to", "in", "of", "for", "with", "on", "at", "a"];

/// Minimum characters left after placeholders are stripped
const MIN_MEANINGFUL_CHARS: usize = 2;

/// Why a string was rejected before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Empty or whitespace-only
    Empty,
    /// The value is not a string
    NotText,
    /// Version header or patch-note title
    PatchNote,
    /// Contains operators or method-call syntax
    CodeLike,
    /// Contains CJK, Kana, Hangul or full-width characters
    AsianScript,
    /// Already contains target-language script
    AlreadyTranslated,
    /// Contains no Latin letter
    NoLetters,
    /// A single identifier or path
    Identifier,
    /// Nothing meaningful left once placeholders are removed
    TooShort,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Empty => "empty",
            Self::NotText => "not text",
            Self::PatchNote => "patch note",
            Self::CodeLike => "code-like",
            Self::AsianScript => "asian script",
            Self::AlreadyTranslated => "already translated",
            Self::NoLetters => "no letters",
            Self::Identifier => "identifier or path",
            Self::TooShort => "too short",
        };
        f.write_str(label)
    }
}

/// Outcome of evaluating one string, independent of any threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Hard-rejected; never accepted at any threshold
    Rejected(RejectReason),
    /// Passed the hard rules and was scored
    Scored {
        /// Heuristic score
        score: i32,
        /// Text the score was computed on
        meaningful_text: String,
    },
}

impl Verdict {
    /// Whether this verdict is accepted at the given threshold
    pub fn accepts(&self, threshold: i32) -> bool {
        match self {
            Self::Rejected(_) => false,
            Self::Scored { score, .. } => *score >= threshold,
        }
    }

    /// The score, if the string was scored
    pub fn score(&self) -> Option<i32> {
        match self {
            Self::Rejected(_) => None,
            Self::Scored { score, .. } => Some(*score),
        }
    }
}

/// Decides whether strings are natural-language content worth translating
#[derive(Debug, Clone)]
pub struct Classifier {
    codec: PlaceholderCodec,
    target_script: Arc<TargetScript>,
}

impl Classifier {
    /// Create a classifier for the given target script
    pub fn new(codec: PlaceholderCodec, target_script: Arc<TargetScript>) -> Self {
        Self { codec, target_script }
    }

    /// Evaluate a JSON value; anything but a string is rejected
    pub fn evaluate_value(&self, value: &Value) -> Verdict {
        match value.as_str() {
            Some(text) => self.evaluate(text),
            None => Verdict::Rejected(RejectReason::NotText),
        }
    }

    /// Run the hard rules and, if they pass, score the meaningful text
    pub fn evaluate(&self, text: &str) -> Verdict {
        let text = text.trim();
        if text.is_empty() {
            return Verdict::Rejected(RejectReason::Empty);
        }

        if let Some(reason) = self.hard_rejection(text) {
            return Verdict::Rejected(reason);
        }

        let protected = self.codec.protect(text);
        let meaningful = strip_tokens(&protected.text).trim().to_string();
        if meaningful.chars().count() < MIN_MEANINGFUL_CHARS {
            return Verdict::Rejected(RejectReason::TooShort);
        }

        Verdict::Scored {
            score: score(&meaningful),
            meaningful_text: meaningful,
        }
    }

    /// Whether `text` is accepted at `threshold`
    pub fn should_translate(&self, text: &str, threshold: i32) -> bool {
        let verdict = self.evaluate(text);
        let accepted = verdict.accepts(threshold);
        match &verdict {
            Verdict::Rejected(reason) => debug!("[skip] {} | '{}'", reason, preview(text)),
            Verdict::Scored { score, meaningful_text } => debug!(
                "[{}] score {} | threshold {} | '{}'",
                if accepted { "translate" } else { "skip" },
                score,
                threshold,
                preview(meaningful_text)
            ),
        }
        accepted
    }

    fn hard_rejection(&self, text: &str) -> Option<RejectReason> {
        if PATCH_NOTE_REGEX.is_match(text) {
            Some(RejectReason::PatchNote)
        } else if CODE_OPERATOR_REGEX.is_match(text) || METHOD_CALL_REGEX.is_match(text) {
            Some(RejectReason::CodeLike)
        } else if CJK_REGEX.is_match(text) {
            Some(RejectReason::AsianScript)
        } else if self.target_script.is_present(text) {
            Some(RejectReason::AlreadyTranslated)
        } else if !text.chars().any(|c| c.is_ascii_alphabetic()) {
            Some(RejectReason::NoLetters)
        } else if is_identifier_or_path(text) {
            Some(RejectReason::Identifier)
        } else {
            None
        }
    }
}

/// Single-token strings shaped like paths or identifiers
fn is_identifier_or_path(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }
    if text.contains('/') || text.contains('\\') {
        return true;
    }
    DOT_SEPARATED_REGEX.is_match(text) || IDENTIFIER_REGEXES.iter().any(|r| r.is_match(text))
}

/// Heuristic natural-language score of placeholder-free text
pub fn score(text: &str) -> i32 {
    let length = text.chars().count();
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    let mut score = 0;

    // Technical signals
    if length < 4 {
        score -= 5;
    }
    if word_count <= 1 && length > 15 {
        score -= 10;
    }
    if word_count <= 1 {
        score -= 3;
    }
    let letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if length > 0 && (letters as f64 / length as f64) < 0.7 {
        score -= 4;
    }
    if text.contains(['_', '/', '\\']) {
        score -= 5;
    }
    if word_count > 1 && CAMEL_HUMP_REGEX.is_match(text) {
        score -= 10;
    }
    if KEYWORD_REGEX.is_match(text) {
        score -= 3;
    }

    // Prose signals
    if word_count > 2 {
        score += 5;
    }
    if text.ends_with(['.', '?', '!']) {
        score += 5;
    }
    if text.chars().next().is_some_and(char::is_uppercase) {
        score += 2;
    }
    if words.iter().any(|w| COMMON_WORDS.contains(&w.to_lowercase().as_str())) {
        score += 5;
    }

    score
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Three-way split of a dataset by two thresholds
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Accepted at the safe threshold
    pub safe: Vec<Record>,
    /// Accepted only at the base threshold
    pub review: Vec<Record>,
    /// Rejected at both
    pub skipped: Vec<Record>,
}

impl Partition {
    /// Total number of records across the three tiers
    pub fn total(&self) -> usize {
        self.safe.len() + self.review.len() + self.skipped.len()
    }
}

/// Split records into safe, review and skipped tiers
///
/// Each record is evaluated once; with `safe >= base` the tiers are disjoint
/// and together cover every input record. The optional callback is invoked
/// once per record.
pub fn classify_records<F>(
    classifier: &Classifier,
    records: Vec<Record>,
    safe_threshold: i32,
    base_threshold: i32,
    mut on_record: F,
) -> Partition
where
    F: FnMut(&Record, &Verdict),
{
    let mut partition = Partition::default();

    for record in records {
        let verdict = classifier.evaluate_value(&record.value);
        on_record(&record, &verdict);

        if verdict.accepts(safe_threshold) {
            partition.safe.push(record);
        } else if verdict.accepts(base_threshold) {
            partition.review.push(record);
        } else {
            partition.skipped.push(record);
        }
    }

    partition
}
