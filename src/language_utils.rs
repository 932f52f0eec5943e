//! Language utilities for language resolution and script detection
//!
//! Languages can be configured either by ISO 639-1 / 639-2 code or by
//! English name. Each target language maps to the character class used to
//! tell whether a string already carries translated content.

use anyhow::{Result, anyhow};
use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum number of target-script characters that marks a record as translated
pub const TARGET_SCRIPT_MIN_CHARS: usize = 2;

/// CJK ideographs, Kana, Hangul and full-width forms
pub static CJK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{3040}-\x{30FF}\x{3400}-\x{4DBF}\x{4E00}-\x{9FFF}\x{AC00}-\x{D7AF}\x{FF00}-\x{FFEF}]")
        .expect("Invalid CJK regex")
});

/// Map an ISO 639-2/B code to its 639-2/T form
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    let part2t = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(part2t)
}

/// Resolve a language given as ISO code or English name
pub fn resolve_language(input: &str) -> Result<Language> {
    let trimmed = input.trim();
    let lowered = trimmed.to_lowercase();

    let by_code = match lowered.len() {
        2 => Language::from_639_1(&lowered),
        3 => Language::from_639_3(part2b_to_part2t(&lowered).unwrap_or(lowered.as_str())),
        _ => None,
    };
    if let Some(language) = by_code {
        return Ok(language);
    }

    // English names are capitalized in the ISO tables
    let mut chars = lowered.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return Err(anyhow!("Empty language")),
    };

    Language::from_name(trimmed)
        .or_else(|| Language::from_name(&capitalized))
        .ok_or_else(|| anyhow!("Unknown language: {}", input))
}

/// Get the English name of a language given by code or name
pub fn get_language_name(input: &str) -> Result<String> {
    Ok(resolve_language(input)?.to_name().to_string())
}

/// Check if two language inputs represent the same language
pub fn language_codes_match(first: &str, second: &str) -> bool {
    match (resolve_language(first), resolve_language(second)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Character class that signals content already in the target language
#[derive(Debug, Clone)]
pub struct TargetScript {
    language: Language,
    pattern: Regex,
}

impl TargetScript {
    /// Build the script detector for a target language
    pub fn for_language(input: &str) -> Result<Self> {
        let language = resolve_language(input)?;
        let class = match language.to_639_3() {
            // Latin-1 Supplement through Latin Extended Additional
            "vie" => r"[\x{00C0}-\x{1EF9}]",
            "rus" | "ukr" | "bel" | "bul" | "srp" | "mkd" | "kaz" | "mon" => r"[\x{0400}-\x{04FF}]",
            "zho" => r"[\x{3400}-\x{4DBF}\x{4E00}-\x{9FFF}]",
            "jpn" => r"[\x{3040}-\x{30FF}\x{4E00}-\x{9FFF}]",
            "kor" => r"[\x{AC00}-\x{D7AF}\x{1100}-\x{11FF}]",
            "tha" => r"[\x{0E00}-\x{0E7F}]",
            "ara" | "fas" | "urd" => r"[\x{0600}-\x{06FF}]",
            "heb" => r"[\x{0590}-\x{05FF}]",
            "ell" => r"[\x{0370}-\x{03FF}]",
            "hin" | "mar" | "nep" => r"[\x{0900}-\x{097F}]",
            _ => r"[\x{00C0}-\x{024F}]",
        };
        let pattern = Regex::new(class).map_err(|e| anyhow!("Invalid script class for {}: {}", language.to_name(), e))?;
        Ok(Self { language, pattern })
    }

    /// The resolved language
    pub fn language(&self) -> Language {
        self.language
    }

    /// Number of target-script characters in the text
    pub fn count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }

    /// Whether the text contains any target-script character
    pub fn is_present(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Whether the text still needs translation by the dispatch heuristic
    pub fn needs_translation(&self, text: &str) -> bool {
        !text.trim().is_empty() && self.count(text) < TARGET_SCRIPT_MIN_CHARS
    }
}
