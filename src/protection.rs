/*!
 * Placeholder protection for game strings.
 *
 * Engine markup, format specifiers, code-like tokens and paths must reach the
 * translated text byte-for-byte. Before a string is sent to a provider every
 * such substring is swapped for an opaque `__PROTECTED_<n>__` token, and the
 * token is swapped back once the translation returns.
 *
 * Patterns are applied as an ordered cascade:
 * 1. Numeric format slots and percent specifiers: `{0}`, `{1:F2}`, `%s`
 * 2. Named game variables: `{name}`, `{name|B}`
 * 3. Code elements: `System.Text`, `GetChild(0)`, `transform.position`, `<T>`
 * 4. Rich-text markup: `<color=#fff>..</color>`, `<sprite ...>`, `<b>`
 * 5. URLs and paths: `https://..`, `C:\..`, `Assets/..`, `/usr/..`
 * 6. Programming constructs: `#FF0000`, GUIDs, `1.2.3`, `$x`, `@x`, `&x&`
 * 7. Any remaining `<tag>`
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Prefix shared by every token
const TOKEN_PREFIX: &str = "__PROTECTED_";

/// Suffix shared by every token
const TOKEN_SUFFIX: &str = "__";

/// Matches any token and captures its number
pub static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"__PROTECTED_(\d+)__").expect("Invalid token regex")
});

/// A whole string that is exactly one token
static LITERAL_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^__PROTECTED_\d+__$").expect("Invalid literal token regex")
});

/// Protection cascade, one entry per pattern class in priority order
static PATTERN_CLASSES: Lazy<Vec<Vec<Regex>>> = Lazy::new(|| {
    let classes: [&[&str]; 7] = [
        // Format slots and specifiers
        &[
            r"\{\d+\}",
            r"\{\d+:[^}]+\}",
            r"%[sdflbxXeEgGc%]",
        ],
        // Game variables with modifiers
        &[r"\{[a-zA-Z_][a-zA-Z0-9_]*(?:\|[a-zA-Z_][a-zA-Z0-9_]*)*\}"],
        // Qualified names, calls, member chains, generics
        &[
            r"\b[A-Z][a-zA-Z0-9]*(?:\.[A-Z][a-zA-Z0-9]*)+\b",
            r"\b\w+\([^)]*\)",
            r"\b\w+\.\w+(?:\.\w+)*",
            r"<[A-Z][a-zA-Z0-9,\s]*>",
        ],
        // Rich-text markup
        &[
            r"(?s)<color=[^>]*>.*?</color>",
            r"(?s)<size=[^>]*>.*?</size>",
            r"(?s)<material=[^>]*>.*?</material>",
            r"<quad[^>]*>",
            r"<sprite[^>]*>",
            r"</?(?:b|i|u|sub|sup|mark|s)>",
            r"<(?:br|BR)\s*/?>",
            r"(?s)<nobr>.*?</nobr>",
            r"(?s)<indent=[^>]*>.*?</indent>",
            r"(?s)<line-height=[^>]*>.*?</line-height>",
        ],
        // URLs and filesystem paths
        &[
            r"https?://[^\s/$.?#].[^\s]*",
            r"ftp://[^\s/$.?#].[^\s]*",
            r#"[A-Za-z]:\\(?:[^\\/:*?"<>|\r\n]+\\)*[^\\/:*?"<>|\r\n]*"#,
            r"Assets/[^\s]*",
            r"Resources/[^\s]*",
            r"/(?:[^/\s]+/)*[^/\s]*",
        ],
        // Colours, GUIDs, versions, sigil variables
        &[
            r"#[0-9A-Fa-f]{6,8}",
            r"\{[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}\}",
            r"\b\d+\.\d+(?:\.\d+)*(?:-[a-zA-Z0-9]+)*\b",
            r"&[^&\s]+&",
            r"\$[a-zA-Z_][a-zA-Z0-9_]*",
            r"@[a-zA-Z_][a-zA-Z0-9_]*",
        ],
        // Leftover tags
        &[r"<[^>]+>"],
    ];

    classes
        .iter()
        .map(|patterns| {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("Invalid protection pattern"))
                .collect()
        })
        .collect()
});

/// Process-wide source of token numbers
///
/// Shared by every worker so that tokens minted concurrently never collide.
#[derive(Debug, Default)]
pub struct TokenCounter {
    next: AtomicU64,
}

impl TokenCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next number
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Numbers handed out so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Token to original substring, private to one record
pub type Replacements = HashMap<String, String>;

/// Output of [`PlaceholderCodec::protect`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    /// Text with protected substrings replaced by tokens
    pub text: String,
    /// Token to original substring
    pub replacements: Replacements,
}

/// Reversible extraction of non-translatable substrings
#[derive(Debug, Clone, Default)]
pub struct PlaceholderCodec {
    counter: Arc<TokenCounter>,
}

impl PlaceholderCodec {
    /// Create a codec with its own counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec that mints numbers from a shared counter
    pub fn with_counter(counter: Arc<TokenCounter>) -> Self {
        Self { counter }
    }

    /// The counter this codec draws from
    pub fn counter(&self) -> &Arc<TokenCounter> {
        &self.counter
    }

    /// Replace every protected substring with a fresh token
    ///
    /// Token-shaped literals already present in `text` are escaped first:
    /// each gets its own token whose replacement is the literal itself.
    pub fn protect(&self, text: &str) -> Protected {
        let mut replacements = Replacements::new();
        let mut current = if TOKEN_REGEX.is_match(text) {
            TOKEN_REGEX
                .replace_all(text, |caps: &Captures| {
                    let token = format_token(self.counter.next_id());
                    replacements.insert(token.clone(), caps[0].to_string());
                    token
                })
                .into_owned()
        } else {
            text.to_string()
        };

        for class in PATTERN_CLASSES.iter() {
            for pattern in class {
                if !pattern.is_match(&current) {
                    continue;
                }
                current = pattern
                    .replace_all(&current, |caps: &Captures| {
                        let token = format_token(self.counter.next_id());
                        replacements.insert(token.clone(), caps[0].to_string());
                        token
                    })
                    .into_owned();
            }
        }

        Protected {
            text: current,
            replacements,
        }
    }

    /// Put original substrings back in place of their tokens
    ///
    /// Nested tokens inside a replacement are resolved recursively; an
    /// escaped literal is emitted as-is. A token with no entry in the map
    /// stays in the text verbatim.
    pub fn restore(&self, text: &str, replacements: &Replacements) -> String {
        restore(text, replacements)
    }
}

/// Free-standing form of [`PlaceholderCodec::restore`]
pub fn restore(text: &str, replacements: &Replacements) -> String {
    resolve(text, replacements, None)
}

/// Single left-to-right pass over the tokens of `text`
///
/// A replacement only nests tokens minted before its own, so recursion is
/// limited to numbers below `below`. A replacement that is itself a bare
/// token is an escaped literal and is never scanned again.
fn resolve(text: &str, replacements: &Replacements, below: Option<u64>) -> String {
    TOKEN_REGEX
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            let number = caps[1].parse::<u64>().ok();
            let in_scope = match (number, below) {
                (Some(n), Some(limit)) => n < limit,
                (Some(_), None) => true,
                (None, _) => false,
            };

            match replacements.get(token) {
                Some(original) if in_scope => {
                    if LITERAL_TOKEN_REGEX.is_match(original) {
                        original.clone()
                    } else {
                        resolve(original, replacements, number)
                    }
                }
                _ => {
                    warn!("Unresolved placeholder {} left in translation", token);
                    token.to_string()
                }
            }
        })
        .into_owned()
}

/// Remove every token from a protected string
pub fn strip_tokens(text: &str) -> String {
    TOKEN_REGEX.replace_all(text, "").into_owned()
}

/// Render token number `n`
pub fn format_token(n: u64) -> String {
    format!("{}{}{}", TOKEN_PREFIX, n, TOKEN_SUFFIX)
}
