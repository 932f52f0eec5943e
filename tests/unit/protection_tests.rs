/*!
 * Tests for placeholder protection and restoration
 */

use std::collections::HashSet;
use std::sync::Arc;

use gstl::protection::{PlaceholderCodec, TOKEN_REGEX, TokenCounter, format_token, restore, strip_tokens};

const SAMPLES: &[&str] = &[
    "Plain sentence without anything special.",
    "You found {0} coins and {1:N0} gems.",
    "Health: %d%%",
    "Hello {playerName|upper}, welcome back!",
    "Call Inventory.AddItem(sword) before GameManager.Instance.Save().",
    "Press <b>{0}</b> to <color=#FF0000>attack</color> now.",
    "<size=120%><b>WARNING</b></size><br/>Low health",
    "Visit https://example.com/help?topic=1 or see Assets/Textures/ui.png",
    "Saved to C:\\Games\\Save\\slot1.dat at version 1.2.3-beta",
    "Cost: $gold and @player uses &item& on #A1B2C3",
    "Generic List<Item, Count> with <sprite name=\"coin\"> icon",
    "Nested <color=red>{0} <b>{1}</b></color> markup",
    "Line one\nLine two\twith tab",
    "  leading and trailing whitespace  ",
    "Press {0} then __PROTECTED_0__ appears",
    "<b>__PROTECTED_3__</b> {0} {1} __PROTECTED_1__",
    "",
];

#[test]
fn test_protectThenRestore_withManySamples_shouldRoundTrip() {
    let codec = PlaceholderCodec::new();
    for sample in SAMPLES {
        let protected = codec.protect(sample);
        assert_eq!(&codec.restore(&protected.text, &protected.replacements), sample, "sample: {:?}", sample);
    }
}

#[test]
fn test_protect_withPlaceholders_shouldLeaveOnlyTokensForThem() {
    let codec = PlaceholderCodec::new();
    let protected = codec.protect("Press <b>{0}</b> to open the map.");

    assert!(!protected.text.contains("{0}"));
    assert!(!protected.text.contains("<b>"));
    assert!(protected.text.contains("to open the map."));
    assert_eq!(strip_tokens(&protected.text).trim(), "Press  to open the map.");
}

#[test]
fn test_protect_tokensWithinOneCall_shouldBeUnique() {
    let codec = PlaceholderCodec::new();
    let protected = codec.protect("{0} {1} {2} <b>x</b> <i>y</i> $a $b @c");

    let tokens: Vec<&str> = TOKEN_REGEX.find_iter(&protected.text).map(|m| m.as_str()).collect();
    let unique: HashSet<&str> = tokens.iter().copied().collect();
    assert_eq!(tokens.len(), unique.len());
    assert_eq!(protected.replacements.len(), unique.len());
}

#[test]
fn test_sharedCounter_acrossCodecs_shouldNeverRepeatTokens() {
    let counter = Arc::new(TokenCounter::new());
    let first = PlaceholderCodec::with_counter(Arc::clone(&counter));
    let second = PlaceholderCodec::with_counter(Arc::clone(&counter));

    let a = first.protect("{0} and {1}");
    let b = second.protect("{0} and {1}");

    let keys_a: HashSet<_> = a.replacements.keys().cloned().collect();
    let keys_b: HashSet<_> = b.replacements.keys().cloned().collect();
    assert!(keys_a.is_disjoint(&keys_b));
    assert_eq!(counter.issued(), 4);
}

#[test]
fn test_restore_withPrefixCollidingNumbers_shouldReplaceLongestFirst() {
    let codec = PlaceholderCodec::new();
    let mut replacements = std::collections::HashMap::new();
    for n in [1u64, 12, 123] {
        replacements.insert(format_token(n), format!("<{}>", n));
    }
    let text = format!("{} {} {}", format_token(123), format_token(1), format_token(12));

    assert_eq!(codec.restore(&text, &replacements), "<123> <1> <12>");
}

#[test]
fn test_restore_withOrphanToken_shouldLeaveItVerbatim() {
    let text = format!("Lost {} here", format_token(99));
    assert_eq!(restore(&text, &Default::default()), text);
}

#[test]
fn test_protectThenRestore_withTokenShapedLiteral_shouldRoundTrip() {
    let codec = PlaceholderCodec::new();
    let text = "Press {0} then __PROTECTED_0__ appears";

    let protected = codec.protect(text);
    assert!(!protected.text.contains("{0}"));
    assert!(protected.replacements.values().any(|v| v == "__PROTECTED_0__"));

    let translated = format!("{} (vi)", protected.text);
    assert_eq!(restore(&translated, &protected.replacements), format!("{} (vi)", text));
}
