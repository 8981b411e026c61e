// ai
//! 🔤 Words: the aggressively opinionated word normalizer.
//!
//! Split dialogue on runs of ASCII whitespace (space, tab, CR, LF, form feed, and nothing
//! else). From each token, keep ONLY ASCII letters, lowercase them, and throw away whatever
//! is left if it's empty. So:
//!
//! ```text
//! "Hello,"  → "hello"
//! "don't"   → "dont"     (the apostrophe did not survive the audition)
//! "123"     → (gone)     (numbers are not words, and neither is "--")
//! "café"    → "caf"      (ASCII letters only. yes, we know.)
//! "a\u{A0}b" → "ab"       (a no-break space glues words together, it doesn't split them)
//! ```
//!
//! 🧠 Knowledge graph:
//! - Used by `aggregator::LocalAggregator` for word counts, unique words and per-speaker frequencies
//! - `raw_char_length` counts characters of the dialogue *as received* (after the parser's trim),
//!   spaces and punctuation included. It does not care what survives normalization.
//! - The stripping is lossy on purpose and must not change: it defines what every reported
//!   number means. Changing it silently changes the statistics.

/// 📦 A tokenized line of dialogue: the surviving words, plus the raw char length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenizedDialogue {
    /// ✅ normalized, non-empty tokens in order of appearance (duplicates kept)
    pub tokens: Vec<String>,
    /// 📏 `dialogue.chars().count()` before any tokenizing
    pub raw_char_length: u64,
}

/// 🧹 Strip a raw token down to lowercase ASCII letters. `None` if nothing survives.
pub fn normalize_token(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// 🔄 Lazily yields every normalized word in `dialogue`, skipping tokens that strip to nothing.
pub fn normalized_words(dialogue: &str) -> impl Iterator<Item = String> + '_ {
    dialogue.split_ascii_whitespace().filter_map(normalize_token)
}

/// 🔤 Tokenize a dialogue string into normalized words plus its raw character length.
pub fn tokenize(dialogue: &str) -> TokenizedDialogue {
    TokenizedDialogue {
        tokens: normalized_words(dialogue).collect(),
        raw_char_length: dialogue.chars().count() as u64,
    }
}
