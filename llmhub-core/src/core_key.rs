//! Core-key extraction: a release-invariant identity for a model name.
//!
//! Snapshot dates, parenthetical annotations, status words and trailing
//! distribution channels (`:free`, `-chat`, `-instruct`, ...) are removed so that
//! dated releases of the same model converge on one key.

use regex::Regex;
use std::sync::LazyLock;

use crate::normalize::{Normalizer, default_normalizer, static_regex, trim_key};

static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\([^)]*\)"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b(?:19|20)\d{2}\b"));
static DIGIT_STAMP: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"\b\d{8}\b|\b\d{6}\b|\b\d{4}\b"));
static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(
        r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*[-\s']?\d{2,4}\b",
    )
});
static STATUS_WORD: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(r"\b(?:preview|latest|stable|release|experimental|exp)\b")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\s+"));
static CHANNEL_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    static_regex(r"(?:[-_/](?:free|beta|alpha|chat|instruct|latest))+$")
});
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| static_regex(r"-{2,}"));

/// Lowercase a name and blank out date stamps and release status words.
pub fn remove_release_noise(text: &str) -> String {
    let lowered = text.to_lowercase();
    let t = PARENTHETICAL.replace_all(&lowered, " ");
    let t = YEAR.replace_all(&t, " ");
    let t = DIGIT_STAMP.replace_all(&t, " ");
    let t = MONTH_YEAR.replace_all(&t, " ");
    let t = STATUS_WORD.replace_all(&t, " ");
    WHITESPACE.replace_all(&t, " ").trim().to_string()
}

impl Normalizer {
    /// Extract the release-invariant core key of a name.
    ///
    /// Returns `""` when nothing identifying survives; callers must treat that as
    /// "no usable key", never as a match target.
    pub fn core_key(&self, text: &str) -> String {
        let stripped = self.strip_provider_prefix(text);
        let quiet = remove_release_noise(&stripped);
        let key = self.normalize(&quiet);
        let key = CHANNEL_TAIL.replace(&key, "");
        let key = DASH_RUN.replace_all(&key, "-");
        let key = self.apply_synonyms(trim_key(&key));
        trim_key(&key).to_string()
    }
}

/// Core key with the default normalizer.
pub fn core_key(text: &str) -> String {
    default_normalizer().core_key(text)
}
