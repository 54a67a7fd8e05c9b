//! Text normalization: raw text to index terms.
//!
//! Pipeline, in order: lowercase, expand contractions, strip noise (tokens
//! holding a digit, newlines, urls, anything outside `[a-z]`), collapse
//! spaces, tag every token, drop stopwords / punctuation / spaces /
//! function words, stem the survivors.

pub mod analyzer;
pub mod contractions;

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    normalizer::{
        analyzer::{RuleAnalyzer, TextAnalyzer},
        contractions::expand_contractions,
    },
    TermFrequency,
};

static DIGIT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w*\d\w*").expect("valid regex"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S+").expect("valid regex"));
static NON_ALPHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z]").expect("valid regex"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid regex"));

/// Remove tokens with digits, newlines, urls and every non `[a-z]` character
pub fn clean_text(text: &str) -> String {
    let text = DIGIT_TOKEN_RE.replace_all(text, "");
    let text = text.replace('\n', " ");
    let text = URL_RE.replace_all(&text, "");
    NON_ALPHA_RE.replace_all(&text, " ").into_owned()
}

pub fn remove_extra_spaces(text: &str) -> String {
    SPACES_RE.replace_all(text, " ").into_owned()
}

/// Turns text into a `TermFrequency` of stems
#[derive(Debug, Default)]
pub struct Normalizer<A = RuleAnalyzer>
where
    A: TextAnalyzer,
{
    analyzer: A,
}

impl Normalizer<RuleAnalyzer> {
    pub fn new() -> Self {
        Self::with_analyzer(RuleAnalyzer::new())
    }
}

impl<A> Normalizer<A>
where
    A: TextAnalyzer,
{
    pub fn with_analyzer(analyzer: A) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Normalize `text` into index terms
    ///
    /// # Arguments
    /// * `text` - raw text
    /// * `remove_stopwords` - `true` for documents, `false` for queries
    pub fn normalize(&self, text: &str, remove_stopwords: bool) -> TermFrequency {
        let lower = text.to_lowercase();
        let expanded = expand_contractions(&lower);
        let cleaned = remove_extra_spaces(&clean_text(&expanded));

        let mut freq = TermFrequency::new();
        for token in cleaned.split(' ') {
            if token.is_empty() {
                continue;
            }
            if self.is_valid(token, remove_stopwords) {
                freq.add_term(&self.analyzer.stem(token));
            }
        }
        freq
    }

    fn is_valid(&self, token: &str, remove_stopwords: bool) -> bool {
        let tag = self.analyzer.tag(token);
        if remove_stopwords && tag.is_stop {
            return false;
        }
        !(tag.is_punct || tag.is_space || tag.pos.is_excluded())
    }
}
