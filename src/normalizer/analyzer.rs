//! Linguistic backends for the normalizer.
//!
//! The normalizer only needs two capabilities from a backend: tagging a token
//! (stopword / punctuation / space flags and a part of speech) and stemming it.
//! `RuleAnalyzer` implements both with closed-class word tables and the
//! Snowball English stemmer.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

/// Universal part-of-speech tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Adjective,
    Adposition,
    Adverb,
    Auxiliary,
    /// coordinating conjunction
    Conjunction,
    Determiner,
    Interjection,
    Noun,
    Numeral,
    Particle,
    Pronoun,
    ProperNoun,
    Punctuation,
    SubordinatingConjunction,
    Symbol,
    Verb,
    Space,
    Other,
}

impl PartOfSpeech {
    /// Function-word classes that never become index terms
    pub const EXCLUDED: [PartOfSpeech; 7] = [
        PartOfSpeech::Adposition,
        PartOfSpeech::Auxiliary,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Determiner,
        PartOfSpeech::Particle,
        PartOfSpeech::Pronoun,
        PartOfSpeech::SubordinatingConjunction,
    ];

    #[inline]
    pub fn is_excluded(self) -> bool {
        Self::EXCLUDED.contains(&self)
    }
}

/// What a backend knows about one token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTag {
    pub is_stop: bool,
    pub is_punct: bool,
    pub is_space: bool,
    pub pos: PartOfSpeech,
}

/// Tagging and stemming backend
///
/// Implementations must be deterministic: the same token always yields the
/// same tag and the same stem, otherwise a reloaded model would not match the
/// queries it is asked.
pub trait TextAnalyzer: Send + Sync {
    fn tag(&self, token: &str) -> TokenTag;
    fn stem(&self, token: &str) -> String;
}

/// Default backend: word tables plus Snowball (Porter2) English stemming
pub struct RuleAnalyzer {
    stemmer: Stemmer,
}

impl Default for RuleAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleAnalyzer").field("stemmer", &"snowball-english").finish()
    }
}

impl RuleAnalyzer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Part of speech from the closed-class tables.
    /// Open-class words are reported as nouns.
    pub fn pos(&self, token: &str) -> PartOfSpeech {
        if token.chars().all(char::is_whitespace) {
            return PartOfSpeech::Space;
        }
        if token.chars().all(|c| c.is_ascii_punctuation()) {
            return PartOfSpeech::Punctuation;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return PartOfSpeech::Numeral;
        }
        CLOSED_CLASSES.get(token).copied().unwrap_or(PartOfSpeech::Noun)
    }
}

impl TextAnalyzer for RuleAnalyzer {
    fn tag(&self, token: &str) -> TokenTag {
        let pos = self.pos(token);
        TokenTag {
            is_stop: STOP_WORDS.contains(token),
            is_punct: pos == PartOfSpeech::Punctuation,
            is_space: pos == PartOfSpeech::Space,
            pos,
        }
    }

    fn stem(&self, token: &str) -> String {
        self.stemmer.stem(token).into_owned()
    }
}

static CLOSED_CLASSES: LazyLock<HashMap<&'static str, PartOfSpeech>> = LazyLock::new(|| {
    use PartOfSpeech::*;
    let tables: [(PartOfSpeech, &[&str]); 7] = [
        (
            Adposition,
            &[
                "of", "in", "to", "for", "with", "on", "at", "from", "by", "about", "as", "into",
                "like", "through", "after", "over", "between", "out", "against", "during",
                "without", "before", "under", "around", "among", "across", "behind", "beyond",
                "upon", "within", "toward", "towards", "along", "despite", "via", "onto", "off",
                "above", "below", "near", "per", "amid", "throughout", "beside", "besides",
                "inside", "outside", "unlike", "versus", "underneath", "amongst",
            ],
        ),
        (
            Auxiliary,
            &[
                "be", "is", "am", "are", "was", "were", "been", "being", "have", "has", "had",
                "having", "do", "does", "did", "will", "would", "shall", "should", "can",
                "could", "may", "might", "must", "ought",
            ],
        ),
        (Conjunction, &["and", "or", "but", "nor", "yet", "plus"]),
        (
            Determiner,
            &[
                "the", "a", "an", "this", "that", "these", "those", "each", "every", "some",
                "any", "no", "all", "both", "another", "such", "whatever", "whichever", "either",
                "neither",
            ],
        ),
        (Particle, &["not", "n't"]),
        (
            Pronoun,
            &[
                "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself",
                "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
                "it", "its", "itself", "we", "us", "our", "ours", "ourselves", "they", "them",
                "their", "theirs", "themselves", "who", "whom", "whose", "what", "which",
                "someone", "anyone", "everyone", "nobody", "nothing", "something", "anything",
                "everything", "somebody", "anybody", "everybody", "oneself",
            ],
        ),
        (
            SubordinatingConjunction,
            &[
                "if", "because", "although", "though", "while", "whereas", "unless", "since",
                "until", "whether", "than", "lest",
            ],
        ),
    ];
    tables
        .iter()
        .flat_map(|(pos, words)| words.iter().map(move |w| (*w, *pos)))
        .collect()
});

/// English stopwords
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
        "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
        "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below",
        "beside", "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could",
        "did", "do", "does", "doing", "done", "down", "due", "during", "each", "either", "else",
        "elsewhere", "enough", "even", "ever", "every", "everyone", "everything", "everywhere",
        "except", "few", "for", "former", "formerly", "from", "further", "had", "has", "have",
        "he", "hence", "her", "here", "hereafter", "hereby", "herein", "hers", "herself", "him",
        "himself", "his", "how", "however", "i", "if", "in", "indeed", "into", "is", "it", "its",
        "itself", "just", "last", "latter", "least", "less", "many", "may", "me", "meanwhile",
        "might", "more", "moreover", "most", "mostly", "much", "must", "my", "myself", "namely",
        "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor", "not",
        "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "only", "onto", "or",
        "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per",
        "perhaps", "please", "quite", "rather", "really", "same", "several", "she", "should",
        "since", "so", "some", "somehow", "someone", "something", "sometime", "sometimes",
        "somewhere", "still", "such", "than", "that", "the", "their", "them", "themselves",
        "then", "thence", "there", "thereafter", "thereby", "therefore", "therein", "these",
        "they", "this", "those", "though", "through", "throughout", "thru", "thus", "to",
        "together", "too", "toward", "towards", "under", "unless", "until", "up", "upon", "us",
        "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
        "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
        "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
        "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
        "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});
