use ahash::RandomState;
use indexmap::IndexMap;

use crate::TermFrequency;

/// keep document count and per-term document frequency for one training batch
///
/// Terms are kept in the order they were first added, which is the vocabulary
/// order of the model trained from this corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// number of documents added
    doc_num: u64,
    /// number of documents containing each term
    term_counts: IndexMap<Box<str>, u64, RandomState>,
}

impl Corpus {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            doc_num: 0,
            term_counts: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Build a corpus from the documents' term frequencies, in order
    pub fn from_docs(docs: &[TermFrequency]) -> Self {
        let mut corpus = Self::new();
        for doc in docs {
            corpus.add_set(doc.term_set_iter());
        }
        corpus
    }

    /// Add one document's distinct terms to the corpus
    /// Each term counts once per document, whatever its frequency.
    pub fn add_set<'a, I>(&mut self, terms: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.doc_num += 1;
        for term in terms {
            if let Some(count) = self.term_counts.get_mut(term) {
                *count += 1;
            } else {
                self.term_counts.insert(term.into(), 1);
            }
        }
    }

    /// Get the number of documents in the corpus
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num
    }

    /// Get the number of documents containing `term`
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// Terms with their document frequency, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_counts.iter().map(|(term, &count)| (term.as_ref(), count))
    }
}
