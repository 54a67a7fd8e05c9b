use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TermFrequency struct
/// Multiset of normalized terms produced from one text.
/// Counts the number of times each term appears and remembers the order in
/// which terms were first seen.
///
/// # Examples
/// ```
/// use docs_finder::TermFrequency;
/// let mut term_freq = TermFrequency::new();
/// term_freq.add_term("cat");
/// term_freq.add_term("dog");
/// term_freq.add_term("cat");
///
/// assert_eq!(term_freq.term_count("cat"), 2);
/// assert_eq!(term_freq.term_set(), vec!["cat", "dog"]);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u64>,
    total_term_count: u64,
}

/// Implementation for adding terms
impl TermFrequency {
    /// Create a new TermFrequency
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Add a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += 1;
        } else {
            self.term_count.insert(term.to_string(), 1);
        }
        self.total_term_count += 1;
        self
    }
}

impl<S> FromIterator<S> for TermFrequency
where
    S: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut freq = TermFrequency::new();
        for term in iter {
            freq.add_term(term.as_ref());
        }
        freq
    }
}

/// Implementation for retrieving information from TermFrequency
impl TermFrequency {
    /// Iterate over terms and their counts in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Get the total count of all terms
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Get the occurrence count for a specific term
    ///
    /// # Returns
    /// * `u64` - Occurrence count for the term, 0 when absent
    #[inline]
    pub fn term_count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// Get the count of the most frequent term
    ///
    /// # Returns
    /// * `u64` - Count of the most frequent term, 0 when empty
    #[inline]
    pub fn most_frequent_term_count(&self) -> u64 {
        self.term_count.values().copied().max().unwrap_or(0)
    }

    /// term_set_iter
    ///
    /// # Returns
    /// * `impl Iterator<Item=&str>` - Iterator over the deduplicated terms
    #[inline]
    pub fn term_set_iter(&self) -> impl Iterator<Item = &str> {
        self.term_count.keys().map(|s| s.as_str())
    }

    /// Get the deduplicated terms in first-seen order
    #[inline]
    pub fn term_set(&self) -> Vec<&str> {
        self.term_set_iter().collect()
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }
}
