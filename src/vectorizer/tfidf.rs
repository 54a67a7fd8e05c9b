use crate::vectorizer::{corpus::Corpus, term::TermFrequency, Vocabulary};

/// TF-IDF calculation engine
///
/// Every vector produced has one coordinate per vocabulary term, in vocabulary order.
pub trait TFIDFEngine {
    /// IDFベクトルを生成するメソッド
    /// # Arguments
    /// * `corpus` - 学習コーパス
    /// * `vocabulary` - トークンの次元
    /// # Returns
    /// * `Vec<f64>` - IDFベクトル
    fn idf_vec(corpus: &Corpus, vocabulary: &Vocabulary) -> Vec<f64>;

    /// Term frequency row of one training document
    fn tf_vec(freq: &TermFrequency, vocabulary: &Vocabulary) -> Vec<f64>;

    /// Weighted query vector, already scaled by `idf`
    /// # Arguments
    /// * `freq` - クエリのトークン
    /// * `vocabulary` - トークンの次元
    /// * `idf` - IDFベクトル
    /// * `a` - damping constant of the augmented term frequency
    fn query_vec(freq: &TermFrequency, vocabulary: &Vocabulary, idf: &[f64], a: f64) -> Vec<f64>;
}

/// デフォルトのTF-IDFエンジン
///
/// - idf: `log10(N / df)`
/// - document tf: `count / max_count` (max-normalized)
/// - query tf: `a + (1 - a) * count / max_count` (augmented), zero for absent terms
///
/// Documents and queries use different tf forms on purpose; both are the
/// classic Salton weights and are kept as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl DefaultTFIDFEngine {
    #[inline]
    pub fn idf_calc(doc_num: u64, doc_freq: u64) -> f64 {
        // vocabulary terms always occur somewhere; guard anyway so idf stays finite
        if doc_freq == 0 || doc_num == 0 {
            return 0.0;
        }
        (doc_num as f64 / doc_freq as f64).log10()
    }
}

impl TFIDFEngine for DefaultTFIDFEngine {
    fn idf_vec(corpus: &Corpus, vocabulary: &Vocabulary) -> Vec<f64> {
        let doc_num = corpus.get_doc_num();
        vocabulary
            .iter()
            .map(|term| Self::idf_calc(doc_num, corpus.get_term_count(term)))
            .collect()
    }

    fn tf_vec(freq: &TermFrequency, vocabulary: &Vocabulary) -> Vec<f64> {
        let mut tf_vec = vec![0.0; vocabulary.len()];
        let max_count = freq.most_frequent_term_count();
        // a document without terms keeps an all-zero row
        if max_count == 0 {
            return tf_vec;
        }
        let max_count = max_count as f64;
        for (term, count) in freq.iter() {
            if let Some(idx) = vocabulary.index_of(term) {
                tf_vec[idx] = count as f64 / max_count;
            }
        }
        tf_vec
    }

    fn query_vec(freq: &TermFrequency, vocabulary: &Vocabulary, idf: &[f64], a: f64) -> Vec<f64> {
        debug_assert_eq!(vocabulary.len(), idf.len());
        let mut query = vec![0.0; vocabulary.len()];
        // out-of-vocabulary terms have no slot and do not take part in max_count
        let known: Vec<(usize, u64)> = freq
            .iter()
            .filter_map(|(term, count)| vocabulary.index_of(term).map(|idx| (idx, count)))
            .collect();
        let max_count = known.iter().map(|&(_, count)| count).max().unwrap_or(0);
        if max_count == 0 {
            return query;
        }
        let max_count = max_count as f64;
        for (idx, count) in known {
            query[idx] = idf[idx] * (a + (1.0 - a) * count as f64 / max_count);
        }
        query
    }
}
