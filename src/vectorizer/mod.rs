pub mod corpus;
pub mod evaluate;
pub mod serde;
pub mod term;
pub mod tfidf;

use std::marker::PhantomData;

use ::serde::{Deserialize, Serialize};
use indexmap::IndexSet;
use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::{Error, Result},
    utils::math::vector::{add_scaled, is_zero},
    vectorizer::{
        corpus::Corpus,
        term::TermFrequency,
        tfidf::{DefaultTFIDFEngine, TFIDFEngine},
    },
};

/// Ordered, deduplicated terms of a trained model
/// The position of a term is its coordinate in every weight and query vector.
/// Serialized as a plain sequence so the order survives a save/load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    terms: IndexSet<String>,
}

impl Vocabulary {
    /// Vocabulary in the corpus' first-seen order
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self::from_terms(corpus.iter().map(|(term, _)| term))
    }

    /// Duplicates after the first occurrence are ignored
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|s| s.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Trained model: vocabulary, IDF vector and one weight row per document
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusModel {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    weights: Vec<Vec<f64>>,
}

impl CorpusModel {
    /// Assemble a model, checking that every vector matches the vocabulary
    pub fn from_parts(vocabulary: Vocabulary, idf: Vec<f64>, weights: Vec<Vec<f64>>) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let dim = vocabulary.len();
        if idf.len() != dim {
            return Err(Error::CorruptModel(format!(
                "idf has {} entries for a vocabulary of {dim} terms",
                idf.len()
            )));
        }
        if let Some(pos) = idf.iter().position(|v| !v.is_finite()) {
            return Err(Error::CorruptModel(format!("idf[{pos}] is not finite")));
        }
        if weights.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        for (i, row) in weights.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::CorruptModel(format!(
                    "weight row {i} has {} columns, expected {dim}",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::CorruptModel(format!("weight row {i} holds a non-finite value")));
            }
        }
        Ok(Self { vocabulary, idf, weights })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Weight matrix, one row per document in training order
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn doc_num(&self) -> usize {
        self.weights.len()
    }
}

/// Query weights over the model vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector(Vec<f64>);

impl QueryVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when no query term is in the vocabulary.
    /// Ranking such a vector scores every document 0.
    pub fn is_zero(&self) -> bool {
        is_zero(&self.0)
    }
}

impl From<Vec<f64>> for QueryVector {
    fn from(v: Vec<f64>) -> Self {
        QueryVector(v)
    }
}

/// Rocchio relevance feedback weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocchioParams {
    /// weight of the original query
    pub alpha: f64,
    /// weight of the relevant centroid
    pub beta: f64,
    /// weight of the nonrelevant centroid (subtracted)
    pub gamma: f64,
}

impl Default for RocchioParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.75,
            gamma: 0.15,
        }
    }
}

/// TF-IDF Vectorizer
/// Fits a `CorpusModel` from the documents' term frequencies, turns queries
/// into vectors and applies relevance feedback.
///
/// The model is immutable once trained; a new `train` builds a new vectorizer.
#[derive(Debug, Clone)]
pub struct Vectorizer<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    pub(crate) model: CorpusModel,
    _marker: PhantomData<E>,
}

impl<E> Vectorizer<E>
where
    E: TFIDFEngine,
{
    /// Fit the model from one term frequency per document, in collection order
    ///
    /// # Errors
    /// * `EmptyCorpus` - no documents, or no document produced a term
    pub fn train(docs: &[TermFrequency]) -> Result<Self> {
        if docs.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let corpus = Corpus::from_docs(docs);
        if corpus.vocab_size() == 0 {
            return Err(Error::EmptyCorpus);
        }
        let vocabulary = Vocabulary::from_corpus(&corpus);
        let idf = E::idf_vec(&corpus, &vocabulary);
        let weights: Vec<Vec<f64>> = docs
            .par_iter()
            .map(|doc| {
                let mut row = E::tf_vec(doc, &vocabulary);
                row.iter_mut().zip(&idf).for_each(|(w, idf)| *w *= idf);
                row
            })
            .collect();
        debug!(
            docs = docs.len(),
            vocabulary = vocabulary.len(),
            empty_docs = docs.iter().filter(|d| d.is_empty()).count(),
            "vectorizer trained"
        );
        Ok(Self::from_model(CorpusModel { vocabulary, idf, weights }))
    }

    pub fn from_model(model: CorpusModel) -> Self {
        Self { model, _marker: PhantomData }
    }

    pub fn model(&self) -> &CorpusModel {
        &self.model
    }

    pub fn doc_num(&self) -> usize {
        self.model.doc_num()
    }

    /// Build the query vector for `freq`
    ///
    /// # Arguments
    /// * `freq` - query terms
    /// * `a` - damping constant of the augmented term frequency (0.4 by default)
    pub fn vectorize_query(&self, freq: &TermFrequency, a: f64) -> QueryVector {
        QueryVector(E::query_vec(freq, &self.model.vocabulary, &self.model.idf, a))
    }

    /// Rocchio relevance feedback
    /// `alpha * q + beta / |R| * sum(R) - gamma / |NR| * sum(NR)`
    ///
    /// An empty group contributes nothing. Repeated indices count once.
    /// Components may become negative; they are left as they are.
    ///
    /// # Errors
    /// * `InvalidFeedbackIndex` - an index is not a trained document
    pub fn apply_feedback(
        &self,
        query: &QueryVector,
        relevant: &[usize],
        nonrelevant: &[usize],
        params: &RocchioParams,
    ) -> Result<QueryVector> {
        let document_count = self.doc_num();
        let relevant = checked_feedback_set(relevant, document_count)?;
        let nonrelevant = checked_feedback_set(nonrelevant, document_count)?;

        let mut adjusted: Vec<f64> = query.as_slice().iter().map(|v| params.alpha * v).collect();
        if !relevant.is_empty() {
            let scale = params.beta / relevant.len() as f64;
            for &i in &relevant {
                add_scaled(&mut adjusted, scale, &self.model.weights[i]);
            }
        }
        if !nonrelevant.is_empty() {
            let scale = -params.gamma / nonrelevant.len() as f64;
            for &i in &nonrelevant {
                add_scaled(&mut adjusted, scale, &self.model.weights[i]);
            }
        }
        Ok(QueryVector(adjusted))
    }
}

/// Validate feedback indices and collapse duplicates (ascending order)
fn checked_feedback_set(indices: &[usize], document_count: usize) -> Result<Vec<usize>> {
    if let Some(&index) = indices.iter().find(|&&i| i >= document_count) {
        return Err(Error::InvalidFeedbackIndex { index, document_count });
    }
    let mut set = indices.to_vec();
    set.sort_unstable();
    set.dedup();
    Ok(set)
}
