/// This crate is a small-corpus Document Retrieval Engine using a TF-IDF Vectorizer.
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod normalizer;
pub mod utils;
pub mod vectorizer;

/// Retrieval Engine
/// The top-level struct of this crate. It owns the document collection, the
/// normalizer and the currently trained model, and exposes `train`, `find`,
/// `find_with_feedback`, `save` and `load`.
///
/// `RetrievalEngine<A, E>` has the following generic parameters:
/// - `A`: text analysis backend (e.g., RuleAnalyzer)
/// - `E`: TF-IDF calculation engine type (e.g., DefaultTFIDFEngine)
///
/// # Thread Safety
/// Every method takes `&self`. Queries run concurrently against an immutable
/// snapshot; `train` and `load` swap a complete new snapshot in, so a query
/// never sees a half-built model.
pub use engine::RetrievalEngine;

/// Engine configuration
/// Model path, default result count, query damping constant and Rocchio
/// weights. Loadable from JSON, overridable from the environment.
pub use config::EngineConfig;

/// Error type and Result alias shared by every module
pub use error::{Error, Result};

/// Document records
/// - `Document`: one corpus record, identified by `id`
/// - `ScoredDocument`: a document returned by a query with its relevancy and
///   its index in the collection (the index accepted by relevance feedback)
pub use document::{Document, ScoredDocument};

/// Text normalizer
/// Turns raw text into stemmed index terms. The tagging/stemming backend is
/// pluggable through `TextAnalyzer`; `RuleAnalyzer` is the default.
pub use normalizer::{
    analyzer::{PartOfSpeech, RuleAnalyzer, TextAnalyzer, TokenTag},
    Normalizer,
};

/// TF-IDF Vectorizer
/// Fits the corpus model (vocabulary, IDF vector, weight matrix), builds query
/// vectors and applies Rocchio relevance feedback.
pub use vectorizer::{CorpusModel, QueryVector, RocchioParams, Vectorizer, Vocabulary};

/// TF-IDF Vectorizer Data Structure for Serialization
/// The serializable form of a trained model, vocabulary order included.
/// Convert it back with `into_vectorizer`.
pub use vectorizer::serde::TFIDFData;

/// Term Frequency structure
/// Multiset of the terms of one text: counts per term, total count and
/// first-seen order.
pub use vectorizer::term::TermFrequency;

/// TF IDF Calculation Engine Trait
/// By implementing this trait, you can plug different TF-IDF weighting
/// strategies into `Vectorizer<E>`.
/// `DefaultTFIDFEngine` uses `log10(N / df)` idf, max-normalized document tf
/// and augmented query tf.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Search Hits and Hit Entry structures
/// - `Hits`: ranked list of documents, descending score, ties by ascending index
/// - `HitEntry`: document index and cosine similarity
pub use vectorizer::evaluate::scoring::{HitEntry, Hits};

/// Retrieval evaluation on judged queries (average precision, recall)
pub use evaluation::{EvaluationReport, Evaluator, Judgement};
