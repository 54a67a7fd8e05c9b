//! Retrieval engine: the composition root.
//!
//! The trained state lives in an immutable `Snapshot` published through a
//! `RwLock<Option<Arc<_>>>`. Queries clone the `Arc` and work without holding
//! the lock; `train` and `load` build a complete replacement first and swap it
//! in with one write.

pub mod store;

use std::{
    collections::HashSet,
    path::Path,
    sync::Arc,
    time::Instant,
};

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::EngineConfig,
    document::{Document, ScoredDocument},
    error::{Error, Result},
    normalizer::{analyzer::{RuleAnalyzer, TextAnalyzer}, Normalizer},
    vectorizer::{
        evaluate::scoring::Hits,
        tfidf::{DefaultTFIDFEngine, TFIDFEngine},
        QueryVector, Vectorizer,
    },
    TermFrequency,
};

use self::store::ModelFile;

/// Documents and the model trained from them, never mutated once published
#[derive(Debug)]
pub struct Snapshot<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine,
{
    documents: Vec<Document>,
    vectorizer: Vectorizer<E>,
}

impl<E> Snapshot<E>
where
    E: TFIDFEngine,
{
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vectorizer(&self) -> &Vectorizer<E> {
        &self.vectorizer
    }

    fn scored(&self, hits: &Hits) -> Vec<ScoredDocument> {
        hits.iter()
            .map(|hit| ScoredDocument {
                document: self.documents[hit.index].clone(),
                index: hit.index,
                relevancy: hit.score,
            })
            .collect()
    }
}

/// Outcome of a `train` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// documents in the new model
    pub accepted: usize,
    /// distinct terms in the new model
    pub vocabulary: usize,
    /// `(position, reason)` of every record that was skipped
    pub rejected: Vec<(usize, String)>,
}

/// Vector-space retrieval engine with relevance feedback
///
/// Share it between threads with an `Arc`; every method takes `&self`.
pub struct RetrievalEngine<A = RuleAnalyzer, E = DefaultTFIDFEngine>
where
    A: TextAnalyzer,
    E: TFIDFEngine,
{
    config: EngineConfig,
    normalizer: Normalizer<A>,
    slot: RwLock<Option<Arc<Snapshot<E>>>>,
    /// serializes train / load / save
    writer: Mutex<()>,
}

impl RetrievalEngine<RuleAnalyzer, DefaultTFIDFEngine> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_normalizer(config, Normalizer::new())
    }
}

impl Default for RetrievalEngine<RuleAnalyzer, DefaultTFIDFEngine> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<A, E> RetrievalEngine<A, E>
where
    A: TextAnalyzer,
    E: TFIDFEngine + Send + Sync,
{
    pub fn with_normalizer(config: EngineConfig, normalizer: Normalizer<A>) -> Self {
        Self {
            config,
            normalizer,
            slot: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer<A> {
        &self.normalizer
    }

    /// The currently published snapshot
    ///
    /// # Errors
    /// * `EmptyCorpus` - nothing was trained or loaded yet
    pub fn snapshot(&self) -> Result<Arc<Snapshot<E>>> {
        self.slot.read().clone().ok_or(Error::EmptyCorpus)
    }

    pub fn is_trained(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn document_count(&self) -> usize {
        self.slot.read().as_ref().map_or(0, |s| s.documents.len())
    }

    fn publish(&self, snapshot: Snapshot<E>) {
        *self.slot.write() = Some(Arc::new(snapshot));
    }

    /// Validate the records, index them and replace the model
    ///
    /// Malformed records and duplicate ids are logged, skipped and listed in the
    /// report. On error the previous model stays in place.
    ///
    /// # Errors
    /// * `EmptyCorpus` - no valid record, or no record produced a term
    pub fn train(&self, records: &[Value]) -> Result<TrainReport> {
        let _guard = self.writer.lock();
        let start = Instant::now();

        let mut report = TrainReport::default();
        let mut documents = Vec::with_capacity(records.len());
        let mut ids = HashSet::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            let checked = Document::from_value(position, record).and_then(|doc| {
                if ids.contains(&doc.id) {
                    Err(Error::DocumentValidation {
                        position,
                        reason: format!("duplicate id {:?}", doc.id),
                    })
                } else {
                    Ok(doc)
                }
            });
            match checked {
                Ok(doc) => {
                    ids.insert(doc.id.clone());
                    documents.push(doc);
                }
                Err(e) => {
                    warn!(position, error = %e, "skipping record");
                    report.rejected.push((position, e.to_string()));
                }
            }
        }
        if documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let freqs: Vec<TermFrequency> = documents
            .par_iter()
            .map(|doc| self.normalizer.normalize(&doc.indexable_text(), true))
            .collect();
        let vectorizer = Vectorizer::<E>::train(&freqs)?;

        report.accepted = documents.len();
        report.vocabulary = vectorizer.model().vocabulary().len();
        self.publish(Snapshot { documents, vectorizer });
        info!(
            documents = report.accepted,
            skipped = report.rejected.len(),
            vocabulary = report.vocabulary,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "model trained"
        );
        Ok(report)
    }

    /// Read a JSON array of raw records and `train` on it
    pub fn train_from_path(&self, path: impl AsRef<Path>) -> Result<TrainReport> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let records: Vec<Value> = serde_json::from_str(&raw).map_err(|e| Error::json(path, e))?;
        info!(path = %path.display(), records = records.len(), "corpus loaded");
        self.train(&records)
    }

    fn query_vector(&self, snapshot: &Snapshot<E>, query: &str) -> QueryVector {
        let freq = self.normalizer.normalize(query, false);
        let vector = snapshot.vectorizer.vectorize_query(&freq, self.config.query_damping);
        if vector.is_zero() {
            debug!(query, terms = freq.term_num(), "query has no known terms");
        } else {
            debug!(query, terms = freq.term_num(), "query vectorized");
        }
        vector
    }

    /// Documents ranked by cosine similarity with `query`, at most `top` of them
    ///
    /// A query without known terms is not an error: every document scores 0.
    ///
    /// # Errors
    /// * `EmptyCorpus` - called before any successful `train` / `load`
    pub fn find(&self, query: &str, top: usize) -> Result<Vec<ScoredDocument>> {
        let snapshot = self.snapshot()?;
        let vector = self.query_vector(&snapshot, query);
        let mut hits = snapshot.vectorizer.rank(&vector);
        hits.truncate(top);
        Ok(snapshot.scored(&hits))
    }

    /// `find` with the query moved by Rocchio feedback before ranking
    ///
    /// # Arguments
    /// * `good` - indices of documents judged relevant
    /// * `bad` - indices of documents judged nonrelevant
    ///
    /// # Errors
    /// * `EmptyCorpus` - called before any successful `train` / `load`
    /// * `InvalidFeedbackIndex` - an index is not below the document count
    pub fn find_with_feedback(&self, query: &str, good: &[usize], bad: &[usize], top: usize) -> Result<Vec<ScoredDocument>> {
        let snapshot = self.snapshot()?;
        let vector = self.query_vector(&snapshot, query);
        let adjusted = snapshot
            .vectorizer
            .apply_feedback(&vector, good, bad, &self.config.rocchio)?;
        debug!(good = good.len(), bad = bad.len(), "feedback applied");
        let mut hits = snapshot.vectorizer.rank(&adjusted);
        hits.truncate(top);
        Ok(snapshot.scored(&hits))
    }

    /// Save to the configured model path
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.config.model_path)
    }

    /// Load from the configured model path
    pub fn load(&self) -> Result<()> {
        self.load_from(&self.config.model_path)
    }

    /// # Errors
    /// * `EmptyCorpus` - nothing to save
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let _guard = self.writer.lock();
        let snapshot = self.snapshot()?;
        let file = ModelFile::new(snapshot.documents.clone(), snapshot.vectorizer.to_data());
        store::write(path.as_ref(), &file)
    }

    /// Replace the model with the one stored at `path`
    /// Any failure leaves the current model untouched.
    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<()> {
        let _guard = self.writer.lock();
        let path = path.as_ref();
        let (documents, vectorizer) = store::read(path)?.into_parts::<E>()?;
        info!(
            path = %path.display(),
            documents = documents.len(),
            vocabulary = vectorizer.model().vocabulary().len(),
            "model loaded"
        );
        self.publish(Snapshot { documents, vectorizer });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pets() -> Vec<Value> {
        vec![
            json!({"id": "1", "title": "", "content": "cat dog"}),
            json!({"id": "2", "title": "", "content": "dog bird"}),
            json!({"id": "3", "title": "", "content": "cat cat bird bird bird"}),
        ]
    }

    #[test]
    fn find_before_training_fails() {
        let engine = RetrievalEngine::new(EngineConfig::default());
        assert!(!engine.is_trained());
        assert!(matches!(engine.find("cat", 3), Err(Error::EmptyCorpus)));
        assert!(matches!(engine.save(), Err(Error::EmptyCorpus)));
    }

    #[test]
    fn queries_go_through_the_engine_normalizer() {
        let engine = RetrievalEngine::new(EngineConfig::default());
        let analyzer = engine.normalizer().analyzer();
        assert!(analyzer.tag("the").is_stop);
        assert_eq!(analyzer.stem("cats"), "cat");
        let terms = engine.normalizer().normalize("What about the cats?", false);
        assert!(terms.term_set().contains(&"cat"));
    }

    #[test]
    fn train_skips_bad_records() {
        let engine = RetrievalEngine::new(EngineConfig::default());
        let mut records = pets();
        records.push(json!({"id": "4"}));
        records.push(json!({"id": "1", "title": "dup", "content": "dup"}));
        let report = engine.train(&records).unwrap();
        assert_eq!(report.accepted, 3);
        assert_eq!(report.vocabulary, 3);
        let positions: Vec<usize> = report.rejected.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![3, 4]);
        assert_eq!(engine.document_count(), 3);
    }

    #[test]
    fn train_without_terms_keeps_previous_model() {
        let engine = RetrievalEngine::new(EngineConfig::default());
        engine.train(&pets()).unwrap();
        let only_stopwords = vec![json!({"id": "x", "title": "the", "content": "of and 42"})];
        assert!(matches!(engine.train(&only_stopwords), Err(Error::EmptyCorpus)));
        assert!(matches!(engine.train(&[]), Err(Error::EmptyCorpus)));
        assert_eq!(engine.document_count(), 3);
    }

    #[test]
    fn find_ranks_and_truncates() {
        let engine = RetrievalEngine::new(EngineConfig::default());
        engine.train(&pets()).unwrap();
        let hits = engine.find("cat", 2).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!((hits[0].relevancy - 1.0 / 2.0_f64.sqrt()).abs() < 1e-6);
        assert!((hits[1].relevancy - 2.0 / 13.0_f64.sqrt()).abs() < 1e-6);
        assert_eq!(hits[1].index, 2);
    }

    #[test]
    fn feedback_pulls_relevant_document_up() {
        let engine = RetrievalEngine::new(EngineConfig::default());
        engine.train(&pets()).unwrap();
        // "dog" ties documents 1 and 2; the lower index comes first
        let plain = engine.find("dog", 3).unwrap();
        assert_eq!(plain[0].document.id, "1");
        assert_eq!(plain[0].relevancy, plain[1].relevancy);
        let fed = engine.find_with_feedback("dog", &[1], &[0], 3).unwrap();
        assert_eq!(fed[0].document.id, "2");
        let err = engine.find_with_feedback("dog", &[3], &[], 3).unwrap_err();
        assert!(matches!(err, Error::InvalidFeedbackIndex { index: 3, document_count: 3 }));
    }
}
