//! Retrieval quality on judged queries.
//!
//! A judgement is a query text with the ids of the documents that answer it.
//! Both metrics walk the ranking down to `top` and look at the ranks holding a
//! relevant document:
//! - average precision: mean of `relevant_so_far / rank`
//! - recall: mean of `relevant_so_far / |relevant|`
//!
//! A query that retrieves nothing relevant scores 0.

use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    document::{string_or_number, strings_or_numbers},
    engine::RetrievalEngine,
    error::{Error, Result},
    normalizer::analyzer::TextAnalyzer,
    vectorizer::tfidf::TFIDFEngine,
};

/// A query with its known relevant documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub text: String,
    #[serde(deserialize_with = "strings_or_numbers")]
    pub docs: Vec<String>,
}

impl Judgement {
    pub fn from_value(position: usize, value: &Value) -> Result<Self> {
        let judgement = Judgement::deserialize(value).map_err(|e| Error::DocumentValidation {
            position,
            reason: e.to_string(),
        })?;
        if judgement.docs.is_empty() {
            return Err(Error::DocumentValidation {
                position,
                reason: "`docs` must list at least one relevant document".into(),
            });
        }
        Ok(judgement)
    }
}

/// Read a JSON array of judgements; invalid entries are logged and skipped
pub fn load_judgements(path: impl AsRef<Path>) -> Result<Vec<Judgement>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let values: Vec<Value> = serde_json::from_str(&raw).map_err(|e| Error::json(path, e))?;
    let judgements: Vec<Judgement> = values
        .iter()
        .enumerate()
        .filter_map(|(position, value)| match Judgement::from_value(position, value) {
            Ok(j) => Some(j),
            Err(e) => {
                warn!(position, error = %e, "skipping judgement");
                None
            }
        })
        .collect();
    info!(path = %path.display(), judgements = judgements.len(), "judgements loaded");
    Ok(judgements)
}

/// Running count of relevant documents at each rank holding one
fn relevant_ranks(retrieved: &[&str], relevant: &HashSet<&str>) -> Vec<(usize, usize)> {
    let mut found = 0;
    retrieved
        .iter()
        .enumerate()
        .filter_map(|(i, id)| {
            relevant.contains(id).then(|| {
                found += 1;
                (i + 1, found)
            })
        })
        .collect()
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Mean of precision at every rank holding a relevant document
pub fn average_precision(retrieved: &[&str], relevant: &HashSet<&str>) -> f64 {
    let ranks = relevant_ranks(retrieved, relevant);
    mean(ranks.iter().map(|&(rank, found)| found as f64 / rank as f64))
}

/// Mean of recall at every rank holding a relevant document
pub fn mean_recall(retrieved: &[&str], relevant: &HashSet<&str>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let ranks = relevant_ranks(retrieved, relevant);
    mean(ranks.iter().map(|&(_, found)| found as f64 / relevant.len() as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryScore {
    pub id: String,
    pub precision: f64,
    pub recall: f64,
    /// relevant documents within the top results
    pub relevant_retrieved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub top: usize,
    pub precision: f64,
    pub recall: f64,
    pub queries: Vec<QueryScore>,
}

/// Runs judged queries through an engine
pub struct Evaluator<'a, A, E>
where
    A: TextAnalyzer,
    E: TFIDFEngine + Send + Sync,
{
    engine: &'a RetrievalEngine<A, E>,
    top: usize,
}

impl<'a, A, E> Evaluator<'a, A, E>
where
    A: TextAnalyzer,
    E: TFIDFEngine + Send + Sync,
{
    pub fn new(engine: &'a RetrievalEngine<A, E>, top: usize) -> Self {
        Self { engine, top }
    }

    fn score(&self, judgement: &Judgement) -> Result<QueryScore> {
        let hits = self.engine.find(&judgement.text, self.top)?;
        let retrieved: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        let relevant: HashSet<&str> = judgement.docs.iter().map(String::as_str).collect();
        Ok(QueryScore {
            id: judgement.id.clone(),
            precision: average_precision(&retrieved, &relevant),
            recall: mean_recall(&retrieved, &relevant),
            relevant_retrieved: relevant_ranks(&retrieved, &relevant).len(),
        })
    }

    /// Mean average precision over `judgements`
    pub fn precision(&self, judgements: &[Judgement]) -> Result<f64> {
        Ok(self.report(judgements)?.precision)
    }

    /// Mean recall over `judgements`
    pub fn recall(&self, judgements: &[Judgement]) -> Result<f64> {
        Ok(self.report(judgements)?.recall)
    }

    pub fn report(&self, judgements: &[Judgement]) -> Result<EvaluationReport> {
        let queries = judgements
            .iter()
            .map(|j| self.score(j))
            .collect::<Result<Vec<_>>>()?;
        Ok(EvaluationReport {
            top: self.top,
            precision: mean(queries.iter().map(|q| q.precision)),
            recall: mean(queries.iter().map(|q| q.recall)),
            queries,
        })
    }
}
