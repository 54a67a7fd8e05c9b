use std::{cmp::Ordering, fmt::Debug};

use rayon::prelude::*;

use crate::{
    utils::math::vector::cosine,
    vectorizer::{tfidf::TFIDFEngine, QueryVector, Vectorizer},
};

/// One ranked document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEntry {
    /// Position of the document in the trained collection
    pub index: usize,
    /// Cosine similarity with the query, 0 when either side has zero norm
    pub score: f64,
}

/// Structure to store search results
pub struct Hits {
    pub list: Vec<HitEntry>,
}

impl Hits {
    /// Create a new Hits instance
    pub fn new(list: Vec<HitEntry>) -> Self {
        Hits { list }
    }

    /// Sort results by descending score
    /// Equal scores keep ascending document index, so the order is total and reproducible.
    pub fn sort_by_score(&mut self) -> &mut Self {
        self.list.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });
        self
    }

    /// Keep the first `n` entries
    pub fn truncate(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HitEntry> {
        self.list.iter()
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            // Pretty print with alternate formatting: each hit on a new line
            writeln!(f, "Hits [")?;
            for hit in &self.list {
                writeln!(f, "    #{}: {:.6}", hit.index, hit.score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(self.list.iter().map(|h| (h.index, h.score))).finish()
        }
    }
}

/// Score every row of `matrix` against `query` and sort.
/// Rows are scored in parallel; the result order depends only on the scores.
pub fn cosine_rank(query: &[f64], matrix: &[Vec<f64>]) -> Hits {
    let list: Vec<HitEntry> = matrix
        .par_iter()
        .enumerate()
        .map(|(index, row)| HitEntry {
            index,
            score: cosine(row.as_slice(), query),
        })
        .collect();
    let mut hits = Hits::new(list);
    hits.sort_by_score();
    hits
}

impl<E> Vectorizer<E>
where
    E: TFIDFEngine,
{
    /// Rank every trained document against a query vector
    /// A zero query vector ranks every document at 0, in collection order.
    pub fn rank(&self, query: &QueryVector) -> Hits {
        cosine_rank(query.as_slice(), self.model.weights())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_descending_with_index_tiebreak() {
        let mut hits = Hits::new(vec![
            HitEntry { index: 0, score: 0.2 },
            HitEntry { index: 1, score: 0.9 },
            HitEntry { index: 2, score: 0.2 },
            HitEntry { index: 3, score: 0.9 },
        ]);
        hits.sort_by_score();
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn zero_query_keeps_collection_order() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![0.5, 0.5]];
        let hits = cosine_rank(&[0.0, 0.0], &matrix);
        assert_eq!(hits.len(), 3);
        for (pos, hit) in hits.iter().enumerate() {
            assert_eq!(hit.index, pos);
            assert_eq!(hit.score, 0.0);
        }
    }

    #[test]
    fn zero_document_row_scores_zero_without_nan() {
        let matrix = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let hits = cosine_rank(&[1.0, 0.0], &matrix);
        assert_eq!(hits.list[0].index, 1);
        assert_eq!(hits.list[1], HitEntry { index: 0, score: 0.0 });
        assert!(hits.iter().all(|h| !h.score.is_nan()));
    }

    #[test]
    fn negative_scores_sort_last() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let hits = cosine_rank(&[-1.0, 0.5], &matrix);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(hits.list[2].score < 0.0);
    }

    #[test]
    fn truncate_and_debug() {
        let mut hits = cosine_rank(&[1.0], &[vec![1.0], vec![2.0], vec![0.0]]);
        hits.truncate(2);
        assert_eq!(hits.len(), 2);
        assert_eq!(format!("{:?}", hits), "[(0, 1.0), (1, 1.0)]");
    }
}
