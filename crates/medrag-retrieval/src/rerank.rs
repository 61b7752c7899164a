//! Second-stage reordering of a candidate set with a pairwise relevance
//! model. All (query, content) pairs go to the scorer in one batched
//! call to amortize model-invocation overhead.

use medrag_core::error::{Error, Result};
use medrag_core::traits::RerankScorer;
use medrag_core::types::ScoredResult;

pub struct Reranker {
    scorer: Box<dyn RerankScorer>,
}

impl Reranker {
    pub fn new(scorer: Box<dyn RerankScorer>) -> Self {
        Self { scorer }
    }

    /// Returns the candidates paired with their relevance score, sorted
    /// by score descending. The sort is stable, so tied candidates keep
    /// their incoming order. A scorer failure propagates; the caller
    /// must not fall back to the unranked order.
    pub fn rerank(
        &self,
        query: &str,
        candidates: Vec<ScoredResult>,
    ) -> Result<Vec<(ScoredResult, f32)>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let documents: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let scores = self.scorer.score_pairs(query, &documents)?;
        if scores.len() != candidates.len() {
            return Err(Error::Rerank(format!(
                "scorer returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }
        let mut ranked: Vec<(ScoredResult, f32)> =
            candidates.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }
}
