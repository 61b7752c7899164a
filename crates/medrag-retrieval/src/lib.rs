//! Hybrid retrieval engine.
//!
//! One configurable search contract replaces the historical variants:
//! boosted hybrid scoring always, reranking only when `rerank_top_k > 0`.

pub mod rerank;

pub use rerank::Reranker;

use medrag_core::error::{Error, Result};
use medrag_core::traits::{Embedder, ScoredIndex};
use medrag_core::types::{HybridQuery, ScoredResult, SearchRequest};

pub struct RetrievalEngine<I: ScoredIndex> {
    index: I,
    embedder: Box<dyn Embedder>,
    reranker: Option<Reranker>,
}

impl<I: ScoredIndex> RetrievalEngine<I> {
    pub fn new(index: I, embedder: Box<dyn Embedder>) -> Self {
        Self { index, embedder, reranker: None }
    }

    pub fn with_reranker(mut self, reranker: Reranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Runs one hybrid search.
    ///
    /// The query is embedded exactly once; an embedding failure is fatal
    /// to the call. There is no lexical-only fallback, so result sets
    /// stay comparable across calls for the metrics engine. The index is
    /// asked for `max(k, rerank_top_k)` candidates; with reranking
    /// enabled the reranked list is truncated to `k` and the returned
    /// scores are the reranker's relevance scores.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<ScoredResult>> {
        request.validate()?;
        if request.k == 0 {
            return Ok(Vec::new());
        }

        tracing::debug!(query = %request.query, k = request.k, "searching");
        let embedding = self.embedder.embed(&request.query)?;
        if embedding.len() != self.embedder.dim() {
            return Err(Error::Embedding(format!(
                "embedder returned {} dimensions, expected {}",
                embedding.len(),
                self.embedder.dim()
            )));
        }

        let candidates = self.index.query(&HybridQuery {
            text: request.query.clone(),
            embedding,
            text_boost: request.text_boost,
            embedding_boost: request.embedding_boost,
            limit: request.candidate_pool(),
        })?;

        if request.rerank_top_k == 0 {
            let mut hits = candidates;
            hits.truncate(request.k);
            return Ok(hits);
        }

        let reranker = self.reranker.as_ref().ok_or_else(|| {
            Error::Rerank("reranking requested but no reranker is configured".to_string())
        })?;
        let ranked = reranker.rerank(&request.query, candidates)?;
        Ok(ranked
            .into_iter()
            .take(request.k)
            .map(|(mut hit, relevance)| {
                hit.score = relevance;
                hit
            })
            .collect())
    }
}
