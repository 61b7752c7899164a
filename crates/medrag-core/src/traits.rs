//! Seams to the external collaborators: embedding model, scored index,
//! cross-encoder and LLM judge. Retries and timeouts belong to the
//! implementations behind these traits; callers never retry, since a
//! retry at this layer would change the denominator semantics of the
//! evaluation metrics.

use crate::error::Result;
use crate::types::{ChunkRecord, HybridQuery, ScoredResult};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub trait ScoredIndex: Send + Sync {
    /// Hybrid scored query returning up to `query.limit` hits ordered by
    /// combined score descending, ties stable by insertion order.
    fn query(&self, query: &HybridQuery) -> Result<Vec<ScoredResult>>;

    /// Bulk scan of up to `limit` indexed chunks with their metadata.
    fn scan(&self, limit: usize) -> Result<Vec<ChunkRecord>>;
}

pub trait RerankScorer: Send + Sync {
    /// Scores every (query, document) pair in one batched call.
    /// Returns one relevance score per document, in input order.
    fn score_pairs(&self, query: &str, documents: &[String]) -> Result<Vec<f32>>;
}

pub trait JudgeClient: Send + Sync {
    /// Sends a system/user prompt pair constrained to `response_schema`
    /// and returns the raw structured message content.
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_schema: &serde_json::Value,
    ) -> Result<String>;
}
