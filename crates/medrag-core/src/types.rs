//! Domain types shared by the retrieval and evaluation engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// Dimensionality of every chunk and query embedding.
pub const EMBEDDING_DIM: usize = 384;

/// Metadata key carrying the source FHIR resource identity.
pub const RESOURCE_ID_KEY: &str = "resource_id";

/// A unit of indexed record text with its embedding and metadata.
///
/// Created during ingestion (out of scope here) and read-only afterwards.
/// `metadata` carries at least `resource_id` and `resource_type` plus
/// free-form keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: ChunkId,
    pub content: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Meta,
}

impl ChunkRecord {
    pub fn resource_id(&self) -> Option<&str> {
        self.metadata.get(RESOURCE_ID_KEY).map(String::as_str)
    }
}

/// One ranked hit. Produced fresh per query, never persisted.
///
/// Ordering by `score` descending is the primary invariant; after
/// reranking `score` is the reranker's relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub score: f32,
    pub content: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl ScoredResult {
    pub fn resource_id(&self) -> Option<&str> {
        self.metadata.get(RESOURCE_ID_KEY).map(String::as_str)
    }
}

/// Parameters for one retrieval call.
///
/// `rerank_top_k == 0` disables reranking. When enabled the index is
/// asked for `max(k, rerank_top_k)` candidates and the final list is
/// truncated to `k` after reranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: usize,
    pub text_boost: f32,
    pub embedding_boost: f32,
    #[serde(default)]
    pub rerank_top_k: usize,
}

impl SearchRequest {
    /// Candidate pool size handed to the index.
    pub fn candidate_pool(&self) -> usize {
        self.k.max(self.rerank_top_k)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.text_boost.is_finite() || self.text_boost < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "text_boost must be finite and >= 0, got {}",
                self.text_boost
            )));
        }
        if !self.embedding_boost.is_finite() || self.embedding_boost < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "embedding_boost must be finite and >= 0, got {}",
                self.embedding_boost
            )));
        }
        Ok(())
    }
}

/// The hybrid scored query submitted to the index: a lexical match on the
/// content field boosted by `text_boost` plus the clamped cosine
/// similarity against `embedding` boosted by `embedding_boost`.
#[derive(Debug, Clone)]
pub struct HybridQuery {
    pub text: String,
    pub embedding: Vec<f32>,
    pub text_boost: f32,
    pub embedding_boost: f32,
    pub limit: usize,
}

/// One sampled reference question with its ground-truth resource.
///
/// `expected_chunk_count` is the number of indexed chunks belonging to
/// the resource, i.e. the relevant-set size used for recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceQa {
    pub resource_id: String,
    pub question: String,
    #[serde(default)]
    pub expected_chunk_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_pool_is_max_of_k_and_rerank_top_k() {
        let mut req = SearchRequest {
            query: "q".to_string(),
            k: 3,
            text_boost: 1.0,
            embedding_boost: 1.0,
            rerank_top_k: 0,
        };
        assert_eq!(req.candidate_pool(), 3);
        req.rerank_top_k = 10;
        assert_eq!(req.candidate_pool(), 10);
        req.k = 20;
        assert_eq!(req.candidate_pool(), 20);
    }

    #[test]
    fn negative_boost_is_rejected() {
        let req = SearchRequest {
            query: "q".to_string(),
            k: 3,
            text_boost: -0.5,
            embedding_boost: 1.0,
            rerank_top_k: 0,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn resource_id_reads_metadata_key() {
        let mut metadata = Meta::new();
        metadata.insert(RESOURCE_ID_KEY.to_string(), "R1".to_string());
        let hit = ScoredResult { score: 1.0, content: "c".to_string(), metadata };
        assert_eq!(hit.resource_id(), Some("R1"));
    }
}
