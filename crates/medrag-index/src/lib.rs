//! In-memory reference implementation of the scored index.
//!
//! Holds chunks with fixed-dimension embeddings and answers the hybrid
//! scored query the production datastore answers remotely. Used by the
//! offline evaluation binaries and as the test double for the retrieval
//! engine.

pub mod embed;
pub mod score;

pub use embed::HashEmbedder;

use std::sync::RwLock;

use medrag_core::error::{Error, Result};
use medrag_core::traits::ScoredIndex;
use medrag_core::types::{ChunkRecord, HybridQuery, ScoredResult};

use crate::score::{cosine_similarity, hybrid_score, lexical_overlap};

pub struct MemoryIndex {
    dim: usize,
    chunks: RwLock<Vec<ChunkRecord>>,
}

impl MemoryIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, chunks: RwLock::new(Vec::new()) }
    }

    pub fn from_chunks(dim: usize, chunks: Vec<ChunkRecord>) -> Result<Self> {
        let index = Self::new(dim);
        index.insert(chunks)?;
        Ok(index)
    }

    /// Appends chunks, rejecting any whose embedding dimensionality does
    /// not match the index. Insertion order is the tie-break order for
    /// equal scores.
    pub fn insert(&self, chunks: Vec<ChunkRecord>) -> Result<()> {
        for chunk in &chunks {
            if chunk.embedding.len() != self.dim {
                return Err(Error::Index(format!(
                    "chunk {} has embedding dimension {}, index expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    self.dim
                )));
            }
        }
        let mut store = self
            .chunks
            .write()
            .map_err(|_| Error::Index("chunk store lock poisoned".to_string()))?;
        store.extend(chunks);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoredIndex for MemoryIndex {
    fn query(&self, query: &HybridQuery) -> Result<Vec<ScoredResult>> {
        if query.embedding.len() != self.dim {
            return Err(Error::Index(format!(
                "query embedding dimension {} does not match index dimension {}",
                query.embedding.len(),
                self.dim
            )));
        }
        let store = self
            .chunks
            .read()
            .map_err(|_| Error::Index("chunk store lock poisoned".to_string()))?;

        let mut hits: Vec<ScoredResult> = store
            .iter()
            .map(|chunk| {
                let lexical = lexical_overlap(&query.text, &chunk.content);
                let cosine = cosine_similarity(&query.embedding, &chunk.embedding);
                ScoredResult {
                    score: hybrid_score(query.text_boost, lexical, query.embedding_boost, cosine),
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                }
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        // sort_by is stable, so equal scores keep insertion order
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);
        tracing::debug!(hits = hits.len(), limit = query.limit, "memory index query");
        Ok(hits)
    }

    fn scan(&self, limit: usize) -> Result<Vec<ChunkRecord>> {
        let store = self
            .chunks
            .read()
            .map_err(|_| Error::Index("chunk store lock poisoned".to_string()))?;
        Ok(store.iter().take(limit).cloned().collect())
    }
}
