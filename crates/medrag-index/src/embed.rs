//! Deterministic hashed bag-of-words embedder.
//!
//! Stands in for the sentence-transformer behind the `Embedder` seam in
//! offline runs and tests: each alphanumeric token is hashed into one of
//! the 384 dimensions with a hash-derived sign, then the vector is L2
//! normalised. Identical text always embeds identically and token
//! overlap shows up as positive cosine similarity.

use std::hash::Hasher;
use twox_hash::XxHash64;

use medrag_core::error::Result;
use medrag_core::traits::Embedder;
use medrag_core::types::EMBEDDING_DIM;

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: EMBEDDING_DIM }
    }

    pub fn with_dim(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let hash = hasher.finish();
            let slot = (hash % self.dim as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}
