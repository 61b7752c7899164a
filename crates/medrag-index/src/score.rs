//! Hybrid score math shared by the in-memory index and its tests.

/// Cosine similarity between two vectors. Zero if either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Lexical relevance of `content` for `query`: the fraction of query
/// terms contained in the content, case-insensitive. Zero for an empty
/// query.
pub fn lexical_overlap(query: &str, content: &str) -> f32 {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();
    if terms.is_empty() {
        return 0.0;
    }
    let content_lower = content.to_lowercase();
    let matched = terms.iter().filter(|t| content_lower.contains(**t)).count();
    matched as f32 / terms.len() as f32
}

/// Combined score: boosted lexical term plus boosted cosine term.
/// Negative cosine similarity is clamped to zero so it can never cancel
/// the lexical term.
pub fn hybrid_score(text_boost: f32, lexical: f32, embedding_boost: f32, cosine: f32) -> f32 {
    text_boost * lexical + embedding_boost * cosine.max(0.0)
}
