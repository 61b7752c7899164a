use std::sync::Mutex;

use medrag_core::error::{Error, Result};
use medrag_core::traits::{Embedder, RerankScorer, ScoredIndex};
use medrag_core::types::{ChunkRecord, HybridQuery, Meta, ScoredResult, SearchRequest};
use medrag_retrieval::{Reranker, RetrievalEngine};

struct FixedEmbedder {
    dim: usize,
}

impl Embedder for FixedEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; self.dim])
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        4
    }
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Embedding("model unreachable".to_string()))
    }
}

/// Returns canned hits and records the limit of every query it sees.
struct ScriptedIndex {
    hits: Vec<ScoredResult>,
    requested_limits: Mutex<Vec<usize>>,
}

impl ScriptedIndex {
    fn new(hits: Vec<ScoredResult>) -> Self {
        Self { hits, requested_limits: Mutex::new(Vec::new()) }
    }

    fn last_limit(&self) -> Option<usize> {
        self.requested_limits.lock().expect("lock").last().copied()
    }
}

impl ScoredIndex for ScriptedIndex {
    fn query(&self, query: &HybridQuery) -> Result<Vec<ScoredResult>> {
        self.requested_limits.lock().expect("lock").push(query.limit);
        Ok(self.hits.iter().take(query.limit).cloned().collect())
    }
    fn scan(&self, _limit: usize) -> Result<Vec<ChunkRecord>> {
        Ok(Vec::new())
    }
}

fn hit(content: &str, score: f32) -> ScoredResult {
    ScoredResult { score, content: content.to_string(), metadata: Meta::new() }
}

fn request(k: usize, rerank_top_k: usize) -> SearchRequest {
    SearchRequest {
        query: "test question".to_string(),
        k,
        text_boost: 1.0,
        embedding_boost: 1.0,
        rerank_top_k,
    }
}

#[test]
fn k_zero_returns_empty_without_calling_collaborators() {
    // The failing embedder would make any collaborator call fatal.
    let engine = RetrievalEngine::new(
        ScriptedIndex::new(vec![hit("a", 1.0)]),
        Box::new(FailingEmbedder),
    );
    let hits = engine.search(&request(0, 0)).expect("search");
    assert!(hits.is_empty());
}

#[test]
fn embedding_failure_is_fatal_with_no_fallback() {
    let engine = RetrievalEngine::new(
        ScriptedIndex::new(vec![hit("a", 1.0)]),
        Box::new(FailingEmbedder),
    );
    let err = engine.search(&request(3, 0)).unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[test]
fn without_reranking_the_first_k_hybrid_hits_come_back() {
    let index = ScriptedIndex::new(vec![hit("a", 3.0), hit("b", 2.0), hit("c", 1.0)]);
    let engine = RetrievalEngine::new(index, Box::new(FixedEmbedder { dim: 4 }));
    let hits = engine.search(&request(2, 0)).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].content, "a");
    assert_eq!(hits[1].content, "b");
    assert_eq!(engine.index().last_limit(), Some(2));
}

#[test]
fn rerank_pool_is_requested_and_output_truncated_to_k() {
    // rerank_top_k > k: the index must see the larger pool, the caller
    // must get exactly k results ordered by rerank score.
    let index = ScriptedIndex::new(vec![
        hit("a", 5.0),
        hit("b", 4.0),
        hit("c", 3.0),
        hit("d", 2.0),
        hit("e", 1.0),
    ]);
    struct ReverseScorer;
    impl RerankScorer for ReverseScorer {
        fn score_pairs(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>> {
            // Reverse the hybrid order: later documents score higher.
            Ok((0..documents.len()).map(|i| i as f32).collect())
        }
    }
    let engine = RetrievalEngine::new(index, Box::new(FixedEmbedder { dim: 4 }))
        .with_reranker(Reranker::new(Box::new(ReverseScorer)));

    let hits = engine.search(&request(2, 5)).expect("search");
    assert_eq!(engine.index().last_limit(), Some(5));
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].content, "e");
    assert_eq!(hits[1].content, "d");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn rerank_failure_propagates_instead_of_falling_back() {
    struct FailingScorer;
    impl RerankScorer for FailingScorer {
        fn score_pairs(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>> {
            Err(Error::Rerank("cross-encoder crashed".to_string()))
        }
    }
    let index = ScriptedIndex::new(vec![hit("a", 1.0)]);
    let engine = RetrievalEngine::new(index, Box::new(FixedEmbedder { dim: 4 }))
        .with_reranker(Reranker::new(Box::new(FailingScorer)));
    let err = engine.search(&request(1, 3)).unwrap_err();
    assert!(matches!(err, Error::Rerank(_)));
}

#[test]
fn rerank_requested_without_reranker_is_an_error() {
    let index = ScriptedIndex::new(vec![hit("a", 1.0)]);
    let engine = RetrievalEngine::new(index, Box::new(FixedEmbedder { dim: 4 }));
    let err = engine.search(&request(1, 3)).unwrap_err();
    assert!(matches!(err, Error::Rerank(_)));
}

#[test]
fn score_count_mismatch_is_a_rerank_error() {
    struct ShortScorer;
    impl RerankScorer for ShortScorer {
        fn score_pairs(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>> {
            Ok(vec![0.5])
        }
    }
    let reranker = Reranker::new(Box::new(ShortScorer));
    let err = reranker
        .rerank("q", vec![hit("a", 1.0), hit("b", 0.5)])
        .unwrap_err();
    assert!(matches!(err, Error::Rerank(_)));
}

#[test]
fn tied_rerank_scores_keep_candidate_order() {
    struct ConstantScorer;
    impl RerankScorer for ConstantScorer {
        fn score_pairs(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>> {
            Ok(vec![0.5; documents.len()])
        }
    }
    let reranker = Reranker::new(Box::new(ConstantScorer));
    let ranked = reranker
        .rerank("q", vec![hit("first", 3.0), hit("second", 2.0), hit("third", 1.0)])
        .expect("rerank");
    let order: Vec<_> = ranked.iter().map(|(h, _)| h.content.clone()).collect();
    assert_eq!(order, ["first", "second", "third"]);
}

#[test]
fn search_over_memory_index_ranks_the_matching_chunk_first() {
    use medrag_core::types::RESOURCE_ID_KEY;
    use medrag_index::{HashEmbedder, MemoryIndex};

    let embedder = HashEmbedder::new();
    let texts = [
        ("1", "Blood pressure observation 120/80 recorded during visit", "R1"),
        ("2", "Influenza immunization administered in October", "R2"),
        ("3", "Patient reported mild headache after medication", "R3"),
    ];
    let chunks: Vec<ChunkRecord> = texts
        .iter()
        .map(|(id, content, resource)| {
            let mut metadata = Meta::new();
            metadata.insert(RESOURCE_ID_KEY.to_string(), (*resource).to_string());
            ChunkRecord {
                id: (*id).to_string(),
                content: (*content).to_string(),
                embedding: embedder.embed(content).expect("embed"),
                metadata,
            }
        })
        .collect();
    let index = MemoryIndex::from_chunks(384, chunks).expect("index");
    let engine = RetrievalEngine::new(index, Box::new(HashEmbedder::new()));

    let hits = engine
        .search(&SearchRequest {
            query: "blood pressure observation".to_string(),
            k: 2,
            text_boost: 0.25,
            embedding_boost: 4.0,
            rerank_top_k: 0,
        })
        .expect("search");
    assert_eq!(hits[0].resource_id(), Some("R1"));
}

#[test]
fn empty_index_yields_empty_results() {
    let engine = RetrievalEngine::new(
        ScriptedIndex::new(Vec::new()),
        Box::new(FixedEmbedder { dim: 4 }),
    );
    let hits = engine.search(&request(5, 0)).expect("search");
    assert!(hits.is_empty());
}
