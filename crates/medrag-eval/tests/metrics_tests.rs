use std::collections::HashMap;

use medrag_core::error::Result;
use medrag_core::traits::{Embedder, ScoredIndex};
use medrag_core::types::{ChunkRecord, HybridQuery, Meta, ReferenceQa, ScoredResult, RESOURCE_ID_KEY};
use medrag_eval::{resource_chunk_counts, CancelToken, MetricsParams, RetrievalMetricsEngine};
use medrag_index::MemoryIndex;
use medrag_retrieval::RetrievalEngine;

struct FixedEmbedder;

impl Embedder for FixedEmbedder {
    fn dim(&self) -> usize {
        2
    }
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

/// Always returns the same ranked hits, whatever the question.
struct ScriptedIndex {
    hits: Vec<ScoredResult>,
}

impl ScoredIndex for ScriptedIndex {
    fn query(&self, query: &HybridQuery) -> Result<Vec<ScoredResult>> {
        Ok(self.hits.iter().take(query.limit).cloned().collect())
    }
    fn scan(&self, _limit: usize) -> Result<Vec<ChunkRecord>> {
        Ok(Vec::new())
    }
}

fn hit(resource_id: &str) -> ScoredResult {
    let mut metadata = Meta::new();
    metadata.insert(RESOURCE_ID_KEY.to_string(), resource_id.to_string());
    ScoredResult { score: 1.0, content: String::new(), metadata }
}

fn reference(resource_id: &str, question: &str, expected_chunk_count: usize) -> ReferenceQa {
    ReferenceQa {
        resource_id: resource_id.to_string(),
        question: question.to_string(),
        expected_chunk_count,
    }
}

fn params(k: usize) -> MetricsParams {
    MetricsParams { k, text_boost: 1.0, embedding_boost: 1.0, rerank_top_k: 0 }
}

#[test]
fn single_question_example_matches_the_worked_numbers() {
    // Index order R1, R2, R1: first relevant hit at rank 1, two of the
    // two relevant chunks retrieved among three results.
    let engine = RetrievalEngine::new(
        ScriptedIndex { hits: vec![hit("R1"), hit("R2"), hit("R1")] },
        Box::new(FixedEmbedder),
    );
    let metrics = RetrievalMetricsEngine::new(&engine);
    let counts = HashMap::from([("R1".to_string(), 2)]);

    let summary = metrics
        .evaluate(&[reference("R1", "Q1", 2)], &counts, &params(3))
        .expect("evaluate");

    assert_eq!(summary.total_questions, 1);
    assert_eq!(summary.total_found, 1);
    assert_eq!(summary.position_sum, 1);
    assert!((summary.retrieval_accuracy - 1.0).abs() < 1e-9);
    assert!((summary.mrr - 1.0).abs() < 1e-9);
    assert!((summary.average_position - 1.0).abs() < 1e-9);
    assert!((summary.average_precision - 0.667).abs() < 1e-9);
    assert!((summary.average_recall - 1.0).abs() < 1e-9);
}

#[test]
fn questions_with_no_match_still_count_in_the_denominator() {
    let engine = RetrievalEngine::new(
        ScriptedIndex { hits: vec![hit("R1"), hit("R2")] },
        Box::new(FixedEmbedder),
    );
    let metrics = RetrievalMetricsEngine::new(&engine);
    let counts = HashMap::from([("R1".to_string(), 1), ("R9".to_string(), 3)]);

    let summary = metrics
        .evaluate(
            &[reference("R1", "Q1", 1), reference("R9", "Q2", 3)],
            &counts,
            &params(2),
        )
        .expect("evaluate");

    assert_eq!(summary.total_questions, 2);
    assert_eq!(summary.total_found, 1);
    assert!((summary.retrieval_accuracy - 0.5).abs() < 1e-9);
    assert!((summary.mrr - 0.5).abs() < 1e-9);
}

#[test]
fn missing_count_falls_back_to_the_reference_expected_count() {
    let engine = RetrievalEngine::new(
        ScriptedIndex { hits: vec![hit("R1"), hit("R1")] },
        Box::new(FixedEmbedder),
    );
    let metrics = RetrievalMetricsEngine::new(&engine);

    // Empty counts map: recall denominator comes from the reference.
    let summary = metrics
        .evaluate(&[reference("R1", "Q1", 4)], &HashMap::new(), &params(2))
        .expect("evaluate");
    assert!((summary.average_recall - 0.5).abs() < 1e-9);
}

#[test]
fn cancelled_run_reports_only_fully_processed_questions() {
    let engine = RetrievalEngine::new(
        ScriptedIndex { hits: vec![hit("R1")] },
        Box::new(FixedEmbedder),
    );
    let metrics = RetrievalMetricsEngine::new(&engine);
    let cancel = CancelToken::default();
    cancel.cancel();

    let references = vec![reference("R1", "Q1", 1), reference("R1", "Q2", 1)];
    let summary = metrics
        .evaluate_with_cancel(&references, &HashMap::new(), &params(1), &cancel)
        .expect("evaluate");
    assert_eq!(summary.total_questions, 0);
    assert_eq!(summary.retrieval_accuracy, 0.0);
}

#[test]
fn sweep_runs_use_independent_accumulators() {
    let engine = RetrievalEngine::new(
        ScriptedIndex { hits: vec![hit("R1")] },
        Box::new(FixedEmbedder),
    );
    let metrics = RetrievalMetricsEngine::new(&engine);
    let counts = HashMap::from([("R1".to_string(), 1)]);
    let references = [reference("R1", "Q1", 1)];

    let first = metrics.evaluate(&references, &counts, &params(1)).expect("evaluate");
    let second = metrics.evaluate(&references, &counts, &params(1)).expect("evaluate");
    assert_eq!(first, second);
    assert_eq!(second.total_questions, 1);
}

#[test]
fn chunk_counts_are_grouped_by_resource_id() {
    let chunks = vec![
        chunk_with_resource("1", "R1"),
        chunk_with_resource("2", "R1"),
        chunk_with_resource("3", "R2"),
    ];
    let index = MemoryIndex::from_chunks(2, chunks).expect("index");
    let counts = resource_chunk_counts(&index, usize::MAX).expect("counts");
    assert_eq!(counts.get("R1"), Some(&2));
    assert_eq!(counts.get("R2"), Some(&1));
}

fn chunk_with_resource(id: &str, resource_id: &str) -> ChunkRecord {
    let mut metadata = Meta::new();
    metadata.insert(RESOURCE_ID_KEY.to_string(), resource_id.to_string());
    ChunkRecord {
        id: id.to_string(),
        content: "text".to_string(),
        embedding: vec![1.0, 0.0],
        metadata,
    }
}
