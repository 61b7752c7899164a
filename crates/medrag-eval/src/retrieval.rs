//! Retrieval quality metrics.
//!
//! Per reference question: search, find the 1-based rank of the first
//! hit whose `resource_id` matches the ground truth (first-hit
//! semantics), count all matching hits, and accumulate precision and
//! recall. Means are computed once at the end of a run; every run gets
//! its own accumulator so parameter sweeps stay independent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use medrag_core::error::Result;
use medrag_core::traits::ScoredIndex;
use medrag_core::types::{ReferenceQa, ScoredResult, SearchRequest};
use medrag_retrieval::RetrievalEngine;

/// Search parameters held fixed across one evaluation run.
#[derive(Debug, Clone)]
pub struct MetricsParams {
    pub k: usize,
    pub text_boost: f32,
    pub embedding_boost: f32,
    pub rerank_top_k: usize,
}

/// Cooperative cancellation for long metric sweeps. Cancelling mid-run
/// yields a partial summary over the questions fully processed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Aggregated metrics, means rounded to 3 decimals, 0 whenever the
/// denominator is 0. Raw counters are kept for auditability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub retrieval_accuracy: f64,
    pub average_position: f64,
    pub mrr: f64,
    pub average_precision: f64,
    pub average_recall: f64,
    pub total_questions: usize,
    pub total_found: usize,
    pub position_sum: usize,
}

/// Running sums for one evaluation run, mutated once per question.
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    total_questions: usize,
    total_found: usize,
    position_sum: usize,
    reciprocal_rank_sum: f64,
    precision_sum: f64,
    recall_sum: f64,
}

impl MetricsAccumulator {
    /// Folds in one question's results. `relevant_total` is the number
    /// of chunks indexed for the ground-truth resource.
    pub fn record(&mut self, results: &[ScoredResult], resource_id: &str, relevant_total: usize) {
        self.total_questions += 1;

        let mut first_rank = None;
        let mut retrieved_relevant = 0usize;
        for (i, result) in results.iter().enumerate() {
            if result.resource_id() == Some(resource_id) {
                if first_rank.is_none() {
                    first_rank = Some(i + 1);
                }
                retrieved_relevant += 1;
            }
        }

        // Only the first match contributes to rank, position and MRR.
        if let Some(rank) = first_rank {
            self.total_found += 1;
            self.position_sum += rank;
            self.reciprocal_rank_sum += 1.0 / rank as f64;
        }

        if !results.is_empty() {
            self.precision_sum += retrieved_relevant as f64 / results.len() as f64;
        }
        if relevant_total > 0 {
            self.recall_sum += retrieved_relevant as f64 / relevant_total as f64;
        }
    }

    pub fn summarize(&self) -> MetricsSummary {
        let questions = self.total_questions as f64;
        let found = self.total_found as f64;
        MetricsSummary {
            retrieval_accuracy: ratio(found, questions),
            average_position: ratio(self.position_sum as f64, found),
            mrr: ratio(self.reciprocal_rank_sum, questions),
            average_precision: ratio(self.precision_sum, questions),
            average_recall: ratio(self.recall_sum, questions),
            total_questions: self.total_questions,
            total_found: self.total_found,
            position_sum: self.position_sum,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        round3(numerator / denominator)
    } else {
        0.0
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub struct RetrievalMetricsEngine<'a, I: ScoredIndex> {
    engine: &'a RetrievalEngine<I>,
}

impl<'a, I: ScoredIndex> RetrievalMetricsEngine<'a, I> {
    pub fn new(engine: &'a RetrievalEngine<I>) -> Self {
        Self { engine }
    }

    /// Searches for one reference question and folds the outcome into
    /// `accumulator`. Exposed so callers driving their own loop (for
    /// progress reporting) share the exact aggregation.
    pub fn evaluate_question(
        &self,
        qa: &ReferenceQa,
        relevant_total: usize,
        params: &MetricsParams,
        accumulator: &mut MetricsAccumulator,
    ) -> Result<()> {
        let results = self.engine.search(&SearchRequest {
            query: qa.question.clone(),
            k: params.k,
            text_boost: params.text_boost,
            embedding_boost: params.embedding_boost,
            rerank_top_k: params.rerank_top_k,
        })?;
        accumulator.record(&results, &qa.resource_id, relevant_total);
        Ok(())
    }

    pub fn evaluate(
        &self,
        references: &[ReferenceQa],
        relevant_chunk_counts: &HashMap<String, usize>,
        params: &MetricsParams,
    ) -> Result<MetricsSummary> {
        self.evaluate_with_cancel(references, relevant_chunk_counts, params, &CancelToken::default())
    }

    /// Like `evaluate`, but checks `cancel` between questions. A
    /// cancelled run returns the summary over the questions already
    /// fully processed; the in-flight question is never half-counted.
    pub fn evaluate_with_cancel(
        &self,
        references: &[ReferenceQa],
        relevant_chunk_counts: &HashMap<String, usize>,
        params: &MetricsParams,
        cancel: &CancelToken,
    ) -> Result<MetricsSummary> {
        let mut accumulator = MetricsAccumulator::default();
        for qa in references {
            if cancel.is_cancelled() {
                tracing::info!(
                    processed = accumulator.total_questions,
                    total = references.len(),
                    "metrics run cancelled, emitting partial summary"
                );
                break;
            }
            let relevant_total = relevant_chunk_counts
                .get(&qa.resource_id)
                .copied()
                .unwrap_or(qa.expected_chunk_count);
            self.evaluate_question(qa, relevant_total, params, &mut accumulator)?;
        }
        Ok(accumulator.summarize())
    }
}

/// Counts indexed chunks per `resource_id` via a bulk scan. This is the
/// recall denominator source for a metrics run.
pub fn resource_chunk_counts(index: &dyn ScoredIndex, limit: usize) -> Result<HashMap<String, usize>> {
    let mut counts = HashMap::new();
    for record in index.scan(limit)? {
        if let Some(resource_id) = record.resource_id() {
            *counts.entry(resource_id.to_string()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}
