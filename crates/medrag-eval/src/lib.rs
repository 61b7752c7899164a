//! Offline evaluation harness: rank-sensitive retrieval metrics against
//! a reference QA set, and LLM-judge generation evaluators with an
//! append-only CSV ledger.

pub mod generation;
pub mod ledger;
pub mod retrieval;

pub use generation::correctness::{
    CorrectnessBatchReport, CorrectnessEvaluator, CorrectnessItem, CorrectnessRow,
    CorrectnessVerdict,
};
pub use generation::faithfulness::{
    FaithfulnessBatchReport, FaithfulnessEvaluator, FaithfulnessItem, FaithfulnessRow,
    FaithfulnessVerdict,
};
pub use ledger::Ledger;
pub use retrieval::{
    resource_chunk_counts, CancelToken, MetricsAccumulator, MetricsParams, MetricsSummary,
    RetrievalMetricsEngine,
};
