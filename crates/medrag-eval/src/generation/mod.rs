//! LLM-judge generation evaluators.
//!
//! Each evaluator sends a fixed grading rubric plus the item under test
//! to the judge, constrained to a strict JSON schema, and parses the
//! verdict once at this boundary into a typed struct. Batch runs write
//! one ledger row per item immediately after judging it and recompute
//! aggregates by re-reading the ledger, so the reported numbers always
//! match what was persisted.

pub mod correctness;
pub mod faithfulness;

use serde::de::DeserializeOwned;

use medrag_core::error::{Error, Result};

/// Diagnostic reasoning recorded when the judge returns non-JSON.
pub const INVALID_JSON_REASONING: &str = "Invalid JSON response";
/// Diagnostic reasoning recorded when required keys are missing.
pub const INCOMPLETE_JSON_REASONING: &str = "Incomplete JSON response";

/// Parses the judge's raw message content. Invalid JSON and
/// missing-required-keys are distinguished so the ledger row says which
/// failure happened.
fn parse_judge_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|_| Error::JudgeParse(INVALID_JSON_REASONING.to_string()))?;
    serde_json::from_value(value)
        .map_err(|_| Error::JudgeParse(INCOMPLETE_JSON_REASONING.to_string()))
}

/// Maps a recovered batch error to the reasoning string for its row.
/// Ledger and IO failures stay fatal; the ledger is the artifact.
fn recovered_reasoning(error: Error) -> Result<String> {
    match error {
        Error::JudgeParse(reasoning) => Ok(reasoning),
        Error::JudgeCall(message) => Ok(format!("Judge call failed: {message}")),
        other => Err(other),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
