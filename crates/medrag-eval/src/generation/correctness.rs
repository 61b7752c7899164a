//! Correctness evaluator: grades a generated answer against a reference
//! answer for the same query on a 1..5 scale.

use serde::{Deserialize, Serialize};

use medrag_core::error::Result;
use medrag_core::traits::JudgeClient;

use crate::generation::{parse_judge_json, recovered_reasoning, round2};
use crate::ledger::Ledger;

const CORRECTNESS_SYSTEM_PROMPT: &str = "\
You are an expert evaluation system for a question answering chatbot.

You are given the following information:
- a user query,
- a reference answer, and
- a generated answer.

Your job is to judge the relevance and correctness of the generated answer.
Output a single score that represents a holistic evaluation, together with
your reasoning for the score.

Follow these guidelines for scoring:
- Your score has to be between 1 and 5, where 1 is the worst and 5 is the best.
- If the generated answer is not relevant to the user query, you should give a score of 1.
- If the generated answer is relevant but contains mistakes, you should give a score between 2 and 3.
- If the generated answer is relevant and fully correct, you should give a score between 4 and 5.";

fn user_prompt(query: &str, reference_answer: &str, generated_answer: &str) -> String {
    format!(
        "## User Query\n{query}\n\n## Reference Answer\n{reference_answer}\n\n## Generated Answer\n{generated_answer}"
    )
}

fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "correctness_evaluation_output",
            "schema": {
                "type": "object",
                "properties": {
                    "reasoning": {"type": "string"},
                    "score": {"type": "number"}
                },
                "required": ["reasoning", "score"],
                "additionalProperties": false
            },
            "strict": true
        }
    })
}

#[derive(Debug, Deserialize)]
struct RawCorrectness {
    score: f64,
    reasoning: String,
}

/// Verdict for one (query, reference, generated) triple. The score and
/// reasoning are taken verbatim from the judge; `passing` compares the
/// score against the configured threshold.
#[derive(Debug, Clone, Serialize)]
pub struct CorrectnessVerdict {
    pub score: f64,
    pub reasoning: String,
    pub passing: bool,
}

/// One item of a batch correctness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectnessItem {
    pub resource_id: String,
    pub query: String,
    pub reference_answer: String,
    pub generated_answer: String,
}

/// Ledger row. Score and passing are null when the item was recovered
/// from a judge failure; reasoning then carries the diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectnessRow {
    pub resource_id: String,
    pub score: Option<f64>,
    pub reasoning: String,
    pub passing: Option<bool>,
}

/// Aggregate over everything persisted in the ledger, including rows
/// from earlier partial runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectnessBatchReport {
    /// Mean score normalised to 0..1 (sum of scores over rows * 5).
    pub mean_score: f64,
    pub rows: usize,
    pub failures: usize,
}

pub struct CorrectnessEvaluator {
    judge: Box<dyn JudgeClient>,
    threshold: f64,
}

impl CorrectnessEvaluator {
    pub fn new(judge: Box<dyn JudgeClient>) -> Self {
        Self { judge, threshold: 4.0 }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Judges one triple. Call and parse failures are fatal here; only
    /// the batch path recovers them.
    pub fn evaluate(
        &self,
        query: &str,
        reference_answer: &str,
        generated_answer: &str,
    ) -> Result<CorrectnessVerdict> {
        let raw = self.judge.complete(
            CORRECTNESS_SYSTEM_PROMPT,
            &user_prompt(query, reference_answer, generated_answer),
            &response_schema(),
        )?;
        let parsed: RawCorrectness = parse_judge_json(&raw)?;
        Ok(CorrectnessVerdict {
            passing: parsed.score >= self.threshold,
            score: parsed.score,
            reasoning: parsed.reasoning,
        })
    }

    /// Judges a batch, appending one ledger row per item as soon as it
    /// is evaluated. Items already present in the ledger are skipped,
    /// so an interrupted run can be re-launched against the same path.
    pub fn run_batch(
        &self,
        items: &[CorrectnessItem],
        ledger: &Ledger,
    ) -> Result<CorrectnessBatchReport> {
        let done = ledger.completed_ids()?;
        let mut writer = ledger.writer()?;
        let mut failures = 0usize;

        for item in items {
            if done.contains(&item.resource_id) {
                continue;
            }
            let row = match self.evaluate(&item.query, &item.reference_answer, &item.generated_answer)
            {
                Ok(verdict) => CorrectnessRow {
                    resource_id: item.resource_id.clone(),
                    score: Some(verdict.score),
                    reasoning: verdict.reasoning,
                    passing: Some(verdict.passing),
                },
                Err(error) => {
                    let reasoning = recovered_reasoning(error)?;
                    failures += 1;
                    tracing::warn!(resource_id = %item.resource_id, %reasoning, "correctness item recovered");
                    CorrectnessRow {
                        resource_id: item.resource_id.clone(),
                        score: None,
                        reasoning,
                        passing: None,
                    }
                }
            };
            writer.append(&row)?;
        }
        drop(writer);

        let rows: Vec<CorrectnessRow> = ledger.read_rows()?;
        let scored: f64 = rows.iter().filter_map(|r| r.score).sum();
        let mean_score = if rows.is_empty() {
            0.0
        } else {
            round2(scored / (rows.len() as f64 * 5.0))
        };
        Ok(CorrectnessBatchReport { mean_score, rows: rows.len(), failures })
    }
}
