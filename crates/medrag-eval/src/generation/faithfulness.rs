//! Faithfulness evaluator: checks whether a generated answer is
//! supported by the retrieved contexts along three YES/NO dimensions.

use serde::{Deserialize, Serialize};

use medrag_core::error::Result;
use medrag_core::traits::JudgeClient;

use crate::generation::{parse_judge_json, recovered_reasoning, round2};
use crate::ledger::Ledger;

const FAITHFULNESS_SYSTEM_PROMPT: &str = "\
Please evaluate the faithfulness of a generated answer with respect to the given context. \
The context consists of chunks of data from FHIR resources, which may include structured \
medical codes, descriptions, and other related information.
Your evaluation should cover the following three aspects:
1. Relevancy: Does the generated answer focus only on the information contained in the context?
2. Accuracy: Is the information provided in the generated answer accurate and correctly reflects the context?
3. Conciseness and Pertinence: Does the generated answer avoid including unrelated or irrelevant information with respect to the context?

You need to answer each question with either YES or NO.
Some examples are provided below.

Information: Apple pie is generally double-crusted.
Context: An apple pie is a fruit pie in which the principal filling ingredient is apples.
Apple pie is often served with whipped cream, ice cream ('apple pie a la mode'), custard or cheddar cheese.
It is generally double-crusted, with pastry both above and below the filling; the upper crust may be solid or latticed.
Relevancy: YES
Accuracy: YES
Conciseness and Pertinence: YES
Reasoning: The context explicitly mentions that apple pie is generally double-crusted, which supports the information.

Information: Apple pies taste bad.
Context: An apple pie is a fruit pie in which the principal filling ingredient is apples.
Apple pie is often served with whipped cream, ice cream ('apple pie a la mode'), custard or cheddar cheese.
It is generally double-crusted, with pastry both above and below the filling; the upper crust may be solid or latticed.
Relevancy: NO
Accuracy: NO
Conciseness and Pertinence: YES
Reasoning: The context does not provide any information regarding the taste of apple pies, so the statement cannot be supported. However, the response is concise and avoids unrelated information.";

fn user_prompt(generated_answer: &str, contexts: &str) -> String {
    format!("## Information\n{generated_answer}\n\n## Contexts\n{contexts}")
}

fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "faithfulness_evaluation_output",
            "schema": {
                "type": "object",
                "properties": {
                    "relevancy": {"type": "string"},
                    "accuracy": {"type": "string"},
                    "conciseness_and_pertinence": {"type": "string"},
                    "reasoning": {"type": "string"}
                },
                "required": ["relevancy", "accuracy", "conciseness_and_pertinence", "reasoning"],
                "additionalProperties": false
            },
            "strict": true
        }
    })
}

#[derive(Debug, Deserialize)]
struct RawFaithfulness {
    relevancy: String,
    accuracy: String,
    conciseness_and_pertinence: String,
    reasoning: String,
}

fn yes_no(answer: &str) -> u8 {
    u8::from(answer == "YES")
}

/// Verdict for one (generated answer, contexts) pair; each dimension is
/// the judge's YES/NO mapped to 1/0.
#[derive(Debug, Clone, Serialize)]
pub struct FaithfulnessVerdict {
    pub relevancy: u8,
    pub accuracy: u8,
    pub conciseness_and_pertinence: u8,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaithfulnessItem {
    pub resource_id: String,
    pub generated_answer: String,
    pub contexts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaithfulnessRow {
    pub resource_id: String,
    pub relevancy: Option<u8>,
    pub accuracy: Option<u8>,
    pub conciseness_and_pertinence: Option<u8>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaithfulnessBatchReport {
    pub relevancy: f64,
    pub accuracy: f64,
    pub conciseness_and_pertinence: f64,
    pub rows: usize,
    pub failures: usize,
}

pub struct FaithfulnessEvaluator {
    judge: Box<dyn JudgeClient>,
}

impl FaithfulnessEvaluator {
    pub fn new(judge: Box<dyn JudgeClient>) -> Self {
        Self { judge }
    }

    pub fn evaluate(&self, generated_answer: &str, contexts: &str) -> Result<FaithfulnessVerdict> {
        let raw = self.judge.complete(
            FAITHFULNESS_SYSTEM_PROMPT,
            &user_prompt(generated_answer, contexts),
            &response_schema(),
        )?;
        let parsed: RawFaithfulness = parse_judge_json(&raw)?;
        Ok(FaithfulnessVerdict {
            relevancy: yes_no(&parsed.relevancy),
            accuracy: yes_no(&parsed.accuracy),
            conciseness_and_pertinence: yes_no(&parsed.conciseness_and_pertinence),
            reasoning: parsed.reasoning,
        })
    }

    /// Batch evaluation with per-row persistence and resume; see the
    /// correctness evaluator for the contract.
    pub fn run_batch(
        &self,
        items: &[FaithfulnessItem],
        ledger: &Ledger,
    ) -> Result<FaithfulnessBatchReport> {
        let done = ledger.completed_ids()?;
        let mut writer = ledger.writer()?;
        let mut failures = 0usize;

        for item in items {
            if done.contains(&item.resource_id) {
                continue;
            }
            let row = match self.evaluate(&item.generated_answer, &item.contexts) {
                Ok(verdict) => FaithfulnessRow {
                    resource_id: item.resource_id.clone(),
                    relevancy: Some(verdict.relevancy),
                    accuracy: Some(verdict.accuracy),
                    conciseness_and_pertinence: Some(verdict.conciseness_and_pertinence),
                    reasoning: verdict.reasoning,
                },
                Err(error) => {
                    let reasoning = recovered_reasoning(error)?;
                    failures += 1;
                    tracing::warn!(resource_id = %item.resource_id, %reasoning, "faithfulness item recovered");
                    FaithfulnessRow {
                        resource_id: item.resource_id.clone(),
                        relevancy: None,
                        accuracy: None,
                        conciseness_and_pertinence: None,
                        reasoning,
                    }
                }
            };
            writer.append(&row)?;
        }
        drop(writer);

        let rows: Vec<FaithfulnessRow> = ledger.read_rows()?;
        let total = rows.len();
        let mean = |field: fn(&FaithfulnessRow) -> Option<u8>| {
            if total == 0 {
                0.0
            } else {
                let sum: f64 = rows.iter().filter_map(field).map(f64::from).sum();
                round2(sum / total as f64)
            }
        };
        Ok(FaithfulnessBatchReport {
            relevancy: mean(|r| r.relevancy),
            accuracy: mean(|r| r.accuracy),
            conciseness_and_pertinence: mean(|r| r.conciseness_and_pertinence),
            rows: total,
            failures,
        })
    }
}
