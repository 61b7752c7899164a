use std::env;
use std::fs;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use medrag_core::config::AppConfig;
use medrag_core::traits::Embedder;
use medrag_core::types::{ChunkRecord, ReferenceQa, EMBEDDING_DIM};
use medrag_eval::{resource_chunk_counts, MetricsAccumulator, MetricsParams, RetrievalMetricsEngine};
use medrag_index::{HashEmbedder, MemoryIndex};
use medrag_retrieval::RetrievalEngine;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut chunks_path = None;
    let mut references_path = None;
    let mut k = config.search.k;
    let mut text_boost = config.search.text_boost;
    let mut embedding_boost = config.search.embedding_boost;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--k" => {
                k = parse_flag(&args, i, "--k")?;
                i += 1;
            }
            "--text-boost" => {
                text_boost = parse_flag(&args, i, "--text-boost")?;
                i += 1;
            }
            "--embedding-boost" => {
                embedding_boost = parse_flag(&args, i, "--embedding-boost")?;
                i += 1;
            }
            _ if !args[i].starts_with('-') => {
                if chunks_path.is_none() {
                    chunks_path = Some(PathBuf::from(&args[i]));
                } else {
                    references_path = Some(PathBuf::from(&args[i]));
                }
            }
            _ => {}
        }
        i += 1;
    }
    let (Some(chunks_path), Some(references_path)) = (chunks_path, references_path) else {
        eprintln!("Usage: medrag-eval-retrieval <chunks.json> <references.jsonl> [--k N] [--text-boost B] [--embedding-boost B]");
        std::process::exit(1);
    };

    println!("Retrieval Metrics\n=================");
    println!("Chunks file: {}", chunks_path.display());
    println!("References file: {}", references_path.display());
    println!("k={k} text_boost={text_boost} embedding_boost={embedding_boost}");

    let embedder = HashEmbedder::new();
    let raw = fs::read_to_string(&chunks_path)?;
    let mut chunks: Vec<ChunkRecord> = serde_json::from_str(&raw)?;
    for chunk in &mut chunks {
        if chunk.embedding.is_empty() {
            chunk.embedding = embedder.embed(&chunk.content)?;
        }
    }
    let chunk_total = chunks.len();
    let index = MemoryIndex::from_chunks(EMBEDDING_DIM, chunks)?;
    let counts = resource_chunk_counts(&index, usize::MAX)?;
    println!("📊 Indexed {} chunks across {} resources", chunk_total, counts.len());

    let references = load_references(&references_path)?;
    println!("📊 Loaded {} reference questions", references.len());

    let engine = RetrievalEngine::new(index, Box::new(HashEmbedder::new()));
    let metrics = RetrievalMetricsEngine::new(&engine);
    let params = MetricsParams { k, text_boost, embedding_boost, rerank_top_k: 0 };

    let bar = ProgressBar::new(references.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);
    bar.set_message("calculating retrieval metrics");

    let mut accumulator = MetricsAccumulator::default();
    for qa in &references {
        let relevant_total = counts
            .get(&qa.resource_id)
            .copied()
            .unwrap_or(qa.expected_chunk_count);
        metrics.evaluate_question(qa, relevant_total, &params, &mut accumulator)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    let summary = accumulator.summarize();
    println!("\n✅ Evaluation completed");
    println!("  Retrieval Accuracy: {:.3}", summary.retrieval_accuracy);
    println!("  Average Position:   {:.3}", summary.average_position);
    println!("  MRR:                {:.3}", summary.mrr);
    println!("  Average Precision:  {:.3}", summary.average_precision);
    println!("  Average Recall:     {:.3}", summary.average_recall);
    println!("  Total Questions:    {}", summary.total_questions);
    println!("  Total Found:        {}", summary.total_found);
    println!("  Position Sum:       {}", summary.position_sum);
    Ok(())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> anyhow::Result<T> {
    args.get(i + 1)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| anyhow::anyhow!("{name} requires a numeric value"))
}

/// One JSON object per line: {"resource_id": ..., "question": ...,
/// "expected_chunk_count": ...}.
fn load_references(path: &PathBuf) -> anyhow::Result<Vec<ReferenceQa>> {
    let raw = fs::read_to_string(path)?;
    let mut references = Vec::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        references.push(serde_json::from_str(line)?);
    }
    Ok(references)
}
