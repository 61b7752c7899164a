use std::env;
use std::fs;
use std::path::PathBuf;

use medrag_core::config::AppConfig;
use medrag_core::traits::Embedder;
use medrag_core::types::{ChunkRecord, SearchRequest, EMBEDDING_DIM};
use medrag_index::{HashEmbedder, MemoryIndex};
use medrag_retrieval::RetrievalEngine;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [chunks.json]", args[0]);
        eprintln!("Example: {} 'blood pressure observation' ./data/chunks.json", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let chunks_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data/chunks.json"));

    let config = AppConfig::load()?;
    println!("🔍 medrag-search\n================");
    println!("Query: {}", query_text);
    println!("Chunks file: {}", chunks_path.display());

    let embedder = HashEmbedder::new();
    let chunks = load_chunks(&chunks_path, &embedder)?;
    println!("Loaded {} chunks", chunks.len());
    let index = MemoryIndex::from_chunks(EMBEDDING_DIM, chunks)?;
    let engine = RetrievalEngine::new(index, Box::new(HashEmbedder::new()));

    let results = engine.search(&SearchRequest {
        query: query_text.clone(),
        k: config.search.k,
        text_boost: config.search.text_boost,
        embedding_boost: config.search.embedding_boost,
        rerank_top_k: 0,
    })?;

    println!("\n🔍 Found {} results for: \"{}\"", results.len(), query_text);
    for (i, result) in results.iter().enumerate() {
        println!(
            "\n  {}. score={:.4}  resource_id={}",
            i + 1,
            result.score,
            result.resource_id().unwrap_or("-")
        );
        println!("     📝 {}", result.content);
    }
    Ok(())
}

/// Loads a chunk dump; chunks without embeddings get one computed
/// locally so dumps exported before embedding still work offline.
fn load_chunks(path: &PathBuf, embedder: &HashEmbedder) -> anyhow::Result<Vec<ChunkRecord>> {
    let raw = fs::read_to_string(path)?;
    let mut chunks: Vec<ChunkRecord> = serde_json::from_str(&raw)?;
    for chunk in &mut chunks {
        if chunk.embedding.is_empty() {
            chunk.embedding = embedder.embed(&chunk.content)?;
        }
    }
    Ok(chunks)
}
