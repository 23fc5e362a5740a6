use clap::{Parser, Subcommand};
use grounded_retriever::{
    HttpCompletionProvider, RetrievalOrchestrator, RetrieverConfig, TextDirectoryLoader,
    VectorIndex,
    retrieval::vector_index::{METADATA_ARTIFACT, VECTOR_ARTIFACT},
};
use grounded_context::TextSplitter;
use grounded_embed::HttpEmbeddingProvider;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// A CLI tool to build and query a grounded document QA index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load documents from a directory and build the vector index
    Build {
        /// Directory of documents to index; defaults to the staging directory
        #[arg(short, long)]
        documents: Option<PathBuf>,
    },
    /// Ask a one-shot question against the indexed corpus
    Ask {
        /// The question to answer
        question: String,
        /// Number of chunks to retrieve
        #[arg(short, long)]
        top_k: Option<usize>,
    },
    /// Report configuration and index artifact state
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RetrieverConfig::from_file(path).await?,
        None => RetrieverConfig::default(),
    };

    match args.command {
        Commands::Build { documents } => {
            let documents_dir = documents.unwrap_or_else(|| config.staging_dir.clone());
            let loader = TextDirectoryLoader::new();
            let documents = loader.load_documents(&documents_dir).await?;

            let mut index = build_index(&config)?;
            index.build(&documents).await?;

            println!(
                "Indexed {} chunks from {} documents into {}",
                index.vector_count(),
                documents.len(),
                config.persist_dir.display()
            );
            for source in index.sources() {
                println!("  {source}");
            }
            Ok(())
        }
        Commands::Ask { question, top_k } => {
            let top_k = top_k.unwrap_or(config.top_k);

            // Staged documents back a cold start; when artifacts exist they
            // are never read.
            let loader = TextDirectoryLoader::new();
            let documents = match loader.load_documents(&config.staging_dir).await {
                Ok(documents) => documents,
                Err(e) => {
                    tracing::warn!("No staged documents available: {e}");
                    Vec::new()
                }
            };

            let index = build_index(&config)?;
            let completion = Arc::new(HttpCompletionProvider::new(config.completion.clone())?);
            let mut orchestrator =
                RetrievalOrchestrator::new(index, completion, &config.transcript_dir, &documents)
                    .await?;

            let answer = orchestrator.answer(&question, top_k).await?;
            println!("{answer}");
            Ok(())
        }
        Commands::Status => {
            println!("Grounded Retriever Status");
            println!("=========================");
            println!("Persist directory: {}", config.persist_dir.display());
            for artifact in [VECTOR_ARTIFACT, METADATA_ARTIFACT] {
                let path = config.persist_dir.join(artifact);
                match std::fs::metadata(&path) {
                    Ok(metadata) => println!(
                        "  {artifact}: present, {} bytes, modified {:?}",
                        metadata.len(),
                        metadata.modified().ok()
                    ),
                    Err(_) => println!("  {artifact}: missing"),
                }
            }
            println!("Staging directory: {}", config.staging_dir.display());
            println!("Embedded directory: {}", config.embedded_dir.display());
            println!("Transcript directory: {}", config.transcript_dir.display());
            println!(
                "Chunking: size {} bytes, overlap {} bytes",
                config.chunk_size, config.chunk_overlap
            );
            println!(
                "Embedding: {} at {} (batch size {})",
                config.embedding.model, config.embedding.endpoint, config.embedding.batch_size
            );
            println!(
                "Completion: {} at {}",
                config.completion.model, config.completion.endpoint
            );
            Ok(())
        }
    }
}

fn build_index(config: &RetrieverConfig) -> anyhow::Result<VectorIndex> {
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
    let embedder = Arc::new(HttpEmbeddingProvider::new(
        config.embedding.to_embed_config(),
    )?);
    Ok(VectorIndex::new(
        config.persist_dir.clone(),
        splitter,
        embedder,
    ))
}
