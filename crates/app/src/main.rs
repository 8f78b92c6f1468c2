use chrono::Utc;
use clap::{Parser, Subcommand};
use rag_answer_core::{
    discover_text_files, read_source_document, split_text, ChunkStore, ChunkingConfig,
    DefaultRagService, InMemoryChunkStore, IngestWarning, RagConfig,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rag-answer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Maximum characters per chunk
    #[arg(long, env = "RAG_CHUNK_SIZE", default_value = "500")]
    chunk_size: usize,

    /// Characters repeated between consecutive chunks
    #[arg(long, env = "RAG_CHUNK_OVERLAP", default_value = "50")]
    chunk_overlap: usize,

    /// Seconds allowed for one answer generation call
    #[arg(long, env = "RAG_GENERATION_TIMEOUT_SECS", default_value = "30")]
    generation_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Split one text file into chunks and print them.
    Chunk {
        /// Text or markdown file to split.
        #[arg(long)]
        file: String,
    },
    /// Load every text file in a folder and answer a question over them.
    Ask {
        /// Folder that contains .txt/.md files recursively.
        #[arg(long)]
        folder: String,
        /// Question to answer.
        #[arg(long)]
        query: String,
        /// Number of chunks to retrieve.
        #[arg(long, env = "RAG_TOP_K", default_value = "3")]
        top_k: usize,
        /// Print the full answer record as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "rag-answer boot"
    );

    match cli.command {
        Command::Chunk { file } => {
            let document = read_source_document(Path::new(&file))?;
            let config = ChunkingConfig {
                chunk_size: cli.chunk_size,
                overlap: cli.chunk_overlap,
            };

            let chunks = split_text(&document.content, config)?;
            let chunks: Vec<_> = chunks.into_iter().filter(|chunk| !chunk.is_empty()).collect();
            if chunks.is_empty() {
                println!("{}: no content to chunk", document.title);
            }

            for (index, chunk) in chunks.iter().enumerate() {
                println!("[{index}] chars={}", chunk.chars().count());
                println!("{chunk}");
            }
        }
        Command::Ask {
            folder,
            query,
            top_k,
            json,
        } => {
            let config = RagConfig {
                chunk_size: cli.chunk_size,
                chunk_overlap: cli.chunk_overlap,
                top_k,
                generation_timeout_secs: cli.generation_timeout_secs,
                ..RagConfig::default()
            };
            let service = DefaultRagService::from_config(config)?;
            let active = service.config();
            info!(
                chunk_size = active.chunk_size,
                chunk_overlap = active.chunk_overlap,
                top_k = active.top_k,
                generation_timeout_secs = active.generation_timeout_secs,
                "service configured"
            );
            let store = InMemoryChunkStore::new();

            let files = discover_text_files(Path::new(&folder));
            if files.is_empty() {
                warn!(folder = %folder, "no text files found");
            }

            for path in files {
                let document = match read_source_document(&path) {
                    Ok(document) => document,
                    Err(error) => {
                        warn!(path = %path.display(), reason = %error, "skipped file");
                        continue;
                    }
                };

                let report = service.ingest_document(&store, &document).await?;
                if report.warnings.contains(&IngestWarning::EmptyInput) {
                    warn!(path = %path.display(), "file has no text");
                }
            }

            let pool = store.all_chunks().await;
            info!(folder = %folder, chunk_count = pool.len(), "chunks loaded");

            let result = service.answer_question(&query, &pool).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!("{}", result.text);
            println!();
            for source in &result.sources {
                println!(
                    "source: {} chunk={} score={:.2}",
                    source.document_title, source.chunk_id, source.relevance_score
                );
            }
            println!(
                "model={} processing_seconds={:.2}",
                result.model_identifier, result.processing_seconds
            );
        }
    }

    Ok(())
}
