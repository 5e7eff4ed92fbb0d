//! `cds`: build the guideline index and run one-shot questions or
//! assessments against it from the command line.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cds_agent::{CdsService, JsonFileRecordStore};
use cds_model::GeminiModel;
use cds_rag::{
    FileVectorStore, GeminiEmbeddings, GuidelineIndex, PageChunker, PdfDirSource, RagConfig,
    RetrievalPipeline,
};
use cds_session::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "cds", about = "NG12 clinical decision support CLI")]
struct Cli {
    /// Directory holding the guideline PDFs and patients.json.
    #[arg(long, global = true, default_value = "data")]
    data_dir: String,

    /// Directory the vector index is persisted under.
    #[arg(long, global = true, default_value = "vectorstore")]
    store_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, chunk, embed, and store the guideline PDFs.
    Ingest {
        /// Re-ingest even if the collection is already populated.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Ask a one-shot question against the guidelines.
    Ask {
        question: String,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Produce a risk assessment for a patient.
    Assess { patient_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Cli { data_dir, store_dir, command } = Cli::parse();

    let config = RagConfig::default();
    let chunker = PageChunker::new(config.chunk_tokens, config.overlap_tokens, "ng12")
        .context("invalid chunking configuration")?;
    let store = Arc::new(FileVectorStore::open(&store_dir).await?);
    let embedder = Arc::new(GeminiEmbeddings::from_env()?);
    let index = Arc::new(GuidelineIndex::new(
        store,
        embedder.clone(),
        Arc::new(PdfDirSource::new(&data_dir)),
        chunker,
        config.collection.clone(),
    ));

    match command {
        Command::Ingest { force } => {
            let existing = index.count().await?;
            if existing > 0 && !force {
                println!(
                    "Vector store already exists with {existing} chunks. Use --force to re-ingest."
                );
                return Ok(());
            }
            let count = index.rebuild().await.context("ingestion failed")?;
            println!("Stored {count} chunks in collection '{}'.", index.collection());
        }
        Command::Ask { question, top_k } => {
            let service = build_service(&data_dir, config, embedder, index)?;
            let response = service.chat("cli", &question, Some(top_k)).await?;
            println!("{}", response.answer);
            for citation in &response.citations {
                println!("  [{} p.{}] {}", citation.chunk_id, citation.page, citation.excerpt);
            }
        }
        Command::Assess { patient_id } => {
            let service = build_service(&data_dir, config, embedder, index)?;
            let result = service.assess(&patient_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn build_service(
    data_dir: &str,
    config: RagConfig,
    embedder: Arc<GeminiEmbeddings>,
    index: Arc<GuidelineIndex>,
) -> Result<CdsService> {
    let pipeline = Arc::new(
        RetrievalPipeline::builder().config(config).embedder(embedder).index(index).build()?,
    );
    let records = Arc::new(JsonFileRecordStore::new(format!("{data_dir}/patients.json")));
    Ok(CdsService::new(pipeline, Arc::new(GeminiModel::from_env()?), SessionStore::new(), records))
}
