use std::{io::Read as _, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::Parser;
use docdigest::{
    config,
    extract::{ReaderExtractor, SourceRef},
    llm,
    pipeline::{SummaryOptions, SummaryService},
    status::NullStatusSink,
    store::MemorySummaryStore,
};

#[derive(Parser)]
#[command(
    name = "summarize",
    about = "Summarize a document from a file, a URL, or stdin"
)]
struct Cli {
    /// Path to a plain-text file to summarize.
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,
    /// URL to extract through the reader endpoint and summarize.
    #[arg(long)]
    url: Option<String>,
    /// Document identifier recorded with the persisted summary.
    #[arg(long)]
    document_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    let cli = Cli::parse();

    let config = config::get_config();
    let service = SummaryService::new(
        llm::get_llm_backend(),
        Arc::new(MemorySummaryStore::new()),
        Arc::new(NullStatusSink),
        SummaryOptions::from_config(config),
    );

    let document_id = cli
        .document_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let outcome = if let Some(url) = cli.url {
        let extractor = ReaderExtractor::from_config(config);
        service
            .summarize_document(&document_id, &extractor, &SourceRef::Url(url))
            .await
            .context("failed to summarize URL")?
    } else {
        let text = match cli.file {
            Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("failed to read stdin")?;
                buffer
            }
        };
        if text.trim().is_empty() {
            bail!("no input text provided");
        }
        service
            .summarize_text(&document_id, &text)
            .await
            .context("failed to summarize text")?
    };

    println!("{}", outcome.summary);
    Ok(())
}
