//! End-to-end example of indexing a documentation folder and asking questions
//!
//! This example shows how to:
//! 1. Write a few markdown documents into a temporary folder
//! 2. Index them incrementally with a `DocRetriever`
//! 3. Ask questions and print the assembled answers
//! 4. Edit a document and see only that document re-indexed
//!
//! The hashing embedding provider is used so nothing is downloaded. Pass
//! `fastembed` as the first argument to use a real model instead.

use anyhow::Result;
use docent_embed::EmbedConfig;
use docent_retriever::{DocRetriever, RetrieverConfig};
use std::path::Path;
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<()> {
    docent_retriever::logging::init("info");

    let docs = tempdir()?;
    let index = tempdir()?;
    write_docs(docs.path())?;

    let embedding = match std::env::args().nth(1).as_deref() {
        Some("fastembed") => EmbedConfig::default(),
        _ => EmbedConfig::hashing(384),
    };
    let config = RetrieverConfig::new(docs.path())
        .with_index_dir(index.path())
        .with_embedding(embedding);
    let retriever = DocRetriever::new(config);

    let report = retriever.sync().await?;
    println!(
        "Indexed {} documents into {} chunks\n",
        report.files_indexed, report.chunks_written
    );

    for question in [
        "How do I install Rust?",
        "Where are the logs written?",
        "What is the refund policy?",
    ] {
        println!("Q: {question}");
        println!("{}\n", retriever.retrieve(question).await);
    }

    std::fs::write(
        docs.path().join("logging.md"),
        "# Logging\n\nLogs are written to stderr. Set RUST_LOG=debug for per-file detail.",
    )?;
    let report = retriever.sync().await?;
    println!(
        "After editing logging.md: {} re-indexed, {} unchanged",
        report.files_indexed, report.files_unchanged
    );

    let stats = retriever.stats().await?;
    println!("Index holds {} chunks from {} files", stats.chunks_count, stats.files_count);

    retriever.close().await;
    Ok(())
}

fn write_docs(dir: &Path) -> Result<()> {
    std::fs::write(
        dir.join("install.md"),
        "# Installation\n\n\
         Install Node.js first; the web assets are built with npm.\n\n\
         Then install Rust with rustup and run `cargo build --release`.",
    )?;
    std::fs::write(
        dir.join("logging.md"),
        "# Logging\n\nLogs are written to stderr so that stdout stays free for tool output.",
    )?;
    std::fs::create_dir_all(dir.join("guides"))?;
    std::fs::write(
        dir.join("guides").join("search.md"),
        "# Searching\n\n\
         Questions are embedded and compared with every indexed chunk.\n\n\
         When the embedding model is unavailable a keyword scan answers instead.",
    )?;
    Ok(())
}
