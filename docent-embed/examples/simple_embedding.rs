//! Generate a few embeddings and compare them.
//!
//! Uses the hashing provider by default; pass `fastembed` as the first argument
//! to download and run a real model.

use docent_embed::{EmbedConfig, EmbeddingProvider, LazyProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1).as_deref() {
        Some("fastembed") => EmbedConfig::default(),
        _ => EmbedConfig::hashing(384),
    };
    println!("Provider: {} ({})", config.provider, config.model_name);

    let provider = LazyProvider::from_config(config);

    let texts = vec![
        "Install Node.js. Then install Rust.".to_string(),
        "How to install Rust".to_string(),
        "The quarterly report is due on Friday.".to_string(),
    ];
    let result = provider.embed_texts(&texts).await?;
    println!(
        "Generated {} embeddings of dimension {}",
        result.len(),
        result.dimension
    );

    let first = &result.embeddings[0];
    for (text, embedding) in texts.iter().zip(&result.embeddings).skip(1) {
        let score: f32 = first
            .iter()
            .zip(embedding)
            .map(|(a, b)| a.to_f32() * b.to_f32())
            .sum();
        println!("  {score:.3}  {text}");
    }

    Ok(())
}
