mod explain;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pactum_ai::Classifier;
use pactum_client::ExplainClient;
use pactum_server::AppState;

#[derive(Parser)]
#[command(name = "pactum", version, about = "Contract classification service and tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the classification API server.
    Serve {
        /// Directory containing model.onnx, tokenizer.json and config.json.
        #[arg(long, env = "PACTUM_MODEL_DIR")]
        model_dir: PathBuf,
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
    /// Classify a plain-text document, either through a running server or by
    /// loading the model in-process.
    Classify {
        #[arg(long, env = "PACTUM_MODEL_DIR", required_unless_present = "url")]
        model_dir: Option<PathBuf>,
        /// Classify via `POST /classify` on a running server instead of
        /// loading the model locally.
        #[arg(long, conflicts_with = "model_dir")]
        url: Option<String>,
        file: PathBuf,
    },
    /// Rank a document's words by occlusion importance via a running server.
    Explain {
        #[arg(long, env = "PACTUM_URL", default_value = "http://127.0.0.1:8000")]
        url: String,
        file: PathBuf,
        /// How many top words to display.
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Fragments per batch-explain request.
        #[arg(long, default_value_t = pactum_client::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Check a running server's health endpoint.
    Health {
        #[arg(long, env = "PACTUM_URL", default_value = "http://127.0.0.1:8000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("pactum v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve { model_dir, addr } => {
            // Initialization barrier: the listener only binds once the model
            // is fully loaded.
            let classifier = Classifier::load(&model_dir)
                .with_context(|| format!("loading model from {}", model_dir.display()))?;
            let state = Arc::new(AppState::new(classifier));
            pactum_server::serve(addr, state).await?;
        }
        Command::Classify {
            model_dir,
            url,
            file,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let (category, confidence) = if let Some(url) = url {
                let response = ExplainClient::new(url).classify(&text).await?;
                (response.predicted_category, response.confidence_score)
            } else {
                let model_dir = model_dir.context("either --model-dir or --url is required")?;
                let mut classifier = Classifier::load(&model_dir)
                    .with_context(|| format!("loading model from {}", model_dir.display()))?;
                classifier.classify(&text)?
            };
            println!("{category}  ({:.1}% confidence)", confidence * 100.0);
        }
        Command::Explain {
            url,
            file,
            top,
            chunk_size,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let client = ExplainClient::new(url).with_chunk_size(chunk_size);

            let explanation = explain::explain_document(&client, &text, top).await?;
            println!(
                "{}  ({:.1}% confidence)",
                explanation.predicted_category,
                explanation.base_probability * 100.0
            );
            println!();
            for w in &explanation.words {
                println!("  {:+.4}  {}", w.importance, w.word);
            }
        }
        Command::Health { url } => {
            let client = ExplainClient::new(url);
            let health = client.health().await?;
            println!("{} (model_loaded: {})", health.status, health.model_loaded);
        }
    }

    Ok(())
}
