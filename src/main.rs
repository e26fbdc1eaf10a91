// Veritext service entrypoint: load the model once, then serve the detection
// API until shutdown.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use veritext::services::{
    DetectionEngine, HfTokenizer, ModelConfig, OnnxSequenceClassifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    veritext::mark_process_start();
    veritext::init_logging();

    let model_config = ModelConfig::from_env();
    info!(
        model = %model_config.model_path.display(),
        tokenizer = %model_config.tokenizer_path.display(),
        "model.loading"
    );

    let tokenizer = Arc::new(
        HfTokenizer::from_file(&model_config.tokenizer_path, model_config.max_input_length)
            .context("failed to load tokenizer")?,
    );
    let classifier = Arc::new(
        OnnxSequenceClassifier::load(&model_config.model_path)
            .context("failed to load classifier model")?,
    );
    let engine = Arc::new(DetectionEngine::new(tokenizer, classifier));
    info!(startup_ms = veritext::startup_elapsed_ms(), "model.loaded");

    let app = veritext::api::router(engine);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("invalid HOST/PORT")?;

    info!(
        %addr,
        startup_ms = veritext::startup_elapsed_ms(),
        "server.listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    info!("=== Veritext Exited ===");
    Ok(())
}
