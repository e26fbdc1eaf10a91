// Development utility: run sliding-window detection over a text file and dump
// the report, without going through the HTTP service.

use anyhow::{Context, Result};
use std::sync::Arc;
use veritext::services::detection::DetectionOptions;
use veritext::services::{
    DetectionEngine, HfTokenizer, ModelConfig, OnnxSequenceClassifier,
};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() -> Result<()> {
    veritext::init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin detect_file -- <path.txt> [--temperature <t>] [--window-size <n>] [--overlap <n>] [--out <json_path>]\n\nNotes:\n  - Model files are resolved via VERITEXT_MODEL_DIR (default ./model)."
        );
        return Ok(());
    }

    let path = args[1].clone();
    let mut options = DetectionOptions::default();
    if let Some(t) = parse_arg_value(&args, "--temperature").and_then(|s| s.parse().ok()) {
        options.temperature = t;
    }
    if let Some(n) = parse_arg_value(&args, "--window-size").and_then(|s| s.parse().ok()) {
        options.window_size = n;
    }
    if let Some(n) = parse_arg_value(&args, "--overlap").and_then(|s| s.parse().ok()) {
        options.overlap = n;
    }
    let out_path = parse_arg_value(&args, "--out");

    let text = std::fs::read_to_string(&path).with_context(|| format!("read {path} failed"))?;
    if text.trim().is_empty() {
        anyhow::bail!("{path} contains no text");
    }

    let model_config = ModelConfig::from_env();
    let tokenizer = Arc::new(HfTokenizer::from_file(
        &model_config.tokenizer_path,
        model_config.max_input_length,
    )?);
    let classifier = Arc::new(OnnxSequenceClassifier::load(&model_config.model_path)?);
    let engine = DetectionEngine::new(tokenizer, classifier);

    let report = engine.detect(&text, &options)?;

    println!("File: {}", path);
    println!(
        "Stats: {} words, {} chars, {} tokens",
        report.stats.word_count, report.stats.character_count, report.stats.token_count
    );
    println!(
        "Verdict: {} ({:.2}% confidence, {} windows, {} ms)",
        report.label, report.confidence, report.window_count, report.elapsed_ms
    );
    for w in &report.windows {
        println!(
            "[W{:03}] tokens={} human={:.4} ai={:.4}  {}",
            w.window,
            w.token_count,
            w.human_probability,
            w.ai_probability,
            w.text_preview.replace('\n', " ")
        );
    }

    if let Some(out_path) = out_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&out_path, json).with_context(|| format!("write {out_path} failed"))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
