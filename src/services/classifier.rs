// Classifier Adapter
// Two-class sequence classifier behind a trait; the production implementation
// runs an exported ONNX model through onnxruntime on CPU.

use crate::error::{DetectError, Result};
use crate::services::tokenizer::EncodedInput;
use ort::ep;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Raw, unnormalized scores for the two classes.
#[derive(Debug, Clone, Copy)]
pub struct ClassLogits {
    pub human: f32,
    pub ai: f32,
}

/// Classifier contract consumed by the detection core.
///
/// Implementations own thread safety of the underlying inference call; the
/// core only assumes `Send + Sync`.
pub trait SequenceClassifier: Send + Sync {
    fn classify(&self, input: &EncodedInput) -> Result<ClassLogits>;

    fn name(&self) -> &str;
}

// ============ Model Location ============

/// Filesystem layout of the exported model directory:
/// `model.onnx` plus `tokenizer.json`.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_input_length: usize,
}

impl ModelConfig {
    /// Resolve the model directory from `VERITEXT_MODEL_DIR`, defaulting to
    /// `./model`.
    pub fn from_env() -> Self {
        let dir = match std::env::var("VERITEXT_MODEL_DIR") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
            _ => PathBuf::from("model"),
        };
        Self::from_dir(&dir)
    }

    pub fn from_dir(dir: &Path) -> Self {
        Self {
            model_path: dir.join("model.onnx"),
            tokenizer_path: dir.join("tokenizer.json"),
            max_input_length: 512,
        }
    }
}

// ============ ONNX Classifier ============

/// ONNX-backed sequence classifier. The session is created once at startup
/// and shared read-only for the process lifetime; `Session::run` needs
/// exclusive access, so calls are serialized behind a mutex.
pub struct OnnxSequenceClassifier {
    session: Mutex<Session>,
    model_name: String,
}

impl OnnxSequenceClassifier {
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(DetectError::Classifier(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .clamp(1, 8);

        let session = SessionBuilder::new()
            .map_err(|e| DetectError::Classifier(e.to_string()))?
            .with_intra_threads(intra_threads)
            .map_err(|e| DetectError::Classifier(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::All)
            .map_err(|e| DetectError::Classifier(e.to_string()))?
            .with_execution_providers([ep::CPU::default().build()])
            .map_err(|e| DetectError::Classifier(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| DetectError::Classifier(e.to_string()))?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());

        info!(
            model = %model_path.display(),
            intra_threads,
            "classifier.session_created"
        );

        Ok(Self { session: Mutex::new(session), model_name })
    }

    fn run_session(&self, ids: &[i64], mask: &[i64]) -> Result<Vec<f32>> {
        let seq = ids.len() as i64;
        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::Classifier("classifier session lock poisoned".into()))?;

        let input_ids = TensorRef::from_array_view(([1_i64, seq], ids))
            .map_err(|e| DetectError::Classifier(e.to_string()))?;
        let attention_mask = TensorRef::from_array_view(([1_i64, seq], mask))
            .map_err(|e| DetectError::Classifier(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids"      => input_ids,
                "attention_mask" => attention_mask,
            ])
            .map_err(|e| DetectError::Classifier(e.to_string()))?;

        let (_, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectError::Classifier(e.to_string()))?;

        Ok(logits.to_vec())
    }
}

impl SequenceClassifier for OnnxSequenceClassifier {
    fn classify(&self, input: &EncodedInput) -> Result<ClassLogits> {
        if input.ids.is_empty() {
            return Err(DetectError::Classifier("empty input sequence".into()));
        }

        let ids: Vec<i64> = input.ids.iter().map(|&v| v as i64).collect();
        let mask: Vec<i64> = input.attention_mask.iter().map(|&v| v as i64).collect();

        let logits = self.run_session(&ids, &mask)?;
        if logits.len() != 2 {
            return Err(DetectError::Classifier(format!(
                "expected 2 logits, model returned {}",
                logits.len()
            )));
        }

        // Class order follows the export convention: index 0 = human, 1 = ai.
        Ok(ClassLogits { human: logits[0], ai: logits[1] })
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
