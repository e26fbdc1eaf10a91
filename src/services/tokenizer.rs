// Tokenizer Adapter
// Wraps a HuggingFace fast tokenizer (tokenizer.json) behind a small trait so
// the detection engine can run against a mock in tests.

use crate::error::{DetectError, Result};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

/// Token strings plus ids for a text, without special tokens.
#[derive(Debug, Clone)]
pub struct TokenizedText {
    pub tokens: Vec<String>,
    pub ids: Vec<u32>,
}

/// Model-ready input: ids and attention mask with special tokens added,
/// truncated to the requested maximum length.
#[derive(Debug, Clone)]
pub struct EncodedInput {
    pub tokens: Vec<String>,
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Tokenizer contract consumed by the detection core.
///
/// `tokens` and `decode` operate on the raw sequence (no special tokens) and
/// are used for windowing; `encode` produces classifier input for one window.
pub trait DocumentTokenizer: Send + Sync {
    /// Full token listing for a text, without special tokens.
    fn tokens(&self, text: &str) -> Result<TokenizedText>;

    /// Full token-id sequence for a text, without special tokens.
    fn token_ids(&self, text: &str) -> Result<Vec<u32>> {
        Ok(self.tokens(text)?.ids)
    }

    /// Reconstruct display text from token ids. Detokenization artifacts
    /// (normalized whitespace, merged subwords) are expected.
    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Encode text for the classifier: special tokens added, attention mask
    /// included, truncated to `max_length` tokens.
    fn encode(&self, text: &str, max_length: usize) -> Result<EncodedInput>;

    /// Maximum sequence length the underlying model accepts.
    fn max_input_length(&self) -> usize;
}

/// Production tokenizer backed by `tokenizers::Tokenizer`.
pub struct HfTokenizer {
    inner: Tokenizer,
    max_input_length: usize,
}

impl HfTokenizer {
    pub fn from_file(path: &Path, max_input_length: usize) -> Result<Self> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| DetectError::Tokenizer(format!("failed to load {}: {}", path.display(), e)))?;
        info!(
            path = %path.display(),
            vocab_size = inner.get_vocab_size(true),
            max_input_length,
            "tokenizer.loaded"
        );
        Ok(Self { inner, max_input_length })
    }
}

impl DocumentTokenizer for HfTokenizer {
    fn tokens(&self, text: &str) -> Result<TokenizedText> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| DetectError::Tokenizer(e.to_string()))?;
        Ok(TokenizedText {
            tokens: encoding.get_tokens().to_vec(),
            ids: encoding.get_ids().to_vec(),
        })
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| DetectError::Tokenizer(e.to_string()))
    }

    fn encode(&self, text: &str, max_length: usize) -> Result<EncodedInput> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| DetectError::Tokenizer(e.to_string()))?;

        let mut tokens = encoding.get_tokens().to_vec();
        let mut ids = encoding.get_ids().to_vec();
        let mut attention_mask = encoding.get_attention_mask().to_vec();

        // The shared tokenizer carries no truncation config (the full-document
        // pass must stay unbounded), so window encodings are clipped here.
        if ids.len() > max_length {
            tokens.truncate(max_length);
            ids.truncate(max_length);
            attention_mask.truncate(max_length);
        }

        Ok(EncodedInput { tokens, ids, attention_mask })
    }

    fn max_input_length(&self) -> usize {
        self.max_input_length
    }
}
