// Detection Engine
// Orchestrates one detection request: tokenize, plan windows, classify and
// score each window in document order, aggregate. Adapters are injected so
// the pipeline runs against mocks in tests.

use crate::error::{DetectError, Result};
use crate::models::{DocumentStats, DetectReport, TokenStats, TokenizeReport};
use crate::services::classifier::SequenceClassifier;
use crate::services::detection::aggregation::{aggregate, ScoredWindow};
use crate::services::detection::scorer::score_logits;
use crate::services::detection::window_planner::plan_windows;
use crate::services::tokenizer::DocumentTokenizer;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Request-scoped configuration for one detection run.
#[derive(Debug, Clone, Copy)]
pub struct DetectionOptions {
    pub window_size: usize,
    pub overlap: usize,
    pub temperature: f64,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self { window_size: 512, overlap: 256, temperature: 2.0 }
    }
}

pub struct DetectionEngine {
    tokenizer: Arc<dyn DocumentTokenizer>,
    classifier: Arc<dyn SequenceClassifier>,
}

impl DetectionEngine {
    pub fn new(
        tokenizer: Arc<dyn DocumentTokenizer>,
        classifier: Arc<dyn SequenceClassifier>,
    ) -> Self {
        Self { tokenizer, classifier }
    }

    /// Run the full sliding-window detection pipeline over one document.
    ///
    /// The whole configuration is validated before the first classifier call;
    /// any adapter failure aborts the request rather than aggregating a
    /// partial window set.
    pub fn detect(&self, text: &str, options: &DetectionOptions) -> Result<DetectReport> {
        self.validate_options(options)?;
        let started = Instant::now();

        let ids = self.tokenizer.token_ids(text)?;
        if ids.is_empty() {
            return Err(DetectError::Tokenizer(
                "tokenizer produced no tokens for the document".into(),
            ));
        }

        let stats = DocumentStats {
            word_count: text.split_whitespace().count() as i32,
            character_count: text.chars().count() as i32,
            token_count: ids.len() as i32,
        };

        let plan = plan_windows(&ids, options.window_size, options.overlap)?;
        if plan.is_empty() {
            return Err(DetectError::EmptyWindowPlan);
        }
        debug!(
            token_count = ids.len(),
            windows = plan.len(),
            window_size = options.window_size,
            overlap = options.overlap,
            "detect.windows_planned"
        );

        let mut scored = Vec::with_capacity(plan.len());
        for window in &plan {
            let window_text = self.tokenizer.decode(&window.ids)?;
            let encoded = self.tokenizer.encode(&window_text, options.window_size)?;
            let logits = self.classifier.classify(&encoded)?;
            let probabilities = score_logits(logits, options.temperature)?;
            scored.push(ScoredWindow {
                text: window_text,
                token_count: window.token_count(),
                probabilities,
            });
        }

        let report = aggregate(&scored, stats, started.elapsed())?;
        info!(
            label = %report.label,
            confidence = report.confidence,
            windows = report.window_count,
            tokens = stats.token_count,
            elapsed_ms = report.elapsed_ms,
            "detect.completed"
        );
        Ok(report)
    }

    /// Tokenizer passthrough for the diagnostic tokenize operation: no
    /// windowing, no aggregation.
    pub fn tokenize(&self, text: &str) -> Result<TokenizeReport> {
        let raw = self.tokenizer.tokens(text)?;
        let encoded = self
            .tokenizer
            .encode(text, self.tokenizer.max_input_length())?;

        let stats = TokenStats {
            token_count: raw.ids.len() as i32,
            word_count: text.split_whitespace().count() as i32,
        };

        Ok(TokenizeReport {
            tokens: raw.tokens,
            token_ids: raw.ids,
            full_tokens: encoded.tokens,
            full_token_ids: encoded.ids,
            attention_mask: encoded.attention_mask,
            stats,
        })
    }

    fn validate_options(&self, options: &DetectionOptions) -> Result<()> {
        if options.window_size == 0 {
            return Err(DetectError::InvalidWindowSize);
        }
        if options.overlap >= options.window_size {
            return Err(DetectError::InvalidWindowConfig {
                window_size: options.window_size,
                overlap: options.overlap,
            });
        }
        let limit = self.tokenizer.max_input_length();
        if options.window_size > limit {
            return Err(DetectError::WindowTooLarge {
                requested: options.window_size,
                limit,
            });
        }
        if !options.temperature.is_finite() || options.temperature <= 0.0 {
            return Err(DetectError::InvalidTemperature(options.temperature));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classifier::ClassLogits;
    use crate::services::tokenizer::{EncodedInput, TokenizedText};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Whitespace tokenizer over a fixed vocabulary: ids index into `vocab`,
    /// so decode is the inverse of tokenize up to whitespace normalization.
    struct WordTokenizer {
        vocab: Vec<String>,
        max_input_length: usize,
    }

    impl WordTokenizer {
        fn for_text(text: &str) -> Self {
            let mut vocab: Vec<String> = Vec::new();
            for word in text.split_whitespace() {
                if !vocab.iter().any(|v| v == word) {
                    vocab.push(word.to_string());
                }
            }
            Self { vocab, max_input_length: 512 }
        }
    }

    impl DocumentTokenizer for WordTokenizer {
        fn tokens(&self, text: &str) -> crate::error::Result<TokenizedText> {
            let tokens: Vec<String> =
                text.split_whitespace().map(|w| w.to_string()).collect();
            let ids = tokens
                .iter()
                .map(|t| {
                    self.vocab
                        .iter()
                        .position(|v| v == t)
                        .map(|i| i as u32)
                        .ok_or_else(|| DetectError::Tokenizer(format!("unknown word {t}")))
                })
                .collect::<crate::error::Result<Vec<u32>>>()?;
            Ok(TokenizedText { tokens, ids })
        }

        fn decode(&self, ids: &[u32]) -> crate::error::Result<String> {
            let words: Vec<&str> = ids
                .iter()
                .map(|&id| self.vocab[id as usize].as_str())
                .collect();
            Ok(words.join(" "))
        }

        fn encode(&self, text: &str, max_length: usize) -> crate::error::Result<EncodedInput> {
            let raw = self.tokens(text)?;
            let mut tokens = raw.tokens;
            let mut ids = raw.ids;
            if ids.len() > max_length {
                tokens.truncate(max_length);
                ids.truncate(max_length);
            }
            let attention_mask = vec![1; ids.len()];
            Ok(EncodedInput { tokens, ids, attention_mask })
        }

        fn max_input_length(&self) -> usize {
            self.max_input_length
        }
    }

    /// Returns queued logits in order, falling back to the last entry, and
    /// counts calls so tests can assert validation ordering.
    struct StubClassifier {
        queue: Mutex<Vec<ClassLogits>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubClassifier {
        fn with_logits(logits: Vec<ClassLogits>) -> Self {
            Self { queue: Mutex::new(logits), calls: AtomicUsize::new(0), fail: false }
        }

        fn failing() -> Self {
            Self { queue: Mutex::new(Vec::new()), calls: AtomicUsize::new(0), fail: true }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SequenceClassifier for StubClassifier {
        fn classify(&self, _input: &EncodedInput) -> crate::error::Result<ClassLogits> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DetectError::Classifier("inference failed".into()));
            }
            let mut queue = self.queue.lock().unwrap();
            if queue.len() > 1 {
                Ok(queue.remove(0))
            } else {
                Ok(queue[0])
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn engine_for(text: &str, classifier: StubClassifier) -> (DetectionEngine, Arc<StubClassifier>) {
        let classifier = Arc::new(classifier);
        let engine = DetectionEngine::new(
            Arc::new(WordTokenizer::for_text(text)),
            classifier.clone(),
        );
        (engine, classifier)
    }

    #[test]
    fn test_single_window_document_passes_probabilities_through() {
        let text = "one two three four five";
        let (engine, classifier) = engine_for(
            text,
            StubClassifier::with_logits(vec![ClassLogits { human: 0.2, ai: 1.8 }]),
        );

        let report = engine.detect(text, &DetectionOptions::default()).unwrap();
        assert_eq!(classifier.call_count(), 1);
        assert_eq!(report.window_count, 1);
        assert_eq!(report.label, "AI-generated");
        // Single window: the aggregate equals the scored pair, unweighted.
        assert!((report.ai_probability - report.windows[0].ai_probability).abs() < 1e-12);
        assert_eq!(report.stats.word_count, 5);
        assert_eq!(report.stats.token_count, 5);
        assert_eq!(report.stats.character_count, text.chars().count() as i32);
    }

    #[test]
    fn test_long_document_is_windowed_and_ordered() {
        let words: Vec<String> = (0..20).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let (engine, classifier) = engine_for(
            &text,
            StubClassifier::with_logits(vec![
                ClassLogits { human: 2.0, ai: 0.0 },
                ClassLogits { human: 0.0, ai: 2.0 },
                ClassLogits { human: 0.0, ai: 2.0 },
                ClassLogits { human: 0.0, ai: 2.0 },
            ]),
        );

        let options = DetectionOptions { window_size: 8, overlap: 4, temperature: 1.0 };
        let report = engine.detect(&text, &options).unwrap();

        // 20 tokens, stride 4: starts 0,4,8,12 full or near-full; 16 has 4
        // tokens (< 8 / 2 treated strictly: 4*2 == 8, kept).
        assert_eq!(report.window_count, 5);
        assert_eq!(classifier.call_count(), 5);
        for (i, w) in report.windows.iter().enumerate() {
            assert_eq!(w.window as usize, i + 1);
        }
        // First window leans human, the rest lean ai.
        assert!(report.windows[0].human_probability > 0.5);
        assert!(report.windows[1].ai_probability > 0.5);
        assert_eq!(report.label, "AI-generated");
    }

    #[test]
    fn test_configuration_rejected_before_any_classifier_call() {
        let text = "alpha beta gamma";
        let (engine, classifier) = engine_for(
            text,
            StubClassifier::with_logits(vec![ClassLogits { human: 0.0, ai: 1.0 }]),
        );

        let bad_temperature = DetectionOptions { temperature: 0.0, ..DetectionOptions::default() };
        assert!(matches!(
            engine.detect(text, &bad_temperature).unwrap_err(),
            DetectError::InvalidTemperature(_)
        ));

        let bad_overlap = DetectionOptions { window_size: 8, overlap: 8, temperature: 2.0 };
        assert!(matches!(
            engine.detect(text, &bad_overlap).unwrap_err(),
            DetectError::InvalidWindowConfig { .. }
        ));

        let oversized = DetectionOptions { window_size: 4096, overlap: 256, temperature: 2.0 };
        assert!(matches!(
            engine.detect(text, &oversized).unwrap_err(),
            DetectError::WindowTooLarge { .. }
        ));

        assert_eq!(classifier.call_count(), 0);
    }

    #[test]
    fn test_classifier_failure_fails_whole_request() {
        let text = "alpha beta gamma delta";
        let (engine, _) = engine_for(text, StubClassifier::failing());
        let err = engine.detect(text, &DetectionOptions::default()).unwrap_err();
        assert!(matches!(err, DetectError::Classifier(_)));
    }

    #[test]
    fn test_tokenize_reports_raw_and_encoded_views() {
        let text = "alpha beta beta gamma";
        let (engine, _) = engine_for(
            text,
            StubClassifier::with_logits(vec![ClassLogits { human: 0.0, ai: 1.0 }]),
        );

        let report = engine.tokenize(text).unwrap();
        assert_eq!(report.tokens, vec!["alpha", "beta", "beta", "gamma"]);
        assert_eq!(report.token_ids, vec![0, 1, 1, 2]);
        assert_eq!(report.attention_mask.len(), report.full_token_ids.len());
        assert_eq!(report.stats.token_count, 4);
        assert_eq!(report.stats.word_count, 4);
    }
}
