// Aggregation Logic
// Combines per-window probability pairs into one document-level verdict,
// weighted by window size, with renormalization and diagnostic metadata.

use crate::error::{DetectError, Result};
use crate::models::{DetectReport, DocumentStats, WindowInfo};
use crate::services::detection::scorer::ClassProbabilities;
use std::time::Duration;

pub const LABEL_AI: &str = "AI-generated";
pub const LABEL_HUMAN: &str = "Human-written";

const PREVIEW_MAX_CHARS: usize = 100;

/// One classified window: its reconstructed text, its size in tokens, and the
/// calibrated probability pair the scorer produced for it.
#[derive(Debug, Clone)]
pub struct ScoredWindow {
    pub text: String,
    pub token_count: usize,
    pub probabilities: ClassProbabilities,
}

/// Aggregate scored windows into the document-level report.
///
/// A single window passes through unchanged. Multiple windows are combined by
/// token-count weighting and the weighted pair is renormalized to sum to 1;
/// the renormalization is part of the contract even though the weights
/// already sum to 1, since it absorbs floating-point drift.
pub fn aggregate(
    scored: &[ScoredWindow],
    stats: DocumentStats,
    elapsed: Duration,
) -> Result<DetectReport> {
    if scored.is_empty() {
        return Err(DetectError::EmptyWindowPlan);
    }

    let (human, ai) = if scored.len() == 1 {
        let p = scored[0].probabilities;
        (p.human, p.ai)
    } else {
        let total_tokens: f64 = scored.iter().map(|w| w.token_count as f64).sum();
        let weights: Vec<f64> = scored
            .iter()
            .map(|w| w.token_count as f64 / total_tokens)
            .collect();

        let weighted_human: f64 = scored
            .iter()
            .zip(weights.iter())
            .map(|(w, wt)| w.probabilities.human * wt)
            .sum();
        let weighted_ai: f64 = scored
            .iter()
            .zip(weights.iter())
            .map(|(w, wt)| w.probabilities.ai * wt)
            .sum();

        let norm = weighted_human + weighted_ai;
        (weighted_human / norm, weighted_ai / norm)
    };

    // Strict comparison: an exact tie resolves to human.
    let label = if ai > human { LABEL_AI } else { LABEL_HUMAN };
    let confidence = (human.max(ai) * 100.0 * 100.0).round() / 100.0;

    let windows: Vec<WindowInfo> = scored
        .iter()
        .enumerate()
        .map(|(idx, w)| WindowInfo {
            window: idx as i32 + 1,
            text_preview: preview(&w.text, PREVIEW_MAX_CHARS),
            token_count: w.token_count as i32,
            human_probability: w.probabilities.human,
            ai_probability: w.probabilities.ai,
        })
        .collect();

    Ok(DetectReport {
        label: label.to_string(),
        human_probability: human,
        ai_probability: ai,
        confidence,
        window_count: scored.len() as i32,
        windows,
        stats,
        elapsed_ms: elapsed.as_millis() as u64,
    })
}

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn window(text: &str, token_count: usize, human: f64, ai: f64) -> ScoredWindow {
        ScoredWindow {
            text: text.to_string(),
            token_count,
            probabilities: ClassProbabilities { human, ai },
        }
    }

    fn stats() -> DocumentStats {
        DocumentStats { word_count: 10, character_count: 60, token_count: 12 }
    }

    #[test]
    fn test_single_window_passes_through() {
        let report =
            aggregate(&[window("short text", 8, 0.31, 0.69)], stats(), Duration::from_millis(5))
                .unwrap();
        assert_eq!(report.human_probability, 0.31);
        assert_eq!(report.ai_probability, 0.69);
        assert_eq!(report.label, LABEL_AI);
        assert_eq!(report.confidence, 69.0);
        assert_eq!(report.window_count, 1);
        assert_eq!(report.windows.len(), 1);
        assert_eq!(report.windows[0].window, 1);
    }

    #[test]
    fn test_size_weighted_average() {
        // weights 0.25 / 0.75:
        // human = 0.8*0.25 + 0.25*0.75 = 0.3875, ai = 0.2*0.25 + 0.75*0.75 = 0.6125
        let report = aggregate(
            &[window("a", 2, 0.8, 0.2), window("b", 6, 0.25, 0.75)],
            stats(),
            Duration::from_millis(5),
        )
        .unwrap();
        assert!((report.human_probability - 0.3875).abs() < TOLERANCE);
        assert!((report.ai_probability - 0.6125).abs() < TOLERANCE);
        assert_eq!(report.label, LABEL_AI);
        assert_eq!(report.confidence, 61.25);
    }

    #[test]
    fn test_probabilities_sum_to_one_after_renormalization() {
        let report = aggregate(
            &[
                window("a", 512, 0.3100001, 0.69),
                window("b", 512, 0.55, 0.4499998),
                window("c", 488, 0.2, 0.8000001),
            ],
            stats(),
            Duration::from_millis(5),
        )
        .unwrap();
        assert!((report.human_probability + report.ai_probability - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_exact_tie_resolves_to_human() {
        let report = aggregate(
            &[window("a", 4, 0.5, 0.5), window("b", 4, 0.5, 0.5)],
            stats(),
            Duration::from_millis(5),
        )
        .unwrap();
        assert_eq!(report.label, LABEL_HUMAN);
        assert_eq!(report.confidence, 50.0);
    }

    #[test]
    fn test_narrow_majority_labels_ai() {
        let report =
            aggregate(&[window("a", 4, 0.49, 0.51)], stats(), Duration::from_millis(5)).unwrap();
        assert_eq!(report.label, LABEL_AI);
        assert_eq!(report.confidence, 51.0);
    }

    #[test]
    fn test_aggregate_invariant_to_window_order() {
        let forward = [
            window("a", 512, 0.9, 0.1),
            window("b", 512, 0.4, 0.6),
            window("c", 100, 0.2, 0.8),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let r1 = aggregate(&forward, stats(), Duration::from_millis(5)).unwrap();
        let r2 = aggregate(&reversed, stats(), Duration::from_millis(5)).unwrap();
        assert!((r1.human_probability - r2.human_probability).abs() < TOLERANCE);
        assert!((r1.ai_probability - r2.ai_probability).abs() < TOLERANCE);
        assert_eq!(r1.label, r2.label);

        // Diagnostic numbering still reflects the order given.
        assert_eq!(r2.windows[0].token_count, 100);
        assert_eq!(r2.windows[0].window, 1);
    }

    #[test]
    fn test_preview_truncated_at_hundred_chars() {
        let long_text = "x".repeat(150);
        let report =
            aggregate(&[window(&long_text, 40, 0.5, 0.5)], stats(), Duration::from_millis(5))
                .unwrap();
        let preview = &report.windows[0].text_preview;
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_short_preview_untouched() {
        let report =
            aggregate(&[window("short", 2, 0.5, 0.5)], stats(), Duration::from_millis(5)).unwrap();
        assert_eq!(report.windows[0].text_preview, "short");
    }

    #[test]
    fn test_empty_input_is_invariant_violation() {
        let err = aggregate(&[], stats(), Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, DetectError::EmptyWindowPlan));
    }

    #[test]
    fn test_stats_and_elapsed_threaded_through() {
        let report = aggregate(
            &[window("a", 4, 0.6, 0.4)],
            DocumentStats { word_count: 7, character_count: 42, token_count: 9 },
            Duration::from_millis(123),
        )
        .unwrap();
        assert_eq!(report.stats.word_count, 7);
        assert_eq!(report.stats.character_count, 42);
        assert_eq!(report.stats.token_count, 9);
        assert_eq!(report.elapsed_ms, 123);
    }
}
