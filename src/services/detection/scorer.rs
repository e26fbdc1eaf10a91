// Scorer
// Temperature-scaled softmax over the classifier's two raw logits.

use crate::error::{DetectError, Result};
use crate::services::classifier::ClassLogits;

/// Calibrated probability pair for one window. Both values lie in [0, 1] and
/// sum to 1 up to floating-point tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub human: f64,
    pub ai: f64,
}

/// Convert raw logits into probabilities via softmax over `logit / temperature`.
///
/// Temperature 1 is the unscaled softmax; higher temperatures flatten the
/// distribution toward 0.5/0.5. The max logit is subtracted before
/// exponentiating so extreme logits cannot overflow.
pub fn score_logits(logits: ClassLogits, temperature: f64) -> Result<ClassProbabilities> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(DetectError::InvalidTemperature(temperature));
    }

    let human = logits.human as f64 / temperature;
    let ai = logits.ai as f64 / temperature;

    let max = human.max(ai);
    let exp_human = (human - max).exp();
    let exp_ai = (ai - max).exp();
    let sum = exp_human + exp_ai;

    Ok(ClassProbabilities {
        human: exp_human / sum,
        ai: exp_ai / sum,
    })
}
