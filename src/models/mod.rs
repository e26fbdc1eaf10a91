// Veritext Data Models
// Wire-level request/response types for the detection service

use serde::{Deserialize, Serialize};

// ============ Detection Request ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub text: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_window_size")]
    pub window_size: i32,
    #[serde(default = "default_overlap")]
    pub overlap: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizeRequest {
    pub text: String,
}

// ============ Document Stats ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub word_count: i32,
    pub character_count: i32,
    pub token_count: i32,
}

// ============ Detection Response ============

/// Per-window diagnostic record. Informational only: nothing here feeds back
/// into the aggregated probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// 1-based position of the window in document order.
    pub window: i32,
    pub text_preview: String,
    pub token_count: i32,
    pub human_probability: f64,
    pub ai_probability: f64,
}

/// Document-level verdict produced by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectReport {
    pub label: String,
    pub human_probability: f64,
    pub ai_probability: f64,
    /// max(human, ai) as a percentage, rounded to 2 decimals.
    pub confidence: f64,
    pub window_count: i32,
    pub windows: Vec<WindowInfo>,
    pub stats: DocumentStats,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    #[serde(flatten)]
    pub report: DetectReport,
    pub request_id: String,
    pub version: String,
}

// ============ Tokenize Response ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    pub token_count: i32,
    pub word_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeReport {
    pub tokens: Vec<String>,
    pub token_ids: Vec<u32>,
    pub full_tokens: Vec<String>,
    pub full_token_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub stats: TokenStats,
}

// ============ Health ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

// ============ Default Value Functions ============

fn default_temperature() -> f64 { 2.0 }
fn default_window_size() -> i32 { 512 }
fn default_overlap() -> i32 { 256 }
