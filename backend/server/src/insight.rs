//! # Insights
//!
//! Stand-in for a text generation model. The model integration is switched
//! off, every prompt gets the same placeholder back.
use tracing::info;

pub const PLACEHOLDER_INSIGHT: &str =
    "This is a dummy AI insight. The AI model integration is currently disabled.";

pub fn generate_insight(prompt: &str) -> String {
    info!("Generating placeholder insight for prompt: '{prompt}'");

    PLACEHOLDER_INSIGHT.to_string()
}
