//! Prompt construction: statement text → [`ExtractionPrompt`].
//!
//! Everything the generation service sees is fixed by the config and the
//! text, so identical input always produces an identical request.

use crate::config::ExtractionConfig;
use crate::prompts::extraction_prompt;
use serde::Serialize;

/// Output constraint asking the service for a JSON document.
pub const JSON_FORMAT: &str = "json";

/// Sampling options sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub seed: u64,
}

/// Generation settings that accompany a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub format: &'static str,
    pub sampling: SamplingOptions,
}

/// An immutable prompt plus the settings it must be generated with.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionPrompt {
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Build the prompt for one document's text.
pub fn build_prompt(text: &str, config: &ExtractionConfig) -> ExtractionPrompt {
    ExtractionPrompt {
        prompt: extraction_prompt(text, config.max_prompt_chars),
        options: GenerationOptions {
            model: config.model.clone(),
            format: JSON_FORMAT,
            sampling: SamplingOptions {
                temperature: config.temperature,
                seed: config.seed,
            },
        },
    }
}
