//! Client for the external AI text service.
//!
//! The service is slow, unreliable and optionally absent, so every call
//! returns a `Result` the caller can downgrade to a warning. Responses are
//! free-form model text; `extract_story_source` runs an ordered chain of
//! pure parsing strategies to dig the authoring Markdown out of whatever
//! the model wrapped it in. Compiled output is identical whether the source
//! came from here or from a human author.

use crate::config::AiConfig;
use crate::story::Level;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AiClient {
    base_url: String,
    model: String,
    http: reqwest::blocking::Client,
}

/// Outcome of one generation call.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub success: bool,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl AiClient {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("could not build HTTP client for AI service")?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            http,
        })
    }

    /// Ask the model for text. A transport or status failure is an error;
    /// a reply that never reached its final chunk is a non-success outcome.
    pub fn generate(&self, prompt: &str) -> Result<GenerateOutcome> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(url = %url, model = %self.model, "Requesting AI generation");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .context("AI service is unreachable")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "AI service returned status {} for {url}",
                response.status()
            ));
        }

        let body: GenerateResponse = response
            .json()
            .context("AI service returned an unparseable body")?;
        info!(chars = body.response.len(), done = body.done, "AI generation finished");
        Ok(GenerateOutcome {
            success: body.done && !body.response.trim().is_empty(),
            content: body.response,
        })
    }

    /// List models the service offers.
    pub fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .context("AI service is unreachable")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "AI service returned status {} for {url}",
                response.status()
            ));
        }
        let body: TagsResponse = response
            .json()
            .context("AI service returned an unparseable model list")?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }
}

/// Prompt asking for a story in the authoring Markdown dialect the compiler
/// understands.
pub fn story_prompt(topic: &str, level: Level) -> String {
    format!(
        "Write a short English story for verb-tense practice about: {topic}.\n\
         Difficulty level: {level}.\n\
         Output only Markdown in exactly this format:\n\
         ---\n\
         title: \"...\"\n\
         description: \"...\"\n\
         level: \"{level}\"\n\
         ---\n\n\
         ## Section name\n\
         Prose where each practiced verb is written as an array of 4 to 6\n\
         double-quoted tense forms, the correct one first, e.g.\n\
         [\"walked\", \"walks\", \"will walk\", \"has walked\"].\n\
         End every section with a line like {{checkSection(1), \"Check this section\"}}\n\
         numbering sections from 1. Use 2 or 3 sections."
    )
}

/// Ordered chain of pure extraction strategies for free-form model output.
/// The first strategy that yields text wins; the raw reply is the final
/// fallback.
pub fn extract_story_source(raw: &str) -> String {
    const STRATEGIES: &[(&str, fn(&str) -> Option<String>)] = &[
        ("fenced-block", extract_fenced_block),
        ("front-matter-slice", extract_front_matter_slice),
    ];

    for (name, strategy) in STRATEGIES {
        if let Some(found) = strategy(raw) {
            debug!(strategy = name, "Extracted story source from AI reply");
            return found;
        }
    }
    raw.trim().to_string()
}

/// Take the contents of the first ``` fence, dropping a language tag on the
/// opening line.
fn extract_fenced_block(raw: &str) -> Option<String> {
    let open = raw.find("```")?;
    let after_open = &raw[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    let block = body[..close].trim();
    (!block.is_empty()).then(|| block.to_string())
}

/// Slice from the first front-matter fence onward, skipping any chatter the
/// model put before it.
fn extract_front_matter_slice(raw: &str) -> Option<String> {
    let mut offset = 0;
    let mut fence_start = None;
    for line in raw.split_inclusive('\n') {
        if line.trim_end() == "---" {
            fence_start = Some(offset);
            break;
        }
        offset += line.len();
    }
    let start = fence_start?;
    let sliced = raw[start..].trim();
    // A lone dash line with no second fence is not front matter.
    sliced
        .match_indices("---")
        .nth(1)
        .map(|_| sliced.to_string())
}
