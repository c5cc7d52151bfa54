//! Analyzer backed by the Anthropic messages API.
//!
//! Uses the blocking reqwest client: construct it outside any async runtime
//! and call it from blocking threads only.

use anyhow::{anyhow, bail, Result};
use evaluation_core::{
    analysis::{build_prompt, parse_analysis, Analyzer},
    config::AnalysisConfig,
    model::{AnalysisResult, Criterion, Employee},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct LlmAnalyzer {
    config: AnalysisConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

impl LlmAnalyzer {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} not set", config.api_key_env))?;
        if api_key.trim().is_empty() {
            bail!("{} is empty", config.api_key_env);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config: config.clone(),
            api_key,
            client,
        })
    }
}

impl Analyzer for LlmAnalyzer {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn analyze(&self, employee: &Employee, criteria: &[Criterion]) -> Result<AnalysisResult> {
        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: 0.4,
            messages: vec![Message {
                role: "user",
                content: build_prompt(employee, criteria),
            }],
        };

        log::debug!("Requesting analysis for employee {}", employee.id);
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("analysis API returned {status}: {body}");
        }

        let reply: AnthropicResponse = response.json()?;
        let text: String = reply.content.into_iter().map(|c| c.text).collect();
        parse_analysis(&text)
    }
}
