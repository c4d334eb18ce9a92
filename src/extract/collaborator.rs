//! AI extraction collaborator
//!
//! Semantic field extraction is delegated to a language model behind the
//! `FieldExtractor` trait. The crawler treats every response as independent and
//! never caches one; tests substitute a stub implementation.

use crate::config::ExtractorConfig;
use crate::extract::html::truncate_chars;
use crate::extract::ExtractionSchema;
use crate::ExtractionError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Extracts schema fields from page text
///
/// Implementations return a partial map: fields that were not found are
/// simply missing. Values are coerced by the caller.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract_fields(
        &self,
        text: &str,
        schema: &ExtractionSchema,
    ) -> Result<BTreeMap<String, Value>, ExtractionError>;
}

const SYSTEM_PROMPT: &str = "You are a data extraction expert. Extract information from the \
provided text according to the given schema. Return ONLY a valid JSON object whose keys are \
the schema fields. If a field is not found, use null. Never invent values.";

/// OpenAI-compatible chat-completions client
pub struct OpenAiExtractor {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_input_chars: usize,
}

impl OpenAiExtractor {
    /// Builds the extractor, reading the API key from the configured variable
    pub fn from_config(config: &ExtractorConfig, client: Client) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; schema extraction will be unavailable",
                config.api_key_env
            );
        }

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Overrides the API key (used when the key does not come from the environment)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn request_body(&self, text: &str, schema: &ExtractionSchema) -> Value {
        let fields: Map<String, Value> = schema
            .iter()
            .map(|(name, kind)| (name.to_string(), Value::String(kind.to_string())))
            .collect();
        let user_prompt = format!(
            "Extract data from this webpage content according to the schema below.\n\n\
             SCHEMA:\n{}\n\nCONTENT:\n{}\n\nReturn ONLY the extracted JSON data, no explanations.",
            Value::Object(fields),
            truncate_chars(text, self.max_input_chars)
        );

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        })
    }
}

#[async_trait]
impl FieldExtractor for OpenAiExtractor {
    async fn extract_fields(
        &self,
        text: &str,
        schema: &ExtractionSchema,
    ) -> Result<BTreeMap<String, Value>, ExtractionError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            ExtractionError::CollaboratorUnavailable("API key not configured".to_string())
        })?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&self.request_body(text, schema))
            .send()
            .await
            .map_err(|e| ExtractionError::CollaboratorUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractionError::CollaboratorUnavailable(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ExtractionError::InvalidResponse("missing message content".to_string()))?;

        parse_fields(content, schema)
    }
}

/// Parses model output into a field map
///
/// Markdown code fences are stripped. Keys outside the schema and null values
/// are dropped.
pub fn parse_fields(
    content: &str,
    schema: &ExtractionSchema,
) -> Result<BTreeMap<String, Value>, ExtractionError> {
    let cleaned = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map
            .into_iter()
            .filter(|(key, value)| schema.kind_of(key).is_some() && !value.is_null())
            .collect()),
        Ok(_) => Err(ExtractionError::InvalidResponse(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(ExtractionError::InvalidResponse(e.to_string())),
    }
}
