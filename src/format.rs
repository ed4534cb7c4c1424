//! Note formatting via an external text-completion service
//!
//! Extracted OCR text is optionally cleaned up by a
//! Perplexity-compatible chat-completions endpoint. The stage is
//! best-effort: any failure falls back to the raw extracted text and
//! the upload still succeeds. Without a configured API key the stage
//! is skipped entirely.

use reqwest::Client;

use crate::config::FormatterConfig;

/// Fixed system instruction for the cleanup service
///
/// The service must only restructure what is present in the input,
/// never invent clinical facts.
const SYSTEM_PROMPT: &str = "\
You are given raw OCR-extracted clinical notes.
Your task is to:
1. Correct spelling and grammar errors.
2. Preserve only the information present in the input text.
3. Structure the content into the following Markdown sections using proper Markdown syntax:
   ## Patient Information
   ## Doctor Information
   ## Clinical Notes
4. Use bullet points or numbered lists where appropriate.
5. Do NOT add or infer any details from external knowledge.
6. Output only the cleaned and formatted note in Markdown.

Raw OCR text:
";

#[derive(Debug, thiserror::Error)]
enum FormatError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("formatting service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed completion response")]
    Malformed,
}

/// Client for the external note-cleanup service
pub struct NoteFormatter {
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    client: Client,
}

impl NoteFormatter {
    pub fn new(config: &FormatterConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client: Client::new(),
        }
    }

    /// Format extracted note text, falling back to the input on any failure
    pub async fn format_note(&self, raw_text: &str) -> String {
        let Some(api_key) = &self.api_key else {
            tracing::debug!("No formatter API key configured, storing raw text");
            return raw_text.to_string();
        };

        match self.complete(api_key, raw_text).await {
            Ok(formatted) => formatted,
            Err(e) => {
                tracing::warn!("Note formatting failed: {}, falling back to raw text", e);
                raw_text.to_string()
            }
        }
    }

    async fn complete(&self, api_key: &str, raw_text: &str) -> Result<String, FormatError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": raw_text },
            ],
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FormatError::Status(response.status()));
        }

        let body: serde_json::Value = response.json().await.map_err(|_| FormatError::Malformed)?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(FormatError::Malformed)
    }
}
