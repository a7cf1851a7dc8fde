// src/chat.rs

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ChatConfig;
use crate::error::{Error, Result};

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Provide concise insights about \
climate and environment information using the user's context.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pass-through to an OpenAI-compatible chat completion endpoint.
pub struct ChatClient {
    http: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("building chat HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Ask the model one question; returns the assistant's reply text.
    pub async fn ask(&self, query: &str) -> Result<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            Error::NotConfigured("GROQ_API_KEY is not configured in the environment".into())
        })?;

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = build_request(&self.config.model, query);

        info!(model = %self.config.model, chars = query.len(), "forwarding chat query");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::upstream(None, format!("chat provider unreachable: {}", e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| {
                Error::upstream(
                    Some(status.as_u16()),
                    format!("chat provider returned {} with unreadable body: {}", status, e),
                )
            })?;
        if !status.is_success() {
            warn!(%status, "chat provider returned an error");
            return Err(Error::upstream(
                Some(status.as_u16()),
                format!("chat provider returned {}: {}", status, text),
            ));
        }

        extract_reply(&text)
    }
}

fn build_request<'a>(model: &'a str, query: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: query,
            },
        ],
    }
}

fn extract_reply(body: &str) -> Result<String> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| Error::upstream(None, format!("failed to parse chat response: {}", e)))?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::upstream(None, "chat response contained no message"))
}
