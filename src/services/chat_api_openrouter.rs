use async_trait::async_trait;
use bon::Builder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::traits::chat_api::{ChatApi, GenerationOptions};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client (OpenRouter by default).
#[derive(Builder)]
pub struct OpenRouterChatApi {
    client: Client,
    #[builder(into)]
    base_url: String,
    #[builder(into)]
    api_key: String,
    #[builder(into)]
    model: String,
    #[builder(default = 200)]
    preview_chars: usize,
}

#[async_trait]
impl ChatApi for OpenRouterChatApi {
    async fn call_chat_api(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let prompt_preview: String = prompt.chars().take(self.preview_chars).collect();
        info!(
            model = %self.model,
            prompt_len = prompt.chars().count(),
            max_tokens = options.max_tokens,
            temperature = options.temperature,
            prompt_preview = %prompt_preview,
            "chat: request"
        );
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let code = res.status();
        let text = res.text().await.unwrap_or_default();
        if !code.is_success() {
            error!(status = %code, body = %text, "chat: error response");
            return Err(format!("chat completion error: {}", code).into());
        }
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or("chat completion returned no choices")?;
        let response_preview: String = content.chars().take(self.preview_chars).collect();
        info!(
            model = %self.model,
            response_len = content.chars().count(),
            response_preview = %response_preview,
            "chat: response"
        );
        Ok(content)
    }
}
