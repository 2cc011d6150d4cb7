use async_trait::async_trait;

/// Sampling knobs for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Defines the interface for a chat-completion style text generation API
/// (e.g., OpenRouter, OpenAI).
///
/// This trait allows consumers to abstract over different backend implementations
/// (e.g., real HTTP clients, mocks for testing).
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends a single user prompt and returns the assistant's response.
    async fn call_chat_api(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}
