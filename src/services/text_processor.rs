use std::sync::Arc;

use bon::Builder;
use tera::{Context, Tera};
use tracing::{error, info, warn};

use crate::publishers::utils::trim_with_ellipsis;
use crate::traits::chat_api::{ChatApi, GenerationOptions};

pub const SUMMARIZE_PROMPT: &str = r#"Please summarize this social media post to fit within {{ limit }} characters while preserving the key message and tone.

IMPORTANT: You must respond in the exact same language as the input text. If the input is in German, respond in German. If it's in English, respond in English. Do not translate or change the language.

Replace @-mentions with names. Only use very common abbreviations. Don't use any ascii formatting except for list items. Preserve emojis and formatting like lists done with emojis. Keep it engaging and authentic.

Only reply with the summarized text (no stats, no quotes around the summary):

{{ text }}

Summary (max {{ limit }} chars, same language as input):"#;

pub const MENTIONS_PROMPT: &str = r#"Please process this social media post by replacing @-mentions (usernames starting with @) with names derived from them, but do NOT summarize or shorten the text.

IMPORTANT: You must respond in the exact same language as the input text. If the input is in German, respond in German. If it's in English, respond in English. Do not translate or change the language.

Keep the original text length and content exactly the same, only replace @-mentions with readable names. Preserve all emojis, formatting, and structure.

Only reply with the processed text (no quotes around it):

{{ text }}

Processed text (same language as input):"#;

pub const SUMMARIZE_OPTIONS: GenerationOptions = GenerationOptions { max_tokens: 150, temperature: 0.7 };
pub const MENTIONS_OPTIONS: GenerationOptions = GenerationOptions { max_tokens: 200, temperature: 0.3 };

/// Which transform a caption goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRoute {
    MentionsOnly,
    Summarize,
}

/// Rewrites captions for the destination: @-mentions become names, long captions
/// are summarized. Never fails; every generation error falls back to local text.
#[derive(Builder)]
pub struct TextProcessor {
    chat_api: Option<Arc<dyn ChatApi>>,
    #[builder(default = 500)]
    max_chars: usize,
    summarize_template: Option<String>,
    mentions_template: Option<String>,
}

impl TextProcessor {
    /// Routing is by character count: up to `max_chars` inclusive only mentions are rewritten.
    pub fn route(&self, text: &str) -> TextRoute {
        if text.chars().count() <= self.max_chars {
            TextRoute::MentionsOnly
        } else {
            TextRoute::Summarize
        }
    }

    pub async fn normalize(&self, caption: &str) -> String {
        if caption.is_empty() {
            return String::new();
        }
        let len = caption.chars().count();
        match self.route(caption) {
            TextRoute::MentionsOnly => {
                info!(len, "text: processing @-mentions only");
                self.rewrite_mentions(caption).await
            }
            TextRoute::Summarize => {
                info!(len, limit = self.max_chars, "text: summarizing");
                self.summarize(caption).await
            }
        }
    }

    fn render(&self, custom: Option<&str>, default: &str, text: &str) -> Option<String> {
        let mut tera = Tera::default();
        let name = "caption_prompt";
        if let Err(e) = tera.add_raw_template(name, custom.unwrap_or(default)) {
            warn!("tera add_raw_template failed: {}", e);
            return None;
        }
        let mut ctx = Context::new();
        ctx.insert("text", text);
        ctx.insert("limit", &self.max_chars);
        match tera.render(name, &ctx) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("tera render failed: {}", e);
                None
            }
        }
    }

    async fn generate(&self, prompt: Option<String>, options: GenerationOptions) -> Option<String> {
        let api = self.chat_api.as_ref()?;
        let prompt = prompt?;
        match api.call_chat_api(&prompt, options).await {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    warn!("text: generation returned empty text");
                    None
                } else {
                    Some(text)
                }
            }
            Err(e) => {
                error!(error = %e, "text: generation failed");
                None
            }
        }
    }

    async fn rewrite_mentions(&self, text: &str) -> String {
        let prompt = self.render(self.mentions_template.as_deref(), MENTIONS_PROMPT, text);
        match self.generate(prompt, MENTIONS_OPTIONS).await {
            Some(processed) => {
                info!(from = text.chars().count(), to = processed.chars().count(), "text: mentions rewritten");
                processed
            }
            None => {
                info!("text: using original text as fallback");
                text.to_string()
            }
        }
    }

    async fn summarize(&self, text: &str) -> String {
        let prompt = self.render(self.summarize_template.as_deref(), SUMMARIZE_PROMPT, text);
        match self.generate(prompt, SUMMARIZE_OPTIONS).await {
            Some(summary) => {
                let summary = trim_with_ellipsis(&summary, self.max_chars);
                info!(from = text.chars().count(), to = summary.chars().count(), "text: summarized");
                summary
            }
            None => {
                let fallback = trim_with_ellipsis(text, self.max_chars);
                info!(len = fallback.chars().count(), "text: using fallback truncation");
                fallback
            }
        }
    }
}
