use anyhow::Result;
use async_trait::async_trait;
use genai::chat::{ChatRequest, ToolCall};
use std::fmt::Debug;

/// Token counts reported by the model API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl TokenUsage {
    pub fn format_short(&self) -> String {
        match (
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
        ) {
            (Some(p), Some(c), Some(t)) => format!("{}+{}={}", p, c, t),
            (Some(p), Some(c), None) => format!("{}+{}", p, c),
            (None, None, Some(t)) => format!("{}", t),
            _ => "N/A".to_string(),
        }
    }
}

/// Response from AI provider: text and/or tool calls, plus usage
#[derive(Debug)]
pub struct AiResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

/// Generic AI provider trait so the agent turn does not depend on one API
#[async_trait]
pub trait AiProvider: Debug + Send + Sync {
    /// Send a ChatRequest (system prompt, user prompt, tool declarations)
    async fn generate_content_with_request(&self, chat_request: ChatRequest)
    -> Result<AiResponse>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Get provider-specific information (e.g., "Gemini")
    fn provider_name(&self) -> &str;
}

/// Configuration for creating AI providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: String,
}

/// Factory for creating AI providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider based on the model string
    /// Model format: "`provider::model`" or just "model" (defaults to Gemini)
    pub fn create_provider(config: ProviderConfig) -> Result<Box<dyn AiProvider>> {
        let (provider_name, model_name) = match config.model.split_once("::") {
            Some((provider, model)) => (provider, model),
            None => ("gemini", config.model.as_str()),
        };

        match provider_name.to_lowercase().as_str() {
            "gemini" => {
                let client =
                    crate::gemini::GeminiClient::new(model_name.to_string(), config.api_key)?;
                Ok(Box::new(client))
            }
            _ => Err(anyhow::anyhow!(
                "Unsupported provider: {provider_name}. Supported providers: gemini"
            )),
        }
    }
}
