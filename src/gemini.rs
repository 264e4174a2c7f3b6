use crate::logging::{log_debug, log_error, log_info, log_trace};
use crate::provider::{AiProvider, AiResponse, TokenUsage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};

#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(model: String, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("No API key provided"));
        }

        log_info(&format!(
            "Initializing Gemini API client with model: {}",
            model
        ));

        Ok(Self { api_key, model })
    }

    fn build_client(&self) -> Client {
        let api_key = self.api_key.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(move |_model_iden| {
            Ok(Some(AuthData::from_single(api_key.clone())))
        });

        Client::builder().with_auth_resolver(auth_resolver).build()
    }

    /// Build the single-turn request: system prompt, user prompt, tool declarations
    pub fn build_request(
        prompt: &str,
        system_prompt: &str,
        tools: Vec<genai::chat::Tool>,
    ) -> ChatRequest {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_system(system_prompt);
        if tools.is_empty() {
            request
        } else {
            request.with_tools(tools)
        }
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn generate_content_with_request(
        &self,
        chat_request: ChatRequest,
    ) -> Result<AiResponse> {
        log_info(&format!("Sending chat request to model: {}", self.model));
        log_trace(&format!("Request Debug: {:?}", chat_request));

        let client = self.build_client();
        let chat_response = match client.exec_chat(&self.model, chat_request, None).await {
            Ok(response) => response,
            Err(e) => {
                log_debug(&format!("Raw genai error debug: {:?}", e));
                let error_debug = format!("{:?}", e).to_lowercase();
                if error_debug.contains("401")
                    || error_debug.contains("403")
                    || error_debug.contains("api key not valid")
                {
                    log_error("Gemini API rejected the API key");
                    return Err(e).context(
                        "Authentication failed. Please check GEMINI_API_KEY and billing settings",
                    );
                }
                return Err(e).context("Failed to send chat request to Gemini API");
            }
        };

        log_trace(&format!("Response Debug: {:?}", chat_response));

        let usage = TokenUsage {
            prompt_tokens: chat_response.usage.prompt_tokens.map(|t| t as u32),
            completion_tokens: chat_response.usage.completion_tokens.map(|t| t as u32),
            total_tokens: chat_response.usage.total_tokens.map(|t| t as u32),
        };

        let text = chat_response
            .first_text()
            .map(str::to_string)
            .filter(|text| !text.trim().is_empty());
        let tool_calls = chat_response.into_tool_calls();

        log_info(&format!(
            "Received response: {} text characters, {} tool call(s), usage {}",
            text.as_deref().map(str::len).unwrap_or(0),
            tool_calls.len(),
            usage.format_short()
        ));

        Ok(AiResponse {
            text,
            tool_calls,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "Gemini"
    }
}
