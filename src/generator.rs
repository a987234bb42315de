use async_trait::async_trait;
use tracing::debug;

use crate::api_connection::connection::ApiConnectionError;
use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider};

/// A black-box text completion service: one prompt in, free-form text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ApiConnectionError>;
}

#[async_trait]
impl TextGenerator for Provider {
    async fn generate(&self, prompt: &str) -> Result<String, ApiConnectionError> {
        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: Some(0.7),
            max_tokens: Some(2048),
        };

        let response = self.call_chat_completion(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                total_tokens = usage.total_tokens,
                "chat completion usage"
            );
        }

        match response.first_content() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(ApiConnectionError::EmptyResponse),
        }
    }
}
