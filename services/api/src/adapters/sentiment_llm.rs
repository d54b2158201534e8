//! services/api/src/adapters/sentiment_llm.rs
//!
//! This module contains the adapter for the sentiment classifier.
//! It implements the `SentimentClassifier` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use diary_core::{
    domain::Sentiment,
    ports::{PortError, PortResult, SentimentClassifier},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SentimentClassifier` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSentimentAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSentimentAdapter {
    /// Creates a new `OpenAiSentimentAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `SentimentClassifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl SentimentClassifier for OpenAiSentimentAdapter {
    /// Classifies the sentiment of a diary entry. The model is prompted for a
    /// single-word label; whatever it answers is parsed leniently, so an
    /// off-script completion still comes back as free text rather than an error.
    async fn classify(&self, content: &str) -> PortResult<Sentiment> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You are a helpful assistant that analyzes text sentiment.")
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "Analyze the sentiment of the following text. Respond with only one word: Positive, Negative, or Neutral. Text: {}",
                    content
                ))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(10u32)
            .temperature(0.2)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(Sentiment::from(content.as_str()))
            } else {
                Err(PortError::Unexpected(
                    "Sentiment LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Sentiment LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
