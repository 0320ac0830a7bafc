use super::*;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Instant;

/// OpenAI question provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given API key and model
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self { client, model }
    }
}

#[async_trait]
impl QuestionProvider for OpenAiProvider {
    async fn generate_batch(&self, request: &QuestionRequest) -> QuestionResult<Vec<Question>> {
        let start = Instant::now();

        let system_content = "You are a trivia question generator. You respond with strict JSON \
            only: no markdown, no commentary, no trailing text.";

        let user_message = ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(build_prompt(request)),
            name: None,
        };

        let mut req_builder = CreateChatCompletionRequestArgs::default();
        req_builder.model(&self.model).messages([
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_content)
                .build()
                .map_err(|e| QuestionError::Api(e.to_string()))?
                .into(),
            user_message.into(),
        ]);

        if let Some(max_tokens) = request.max_tokens {
            req_builder.max_tokens(max_tokens);
        }

        let chat_request = req_builder
            .build()
            .map_err(|e| QuestionError::Api(e.to_string()))?;

        // Execute with timeout
        let response =
            tokio::time::timeout(request.timeout, self.client.chat().create(chat_request))
                .await
                .map_err(|_| QuestionError::Timeout(request.timeout))?
                .map_err(|e| QuestionError::Api(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| QuestionError::Parse("No content in response".to_string()))?;

        let batch = parse_batch(&text, request)?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            tokens = ?response.usage.map(|u| u.total_tokens),
            "OpenAI batch generated"
        );

        Ok(batch)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
