//! Generative question sources.
//!
//! Each provider turns a mode/category request into a validated batch of
//! four-option trivia questions. Providers prompt their model for strict JSON
//! and share the parsing/validation in this module.

mod ollama;
mod openai;

use crate::types::{Difficulty, GameMode, Question};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Result type for question-generation operations
pub type QuestionResult<T> = Result<T, QuestionError>;

/// Errors that can occur while generating a question batch
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("response parsing failed: {0}")]
    Parse(String),

    #[error("generated batch failed validation: {0}")]
    Invalid(String),
}

/// Request for a batch of questions
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub mode: GameMode,
    pub category: String,
    /// Number of questions the batch must contain
    pub count: usize,
    /// Timeout for the provider request
    pub timeout: Duration,
    /// Maximum response length in tokens (provider-dependent)
    pub max_tokens: Option<u32>,
}

/// Trait that all question providers must implement
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Generate a batch of questions for the given request
    async fn generate_batch(&self, request: &QuestionRequest) -> QuestionResult<Vec<Question>>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Ordered collection of providers; the first one that succeeds wins.
pub struct QuestionSource {
    providers: Vec<Box<dyn QuestionProvider>>,
}

impl QuestionSource {
    pub fn new(providers: Vec<Box<dyn QuestionProvider>>) -> Self {
        Self { providers }
    }

    /// Fetch one batch. Providers are tried in configuration order; a
    /// provider failure is logged and the next one is consulted. This is
    /// fallback across backends, not a retry policy; each provider gets a
    /// single attempt per call.
    pub async fn generate(&self, request: &QuestionRequest) -> QuestionResult<Vec<Question>> {
        let mut last_error = QuestionError::Config("no question providers configured".to_string());

        for provider in &self.providers {
            match provider.generate_batch(request).await {
                Ok(batch) => {
                    tracing::info!(
                        provider = provider.name(),
                        count = batch.len(),
                        category = %request.category,
                        "Question batch generated"
                    );
                    return Ok(batch);
                }
                Err(e) => {
                    tracing::error!(
                        provider = provider.name(),
                        "Question generation failed: {}",
                        e
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Configuration for question providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Ollama base URL
    pub ollama_base_url: Option<String>,
    /// Ollama model to use
    pub ollama_model: String,
    /// Default timeout for generation requests
    pub default_timeout: Duration,
    /// Default max tokens for responses
    pub default_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ollama_model: "llama3.2".to_string(),
            default_timeout: Duration::from_secs(60),
            default_max_tokens: 2048,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().and_then(|key| {
            let trimmed = key.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let openai_model = std::env::var("OPENAI_MODEL")
            .ok()
            .and_then(|model| {
                let trimmed = model.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        let ollama_base_url = match std::env::var("OLLAMA_BASE_URL") {
            Ok(url) => {
                let trimmed = url.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(_) => Some("http://localhost:11434".to_string()),
        };

        let ollama_model = std::env::var("OLLAMA_MODEL")
            .ok()
            .and_then(|model| {
                let trimmed = model.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "llama3.2".to_string());

        Self {
            openai_api_key,
            openai_model,
            ollama_base_url,
            ollama_model,
            default_timeout: std::env::var("LLM_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(60)),
            default_max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2048),
        }
    }

    /// Build a QuestionSource with all configured providers
    pub fn build_source(&self) -> QuestionResult<QuestionSource> {
        let mut providers: Vec<Box<dyn QuestionProvider>> = Vec::new();

        if let Some(api_key) = &self.openai_api_key {
            providers.push(Box::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            providers.push(Box::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )));
        }

        if providers.is_empty() {
            return Err(QuestionError::Config(
                "No question providers configured. Set OPENAI_API_KEY or OLLAMA_BASE_URL"
                    .to_string(),
            ));
        }

        Ok(QuestionSource::new(providers))
    }
}

/// Instruction prompt shared by all providers
pub(crate) fn build_prompt(request: &QuestionRequest) -> String {
    let ramp = match request.mode {
        GameMode::Ladder => {
            "Order the questions from easiest to hardest, ramping up like a prize-ladder quiz show."
        }
        GameMode::Casual => "Mix easy, medium and hard questions in any order.",
    };

    format!(
        "You write questions for the trivia quiz game \"Cash Me If You Can\". \
         Generate exactly {count} fresh multiple-choice trivia questions about \"{category}\". {ramp} \
         Respond with ONLY a JSON array, no prose and no markdown fences. Each element must be an \
         object of the form \
         {{\"question\": \"...\", \"answers\": [{{\"text\": \"...\", \"correct\": true}}, ...], \"difficulty\": \"easy\"|\"medium\"|\"hard\"}} \
         with exactly 4 answers of which exactly one has \"correct\": true.",
        count = request.count,
        category = request.category,
        ramp = ramp,
    )
}

#[derive(Debug, Deserialize)]
struct RawAnswer {
    text: String,
    #[serde(default)]
    correct: bool,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    answers: Vec<RawAnswer>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
}

/// Parse and validate a provider's raw completion into a question batch.
///
/// Models routinely wrap JSON in markdown fences or chat around it, so the
/// outermost array is extracted before parsing. Every question must have four
/// answers with exactly one marked correct.
pub(crate) fn parse_batch(raw: &str, request: &QuestionRequest) -> QuestionResult<Vec<Question>> {
    let start = raw
        .find('[')
        .ok_or_else(|| QuestionError::Parse("no JSON array in response".to_string()))?;
    let end = raw
        .rfind(']')
        .ok_or_else(|| QuestionError::Parse("unterminated JSON array in response".to_string()))?;
    if end < start {
        return Err(QuestionError::Parse("malformed JSON array".to_string()));
    }

    let parsed: Vec<RawQuestion> =
        serde_json::from_str(&raw[start..=end]).map_err(|e| QuestionError::Parse(e.to_string()))?;

    if parsed.len() < request.count {
        return Err(QuestionError::Invalid(format!(
            "requested {} questions, got {}",
            request.count,
            parsed.len()
        )));
    }

    let total = request.count;
    parsed
        .into_iter()
        .take(request.count)
        .enumerate()
        .map(|(index, q)| {
            if q.answers.len() != 4 {
                return Err(QuestionError::Invalid(format!(
                    "question {} has {} answers, expected 4",
                    index + 1,
                    q.answers.len()
                )));
            }
            let correct_count = q.answers.iter().filter(|a| a.correct).count();
            if correct_count != 1 {
                return Err(QuestionError::Invalid(format!(
                    "question {} has {} correct answers, expected exactly 1",
                    index + 1,
                    correct_count
                )));
            }

            Ok(Question {
                id: ulid::Ulid::new().to_string(),
                text: q.question,
                answers: q
                    .answers
                    .into_iter()
                    .map(|a| crate::types::AnswerOption {
                        text: a.text,
                        is_correct: a.correct,
                    })
                    .collect(),
                difficulty: q
                    .difficulty
                    .unwrap_or_else(|| Difficulty::for_tier(index, total)),
                category: request.category.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn request(count: usize) -> QuestionRequest {
        QuestionRequest {
            mode: GameMode::Ladder,
            category: "history".to_string(),
            count,
            timeout: Duration::from_secs(30),
            max_tokens: Some(1024),
        }
    }

    fn raw_question(correct_index: usize) -> String {
        let answers: Vec<String> = (0..4)
            .map(|i| {
                format!(
                    "{{\"text\": \"answer {}\", \"correct\": {}}}",
                    i,
                    i == correct_index
                )
            })
            .collect();
        format!(
            "{{\"question\": \"Who?\", \"answers\": [{}], \"difficulty\": \"easy\"}}",
            answers.join(", ")
        )
    }

    #[test]
    fn test_parse_batch_plain_json() {
        let raw = format!("[{}, {}]", raw_question(0), raw_question(2));
        let batch = parse_batch(&raw, &request(2)).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].answers.len(), 4);
        assert!(batch[0].answers[0].is_correct);
        assert!(batch[1].answers[2].is_correct);
        assert_eq!(batch[0].category, "history");
    }

    #[test]
    fn test_parse_batch_strips_markdown_fences() {
        let raw = format!("```json\n[{}]\n```", raw_question(1));
        let batch = parse_batch(&raw, &request(1)).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_parse_batch_rejects_short_batches() {
        let raw = format!("[{}]", raw_question(0));
        let result = parse_batch(&raw, &request(3));
        assert!(matches!(result, Err(QuestionError::Invalid(_))));
    }

    #[test]
    fn test_parse_batch_truncates_oversized_batches() {
        let raw = format!(
            "[{}, {}, {}]",
            raw_question(0),
            raw_question(1),
            raw_question(2)
        );
        let batch = parse_batch(&raw, &request(2)).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_parse_batch_rejects_zero_or_many_correct() {
        let no_correct = "[{\"question\": \"Q?\", \"answers\": [\
            {\"text\": \"a\"}, {\"text\": \"b\"}, {\"text\": \"c\"}, {\"text\": \"d\"}]}]";
        assert!(matches!(
            parse_batch(no_correct, &request(1)),
            Err(QuestionError::Invalid(_))
        ));

        let two_correct = "[{\"question\": \"Q?\", \"answers\": [\
            {\"text\": \"a\", \"correct\": true}, {\"text\": \"b\", \"correct\": true}, \
            {\"text\": \"c\"}, {\"text\": \"d\"}]}]";
        assert!(matches!(
            parse_batch(two_correct, &request(1)),
            Err(QuestionError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_batch_no_array() {
        let result = parse_batch("sorry, I can't help with that", &request(1));
        assert!(matches!(result, Err(QuestionError::Parse(_))));
    }

    #[test]
    fn test_missing_difficulty_falls_back_to_tier_ramp() {
        let q = "{\"question\": \"Q?\", \"answers\": [\
            {\"text\": \"a\", \"correct\": true}, {\"text\": \"b\"}, \
            {\"text\": \"c\"}, {\"text\": \"d\"}]}";
        let raw = format!("[{}]", q);
        let batch = parse_batch(&raw, &request(1)).unwrap();
        assert_eq!(batch[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.ollama_model, "llama3.2");
        assert_eq!(config.default_timeout, Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn test_config_from_env_trims_empty_values() {
        std::env::set_var("OPENAI_API_KEY", "   ");
        std::env::set_var("OLLAMA_BASE_URL", "http://ollama.local:11434");
        let config = LlmConfig::from_env();
        assert!(config.openai_api_key.is_none());
        assert_eq!(
            config.ollama_base_url.as_deref(),
            Some("http://ollama.local:11434")
        );
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("OLLAMA_BASE_URL");
    }

    #[test]
    fn test_build_prompt_mentions_category_and_count() {
        let prompt = build_prompt(&request(5));
        assert!(prompt.contains("history"));
        assert!(prompt.contains("exactly 5"));
    }
}
