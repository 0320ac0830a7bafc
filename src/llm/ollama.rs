use super::*;
use serde::Serialize;
use std::time::Instant;

/// Ollama question provider
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given base URL and model
    pub fn new(base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url,
            model,
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    #[allow(dead_code)] // Part of Ollama API response format
    done: bool,
}

#[async_trait]
impl QuestionProvider for OllamaProvider {
    async fn generate_batch(&self, request: &QuestionRequest) -> QuestionResult<Vec<Question>> {
        let start = Instant::now();

        let ollama_request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: build_prompt(request),
            stream: false,
            options: request.max_tokens.map(|num_predict| OllamaOptions {
                num_predict: Some(num_predict),
            }),
        };

        let url = format!("{}/api/generate", self.base_url);

        // Execute with timeout
        let response = tokio::time::timeout(
            request.timeout,
            self.client.post(&url).json(&ollama_request).send(),
        )
        .await
        .map_err(|_| QuestionError::Timeout(request.timeout))?
        .map_err(|e| QuestionError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuestionError::Api(format!(
                "Ollama API returned status: {}",
                response.status()
            )));
        }

        let ollama_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| QuestionError::Parse(e.to_string()))?;

        let batch = parse_batch(&ollama_response.response, request)?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Ollama batch generated"
        );

        Ok(batch)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameMode;

    #[tokio::test]
    #[ignore] // Only run with Ollama running locally
    async fn test_ollama_generate_batch() {
        let provider =
            OllamaProvider::new("http://localhost:11434".to_string(), "llama3.2".to_string());

        let request = QuestionRequest {
            mode: GameMode::Casual,
            category: "movies".to_string(),
            count: 3,
            timeout: Duration::from_secs(120),
            max_tokens: Some(2048),
        };

        let batch = provider.generate_batch(&request).await.unwrap();

        assert_eq!(batch.len(), 3);
        for question in &batch {
            assert_eq!(question.answers.len(), 4);
        }
    }
}
