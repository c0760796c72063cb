use async_trait::async_trait;
use anyhow::{Result, anyhow};
use crate::config::{EmbeddingConfig, LlmConfig};
use crate::providers::traits::{ChatModel, Embedder};
use async_openai::{
    types::{
        ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
        CreateEmbeddingRequestArgs,
        EmbeddingInput,
    },
    Client,
    config::OpenAIConfig,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

fn client_for(api_key: &str, api_base: &str) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new()
        .with_api_key(api_key.to_string())
        .with_api_base(api_base.to_string());
    Client::with_config(config)
}

#[derive(Clone)]
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(api_key: &str, llm: &LlmConfig) -> Self {
        Self::with_api_base(api_key, llm, DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_key: &str, llm: &LlmConfig, api_base: &str) -> Self {
        Self {
            client: client_for(api_key, api_base),
            model: llm.model.clone(),
            temperature: llm.temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(vec![message])
            .build()?;

        log::debug!("Sending {} prompt characters to {}", prompt.len(), self.model);
        let response = self.client.chat().create(request).await?;

        response.choices.first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("No response content"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Clone)]
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    batch_size: usize,
}

impl OpenAIEmbedder {
    pub fn new(api_key: &str, embedding: &EmbeddingConfig) -> Self {
        Self::with_api_base(api_key, embedding, DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_key: &str, embedding: &EmbeddingConfig, api_base: &str) -> Self {
        Self {
            client: client_for(api_key, api_base),
            model: embedding.model.clone(),
            batch_size: embedding.batch_size.max(1),
        }
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(batch.to_vec()))
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        if data.len() != batch.len() {
            return Err(anyhow!(
                "Expected {} embeddings from OpenAI, got {}",
                batch.len(),
                data.len()
            ));
        }
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch).await?);
            log::debug!("Embedded {}/{} chunks", embeddings.len(), texts.len());
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()]).await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No embedding returned from OpenAI"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn embedding_config(batch_size: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            model: "text-embedding-ada-002".to_string(),
            batch_size,
        }
    }

    fn embedding_body(items: &[(u32, f32)]) -> String {
        let data: Vec<_> = items
            .iter()
            .map(|(index, value)| json!({ "object": "embedding", "index": index, "embedding": [value, 0.5] }))
            .collect();
        json!({
            "object": "list",
            "model": "text-embedding-ada-002",
            "data": data,
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        })
        .to_string()
    }

    fn chat_body(content: Option<&str>) -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13 }
        })
        .to_string()
    }

    #[tokio::test]
    async fn embeds_in_batches_and_orders_by_index() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/embeddings")
            .match_body(Matcher::PartialJson(json!({ "input": ["a", "b"] })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(embedding_body(&[(1, 2.0), (0, 1.0)]))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/embeddings")
            .match_body(Matcher::PartialJson(json!({ "input": ["c"] })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(embedding_body(&[(0, 3.0)]))
            .create_async()
            .await;

        let embedder = OpenAIEmbedder::with_api_base("sk-test", &embedding_config(2), &server.url());
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = embedder.embed_documents(&texts).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(vectors, vec![vec![1.0, 0.5], vec![2.0, 0.5], vec![3.0, 0.5]]);
    }

    #[tokio::test]
    async fn short_embedding_response_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(embedding_body(&[(0, 1.0)]))
            .create_async()
            .await;

        let embedder = OpenAIEmbedder::with_api_base("sk-test", &embedding_config(10), &server.url());
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = embedder.embed_documents(&texts).await.unwrap_err();
        assert_eq!(err.to_string(), "Expected 2 embeddings from OpenAI, got 1");
    }

    #[tokio::test]
    async fn chat_returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "What is fever?" }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body(Some("A raised temperature.")))
            .create_async()
            .await;

        let llm = LlmConfig { model: "gpt-4o-mini".to_string(), temperature: 0.0 };
        let model = OpenAIChatModel::with_api_base("sk-test", &llm, &server.url());
        assert_eq!(model.complete("What is fever?").await.unwrap(), "A raised temperature.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_without_content_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body(None))
            .create_async()
            .await;

        let llm = LlmConfig { model: "gpt-4o-mini".to_string(), temperature: 0.0 };
        let model = OpenAIChatModel::with_api_base("sk-test", &llm, &server.url());
        let err = model.complete("Hello").await.unwrap_err();
        assert_eq!(err.to_string(), "No response content");
    }
}
