use anyhow::Result;
use crate::database::vector_db::Retriever;
use crate::llm::prompts::{format_context, rag_prompt};
use crate::providers::traits::ChatModel;
use std::sync::Arc;

/// Retrieve → prompt → model.
#[derive(Clone)]
pub struct RagChain {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
}

impl RagChain {
    pub fn new(retriever: Retriever, model: Arc<dyn ChatModel>) -> Self {
        Self { retriever, model }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn invoke(&self, question: &str) -> Result<String> {
        let docs = self.retriever.retrieve(question).await?;
        log::debug!("Retrieved {} chunks for question", docs.len());

        let prompt = rag_prompt(&format_context(&docs), question);
        let response = self.model.complete(&prompt).await?;
        Ok(response.trim().to_string())
    }
}
