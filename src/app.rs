use std::sync::Arc;
use thiserror::Error;
use crate::config::{AppConfig, ConfigError, Credentials};
use crate::database::vector_db::{VectorStore, VectorStoreError};
use crate::llm::{Assistant, RagChain};
use crate::providers::openai::openai::{OpenAIChatModel, OpenAIEmbedder};
use crate::providers::serpapi::serpapi::SerpApiClient;
use crate::providers::traits::{ChatModel, Embedder, WebSearch};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

fn openai_embedder(config: &AppConfig, credentials: &Credentials) -> Result<Arc<dyn Embedder>, AppError> {
    let api_key = credentials.openai()?;
    Ok(Arc::new(OpenAIEmbedder::new(api_key, &config.embedding)))
}

/// Wire the index, chat model and web search into an [`Assistant`].
pub async fn build_assistant(
    config: &AppConfig,
    credentials: &Credentials,
    force_rebuild: bool,
) -> Result<Assistant, AppError> {
    let api_key = credentials.openai()?;
    let embedder = openai_embedder(config, credentials)?;
    let store = Arc::new(VectorStore::get_or_create(config, force_rebuild, embedder).await?);

    let model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(api_key, &config.llm));

    let web: Option<Arc<dyn WebSearch>> = match credentials.serpapi() {
        Ok(key) => Some(Arc::new(SerpApiClient::new(
            key.to_string(),
            config.web_search.engine.clone(),
        ))),
        Err(e) => {
            log::warn!("{}; web search fallback is disabled", e);
            None
        }
    };

    let chain = RagChain::new(store.as_retriever(config.retriever.k), Arc::clone(&model));
    Ok(Assistant::new(chain, model, web, config.web_search.max_results))
}

/// Rebuild the index from scratch; returns the number of stored chunks.
pub async fn rebuild_index(config: &AppConfig, credentials: &Credentials) -> Result<usize, AppError> {
    let embedder = openai_embedder(config, credentials)?;
    let store = VectorStore::get_or_create(config, true, embedder).await?;
    Ok(store.count().await?)
}

pub fn rebuild_banner(config: &AppConfig) -> String {
    let rule = "=".repeat(60);
    let mut banner = format!("\n{}\nREBUILDING VECTOR STORE\n{}\n", rule, rule);
    banner.push_str(&format!("\nIndex Directory: {}\n", config.chroma_directory));
    banner.push_str(&format!("Chunk Size: {}\n", config.chunking.chunk_size));
    banner.push_str(&format!("Chunk Overlap: {}\n", config.chunking.chunk_overlap));
    banner.push_str(&format!("\nPDFs to process ({}):\n", config.pdf_files.len()));
    for (i, pdf) in config.pdf_files.iter().enumerate() {
        banner.push_str(&format!("  {}. {}\n", i + 1, pdf));
    }
    banner.push_str(&format!("\n{}\nStarting rebuild...\n{}\n", rule, rule));
    banner
}

pub fn rebuild_summary(chunks: usize) -> String {
    let rule = "=".repeat(60);
    format!(
        "\n{}\nREBUILD COMPLETE!\n{}\n\nYour vector store has been rebuilt with {} chunks and saved.\n\
         You can now run health-assistant to use the updated knowledge base.\n",
        rule, rule, chunks
    )
}
