use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use crate::database::vector_db::VectorStore;
use crate::document::extract_pdf_text;
use crate::llm::chat::RagChain;
use crate::llm::prompts::{is_unknown_answer, lab_report_prompt, summary_prompt};
use crate::providers::serpapi::serpapi::format_web_results;
use crate::providers::traits::{ChatModel, WebSearch};

const SUMMARY_QUERY: &str = "summary of document";
const SUMMARY_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSource {
    KnowledgeBase,
    WebSearch { urls: Vec<String> },
    Error,
}

impl AnswerSource {
    pub fn label(&self) -> &'static str {
        match self {
            AnswerSource::KnowledgeBase => "PDF Knowledge Base",
            AnswerSource::WebSearch { .. } => "Web Search",
            AnswerSource::Error => "Error",
        }
    }

    pub fn urls(&self) -> &[String] {
        match self {
            AnswerSource::WebSearch { urls } => urls,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// Question answering over the PDF index with a web-search fallback.
pub struct Assistant {
    chain: RagChain,
    model: Arc<dyn ChatModel>,
    web: Option<Arc<dyn WebSearch>>,
    max_web_results: usize,
}

impl Assistant {
    pub fn new(
        chain: RagChain,
        model: Arc<dyn ChatModel>,
        web: Option<Arc<dyn WebSearch>>,
        max_web_results: usize,
    ) -> Self {
        Self {
            chain,
            model,
            web,
            max_web_results,
        }
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        self.chain.retriever().store()
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let answer_text = self.chain.invoke(question).await?;

        if !is_unknown_answer(&answer_text) {
            return Ok(Answer {
                text: answer_text,
                source: AnswerSource::KnowledgeBase,
            });
        }

        log::info!("No answer found in PDFs, searching the web...");
        Ok(self.web_answer(question).await)
    }

    async fn web_answer(&self, question: &str) -> Answer {
        let searched = match &self.web {
            Some(web) => web.search(question, self.max_web_results).await,
            None => Err(anyhow!("SERPAPI_API_KEY environment variable not set")),
        };

        match searched {
            Ok(results) => {
                let urls = results
                    .iter()
                    .filter(|r| !r.url.is_empty())
                    .map(|r| r.url.clone())
                    .collect();
                Answer {
                    text: format_web_results(&results),
                    source: AnswerSource::WebSearch { urls },
                }
            }
            Err(e) => {
                log::warn!("Web search failed: {}", e);
                Answer {
                    text: format!("Search error: {}", e),
                    source: AnswerSource::WebSearch { urls: Vec::new() },
                }
            }
        }
    }

    pub async fn summarize_pdf(&self, pdf_path: &str) -> Result<String> {
        let results = self
            .store()
            .similarity_search(SUMMARY_QUERY, SUMMARY_K, Some(pdf_path))
            .await?;

        if results.is_empty() {
            let name = Path::new(pdf_path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| pdf_path.to_string());
            return Ok(format!("No content found for {}", name));
        }

        let combined = results
            .iter()
            .map(|r| r.document.page_content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        self.model.complete(&summary_prompt(&combined)).await
    }

    pub async fn analyze_lab_report(&self, pdf_path: &Path) -> Result<String> {
        let text = extract_pdf_text(pdf_path).await?;
        if text.trim().is_empty() {
            return Err(anyhow!("Could not extract text from PDF. The file may be image-based."));
        }
        self.model.complete(&lab_report_prompt(&text)).await
    }
}
