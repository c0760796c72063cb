use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("PDF not found: {0}")]
    NotFound(String),
    #[error("Failed to extract text from {path}: {message}")]
    Extraction { path: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

/// A page (or a chunk of a page) of text together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                page,
                chunk_index: None,
            },
        }
    }
}

/// Load every page of a single PDF as its own document.
///
/// Extraction runs on the blocking pool; `pdf-extract` can panic on
/// malformed files, which surfaces here as an `Extraction` error.
pub async fn load_pdf(path: &str) -> Result<Vec<Document>, DocumentError> {
    if !Path::new(path).exists() {
        return Err(DocumentError::NotFound(path.to_string()));
    }

    let owned = path.to_string();
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
        .await
        .map_err(|e| DocumentError::Extraction {
            path: path.to_string(),
            message: format!("extractor crashed: {}", e),
        })?
        .map_err(|e| DocumentError::Extraction {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    Ok(pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(page, text)| Document::new(text, path, page))
        .collect())
}

/// Load all configured PDFs, skipping (and logging) the ones that are
/// missing or unreadable.
pub async fn load_pdfs(paths: &[String]) -> Vec<Document> {
    let mut all_docs = Vec::new();

    for path in paths {
        match load_pdf(path).await {
            Ok(docs) => {
                log::info!("Loaded {} pages from {}", docs.len(), path);
                all_docs.extend(docs);
            }
            Err(DocumentError::NotFound(p)) => {
                log::warn!("PDF not found: {}", p);
            }
            Err(e) => {
                log::error!("Error loading {}: {}", path, e);
            }
        }
    }

    all_docs
}

/// Whole-file text extraction for ad-hoc reports that never enter the index.
pub async fn extract_pdf_text(path: &Path) -> Result<String, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| DocumentError::Extraction {
            path: display.clone(),
            message: format!("extractor crashed: {}", e),
        })?
        .map_err(|e| DocumentError::Extraction {
            path: display,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_pdf_is_not_found() {
        let err = load_pdf("no/such/file.pdf").await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
        assert_eq!(err.to_string(), "PDF not found: no/such/file.pdf");
    }

    #[tokio::test]
    async fn load_pdfs_skips_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.pdf");
        std::fs::write(&broken, b"this is not a pdf").unwrap();

        let paths = vec![
            "no/such/file.pdf".to_string(),
            broken.display().to_string(),
        ];
        let docs = load_pdfs(&paths).await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn extract_reports_garbage_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("lab.pdf");
        std::fs::write(&broken, b"%PDF-garbage").unwrap();

        assert!(extract_pdf_text(&broken).await.is_err());
    }

    #[test]
    fn document_new_fills_metadata() {
        let doc = Document::new("text", "data/a.pdf", 2);
        assert_eq!(doc.metadata.source, "data/a.pdf");
        assert_eq!(doc.metadata.page, 2);
        assert_eq!(doc.metadata.chunk_index, None);
    }
}
