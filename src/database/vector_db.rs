use thiserror::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log;
use crate::config::AppConfig;
use crate::database::database::{DatabaseError, IndexDatabase};
use crate::document::{chunk_documents, load_pdfs, Document};
use crate::providers::traits::Embedder;

pub const INDEX_FILE: &str = "index.sqlite3";

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Vector index not found at {0}. Run `health-assistant rebuild` to create it.")]
    IndexNotFound(String),
    #[error("No documents loaded. Check your PDF paths in config.json")]
    NoDocuments,
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Query embedding has {actual} dimensions but the index stores {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: Document,
    pub score: f32,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub fn index_path(persist_directory: &Path) -> PathBuf {
    persist_directory.join(INDEX_FILE)
}

pub fn vectorstore_exists(persist_directory: &Path) -> bool {
    index_path(persist_directory).exists()
}

/// Directory-backed vector index over PDF chunks.
pub struct VectorStore {
    db: IndexDatabase,
    embedder: Arc<dyn Embedder>,
    directory: PathBuf,
}

impl VectorStore {
    /// Embed `chunks` and persist them under `persist_directory`.
    ///
    /// The index is written to a temporary file and renamed into place only
    /// after every chunk is stored, so a failed rebuild keeps the old index.
    pub async fn create(
        chunks: Vec<Document>,
        persist_directory: &Path,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, VectorStoreError> {
        if chunks.is_empty() {
            return Err(VectorStoreError::NoDocuments);
        }
        tokio::fs::create_dir_all(persist_directory).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.page_content.clone()).collect();
        log::info!("Embedding {} chunks with {}", texts.len(), embedder.model_name());
        let embeddings = embedder
            .embed_documents(&texts)
            .await
            .map_err(|e| VectorStoreError::Embedding(e.to_string()))?;
        if embeddings.len() != chunks.len() {
            return Err(VectorStoreError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let final_path = index_path(persist_directory);
        let tmp_path = persist_directory.join(format!("{}.tmp", INDEX_FILE));
        if tmp_path.exists() {
            tokio::fs::remove_file(&tmp_path).await?;
        }

        let count = chunks.len();
        let written = Self::write_file(&tmp_path, embedder.model_name().to_string(), chunks, embeddings).await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        tokio::fs::rename(&tmp_path, &final_path).await?;

        log::info!("Created vector store with {} chunks", count);
        log::info!("Saved to {}", persist_directory.display());

        Self::open(persist_directory, embedder).await
    }

    async fn write_file(
        path: &Path,
        model: String,
        chunks: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(), VectorStoreError> {
        let db = IndexDatabase::open(path).await?;
        db.write_index(model, chunks, embeddings).await?;
        db.close().await?;
        Ok(())
    }

    pub async fn open(persist_directory: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, VectorStoreError> {
        if !vectorstore_exists(persist_directory) {
            return Err(VectorStoreError::IndexNotFound(persist_directory.display().to_string()));
        }

        let db = IndexDatabase::open(index_path(persist_directory)).await?;
        if let Some(model) = db.get_meta("embedding_model").await? {
            if model != embedder.model_name() {
                log::warn!(
                    "Index was built with embedding model {} but {} is configured; rebuild the index",
                    model,
                    embedder.model_name()
                );
            }
        }

        log::info!("Loaded vector store from {}", persist_directory.display());
        Ok(Self {
            db,
            embedder,
            directory: persist_directory.to_path_buf(),
        })
    }

    /// Open the existing index, or build it from the configured PDFs.
    pub async fn get_or_create(
        config: &AppConfig,
        force_recreate: bool,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, VectorStoreError> {
        let directory = config.index_dir();
        if !force_recreate && vectorstore_exists(&directory) {
            log::info!("Loading existing vector store...");
            return Self::open(&directory, embedder).await;
        }

        log::info!("Creating new vector store...");
        let docs = load_pdfs(&config.pdf_files).await;
        if docs.is_empty() {
            return Err(VectorStoreError::NoDocuments);
        }

        let chunks = chunk_documents(&docs, config.chunking.chunk_size, config.chunking.chunk_overlap);
        Self::create(chunks, &directory, embedder).await
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Top-`k` chunks by cosine similarity to `query`, best first.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        source: Option<&str>,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder
            .embed_query(query)
            .await
            .map_err(|e| VectorStoreError::Embedding(e.to_string()))?;
        self.search_by_vector(&query_embedding, k, source).await
    }

    pub async fn search_by_vector(
        &self,
        query_embedding: &[f32],
        k: usize,
        source: Option<&str>,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let stored = self.db.load_chunks(source.map(str::to_string)).await?;

        let mut scored = Vec::with_capacity(stored.len());
        for chunk in stored {
            if chunk.embedding.len() != query_embedding.len() {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: chunk.embedding.len(),
                    actual: query_embedding.len(),
                });
            }
            let score = cosine_similarity(query_embedding, &chunk.embedding);
            scored.push(SearchResult {
                document: chunk.document,
                score,
            });
        }

        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    pub async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.db.count().await?)
    }

    pub async fn sources(&self) -> Result<Vec<(String, usize)>, VectorStoreError> {
        Ok(self.db.sources().await?)
    }

    pub fn as_retriever(self: &Arc<Self>, k: usize) -> Retriever {
        Retriever {
            store: Arc::clone(self),
            k,
        }
    }
}

/// Fixed-`k` similarity retrieval over a shared store.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<VectorStore>,
    k: usize,
}

impl Retriever {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<Document>, VectorStoreError> {
        let results = self.store.similarity_search(question, self.k, None).await?;
        Ok(results.into_iter().map(|r| r.document).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Deterministic bag-of-keywords embedder for tests.
    pub(crate) struct KeywordEmbedder {
        pub keywords: Vec<&'static str>,
        pub fail: AtomicBool,
    }

    impl KeywordEmbedder {
        pub(crate) fn new(keywords: Vec<&'static str>) -> Self {
            Self { keywords, fail: AtomicBool::new(false) }
        }

        fn vectorize(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            self.keywords
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("embedding service unavailable"));
            }
            Ok(texts.iter().map(|t| self.vectorize(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.vectorize(text))
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("COVID symptoms include fever and cough", "data/covid.pdf", 0),
            Document::new("Vaccines lower covid hospitalisation", "data/covid.pdf", 1),
            Document::new("Diabetes is managed with insulin", "data/diabetes.pdf", 0),
        ]
    }

    fn embedder() -> Arc<KeywordEmbedder> {
        Arc::new(KeywordEmbedder::new(vec!["covid", "fever", "vaccine", "diabetes", "insulin"]))
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn create_persists_and_search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("index");
        assert!(!vectorstore_exists(&index_dir));

        let store = VectorStore::create(corpus(), &index_dir, embedder()).await.unwrap();
        assert!(vectorstore_exists(&index_dir));
        assert!(!index_dir.join("index.sqlite3.tmp").exists());
        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.similarity_search("how is diabetes treated with insulin", 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.metadata.source, "data/diabetes.pdf");
        assert!(results[0].score >= results[1].score);

        assert!(store.similarity_search("anything", 0, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_can_filter_by_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::create(corpus(), dir.path(), embedder()).await.unwrap();

        let results = store
            .similarity_search("insulin", 10, Some("data/covid.pdf"))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.document.metadata.source == "data/covid.pdf"));

        assert_eq!(
            store.sources().await.unwrap(),
            vec![("data/covid.pdf".to_string(), 2), ("data/diabetes.pdf".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn reopen_reads_persisted_index() {
        let dir = tempfile::tempdir().unwrap();
        drop(VectorStore::create(corpus(), dir.path(), embedder()).await.unwrap());

        let store = VectorStore::open(dir.path(), embedder()).await.unwrap();
        let retriever = Arc::new(store).as_retriever(1);
        let docs = retriever.retrieve("fever").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "COVID symptoms include fever and cough");
    }

    #[tokio::test]
    async fn open_missing_index_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorStore::open(dir.path(), embedder()).await.err().unwrap();
        assert!(matches!(err, VectorStoreError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = embedder();
        drop(VectorStore::create(corpus(), dir.path(), embedder.clone()).await.unwrap());

        embedder.fail.store(true, Ordering::SeqCst);
        let replacement = vec![Document::new("new content", "data/new.pdf", 0)];
        assert!(VectorStore::create(replacement, dir.path(), embedder.clone()).await.is_err());

        embedder.fail.store(false, Ordering::SeqCst);
        let store = VectorStore::open(dir.path(), embedder).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn nan_scores_do_not_break_ranking() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::create(corpus(), dir.path(), embedder()).await.unwrap();

        let query = [f32::NAN, 1.0, 0.0, 0.0, 0.0];
        let results = store.search_by_vector(&query, 2, None).await.unwrap();
        assert_eq!(results.len(), 2);

        let all = store.search_by_vector(&[1.0, f32::NAN, 0.0, 0.0, 1.0], 10, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn create_with_no_chunks_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorStore::create(Vec::new(), dir.path(), embedder()).await.err().unwrap();
        assert_eq!(err.to_string(), "No documents loaded. Check your PDF paths in config.json");
    }

    #[tokio::test]
    async fn get_or_create_without_pdfs_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let raw = format!(
            r#"{{"pdf_files": ["missing.pdf"], "chroma_directory": "{}", "llm": {{"model": "gpt-4o-mini"}}}}"#,
            dir.path().join("idx").display()
        );
        let config = AppConfig::from_json(&raw).unwrap();

        let err = VectorStore::get_or_create(&config, false, embedder()).await.err().unwrap();
        assert!(matches!(err, VectorStoreError::NoDocuments));
        assert!(!vectorstore_exists(&config.index_dir()));
    }
}
