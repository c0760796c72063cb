use tokio_rusqlite::Connection;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use log::info;
use thiserror::Error;
use crate::document::{Document, DocumentMetadata};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("Database connection error: {0}")]
    Connection(String),
}

/// A chunk as it sits in the index file.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: String,
    pub document: Document,
    pub embedding: Vec<f32>,
}

pub(crate) fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub(crate) fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// SQLite file backing the persisted vector index.
pub struct IndexDatabase {
    conn: Connection,
}

impl IndexDatabase {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self { conn };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS index_meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS chunks (
                    id TEXT PRIMARY KEY,
                    source TEXT NOT NULL,
                    page INTEGER NOT NULL,
                    chunk_index INTEGER,
                    text TEXT NOT NULL,
                    embedding BLOB NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);"
            )?;
            Ok(())
        })
        .await?;

        Ok(())
    }

    /// Write the complete index in a single transaction.
    pub async fn write_index(
        &self,
        embedding_model: String,
        chunks: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize, DatabaseError> {
        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        let created_at = chrono::Utc::now().to_rfc3339();

        let written = self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM chunks", [])?;
                tx.execute("DELETE FROM index_meta", [])?;
                {
                    let mut meta = tx.prepare("INSERT INTO index_meta (key, value) VALUES (?1, ?2)")?;
                    meta.execute(params!["embedding_model", embedding_model])?;
                    meta.execute(params!["dimension", dimension.to_string()])?;
                    meta.execute(params!["created_at", created_at])?;

                    let mut insert = tx.prepare(
                        "INSERT INTO chunks (id, source, page, chunk_index, text, embedding)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    )?;
                    for (doc, embedding) in chunks.iter().zip(embeddings.iter()) {
                        insert.execute(params![
                            uuid::Uuid::new_v4().to_string(),
                            doc.metadata.source,
                            doc.metadata.page as i64,
                            doc.metadata.chunk_index.map(|i| i as i64),
                            doc.page_content,
                            encode_embedding(embedding),
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(chunks.len())
            })
            .await?;

        info!("Wrote {} chunks to index", written);
        Ok(written)
    }

    pub async fn get_meta(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let key = key.to_string();
        let value = self.conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM index_meta WHERE key = ?1",
                        [&key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await?;
        Ok(value)
    }

    /// Load stored chunks in insertion order, optionally restricted to one source.
    pub async fn load_chunks(&self, source: Option<String>) -> Result<Vec<StoredChunk>, DatabaseError> {
        let chunks = self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, source, page, chunk_index, text, embedding
                     FROM chunks
                     WHERE ?1 IS NULL OR source = ?1
                     ORDER BY rowid",
                )?;
                let rows = stmt.query_map([&source], |row| {
                    let page: i64 = row.get(2)?;
                    let chunk_index: Option<i64> = row.get(3)?;
                    let blob: Vec<u8> = row.get(5)?;
                    Ok(StoredChunk {
                        id: row.get(0)?,
                        document: Document {
                            page_content: row.get(4)?,
                            metadata: DocumentMetadata {
                                source: row.get(1)?,
                                page: page.max(0) as usize,
                                chunk_index: chunk_index.map(|i| i.max(0) as usize),
                            },
                        },
                        embedding: decode_embedding(&blob),
                    })
                })?;
                let chunks = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(chunks)
            })
            .await?;
        Ok(chunks)
    }

    pub async fn count(&self) -> Result<usize, DatabaseError> {
        let count = self.conn
            .call(|conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(n)
            })
            .await?;
        Ok(count.max(0) as usize)
    }

    /// Distinct sources with their chunk counts, in the order they were indexed.
    pub async fn sources(&self) -> Result<Vec<(String, usize)>, DatabaseError> {
        let sources = self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT source, COUNT(*) FROM chunks GROUP BY source ORDER BY MIN(rowid)",
                )?;
                let rows = stmt.query_map([], |row| {
                    let n: i64 = row.get(1)?;
                    Ok((row.get::<_, String>(0)?, n.max(0) as usize))
                })?;
                let sources = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(sources)
            })
            .await?;
        Ok(sources)
    }

    pub async fn close(self) -> Result<(), DatabaseError> {
        self.conn.close().await?;
        Ok(())
    }
}
