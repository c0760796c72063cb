pub mod vector_db;
pub mod database;

pub use database::{DatabaseError, IndexDatabase, StoredChunk};
pub use vector_db::{vectorstore_exists, Retriever, SearchResult, VectorStore, VectorStoreError};
