mod loader;
mod splitter;

pub use loader::{extract_pdf_text, load_pdf, load_pdfs, Document, DocumentError, DocumentMetadata};
pub use splitter::{chunk_documents, RecursiveCharacterTextSplitter, DEFAULT_SEPARATORS};
