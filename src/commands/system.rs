use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use crate::config::AppConfig;
use crate::database::vector_db::VectorStore;

pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What are the symptoms of COVID-19?",
    "How is diabetes managed?",
    "What are risk factors for heart disease?",
    "Tell me about vaccine information",
    "What medications treat high blood pressure?",
];

pub fn print_banner() {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("{}", "🏥 Health Assistant Ready!".bright_green().bold());
    println!("{}", rule);
    println!("Ask questions about the health topics in your PDFs");
    println!("Type 'exit' or 'quit' to end the session, /help for commands\n");
}

pub fn print_disclaimer() {
    println!("{}", "⚠️ Important Disclaimer".yellow().bold());
    println!("{}", "This information is for educational purposes only.".yellow());
    println!("  - This assistant answers from your PDF documents, falling back to web search");
    println!("  - It is NOT a substitute for professional medical advice, diagnosis, or treatment");
    println!("  - Always consult qualified healthcare professionals for medical concerns");
    println!("  - In case of emergency, call your local emergency services");
    println!();
}

pub fn print_help() {
    println!("\n💬 Ask Questions:");
    println!("  Just type your health question");
    println!("  exit, quit, q          - End the session");
    println!();

    println!("📚 Knowledge Base:");
    println!("  /docs                  - List configured documents");
    println!("  /summarize <pdf|n>     - Summarize an indexed PDF");
    println!("  /lab <pdf>             - Explain a lab report PDF");
    println!();

    println!("⏰ Reminders:");
    println!("  /remind add <YYYY-MM-DD> <text>");
    println!("  /remind list");
    println!("  /remind rm <n>");
    println!("  /remind clear");
    println!();

    println!("📔 Health Journal:");
    println!("  /journal add <title> | <entry> [| <attachment>]");
    println!("  /journal list");
    println!("  /journal rm <n>");
    println!();

    println!("⚙️ Session:");
    println!("  /help                  - Show this help menu");
    println!("  /examples              - Show example questions");
    println!("  /config                - Show current settings");
    println!("  /clear                 - Clear chat history");
    println!("  /export [file]         - Save chat history to a text file");
    println!();
}

pub fn print_examples() {
    println!("\n💡 Example Questions:");
    for question in EXAMPLE_QUESTIONS {
        println!("  - {}", question);
    }
    println!();
}

pub fn print_config(config: &AppConfig, model_name: &str) {
    println!("\n⚙️ Settings:");
    println!("  Model: {}", model_name.cyan());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Chunk size: {}", config.chunking.chunk_size);
    println!("  Chunk overlap: {}", config.chunking.chunk_overlap);
    println!("  Retrieved chunks (k): {}", config.retriever.k);
    println!("  Embedding model: {}", config.embedding.model);
    println!("  Web search: {} (max {} results)", config.web_search.engine, config.web_search.max_results);
    println!("  Index directory: {}", config.chroma_directory);
    println!();
}

/// List the configured PDFs, numbered the way `/summarize <n>` expects.
pub async fn print_documents(store: &Arc<VectorStore>, config: &AppConfig) -> Result<(), String> {
    let sources = store
        .sources()
        .await
        .map_err(|e| format!("Failed to list documents: {}", e))?;

    println!("\n📚 Loaded Documents:");
    if config.pdf_files.is_empty() {
        println!("  (none)");
    }
    for line in document_listing(config, &sources) {
        println!("  {}", line);
    }
    println!();
    Ok(())
}

pub(crate) fn document_listing(config: &AppConfig, sources: &[(String, usize)]) -> Vec<String> {
    config
        .pdf_files
        .iter()
        .enumerate()
        .map(|(i, pdf)| {
            let chunks = sources
                .iter()
                .find(|(source, _)| source == pdf)
                .map(|(_, n)| *n);
            match chunks {
                Some(n) => format!("{}. {} ({} chunks)", i + 1, display_name(pdf).bright_yellow(), n),
                None => format!("{}. {} {}", i + 1, display_name(pdf).bright_yellow(), "(not indexed)".red()),
            }
        })
        .collect()
}

pub(crate) fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_follows_configured_order_and_marks_missing() {
        colored::control::set_override(false);
        let config = AppConfig::from_json(r#"{
            "pdf_files": ["data/covid.pdf", "data/diabetes.pdf"],
            "chroma_directory": "chroma_db",
            "llm": { "model": "gpt-4o-mini" }
        }"#).unwrap();
        let sources = vec![("data/diabetes.pdf".to_string(), 4)];

        assert_eq!(
            document_listing(&config, &sources),
            vec!["1. covid.pdf (not indexed)", "2. diabetes.pdf (4 chunks)"]
        );
        assert_eq!(
            crate::commands::document::resolve_pdf(&config, "2").unwrap(),
            "data/diabetes.pdf"
        );
    }

    #[test]
    fn display_name_is_the_file_name() {
        assert_eq!(display_name("data/COVID-19.pdf"), "COVID-19.pdf");
        assert_eq!(display_name("plain.pdf"), "plain.pdf");
    }
}
