use colored::Colorize;
use std::path::Path;
use crate::commands::spinner;
use crate::commands::system::display_name;
use crate::config::AppConfig;
use crate::llm::Assistant;

/// Summarize one indexed PDF, chosen by path, file name, or 1-based number.
pub async fn summarize(assistant: &Assistant, config: &AppConfig, arg: &str) -> Result<(), String> {
    if arg.is_empty() {
        return Err("Usage: /summarize <pdf|n>".to_string());
    }
    let pdf = resolve_pdf(config, arg)?;

    println!("📄 Summarizing {}", display_name(&pdf).bright_yellow());
    let pb = spinner("Generating summary...");
    let summary = assistant.summarize_pdf(&pdf).await;
    pb.finish_and_clear();

    let summary = summary.map_err(|e| format!("Error generating summary: {}", e))?;
    println!("\n📝 Summary:");
    println!("{}\n", summary.bright_green());
    Ok(())
}

pub async fn analyze_lab(assistant: &Assistant, arg: &str) -> Result<(), String> {
    if arg.is_empty() {
        return Err("Usage: /lab <pdf>".to_string());
    }
    let path = Path::new(arg);

    println!("🔬 Analyzing lab report: {}", arg.bright_yellow());
    let pb = spinner("Reading and explaining results...");
    let analysis = assistant.analyze_lab_report(path).await;
    pb.finish_and_clear();

    let analysis = analysis.map_err(|e| format!("Error analyzing lab report: {}", e))?;
    println!("\n📊 Lab Report Analysis:");
    println!("{}\n", analysis.bright_green());
    Ok(())
}

pub(crate) fn resolve_pdf(config: &AppConfig, arg: &str) -> Result<String, String> {
    if let Ok(n) = arg.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| config.pdf_files.get(i))
            .cloned()
            .ok_or_else(|| format!("No document number {}. Use /docs to list documents.", n));
    }

    let found = config
        .pdf_files
        .iter()
        .find(|p| p.as_str() == arg || display_name(p) == arg);
    Ok(found.cloned().unwrap_or_else(|| arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::from_json(r#"{
            "pdf_files": ["data/covid.pdf", "data/diabetes.pdf"],
            "chroma_directory": "chroma_db",
            "llm": { "model": "gpt-4o-mini" }
        }"#).unwrap()
    }

    #[test]
    fn resolves_by_number_and_file_name() {
        let config = config();
        assert_eq!(resolve_pdf(&config, "2").unwrap(), "data/diabetes.pdf");
        assert_eq!(resolve_pdf(&config, "covid.pdf").unwrap(), "data/covid.pdf");
        assert_eq!(resolve_pdf(&config, "data/covid.pdf").unwrap(), "data/covid.pdf");
        assert_eq!(resolve_pdf(&config, "other/x.pdf").unwrap(), "other/x.pdf");
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let config = config();
        assert!(resolve_pdf(&config, "0").is_err());
        assert!(resolve_pdf(&config, "3").is_err());
    }
}
