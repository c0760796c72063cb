use crate::document::Document;

pub const RAG_TEMPLATE: &str = r#"Answer using ONLY the context below.
If the answer is not in the context, say "I don't know."

Context:
{context}

Question:
{question}
"#;

const UNKNOWN_ANSWERS: [&str; 3] = ["i don't know.", "i don't know", "unknown"];

pub const SUMMARY_CONTEXT_CHARS: usize = 3000;
pub const LAB_REPORT_CHARS: usize = 4000;

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn format_context(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Substitute `{name}` placeholders in one left-to-right pass, so
/// substituted values are never scanned for further placeholders.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let matched = values.iter().find_map(|(name, value)| {
            let key = format!("{{{}}}", name);
            tail.starts_with(key.as_str()).then(|| (key.len(), *value))
        });
        match matched {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn rag_prompt(context: &str, question: &str) -> String {
    fill_template(RAG_TEMPLATE, &[("context", context), ("question", question)])
}

/// True when the model declined to answer from the supplied context.
pub fn is_unknown_answer(answer: &str) -> bool {
    let normalized = answer.trim().to_lowercase().replace('\u{2019}', "'");
    UNKNOWN_ANSWERS.contains(&normalized.as_str())
}

pub fn summary_prompt(content: &str) -> String {
    format!(
        "Provide a comprehensive summary of the following health document. \n\
         Include main topics, key points, and important information.\n\n\
         Document content:\n{}\n\n\
         Summary:",
        truncate_chars(content, SUMMARY_CONTEXT_CHARS)
    )
}

pub fn lab_report_prompt(report: &str) -> String {
    format!(
        "You are a medical AI assistant analyzing lab results. \n\n\
         Please analyze the following lab report and provide:\n\n\
         1. **Key Findings**: List the main test results with their values\n\
         2. **Normal vs. Abnormal**: Identify which values are outside normal ranges\n\
         3. **Health Implications**: Explain what the results might indicate\n\
         4. **Recommendations**: Suggest next steps\n\n\
         IMPORTANT: This is for informational purposes only. Always recommend consulting with a healthcare provider.\n\n\
         Lab Report:\n{}\n\n\
         Analysis:",
        truncate_chars(report, LAB_REPORT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_prompt_fills_both_slots() {
        let prompt = rag_prompt("Fever is common.", "What are symptoms?");
        assert!(prompt.starts_with("Answer using ONLY the context below.\n"));
        assert!(prompt.contains("say \"I don't know.\""));
        assert!(prompt.contains("Context:\nFever is common.\n\nQuestion:\nWhat are symptoms?\n"));
    }

    #[test]
    fn placeholders_inside_values_are_left_alone() {
        let prompt = rag_prompt("Template text: {question} and {context}", "What is X?");
        assert!(prompt.contains("Context:\nTemplate text: {question} and {context}\n\nQuestion:\nWhat is X?\n"));

        let prompt = rag_prompt("{a} stays", "Is {context} expanded?");
        assert!(prompt.ends_with("Question:\nIs {context} expanded?\n"));
        assert!(prompt.contains("Context:\n{a} stays\n"));
    }

    #[test]
    fn context_joins_chunks_with_blank_line() {
        let docs = vec![
            Document::new("first", "a.pdf", 0),
            Document::new("second", "a.pdf", 1),
        ];
        assert_eq!(format_context(&docs), "first\n\nsecond");
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn recognises_unknown_answers() {
        assert!(is_unknown_answer("I don't know."));
        assert!(is_unknown_answer("  i don't know \n"));
        assert!(is_unknown_answer("Unknown"));
        assert!(is_unknown_answer("I don\u{2019}t know."));
        assert!(!is_unknown_answer("I don't know much, but fever is a symptom."));
        assert!(!is_unknown_answer("Fever and cough."));
    }

    #[test]
    fn truncation_is_char_based() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn summary_prompt_truncates_content() {
        let content = "x".repeat(SUMMARY_CONTEXT_CHARS + 500);
        let prompt = summary_prompt(&content);
        assert!(prompt.contains(&"x".repeat(SUMMARY_CONTEXT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(SUMMARY_CONTEXT_CHARS + 1)));
        assert!(prompt.ends_with("Summary:"));
    }

    #[test]
    fn lab_prompt_lists_sections() {
        let prompt = lab_report_prompt("Hemoglobin 11.2 g/dL");
        assert!(prompt.contains("**Key Findings**"));
        assert!(prompt.contains("**Recommendations**"));
        assert!(prompt.contains("Lab Report:\nHemoglobin 11.2 g/dL\n\nAnalysis:"));
    }
}
