use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::llm::assistant::Answer;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn heading(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push_user(&mut self, question: &str) {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: question.to_string(),
            source: None,
            urls: Vec::new(),
        });
    }

    pub fn push_answer(&mut self, answer: &Answer) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: answer.text.clone(),
            source: Some(answer.source.label().to_string()),
            urls: answer.source.urls().to_vec(),
        });
    }

    pub fn push_error(&mut self, message: &str) {
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: message.to_string(),
            source: Some("Error".to_string()),
            urls: Vec::new(),
        });
    }

    pub fn export_transcript(&self, generated: NaiveDateTime) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut text = String::from("Health Assistant Chat History\n");
        text.push_str(&format!("Generated: {}\n", generated.format("%Y-%m-%d %H:%M:%S")));
        text.push_str(&"=".repeat(RULE_WIDTH));
        text.push_str("\n\n");

        for msg in &self.messages {
            text.push_str(&format!("{}:\n{}\n", msg.role.heading(), msg.content));
            if let Some(source) = msg.source.as_deref().filter(|s| !s.is_empty()) {
                text.push_str(&format!("[Source: {}]\n", source));
            }
            if !msg.urls.is_empty() {
                text.push_str("Sources:\n");
                for (i, url) in msg.urls.iter().enumerate() {
                    text.push_str(&format!("{}. {}\n", i + 1, url));
                }
            }
            text.push_str(&format!("\n{}\n\n", rule));
        }

        text
    }

    pub fn default_export_filename(generated: NaiveDateTime) -> String {
        format!("health_chat_{}.txt", generated.format("%Y%m%d_%H%M%S"))
    }

    pub async fn export_to_file(&self, path: &Path, generated: NaiveDateTime) -> std::io::Result<()> {
        tokio::fs::write(path, self.export_transcript(generated)).await
    }
}
