use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use crate::config::AppConfig;
use crate::llm::{Answer, Assistant};
use crate::session::{ChatHistory, UserStore};

pub mod document;
mod journal;
mod reminder;
pub mod system;

/// What the REPL should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct CommandHandler {
    assistant: Assistant,
    config: AppConfig,
    history: ChatHistory,
    user_store: UserStore,
}

impl CommandHandler {
    pub fn new(assistant: Assistant, config: AppConfig, user_store: UserStore) -> Self {
        Self {
            assistant,
            config,
            history: ChatHistory::new(),
            user_store,
        }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn user_store(&self) -> &UserStore {
        &self.user_store
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<Flow, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Flow::Continue);
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "q" => {
                println!("\nThank you for using Health Assistant. Goodbye!");
                return Ok(Flow::Exit);
            }
            _ => {}
        }

        match input.strip_prefix('/') {
            Some(command) => self.handle_slash_command(command).await?,
            None => self.handle_question(input).await,
        }
        Ok(Flow::Continue)
    }

    async fn handle_slash_command(&mut self, command: &str) -> Result<(), String> {
        let (name, rest) = split_command(command);

        match name.to_lowercase().as_str() {
            "help" => system::print_help(),
            "examples" => system::print_examples(),
            "config" => system::print_config(&self.config, self.assistant.model_name()),
            "docs" => system::print_documents(self.assistant.store(), &self.config).await?,
            "clear" => {
                self.history.clear();
                println!("{}", "🗑️ Chat history cleared.".green());
            }
            "export" => self.export_history(rest).await?,
            "summarize" => document::summarize(&self.assistant, &self.config, rest).await?,
            "lab" => document::analyze_lab(&self.assistant, rest).await?,
            "remind" => reminder::handle_command(rest, &mut self.user_store).await?,
            "journal" => journal::handle_command(rest, &mut self.user_store).await?,
            _ => {
                return Err(format!(
                    "Unknown command: /{}. Type /help for available commands.",
                    name
                ))
            }
        }
        Ok(())
    }

    async fn handle_question(&mut self, question: &str) {
        self.history.push_user(question);

        let pb = spinner("🔍 Searching knowledge base...");
        let result = self.assistant.ask(question).await;
        pb.finish_and_clear();

        match result {
            Ok(answer) => {
                print_answer(&answer);
                self.history.push_answer(&answer);
            }
            Err(e) => {
                let message = format!("Error: {}", e);
                println!("\n{} {}\n", "❌".red(), message.red());
                self.history.push_error(&message);
            }
        }
    }

    async fn export_history(&self, target: &str) -> Result<(), String> {
        if self.history.is_empty() {
            println!("Nothing to export yet.");
            return Ok(());
        }

        let now = Local::now().naive_local();
        let path = if target.is_empty() {
            PathBuf::from(ChatHistory::default_export_filename(now))
        } else {
            PathBuf::from(target)
        };

        self.history
            .export_to_file(&path, now)
            .await
            .map_err(|e| format!("Failed to export chat history: {}", e))?;
        println!("💾 Chat history exported to {}", path.display().to_string().cyan());
        Ok(())
    }
}

/// Print an answer the way the one-shot and interactive modes share.
pub fn print_answer(answer: &Answer) {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("Source: {}", answer.source.label().cyan());
    println!("{}\n", rule);
    println!("{}", answer.text.truecolor(255, 236, 179));

    let urls = answer.source.urls();
    if !urls.is_empty() {
        println!("\nSources:");
        for (i, url) in urls.iter().enumerate() {
            println!("{}. {}", i + 1, url.blue());
        }
    }
    println!("\n{}\n", "-".repeat(60));
}

pub(crate) fn split_command(input: &str) -> (&str, &str) {
    match input.trim().split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (input.trim(), ""),
    }
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
