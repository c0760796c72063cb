pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod document;
pub mod llm;
pub mod providers;
pub mod session;

// Re-export commonly used items
pub use app::{build_assistant, rebuild_banner, rebuild_index, rebuild_summary, AppError};
pub use config::{AppConfig, Credentials};
pub use llm::{Answer, AnswerSource, Assistant};
