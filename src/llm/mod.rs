pub mod assistant;
pub mod chat;
pub mod prompts;

pub use assistant::{Answer, AnswerSource, Assistant};
pub use chat::RagChain;
