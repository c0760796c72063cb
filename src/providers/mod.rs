pub mod openai;
pub mod serpapi;
pub mod traits;

pub use openai::openai::{OpenAIChatModel, OpenAIEmbedder};
pub use serpapi::serpapi::{format_web_results, SerpApiClient};
pub use traits::{ChatModel, Embedder, WebResult, WebSearch};
