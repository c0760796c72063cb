pub mod history;
pub mod user_data;

pub use history::{ChatHistory, ChatMessage, Role};
pub use user_data::{Attachment, JournalEntry, Reminder, SessionError, UserData, UserStore};
