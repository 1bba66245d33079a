pub mod chat;
pub mod manager;

pub use chat::ChatPage;
pub use manager::BrowserSession;
