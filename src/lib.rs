pub mod agent;
pub mod api;
pub mod config;
pub mod database;
pub mod document;
pub mod llm;
pub mod providers;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use agent::{ConversationState, MedicalAgent};
pub use config::AppConfig;
