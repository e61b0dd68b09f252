pub mod cleaner;
pub mod config;
pub mod llm;
pub mod store;
