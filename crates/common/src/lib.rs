pub mod config;
pub mod llm;
pub mod observability;
pub mod sei;
pub mod types;
