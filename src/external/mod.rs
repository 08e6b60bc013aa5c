pub mod error;
mod llm;

pub use error::ExternalError;
pub use llm::{ChatMessage, HttpLLMClient, LLMClient, LLMConfig, LLMEngine, Role};

#[cfg(test)]
pub use llm::MockLLMClient;
