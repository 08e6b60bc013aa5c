//! Prompt agents.
//!
//! Every agent operation is a [`PromptSpec`] (or [`TextSpec`] for plain-text
//! replies) executed by the shared [`PromptAgent`] runner. The runner never
//! fails; any reply it cannot use resolves to the operation's deterministic
//! fallback.

pub mod assessment;
pub mod extraction;
pub mod flashcard;
pub mod heuristics;
pub mod knowledge_tree;
pub mod schema;
pub mod simplifier;
pub mod summary;
pub mod tutor;

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::external::LLMEngine;
use crate::interpreter::Interpretation;

pub use assessment::AssessmentAgent;
pub use extraction::ExtractionAgent;
pub use flashcard::FlashcardAgent;
pub use knowledge_tree::KnowledgeTreeAgent;
pub use schema::Difficulty;
pub use simplifier::SimplifierAgent;
pub use summary::SummaryAgent;
pub use tutor::TutorAgent;

/// One structured-output operation: how to ask, how to check the answer,
/// and what to return when the answer is unusable.
pub trait PromptSpec: Send + Sync {
    type Output;

    /// Name used in log lines
    fn name(&self) -> &'static str;

    fn system_prompt(&self) -> &'static str;

    fn prompt(&self) -> String;

    /// Token budget override; the engine default applies when `None`
    fn max_tokens(&self) -> Option<u32> {
        None
    }

    /// Shape the parsed reply into the output, or `None` when it lacks the
    /// fields this operation requires.
    fn validate(&self, value: Value) -> Option<Self::Output>;

    fn fallback(&self) -> Self::Output;
}

/// A plain-text operation. Blank replies count as failures.
pub trait TextSpec: Send + Sync {
    fn name(&self) -> &'static str;

    fn system_prompt(&self) -> &'static str;

    fn prompt(&self) -> String;

    fn max_tokens(&self) -> Option<u32> {
        None
    }

    fn fallback(&self) -> String;
}

/// Runs prompt specs against the LLM engine.
#[derive(Clone)]
pub struct PromptAgent {
    engine: Arc<LLMEngine>,
}

impl PromptAgent {
    pub fn new(engine: Arc<LLMEngine>) -> Self {
        Self { engine }
    }

    pub async fn run<S: PromptSpec>(&self, spec: &S) -> S::Output {
        let reply = self
            .engine
            .generate_json(spec.system_prompt(), &spec.prompt(), spec.max_tokens())
            .await;

        match reply {
            Interpretation::Parsed(value) => match spec.validate(value) {
                Some(output) => {
                    debug!(agent = spec.name(), "model reply accepted");
                    output
                }
                None => {
                    warn!(agent = spec.name(), "model reply missing required fields, using fallback");
                    spec.fallback()
                }
            },
            Interpretation::Failed(failure) => {
                warn!(agent = spec.name(), error = %failure, "unusable model reply, using fallback");
                spec.fallback()
            }
        }
    }

    pub async fn run_text<S: TextSpec>(&self, spec: &S) -> String {
        match self
            .engine
            .generate(spec.system_prompt(), &spec.prompt(), spec.max_tokens())
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(agent = spec.name(), "empty model reply, using fallback");
                spec.fallback()
            }
            Err(e) => {
                warn!(agent = spec.name(), error = %e, "LLM call failed, using fallback");
                spec.fallback()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::external::{ExternalError, LLMConfig, MockLLMClient};

    pub fn config() -> LLMConfig {
        LLMConfig {
            endpoint: "http://localhost:8080".to_string(),
            timeout_secs: 5,
            ..LLMConfig::default()
        }
    }

    /// Runner whose every call returns `reply`.
    pub fn replying(reply: &str) -> PromptAgent {
        let reply = reply.to_string();
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .returning(move |_, _, _| Ok(reply.clone()));
        PromptAgent::new(Arc::new(LLMEngine::new(Arc::new(mock), config())))
    }

    /// Runner whose every call fails with a transport error.
    pub fn failing() -> PromptAgent {
        let mut mock = MockLLMClient::new();
        mock.expect_complete().returning(|_, _, _| {
            Err(ExternalError::ConnectionError("connection refused".to_string()))
        });
        PromptAgent::new(Arc::new(LLMEngine::new(Arc::new(mock), config())))
    }

    /// Runner answering each call with the next reply in order.
    pub fn scripted(replies: Vec<&str>) -> PromptAgent {
        let mut mock = MockLLMClient::new();
        let mut seq = mockall::Sequence::new();
        for reply in replies {
            let reply = reply.to_string();
            mock.expect_complete()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _, _| Ok(reply.clone()));
        }
        PromptAgent::new(Arc::new(LLMEngine::new(Arc::new(mock), config())))
    }
}
