pub mod agents;
pub mod config;
pub mod external;
pub mod graph;
pub mod interpreter;
pub mod parser;
pub mod processor;
pub mod store;

pub use config::Config;
pub use external::{ExternalError, HttpLLMClient, LLMClient, LLMConfig, LLMEngine};
pub use graph::{GraphError, KnowledgeEdge, KnowledgeNode, KnowledgeTree};
pub use interpreter::{interpret_json, Interpretation, InterpreterFailure};
pub use parser::{extract_document, DocumentExtractor, ExtractedDocument, ExtractionError, TextChunker};
pub use processor::{ProcessError, StudyProcessor};
pub use store::{DocumentStore, InMemoryDocumentStore};
