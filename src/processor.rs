//! Orchestration over the store, the extractor and the agents. Every
//! operation a front end exposes goes through [`StudyProcessor`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info};

use crate::agents::assessment::{GradeReport, Quiz, StudentPerformance};
use crate::agents::extraction::{Concept, DocumentStructure, Section};
use crate::agents::flashcard::{categorize_flashcards, CategorizedFlashcards, Flashcard};
use crate::agents::knowledge_tree::NodeDetails;
use crate::agents::simplifier::{Analogy, SimplifiedConcept};
use crate::agents::summary::DocumentSummaries;
use crate::agents::tutor::{AnswerFeedback, DifficultyLevel, PracticeProblem, StudyPlan, TutorAnswer};
use crate::agents::{
    AssessmentAgent, Difficulty, ExtractionAgent, FlashcardAgent, KnowledgeTreeAgent,
    PromptAgent, SimplifierAgent, SummaryAgent, TutorAgent,
};
use crate::config::Config;
use crate::external::LLMEngine;
use crate::graph::KnowledgeTree;
use crate::parser::{DocumentExtractor, ExtractedDocument, ExtractionError};
use crate::store::{DocumentInfo, DocumentStore, InMemoryDocumentStore};

const PREVIEW_CHARS: usize = 1000;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Extraction task failed: {0}")]
    Task(#[from] JoinError),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// What an upload returns: the stored id plus a first pass of concept
/// extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub document_id: String,
    pub filename: String,
    pub topics: Vec<String>,
    pub sections: Vec<Section>,
    pub concept_list: Vec<Concept>,
    pub raw_text: String,
    pub structure_map: DocumentStructure,
    pub word_count: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub document_id: String,
    pub total: usize,
    pub flashcards: Vec<Flashcard>,
    pub categories: CategorizedFlashcards,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simplification {
    pub concepts: Vec<SimplifiedConcept>,
    pub analogies: Vec<Analogy>,
}

/// First `PREVIEW_CHARS` characters, with an ellipsis when cut.
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub struct StudyProcessor {
    store: Arc<dyn DocumentStore>,
    extractor: DocumentExtractor,
    extraction: ExtractionAgent,
    simplifier: SimplifierAgent,
    knowledge_tree: KnowledgeTreeAgent,
    summary: SummaryAgent,
    flashcards: FlashcardAgent,
    tutor: TutorAgent,
    assessment: AssessmentAgent,
}

impl StudyProcessor {
    pub fn new(
        engine: Arc<LLMEngine>,
        store: Arc<dyn DocumentStore>,
        extractor: DocumentExtractor,
    ) -> Self {
        let runner = PromptAgent::new(engine);
        Self {
            store,
            extractor,
            extraction: ExtractionAgent::new(runner.clone()),
            simplifier: SimplifierAgent::new(runner.clone()),
            knowledge_tree: KnowledgeTreeAgent::new(runner.clone()),
            summary: SummaryAgent::new(runner.clone()),
            flashcards: FlashcardAgent::new(runner.clone()),
            tutor: TutorAgent::new(runner.clone()),
            assessment: AssessmentAgent::new(runner),
        }
    }

    /// HTTP engine and in-memory store built from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let engine = LLMEngine::from_config(config.llm.clone())?;
        let extractor = DocumentExtractor::new(config.chunker()?);
        Ok(Self::new(
            Arc::new(engine),
            Arc::new(InMemoryDocumentStore::new()),
            extractor,
        ))
    }

    async fn document(&self, document_id: &str) -> Result<Arc<ExtractedDocument>> {
        self.store
            .get(document_id)
            .await?
            .ok_or_else(|| ProcessError::DocumentNotFound(document_id.to_string()))
    }

    /// Extract and store a file, returning its document id
    pub async fn ingest(&self, path: &Path) -> Result<String> {
        let extractor = self.extractor.clone();
        let owned: PathBuf = path.to_path_buf();
        let document = tokio::task::spawn_blocking(move || extractor.extract(&owned)).await??;
        let id = self.store.put(document).await?;
        info!(document_id = %id, path = %path.display(), "document ingested");
        Ok(id)
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadSummary> {
        let document_id = self.ingest(path).await?;
        let document = self.document(&document_id).await?;
        let extraction = self.extraction.extract_concepts(&document.raw_text).await;

        Ok(UploadSummary {
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            topics: extraction.topics,
            sections: extraction.sections,
            concept_list: extraction.concepts,
            raw_text: preview(&document.raw_text),
            structure_map: extraction.structure,
            word_count: document.word_count(),
            page_count: document.page_count,
            document_id,
        })
    }

    pub async fn generate_graph(&self, document_id: &str) -> Result<KnowledgeTree> {
        let document = self.document(document_id).await?;
        Ok(self
            .knowledge_tree
            .create_knowledge_tree(&document.raw_text)
            .await)
    }

    pub async fn node_details(&self, document_id: &str, node_id: &str) -> Result<NodeDetails> {
        let document = self.document(document_id).await?;
        Ok(self
            .knowledge_tree
            .get_node_details(node_id, &document.raw_text)
            .await)
    }

    pub async fn generate_summary(&self, document_id: &str) -> Result<DocumentSummaries> {
        let document = self.document(document_id).await?;
        Ok(self.summary.generate_summaries(&document.raw_text).await)
    }

    pub async fn generate_flashcards(&self, document_id: &str, num_cards: usize) -> Result<FlashcardDeck> {
        let document = self.document(document_id).await?;
        let flashcards = self
            .flashcards
            .create_flashcards(&document.raw_text, num_cards)
            .await;
        debug!(document_id, cards = flashcards.len(), "flashcards generated");

        Ok(FlashcardDeck {
            document_id: document_id.to_string(),
            total: flashcards.len(),
            categories: categorize_flashcards(&flashcards),
            flashcards,
        })
    }

    /// Simplify the document's concepts and build analogies for its first
    /// topic.
    pub async fn simplify(&self, document_id: &str) -> Result<Simplification> {
        let document = self.document(document_id).await?;
        let extraction = self.extraction.extract_concepts(&document.raw_text).await;
        let topic = extraction
            .topics
            .first()
            .map(String::as_str)
            .unwrap_or("this document");

        let concepts = self.simplifier.simplify_concepts(&extraction.concepts).await;
        let analogies = self
            .simplifier
            .create_analogies(&document.raw_text, topic)
            .await;
        Ok(Simplification { concepts, analogies })
    }

    pub async fn study_plan(&self, document_id: &str, level: DifficultyLevel) -> Result<StudyPlan> {
        let document = self.document(document_id).await?;
        let extraction = self.extraction.extract_concepts(&document.raw_text).await;
        Ok(self.tutor.suggest_study_plan(&extraction.topics, level).await)
    }

    pub async fn tutor(&self, question: &str, context: Option<&str>) -> TutorAnswer {
        self.tutor.answer_question(question, context).await
    }

    pub async fn practice_problems(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<PracticeProblem> {
        self.tutor
            .generate_practice_problems(topic, difficulty, count)
            .await
    }

    pub async fn answer_feedback(
        &self,
        student_answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> AnswerFeedback {
        self.tutor
            .provide_feedback(student_answer, correct_answer, question)
            .await
    }

    pub async fn generate_quiz(&self, topic: &str, difficulty: Difficulty, num_questions: usize) -> Quiz {
        self.assessment
            .create_quiz(topic, difficulty, num_questions)
            .await
    }

    pub async fn adaptive_quiz(&self, topic: &str, performance: &StudentPerformance) -> Quiz {
        self.assessment.create_adaptive_quiz(topic, performance).await
    }

    pub async fn grade_quiz(&self, quiz: &Quiz, answers: &HashMap<String, String>) -> GradeReport {
        self.assessment.grade_quiz(quiz, answers).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        Ok(self.store.list().await?)
    }
}
