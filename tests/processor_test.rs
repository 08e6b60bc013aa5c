use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use study_material_builder::agents::assessment::{QuestionType, Quiz, QuizQuestion};
use study_material_builder::agents::Difficulty;
use study_material_builder::external::{ChatMessage, ExternalError, LLMClient, LLMConfig, LLMEngine};
use study_material_builder::graph::NodeType;
use study_material_builder::{DocumentExtractor, InMemoryDocumentStore, ProcessError, StudyProcessor};

mock! {
    pub Client {}

    #[async_trait]
    impl LLMClient for Client {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            max_tokens: u32,
            temperature: f32,
        ) -> Result<String, ExternalError>;
    }
}

const SAMPLE: &str = "tests/data/sample.txt";

/// Client answering each prompt with the reply of the first matching prefix.
/// Prompts without a route fail like an unreachable endpoint.
fn routed(routes: Vec<(&'static str, String)>) -> MockClient {
    let mut mock = MockClient::new();
    mock.expect_complete().returning(move |messages, _, _| {
        let prompt = &messages[1].content;
        routes
            .iter()
            .find(|(prefix, _)| prompt.starts_with(prefix))
            .map(|(_, reply)| Ok(reply.clone()))
            .unwrap_or_else(|| Err(ExternalError::ConnectionError("connection refused".to_string())))
    });
    mock
}

fn processor(client: MockClient) -> StudyProcessor {
    let config = LLMConfig {
        endpoint: "http://localhost:8080".to_string(),
        timeout_secs: 5,
        ..LLMConfig::default()
    };
    StudyProcessor::new(
        Arc::new(LLMEngine::new(Arc::new(client), config)),
        Arc::new(InMemoryDocumentStore::new()),
        DocumentExtractor::default(),
    )
}

#[tokio::test]
async fn test_upload_summarizes_document() {
    let reply = json!({
        "topics": ["Cells", "Energy"],
        "sections": [{"title": "Chapter 1 The Cell", "content_preview": "Every living organism..."}],
        "concepts": [{"term": "ATP", "definition": "Energy currency of the cell"}],
        "formulas": [],
        "structure": {"type": "textbook", "hierarchy": {"Cells": ["Energy"]}}
    });
    let processor = processor(routed(vec![("Analyze the following", reply.to_string())]));

    let summary = processor.upload(Path::new(SAMPLE)).await.unwrap();
    assert_eq!(summary.document_id, "doc_1");
    assert_eq!(summary.filename, "sample.txt");
    assert_eq!(summary.topics, vec!["Cells", "Energy"]);
    assert_eq!(summary.concept_list[0].term, "ATP");
    assert_eq!(summary.structure_map.kind, "textbook");
    assert_eq!(summary.page_count, 1);
    assert!(summary.word_count > 50);
    assert!(summary.raw_text.starts_with("INTRODUCTION TO CELL BIOLOGY"));
}

#[tokio::test]
async fn test_graph_from_model_reply() {
    let reply = json!({
        "nodes": [
            {"id": "root", "type": "root", "data": {"label": "Cell Biology", "level": 0}},
            {"id": "energy", "data": {"label": "Energy", "level": 3}}
        ],
        "edges": [
            {"source": "root", "target": "energy"},
            {"source": "root", "target": "missing"}
        ]
    });
    let processor = processor(routed(vec![("Create a knowledge tree", reply.to_string())]));

    let id = processor.ingest(Path::new(SAMPLE)).await.unwrap();
    let tree = processor.generate_graph(&id).await.unwrap();

    assert_eq!(tree.nodes.len(), 2);
    assert_eq!(tree.edges.len(), 1);
    assert_eq!(tree.edges[0].id, "edge_1");
    let energy = tree.node("energy").unwrap();
    assert_eq!(energy.level(), 1);
    assert_eq!(energy.node_type, NodeType::Branch);
    assert!(tree.validate().is_ok());
}

#[tokio::test]
async fn test_graph_fallback_is_consistent() {
    let processor = processor(routed(vec![]));

    let id = processor.ingest(Path::new(SAMPLE)).await.unwrap();
    let tree = processor.generate_graph(&id).await.unwrap();

    assert_eq!(tree.nodes[0].id, "root");
    assert!(tree.nodes.len() > 1 && tree.nodes.len() <= 9);
    assert!(tree.validate().is_ok());
}

#[tokio::test]
async fn test_flashcards_fall_back_without_llm() {
    let processor = processor(routed(vec![]));

    let id = processor.ingest(Path::new(SAMPLE)).await.unwrap();
    let deck = processor.generate_flashcards(&id, 5).await.unwrap();

    assert_eq!(deck.total, 5);
    assert_eq!(deck.flashcards.len(), 5);
    assert!(deck
        .flashcards
        .iter()
        .all(|card| card.id.starts_with("fallback_card_")));
    assert_eq!(deck.categories.definition.len(), 5);
}

#[tokio::test]
async fn test_summary_covers_chapters() {
    let processor = processor(routed(vec![
        ("Summarize this section", "Section summary.".to_string()),
        ("Create a concise 1-page", "One page.".to_string()),
        ("Create a comprehensive 5-page", "Five pages.".to_string()),
        ("Create a bullet-point", json!(["Cells", "Energy"]).to_string()),
    ]));

    let id = processor.ingest(Path::new(SAMPLE)).await.unwrap();
    let summaries = processor.generate_summary(&id).await.unwrap();

    assert_eq!(summaries.one_page, "One page.");
    assert_eq!(summaries.five_page, "Five pages.");
    assert_eq!(summaries.bullet_points, vec!["Cells", "Energy"]);
    let titles: Vec<&str> = summaries.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
    assert!(summaries.chapters.iter().all(|c| c.summary == "Section summary."));
}

#[tokio::test]
async fn test_unknown_document() {
    let processor = processor(routed(vec![]));

    let err = processor.generate_graph("doc_7").await.unwrap_err();
    assert!(matches!(err, ProcessError::DocumentNotFound(ref id) if id == "doc_7"));

    let err = processor.simplify("doc_7").await.unwrap_err();
    assert!(matches!(err, ProcessError::DocumentNotFound(_)));
}

#[tokio::test]
async fn test_list_documents() {
    let processor = processor(routed(vec![]));

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(file, "A short note about Osmosis.").unwrap();

    processor.ingest(Path::new(SAMPLE)).await.unwrap();
    processor.ingest(file.path()).await.unwrap();

    let documents = processor.list_documents().await.unwrap();
    let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["doc_1", "doc_2"]);
    assert_eq!(documents[1].word_count, 5);
}

#[tokio::test]
async fn test_grade_quiz_with_short_answer() {
    let processor = processor(routed(vec![(
        "Grade this short answer",
        json!({"score_percentage": "60%", "feedback": "Partially correct"}).to_string(),
    )]));

    let quiz = Quiz {
        quiz_title: "Cells".to_string(),
        difficulty: Difficulty::Medium,
        total_points: 20,
        time_limit: "30 minutes".to_string(),
        questions: vec![
            QuizQuestion {
                id: "q1".to_string(),
                question_type: QuestionType::ShortAnswer,
                question: "Explain ATP".to_string(),
                options: None,
                correct_answer: "Energy carrier".to_string(),
                explanation: String::new(),
                points: 10,
                difficulty: Difficulty::Medium,
            },
            QuizQuestion {
                id: "q2".to_string(),
                question_type: QuestionType::TrueFalse,
                question: "Cells divide.".to_string(),
                options: None,
                correct_answer: "True".to_string(),
                explanation: String::new(),
                points: 10,
                difficulty: Difficulty::Medium,
            },
        ],
    };
    let answers: HashMap<String, String> = [("q1", "It stores energy"), ("q2", "TRUE")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let report = processor.grade_quiz(&quiz, &answers).await;
    assert_eq!(report.earned_points, 16);
    assert_eq!(report.percentage, 80.0);
    assert_eq!(report.grade, "B");
    assert_eq!(report.detailed_feedback[0].feedback, "Partially correct");
}
