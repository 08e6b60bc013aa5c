use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::heuristics::{capitalized_words, is_title_case, is_upper_case};
use super::schema::{objects, str_or, string_list, truncate_chars};
use super::{PromptAgent, PromptSpec};

const SYSTEM_PROMPT: &str = "You are an expert document analysis agent. Your task is to extract key information from documents.

Extract the following from the given text:
1. Main topics and themes
2. Document sections/chapters
3. Key concepts and definitions
4. Important formulas or equations
5. Document structure and hierarchy

Return your response as JSON with the following structure:
{
    \"topics\": [\"topic1\", \"topic2\"],
    \"sections\": [{\"title\": \"section_title\", \"content_preview\": \"preview...\"}],
    \"concepts\": [{\"term\": \"concept\", \"definition\": \"definition\"}],
    \"formulas\": [\"formula1\", \"formula2\"],
    \"structure\": {\"type\": \"document_type\", \"hierarchy\": []}
}";

const INPUT_LIMIT: usize = 3000;
const MAX_FALLBACK_TOPICS: usize = 10;
const MAX_FALLBACK_SECTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    #[serde(rename = "type")]
    pub kind: String,
    pub hierarchy: Value,
}

/// Topics, sections, concepts and formulas found in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptExtraction {
    pub topics: Vec<String>,
    pub sections: Vec<Section>,
    pub concepts: Vec<Concept>,
    pub formulas: Vec<String>,
    pub structure: DocumentStructure,
}

struct ExtractSpec<'a> {
    text: &'a str,
}

impl PromptSpec for ExtractSpec<'_> {
    type Output = ConceptExtraction;

    fn name(&self) -> &'static str {
        "extraction"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Analyze the following document text and extract key information:

TEXT:
{}...

Please extract:
1. Main topics (5-10 key topics)
2. Document sections with titles
3. Key concepts with definitions
4. Any formulas or equations
5. Overall document structure",
            truncate_chars(self.text, INPUT_LIMIT)
        )
    }

    fn validate(&self, value: Value) -> Option<ConceptExtraction> {
        if !value.is_object() {
            return None;
        }

        let sections = match value.get("sections").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(title) => Some(Section {
                        title: title.clone(),
                        content_preview: String::new(),
                    }),
                    Value::Object(_) => Some(Section {
                        title: str_or(item, "title", ""),
                        content_preview: str_or(item, "content_preview", ""),
                    }),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };

        let concepts = objects(&value, "concepts")
            .into_iter()
            .map(|(_, item)| Concept {
                term: str_or(item, "term", "Unknown"),
                definition: str_or(item, "definition", ""),
            })
            .collect();

        let structure = match value.get("structure") {
            Some(structure @ Value::Object(_)) => DocumentStructure {
                kind: str_or(structure, "type", "document"),
                hierarchy: structure.get("hierarchy").cloned().unwrap_or_else(|| json!([])),
            },
            _ => DocumentStructure {
                kind: "document".to_string(),
                hierarchy: json!([]),
            },
        };

        Some(ConceptExtraction {
            topics: string_list(&value, "topics"),
            sections,
            concepts,
            formulas: string_list(&value, "formulas"),
            structure,
        })
    }

    fn fallback(&self) -> ConceptExtraction {
        let topics = capitalized_words(self.text, 3, MAX_FALLBACK_TOPICS);

        let sections = self
            .text
            .lines()
            .filter(|line| {
                let len = line.chars().count();
                len > 5 && len < 100 && (is_upper_case(line) || is_title_case(line))
            })
            .take(MAX_FALLBACK_SECTIONS)
            .map(|line| Section {
                title: line.trim().to_string(),
                content_preview: "Section content...".to_string(),
            })
            .collect();

        ConceptExtraction {
            structure: DocumentStructure {
                kind: "document".to_string(),
                hierarchy: json!(topics),
            },
            topics,
            sections,
            concepts: Vec::new(),
            formulas: Vec::new(),
        }
    }
}

/// Pulls topics, sections and key concepts out of document text.
#[derive(Clone)]
pub struct ExtractionAgent {
    runner: PromptAgent,
}

impl ExtractionAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self { runner }
    }

    pub async fn extract_concepts(&self, text: &str) -> ConceptExtraction {
        self.runner.run(&ExtractSpec { text }).await
    }
}
