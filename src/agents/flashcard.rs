use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::schema::{difficulty_or_medium, object_items, str_or, string_list, truncate_chars, Difficulty};
use super::{PromptAgent, PromptSpec};
use crate::parser::{capitalized_phrases, TextChunker};

const SYSTEM_PROMPT: &str = "You are an expert at creating educational flashcards from documents.

Create flashcards that are:
1. Clear and concise questions
2. Accurate and complete answers
3. Appropriate difficulty level
4. Cover key concepts comprehensively
5. Include various question types (definition, application, comparison)

Each flashcard should test understanding, not just memorization.";

pub const DEFAULT_CARD_COUNT: usize = 50;
const CHUNK_SIZE: usize = 1500;
const CHUNK_OVERLAP: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    #[default]
    Concept,
    Definition,
    Application,
    Analysis,
}

impl CardCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "concept" => Some(CardCategory::Concept),
            "definition" => Some(CardCategory::Definition),
            "application" => Some(CardCategory::Application),
            "analysis" => Some(CardCategory::Analysis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
    pub category: CardCategory,
    pub tags: Vec<String>,
}

/// Cards grouped by difficulty and, for the non-default categories, by
/// category. A card can appear in two groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedFlashcards {
    pub easy: Vec<Flashcard>,
    pub medium: Vec<Flashcard>,
    pub hard: Vec<Flashcard>,
    pub definition: Vec<Flashcard>,
    pub application: Vec<Flashcard>,
    pub analysis: Vec<Flashcard>,
}

const CARD_FORMAT: &str = "[
    {
        \"id\": \"card_1\",
        \"question\": \"Clear, specific question\",
        \"answer\": \"Complete, accurate answer\",
        \"difficulty\": \"easy|medium|hard\",
        \"category\": \"concept|definition|application|analysis\",
        \"tags\": [\"tag1\", \"tag2\"]
    }
]";

/// Cards from a reply that is either a bare array or `{"flashcards": [...]}`.
fn cards_from_reply(value: &Value) -> Option<Vec<Flashcard>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => value.get("flashcards")?.as_array()?,
        _ => return None,
    };

    Some(
        object_items(items)
            .into_iter()
            .map(|(i, card)| Flashcard {
                id: str_or(card, "id", &format!("card_{}", i + 1)),
                question: str_or(card, "question", "Question not available"),
                answer: str_or(card, "answer", "Answer not available"),
                difficulty: difficulty_or_medium(card, "difficulty"),
                category: card
                    .get("category")
                    .and_then(Value::as_str)
                    .and_then(CardCategory::parse)
                    .unwrap_or_default(),
                tags: string_list(card, "tags"),
            })
            .collect(),
    )
}

struct ChunkCardsSpec<'a> {
    chunk: &'a str,
    count: usize,
}

impl PromptSpec for ChunkCardsSpec<'_> {
    type Output = Vec<Flashcard>;

    fn name(&self) -> &'static str {
        "flashcard"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create {} flashcards from this text:

TEXT: {}

Create diverse question types:
1. Definition questions (\"What is...?\")
2. Application questions (\"How would you...?\")
3. Comparison questions (\"What's the difference between...?\")
4. Analysis questions (\"Why does...?\")

Format as JSON array:
{}

Make questions specific and answers comprehensive but concise.",
            self.count, self.chunk, CARD_FORMAT
        )
    }

    fn validate(&self, value: Value) -> Option<Vec<Flashcard>> {
        cards_from_reply(&value)
    }

    fn fallback(&self) -> Vec<Flashcard> {
        capitalized_phrases(self.chunk)
            .into_iter()
            .take(self.count)
            .enumerate()
            .map(|(i, concept)| Flashcard {
                id: format!("fallback_card_{}", i + 1),
                question: format!("What is {}?", concept),
                answer: format!(
                    "{} is a key concept from the document that requires further study.",
                    concept
                ),
                difficulty: Difficulty::Medium,
                category: CardCategory::Definition,
                tags: vec!["fallback".to_string(), concept.to_lowercase()],
            })
            .collect()
    }
}

struct AdditionalCardsSpec<'a> {
    text: &'a str,
    count: usize,
}

impl PromptSpec for AdditionalCardsSpec<'_> {
    type Output = Vec<Flashcard>;

    fn name(&self) -> &'static str {
        "flashcard.additional"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create {} additional flashcards focusing on review and synthesis:

TEXT: {}...

Focus on:
1. Review questions that connect multiple concepts
2. Synthesis questions that require combining ideas
3. Application questions for real-world scenarios
4. Critical thinking questions

Format as JSON array:
{}",
            self.count,
            truncate_chars(self.text, 2000),
            CARD_FORMAT
        )
    }

    fn validate(&self, value: Value) -> Option<Vec<Flashcard>> {
        cards_from_reply(&value)
    }

    fn fallback(&self) -> Vec<Flashcard> {
        Vec::new()
    }
}

/// Generates study flashcards chunk by chunk.
#[derive(Clone)]
pub struct FlashcardAgent {
    runner: PromptAgent,
    chunker: TextChunker,
}

impl FlashcardAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self {
            runner,
            chunker: TextChunker::new(CHUNK_SIZE, CHUNK_OVERLAP).unwrap_or_default(),
        }
    }

    /// Up to `num_cards` cards. Each chunk contributes its share; a single
    /// top-up request covers any shortfall.
    pub async fn create_flashcards(&self, text: &str, num_cards: usize) -> Vec<Flashcard> {
        if num_cards == 0 {
            return Vec::new();
        }

        let chunks = self.chunker.chunk(text);
        let per_chunk = (num_cards / chunks.len()).max(1);
        debug!(chunks = chunks.len(), per_chunk, "generating flashcards");

        let mut cards = Vec::new();
        for chunk in &chunks {
            let spec = ChunkCardsSpec {
                chunk: chunk.as_str(),
                count: per_chunk,
            };
            cards.extend(self.runner.run(&spec).await);
        }

        if cards.len() > num_cards {
            cards.truncate(num_cards);
        } else if cards.len() < num_cards {
            let spec = AdditionalCardsSpec {
                text,
                count: num_cards - cards.len(),
            };
            cards.extend(self.runner.run(&spec).await);
            cards.truncate(num_cards);
        }

        cards
    }
}

pub fn categorize_flashcards(cards: &[Flashcard]) -> CategorizedFlashcards {
    let mut grouped = CategorizedFlashcards::default();

    for card in cards {
        match card.difficulty {
            Difficulty::Easy => grouped.easy.push(card.clone()),
            Difficulty::Medium => grouped.medium.push(card.clone()),
            Difficulty::Hard => grouped.hard.push(card.clone()),
        }
        match card.category {
            CardCategory::Definition => grouped.definition.push(card.clone()),
            CardCategory::Application => grouped.application.push(card.clone()),
            CardCategory::Analysis => grouped.analysis.push(card.clone()),
            CardCategory::Concept => {}
        }
    }

    grouped
}
