use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extraction::Concept;
use super::schema::{objects, str_or, truncate_chars};
use super::{PromptAgent, PromptSpec};

const SYSTEM_PROMPT: &str = "You are an expert at simplifying complex concepts. Your task is to take complex academic or technical content and make it accessible to a general audience.

For each concept, provide:
1. Simple explanation in plain language
2. Real-world examples or analogies
3. Key takeaways
4. Common misconceptions to avoid

Make explanations clear, engaging, and easy to understand.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedConcept {
    pub original_term: String,
    pub original_definition: String,
    pub simple_explanation: String,
    pub analogy: String,
    pub key_takeaway: String,
    pub misconception: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analogy {
    pub analogy: String,
    pub connection: String,
    pub clarifies: String,
}

struct SimplifySpec<'a> {
    concept: &'a Concept,
}

impl SimplifySpec<'_> {
    fn term(&self) -> &str {
        if self.concept.term.is_empty() {
            "Unknown"
        } else {
            &self.concept.term
        }
    }
}

impl PromptSpec for SimplifySpec<'_> {
    type Output = SimplifiedConcept;

    fn name(&self) -> &'static str {
        "simplifier"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        let definition = if self.concept.definition.is_empty() {
            "No definition provided"
        } else {
            &self.concept.definition
        };
        format!(
            "Simplify this concept for easy understanding:

CONCEPT: {}
DEFINITION: {}

Please provide:
1. Simple explanation (2-3 sentences)
2. Real-world analogy or example
3. Key takeaway (1 sentence)
4. Common misconception (if any)

Respond in JSON format:
{{
    \"term\": \"concept_name\",
    \"simple_explanation\": \"easy explanation...\",
    \"analogy\": \"real-world example...\",
    \"key_takeaway\": \"main point...\",
    \"misconception\": \"common mistake...\"
}}",
            self.term(),
            definition
        )
    }

    fn validate(&self, value: Value) -> Option<SimplifiedConcept> {
        if !value.is_object() {
            return None;
        }
        Some(SimplifiedConcept {
            original_term: self.term().to_string(),
            original_definition: self.concept.definition.clone(),
            simple_explanation: str_or(&value, "simple_explanation", ""),
            analogy: str_or(&value, "analogy", ""),
            key_takeaway: str_or(&value, "key_takeaway", ""),
            misconception: str_or(&value, "misconception", ""),
        })
    }

    fn fallback(&self) -> SimplifiedConcept {
        let term = self.term();
        SimplifiedConcept {
            original_term: term.to_string(),
            original_definition: self.concept.definition.clone(),
            simple_explanation: format!("This concept relates to {}.", term),
            analogy: "Think of it like a basic building block in this subject.".to_string(),
            key_takeaway: format!("Understanding {} is important for the overall topic.", term),
            misconception: "No common misconceptions identified.".to_string(),
        }
    }
}

struct AnalogySpec<'a> {
    text: &'a str,
    topic: &'a str,
}

impl PromptSpec for AnalogySpec<'_> {
    type Output = Vec<Analogy>;

    fn name(&self) -> &'static str {
        "simplifier.analogies"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create 3-5 helpful analogies to explain this topic: {}

Context: {}

For each analogy, provide:
- The analogy itself
- How it relates to the concept
- What it helps clarify

Respond in JSON format:
{{
    \"analogies\": [
        {{
            \"analogy\": \"description of analogy\",
            \"connection\": \"how it relates\",
            \"clarifies\": \"what it explains\"
        }}
    ]
}}",
            self.topic,
            truncate_chars(self.text, 1000)
        )
    }

    fn validate(&self, value: Value) -> Option<Vec<Analogy>> {
        value.get("analogies")?.as_array()?;
        Some(
            objects(&value, "analogies")
                .into_iter()
                .map(|(_, item)| Analogy {
                    analogy: str_or(item, "analogy", ""),
                    connection: str_or(item, "connection", ""),
                    clarifies: str_or(item, "clarifies", ""),
                })
                .collect(),
        )
    }

    fn fallback(&self) -> Vec<Analogy> {
        vec![Analogy {
            analogy: format!(
                "Think of {} like a puzzle - each piece fits together to create the complete picture.",
                self.topic
            ),
            connection: "Each concept builds on others".to_string(),
            clarifies: "How different parts work together".to_string(),
        }]
    }
}

/// Rewrites concepts in plain language and invents analogies for them.
#[derive(Clone)]
pub struct SimplifierAgent {
    runner: PromptAgent,
}

impl SimplifierAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self { runner }
    }

    /// One simplified entry per concept, in input order
    pub async fn simplify_concepts(&self, concepts: &[Concept]) -> Vec<SimplifiedConcept> {
        let mut simplified = Vec::with_capacity(concepts.len());
        for concept in concepts {
            simplified.push(self.runner.run(&SimplifySpec { concept }).await);
        }
        simplified
    }

    pub async fn create_analogies(&self, text: &str, topic: &str) -> Vec<Analogy> {
        self.runner.run(&AnalogySpec { text, topic }).await
    }
}
