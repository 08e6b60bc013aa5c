use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::schema::{
    difficulty_or_medium, non_empty_array, object_items, objects, str_or, string_list, u32_or,
    Difficulty,
};
use super::{PromptAgent, PromptSpec};

const SYSTEM_PROMPT: &str = "You are an expert AI tutor. Your role is to help students understand complex topics through:

1. Clear, step-by-step explanations
2. Relevant examples and analogies
3. Practice questions and exercises
4. Encouraging and supportive guidance
5. Adaptive responses based on student needs

Always:
- Break down complex concepts into simpler parts
- Provide multiple ways to understand the same concept
- Encourage active learning through questions
- Be patient and supportive
- Offer practice opportunities";

pub const TUTOR_ANSWER: &str = "tutor_answer";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "beginner" => Some(DifficultyLevel::Beginner),
            "intermediate" => Some(DifficultyLevel::Intermediate),
            "advanced" => Some(DifficultyLevel::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DifficultyLevel::parse(s).ok_or_else(|| format!("unknown level: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeQuestion {
    pub question: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorAnswer {
    pub explanation: String,
    pub examples: Vec<String>,
    pub practice_questions: Vec<PracticeQuestion>,
    pub tips: Vec<String>,
    pub summary: Vec<String>,
    pub difficulty_level: DifficultyLevel,
    pub related_topics: Vec<String>,
    pub response_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeProblem {
    pub id: String,
    pub question: String,
    pub hint: String,
    pub solution: String,
    pub difficulty: Difficulty,
    pub concepts_tested: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub correct_aspects: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub suggestions: Vec<String>,
    pub encouragement: String,
    pub score: String,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyStep {
    pub topic: String,
    pub order: u32,
    pub estimated_time: String,
    pub activities: Vec<String>,
    pub checkpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub study_sequence: Vec<StudyStep>,
    pub total_time_estimate: String,
    pub review_schedule: Vec<String>,
    pub tips: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct AnswerSpec<'a> {
    question: &'a str,
    context: Option<&'a str>,
}

impl PromptSpec for AnswerSpec<'_> {
    type Output = TutorAnswer;

    fn name(&self) -> &'static str {
        "tutor"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        let context = self
            .context
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("\nCONTEXT: {}", c))
            .unwrap_or_default();

        format!(
            "A student asks: \"{}\"
{}

Provide a comprehensive tutoring response that includes:

1. EXPLANATION: Clear, step-by-step explanation
2. EXAMPLES: Relevant examples or analogies
3. PRACTICE: 2-3 practice questions for the student
4. TIPS: Study tips or memory aids
5. SUMMARY: Key takeaways (2-3 bullet points)

Format as JSON:
{{
    \"explanation\": \"detailed explanation...\",
    \"examples\": [\"example1\", \"example2\"],
    \"practice_questions\": [
        {{\"question\": \"practice question\", \"hint\": \"helpful hint\"}}
    ],
    \"tips\": [\"tip1\", \"tip2\"],
    \"summary\": [\"key point 1\", \"key point 2\"],
    \"difficulty_level\": \"beginner|intermediate|advanced\",
    \"related_topics\": [\"topic1\", \"topic2\"]
}}

Make the response engaging and educational.",
            self.question, context
        )
    }

    fn validate(&self, value: Value) -> Option<TutorAnswer> {
        if !value.is_object() {
            return None;
        }

        let practice_questions = objects(&value, "practice_questions")
            .into_iter()
            .map(|(_, item)| PracticeQuestion {
                question: str_or(item, "question", ""),
                hint: str_or(item, "hint", ""),
            })
            .collect();

        Some(TutorAnswer {
            explanation: str_or(&value, "explanation", "I can help explain this concept."),
            examples: string_list(&value, "examples"),
            practice_questions,
            tips: string_list(&value, "tips"),
            summary: string_list(&value, "summary"),
            difficulty_level: value
                .get("difficulty_level")
                .and_then(Value::as_str)
                .and_then(DifficultyLevel::parse)
                .unwrap_or_default(),
            related_topics: string_list(&value, "related_topics"),
            response_type: TUTOR_ANSWER.to_string(),
        })
    }

    fn fallback(&self) -> TutorAnswer {
        let question = self.question;
        TutorAnswer {
            explanation: format!(
                "This is an interesting question about {}. Let me help you understand this concept step by step.",
                question
            ),
            examples: strings(&["Let me provide some examples to illustrate this concept."]),
            practice_questions: vec![PracticeQuestion {
                question: format!("Can you think of a real-world application of {}?", question),
                hint: "Consider everyday situations".to_string(),
            }],
            tips: strings(&[
                "Break down complex problems into smaller parts",
                "Practice regularly to reinforce understanding",
            ]),
            summary: strings(&[
                "Understanding this concept is important for your learning",
                "Practice will help solidify your knowledge",
            ]),
            difficulty_level: DifficultyLevel::Intermediate,
            related_topics: strings(&["foundational concepts"]),
            response_type: TUTOR_ANSWER.to_string(),
        }
    }
}

struct ProblemsSpec<'a> {
    topic: &'a str,
    difficulty: Difficulty,
    count: usize,
}

impl PromptSpec for ProblemsSpec<'_> {
    type Output = Vec<PracticeProblem>;

    fn name(&self) -> &'static str {
        "tutor.practice_problems"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Generate {} practice problems for the topic: {}
Difficulty level: {}

Create problems that:
1. Test understanding of key concepts
2. Require application of knowledge
3. Are appropriate for the difficulty level
4. Include helpful hints
5. Have clear, correct solutions

Format as JSON:
{{
    \"problems\": [
        {{
            \"id\": \"prob_1\",
            \"question\": \"problem statement\",
            \"hint\": \"helpful hint\",
            \"solution\": \"step-by-step solution\",
            \"difficulty\": \"easy|medium|hard\",
            \"concepts_tested\": [\"concept1\", \"concept2\"]
        }}
    ]
}}",
            self.count, self.topic, self.difficulty
        )
    }

    fn validate(&self, value: Value) -> Option<Vec<PracticeProblem>> {
        let items = non_empty_array(&value, "problems")?;
        let problems: Vec<PracticeProblem> = object_items(items)
            .into_iter()
            .map(|(i, item)| PracticeProblem {
                id: str_or(item, "id", &format!("prob_{}", i + 1)),
                question: str_or(item, "question", ""),
                hint: str_or(item, "hint", ""),
                solution: str_or(item, "solution", ""),
                difficulty: difficulty_or_medium(item, "difficulty"),
                concepts_tested: string_list(item, "concepts_tested"),
            })
            .collect();
        (!problems.is_empty()).then_some(problems)
    }

    fn fallback(&self) -> Vec<PracticeProblem> {
        (0..self.count)
            .map(|i| PracticeProblem {
                id: format!("fallback_prob_{}", i + 1),
                question: format!("Explain the key aspects of {} and provide an example.", self.topic),
                hint: "Think about the main characteristics and real-world applications".to_string(),
                solution: format!(
                    "Consider the fundamental principles of {} and how they apply in practice.",
                    self.topic
                ),
                difficulty: Difficulty::Medium,
                concepts_tested: vec![self.topic.to_string()],
            })
            .collect()
    }
}

struct FeedbackSpec<'a> {
    student_answer: &'a str,
    correct_answer: &'a str,
    question: &'a str,
}

impl PromptSpec for FeedbackSpec<'_> {
    type Output = AnswerFeedback;

    fn name(&self) -> &'static str {
        "tutor.feedback"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Provide constructive feedback on this student answer:

QUESTION: {}
STUDENT ANSWER: {}
CORRECT ANSWER: {}

Provide feedback that includes:
1. What the student got right
2. Areas for improvement
3. Specific suggestions for better understanding
4. Encouragement

Format as JSON:
{{
    \"correct_aspects\": [\"what they got right\"],
    \"areas_for_improvement\": [\"what needs work\"],
    \"suggestions\": [\"specific advice\"],
    \"encouragement\": \"positive message\",
    \"score\": \"percentage or grade\",
    \"next_steps\": [\"what to study next\"]
}}",
            self.question, self.student_answer, self.correct_answer
        )
    }

    fn validate(&self, value: Value) -> Option<AnswerFeedback> {
        if !value.is_object() {
            return None;
        }
        Some(AnswerFeedback {
            correct_aspects: string_list(&value, "correct_aspects"),
            areas_for_improvement: string_list(&value, "areas_for_improvement"),
            suggestions: string_list(&value, "suggestions"),
            encouragement: str_or(&value, "encouragement", ""),
            score: str_or(&value, "score", ""),
            next_steps: string_list(&value, "next_steps"),
        })
    }

    fn fallback(&self) -> AnswerFeedback {
        AnswerFeedback {
            correct_aspects: strings(&["You're thinking about this topic"]),
            areas_for_improvement: strings(&["Consider reviewing the key concepts"]),
            suggestions: strings(&["Practice more examples", "Review the fundamental principles"]),
            encouragement: "Keep working at it! Understanding comes with practice.".to_string(),
            score: "Needs more work".to_string(),
            next_steps: strings(&["Review the material", "Try more practice problems"]),
        }
    }
}

struct StudyPlanSpec<'a> {
    topics: &'a [String],
    level: DifficultyLevel,
}

impl PromptSpec for StudyPlanSpec<'_> {
    type Output = StudyPlan;

    fn name(&self) -> &'static str {
        "tutor.study_plan"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create a study plan for these topics: {}
Student level: {}

Create a structured plan with:
1. Learning sequence (what to study first)
2. Time estimates for each topic
3. Recommended resources or activities
4. Milestones and checkpoints
5. Review schedule

Format as JSON:
{{
    \"study_sequence\": [
        {{
            \"topic\": \"topic name\",
            \"order\": 1,
            \"estimated_time\": \"2 hours\",
            \"activities\": [\"activity1\", \"activity2\"],
            \"checkpoint\": \"what to verify you learned\"
        }}
    ],
    \"total_time_estimate\": \"X hours\",
    \"review_schedule\": [\"when to review\"],
    \"tips\": [\"study tips\"]
}}",
            self.topics.join(", "),
            self.level.as_str()
        )
    }

    fn validate(&self, value: Value) -> Option<StudyPlan> {
        value.get("study_sequence")?.as_array()?;
        let study_sequence = objects(&value, "study_sequence")
            .into_iter()
            .map(|(i, item)| StudyStep {
                topic: str_or(item, "topic", ""),
                order: u32_or(item, "order", i as u32 + 1),
                estimated_time: str_or(item, "estimated_time", ""),
                activities: string_list(item, "activities"),
                checkpoint: str_or(item, "checkpoint", ""),
            })
            .collect();

        Some(StudyPlan {
            study_sequence,
            total_time_estimate: str_or(&value, "total_time_estimate", ""),
            review_schedule: string_list(&value, "review_schedule"),
            tips: string_list(&value, "tips"),
        })
    }

    fn fallback(&self) -> StudyPlan {
        StudyPlan {
            study_sequence: self
                .topics
                .iter()
                .enumerate()
                .map(|(i, topic)| StudyStep {
                    topic: topic.clone(),
                    order: i as u32 + 1,
                    estimated_time: "1-2 hours".to_string(),
                    activities: strings(&["Read and understand", "Practice problems"]),
                    checkpoint: format!("Can explain {} clearly", topic),
                })
                .collect(),
            total_time_estimate: format!("{} hours", self.topics.len() * 2),
            review_schedule: strings(&["Review after 1 day", "Review after 1 week"]),
            tips: strings(&["Take breaks", "Practice actively", "Ask questions"]),
        }
    }
}

/// Answers student questions and builds practice material.
#[derive(Clone)]
pub struct TutorAgent {
    runner: PromptAgent,
}

impl TutorAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self { runner }
    }

    pub async fn answer_question(&self, question: &str, context: Option<&str>) -> TutorAnswer {
        self.runner.run(&AnswerSpec { question, context }).await
    }

    pub async fn generate_practice_problems(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<PracticeProblem> {
        self.runner
            .run(&ProblemsSpec {
                topic,
                difficulty,
                count,
            })
            .await
    }

    pub async fn provide_feedback(
        &self,
        student_answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> AnswerFeedback {
        self.runner
            .run(&FeedbackSpec {
                student_answer,
                correct_answer,
                question,
            })
            .await
    }

    pub async fn suggest_study_plan(&self, topics: &[String], level: DifficultyLevel) -> StudyPlan {
        self.runner.run(&StudyPlanSpec { topics, level }).await
    }
}
