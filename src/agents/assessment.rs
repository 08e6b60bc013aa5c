//! Quiz generation and grading.
//!
//! A [`Quiz`] is ungraded until [`AssessmentAgent::grade_quiz`] turns it and a
//! set of answers into a [`GradeReport`]. Objective questions are graded
//! locally; short answers go to the model with a fixed 50% fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::schema::{
    difficulty_or_medium, non_empty_array, number, object_items, str_or, string_list, string_list_or, u32_or,
    Difficulty,
};
use super::{PromptAgent, PromptSpec};

const SYSTEM_PROMPT: &str = "You are an expert at creating educational assessments and quizzes.

Create assessments that:
1. Test understanding at appropriate levels
2. Include various question types (MCQ, short answer, essay)
3. Are fair and unbiased
4. Provide clear, correct answers
5. Include explanations for learning

Adapt difficulty based on student performance and provide constructive feedback.";

pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const DEFAULT_TIME_LIMIT: &str = "30 minutes";
const DEFAULT_POINTS: u32 = 10;
const ADAPTIVE_QUESTION_COUNT: usize = 10;
const MANUAL_REVIEW: &str = "Unable to grade automatically. Please review manually.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    ShortAnswer,
    TrueFalse,
}

impl QuestionType {
    /// Unknown types (essay, fill-in) are free-form and graded like short
    /// answers.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "multiple_choice" | "mcq" => QuestionType::MultipleChoice,
            "true_false" => QuestionType::TrueFalse,
            _ => QuestionType::ShortAnswer,
        }
    }

    pub fn is_objective(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        QuestionType::parse(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_points() -> u32 {
    DEFAULT_POINTS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz_title: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub total_points: u32,
    #[serde(default = "default_time_limit")]
    pub time_limit: String,
    pub questions: Vec<QuizQuestion>,
}

fn default_time_limit() -> String {
    DEFAULT_TIME_LIMIT.to_string()
}

/// Model verdict on one short answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerGrade {
    pub score_percentage: f64,
    pub feedback: String,
    pub correct_aspects: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question_id: String,
    pub question: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub points_earned: u32,
    pub points_possible: u32,
    pub feedback: String,
    pub explanation: String,
}

impl QuestionFeedback {
    pub fn is_fully_correct(&self) -> bool {
        self.points_earned == self.points_possible
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub total_points: u64,
    pub earned_points: u64,
    pub percentage: f64,
    pub grade: String,
    pub detailed_feedback: Vec<QuestionFeedback>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

/// Past results used to pick the next quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPerformance {
    #[serde(default = "default_average_score")]
    pub average_score: f64,
    #[serde(default)]
    pub weak_areas: Vec<String>,
}

fn default_average_score() -> f64 {
    75.0
}

impl Default for StudentPerformance {
    fn default() -> Self {
        Self {
            average_score: default_average_score(),
            weak_areas: Vec::new(),
        }
    }
}

pub fn letter_grade(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "A"
    } else if percentage >= 80.0 {
        "B"
    } else if percentage >= 70.0 {
        "C"
    } else if percentage >= 60.0 {
        "D"
    } else {
        "F"
    }
}

pub fn difficulty_for_score(average_score: f64) -> Difficulty {
    if average_score >= 85.0 {
        Difficulty::Hard
    } else if average_score >= 70.0 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

fn mentions(entry: &QuestionFeedback, word: &str) -> bool {
    entry.question.to_lowercase().contains(word)
}

pub fn identify_strengths(feedback: &[QuestionFeedback]) -> Vec<String> {
    let correct: Vec<&QuestionFeedback> = feedback.iter().filter(|f| f.is_fully_correct()).collect();
    let mut strengths = Vec::new();

    if correct.len() as f64 > feedback.len() as f64 * 0.7 {
        strengths.push("Strong overall understanding of the topic".to_string());
    }
    if correct.iter().any(|f| mentions(f, "definition")) {
        strengths.push("Good grasp of key definitions".to_string());
    }
    if correct.iter().any(|f| mentions(f, "application")) {
        strengths.push("Able to apply concepts effectively".to_string());
    }

    if strengths.is_empty() {
        strengths.push("Completed the assessment".to_string());
    }
    strengths
}

pub fn identify_weaknesses(feedback: &[QuestionFeedback]) -> Vec<String> {
    let incorrect: Vec<&QuestionFeedback> =
        feedback.iter().filter(|f| !f.is_fully_correct()).collect();
    let mut weaknesses = Vec::new();

    if incorrect.len() as f64 > feedback.len() as f64 * 0.5 {
        weaknesses.push("Review fundamental concepts".to_string());
    }
    if incorrect.iter().any(|f| mentions(f, "application")) {
        weaknesses.push("Practice applying concepts to real situations".to_string());
    }
    if incorrect.iter().any(|f| mentions(f, "analysis")) {
        weaknesses.push("Work on analytical thinking skills".to_string());
    }

    if weaknesses.is_empty() {
        weaknesses.push("Continue practicing to maintain understanding".to_string());
    }
    weaknesses
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

struct QuizSpec<'a> {
    topic: &'a str,
    difficulty: Difficulty,
    count: usize,
}

impl PromptSpec for QuizSpec<'_> {
    type Output = Quiz;

    fn name(&self) -> &'static str {
        "assessment"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create a {difficulty} difficulty quiz on: {topic}
Number of questions: {count}

Include a mix of question types:
- Multiple choice (60%)
- Short answer (30%)
- True/False (10%)

For each question provide:
1. Question text
2. Options (for MCQ)
3. Correct answer
4. Explanation of why the answer is correct
5. Points value

Format as JSON:
{{
    \"quiz_title\": \"Quiz on {topic}\",
    \"difficulty\": \"{difficulty}\",
    \"total_points\": 100,
    \"time_limit\": \"30 minutes\",
    \"questions\": [
        {{
            \"id\": \"q1\",
            \"type\": \"multiple_choice|short_answer|true_false\",
            \"question\": \"question text\",
            \"options\": [\"A\", \"B\", \"C\", \"D\"],
            \"correct_answer\": \"correct answer\",
            \"explanation\": \"why this is correct\",
            \"points\": 10,
            \"difficulty\": \"easy|medium|hard\"
        }}
    ]
}}

Only multiple choice questions carry options.",
            difficulty = self.difficulty,
            topic = self.topic,
            count = self.count,
        )
    }

    fn validate(&self, value: Value) -> Option<Quiz> {
        let items = non_empty_array(&value, "questions")?;

        let questions: Vec<QuizQuestion> = object_items(items)
            .into_iter()
            .map(|(i, q)| {
                let question_type = q
                    .get("type")
                    .and_then(Value::as_str)
                    .map(QuestionType::parse)
                    .unwrap_or_default();
                let options = (question_type == QuestionType::MultipleChoice)
                    .then(|| string_list_or(q, "options", &["A", "B", "C", "D"]));

                QuizQuestion {
                    id: str_or(q, "id", &format!("q{}", i + 1)),
                    question_type,
                    question: str_or(q, "question", "Question not available"),
                    options,
                    correct_answer: str_or(q, "correct_answer", "Answer not available"),
                    explanation: str_or(q, "explanation", "Explanation not available"),
                    points: u32_or(q, "points", DEFAULT_POINTS),
                    difficulty: difficulty_or_medium(q, "difficulty"),
                }
            })
            .collect();
        if questions.is_empty() {
            return None;
        }

        let default_total = questions.len() as u32 * DEFAULT_POINTS;
        Some(Quiz {
            quiz_title: str_or(&value, "quiz_title", "Quiz"),
            difficulty: difficulty_or_medium(&value, "difficulty"),
            total_points: u32_or(&value, "total_points", default_total),
            time_limit: str_or(&value, "time_limit", DEFAULT_TIME_LIMIT),
            questions,
        })
    }

    fn fallback(&self) -> Quiz {
        let topic = self.topic;
        let questions: Vec<QuizQuestion> = (0..self.count)
            .map(|i| {
                let id = format!("q{}", i + 1);
                match i % 3 {
                    0 => QuizQuestion {
                        id,
                        question_type: QuestionType::TrueFalse,
                        question: format!("Statement about {} (True or False)", topic),
                        options: None,
                        correct_answer: "True".to_string(),
                        explanation: format!("This relates to key concepts in {}", topic),
                        points: 10,
                        difficulty: self.difficulty,
                    },
                    1 => QuizQuestion {
                        id,
                        question_type: QuestionType::ShortAnswer,
                        question: format!("Explain a key concept related to {}", topic),
                        options: None,
                        correct_answer: format!("Key concept explanation for {}", topic),
                        explanation: format!("This tests understanding of {}", topic),
                        points: 15,
                        difficulty: self.difficulty,
                    },
                    _ => QuizQuestion {
                        id,
                        question_type: QuestionType::MultipleChoice,
                        question: format!("Which of the following best describes {}?", topic),
                        options: Some(
                            ["Option A", "Option B", "Option C", "Option D"]
                                .iter()
                                .map(|s| s.to_string())
                                .collect(),
                        ),
                        correct_answer: "Option A".to_string(),
                        explanation: format!(
                            "This is the correct answer because it accurately describes {}",
                            topic
                        ),
                        points: 10,
                        difficulty: self.difficulty,
                    },
                }
            })
            .collect();

        Quiz {
            quiz_title: format!("Quiz on {}", topic),
            difficulty: self.difficulty,
            total_points: questions.iter().map(|q| q.points).sum(),
            time_limit: DEFAULT_TIME_LIMIT.to_string(),
            questions,
        }
    }
}

struct ShortAnswerSpec<'a> {
    question: &'a str,
    correct_answer: &'a str,
    student_answer: &'a str,
}

impl PromptSpec for ShortAnswerSpec<'_> {
    type Output = ShortAnswerGrade;

    fn name(&self) -> &'static str {
        "assessment.short_answer"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Grade this short answer question:

QUESTION: {}
CORRECT ANSWER: {}
STUDENT ANSWER: {}

Provide:
1. Score percentage (0-100)
2. Feedback explaining the grade
3. What the student got right
4. What could be improved

Format as JSON:
{{
    \"score_percentage\": 85,
    \"feedback\": \"Good answer, but missing...\",
    \"correct_aspects\": [\"what they got right\"],
    \"improvements\": [\"what could be better\"]
}}",
            self.question, self.correct_answer, self.student_answer
        )
    }

    fn validate(&self, value: Value) -> Option<ShortAnswerGrade> {
        let score = number(&value, "score_percentage")?;
        Some(ShortAnswerGrade {
            score_percentage: score.clamp(0.0, 100.0),
            feedback: str_or(&value, "feedback", ""),
            correct_aspects: string_list(&value, "correct_aspects"),
            improvements: string_list(&value, "improvements"),
        })
    }

    fn fallback(&self) -> ShortAnswerGrade {
        ShortAnswerGrade {
            score_percentage: 50.0,
            feedback: MANUAL_REVIEW.to_string(),
            correct_aspects: vec!["Attempted the question".to_string()],
            improvements: vec!["Review the topic and try again".to_string()],
        }
    }
}

/// Creates quizzes and grades completed ones.
#[derive(Clone)]
pub struct AssessmentAgent {
    runner: PromptAgent,
}

impl AssessmentAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self { runner }
    }

    pub async fn create_quiz(&self, topic: &str, difficulty: Difficulty, num_questions: usize) -> Quiz {
        self.runner
            .run(&QuizSpec {
                topic,
                difficulty,
                count: num_questions,
            })
            .await
    }

    /// Ten questions on the first weak area, at a difficulty matched to the
    /// average score.
    pub async fn create_adaptive_quiz(&self, topic: &str, performance: &StudentPerformance) -> Quiz {
        let difficulty = difficulty_for_score(performance.average_score);
        let focus = performance
            .weak_areas
            .first()
            .map(String::as_str)
            .unwrap_or(topic);
        self.create_quiz(focus, difficulty, ADAPTIVE_QUESTION_COUNT).await
    }

    pub async fn grade_short_answer(
        &self,
        question: &str,
        correct_answer: &str,
        student_answer: &str,
    ) -> ShortAnswerGrade {
        self.runner
            .run(&ShortAnswerSpec {
                question,
                correct_answer,
                student_answer,
            })
            .await
    }

    /// Grade every question; a missing answer counts as the empty string.
    pub async fn grade_quiz(&self, quiz: &Quiz, answers: &HashMap<String, String>) -> GradeReport {
        let mut total_points: u64 = 0;
        let mut earned_points: u64 = 0;
        let mut detailed_feedback = Vec::with_capacity(quiz.questions.len());

        for question in &quiz.questions {
            let student_answer = answers.get(&question.id).map(String::as_str).unwrap_or("");
            total_points += u64::from(question.points);

            let (points_earned, feedback) = if question.question_type.is_objective() {
                let correct = student_answer.trim().to_lowercase()
                    == question.correct_answer.trim().to_lowercase();
                if correct {
                    (question.points, "Correct!".to_string())
                } else {
                    (
                        0,
                        format!("Incorrect. The correct answer is: {}", question.correct_answer),
                    )
                }
            } else {
                let grade = self
                    .grade_short_answer(&question.question, &question.correct_answer, student_answer)
                    .await;
                let earned = (question.points as f64 * grade.score_percentage / 100.0).floor() as u32;
                (earned, grade.feedback)
            };

            earned_points += u64::from(points_earned);
            detailed_feedback.push(QuestionFeedback {
                question_id: question.id.clone(),
                question: question.question.clone(),
                student_answer: student_answer.to_string(),
                correct_answer: question.correct_answer.clone(),
                points_earned,
                points_possible: question.points,
                feedback,
                explanation: question.explanation.clone(),
            });
        }

        let percentage = if total_points > 0 {
            earned_points as f64 / total_points as f64 * 100.0
        } else {
            0.0
        };

        GradeReport {
            total_points,
            earned_points,
            percentage: round_one_decimal(percentage),
            grade: letter_grade(percentage).to_string(),
            strengths: identify_strengths(&detailed_feedback),
            areas_for_improvement: identify_weaknesses(&detailed_feedback),
            detailed_feedback,
        }
    }
}
