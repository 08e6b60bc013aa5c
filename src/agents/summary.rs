use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use super::heuristics::{leading_summary, sentences};
use super::schema::truncate_chars;
use super::{PromptAgent, PromptSpec, TextSpec};

const SYSTEM_PROMPT: &str = "You are an expert at creating comprehensive summaries of documents.

Create summaries that are:
1. Accurate and comprehensive
2. Well-structured with clear sections
3. Appropriate for the target length
4. Include key points, concepts, and takeaways

Maintain the original meaning while making content accessible.";

const MAX_CHAPTERS: usize = 5;
const MIN_CHAPTER_CHARS: usize = 100;
const FALLBACK_BULLETS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub chapter: String,
    pub title: String,
    pub summary: String,
}

/// The four summary variants produced for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummaries {
    pub one_page: String,
    pub five_page: String,
    pub bullet_points: Vec<String>,
    pub chapters: Vec<ChapterSummary>,
}

struct OnePageSpec<'a> {
    text: &'a str,
}

impl TextSpec for OnePageSpec<'_> {
    fn name(&self) -> &'static str {
        "summary.one_page"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create a concise 1-page summary of this document:

TEXT: {}...

The summary should:
1. Capture the main ideas and themes
2. Include key concepts and conclusions
3. Be approximately 300-400 words
4. Be well-structured with clear paragraphs

Focus on the most important information that someone needs to understand the document.",
            truncate_chars(self.text, 3000)
        )
    }

    fn fallback(&self) -> String {
        leading_summary(self.text, 400)
    }
}

struct DetailedSpec<'a> {
    text: &'a str,
}

impl TextSpec for DetailedSpec<'_> {
    fn name(&self) -> &'static str {
        "summary.five_page"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create a comprehensive 5-page summary of this document:

TEXT: {}...

The summary should:
1. Include detailed explanations of all major concepts
2. Provide context and background information
3. Include examples and illustrations where relevant
4. Be approximately 1200-1500 words
5. Be organized into clear sections with headings

This should be a thorough analysis that covers all important aspects.",
            truncate_chars(self.text, 4000)
        )
    }

    fn max_tokens(&self) -> Option<u32> {
        Some(3000)
    }

    fn fallback(&self) -> String {
        leading_summary(self.text, 1500)
    }
}

struct BulletSpec<'a> {
    text: &'a str,
}

impl PromptSpec for BulletSpec<'_> {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "summary.bullet_points"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Create a bullet-point summary of this document:

TEXT: {}...

Provide 10-15 key bullet points that capture:
1. Main topics and themes
2. Important concepts and definitions
3. Key conclusions or findings
4. Notable examples or case studies

Format as a JSON array of strings:
[\"bullet point 1\", \"bullet point 2\"]",
            truncate_chars(self.text, 2000)
        )
    }

    fn validate(&self, value: Value) -> Option<Vec<String>> {
        let items = match &value {
            Value::Array(items) => items,
            Value::Object(_) => value.get("bullet_points")?.as_array()?,
            _ => return None,
        };
        let bullets: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(String::from)
            .collect();
        (!bullets.is_empty()).then_some(bullets)
    }

    fn fallback(&self) -> Vec<String> {
        sentences(self.text).into_iter().take(FALLBACK_BULLETS).collect()
    }
}

struct ChapterSpec<'a> {
    section: &'a str,
}

impl TextSpec for ChapterSpec<'_> {
    fn name(&self) -> &'static str {
        "summary.chapter"
    }

    fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    fn prompt(&self) -> String {
        format!(
            "Summarize this section of the document:

SECTION: {}...

Provide a summary that includes:
1. Main topic of this section
2. Key points covered
3. Important concepts introduced

Keep it concise but comprehensive (100-200 words).",
            truncate_chars(self.section, 1000)
        )
    }

    fn fallback(&self) -> String {
        leading_summary(self.section, 150)
    }
}

fn chapter_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?m)(Chapter \d+|Section \d+|Part \d+|^\d+\.)").expect("chapter marker pattern")
    })
}

/// Split text at chapter markers, each part starting with its marker. Text
/// with fewer than three parts is cut into thirds instead.
pub fn split_chapters(text: &str) -> Vec<&str> {
    let mut bounds: Vec<usize> = chapter_marker().find_iter(text).map(|m| m.start()).collect();
    if bounds.first() != Some(&0) {
        bounds.insert(0, 0);
    }
    bounds.push(text.len());

    let parts: Vec<&str> = bounds
        .windows(2)
        .map(|w| &text[w[0]..w[1]])
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() >= 3 {
        return parts;
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let third = chars.len() / 3;
    if third == 0 {
        return if text.is_empty() { Vec::new() } else { vec![text] };
    }
    chars
        .chunks(third)
        .map(|chunk| {
            let start = chunk[0].0;
            let (last_idx, last_char) = chunk[chunk.len() - 1];
            &text[start..last_idx + last_char.len_utf8()]
        })
        .collect()
}

/// Produces the one-page, five-page, bullet and per-chapter summaries.
#[derive(Clone)]
pub struct SummaryAgent {
    runner: PromptAgent,
}

impl SummaryAgent {
    pub fn new(runner: PromptAgent) -> Self {
        Self { runner }
    }

    pub async fn generate_summaries(&self, text: &str) -> DocumentSummaries {
        let one_page = OnePageSpec { text };
        let five_page = DetailedSpec { text };
        let bullets = BulletSpec { text };

        let (one_page, five_page, bullet_points, chapters) = tokio::join!(
            self.runner.run_text(&one_page),
            self.runner.run_text(&five_page),
            self.runner.run(&bullets),
            self.chapter_summaries(text),
        );

        DocumentSummaries {
            one_page,
            five_page,
            bullet_points,
            chapters,
        }
    }

    pub async fn chapter_summaries(&self, text: &str) -> Vec<ChapterSummary> {
        let sections: Vec<(usize, &str)> = split_chapters(text)
            .into_iter()
            .take(MAX_CHAPTERS)
            .enumerate()
            .filter(|(_, part)| part.trim().chars().count() >= MIN_CHAPTER_CHARS)
            .collect();

        join_all(sections.into_iter().map(|(i, section)| async move {
            let title = chapter_marker()
                .find(section.trim_start())
                .filter(|m| m.start() == 0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| format!("Section {}", i + 1));
            let spec = ChapterSpec { section };
            let summary = self.runner.run_text(&spec).await;
            ChapterSummary {
                chapter: format!("Section {}", i + 1),
                title,
                summary,
            }
        }))
        .await
    }
}
