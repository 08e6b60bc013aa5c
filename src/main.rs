use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};
use walkdir::WalkDir;

use study_material_builder::agents::assessment::{Quiz, StudentPerformance, DEFAULT_QUESTION_COUNT};
use study_material_builder::agents::flashcard::DEFAULT_CARD_COUNT;
use study_material_builder::agents::tutor::DifficultyLevel;
use study_material_builder::agents::Difficulty;
use study_material_builder::parser::{key_phrases, DocumentExtractor, FileType};
use study_material_builder::{Config, StudyProcessor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// LLM API endpoint
    #[arg(short = 'e', long, global = true)]
    endpoint: Option<String>,

    /// LLM model name
    #[arg(short = 'm', long, global = true)]
    model: Option<String>,

    /// Output directory for saved results
    #[arg(short = 'd', long, global = true)]
    output_dir: Option<String>,

    /// Also write the result to <output-dir>/<command>.json
    #[arg(long, global = true)]
    save: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from files or directories without calling the LLM
    Extract { paths: Vec<PathBuf> },
    /// Upload a document and extract its key concepts
    Upload { file: PathBuf },
    /// Build a knowledge tree for a document
    Graph { file: PathBuf },
    /// Explain one knowledge tree node
    NodeDetails { file: PathBuf, node_id: String },
    /// Generate one-page, five-page, bullet and chapter summaries
    Summary { file: PathBuf },
    /// Generate flashcards for a document
    Flashcards {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_CARD_COUNT)]
        count: usize,
    },
    /// Simplify a document's concepts and build analogies
    Simplify { file: PathBuf },
    /// Suggest a study plan for a document's topics
    StudyPlan {
        file: PathBuf,
        #[arg(long, default_value = "intermediate")]
        level: DifficultyLevel,
    },
    /// Ask the tutor a question
    Tutor {
        question: String,
        #[arg(long)]
        context: Option<String>,
    },
    /// Generate practice problems on a topic
    Practice {
        topic: String,
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Get feedback on an answer
    Feedback {
        question: String,
        student_answer: String,
        correct_answer: String,
    },
    /// Generate a quiz on a topic
    Quiz {
        topic: String,
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        #[arg(long, default_value_t = DEFAULT_QUESTION_COUNT)]
        count: usize,
    },
    /// Generate a quiz adapted to past performance
    AdaptiveQuiz {
        topic: String,
        #[arg(long, default_value_t = 75.0)]
        average_score: f64,
        #[arg(long = "weak-area")]
        weak_areas: Vec<String>,
    },
    /// Grade a quiz file against an answers file ({"q1": "answer", ...})
    Grade { quiz: PathBuf, answers: PathBuf },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Extract { .. } => "extract",
            Command::Upload { .. } => "upload",
            Command::Graph { .. } => "graph",
            Command::NodeDetails { .. } => "node_details",
            Command::Summary { .. } => "summary",
            Command::Flashcards { .. } => "flashcards",
            Command::Simplify { .. } => "simplify",
            Command::StudyPlan { .. } => "study_plan",
            Command::Tutor { .. } => "tutor",
            Command::Practice { .. } => "practice",
            Command::Feedback { .. } => "feedback",
            Command::Quiz { .. } => "quiz",
            Command::AdaptiveQuiz { .. } => "adaptive_quiz",
            Command::Grade { .. } => "grade",
        }
    }
}

#[derive(Debug, Serialize)]
struct ExtractedFile {
    path: String,
    file_type: FileType,
    page_count: usize,
    chunk_count: usize,
    word_count: usize,
    key_phrases: Vec<String>,
}

/// Supported files under each path, directories walked recursively
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && FileType::from_path(entry.path()).is_ok() {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files
}

fn extract_files(extractor: &DocumentExtractor, paths: &[PathBuf]) -> Vec<ExtractedFile> {
    let files = collect_files(paths);
    info!(files = files.len(), "extracting documents");

    let mut extracted = Vec::new();
    for file in files {
        match extractor.extract(&file) {
            Ok(document) => extracted.push(ExtractedFile {
                path: file.display().to_string(),
                file_type: document.file_type,
                page_count: document.page_count,
                chunk_count: document.chunks.len(),
                word_count: document.word_count(),
                key_phrases: key_phrases(&document.raw_text),
            }),
            Err(e) => warn!(path = %file.display(), error = %e, "skipping file"),
        }
    }
    extracted
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn emit<T: Serialize>(output: &T, name: &str, save_to: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(output)?;
    println!("{}", rendered);

    if let Some(dir) = save_to {
        std::fs::create_dir_all(dir)?;
        let output_file = dir.join(format!("{}.json", name));
        std::fs::write(&output_file, &rendered)?;
        info!(path = %output_file.display(), "results saved");
    }
    Ok(())
}

async fn run(command: Command, config: &Config, save_to: Option<&Path>) -> Result<()> {
    let name = command.name();

    if let Command::Extract { paths } = &command {
        let extractor = DocumentExtractor::new(config.chunker()?);
        return emit(&extract_files(&extractor, paths), name, save_to);
    }

    let processor = StudyProcessor::from_config(config)?;

    match command {
        Command::Extract { .. } => Ok(()),
        Command::Upload { file } => emit(&processor.upload(&file).await?, name, save_to),
        Command::Graph { file } => {
            let id = processor.ingest(&file).await?;
            emit(&processor.generate_graph(&id).await?, name, save_to)
        }
        Command::NodeDetails { file, node_id } => {
            let id = processor.ingest(&file).await?;
            emit(&processor.node_details(&id, &node_id).await?, name, save_to)
        }
        Command::Summary { file } => {
            let id = processor.ingest(&file).await?;
            emit(&processor.generate_summary(&id).await?, name, save_to)
        }
        Command::Flashcards { file, count } => {
            let id = processor.ingest(&file).await?;
            emit(&processor.generate_flashcards(&id, count).await?, name, save_to)
        }
        Command::Simplify { file } => {
            let id = processor.ingest(&file).await?;
            emit(&processor.simplify(&id).await?, name, save_to)
        }
        Command::StudyPlan { file, level } => {
            let id = processor.ingest(&file).await?;
            emit(&processor.study_plan(&id, level).await?, name, save_to)
        }
        Command::Tutor { question, context } => emit(
            &processor.tutor(&question, context.as_deref()).await,
            name,
            save_to,
        ),
        Command::Practice {
            topic,
            difficulty,
            count,
        } => emit(
            &processor.practice_problems(&topic, difficulty, count).await,
            name,
            save_to,
        ),
        Command::Feedback {
            question,
            student_answer,
            correct_answer,
        } => emit(
            &processor
                .answer_feedback(&student_answer, &correct_answer, &question)
                .await,
            name,
            save_to,
        ),
        Command::Quiz {
            topic,
            difficulty,
            count,
        } => emit(
            &processor.generate_quiz(&topic, difficulty, count).await,
            name,
            save_to,
        ),
        Command::AdaptiveQuiz {
            topic,
            average_score,
            weak_areas,
        } => {
            let performance = StudentPerformance {
                average_score,
                weak_areas,
            };
            emit(
                &processor.adaptive_quiz(&topic, &performance).await,
                name,
                save_to,
            )
        }
        Command::Grade { quiz, answers } => {
            let quiz: Quiz = read_json(&quiz)?;
            let answers: HashMap<String, String> = read_json(&answers)?;
            emit(&processor.grade_quiz(&quiz, &answers).await, name, save_to)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(endpoint) = &args.endpoint {
        config.llm.endpoint = endpoint.clone();
        config.llm.get_url()?;
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output.output_dir = output_dir.clone();
    }

    let level = config
        .processing
        .log_level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let save_to = args.save.then(|| PathBuf::from(&config.output.output_dir));
    if let Err(e) = run(args.command, &config, save_to.as_deref()).await {
        error!(error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}
