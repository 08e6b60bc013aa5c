use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Output;

const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9";

async fn run_cli(args: &[&str]) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_study_material_builder"))
        .args(args)
        .env("LLM_ENDPOINT", UNREACHABLE_ENDPOINT)
        .env("LLM_TIMEOUT_SECS", "5")
        .env("LOG_LEVEL", "warn")
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_extract_saves_results() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("sample.txt")
        .write_file(std::path::Path::new("tests/data/sample.txt"))
        .unwrap();

    let output = run_cli(&[
        "-d",
        temp.path().to_str().unwrap(),
        "--save",
        "extract",
        temp.child("sample.txt").path().to_str().unwrap(),
    ])
    .await;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(predicate::str::contains("\"file_type\": \"txt\"").eval(&stdout));

    let saved = temp.child("extract.json");
    saved.assert(predicate::path::exists());
    saved.assert(predicate::str::contains("Mitochondria"));
    saved.assert(predicate::str::contains("\"page_count\": 1"));
}

#[tokio::test]
async fn test_extract_skips_unsupported_files() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("docs").create_dir_all().unwrap();
    temp.child("docs/sample.txt")
        .write_file(std::path::Path::new("tests/data/sample.txt"))
        .unwrap();
    temp.child("docs/notes.docx").write_str("not supported").unwrap();

    let output = run_cli(&["extract", temp.child("docs").path().to_str().unwrap()]).await;
    assert!(output.status.success());

    let extracted: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = extracted.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0]["path"].as_str().unwrap().ends_with("sample.txt"));
    temp.child("extract.json").assert(predicate::path::missing());
}

#[tokio::test]
async fn test_quiz_falls_back_without_llm() {
    let output = run_cli(&["quiz", "Photosynthesis", "--count", "6", "--difficulty", "easy"]).await;
    assert!(output.status.success());

    let quiz: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(quiz["quiz_title"], "Quiz on Photosynthesis");
    assert_eq!(quiz["difficulty"], "easy");
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 6);
    assert_eq!(quiz["total_points"], 70);
}

#[tokio::test]
async fn test_grade_objective_quiz() {
    let temp = assert_fs::TempDir::new().unwrap();
    let quiz = temp.child("quiz.json");
    quiz.write_str(
        r#"{
            "quiz_title": "Cells",
            "total_points": 20,
            "questions": [
                {"id": "q1", "type": "true_false", "question": "Cells divide.", "correct_answer": "True", "points": 10},
                {"id": "q2", "type": "multiple_choice", "question": "Pick the organelle", "options": ["Mitochondria", "Wall"], "correct_answer": "Mitochondria", "points": 10}
            ]
        }"#,
    )
    .unwrap();
    let answers = temp.child("answers.json");
    answers.write_str(r#"{"q1": "true", "q2": "Wall"}"#).unwrap();

    let output = run_cli(&[
        "grade",
        quiz.path().to_str().unwrap(),
        answers.path().to_str().unwrap(),
    ])
    .await;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["earned_points"], 10);
    assert_eq!(report["percentage"], 50.0);
    assert_eq!(report["grade"], "F");
    assert_eq!(
        report["detailed_feedback"][1]["feedback"],
        "Incorrect. The correct answer is: Mitochondria"
    );
}

#[tokio::test]
async fn test_unsupported_upload_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("notes.docx");
    file.write_str("not supported").unwrap();

    let output = run_cli(&["upload", file.path().to_str().unwrap()]).await;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
