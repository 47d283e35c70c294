//! Check pipeline orchestration.
//!
//! One check run is a single synchronous pass: extract text from the PDF,
//! chunk it, build the per-run TF-IDF index, retrieve the chunks most
//! relevant to the active task prompt, call the model with that context,
//! parse a score out of the answer, and append a history row. The index
//! lives and dies with the run — nothing is cached across documents,
//! since every document gets its own vocabulary.
//!
//! Failure gates: empty extracted text stops the run before chunking, and
//! a failed model call stops it before the history append — a row is only
//! written for a completed check, never with a fabricated score.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::chunk::chunk_text;
use crate::company::{guess_company_name, UNKNOWN_COMPANY};
use crate::config::Config;
use crate::extract::extract_text;
use crate::history::{append_history, history_path};
use crate::index::build_index;
use crate::llm::call_with_context;
use crate::models::{CheckMode, CheckReport, HistoryRecord};
use crate::prompts::load_prompts;
use crate::retrieve::retrieve_top_k;
use crate::score::parse_score;

/// System prompt for the criteria evaluation task.
const CRITERIA_SYSTEM_PROMPT: &str = concat!(
    "あなたは日本の中小企業向け補助金（例：ものづくり補助金）の審査員AIです。",
    "与えられたコンテキスト（申請書抜粋）に基づき、評価基準に沿って厳格に判定します。",
    "出力はできる限り JSON 形式で返してください。"
);

/// System prompt for the proofreading task.
const TYPO_SYSTEM_PROMPT: &str = concat!(
    "あなたは日本語文書の校正AIです。誤字脱字、表記ゆれ、数値・単位の不整合、社名・人名の不一致、",
    "日付の矛盾などを、コンテキスト（申請書抜粋）に基づいて検出し、提案を返してください。",
    "出力は可能なら JSON 形式にしてください。"
);

/// Per-run options on top of the loaded configuration.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub mode: CheckMode,
    /// Company name override; guessed from the document when absent.
    pub company: Option<String>,
    /// Model override; falls back to `OPENAI_MODEL`, then config.
    pub model: Option<String>,
    /// Skip the history append (e.g. dry evaluation runs).
    pub record_history: bool,
}

/// Run the full check pipeline for one PDF.
pub async fn check_document(
    config: &Config,
    pdf_path: &Path,
    opts: &CheckOptions,
) -> Result<CheckReport> {
    let bytes = fs::read(pdf_path)
        .with_context(|| format!("Failed to read PDF file: {}", pdf_path.display()))?;

    let text = extract_text(&bytes)?;
    if text.trim().is_empty() {
        bail!(
            "No text could be extracted from {} — a scanned PDF without \
             embedded text needs OCR before it can be checked",
            pdf_path.display()
        );
    }

    let company_name = opts
        .company
        .clone()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| guess_company_name(&text))
        .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());

    let chunks = chunk_text(&text, config.chunking.max_chars, config.chunking.overlap)?;
    info!(
        chunks = chunks.len(),
        chars = text.chars().count(),
        "document segmented"
    );

    let index = build_index(&chunks)?;

    let prompts = load_prompts(&config.data.dir);
    let (task_prompt, system_prompt) = match opts.mode {
        CheckMode::Criteria => (prompts.criteria_prompt, CRITERIA_SYSTEM_PROMPT),
        CheckMode::Typo => (prompts.typo_prompt, TYPO_SYSTEM_PROMPT),
    };

    // Retrieval query: the head of the active task prompt.
    let query: String = task_prompt
        .chars()
        .take(config.retrieval.query_chars)
        .collect();
    let retrieved = retrieve_top_k(&query, &index, &chunks, config.retrieval.top_k);
    info!(
        retrieved = retrieved.len(),
        vocab = index.vocab_size(),
        "context selected"
    );

    let response = call_with_context(
        &config.model,
        system_prompt,
        &task_prompt,
        &retrieved,
        opts.model.as_deref(),
    )
    .await?;

    let score = parse_score(&response);
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let report = CheckReport {
        timestamp: timestamp.clone(),
        company_name: company_name.clone(),
        mode: opts.mode,
        chunk_count: chunks.len(),
        retrieved,
        response,
        score,
    };

    if opts.record_history {
        let record = HistoryRecord {
            timestamp,
            company_name,
            score,
            mode: opts.mode.label().to_string(),
            filename: pdf_filename(pdf_path),
        };
        append_history(&history_path(&config.data.dir), &record)?;
        info!("history row appended");
    }

    Ok(report)
}

/// CLI entry point — runs the check and prints the report.
pub async fn run_check(
    config: &Config,
    pdf_path: &Path,
    opts: &CheckOptions,
    output: Option<&Path>,
) -> Result<()> {
    let report = check_document(config, pdf_path, opts).await?;

    let title = match report.mode {
        CheckMode::Criteria => "審査項目チェック結果",
        CheckMode::Typo => "誤字脱字・整合性チェック結果",
    };

    println!("--- {} ---", title);
    println!("company: {}", report.company_name);
    println!("file:    {}", pdf_filename(pdf_path));
    println!("chunks:  {}", report.chunk_count);
    println!(
        "score:   {}",
        report
            .score
            .map(|s| format!("{} 点", s))
            .unwrap_or_else(|| "-".to_string())
    );
    println!();

    // Pretty-print structured output when the model honored the JSON ask.
    match serde_json::from_str::<serde_json::Value>(&report.response) {
        Ok(value) => {
            println!("--- Result (JSON) ---");
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Err(_) => {
            println!("--- Result ---");
            println!("{}", report.response);
        }
    }
    println!();

    println!("--- Context handed to the model (top {}) ---", report.retrieved.len());
    for (rank, hit) in report.retrieved.iter().enumerate() {
        println!("[{}] chunk #{} (score {:.3})", rank + 1, hit.index, hit.score);
        println!("{}", hit.text);
        println!();
    }

    if let Some(path) = output {
        fs::write(path, &report.response)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        println!("Result written to {}", path.display());
    }

    if opts.record_history {
        println!("Recorded to history ({}).", history_path(&config.data.dir).display());
    }

    Ok(())
}

fn pdf_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Create the data directory with default prompts and an empty history
/// file. Idempotent — existing files are left untouched.
pub fn run_init(config: &Config) -> Result<()> {
    use crate::history::HEADER;
    use crate::prompts::{prompts_path, save_prompts, Prompts};

    fs::create_dir_all(&config.data.dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.data.dir.display()
        )
    })?;

    if !prompts_path(&config.data.dir).exists() {
        save_prompts(&config.data.dir, &Prompts::default())?;
    }

    let history = history_path(&config.data.dir);
    if !history.exists() {
        fs::write(&history, format!("{}\n", HEADER))?;
    }

    println!("Data directory initialized at {}", config.data.dir.display());
    Ok(())
}
