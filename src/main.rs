//! # plancheck CLI
//!
//! The `plancheck` binary reviews business-plan PDFs against two task
//! types — scored criteria evaluation and proofreading — using lexical
//! retrieval-augmented generation, and keeps an append-only history of
//! every check.
//!
//! ## Usage
//!
//! ```bash
//! plancheck --config ./config/plancheck.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `plancheck init` | Create the data directory, default prompts, and history file |
//! | `plancheck check <pdf>` | Run a check against the uploaded PDF |
//! | `plancheck history` | List past checks with filters and a score trend |
//! | `plancheck prompt show/set/reset` | Inspect or edit the task prompts |
//!
//! ## Examples
//!
//! ```bash
//! # Scored evaluation with defaults
//! plancheck check keikaku.pdf
//!
//! # Proofreading with a specific model and tighter chunks
//! plancheck check keikaku.pdf --mode typo --model gpt-4o --max-chars 800
//!
//! # History for one company, with the score trend
//! plancheck history --company 株式会社テスト工業 --trend
//! ```
//!
//! The OpenAI API key is read from `OPENAI_API_KEY`; the model defaults
//! to `OPENAI_MODEL` or the configured name.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use plancheck::check::{run_check, run_init, CheckOptions};
use plancheck::config;
use plancheck::history::{run_history, HistoryFilter};
use plancheck::models::CheckMode;
use plancheck::prompts::{run_prompt_reset, run_prompt_set, run_prompt_show};

/// plancheck — business-plan PDF review via lexical RAG.
#[derive(Parser)]
#[command(
    name = "plancheck",
    about = "Business-plan PDF review via lexical retrieval-augmented generation",
    version,
    long_about = "plancheck extracts text from a business-plan PDF, selects the passages most \
    relevant to the active review task with a per-document TF-IDF index, and asks a language \
    model for a structured evaluation or proofreading report. Every completed check is appended \
    to a CSV history."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional — all settings have working defaults. See
    /// `config/plancheck.example.toml` for a full example.
    #[arg(long, global = true, default_value = "./config/plancheck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory.
    ///
    /// Creates the data directory, the default prompt file, and an empty
    /// history CSV. Idempotent — existing files are left untouched.
    Init,

    /// Run a check against a PDF.
    ///
    /// Extracts the document text, retrieves the passages most relevant
    /// to the active task prompt, and asks the model for a structured
    /// report. The result is printed and appended to the history.
    Check {
        /// Path to the PDF file to review.
        pdf: PathBuf,

        /// Check type: `criteria` (scored evaluation) or `typo`
        /// (proofreading and consistency).
        #[arg(long, default_value = "criteria")]
        mode: String,

        /// Company name. Guessed from the document text when omitted.
        #[arg(long)]
        company: Option<String>,

        /// Model override (otherwise `OPENAI_MODEL` or the config default).
        #[arg(long)]
        model: Option<String>,

        /// Chunks handed to the model as context.
        #[arg(long)]
        top_k: Option<usize>,

        /// Maximum chunk length in characters.
        #[arg(long)]
        max_chars: Option<usize>,

        /// Overlap between adjacent chunks in characters.
        #[arg(long)]
        overlap: Option<usize>,

        /// Write the raw model output to this file as well.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Do not append a history row for this run.
        #[arg(long)]
        no_history: bool,
    },

    /// List past checks.
    ///
    /// Shows the append-only history with optional filters; `--trend`
    /// adds the score progression for criteria checks.
    History {
        /// Exact company name to filter by.
        #[arg(long)]
        company: Option<String>,

        /// Check type to filter by: `criteria` or `typo`.
        #[arg(long)]
        mode: Option<String>,

        /// Substring of the filename to filter by.
        #[arg(long)]
        filename: Option<String>,

        /// Also print the score trend for criteria checks.
        #[arg(long)]
        trend: bool,
    },

    /// Inspect or edit the task prompts.
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },
}

/// Prompt management subcommands.
#[derive(Subcommand)]
enum PromptAction {
    /// Print one prompt (`criteria` or `typo`), or both.
    Show {
        /// Which prompt to print; both when omitted.
        which: Option<String>,
    },
    /// Replace a prompt with the contents of a text file.
    Set {
        /// Which prompt to replace: `criteria` or `typo`.
        which: String,
        /// File holding the new prompt text.
        #[arg(long)]
        file: PathBuf,
    },
    /// Restore the built-in default prompts.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            run_init(&cfg)?;
        }
        Commands::Check {
            pdf,
            mode,
            company,
            model,
            top_k,
            max_chars,
            overlap,
            output,
            no_history,
        } => {
            // Re-validate after CLI overrides; an overlap override must
            // still respect the max_chars bound.
            if let Some(k) = top_k {
                cfg.retrieval.top_k = k;
            }
            if let Some(m) = max_chars {
                cfg.chunking.max_chars = m;
            }
            if let Some(o) = overlap {
                cfg.chunking.overlap = o;
            }
            config::validate(&cfg)?;

            let opts = CheckOptions {
                mode: CheckMode::parse(&mode)?,
                company,
                model,
                record_history: !no_history,
            };
            run_check(&cfg, &pdf, &opts, output.as_deref()).await?;
        }
        Commands::History {
            company,
            mode,
            filename,
            trend,
        } => {
            let filter = HistoryFilter {
                company,
                mode: mode
                    .as_deref()
                    .map(CheckMode::parse)
                    .transpose()?
                    .map(|m| m.label().to_string()),
                filename,
            };
            run_history(&cfg.data.dir, &filter, trend)?;
        }
        Commands::Prompt { action } => match action {
            PromptAction::Show { which } => {
                run_prompt_show(&cfg.data.dir, which.as_deref())?;
            }
            PromptAction::Set { which, file } => {
                run_prompt_set(&cfg.data.dir, &which, &file)?;
            }
            PromptAction::Reset => {
                run_prompt_reset(&cfg.data.dir)?;
            }
        },
    }

    Ok(())
}
