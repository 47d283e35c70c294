//! Editable task-prompt store.
//!
//! The two task prompts (criteria evaluation, proofreading) live in
//! `prompts.json` under the data directory so reviewers can tune them
//! without rebuilding. A missing or unreadable file falls back to the
//! built-in defaults; `plancheck prompt` edits and resets the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The pair of task prompts used by the check pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompts {
    pub criteria_prompt: String,
    pub typo_prompt: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            criteria_prompt: concat!(
                "あなたは日本の中小企業向け補助金（例：ものづくり補助金）の審査員です。",
                "以下の申請書コンテキストを根拠に、審査観点に沿って評価し、次の JSON 形式で返答してください。\n\n",
                "【審査観点（例）】\n",
                "- 技術面: 新規性/独自性（0-10）、優位性の根拠（0-10）、実現性（0-10）\n",
                "- 事業面: 市場性/顧客提供価値（0-10）、売上・付加価値の数値計画（0-10）\n",
                "- 体制面: 実施体制・スケジュール・リスク管理（0-10）\n",
                "- 政策適合: 政策目的との整合性、地域/雇用/賃上げ等（0-10）\n",
                "合計スコアは0-100点で、60=標準、70=採択ボーダー、80+=高評価の目安。\n\n",
                "【出力JSONフォーマット】\n",
                "{\n",
                "  \"score\": <0-100の整数>,\n",
                "  \"summary\": \"全体総評（200-400字）\",\n",
                "  \"strengths\": [\"強み1\", \"強み2\"],\n",
                "  \"weaknesses\": [\"弱み1\", \"弱み2\"],\n",
                "  \"risks\": [\"リスク1\", \"リスク2\"],\n",
                "  \"missing_items\": [\"不足資料/不記載の可能性\", \"...\"],\n",
                "  \"recommendations\": [\"改善提案1\", \"改善提案2\"]\n",
                "}\n",
                "根拠は要点を短く示し、推測は避け、コンテキストに無い事項は『不明』と記載してください。"
            )
            .to_string(),
            typo_prompt: concat!(
                "以下の申請書コンテキストを校正してください。誤字脱字、表記ゆれ、単位や数値の不整合、",
                "社名・商品名・人名の不一致、日付/年度の矛盾、表/本文の齟齬、ページまたぎでの用語ゆれなどを検出し、",
                "次の JSON 形式で返答してください。\n\n",
                "{\n",
                "  \"issues\": [\n",
                "    {\n",
                "      \"type\": \"誤字/表記ゆれ/数値矛盾 など\",\n",
                "      \"excerpt\": \"問題箇所の短い抜粋\",\n",
                "      \"detail\": \"何が問題か（できる限り具体的に）\",\n",
                "      \"suggestion\": \"どう直すべきかの提案\"\n",
                "    }\n",
                "  ],\n",
                "  \"summary\": \"全体所感（100-200字）\"\n",
                "}\n",
                "コンテキストに無い情報での断定はせず、『不明』と明記してください。"
            )
            .to_string(),
        }
    }
}

/// Location of the prompt file under the data directory.
pub fn prompts_path(data_dir: &Path) -> PathBuf {
    data_dir.join("prompts.json")
}

/// Load prompts, falling back to the defaults when the file is missing
/// or cannot be parsed.
pub fn load_prompts(data_dir: &Path) -> Prompts {
    let path = prompts_path(data_dir);
    match fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Prompts::default(),
    }
}

/// Write prompts as pretty JSON, creating the data directory if needed.
pub fn save_prompts(data_dir: &Path, prompts: &Prompts) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    let path = prompts_path(data_dir);
    let content = serde_json::to_string_pretty(prompts)?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write prompts file: {}", path.display()))?;
    Ok(())
}

/// CLI entry point — print one or both prompts.
pub fn run_prompt_show(data_dir: &Path, which: Option<&str>) -> Result<()> {
    let prompts = load_prompts(data_dir);
    match which {
        Some("criteria") => println!("{}", prompts.criteria_prompt),
        Some("typo") => println!("{}", prompts.typo_prompt),
        Some(other) => anyhow::bail!("Unknown prompt: {}. Use criteria or typo.", other),
        None => {
            println!("--- criteria ---");
            println!("{}", prompts.criteria_prompt);
            println!();
            println!("--- typo ---");
            println!("{}", prompts.typo_prompt);
        }
    }
    Ok(())
}

/// CLI entry point — replace one prompt with the contents of a file.
pub fn run_prompt_set(data_dir: &Path, which: &str, file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read prompt file: {}", file.display()))?;
    if content.trim().is_empty() {
        anyhow::bail!("Prompt file is empty: {}", file.display());
    }

    let mut prompts = load_prompts(data_dir);
    match which {
        "criteria" => prompts.criteria_prompt = content,
        "typo" => prompts.typo_prompt = content,
        other => anyhow::bail!("Unknown prompt: {}. Use criteria or typo.", other),
    }
    save_prompts(data_dir, &prompts)?;
    println!("Prompt '{}' updated.", which);
    Ok(())
}

/// CLI entry point — restore the built-in prompts.
pub fn run_prompt_reset(data_dir: &Path) -> Result<()> {
    save_prompts(data_dir, &Prompts::default())?;
    println!("Prompts reset to defaults.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_prompts(tmp.path()), Prompts::default());
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let prompts = Prompts {
            criteria_prompt: "新しい審査プロンプト".to_string(),
            typo_prompt: "新しい校正プロンプト".to_string(),
        };
        save_prompts(tmp.path(), &prompts).unwrap();
        assert_eq!(load_prompts(tmp.path()), prompts);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(prompts_path(tmp.path()), "{ not json").unwrap();
        assert_eq!(load_prompts(tmp.path()), Prompts::default());
    }

    #[test]
    fn test_defaults_mention_score_format() {
        let prompts = Prompts::default();
        assert!(prompts.criteria_prompt.contains("\"score\""));
        assert!(prompts.typo_prompt.contains("\"issues\""));
    }
}
