//! Per-chapter orchestration: filter, prompt, complete, parse, merge.
//!
//! A chapter run is a single-shot batch job. Every intermediate product is
//! persisted to the output directory before the next stage runs, so a
//! failed run leaves behind everything up to the failing stage for
//! inspection. The input knowledge base is never modified; the merged
//! result is written as a separate `final_partial_kb.json`.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::Value;

use crate::error::{ChroniclerResult, IoError, OracleError};
use crate::extraction::parse_extraction;
use crate::kb::{ChapterToken, KnowledgeBase};
use crate::merge::merge;
use crate::oracle::{Oracle, RequestParams};
use crate::prompt::build_prompt;

// Artifact names, in the order they are produced.
pub const FILTERED_KB_FILE: &str = "filtered_kb.json";
pub const FINAL_PROMPT_FILE: &str = "final_prompt.txt";
pub const LLM_RESPONSE_FILE: &str = "llm_response.txt";
pub const LLM_RAW_OUTPUT_FILE: &str = "llm_raw_output.txt";
pub const PARSED_OUTPUT_FILE: &str = "parsed_output.json";
pub const FINAL_PARTIAL_KB_FILE: &str = "final_partial_kb.json";

/// What a successful chapter run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Chapter identifier the oracle detected.
    pub chapter: ChapterToken,
    /// Known entities found verbatim in the chapter text.
    pub matched: usize,
    /// Entities in the merged partial knowledge base.
    pub extracted: usize,
}

/// Process one chapter end to end.
///
/// Blocking throughout; the only long pause is the oracle call. Any failure
/// is fatal for the run — nothing is retried, and stages after the failure
/// point write no artifacts.
pub fn run_chapter<O: Oracle + ?Sized>(
    oracle: &O,
    params: RequestParams,
    chapter_file: &Path,
    kb_file: &Path,
    output_dir: &Path,
) -> ChroniclerResult<RunSummary> {
    let started = Instant::now();

    fs::create_dir_all(output_dir).map_err(|source| IoError::CreateDir {
        path: output_dir.display().to_string(),
        source,
    })?;

    let chapter_text = read_input(chapter_file)?;
    let kb = KnowledgeBase::load(kb_file)?;
    tracing::info!(
        chapter_chars = chapter_text.len(),
        known_entities = kb.len(),
        "inputs loaded"
    );

    let filtered = kb.filter(&chapter_text);
    tracing::info!(matched = filtered.len(), "filtered knowledge base");
    filtered.save(&output_dir.join(FILTERED_KB_FILE))?;

    let prompt = build_prompt(&chapter_text, &filtered);
    write_text(&prompt, &output_dir.join(FINAL_PROMPT_FILE))?;

    let reply = oracle.complete(&prompt, params.max_tokens, params.temperature)?;

    // Response artifacts go to disk before the content is judged, so an
    // empty or unparseable reply can still be inspected afterwards.
    write_json(&reply.document, &output_dir.join(LLM_RESPONSE_FILE))?;
    write_text(&reply.content, &output_dir.join(LLM_RAW_OUTPUT_FILE))?;
    if reply.content.is_empty() {
        return Err(OracleError::EmptyResponse.into());
    }

    let extraction = parse_extraction(&reply.content)?;
    write_json(extraction.document(), &output_dir.join(PARSED_OUTPUT_FILE))?;
    tracing::info!(
        chapter = %extraction.chapter,
        entities = extraction.entities.len(),
        "oracle output parsed"
    );

    let merged = merge(&kb, &extraction)?;
    merged.save(&output_dir.join(FINAL_PARTIAL_KB_FILE))?;

    let summary = RunSummary {
        chapter: extraction.chapter.clone(),
        matched: filtered.len(),
        extracted: merged.len(),
    };
    tracing::info!(
        chapter = %summary.chapter,
        extracted = summary.extracted,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "chapter run complete"
    );
    Ok(summary)
}

fn read_input(path: &Path) -> Result<String, IoError> {
    if !path.is_file() {
        return Err(IoError::NotFound {
            path: path.display().to_string(),
        });
    }
    fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn write_text(text: &str, path: &Path) -> Result<(), IoError> {
    tracing::debug!(path = %path.display(), "writing artifact");
    fs::write(path, text).map_err(|source| IoError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn write_json(value: &Value, path: &Path) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value).expect("JSON value is always serializable");
    write_text(&(json + "\n"), path)
}
