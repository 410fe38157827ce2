//! Parsing the oracle's raw output into a chapter extraction.
//!
//! The contract is strict: the output must already be valid JSON. There is
//! no repair pass and no lenient extraction — a reply wrapped in markdown
//! fences or prefixed with commentary is rejected, so drift in the model's
//! output discipline is caught immediately rather than papered over.

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::kb::ChapterToken;

/// One chapter's worth of oracle output.
///
/// Entity values are kept as raw JSON on purpose: the schema contract
/// (every entity carries a `description`) is enforced at merge time, where
/// the field is actually dereferenced, not here.
#[derive(Debug, Clone)]
pub struct ChapterExtraction {
    /// Chapter identifier as detected by the oracle; `null` when absent.
    pub chapter: ChapterToken,
    /// Entity name → raw record value.
    pub entities: Map<String, Value>,
    document: Value,
}

impl ChapterExtraction {
    /// The full parsed document, for the `parsed_output.json` artifact.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

/// Parse raw oracle content as a chapter extraction.
pub fn parse_extraction(raw: &str) -> Result<ChapterExtraction, ParseError> {
    let document: Value = serde_json::from_str(raw).map_err(|err| ParseError::InvalidJson {
        message: err.to_string(),
    })?;
    let root = document.as_object().ok_or(ParseError::NotAnObject)?;

    let chapter = ChapterToken::from(root.get("chapterNumber").cloned().unwrap_or(Value::Null));
    let entities = match root.get("entities") {
        None => Map::new(),
        Some(Value::Object(entities)) => entities.clone(),
        Some(_) => return Err(ParseError::EntitiesNotAnObject),
    };

    Ok(ChapterExtraction {
        chapter,
        entities,
        document,
    })
}
