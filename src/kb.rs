//! Persistent knowledge base: entity records with chapter provenance.
//!
//! The knowledge base is a flat mapping from entity name to record. The name
//! is the sole identity — exact, case-sensitive match, no normalization.
//! "Anna" and "anna" are different entities; so are "Dr. Ray" and "Dr Ray".
//! Records track the chapter range over which an entity has been observed.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IoError;
use crate::matcher;

// ---------------------------------------------------------------------------
// Chapter token
// ---------------------------------------------------------------------------

/// Opaque chapter identifier as reported by the oracle.
///
/// The oracle detects the chapter number from the text itself and may report
/// it as an integer, a string, or not at all. The token is only ever compared
/// and propagated, never computed with; omission degenerates to JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterToken(Value);

impl ChapterToken {
    /// Token for a chapter the oracle failed to identify.
    pub fn missing() -> Self {
        ChapterToken(Value::Null)
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ChapterToken {
    fn from(value: Value) -> Self {
        ChapterToken(value)
    }
}

impl fmt::Display for ChapterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Null => write!(f, "?"),
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity record
// ---------------------------------------------------------------------------

/// One entity's accumulated state in the knowledge base.
///
/// `first_seen_chapter` is set once, when the record is first created, and
/// never decreases. `last_seen_chapter` is overwritten on every chapter in
/// which the entity reappears. `None` means the field was absent from the
/// stored record, which is distinct from an explicit JSON `null`: an absent
/// field adopts the current chapter at merge time, a `null` propagates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub description: String,
    #[serde(default, deserialize_with = "present_token")]
    pub first_seen_chapter: Option<ChapterToken>,
    #[serde(default, deserialize_with = "present_token")]
    pub last_seen_chapter: Option<ChapterToken>,
}

/// Deserializes a chapter field that is present, even as `null`, to `Some`.
/// Absent fields fall through to the `default` attribute and become `None`.
fn present_token<'de, D>(deserializer: D) -> Result<Option<ChapterToken>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    ChapterToken::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

/// Mapping from entity name to [`EntityRecord`].
///
/// Serialized as a plain JSON object. A `BTreeMap` keeps artifacts
/// deterministic; key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase(BTreeMap<String, EntityRecord>);

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a knowledge base from a JSON file.
    pub fn load(path: &Path) -> Result<Self, IoError> {
        if !path.is_file() {
            return Err(IoError::NotFound {
                path: path.display().to_string(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|err| IoError::MalformedKb {
            path: path.display().to_string(),
            message: err.to_string(),
        })
    }

    /// Write the knowledge base as pretty-printed JSON (2-space indent).
    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)
            .expect("knowledge base is always serializable");
        fs::write(path, json + "\n").map_err(|source| IoError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Restrict the knowledge base to entities that occur in `text` as
    /// whole words (case-sensitive). Returns a fresh copy — the filtered
    /// subset is serialized independently and must not alias this map.
    pub fn filter(&self, text: &str) -> KnowledgeBase {
        let matched = matcher::find_known_entities(text, self.names());
        KnowledgeBase(
            matched
                .into_iter()
                .filter_map(|name| {
                    self.0.get(&name).map(|record| (name, record.clone()))
                })
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&EntityRecord> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: String, record: EntityRecord) -> Option<EntityRecord> {
        self.0.insert(name, record)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EntityRecord)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(description: &str, first: Value, last: Value) -> EntityRecord {
        EntityRecord {
            description: description.into(),
            first_seen_chapter: Some(ChapterToken::from(first)),
            last_seen_chapter: Some(ChapterToken::from(last)),
        }
    }

    #[test]
    fn round_trips_through_json() {
        let mut kb = KnowledgeBase::new();
        kb.insert("Castle".into(), record("old fortress", json!(1), json!(4)));
        kb.insert("Sword".into(), record("shiny", json!("Prologue"), json!(2)));

        let json = serde_json::to_string(&kb).unwrap();
        let back: KnowledgeBase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kb);
    }

    #[test]
    fn absent_provenance_fields_deserialize_to_none() {
        let kb: KnowledgeBase =
            serde_json::from_str(r#"{"Castle": {"description": "old"}}"#).unwrap();
        let rec = kb.get("Castle").unwrap();
        assert_eq!(rec.first_seen_chapter, None);
        assert_eq!(rec.last_seen_chapter, None);
    }

    #[test]
    fn explicit_null_provenance_is_preserved_as_present() {
        let kb: KnowledgeBase = serde_json::from_str(
            r#"{"Castle": {"description": "old", "firstSeenChapter": null}}"#,
        )
        .unwrap();
        let rec = kb.get("Castle").unwrap();
        assert_eq!(rec.first_seen_chapter, Some(ChapterToken::missing()));
    }

    #[test]
    fn filter_returns_subset_of_whole_word_matches() {
        let mut kb = KnowledgeBase::new();
        kb.insert("Ann".into(), record("a person", json!(1), json!(1)));
        kb.insert("Anna".into(), record("another person", json!(1), json!(1)));
        kb.insert("Castle".into(), record("fortress", json!(1), json!(1)));

        let filtered = kb.filter("Anna walked to the gate.");
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains("Anna"));
        assert!(!filtered.contains("Ann"));

        for name in filtered.names() {
            assert!(kb.contains(name));
        }
    }

    #[test]
    fn filter_of_empty_text_is_empty() {
        let mut kb = KnowledgeBase::new();
        kb.insert("Castle".into(), record("fortress", json!(1), json!(1)));
        assert!(kb.filter("").is_empty());
    }

    #[test]
    fn load_missing_file_reports_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = KnowledgeBase::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, IoError::NotFound { .. }));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, "not json").unwrap();
        let err = KnowledgeBase::load(&path).unwrap_err();
        assert!(matches!(err, IoError::MalformedKb { .. }));
    }

    #[test]
    fn chapter_token_displays_compactly() {
        assert_eq!(ChapterToken::missing().to_string(), "?");
        assert_eq!(ChapterToken::from(json!(7)).to_string(), "7");
        assert_eq!(ChapterToken::from(json!("VII")).to_string(), "VII");
    }
}
