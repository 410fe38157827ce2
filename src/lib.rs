//! # chronicler
//!
//! Incremental chapter-by-chapter knowledge base builder for long texts,
//! driven by an LLM extraction oracle.
//!
//! ## Architecture
//!
//! - **Matcher** (`matcher`): whole-word, case-sensitive entity-name scanning
//! - **Knowledge base** (`kb`): entity records with first/last-seen chapter provenance
//! - **Oracle** (`oracle`): blocking chat-completion client behind the [`oracle::Oracle`] trait
//! - **Extraction** (`extraction`): strict-JSON parsing of oracle output
//! - **Merge** (`merge`): reconciles a chapter's extraction with the prior knowledge base
//! - **Pipeline** (`pipeline`): one chapter end to end, persisting every intermediate artifact
//! - **Diff** (`diff`): set comparison of two extraction runs
//!
//! Each chapter run narrows the global knowledge base to the entities that
//! literally occur in the chapter, asks the oracle to extract and describe
//! entities with that context attached, and folds the reply back into
//! per-entity records. The merged output covers only the current chapter's
//! entities; an external driver chains runs together.
//!
//! ## Library usage
//!
//! ```
//! use chronicler::extraction::parse_extraction;
//! use chronicler::kb::KnowledgeBase;
//! use chronicler::merge::merge;
//!
//! let prior: KnowledgeBase = serde_json::from_str(
//!     r#"{"Castle": {"description": "old", "firstSeenChapter": 1, "lastSeenChapter": 1}}"#,
//! ).unwrap();
//!
//! let extraction = parse_extraction(
//!     r#"{"chapterNumber": 3, "entities": {"Castle": {"description": "rebuilt"}}}"#,
//! ).unwrap();
//!
//! let merged = merge(&prior, &extraction).unwrap();
//! let castle = merged.get("Castle").unwrap();
//! assert_eq!(castle.description, "rebuilt");
//! assert_eq!(castle.first_seen_chapter, Some(serde_json::json!(1).into()));
//! assert_eq!(castle.last_seen_chapter, Some(serde_json::json!(3).into()));
//! ```

pub mod diff;
pub mod error;
pub mod extraction;
pub mod kb;
pub mod matcher;
pub mod merge;
pub mod oracle;
pub mod pipeline;
pub mod prompt;
