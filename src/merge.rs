//! Merging a chapter extraction into the knowledge base.
//!
//! The merge output is scoped to the current chapter's extraction: an entity
//! the oracle did not mention this chapter is not re-emitted, even if the
//! prior knowledge base knows it. Chaining per-chapter outputs into a full
//! running knowledge base is the caller's responsibility. What the merge
//! does guarantee is provenance: a previously known entity keeps its
//! original `firstSeenChapter` no matter how many chapters later it
//! resurfaces.

use crate::error::MergeError;
use crate::extraction::ChapterExtraction;
use crate::kb::{EntityRecord, KnowledgeBase};

/// Reconcile one chapter's extraction with the prior knowledge base.
///
/// Per entity: provenance is preserved from the prior record when one
/// exists (an absent `firstSeenChapter` field adopts the current chapter);
/// `lastSeenChapter` is always overwritten with the current chapter; the
/// new description replaces the old one wholesale.
///
/// Any entity value without a string `description` aborts the whole merge;
/// no partial output is produced.
pub fn merge(
    prior: &KnowledgeBase,
    extraction: &ChapterExtraction,
) -> Result<KnowledgeBase, MergeError> {
    let mut merged = KnowledgeBase::new();

    for (name, info) in &extraction.entities {
        let description = info
            .get("description")
            .ok_or_else(|| MergeError::MissingDescription {
                entity: name.clone(),
            })?;
        let description = description
            .as_str()
            .ok_or_else(|| MergeError::DescriptionNotText {
                entity: name.clone(),
            })?;

        let first_seen = match prior.get(name) {
            Some(record) => record
                .first_seen_chapter
                .clone()
                .unwrap_or_else(|| extraction.chapter.clone()),
            None => extraction.chapter.clone(),
        };

        merged.insert(
            name.clone(),
            EntityRecord {
                description: description.to_string(),
                first_seen_chapter: Some(first_seen),
                last_seen_chapter: Some(extraction.chapter.clone()),
            },
        );
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::parse_extraction;
    use crate::kb::ChapterToken;
    use serde_json::json;

    fn kb_from(json: &str) -> KnowledgeBase {
        serde_json::from_str(json).unwrap()
    }

    fn token(value: serde_json::Value) -> Option<ChapterToken> {
        Some(ChapterToken::from(value))
    }

    #[test]
    fn known_entity_keeps_first_seen_chapter() {
        let prior = kb_from(
            r#"{"Castle": {"description": "old", "firstSeenChapter": 1, "lastSeenChapter": 1}}"#,
        );
        let extraction = parse_extraction(
            r#"{"chapterNumber": 9, "entities": {"Castle": {"description": "rebuilt"}}}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        let castle = merged.get("Castle").unwrap();
        assert_eq!(castle.first_seen_chapter, token(json!(1)));
        assert_eq!(castle.last_seen_chapter, token(json!(9)));
    }

    #[test]
    fn last_seen_is_overwritten_even_backwards() {
        let prior = kb_from(
            r#"{"Castle": {"description": "old", "firstSeenChapter": 1, "lastSeenChapter": 12}}"#,
        );
        let extraction = parse_extraction(
            r#"{"chapterNumber": 7, "entities": {"Castle": {"description": "old"}}}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        assert_eq!(
            merged.get("Castle").unwrap().last_seen_chapter,
            token(json!(7))
        );
    }

    #[test]
    fn new_entity_gets_current_chapter_as_both_bounds() {
        let extraction = parse_extraction(
            r#"{"chapterNumber": 4, "entities": {"Sword": {"description": "shiny"}}}"#,
        )
        .unwrap();

        let merged = merge(&KnowledgeBase::new(), &extraction).unwrap();
        let sword = merged.get("Sword").unwrap();
        assert_eq!(sword.first_seen_chapter, token(json!(4)));
        assert_eq!(sword.last_seen_chapter, token(json!(4)));
    }

    #[test]
    fn description_replaces_rather_than_merges() {
        let prior = kb_from(
            r#"{"Castle": {"description": "old", "firstSeenChapter": 1, "lastSeenChapter": 1}}"#,
        );
        let extraction = parse_extraction(
            r#"{"chapterNumber": 3, "entities": {"Castle": {"description": "new"}}}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        assert_eq!(merged.get("Castle").unwrap().description, "new");
    }

    #[test]
    fn prior_entities_absent_from_extraction_are_not_re_emitted() {
        let prior = kb_from(
            r#"{"Castle": {"description": "old", "firstSeenChapter": 1, "lastSeenChapter": 1},
                "Moat": {"description": "deep", "firstSeenChapter": 2, "lastSeenChapter": 2}}"#,
        );
        let extraction = parse_extraction(
            r#"{"chapterNumber": 3, "entities": {"Castle": {"description": "new"}}}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(!merged.contains("Moat"));
    }

    #[test]
    fn prior_record_without_first_seen_adopts_current_chapter() {
        let prior = kb_from(r#"{"Castle": {"description": "old"}}"#);
        let extraction = parse_extraction(
            r#"{"chapterNumber": 5, "entities": {"Castle": {"description": "kept"}}}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        assert_eq!(
            merged.get("Castle").unwrap().first_seen_chapter,
            token(json!(5))
        );
    }

    #[test]
    fn explicit_null_first_seen_propagates() {
        let prior = kb_from(r#"{"Castle": {"description": "old", "firstSeenChapter": null}}"#);
        let extraction = parse_extraction(
            r#"{"chapterNumber": 5, "entities": {"Castle": {"description": "kept"}}}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        assert_eq!(
            merged.get("Castle").unwrap().first_seen_chapter,
            Some(ChapterToken::missing())
        );
    }

    #[test]
    fn missing_chapter_number_degenerates_both_bounds() {
        let extraction =
            parse_extraction(r#"{"entities": {"Sword": {"description": "shiny"}}}"#).unwrap();

        let merged = merge(&KnowledgeBase::new(), &extraction).unwrap();
        let sword = merged.get("Sword").unwrap();
        assert_eq!(sword.first_seen_chapter, Some(ChapterToken::missing()));
        assert_eq!(sword.last_seen_chapter, Some(ChapterToken::missing()));
    }

    #[test]
    fn string_chapter_tokens_propagate_opaquely() {
        let extraction = parse_extraction(
            r#"{"chapterNumber": "Prologue", "entities": {"Sword": {"description": "shiny"}}}"#,
        )
        .unwrap();

        let merged = merge(&KnowledgeBase::new(), &extraction).unwrap();
        assert_eq!(
            merged.get("Sword").unwrap().first_seen_chapter,
            token(json!("Prologue"))
        );
    }

    #[test]
    fn missing_description_aborts_the_whole_merge() {
        let extraction = parse_extraction(
            r#"{"chapterNumber": 2, "entities": {
                "Castle": {"description": "fine"},
                "Sword": {"type": "object"}
            }}"#,
        )
        .unwrap();

        let err = merge(&KnowledgeBase::new(), &extraction).unwrap_err();
        assert!(matches!(err, MergeError::MissingDescription { ref entity } if entity == "Sword"));
    }

    #[test]
    fn non_object_entity_value_aborts_the_merge() {
        let extraction = parse_extraction(
            r#"{"chapterNumber": 2, "entities": {"Castle": "a fortress"}}"#,
        )
        .unwrap();

        let err = merge(&KnowledgeBase::new(), &extraction).unwrap_err();
        assert!(matches!(err, MergeError::MissingDescription { .. }));
    }

    #[test]
    fn non_string_description_aborts_the_merge() {
        let extraction = parse_extraction(
            r#"{"chapterNumber": 2, "entities": {"Castle": {"description": 7}}}"#,
        )
        .unwrap();

        let err = merge(&KnowledgeBase::new(), &extraction).unwrap_err();
        assert!(matches!(err, MergeError::DescriptionNotText { .. }));
    }

    // One known entity updated and one new entity introduced in the same chapter.
    #[test]
    fn castle_and_sword_scenario() {
        let prior = kb_from(
            r#"{"Castle": {"description": "old", "firstSeenChapter": 1, "lastSeenChapter": 1}}"#,
        );
        let extraction = parse_extraction(
            r#"{"chapterNumber": 3, "entities": {
                "Castle": {"description": "new"},
                "Sword": {"description": "shiny"}
            }}"#,
        )
        .unwrap();

        let merged = merge(&prior, &extraction).unwrap();
        let expected: KnowledgeBase = serde_json::from_str(
            r#"{
                "Castle": {"description": "new", "firstSeenChapter": 1, "lastSeenChapter": 3},
                "Sword": {"description": "shiny", "firstSeenChapter": 3, "lastSeenChapter": 3}
            }"#,
        )
        .unwrap();
        assert_eq!(merged, expected);
    }
}
