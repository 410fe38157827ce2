//! Prompt construction for the extraction oracle.
//!
//! Exactly one template is active per run. The final prompt is a pure
//! function of the template, the chapter text, and the filtered knowledge
//! base — the two inputs travel as one JSON document appended to the
//! instruction block.

use serde::Serialize;

use crate::kb::KnowledgeBase;

/// Instruction block sent ahead of every chapter.
///
/// The structure sample spells the chapter field `chapterNumber`, the same
/// spelling the response parser reads back.
pub const EXTRACTION_TEMPLATE: &str = "\
You are an advanced literary analysis assistant specialized in entity extraction. \
Your task is to identify and provide detailed information about all entities mentioned in a chapter. \
Entities include, but are not limited to, characters, places, organizations, objects, powers, \
possessions, events, periods, or concepts. \
You are provided with the full chapter text and a knowledge base for reference. \
Be extremely thorough, aiming to identify at least 30 unique entities, including minor ones. \
For each entity, provide a detailed description that includes: \
(a) its nature or type (e.g., character, location, object), \
(b) historical or contextual information from the knowledge base if available, \
(c) relationships or interactions with other entities if relevant, \
(d) relevant attributes, abilities, or characteristics. \
Detect and include the chapter number from the text. \
Output must be strictly valid JSON, following this structure: \
{\"chapterNumber\": <detected chapter number>, \"entities\": {<entity name>: \
{\"type\": <entity type>, \"description\": <detailed description>, \
\"relationships\": <related entities if applicable>}, ...}} \
Do not include any text outside the JSON. \
Ensure consistent formatting, complete sentences, and maximum detail for each entity. \
If the chapter mentions fewer than 30 entities, still identify all possible entities exhaustively.";

/// Assemble the final prompt for one chapter.
pub fn build_prompt(chapter_text: &str, knowledge_base: &KnowledgeBase) -> String {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct PromptInput<'a> {
        chapter_text: &'a str,
        knowledge_base: &'a KnowledgeBase,
    }

    let input = serde_json::to_string(&PromptInput {
        chapter_text,
        knowledge_base,
    })
    .expect("prompt input is always serializable");

    format!("{EXTRACTION_TEMPLATE}\n\nInput:\n{input}")
}
