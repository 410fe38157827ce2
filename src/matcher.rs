//! Literal entity-name matching over chapter text.
//!
//! A candidate matches iff it occurs in the text as a whole word, exactly as
//! spelled: word boundary on both sides, case-sensitive, no stemming, no
//! Unicode normalization. "Ann" does not match inside "Anna".

use regex::Regex;

/// Return the candidate names that occur in `text` as whole words.
///
/// Names are emitted in candidate-iteration order, not in order of
/// appearance in the text. A non-match is not an error.
pub fn find_known_entities<'a, I>(text: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter(|name| occurs_as_word(text, name))
        .map(str::to_owned)
        .collect()
}

fn occurs_as_word(text: &str, name: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(name));
    Regex::new(&pattern)
        .expect("escaped literal is always a valid pattern")
        .is_match(text)
}
