//! Comparing the entity sets of two extraction runs.
//!
//! Useful for inspecting extraction drift: run the same chapter twice (or
//! two revisions of a chapter) and diff the `parsed_output.json` files.
//! Only membership is compared; descriptions are ignored.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::DiffError;

/// Set algebra over two entity-name sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySetDiff {
    pub only_in_a: BTreeSet<String>,
    pub only_in_b: BTreeSet<String>,
    pub both: BTreeSet<String>,
}

/// Partition two entity-name sets into difference and intersection.
pub fn diff(a: &BTreeSet<String>, b: &BTreeSet<String>) -> EntitySetDiff {
    EntitySetDiff {
        only_in_a: a.difference(b).cloned().collect(),
        only_in_b: b.difference(a).cloned().collect(),
        both: a.intersection(b).cloned().collect(),
    }
}

/// Read the entity names out of an extraction document on disk.
///
/// The document must carry an `entities` object; anything else is a
/// reported error rather than a silent empty set, so diffing the wrong
/// kind of file is caught loudly.
pub fn load_entity_names(path: &Path) -> Result<BTreeSet<String>, DiffError> {
    let raw = fs::read_to_string(path).map_err(|source| DiffError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|err| DiffError::Malformed {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    match document.get("entities") {
        Some(Value::Object(entities)) => Ok(entities.keys().cloned().collect()),
        _ => Err(DiffError::MissingEntities {
            path: path.display().to_string(),
        }),
    }
}
