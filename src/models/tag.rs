//! Tag model and the tag-membership merge rule.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::TagId;

/// A user-defined tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Tag id
    pub id: TagId,
    /// Tag name
    pub name: String,
}

/// Apply a name → desired-membership edit map to a current tag set.
///
/// Tags not mentioned in `edits` keep their current membership. This is the
/// read-merge-write half of tag editing for API styles where the tag set is
/// a whole-set field; the legacy style addresses tags individually and does
/// not need it.
pub fn merge_tags(
    current: &BTreeSet<String>,
    edits: &BTreeMap<String, bool>,
) -> BTreeSet<String> {
    let mut result = current.clone();
    for (name, on) in edits {
        if *on {
            result.insert(name.clone());
        } else {
            result.remove(name);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_leaves_unmentioned_tags_alone() {
        let current = set(&["A", "B"]);
        let edits = BTreeMap::from([("B".to_string(), false), ("C".to_string(), true)]);
        assert_eq!(merge_tags(&current, &edits), set(&["A", "C"]));
    }

    #[test]
    fn test_merge_is_a_no_op_without_edits() {
        let current = set(&["A", "B"]);
        assert_eq!(merge_tags(&current, &BTreeMap::new()), current);
    }

    #[test]
    fn test_merge_tolerates_redundant_edits() {
        let current = set(&["A"]);
        let edits = BTreeMap::from([("A".to_string(), true), ("Z".to_string(), false)]);
        assert_eq!(merge_tags(&current, &edits), set(&["A"]));
    }
}
