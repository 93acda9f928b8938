//! Category tree model and name resolution.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::CategoryId;

/// Reference to a category's parent node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryParent {
    /// Parent category id
    pub id: CategoryId,
    /// Parent category name
    #[serde(default)]
    pub name: String,
}

/// A node in the category tree.
///
/// Depth-1 nodes are the fixed top-level groups; only deeper, user-created
/// nodes may be mutated by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// Tree depth; 1 for top-level groups
    #[serde(default)]
    pub depth: u32,
    /// Parent node, absent for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CategoryParent>,
}

impl Category {
    /// Whether the client is allowed to rename or delete this category.
    ///
    /// System categories (low-numbered ids) and top-level groups are
    /// immutable.
    pub fn is_user_defined(&self) -> bool {
        self.depth > 1 && self.id.is_user_defined()
    }
}

/// Resolve a category name to its id within a listing.
///
/// If several categories share the name, a `parent_name` is required to pick
/// one; resolving by name alone fails with [`Error::AmbiguousCategory`]
/// listing the candidate parents.
pub fn resolve_category(
    categories: &[Category],
    name: &str,
    parent_name: Option<&str>,
) -> Result<CategoryId> {
    let matches: Vec<&Category> = categories.iter().filter(|c| c.name == name).collect();

    if matches.len() > 1 && parent_name.is_none() {
        let mut parents: Vec<String> = matches
            .iter()
            .filter_map(|c| c.parent.as_ref().map(|p| p.name.clone()))
            .collect();
        parents.sort();
        parents.dedup();
        return Err(Error::AmbiguousCategory {
            name: name.to_string(),
            parents,
        });
    }

    matches
        .iter()
        .find(|c| match parent_name {
            None => true,
            Some(p) => c.parent.as_ref().is_some_and(|cp| cp.name == p),
        })
        .map(|c| c.id)
        .ok_or_else(|| Error::UnknownCategory(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<Category> {
        serde_json::from_value(serde_json::json!([
            {"id": 700, "name": "Food & Dining", "depth": 1},
            {"id": 701, "name": "Groceries", "depth": 2,
             "parent": {"id": 700, "name": "Food & Dining"}},
            {"id": 21, "name": "Transfer", "depth": 2,
             "parent": {"id": 20, "name": "Financial"}},
            {"id": 1600021, "name": "Transfer", "depth": 2,
             "parent": {"id": 1500, "name": "Business Services"}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_resolve_unique_name() {
        let id = resolve_category(&listing(), "Groceries", None).unwrap();
        assert_eq!(id, CategoryId::new(701));
    }

    #[test]
    fn test_resolve_ambiguous_name_fails() {
        let err = resolve_category(&listing(), "Transfer", None).unwrap_err();
        match err {
            Error::AmbiguousCategory { name, parents } => {
                assert_eq!(name, "Transfer");
                assert_eq!(parents, vec!["Business Services", "Financial"]);
            }
            other => panic!("expected AmbiguousCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_with_parent_disambiguates() {
        let id = resolve_category(&listing(), "Transfer", Some("Business Services")).unwrap();
        assert_eq!(id, CategoryId::new(1600021));
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        assert!(matches!(
            resolve_category(&listing(), "Yachts", None),
            Err(Error::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_mutability_rules() {
        let cats = listing();
        assert!(!cats[0].is_user_defined()); // top-level group
        assert!(!cats[2].is_user_defined()); // system id
        assert!(cats[3].is_user_defined());
    }
}
