use crate::error::NameError;
use std::collections::HashMap;

/// Bidirectional alias ↔ route path index.
///
/// An alias maps to exactly one path and a path carries at most one alias;
/// re-naming a path moves its alias.
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    by_name: HashMap<String, String>,
    by_path: HashMap<String, String>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an alias without touching the index.
    pub fn check_name(name: &str) -> Result<(), NameError> {
        if name.is_empty() || name.starts_with('/') {
            return Err(NameError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Bind `name` to `path`. The caller guarantees `path` is registered.
    pub fn insert(&mut self, path: &str, name: &str) -> Result<(), NameError> {
        Self::check_name(name)?;
        if let Some(existing) = self.by_name.get(name) {
            if existing != path {
                return Err(NameError::DuplicateName(name.to_string()));
            }
            return Ok(());
        }
        if let Some(old) = self.by_path.insert(path.to_string(), name.to_string()) {
            self.by_name.remove(&old);
        }
        self.by_name.insert(name.to_string(), path.to_string());
        Ok(())
    }

    pub fn path_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn name_of(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup_both_ways() {
        let mut idx = NameIndex::new();
        idx.insert("/items", "items").unwrap();
        assert_eq!(idx.path_of("items"), Some("/items"));
        assert_eq!(idx.name_of("/items"), Some("items"));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_name_starting_with_slash_rejected() {
        let mut idx = NameIndex::new();
        assert_eq!(
            idx.insert("/items", "/items"),
            Err(NameError::InvalidName("/items".to_string()))
        );
        assert!(idx.is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(NameIndex::check_name("").is_err());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut idx = NameIndex::new();
        idx.insert("/a", "thing").unwrap();
        assert_eq!(
            idx.insert("/b", "thing"),
            Err(NameError::DuplicateName("thing".to_string()))
        );
        assert_eq!(idx.path_of("thing"), Some("/a"));
    }

    #[test]
    fn test_same_binding_is_idempotent() {
        let mut idx = NameIndex::new();
        idx.insert("/a", "thing").unwrap();
        idx.insert("/a", "thing").unwrap();
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_renaming_path_moves_alias() {
        let mut idx = NameIndex::new();
        idx.insert("/a", "old").unwrap();
        idx.insert("/a", "new").unwrap();
        assert_eq!(idx.path_of("old"), None);
        assert_eq!(idx.path_of("new"), Some("/a"));
        assert_eq!(idx.name_of("/a"), Some("new"));
    }
}
