//! Unique addressing for leaves that collide during one extraction pass.

use std::collections::HashMap;

use tracing::warn;

/// Tracks every key handed out during one extraction pass.
///
/// The first occurrence of a key is returned unchanged. Later occurrences get
/// a `(n)` suffix, with `n` counting from 1 in encounter order:
///
/// ```rust
/// use gridsync::disambiguate::KeyRegistry;
/// let mut keys = KeyRegistry::new();
/// assert_eq!(keys.resolve("x"), "x");
/// assert_eq!(keys.resolve("x"), "x(1)");
/// assert_eq!(keys.resolve("x"), "x(2)");
/// ```
///
/// Suffixed keys are registered too, so a literal `x(1)` seen after the
/// generated one is itself suffixed and ids stay unique.
#[derive(Debug, Default, Clone)]
pub struct KeyRegistry {
    seen: HashMap<String, usize>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a key not handed out before in this pass.
    pub fn resolve(&mut self, key: &str) -> String {
        let Some(&count) = self.seen.get(key) else {
            self.seen.insert(key.to_string(), 1);
            return key.to_string();
        };

        let mut index = count;
        let candidate = loop {
            let candidate = format!("{}({})", key, index);
            index += 1;
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
        };

        self.seen.insert(key.to_string(), index);
        self.seen.insert(candidate.clone(), 1);
        warn!(
            "Key {} already exists. Replace with this new key {}",
            key, candidate
        );
        candidate
    }

    /// Number of distinct keys handed out so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_unchanged() {
        let mut keys = KeyRegistry::new();
        assert_eq!(keys.resolve("hello"), "hello");
        assert_eq!(keys.resolve("world"), "world");
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_repeated_keys_are_numbered_in_order() {
        let mut keys = KeyRegistry::new();
        let resolved: Vec<String> = ["x", "x", "y", "x"]
            .iter()
            .map(|k| keys.resolve(k))
            .collect();
        assert_eq!(resolved, vec!["x", "x(1)", "y", "x(2)"]);
    }

    #[test]
    fn test_literal_suffixed_key_does_not_collide() {
        let mut keys = KeyRegistry::new();
        assert_eq!(keys.resolve("x"), "x");
        assert_eq!(keys.resolve("x"), "x(1)");
        assert_eq!(keys.resolve("x(1)"), "x(1)(1)");
    }

    #[test]
    fn test_generated_key_skips_existing_literal() {
        let mut keys = KeyRegistry::new();
        assert_eq!(keys.resolve("x(1)"), "x(1)");
        assert_eq!(keys.resolve("x"), "x");
        assert_eq!(keys.resolve("x"), "x(2)");
        assert_eq!(keys.resolve("x"), "x(3)");
    }

    #[test]
    fn test_empty_registry() {
        let keys = KeyRegistry::new();
        assert!(keys.is_empty());
    }
}
