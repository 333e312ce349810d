//! Segment trie for longest-match lookups over element paths.
//!
//! Keys are sequences of path segments rather than bytes, so `a/b` never matches a
//! stored `a/bc`. Used by [`PatternRegistry`](crate::PatternRegistry) for both
//! `*/suffix` patterns (keys stored reversed) and `prefix/*` patterns.

use std::collections::HashMap;

/// A trie keyed by path segments.
///
/// # Performance
///
/// - Insert: O(k) where k is the number of segments
/// - Lookup: O(k), one hash probe per segment
#[derive(Debug, Clone)]
pub(crate) struct PathTrie<V> {
    root: Node<V>,
}

#[derive(Debug, Clone)]
struct Node<V> {
    value: Option<V>,
    children: HashMap<String, Node<V>>,
}

impl<V> Default for PathTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PathTrie<V> {
    /// Create an empty trie.
    pub(crate) fn new() -> Self {
        Self { root: Node::new() }
    }

    /// Get the value at `key`, inserting `V::default()` if absent.
    pub(crate) fn entry<'k>(&mut self, key: impl IntoIterator<Item = &'k str>) -> &mut V
    where
        V: Default,
    {
        let mut node = &mut self.root;
        for segment in key {
            node = node.children.entry(segment.to_owned()).or_insert_with(Node::new);
        }
        node.value.get_or_insert_with(V::default)
    }

    /// Find the value for an exact key.
    pub(crate) fn get<'k>(&self, key: impl IntoIterator<Item = &'k str>) -> Option<&V> {
        let mut node = &self.root;
        for segment in key {
            node = node.children.get(segment)?;
        }
        node.value.as_ref()
    }

    /// Find the value with the longest stored key that is a prefix of `key`.
    ///
    /// Returns the value and the number of segments it consumed. The empty key is
    /// never stored by the registry, so a hit always consumes at least one segment.
    pub(crate) fn find_longest_prefix<'k>(
        &self,
        key: impl IntoIterator<Item = &'k str>,
    ) -> Option<(&V, usize)> {
        let mut node = &self.root;
        let mut best = node.value.as_ref().map(|v| (v, 0));
        for (depth, segment) in key.into_iter().enumerate() {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(value) = node.value.as_ref() {
                best = Some((value, depth + 1));
            }
        }
        best
    }
}

impl<V> Node<V> {
    fn new() -> Self {
        Self {
            value: None,
            children: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(keys: &[(&str, i32)]) -> PathTrie<i32> {
        let mut trie = PathTrie::new();
        for (key, value) in keys {
            *trie.entry(key.split('/')) = *value;
        }
        trie
    }

    #[test]
    fn exact_get() {
        let t = trie(&[("a/b", 1), ("a", 2)]);
        assert_eq!(t.get("a/b".split('/')), Some(&1));
        assert_eq!(t.get("a".split('/')), Some(&2));
        assert_eq!(t.get("a/c".split('/')), None);
    }

    #[test]
    fn longest_prefix_wins() {
        let t = trie(&[("a", 1), ("a/b", 2), ("a/b/c/d", 3)]);
        assert_eq!(t.find_longest_prefix("a/b/c".split('/')), Some((&2, 2)));
        assert_eq!(t.find_longest_prefix("a/x".split('/')), Some((&1, 1)));
        assert_eq!(t.find_longest_prefix("z".split('/')), None);
    }

    #[test]
    fn segments_do_not_match_partially() {
        let t = trie(&[("a/bc", 1)]);
        assert_eq!(t.find_longest_prefix("a/b".split('/')), None);
    }

    #[test]
    fn entry_reuses_existing_value() {
        let mut t: PathTrie<Vec<i32>> = PathTrie::new();
        t.entry(["x"]).push(1);
        t.entry(["x"]).push(2);
        assert_eq!(t.get(["x"]), Some(&vec![1, 2]));
    }
}
