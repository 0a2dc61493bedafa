//! Per-name disambiguation bags.
//!
//! Every child name in the hierarchy maps to a `DisambiguationTree`: a
//! two-level `kind → hash → node` bag supporting partial-disambiguation
//! lookup. Keys use `_` for absent values, so a non-symbol page sits at
//! `(_, _)` and a symbol at `(struct, 4fh2x)`.

use std::collections::BTreeMap;

use crate::hierarchy::{Node, NodeId};

/// Key for an absent kind or hash.
pub const NONE_KEY: &str = "_";

/// The minimal label that distinguishes one entry from its same-named
/// siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disambiguation {
    None,
    Kind(String),
    Hash(String),
}

impl Disambiguation {
    /// The link-suffix spelling of this label, empty for `None`.
    pub fn suffix(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Kind(kind) => format!("-{kind}"),
            Self::Hash(hash) => format!("-{hash}"),
        }
    }
}

/// Lookup failure modes for `DisambiguationTree::find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No entry matches the requested disambiguation.
    NotFound,
    /// More than one entry matches; each candidate carries the label that
    /// would select it.
    Collision(Vec<(NodeId, Disambiguation)>),
}

/// A bag of same-named children keyed by `(kind, hash)`.
///
/// Invariants: at least one entry once populated; `(kind, hash)` pairs are
/// unique. Conflicting insertions are reported to the caller, which merges
/// the nodes (the hierarchy owns node storage, so merging happens there).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisambiguationTree {
    storage: BTreeMap<String, BTreeMap<String, NodeId>>,
}

impl DisambiguationTree {
    /// Insert an entry. Returns the existing occupant when `(kind, hash)` is
    /// already taken, leaving the tree unchanged; the caller merges the two
    /// nodes and decides which id survives.
    pub fn insert(&mut self, kind: &str, hash: &str, node: NodeId) -> Option<NodeId> {
        let group = self.storage.entry(kind.to_string()).or_default();
        if let Some(&existing) = group.get(hash) {
            if existing != node {
                return Some(existing);
            }
            return None;
        }
        group.insert(hash.to_string(), node);
        None
    }

    /// Remove an entry, dropping the kind group if it empties.
    pub fn remove(&mut self, kind: &str, hash: &str) -> Option<NodeId> {
        let group = self.storage.get_mut(kind)?;
        let removed = group.remove(hash);
        if group.is_empty() {
            self.storage.remove(kind);
        }
        removed
    }

    /// Direct lookup of a fully specified entry.
    pub fn get(&self, kind: &str, hash: &str) -> Option<NodeId> {
        self.storage.get(kind)?.get(hash).copied()
    }

    /// The tree's single entry when it is the `(_, _)` placeholder slot.
    pub fn lone_placeholder_slot(&self) -> Option<NodeId> {
        if self.len() != 1 {
            return None;
        }
        self.get(NONE_KEY, NONE_KEY)
    }

    /// Total number of entries across all kinds.
    pub fn len(&self) -> usize {
        self.storage.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterate `(kind, hash, node)` in deterministic order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, NodeId)> {
        self.storage.iter().flat_map(|(kind, group)| {
            group
                .iter()
                .map(move |(hash, &node)| (kind.as_str(), hash.as_str(), node))
        })
    }

    /// All nodes in the bag, deterministic order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.entries().map(|(_, _, node)| node).collect()
    }

    /// Partial-disambiguation lookup.
    ///
    /// With both kind and hash the lookup is direct. With only a kind, the
    /// kind group must hold exactly one entry. With only a hash, all kinds
    /// are searched for it. With neither, the bag must hold exactly one
    /// entry; otherwise every entry is returned as a collision candidate
    /// with its minimal label.
    pub fn find(&self, kind: Option<&str>, hash: Option<&str>) -> Result<NodeId, TreeError> {
        match (kind, hash) {
            (Some(kind), Some(hash)) => self.get(kind, hash).ok_or(TreeError::NotFound),
            (Some(kind), None) => {
                let group = self.storage.get(kind).ok_or(TreeError::NotFound)?;
                if group.len() == 1 {
                    let node = group.values().next().copied().ok_or(TreeError::NotFound)?;
                    return Ok(node);
                }
                Err(TreeError::Collision(
                    group
                        .iter()
                        .map(|(hash, &node)| (node, Disambiguation::Hash(hash.clone())))
                        .collect(),
                ))
            }
            (None, None) => {
                if self.len() == 1 {
                    let node = self.entries().next().map(|(_, _, n)| n);
                    return node.ok_or(TreeError::NotFound);
                }
                if self.is_empty() {
                    return Err(TreeError::NotFound);
                }
                Err(TreeError::Collision(self.disambiguated_values()))
            }
            (None, Some(hash)) => {
                let matches: Vec<(NodeId, Disambiguation)> = self
                    .storage
                    .iter()
                    .filter_map(|(kind, group)| {
                        group
                            .get(hash)
                            .map(|&node| (node, Disambiguation::Kind(kind.clone())))
                    })
                    .collect();
                match matches.len() {
                    0 => Err(TreeError::NotFound),
                    1 => Ok(matches[0].0),
                    _ => Err(TreeError::Collision(matches)),
                }
            }
        }
    }

    /// Minimal disambiguation per entry: `None` if the bag holds one entry,
    /// `Kind` if the entry is alone in its kind group, else `Hash`.
    pub fn disambiguated_values(&self) -> Vec<(NodeId, Disambiguation)> {
        if self.len() == 1 {
            return self
                .entries()
                .map(|(_, _, node)| (node, Disambiguation::None))
                .collect();
        }

        let mut out = Vec::new();
        for (kind, group) in &self.storage {
            if group.len() == 1 {
                let label = if kind == NONE_KEY {
                    Disambiguation::None
                } else {
                    Disambiguation::Kind(kind.clone())
                };
                if let Some(&node) = group.values().next() {
                    out.push((node, label));
                }
                continue;
            }
            for (hash, &node) in group {
                out.push((node, Disambiguation::Hash(hash.clone())));
            }
        }
        out
    }

    /// Like `disambiguated_values`, but kind labels carry the node's source
    /// language prefix (`swift.struct`).
    pub fn disambiguated_values_with_language(
        &self,
        nodes: &[Node],
    ) -> Vec<(NodeId, Disambiguation)> {
        self.disambiguated_values()
            .into_iter()
            .map(|(node, label)| {
                let label = match label {
                    Disambiguation::Kind(kind) => {
                        let language = nodes[node.index()]
                            .symbol
                            .as_ref()
                            .map(|s| s.language.as_str());
                        match language {
                            Some(language) => Disambiguation::Kind(format!("{language}.{kind}")),
                            None => Disambiguation::Kind(kind),
                        }
                    }
                    other => other,
                };
                (node, label)
            })
            .collect()
    }

    /// Disambiguation with cross-language duplicates collapsed.
    ///
    /// Entries sharing one precise symbol id count as a single logical
    /// entry represented by the primary language's node; the label is
    /// computed against the other logical entries only.
    pub fn collapsed_values(
        &self,
        nodes: &[Node],
        primary_language: &str,
    ) -> Vec<(NodeId, Disambiguation)> {
        let groups = collapse_by_precise(self.entries(), nodes, primary_language);

        if groups.len() == 1 {
            return groups
                .into_iter()
                .map(|g| (g.primary, Disambiguation::None))
                .collect();
        }

        let mut kind_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for group in &groups {
            *kind_counts.entry(group.kind.as_str()).or_default() += 1;
        }

        groups
            .iter()
            .map(|group| {
                let label = if kind_counts.get(group.kind.as_str()) == Some(&1) {
                    if group.kind == NONE_KEY {
                        Disambiguation::None
                    } else {
                        Disambiguation::Kind(group.kind.clone())
                    }
                } else {
                    Disambiguation::Hash(group.hash.clone())
                };
                (group.primary, label)
            })
            .collect()
    }

    /// Union another tree's entries into this one. Conflicting `(kind,
    /// hash)` pairs are returned as `(kept, displaced)` for the caller to
    /// merge at the node level.
    pub fn merge(&mut self, other: &Self) -> Vec<(NodeId, NodeId)> {
        let mut conflicts = Vec::new();
        for (kind, hash, node) in other.entries() {
            if let Some(existing) = self.insert(kind, hash, node) {
                conflicts.push((existing, node));
            }
        }
        conflicts
    }
}

/// One logical entry after collapsing cross-language duplicates.
pub struct CollapsedEntry {
    pub primary: NodeId,
    pub kind: String,
    pub hash: String,
    /// Every member of the group with its own bag keys.
    pub members: Vec<(NodeId, String, String)>,
}

/// Group tree entries by precise symbol id; non-symbols each form their own
/// group. The primary-language member represents the group.
pub fn collapse_by_precise<'a>(
    entries: impl Iterator<Item = (&'a str, &'a str, NodeId)>,
    nodes: &[Node],
    primary_language: &str,
) -> Vec<CollapsedEntry> {
    let mut groups: Vec<CollapsedEntry> = Vec::new();
    let mut index_by_precise: BTreeMap<String, usize> = BTreeMap::new();

    for (kind, hash, node) in entries {
        let precise = nodes[node.index()].symbol.as_ref().map(|s| s.precise.clone());
        let is_primary = nodes[node.index()]
            .symbol
            .as_ref()
            .is_some_and(|s| s.language == primary_language);

        match precise.and_then(|p| index_by_precise.get(&p).copied().map(|i| (p, i))) {
            Some((_, index)) => {
                let group = &mut groups[index];
                group.members.push((node, kind.to_string(), hash.to_string()));
                if is_primary {
                    group.primary = node;
                    group.kind = kind.to_string();
                    group.hash = hash.to_string();
                }
            }
            None => {
                if let Some(precise) = nodes[node.index()].symbol.as_ref().map(|s| &s.precise) {
                    index_by_precise.insert(precise.clone(), groups.len());
                }
                groups.push(CollapsedEntry {
                    primary: node,
                    kind: kind.to_string(),
                    hash: hash.to_string(),
                    members: vec![(node, kind.to_string(), hash.to_string())],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> NodeId {
        NodeId::from_index(raw as usize)
    }

    #[test]
    fn single_entry_finds_without_disambiguation() {
        let mut tree = DisambiguationTree::default();
        tree.insert("struct", "aaaaa", id(1));
        assert_eq!(tree.find(None, None), Ok(id(1)));
        assert_eq!(tree.find(Some("struct"), None), Ok(id(1)));
        assert_eq!(tree.find(Some("struct"), Some("aaaaa")), Ok(id(1)));
    }

    #[test]
    fn kind_narrows_a_two_entry_bag() {
        let mut tree = DisambiguationTree::default();
        tree.insert("struct", "aaaaa", id(1));
        tree.insert("class", "bbbbb", id(2));
        assert_eq!(tree.find(Some("class"), None), Ok(id(2)));
        assert!(matches!(tree.find(None, None), Err(TreeError::Collision(c)) if c.len() == 2));
    }

    #[test]
    fn hash_only_searches_all_kinds() {
        let mut tree = DisambiguationTree::default();
        tree.insert("struct", "aaaaa", id(1));
        tree.insert("class", "bbbbb", id(2));
        assert_eq!(tree.find(None, Some("bbbbb")), Ok(id(2)));
        assert_eq!(tree.find(None, Some("zzzzz")), Err(TreeError::NotFound));
    }

    #[test]
    fn missing_disambiguation_is_not_found() {
        let mut tree = DisambiguationTree::default();
        tree.insert("struct", "aaaaa", id(1));
        assert_eq!(tree.find(Some("enum"), None), Err(TreeError::NotFound));
        assert_eq!(
            tree.find(Some("struct"), Some("zzzzz")),
            Err(TreeError::NotFound)
        );
    }

    #[test]
    fn minimal_labels_prefer_kind_over_hash() {
        let mut tree = DisambiguationTree::default();
        tree.insert("struct", "aaaaa", id(1));
        tree.insert("class", "bbbbb", id(2));
        let labels = tree.disambiguated_values();
        assert!(labels.contains(&(id(2), Disambiguation::Kind("class".to_string()))));
        assert!(labels.contains(&(id(1), Disambiguation::Kind("struct".to_string()))));
    }

    #[test]
    fn same_kind_entries_need_hashes() {
        let mut tree = DisambiguationTree::default();
        tree.insert("func", "aaaaa", id(1));
        tree.insert("func", "bbbbb", id(2));
        let labels = tree.disambiguated_values();
        assert!(labels.contains(&(id(1), Disambiguation::Hash("aaaaa".to_string()))));
        assert!(labels.contains(&(id(2), Disambiguation::Hash("bbbbb".to_string()))));
    }

    #[test]
    fn conflicting_insert_reports_occupant() {
        let mut tree = DisambiguationTree::default();
        tree.insert("struct", "aaaaa", id(1));
        assert_eq!(tree.insert("struct", "aaaaa", id(2)), Some(id(1)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn merge_unions_and_reports_conflicts() {
        let mut left = DisambiguationTree::default();
        left.insert("struct", "aaaaa", id(1));
        let mut right = DisambiguationTree::default();
        right.insert("struct", "aaaaa", id(2));
        right.insert("enum", "ccccc", id(3));

        let conflicts = left.merge(&right);
        assert_eq!(conflicts, vec![(id(1), id(2))]);
        assert_eq!(left.get("enum", "ccccc"), Some(id(3)));
    }
}
