//! The in-memory path hierarchy.
//!
//! Nodes live in an arena indexed by `NodeId`; parents are plain back
//! indices, so shared attachments (cross-module extensions) form a DAG while
//! ownership stays with the first parent. Children are grouped per name in
//! `DisambiguationTree` bags.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use tracing::debug;

use crate::disambiguation::{DisambiguationTree, NONE_KEY};
use crate::identifier::LinkId;
use crate::parser::PathComponent;

/// Index of a node in the hierarchy's arena. Never invalidated; merged-away
/// nodes stay in the arena but become unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// The symbol payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    /// Globally unique identifier, e.g. a mangled name.
    pub precise: String,
    /// The interface language this node represents.
    pub language: String,
    /// Kind identifier with any language prefix stripped.
    pub kind_id: String,
    /// Stable 5-character disambiguation hash derived from `precise`.
    pub stable_hash: String,
    pub path_components: Vec<String>,
    /// Flattened declaration text for collision diagnostics.
    pub declaration: Option<String>,
    /// Every language this symbol is available in (grows on merge).
    pub languages: BTreeSet<String>,
    pub title: String,
}

/// One documentation entry: a symbol, a registered non-symbol page, or a
/// sparse placeholder bridging a missing parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub symbol: Option<SymbolRecord>,
    /// Non-symbol page kind (`article`, `anchor`, `taskGroup`, ...). `None`
    /// for symbols and for sparse placeholders.
    pub non_symbol_kind: Option<String>,
    /// Weak back-reference; ownership is via the parent's children map.
    pub parent: Option<NodeId>,
    pub children: BTreeMap<String, DisambiguationTree>,
    /// Cleared when the node's bundle is unregistered, making the node
    /// unfindable while its subtree stays traversable.
    pub identifier: Option<LinkId>,
    pub disfavored_in_collision: bool,
}

impl Node {
    /// A sparse placeholder: no symbol, no page kind, no identifier.
    pub fn is_placeholder(&self) -> bool {
        self.symbol.is_none() && self.non_symbol_kind.is_none() && self.identifier.is_none()
    }

    /// The `(kind, hash)` keys this node occupies in a parent's bag.
    pub fn tree_keys(&self) -> (String, String) {
        if let Some(symbol) = &self.symbol {
            return (symbol.kind_id.clone(), symbol.stable_hash.clone());
        }
        match self.non_symbol_kind.as_deref() {
            Some(kind @ ("anchor" | "taskGroup" | "landmark" | "volume" | "chapter")) => {
                (kind.to_string(), NONE_KEY.to_string())
            }
            _ => (NONE_KEY.to_string(), NONE_KEY.to_string()),
        }
    }

    /// Match a parsed component against this node. Symbols match on name
    /// plus any given kind, hash, and language; non-symbols match on the
    /// stored name verbatim.
    pub fn matches_component(&self, component: &PathComponent) -> bool {
        if let Some(symbol) = &self.symbol {
            if component.name != self.name {
                return false;
            }
            if let Some(kind) = &component.kind {
                if *kind != symbol.kind_id {
                    return false;
                }
            }
            if let Some(hash) = &component.hash {
                if *hash != symbol.stable_hash {
                    return false;
                }
            }
            if let Some(language) = &component.language {
                if !symbol.languages.contains(language) {
                    return false;
                }
            }
            return true;
        }
        component.full == self.name
    }
}

/// The hierarchy root set and node arena.
#[derive(Debug, Clone)]
pub struct PathHierarchy {
    nodes: Vec<Node>,
    /// Module-name roots, including injected technology roots.
    pub modules: BTreeMap<String, NodeId>,
    pub articles_container: NodeId,
    pub tutorial_container: NodeId,
    pub tutorial_overview_container: NodeId,
    /// Findable-node lookup, rebuilt at the freeze point.
    pub lookup: BTreeMap<LinkId, NodeId>,
}

impl PathHierarchy {
    /// Create an empty hierarchy with the three non-symbol containers. The
    /// articles and tutorial containers take the bundle's display name; the
    /// overview container is the well-known `tutorials` root.
    pub fn new(bundle_display_name: &str) -> Self {
        let mut hierarchy = Self {
            nodes: Vec::new(),
            modules: BTreeMap::new(),
            articles_container: NodeId(0),
            tutorial_container: NodeId(0),
            tutorial_overview_container: NodeId(0),
            lookup: BTreeMap::new(),
        };
        hierarchy.articles_container =
            hierarchy.create_non_symbol(bundle_display_name, "container", Some(LinkId::next()));
        hierarchy.tutorial_container =
            hierarchy.create_non_symbol(bundle_display_name, "container", Some(LinkId::next()));
        hierarchy.tutorial_overview_container =
            hierarchy.create_non_symbol("tutorials", "container", Some(LinkId::next()));
        hierarchy
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The raw arena, for disambiguation helpers that need node payloads.
    pub fn arena(&self) -> &[Node] {
        &self.nodes
    }

    pub fn create_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Create a registered non-symbol page node.
    pub fn create_non_symbol(
        &mut self,
        name: &str,
        kind: &str,
        identifier: Option<LinkId>,
    ) -> NodeId {
        self.create_node(Node {
            name: name.to_string(),
            symbol: None,
            non_symbol_kind: Some(kind.to_string()),
            parent: None,
            children: BTreeMap::new(),
            identifier,
            disfavored_in_collision: false,
        })
    }

    /// Create a sparse placeholder bridging a missing parent.
    pub fn create_placeholder(&mut self, name: &str) -> NodeId {
        self.create_node(Node {
            name: name.to_string(),
            symbol: None,
            non_symbol_kind: None,
            parent: None,
            children: BTreeMap::new(),
            identifier: None,
            disfavored_in_collision: true,
        })
    }

    /// Attach `child` under `parent` using the child's own name and keys.
    /// Returns the surviving node (which differs from `child` on merge).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        let name = self.nodes[child.index()].name.clone();
        let (kind, hash) = self.nodes[child.index()].tree_keys();
        self.add_child_keyed(parent, &name, &kind, &hash, child)
    }

    /// Attach `child` under `parent` at explicit bag keys.
    ///
    /// A lone `(_, _)` placeholder in the bag is replaced when a real symbol
    /// arrives, its subtree moving onto the new node. A `(kind, hash)`
    /// conflict merges the incoming node into the occupant. The first
    /// attachment owns the parent back-reference; later attachments share
    /// the child without re-parenting it.
    pub fn add_child_keyed(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: &str,
        hash: &str,
        child: NodeId,
    ) -> NodeId {
        if parent == child {
            return child;
        }

        let placeholder = self.nodes[parent.index()]
            .children
            .get(name)
            .and_then(DisambiguationTree::lone_placeholder_slot)
            .filter(|&slot| slot != child && self.nodes[slot.index()].is_placeholder());
        let child_is_symbol = self.nodes[child.index()].symbol.is_some();

        if let Some(slot) = placeholder {
            if child_is_symbol {
                if let Some(tree) = self.nodes[parent.index()].children.get_mut(name) {
                    tree.remove(NONE_KEY, NONE_KEY);
                    tree.insert(kind, hash, child);
                }
                self.nodes[child.index()].parent = Some(parent);
                self.merge_nodes(child, slot);
                return child;
            }
        }

        let existing = self.nodes[parent.index()]
            .children
            .get(name)
            .and_then(|tree| tree.get(kind, hash));
        if let Some(existing) = existing {
            if existing != child {
                self.merge_nodes(existing, child);
                return existing;
            }
            return child;
        }

        let tree = self.nodes[parent.index()]
            .children
            .entry(name.to_string())
            .or_default();
        tree.insert(kind, hash, child);
        if self.nodes[child.index()].parent.is_none() {
            self.nodes[child.index()].parent = Some(parent);
        }
        child
    }

    /// Merge `other` into `keep`: `other`'s subtree, symbol payload, and
    /// identifier move onto `keep`, and `other` becomes unreachable.
    pub fn merge_nodes(&mut self, keep: NodeId, other: NodeId) {
        if keep == other {
            return;
        }
        debug!(
            keep = %self.nodes[keep.index()].name,
            other = %self.nodes[other.index()].name,
            "merging hierarchy nodes"
        );

        let other_symbol = self.nodes[other.index()].symbol.take();
        let other_identifier = self.nodes[other.index()].identifier.take();
        let other_page_kind = self.nodes[other.index()].non_symbol_kind.take();
        let other_disfavored = self.nodes[other.index()].disfavored_in_collision;
        let other_children = std::mem::take(&mut self.nodes[other.index()].children);
        self.nodes[other.index()].parent = None;

        {
            let kept = &mut self.nodes[keep.index()];
            match (&mut kept.symbol, other_symbol) {
                (Some(existing), Some(incoming)) if existing.precise == incoming.precise => {
                    existing.languages.extend(incoming.languages);
                }
                (slot @ None, Some(incoming)) => *slot = Some(incoming),
                _ => {}
            }
            if kept.identifier.is_none() {
                kept.identifier = other_identifier;
            }
            if kept.non_symbol_kind.is_none() {
                kept.non_symbol_kind = other_page_kind;
            }
            kept.disfavored_in_collision &= other_disfavored;
        }

        for (name, tree) in other_children {
            for (kind, hash, grandchild) in tree.entries() {
                if self.nodes[grandchild.index()].parent == Some(other) {
                    self.nodes[grandchild.index()].parent = None;
                }
                self.add_child_keyed(keep, &name, kind, hash, grandchild);
            }
        }
    }

    /// The bag for a component's name, trying the stripped name first and
    /// the verbatim segment second (names may contain hyphens). The flag is
    /// true when the verbatim form matched, in which case the component's
    /// parsed disambiguation must be ignored.
    pub fn child_tree(
        &self,
        id: NodeId,
        component: &PathComponent,
    ) -> Option<(&DisambiguationTree, bool)> {
        let children = &self.nodes[id.index()].children;
        if let Some(tree) = children.get(&component.name) {
            return Some((tree, false));
        }
        if component.full != component.name {
            if let Some(tree) = children.get(&component.full) {
                return Some((tree, true));
            }
        }
        None
    }

    /// True if the component's name or verbatim text is a child key.
    pub fn any_child_matches(&self, id: NodeId, component: &PathComponent) -> bool {
        self.child_tree(id, component).is_some()
    }

    /// Sorted child names of a node.
    pub fn child_names(&self, id: NodeId) -> Vec<String> {
        self.nodes[id.index()].children.keys().cloned().collect()
    }

    /// Names a link may start with: modules and container names.
    pub fn root_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        for container in [
            self.articles_container,
            self.tutorial_container,
            self.tutorial_overview_container,
        ] {
            let name = &self.nodes[container.index()].name;
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// The `/`-joined canonical path of raw names from the root down.
    pub fn canonical_path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            names.push(self.nodes[node.index()].name.clone());
            current = self.nodes[node.index()].parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Arena ids of every node carrying a symbol, in creation order.
    pub fn symbol_nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId::from_index)
            .filter(|id| self.nodes[id.index()].symbol.is_some())
            .collect()
    }

    /// Rebuild the `LinkId → Node` lookup from the arena. Panics if two
    /// reachable nodes claim the same identifier, which is a builder bug.
    pub fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        for index in 0..self.nodes.len() {
            let id = NodeId::from_index(index);
            if let Some(link) = self.nodes[index].identifier {
                let previous = self.lookup.insert(link, id);
                assert!(previous.is_none(), "duplicate node identifier in hierarchy");
            }
        }
    }

    // ── Debug dump ────────────────────────────────────────────────────────

    /// Pretty-print the hierarchy with box-drawing glyphs. Deterministic:
    /// byte-identical output for identical inputs.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut roots: Vec<NodeId> = self.modules.values().copied().collect();
        for container in [
            self.articles_container,
            self.tutorial_container,
            self.tutorial_overview_container,
        ] {
            if !self.nodes[container.index()].children.is_empty() {
                roots.push(container);
            }
        }
        for root in roots {
            let _ = writeln!(out, "{}", self.nodes[root.index()].name);
            self.dump_children(root, "", &mut out);
        }
        out
    }

    fn dump_children(&self, id: NodeId, prefix: &str, out: &mut String) {
        let mut lines: Vec<(String, NodeId)> = Vec::new();
        for (name, tree) in &self.nodes[id.index()].children {
            for (node, label) in tree.disambiguated_values() {
                lines.push((format!("{name}{}", label.suffix()), node));
            }
        }
        lines.sort_by(|a, b| a.0.cmp(&b.0));

        let count = lines.len();
        for (position, (display, child)) in lines.into_iter().enumerate() {
            let last = position + 1 == count;
            let glyph = if last { "╰ " } else { "├ " };
            let _ = writeln!(out, "{prefix}{glyph}{display}");
            // Avoid infinite recursion on shared attachments by only
            // descending from the owning parent.
            if self.nodes[child.index()].parent == Some(id) {
                let continuation = if last { "  " } else { "│ " };
                self.dump_children(child, &format!("{prefix}{continuation}"), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::stable_hash;
    use crate::parser::parse_segment;

    fn symbol_node(hierarchy: &mut PathHierarchy, name: &str, kind: &str, precise: &str) -> NodeId {
        let record = SymbolRecord {
            precise: precise.to_string(),
            language: "swift".to_string(),
            kind_id: kind.to_string(),
            stable_hash: stable_hash(precise),
            path_components: vec![name.to_string()],
            declaration: None,
            languages: BTreeSet::from(["swift".to_string()]),
            title: name.to_string(),
        };
        hierarchy.create_node(Node {
            name: name.to_string(),
            symbol: Some(record),
            non_symbol_kind: None,
            parent: None,
            children: BTreeMap::new(),
            identifier: Some(LinkId::next()),
            disfavored_in_collision: false,
        })
    }

    #[test]
    fn first_parent_wins_for_shared_attachments() {
        let mut h = PathHierarchy::new("Test");
        let module = h.create_non_symbol("M", "container", Some(LinkId::next()));
        let extension = h.create_non_symbol("N", "container", Some(LinkId::next()));
        let child = symbol_node(&mut h, "Foo", "struct", "s:foo");

        h.add_child(module, child);
        h.add_child(extension, child);

        assert_eq!(h.node(child).parent, Some(module));
        assert!(h.any_child_matches(extension, &parse_segment("Foo", 0..3)));
    }

    #[test]
    fn placeholder_is_replaced_by_real_symbol() {
        let mut h = PathHierarchy::new("Test");
        let module = h.create_non_symbol("M", "container", Some(LinkId::next()));
        let placeholder = h.create_placeholder("A");
        h.add_child(module, placeholder);
        let nested = symbol_node(&mut h, "B", "func", "s:a:b");
        h.add_child(placeholder, nested);

        let real = symbol_node(&mut h, "A", "struct", "s:a");
        let survivor = h.add_child(module, real);

        assert_eq!(survivor, real);
        assert_eq!(h.node(nested).parent, Some(real));
        let component = parse_segment("B", 0..1);
        assert!(h.any_child_matches(real, &component));
    }

    #[test]
    fn conflicting_keys_merge_subtrees() {
        let mut h = PathHierarchy::new("Test");
        let module = h.create_non_symbol("M", "container", Some(LinkId::next()));
        let first = symbol_node(&mut h, "Foo", "struct", "s:foo");
        let second = symbol_node(&mut h, "Foo", "struct", "s:foo");
        let grandchild = symbol_node(&mut h, "bar()", "func", "s:foo:bar");
        h.add_child(second, grandchild);

        h.add_child(module, first);
        let survivor = h.add_child(module, second);

        assert_eq!(survivor, first);
        assert_eq!(h.node(grandchild).parent, Some(first));
    }

    #[test]
    fn dump_is_deterministic() {
        let build = || {
            let mut h = PathHierarchy::new("Test");
            let module = h.create_non_symbol("M", "container", Some(LinkId::next()));
            h.modules.insert("M".to_string(), module);
            let a = symbol_node(&mut h, "Alpha", "struct", "s:alpha");
            let b = symbol_node(&mut h, "Beta", "enum", "s:beta");
            h.add_child(module, a);
            h.add_child(module, b);
            h.dump()
        };
        assert_eq!(build(), build());
        assert!(build().contains("├ Alpha"));
        assert!(build().contains("╰ Beta"));
    }
}
