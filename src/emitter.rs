//! Canonical path emission: the shortest disambiguated URL path for every
//! symbol in the hierarchy.

use std::collections::{BTreeMap, HashSet};

use crate::disambiguation::{collapse_by_precise, CollapsedEntry, Disambiguation, NONE_KEY};
use crate::hierarchy::{NodeId, PathHierarchy};

/// Compute `precise id → URL path` for every symbol.
///
/// Children are grouped case-insensitively (after normalizing non-URL
/// characters to `_`) so names that would collide as URLs disambiguate
/// against each other. A symbol available in several languages appears once,
/// addressed by the primary language's variant. With
/// `disambiguate_unambiguous_children` set, children of a disambiguated
/// container carry their own disambiguation even when unique, keeping child
/// URLs stable across sibling edits.
///
/// The resulting map is injective; emitting two symbols at one path is a
/// builder bug and panics.
pub fn disambiguated_paths(
    hierarchy: &PathHierarchy,
    primary_language: &str,
    disambiguate_unambiguous_children: bool,
) -> BTreeMap<String, String> {
    let mut paths = BTreeMap::new();

    for (name, &module) in &hierarchy.modules {
        let path = format!("/{name}");
        if let Some(symbol) = &hierarchy.node(module).symbol {
            paths.insert(symbol.precise.clone(), path.clone());
        }
        descend(
            hierarchy,
            module,
            &path,
            false,
            primary_language,
            disambiguate_unambiguous_children,
            &mut paths,
        );
    }

    let distinct: HashSet<&String> = paths.values().collect();
    assert!(
        distinct.len() == paths.len(),
        "disambiguated paths are not injective"
    );
    paths
}

/// Normalize a child name for case-insensitive URL grouping.
fn normalize_for_grouping(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn descend(
    hierarchy: &PathHierarchy,
    id: NodeId,
    path: &str,
    parent_was_disambiguated: bool,
    primary_language: &str,
    disambiguate_unambiguous_children: bool,
    paths: &mut BTreeMap<String, String>,
) {
    // Group same-URL names so they disambiguate against each other.
    let mut grouped: BTreeMap<String, Vec<(&str, &str, NodeId)>> = BTreeMap::new();
    for (name, tree) in &hierarchy.node(id).children {
        let bucket = grouped.entry(normalize_for_grouping(name)).or_default();
        for (kind, hash, node) in tree.entries() {
            bucket.push((kind, hash, node));
        }
    }

    for bucket in grouped.values() {
        let groups = collapse_by_precise(
            bucket.iter().copied(),
            hierarchy.arena(),
            primary_language,
        );
        let labels = minimal_labels(&groups, hierarchy);

        for (group, label) in groups.iter().zip(labels) {
            for (member, kind, hash) in &group.members {
                let member_label = member_label(&label, group, *member, kind, hash);
                let member_label = if disambiguate_unambiguous_children
                    && parent_was_disambiguated
                    && member_label == Disambiguation::None
                    && kind != NONE_KEY
                {
                    Disambiguation::Kind(kind.clone())
                } else {
                    member_label
                };

                let node = hierarchy.node(*member);
                let child_path = format!("{path}/{}{}", node.name, member_label.suffix());

                if let Some(symbol) = &node.symbol {
                    if symbol.language == primary_language {
                        paths.insert(symbol.precise.clone(), child_path.clone());
                    } else {
                        paths
                            .entry(symbol.precise.clone())
                            .or_insert_with(|| child_path.clone());
                    }
                }

                // Only the owning parent emits a subtree, so shared
                // attachments keep a single canonical address.
                if node.parent == Some(id) {
                    descend(
                        hierarchy,
                        *member,
                        &child_path,
                        member_label != Disambiguation::None,
                        primary_language,
                        disambiguate_unambiguous_children,
                        paths,
                    );
                }
            }
        }
    }
}

/// Minimal disambiguation per collapsed group: nothing when the group is
/// alone under its name, the kind when no other group shares it, else the
/// hash.
///
/// Disfavored entries (default implementations, synthesized symbols, sparse
/// placeholders) don't force disambiguation onto their favored siblings:
/// labels are computed among favored groups only, and disfavored groups
/// always carry their hash. An unqualified link then resolves to the
/// favored sibling while the hashed path still names the disfavored one.
fn minimal_labels(groups: &[CollapsedEntry], hierarchy: &PathHierarchy) -> Vec<Disambiguation> {
    if groups.len() == 1 {
        return vec![Disambiguation::None];
    }

    let disfavored = |group: &CollapsedEntry| {
        hierarchy
            .node(group.primary)
            .disfavored_in_collision
    };
    let favored_count = groups.iter().filter(|g| !disfavored(g)).count();
    let all_disfavored = favored_count == 0;

    let mut kind_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for group in groups {
        if all_disfavored || !disfavored(group) {
            *kind_counts.entry(group.kind.as_str()).or_default() += 1;
        }
    }
    let contested = if all_disfavored {
        groups.len()
    } else {
        favored_count
    };

    groups
        .iter()
        .map(|group| {
            if !all_disfavored && disfavored(group) {
                return Disambiguation::Hash(group.hash.clone());
            }
            if contested == 1 {
                return Disambiguation::None;
            }
            if kind_counts.get(group.kind.as_str()) == Some(&1) {
                if group.kind == NONE_KEY {
                    Disambiguation::None
                } else {
                    Disambiguation::Kind(group.kind.clone())
                }
            } else {
                Disambiguation::Hash(group.hash.clone())
            }
        })
        .collect()
}

/// A secondary-language member reuses the group's label with its own kind
/// or hash substituted.
fn member_label(
    label: &Disambiguation,
    group: &CollapsedEntry,
    member: NodeId,
    kind: &str,
    hash: &str,
) -> Disambiguation {
    if member == group.primary {
        return label.clone();
    }
    match label {
        Disambiguation::None => Disambiguation::None,
        Disambiguation::Kind(_) => Disambiguation::Kind(kind.to_string()),
        Disambiguation::Hash(_) => Disambiguation::Hash(hash.to_string()),
    }
}
