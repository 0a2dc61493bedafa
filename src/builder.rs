//! Hierarchy construction from module symbol graphs and non-symbol pages.
//!
//! Graphs are consumed in caller-supplied order; the first graph to mention
//! a module owns creation of its root node, so the loader's ordering
//! heuristic (base files before `@`-suffixed extension files) decides ties
//! deterministically.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::disambiguation::NONE_KEY;
use crate::hasher::stable_hash;
use crate::hierarchy::{Node, NodeId, PathHierarchy, SymbolRecord};
use crate::identifier::LinkId;
use crate::parser::{parse_segment, PathComponent};
use crate::resolver::LinkResolver;
use crate::symbol_graph::{RelationshipKind, Symbol, SymbolGraph};

/// Builds a `PathHierarchy` and freezes it into a `LinkResolver`.
pub struct HierarchyBuilder {
    hierarchy: PathHierarchy,
    bundle: String,
    display_name: String,
    primary_language: String,
    /// Which bundle registered each node, for bundle unregistration.
    node_bundles: HashMap<NodeId, String>,
    /// Node for each `(precise, interfaceLanguage)` pair seen so far.
    symbol_index: HashMap<(String, String), NodeId>,
    /// Caller-supplied pre-disambiguated path components per precise id,
    /// used by the path-component fallback for partial graphs.
    known_disambiguated: HashMap<String, Vec<String>>,
}

impl HierarchyBuilder {
    /// Start building for a bundle. `display_name` names the article and
    /// tutorial containers; `primary_language` breaks cross-language ties.
    pub fn new(bundle: &str, display_name: &str, primary_language: &str) -> Self {
        let hierarchy = PathHierarchy::new(display_name);
        let mut node_bundles = HashMap::new();
        for container in [
            hierarchy.articles_container,
            hierarchy.tutorial_container,
            hierarchy.tutorial_overview_container,
        ] {
            node_bundles.insert(container, bundle.to_string());
        }
        Self {
            hierarchy,
            bundle: bundle.to_string(),
            display_name: display_name.to_string(),
            primary_language: primary_language.to_string(),
            node_bundles,
            symbol_index: HashMap::new(),
            known_disambiguated: HashMap::new(),
        }
    }

    /// Supply pre-disambiguated path components for a symbol, carrying
    /// disambiguation into partial graphs.
    pub fn set_known_disambiguated_path_components(
        &mut self,
        precise: &str,
        components: Vec<String>,
    ) {
        self.known_disambiguated.insert(precise.to_string(), components);
    }

    /// Consume a sequence of graphs in order, under the default bundle.
    pub fn add_symbol_graphs<'a>(&mut self, graphs: impl IntoIterator<Item = &'a SymbolGraph>) {
        for graph in graphs {
            self.add_symbol_graph(graph);
        }
    }

    /// Consume one graph under the default bundle.
    pub fn add_symbol_graph(&mut self, graph: &SymbolGraph) {
        let bundle = self.bundle.clone();
        self.add_symbol_graph_in_bundle(&bundle, graph);
    }

    /// Consume one graph under an explicit bundle.
    pub fn add_symbol_graph_in_bundle(&mut self, bundle: &str, graph: &SymbolGraph) {
        debug!(module = %graph.module.name, symbols = graph.symbols.len(), "adding symbol graph");
        let module_node = self.ensure_module(bundle, &graph.module.name);

        // Languages of this graph's symbols, for relationship endpoints.
        let mut graph_language: HashMap<&str, &str> = HashMap::new();
        for symbol in &graph.symbols {
            graph_language.insert(
                symbol.identifier.precise.as_str(),
                symbol.identifier.interface_language.as_str(),
            );
            self.ensure_symbol_node(bundle, symbol);
        }

        // Membership relationships first: they carry disambiguation, so
        // they beat path components.
        let mut attached: HashSet<String> = HashSet::new();
        for relationship in &graph.relationships {
            if !relationship.kind.is_membership() {
                continue;
            }
            let Some(mut source) = self.graph_node(&graph_language, &relationship.source) else {
                continue;
            };
            let targets = self.membership_targets(&graph_language, &relationship.target);
            // A dangling target (precise id in no ingested graph) leaves the
            // source unattached so the path-component fallback can bridge it
            // with a sparse placeholder.
            if targets.is_empty() {
                continue;
            }
            for target in targets {
                source = self.attach(target, source);
            }
            attached.insert(relationship.source.clone());
        }

        // Default implementations attach beside the requirement they
        // implement and lose unambiguous collisions to it.
        for relationship in &graph.relationships {
            if relationship.kind != RelationshipKind::DefaultImplementationOf {
                continue;
            }
            let Some(mut source) = self.graph_node(&graph_language, &relationship.source) else {
                continue;
            };
            let mut placed = false;
            for target in self.membership_targets(&graph_language, &relationship.target) {
                let Some(parent) = self.hierarchy.node(target).parent else {
                    continue;
                };
                self.hierarchy.node_mut(source).disfavored_in_collision = true;
                source = self.attach(parent, source);
                placed = true;
            }
            if placed {
                attached.insert(relationship.source.clone());
            }
        }

        // Top-level symbols sit directly under the module.
        for symbol in &graph.symbols {
            if symbol.path_components.len() != 1 {
                continue;
            }
            if let Some(node) = self.graph_node(&graph_language, &symbol.identifier.precise) {
                self.attach(module_node, node);
                attached.insert(symbol.identifier.precise.clone());
            }
        }

        // Everything still unattached is grafted by path components,
        // inserting sparse placeholders where parents are missing.
        for symbol in &graph.symbols {
            if attached.contains(&symbol.identifier.precise) {
                continue;
            }
            let Some(node) = self.graph_node(&graph_language, &symbol.identifier.precise) else {
                continue;
            };
            if self.hierarchy.node(node).parent.is_some() {
                continue;
            }
            self.graft_by_path_components(bundle, module_node, node, symbol);
        }
    }

    // ── Non-symbol grafting ───────────────────────────────────────────────

    /// Register an article under the articles container.
    pub fn add_article(&mut self, name: &str) -> NodeId {
        let bundle = self.bundle.clone();
        self.add_article_in_bundle(&bundle, name)
    }

    pub fn add_article_in_bundle(&mut self, bundle: &str, name: &str) -> NodeId {
        let container = self.hierarchy.articles_container;
        self.add_page(bundle, container, name, "article")
    }

    /// Register a tutorial under the tutorial container.
    pub fn add_tutorial(&mut self, name: &str) -> NodeId {
        let bundle = self.bundle.clone();
        let container = self.hierarchy.tutorial_container;
        self.add_page(&bundle, container, name, "tutorial")
    }

    /// Register a tutorial overview under the overview container.
    pub fn add_tutorial_overview(&mut self, name: &str) -> NodeId {
        let bundle = self.bundle.clone();
        let container = self.hierarchy.tutorial_overview_container;
        self.add_page(&bundle, container, name, "tutorialOverview")
    }

    /// Inject a technology root beside the modules.
    pub fn add_technology(&mut self, name: &str) -> NodeId {
        let node = self
            .hierarchy
            .create_non_symbol(name, "technology", Some(LinkId::next()));
        self.hierarchy.modules.insert(name.to_string(), node);
        self.node_bundles.insert(node, self.bundle.clone());
        node
    }

    /// Attach an on-page anchor under its owning page.
    pub fn add_anchor(&mut self, owner: NodeId, name: &str) -> NodeId {
        self.add_owned(owner, name, "anchor")
    }

    /// Attach a task group under its containing page.
    pub fn add_task_group(&mut self, owner: NodeId, name: &str) -> NodeId {
        self.add_owned(owner, name, "taskGroup")
    }

    /// Attach a tutorial landmark under its tutorial.
    pub fn add_landmark(&mut self, tutorial: NodeId, name: &str) -> NodeId {
        self.add_owned(tutorial, name, "landmark")
    }

    /// Nest a volume under a technology root.
    pub fn add_volume(&mut self, technology: NodeId, name: &str) -> NodeId {
        self.add_owned(technology, name, "volume")
    }

    /// Nest a chapter under a volume.
    pub fn add_chapter(&mut self, volume: NodeId, name: &str) -> NodeId {
        self.add_owned(volume, name, "chapter")
    }

    /// Freeze the hierarchy: build the lookup table and reference maps and
    /// hand the result to the read-only resolver.
    pub fn finish(mut self) -> LinkResolver {
        self.hierarchy.rebuild_lookup();
        self.assert_rooted();
        LinkResolver::assemble(
            self.hierarchy,
            self.node_bundles,
            self.bundle,
            self.display_name,
            self.primary_language,
        )
    }

    /// Read access for tests and non-symbol grafting callers that need to
    /// locate owners before the freeze point.
    pub fn hierarchy(&self) -> &PathHierarchy {
        &self.hierarchy
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Every findable node has a parent or is a registered root. A violation
    /// is a builder bug, not an input problem.
    fn assert_rooted(&self) {
        let mut roots: HashSet<NodeId> = self.hierarchy.modules.values().copied().collect();
        roots.extend([
            self.hierarchy.articles_container,
            self.hierarchy.tutorial_container,
            self.hierarchy.tutorial_overview_container,
        ]);
        for &node in self.hierarchy.lookup.values() {
            assert!(
                self.hierarchy.node(node).parent.is_some() || roots.contains(&node),
                "hierarchy node `{}` has neither parent nor root registration",
                self.hierarchy.node(node).name
            );
        }
    }

    fn add_page(&mut self, bundle: &str, container: NodeId, name: &str, kind: &str) -> NodeId {
        let node = self
            .hierarchy
            .create_non_symbol(name, kind, Some(LinkId::next()));
        self.node_bundles.insert(node, bundle.to_string());
        self.hierarchy.add_child(container, node)
    }

    fn add_owned(&mut self, owner: NodeId, name: &str, kind: &str) -> NodeId {
        let bundle = self
            .node_bundles
            .get(&owner)
            .cloned()
            .unwrap_or_else(|| self.bundle.clone());
        let node = self
            .hierarchy
            .create_non_symbol(name, kind, Some(LinkId::next()));
        self.node_bundles.insert(node, bundle);
        self.hierarchy.add_child(owner, node)
    }

    /// Reuse the module root when any earlier graph created it, else
    /// synthesize a module symbol and register it as a root.
    fn ensure_module(&mut self, bundle: &str, name: &str) -> NodeId {
        if let Some(&node) = self.hierarchy.modules.get(name) {
            return node;
        }
        let record = SymbolRecord {
            precise: name.to_string(),
            language: self.primary_language.clone(),
            kind_id: "module".to_string(),
            stable_hash: stable_hash(name),
            path_components: vec![name.to_string()],
            declaration: None,
            languages: BTreeSet::from([self.primary_language.clone()]),
            title: name.to_string(),
        };
        let node = self.hierarchy.create_node(Node {
            name: name.to_string(),
            symbol: Some(record),
            non_symbol_kind: None,
            parent: None,
            children: BTreeMap::new(),
            identifier: Some(LinkId::next()),
            disfavored_in_collision: false,
        });
        self.hierarchy.modules.insert(name.to_string(), node);
        self.node_bundles.insert(node, bundle.to_string());
        debug!(module = name, "synthesized module root");
        node
    }

    /// Reuse the node for `(precise, interfaceLanguage)` or create it.
    fn ensure_symbol_node(&mut self, bundle: &str, symbol: &Symbol) -> NodeId {
        let key = (
            symbol.identifier.precise.clone(),
            symbol.identifier.interface_language.clone(),
        );
        if let Some(&node) = self.symbol_index.get(&key) {
            return node;
        }

        let name = symbol
            .path_components
            .last()
            .map_or(symbol.names.title.as_str(), String::as_str);
        let record = SymbolRecord {
            precise: symbol.identifier.precise.clone(),
            language: symbol.identifier.interface_language.clone(),
            kind_id: symbol.kind_id().to_string(),
            stable_hash: stable_hash(&symbol.identifier.precise),
            path_components: symbol.path_components.clone(),
            declaration: symbol.declaration_text(),
            languages: BTreeSet::from([symbol.identifier.interface_language.clone()]),
            title: symbol.names.title.clone(),
        };
        let node = self.hierarchy.create_node(Node {
            name: name.to_string(),
            symbol: Some(record),
            non_symbol_kind: None,
            parent: None,
            children: BTreeMap::new(),
            identifier: Some(LinkId::next()),
            disfavored_in_collision: symbol.is_synthesized(),
        });
        self.symbol_index.insert(key, node);
        self.node_bundles.insert(node, bundle.to_string());
        node
    }

    /// The node for a precise id in this graph's language.
    fn graph_node(
        &self,
        graph_language: &HashMap<&str, &str>,
        precise: &str,
    ) -> Option<NodeId> {
        let language = graph_language.get(precise)?;
        self.symbol_index
            .get(&(precise.to_string(), (*language).to_string()))
            .copied()
    }

    /// Targets of a membership relationship. A target in this graph wins;
    /// otherwise every node with the precise id matches, so cross-module
    /// extensions attach under each language variant.
    fn membership_targets(
        &self,
        graph_language: &HashMap<&str, &str>,
        target: &str,
    ) -> Vec<NodeId> {
        if let Some(node) = self.graph_node(graph_language, target) {
            return vec![node];
        }
        let mut matches: Vec<(&String, NodeId)> = self
            .symbol_index
            .iter()
            .filter(|((precise, _), _)| precise == target)
            .map(|((_, language), &node)| (language, node))
            .collect();
        matches.sort();
        matches.into_iter().map(|(_, node)| node).collect()
    }

    /// Attach and keep the index coherent when the attachment merged the
    /// child into an existing node.
    fn attach(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        let survivor = self.hierarchy.add_child(parent, child);
        if survivor != child {
            for value in self.symbol_index.values_mut() {
                if *value == child {
                    *value = survivor;
                }
            }
            if let Some(bundle) = self.node_bundles.remove(&child) {
                self.node_bundles.entry(survivor).or_insert(bundle);
            }
        }
        survivor
    }

    /// Graft an unattached symbol by walking its path components from the
    /// module root, inserting sparse placeholders for missing parents.
    fn graft_by_path_components(
        &mut self,
        bundle: &str,
        module_node: NodeId,
        node: NodeId,
        symbol: &Symbol,
    ) {
        let components: Vec<PathComponent> = self
            .known_disambiguated
            .get(&symbol.identifier.precise)
            .filter(|known| known.len() == symbol.path_components.len())
            .unwrap_or(&symbol.path_components)
            .iter()
            .map(|c| parse_segment(c, 0..c.len()))
            .collect();

        let mut current = module_node;
        for component in components.iter().take(components.len().saturating_sub(1)) {
            current = self.step_or_placeholder(bundle, current, component);
        }
        self.attach(current, node);
    }

    /// Descend one component, inserting a disfavored placeholder when the
    /// child is missing.
    fn step_or_placeholder(
        &mut self,
        bundle: &str,
        current: NodeId,
        component: &PathComponent,
    ) -> NodeId {
        if let Some((tree, used_full)) = self.hierarchy.child_tree(current, component) {
            let kind = if used_full { None } else { component.kind.as_deref() };
            let hash = if used_full { None } else { component.hash.as_deref() };
            match tree.find(kind, hash) {
                Ok(node) => return node,
                Err(crate::disambiguation::TreeError::Collision(candidates)) => {
                    if let Some(&(node, _)) = candidates.first() {
                        return node;
                    }
                }
                Err(crate::disambiguation::TreeError::NotFound) => {}
            }
        }

        debug!(name = %component.name, "inserting sparse placeholder");
        let placeholder = self.hierarchy.create_placeholder(&component.name);
        self.node_bundles.insert(placeholder, bundle.to_string());
        let kind = component.kind.clone().unwrap_or_else(|| NONE_KEY.to_string());
        let hash = component.hash.clone().unwrap_or_else(|| NONE_KEY.to_string());
        self.hierarchy
            .add_child_keyed(current, &component.name, &kind, &hash, placeholder)
    }
}
