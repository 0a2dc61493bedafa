//! Link resolution against a frozen path hierarchy.
//!
//! `LinkResolver` owns the hierarchy plus the bidirectional map between node
//! identifiers and resolved references. Mutation (bundle removal) requires
//! `&mut self`; resolution takes `&self`, so the borrow checker enforces the
//! freeze point before parallel resolution begins.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::diagnostics::{self, ErrorInfo};
use crate::disambiguation::{Disambiguation, DisambiguationTree, TreeError, NONE_KEY};
use crate::emitter;
use crate::error::{Candidate, Error};
use crate::fallback::{candidate_urls, ExternalResolver, FallbackCache, FallbackResolver};
use crate::hierarchy::{NodeId, PathHierarchy};
use crate::identifier::{intern, LinkId, TopicCategory, TopicId};
use crate::parser::{self, ParsedPath, PathComponent};
use crate::reference::{LinkableEntity, ResolvedReference, UnresolvedReference};

/// Read-only resolver over a fully built hierarchy.
pub struct LinkResolver {
    hierarchy: PathHierarchy,
    node_bundles: HashMap<NodeId, String>,
    bundle: String,
    display_name: String,
    primary_language: String,
    /// Locally registered bundles, for external-resolver routing.
    local_bundles: BTreeSet<String>,
    references: BTreeMap<LinkId, ResolvedReference>,
    /// Reverse side of the reference map, keyed by absolute URL.
    reference_ids: HashMap<String, LinkId>,
    paths_by_precise: BTreeMap<String, String>,
    external: BTreeMap<String, Box<dyn ExternalResolver>>,
    fallback: Option<Box<dyn FallbackResolver>>,
    fallback_cache: FallbackCache,
}

impl LinkResolver {
    /// Freeze a built hierarchy into a resolver. Called by
    /// `HierarchyBuilder::finish`.
    pub(crate) fn assemble(
        hierarchy: PathHierarchy,
        node_bundles: HashMap<NodeId, String>,
        bundle: String,
        display_name: String,
        primary_language: String,
    ) -> Self {
        let paths_by_precise = emitter::disambiguated_paths(&hierarchy, &primary_language, false);

        let mut resolver = Self {
            local_bundles: node_bundles.values().cloned().collect(),
            hierarchy,
            node_bundles,
            bundle,
            display_name,
            primary_language,
            references: BTreeMap::new(),
            reference_ids: HashMap::new(),
            paths_by_precise,
            external: BTreeMap::new(),
            fallback: None,
            fallback_cache: FallbackCache::default(),
        };
        resolver.local_bundles.insert(resolver.bundle.clone());
        resolver.rebuild_references();
        resolver
    }

    /// Install the fallback resolver consulted on hierarchy misses.
    pub fn set_fallback_resolver(&mut self, fallback: Box<dyn FallbackResolver>) {
        self.fallback = Some(fallback);
    }

    /// Register a resolver for links into an external bundle.
    pub fn register_external_resolver(&mut self, bundle: &str, resolver: Box<dyn ExternalResolver>) {
        self.external.insert(bundle.to_string(), resolver);
    }

    // ── Public query surface ──────────────────────────────────────────────

    /// Resolve a link relative to an optional parent page.
    ///
    /// # Errors
    ///
    /// Returns the formatted diagnostic for any §7-style resolution failure
    /// after external and fallback resolvers have been consulted.
    pub fn resolve(
        &self,
        link: &str,
        parent: Option<&ResolvedReference>,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference, ErrorInfo> {
        let unresolved = UnresolvedReference::parse(link);

        if let Some(bundle) = &unresolved.bundle {
            if !self.local_bundles.contains(bundle) {
                if let Some(external) = self.external.get(bundle) {
                    return external
                        .resolve(&unresolved, is_symbol_link)
                        .map_err(|e| diagnostics::error_info(&e, link));
                }
            }
        }

        let parent_id = parent.and_then(|p| self.reference_ids.get(&p.url()).copied());
        match self.find(&unresolved.path, parent_id, is_symbol_link) {
            Ok(id) => self
                .references
                .get(&id)
                .cloned()
                .ok_or_else(|| diagnostics::error_info(&Error::UnknownParent { link: link.to_string() }, link)),
            Err(err) => {
                // Only a genuine miss consults the fallback; collisions and
                // flavor mismatches keep their diagnostics.
                let is_miss = matches!(err, Error::NotFound { .. } | Error::UnknownName { .. });
                if is_miss {
                    if let Some(resolved) =
                        self.resolve_via_fallback(&unresolved, parent, is_symbol_link)
                    {
                        return Ok(resolved);
                    }
                }
                Err(diagnostics::error_info(&err, link))
            }
        }
    }

    /// Resolve a link to a node identifier, without diagnostics formatting.
    ///
    /// # Errors
    ///
    /// Returns the raw error taxonomy: `NotFound`, `UnknownName`,
    /// `UnknownDisambiguation`, `LookupCollision`,
    /// `NonSymbolMatchForSymbolLink`, or `UnfindableMatch`.
    pub fn find(
        &self,
        path: &str,
        parent: Option<LinkId>,
        only_find_symbols: bool,
    ) -> Result<LinkId, Error> {
        let parsed = parser::parse(path, true);

        if parsed.components.is_empty() {
            if let (Some(fragment), Some(parent)) = (parsed.fragment.as_ref(), parent) {
                if let Some(&parent_node) = self.hierarchy.lookup.get(&parent) {
                    let partial = self.partial_of(parent_node);
                    let node = self.match_anchor(parent_node, fragment, path, &partial)?;
                    return self.post_check(node, path, only_find_symbols);
                }
            }
            return Err(Error::NotFound {
                link: path.to_string(),
                remaining: Vec::new(),
                available_roots: self.hierarchy.root_names(),
            });
        }

        let node = if parsed.is_absolute {
            self.resolve_from_roots(&parsed.components, parsed.fragment.as_ref(), path, only_find_symbols)?
        } else if let Some(parent) = parent.and_then(|p| self.hierarchy.lookup.get(&p).copied()) {
            self.resolve_relative(&parsed, parent, path, only_find_symbols)?
        } else {
            self.resolve_from_roots(&parsed.components, parsed.fragment.as_ref(), path, only_find_symbols)?
        };

        self.post_check(node, path, only_find_symbols)
    }

    /// The canonical disambiguated URL path for every symbol.
    pub fn paths(&self) -> &BTreeMap<String, String> {
        &self.paths_by_precise
    }

    /// The parent page of a resolved reference, if it has one.
    pub fn parent_of(&self, reference: &ResolvedReference) -> Option<ResolvedReference> {
        let link = self.reference_ids.get(&reference.url())?;
        let node = self.hierarchy.lookup.get(link)?;
        let parent = self.hierarchy.node(*node).parent?;
        let parent_link = self.hierarchy.node(parent).identifier?;
        self.references.get(&parent_link).cloned()
    }

    /// References of every module root, sorted by module name.
    pub fn modules(&self) -> Vec<ResolvedReference> {
        self.hierarchy
            .modules
            .values()
            .filter_map(|&node| self.reference_of(node))
            .collect()
    }

    /// References of every symbol sitting directly under a module root.
    pub fn top_level_symbols(&self) -> Vec<ResolvedReference> {
        let mut out = Vec::new();
        for &module in self.hierarchy.modules.values() {
            for tree in self.hierarchy.node(module).children.values() {
                for node in tree.nodes() {
                    if self.hierarchy.node(node).symbol.is_some() {
                        if let Some(reference) = self.reference_of(node) {
                            out.push(reference);
                        }
                    }
                }
            }
        }
        out
    }

    /// Visit every symbol reference with its parent reference.
    pub fn traverse_symbol_and_parent_pairs(
        &self,
        mut callback: impl FnMut(&ResolvedReference, Option<&ResolvedReference>),
    ) {
        for node in self.hierarchy.symbol_nodes() {
            let Some(reference) = self.hierarchy.node(node).identifier.and_then(|l| self.references.get(&l))
            else {
                continue;
            };
            let parent = self
                .hierarchy
                .node(node)
                .parent
                .and_then(|p| self.hierarchy.node(p).identifier)
                .and_then(|l| self.references.get(&l));
            callback(reference, parent);
        }
    }

    /// Summaries of every addressable page, sorted by path, in the shape
    /// serialized as `linkable-entities.json`.
    pub fn linkable_entities(&self) -> Vec<LinkableEntity> {
        let mut entities: Vec<LinkableEntity> = self
            .references
            .iter()
            .filter_map(|(link, reference)| {
                let node = self.hierarchy.lookup.get(link)?;
                let node = self.hierarchy.node(*node);
                let (title, kind) = match (&node.symbol, &node.non_symbol_kind) {
                    (Some(symbol), _) => (symbol.title.clone(), symbol.kind_id.clone()),
                    (None, Some(kind)) => (node.name.clone(), kind.clone()),
                    (None, None) => return None,
                };
                Some(LinkableEntity {
                    path: reference.path.clone(),
                    title,
                    kind,
                    languages: reference.languages.iter().cloned().collect(),
                })
            })
            .collect();
        entities.sort_by(|a, b| (&a.path, &a.title).cmp(&(&b.path, &b.title)));
        entities
    }

    /// Unregister a bundle: its identifiers become unfindable, but nodes
    /// stay in the tree so subtrees remain traversable during
    /// re-registration.
    pub fn remove_bundle(&mut self, bundle: &str) {
        debug!(bundle, "removing bundle");
        let removed: Vec<LinkId> = self
            .references
            .iter()
            .filter(|(_, r)| r.bundle == bundle)
            .map(|(&link, _)| link)
            .collect();

        for link in removed {
            if let Some(reference) = self.references.remove(&link) {
                self.reference_ids.remove(&reference.url());
            }
            if let Some(node) = self.hierarchy.lookup.remove(&link) {
                self.hierarchy.node_mut(node).identifier = None;
                let precise = self
                    .hierarchy
                    .node(node)
                    .symbol
                    .as_ref()
                    .map(|s| s.precise.clone());
                if let Some(precise) = precise {
                    self.paths_by_precise.remove(&precise);
                }
            }
        }

        let node_bundles = &self.node_bundles;
        self.hierarchy
            .modules
            .retain(|_, node| node_bundles.get(node).is_none_or(|b| b != bundle));
        self.local_bundles.remove(bundle);
    }

    /// Debug dump of the hierarchy with box-drawing glyphs.
    pub fn dump(&self) -> String {
        self.hierarchy.dump()
    }

    /// The underlying hierarchy, read-only.
    pub fn hierarchy(&self) -> &PathHierarchy {
        &self.hierarchy
    }

    // ── Root-level resolution ─────────────────────────────────────────────

    fn resolve_from_roots(
        &self,
        components: &[PathComponent],
        fragment: Option<&PathComponent>,
        link: &str,
        only_find_symbols: bool,
    ) -> Result<NodeId, Error> {
        let first = &components[0];

        if !only_find_symbols {
            for container in [
                self.hierarchy.articles_container,
                self.hierarchy.tutorial_container,
            ] {
                if self.hierarchy.node(container).name == first.full {
                    return self.descend(container, &components[1..], fragment, link, only_find_symbols);
                }
                if self.hierarchy.any_child_matches(container, first) {
                    return self.descend(container, components, fragment, link, only_find_symbols);
                }
            }
            let overview = self.hierarchy.tutorial_overview_container;
            if self.hierarchy.any_child_matches(overview, first) {
                return self.descend(overview, components, fragment, link, only_find_symbols);
            }
        }

        let module = self
            .hierarchy
            .modules
            .get(&first.name)
            .or_else(|| self.hierarchy.modules.get(&first.full))
            .copied();
        if let Some(module) = module {
            if self.hierarchy.node(module).matches_component(first)
                || self.hierarchy.node(module).name == first.full
            {
                return self.descend(module, &components[1..], fragment, link, only_find_symbols);
            }
        }

        let original = Error::NotFound {
            link: link.to_string(),
            remaining: components.to_vec(),
            available_roots: self.hierarchy.root_names(),
        };

        // With a single module the prefix may be omitted; the original
        // missing-module error is re-raised if the optimistic descent fails.
        if self.hierarchy.modules.len() == 1 {
            if let Some(&module) = self.hierarchy.modules.values().next() {
                if let Ok(node) =
                    self.descend(module, components, fragment, link, only_find_symbols)
                {
                    return Ok(node);
                }
            }
        }

        Err(original)
    }

    // ── Relative resolution ───────────────────────────────────────────────

    fn resolve_relative(
        &self,
        parsed: &ParsedPath,
        parent: NodeId,
        link: &str,
        only_find_symbols: bool,
    ) -> Result<NodeId, Error> {
        let mut components: &[PathComponent] = &parsed.components;
        let mut current = parent;

        // Leading `..` components each pop one level before the walk-up.
        while components.first().is_some_and(|c| c.full == "..") {
            components = &components[1..];
            match self.hierarchy.node(current).parent {
                Some(up) => current = up,
                None => break,
            }
        }
        if components.is_empty() {
            return Ok(current);
        }

        let total = components.len();
        let first = &components[0];
        let mut innermost: Option<(usize, Error)> = None;

        loop {
            let attempt = if self.hierarchy.any_child_matches(current, first) {
                Some(self.descend(current, components, parsed.fragment.as_ref(), link, only_find_symbols))
            } else if self.hierarchy.node(current).matches_component(first) {
                Some(self.descend(current, &components[1..], parsed.fragment.as_ref(), link, only_find_symbols))
            } else {
                None
            };

            if let Some(result) = attempt {
                match result {
                    Ok(node) => return Ok(node),
                    Err(err) => {
                        let depth = error_depth(&err, total);
                        if innermost.as_ref().is_none_or(|(d, _)| depth > *d) {
                            innermost = Some((depth, err));
                        }
                    }
                }
            }

            match self.hierarchy.node(current).parent {
                Some(up) => current = up,
                None => break,
            }
        }

        match self.resolve_from_roots(components, parsed.fragment.as_ref(), link, only_find_symbols) {
            Ok(node) => Ok(node),
            Err(root_err) => {
                let root_depth = error_depth(&root_err, total);
                match innermost {
                    Some((depth, err)) if depth >= root_depth => Err(err),
                    _ => Err(root_err),
                }
            }
        }
    }

    // ── Descent ───────────────────────────────────────────────────────────

    fn descend(
        &self,
        start: NodeId,
        components: &[PathComponent],
        fragment: Option<&PathComponent>,
        link: &str,
        only_find_symbols: bool,
    ) -> Result<NodeId, Error> {
        let mut current = start;
        let mut partial = self.partial_of(start);

        for (index, component) in components.iter().enumerate() {
            let Some((tree, used_full)) = self.hierarchy.child_tree(current, component) else {
                return Err(Error::UnknownName {
                    link: link.to_string(),
                    partial,
                    remaining: components[index..].to_vec(),
                    siblings: self.hierarchy.child_names(current),
                });
            };

            let kind = if used_full { None } else { component.kind.as_deref() };
            let hash = if used_full { None } else { component.hash.as_deref() };

            let next = match tree.find(kind, hash) {
                Ok(node) => {
                    self.check_language(node, component, tree, link, &partial, components, index)?
                }
                Err(TreeError::NotFound) => {
                    return Err(Error::UnknownDisambiguation {
                        link: link.to_string(),
                        partial,
                        remaining: components[index..].to_vec(),
                        candidates: self.make_candidates(component, tree.disambiguated_values()),
                    });
                }
                Err(TreeError::Collision(candidates)) => self.resolve_collision(
                    candidates,
                    components,
                    index,
                    only_find_symbols,
                    link,
                    &partial,
                )?,
            };

            partial.push(self.hierarchy.node(next).name.clone());
            current = next;
        }

        if let Some(fragment) = fragment {
            return self.match_anchor(current, fragment, link, &partial);
        }
        Ok(current)
    }

    /// Enforce a `lang.kind` language constraint on an otherwise unique
    /// match.
    #[allow(clippy::too_many_arguments)]
    fn check_language(
        &self,
        node: NodeId,
        component: &PathComponent,
        tree: &DisambiguationTree,
        link: &str,
        partial: &[String],
        components: &[PathComponent],
        index: usize,
    ) -> Result<NodeId, Error> {
        let Some(language) = &component.language else {
            return Ok(node);
        };
        let available = self
            .hierarchy
            .node(node)
            .symbol
            .as_ref()
            .is_some_and(|s| s.languages.contains(language));
        if available {
            return Ok(node);
        }

        // Another entry may carry the requested language variant.
        for (_, _, other) in tree.entries() {
            let matches = self
                .hierarchy
                .node(other)
                .symbol
                .as_ref()
                .is_some_and(|s| {
                    s.languages.contains(language)
                        && component
                            .kind
                            .as_ref()
                            .is_none_or(|k| *k == s.kind_id)
                });
            if matches {
                return Ok(other);
            }
        }

        Err(Error::UnknownDisambiguation {
            link: link.to_string(),
            partial: partial.to_vec(),
            remaining: components[index..].to_vec(),
            candidates: self.make_candidates(component, tree.disambiguated_values()),
        })
    }

    /// Pick among colliding candidates, or raise `LookupCollision`.
    fn resolve_collision(
        &self,
        mut candidates: Vec<(NodeId, Disambiguation)>,
        components: &[PathComponent],
        index: usize,
        only_find_symbols: bool,
        link: &str,
        partial: &[String],
    ) -> Result<NodeId, Error> {
        let component = &components[index];

        if let Some(language) = &component.language {
            let filtered: Vec<_> = candidates
                .iter()
                .filter(|(node, _)| {
                    self.hierarchy
                        .node(*node)
                        .symbol
                        .as_ref()
                        .is_some_and(|s| s.languages.contains(language))
                })
                .cloned()
                .collect();
            if filtered.len() == 1 {
                return Ok(filtered[0].0);
            }
            if !filtered.is_empty() {
                candidates = filtered;
            }
        }

        let is_terminal = index + 1 == components.len();
        if is_terminal {
            // Terminal policy: a lone favored candidate wins, then the lone
            // candidate matching the link flavor.
            let favored: Vec<_> = candidates
                .iter()
                .filter(|(node, _)| !self.hierarchy.node(*node).disfavored_in_collision)
                .collect();
            if favored.len() == 1 {
                return Ok(favored[0].0);
            }
            let flavored: Vec<_> = candidates
                .iter()
                .filter(|(node, _)| {
                    self.hierarchy.node(*node).symbol.is_some() == only_find_symbols
                })
                .collect();
            if flavored.len() == 1 {
                return Ok(flavored[0].0);
            }
        } else {
            // One-step look-ahead: a lone candidate that can resolve the
            // next component wins.
            let next = &components[index + 1];
            let matching: Vec<_> = candidates
                .iter()
                .filter(|(node, _)| self.hierarchy.any_child_matches(*node, next))
                .collect();
            if matching.len() == 1 {
                return Ok(matching[0].0);
            }
        }

        if let Some(node) = self.primary_of_same_precise(&candidates) {
            return Ok(node);
        }

        Err(Error::LookupCollision {
            link: link.to_string(),
            partial: partial.to_vec(),
            remaining: components[index..].to_vec(),
            candidates: self.make_candidates(component, candidates),
        })
    }

    /// When every candidate is one symbol surfaced in several languages,
    /// the primary language's variant wins.
    fn primary_of_same_precise(&self, candidates: &[(NodeId, Disambiguation)]) -> Option<NodeId> {
        let mut precise: Option<&str> = None;
        for (node, _) in candidates {
            let symbol = self.hierarchy.node(*node).symbol.as_ref()?;
            match precise {
                None => precise = Some(symbol.precise.as_str()),
                Some(seen) if seen == symbol.precise => {}
                Some(_) => return None,
            }
        }
        candidates
            .iter()
            .find(|(node, _)| {
                self.hierarchy
                    .node(*node)
                    .symbol
                    .as_ref()
                    .is_some_and(|s| s.language == self.primary_language)
            })
            .map(|(node, _)| *node)
    }

    /// Match a terminal fragment as an on-page anchor of `page`.
    fn match_anchor(
        &self,
        page: NodeId,
        fragment: &PathComponent,
        link: &str,
        partial: &[String],
    ) -> Result<NodeId, Error> {
        if let Some(tree) = self.hierarchy.node(page).children.get(&fragment.name) {
            for kind in ["anchor", "landmark"] {
                if let Some(node) = tree.get(kind, NONE_KEY) {
                    return Ok(node);
                }
            }
        }

        let anchors: Vec<String> = self
            .hierarchy
            .node(page)
            .children
            .iter()
            .filter(|(_, tree)| {
                tree.get("anchor", NONE_KEY).is_some() || tree.get("landmark", NONE_KEY).is_some()
            })
            .map(|(name, _)| name.clone())
            .collect();

        Err(Error::UnknownName {
            link: link.to_string(),
            partial: partial.to_vec(),
            remaining: vec![fragment.clone()],
            siblings: anchors,
        })
    }

    // ── Post-checks and helpers ───────────────────────────────────────────

    fn post_check(
        &self,
        node: NodeId,
        link: &str,
        only_find_symbols: bool,
    ) -> Result<LinkId, Error> {
        let payload = self.hierarchy.node(node);
        if let Some(identifier) = payload.identifier {
            if only_find_symbols && payload.symbol.is_none() {
                return Err(Error::NonSymbolMatchForSymbolLink {
                    link: link.to_string(),
                    name: payload.name.clone(),
                });
            }
            return Ok(identifier);
        }
        Err(Error::UnfindableMatch {
            name: payload.name.clone(),
        })
    }

    /// The resolved-path names from the root down to a node.
    fn partial_of(&self, node: NodeId) -> Vec<String> {
        self.hierarchy
            .canonical_path(node)
            .trim_start_matches('/')
            .split('/')
            .map(str::to_string)
            .collect()
    }

    fn make_candidates(
        &self,
        component: &PathComponent,
        values: Vec<(NodeId, Disambiguation)>,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = values
            .into_iter()
            .map(|(node, label)| {
                let payload = self.hierarchy.node(node);
                Candidate {
                    name: if payload.name.is_empty() {
                        component.name.clone()
                    } else {
                        payload.name.clone()
                    },
                    suffix: label.suffix(),
                    declaration: payload.symbol.as_ref().and_then(|s| s.declaration.clone()),
                }
            })
            .collect();
        candidates.sort_by(|a, b| (&a.name, &a.suffix).cmp(&(&b.name, &b.suffix)));
        candidates
    }

    fn reference_of(&self, node: NodeId) -> Option<ResolvedReference> {
        let link = self.hierarchy.node(node).identifier?;
        self.references.get(&link).cloned()
    }

    fn resolve_via_fallback(
        &self,
        unresolved: &UnresolvedReference,
        parent: Option<&ResolvedReference>,
        is_symbol_link: bool,
    ) -> Option<ResolvedReference> {
        let fallback = self.fallback.as_ref()?;
        for url in candidate_urls(&unresolved.path, parent, &self.bundle, &self.display_name) {
            if let Some(cached) = self.fallback_cache.get(&url) {
                return Some(cached);
            }
            let candidate = UnresolvedReference::parse(&url);
            if let Some(resolved) = fallback.resolve(&candidate, parent, is_symbol_link) {
                debug!(%url, "fallback resolver answered");
                self.fallback_cache.insert(url, resolved.clone());
                return Some(resolved);
            }
        }
        None
    }

    /// Rebuild the reference maps from the hierarchy lookup table.
    fn rebuild_references(&mut self) {
        self.references.clear();
        self.reference_ids.clear();

        let entries: Vec<(LinkId, NodeId)> = self
            .hierarchy
            .lookup
            .iter()
            .map(|(&link, &node)| (link, node))
            .collect();
        for (link, node) in entries {
            let reference = self.build_reference(node);
            self.reference_ids.insert(reference.url(), link);
            self.references.insert(link, reference);
        }
    }

    fn build_reference(&self, node: NodeId) -> ResolvedReference {
        let payload = self.hierarchy.node(node);
        let bundle = self
            .node_bundles
            .get(&node)
            .cloned()
            .unwrap_or_else(|| self.bundle.clone());

        if let Some(symbol) = &payload.symbol {
            let path = self
                .paths_by_precise
                .get(&symbol.precise)
                .cloned()
                .unwrap_or_else(|| self.hierarchy.canonical_path(node));
            let category = if symbol.kind_id == "module" {
                TopicCategory::Module
            } else {
                TopicCategory::Symbol
            };
            let topic = intern(TopicId {
                category,
                id: symbol.precise.clone(),
                bundle: Some(bundle.clone()),
                display_name: Some(symbol.title.clone()),
                fragment: None,
            });
            return ResolvedReference {
                bundle,
                topic,
                path,
                languages: symbol.languages.clone(),
                fragment: None,
            };
        }

        let kind = payload.non_symbol_kind.as_deref().unwrap_or("container");
        let is_on_page = matches!(kind, "anchor" | "landmark");
        let (path, fragment) = if is_on_page {
            let owner = payload.parent.map_or_else(
                || self.hierarchy.canonical_path(node),
                |p| self.hierarchy.canonical_path(p),
            );
            (owner, Some(payload.name.clone()))
        } else {
            (self.hierarchy.canonical_path(node), None)
        };

        let category = match kind {
            "article" => TopicCategory::Article,
            "tutorial" => TopicCategory::Tutorial,
            "tutorialOverview" => TopicCategory::TutorialTechnology,
            "technology" => TopicCategory::Technology,
            "volume" => TopicCategory::Volume,
            "chapter" => TopicCategory::Chapter,
            "anchor" | "landmark" => TopicCategory::AnchorViaFragment,
            _ => TopicCategory::Container,
        };
        let topic = intern(TopicId {
            category,
            id: format!("doc://{bundle}{path}"),
            bundle: Some(bundle.clone()),
            display_name: Some(payload.name.clone()),
            fragment: fragment.clone(),
        });
        ResolvedReference {
            bundle,
            topic,
            path,
            languages: BTreeSet::new(),
            fragment,
        }
    }
}

/// How deep an error got: components consumed before failing.
fn error_depth(error: &Error, total: usize) -> usize {
    let remaining = match error {
        Error::NotFound { remaining, .. }
        | Error::UnknownName { remaining, .. }
        | Error::UnknownDisambiguation { remaining, .. }
        | Error::LookupCollision { remaining, .. } => remaining.len(),
        _ => 0,
    };
    total.saturating_sub(remaining)
}
