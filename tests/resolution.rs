//! End-to-end resolution scenarios against the library.

use doclink::builder::HierarchyBuilder;
use doclink::error::Error;
use doclink::hasher::stable_hash;
use doclink::symbol_graph::SymbolGraph;

fn graph(value: serde_json::Value) -> SymbolGraph {
    serde_json::from_value(value).unwrap()
}

fn symbol(precise: &str, language: &str, kind: &str, path: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "identifier": {"precise": precise, "interfaceLanguage": language},
        "kind": {"identifier": kind},
        "names": {"title": path.last().unwrap()},
        "pathComponents": path,
    })
}

fn member(source: &str, target: &str) -> serde_json::Value {
    serde_json::json!({"source": source, "target": target, "kind": "memberOf"})
}

/// Module `M` with `struct Foo { func bar() }` and `class Foo { func bar() }`.
fn colliding_foo_graph() -> SymbolGraph {
    graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [
            symbol("s:M3FooV", "swift", "swift.struct", &["Foo"]),
            symbol("s:M3FooC", "swift", "swift.class", &["Foo"]),
            symbol("s:M3FooV3baryyF", "swift", "swift.method", &["Foo", "bar()"]),
            symbol("s:M3FooC3baryyF", "swift", "swift.method", &["Foo", "bar()"]),
        ],
        "relationships": [
            member("s:M3FooV3baryyF", "s:M3FooV"),
            member("s:M3FooC3baryyF", "s:M3FooC"),
        ],
    }))
}

fn resolver_for(graphs: &[SymbolGraph]) -> doclink::LinkResolver {
    let mut builder = HierarchyBuilder::new("com.example.m", "Example", "swift");
    builder.add_symbol_graphs(graphs);
    builder.finish()
}

#[test]
fn ambiguous_container_is_a_lookup_collision() {
    let resolver = resolver_for(&[colliding_foo_graph()]);

    let err = resolver.find("/M/Foo/bar()", None, true).unwrap_err();
    let Error::LookupCollision { candidates, .. } = err else {
        panic!("expected LookupCollision, got {err:?}");
    };
    let suffixes: Vec<&str> = candidates.iter().map(|c| c.suffix.as_str()).collect();
    assert!(suffixes.contains(&"-struct"), "candidates: {candidates:?}");
    assert!(suffixes.contains(&"-class"), "candidates: {candidates:?}");
}

#[test]
fn kind_disambiguation_resolves_the_collision() {
    let resolver = resolver_for(&[colliding_foo_graph()]);

    let link = resolver.find("/M/Foo-struct/bar()", None, true).unwrap();
    let reference = resolver
        .resolve("/M/Foo-struct/bar()", None, true)
        .unwrap();
    assert_eq!(reference.path, "/M/Foo-struct/bar()");

    // The emitted path round-trips to the same node.
    assert_eq!(
        resolver.paths().get("s:M3FooV3baryyF"),
        Some(&"/M/Foo-struct/bar()".to_string())
    );
    assert_eq!(
        resolver.find("/M/Foo-struct/bar()", None, true).unwrap(),
        link
    );
}

#[test]
fn unique_members_need_no_disambiguation() {
    let color = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [
            symbol("s:M5ColorO", "swift", "swift.enum", &["Color"]),
            symbol("s:M5ColorO3redyA2CmF", "swift", "swift.enum.case", &["Color", "red"]),
        ],
        "relationships": [member("s:M5ColorO3redyA2CmF", "s:M5ColorO")],
    }));
    let resolver = resolver_for(&[color]);

    assert_eq!(
        resolver.paths().get("s:M5ColorO3redyA2CmF"),
        Some(&"/M/Color/red".to_string())
    );
    assert!(resolver.find("/M/Color/red", None, true).is_ok());
}

/// Protocol requirement beside its default implementation.
fn protocol_graph() -> SymbolGraph {
    graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [
            symbol("s:MP", "swift", "swift.protocol", &["P"]),
            symbol("s:MP3fooyyF", "swift", "swift.method", &["P", "foo()"]),
            symbol("s:MPE3fooyyF", "swift", "swift.method", &["P", "foo()"]),
        ],
        "relationships": [
            {"source": "s:MP3fooyyF", "target": "s:MP", "kind": "requirementOf"},
            {"source": "s:MPE3fooyyF", "target": "s:MP3fooyyF", "kind": "defaultImplementationOf"},
        ],
    }))
}

#[test]
fn requirement_wins_over_disfavored_default_implementation() {
    let resolver = resolver_for(&[protocol_graph()]);

    // The disfavored default implementation doesn't force a suffix onto
    // the requirement, so the unqualified link picks the requirement.
    let requirement = resolver.find("/M/P/foo()", None, true).unwrap();
    assert_eq!(
        resolver.paths().get("s:MP3fooyyF"),
        Some(&"/M/P/foo()".to_string())
    );

    let implementation_hash = stable_hash("s:MPE3fooyyF");
    let implementation_path = format!("/M/P/foo()-{implementation_hash}");
    assert_eq!(
        resolver.paths().get("s:MPE3fooyyF"),
        Some(&implementation_path)
    );
    let implementation = resolver.find(&implementation_path, None, true).unwrap();
    assert_ne!(requirement, implementation);
}

#[test]
fn sparse_parent_becomes_an_unfindable_placeholder() {
    let sparse = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [symbol("s:MAB", "swift", "swift.method", &["A", "B"])],
        "relationships": [],
    }));
    let resolver = resolver_for(&[sparse]);

    let err = resolver.find("/M/A", None, false).unwrap_err();
    assert!(
        matches!(err, Error::UnfindableMatch { .. }),
        "expected UnfindableMatch, got {err:?}"
    );
    assert!(resolver.find("/M/A/B", None, true).is_ok());
}

#[test]
fn dangling_membership_target_falls_back_to_path_components() {
    // The member's sole relationship points at a precise id that no graph
    // defines, so the builder must graft it under a sparse placeholder
    // instead of leaving it unattached.
    let sparse = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [symbol("s:MAB", "swift", "swift.method", &["A", "B()"])],
        "relationships": [member("s:MAB", "s:MA")],
    }));
    let resolver = resolver_for(&[sparse]);

    assert!(resolver.find("/M/A/B()", None, true).is_ok());
    let err = resolver.find("/M/A", None, false).unwrap_err();
    assert!(
        matches!(err, Error::UnfindableMatch { .. }),
        "expected UnfindableMatch, got {err:?}"
    );
}

#[test]
fn known_disambiguated_components_carry_into_partial_graphs() {
    let sparse = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [symbol("s:MAB", "swift", "swift.method", &["A", "B"])],
        "relationships": [],
    }));
    let mut builder = HierarchyBuilder::new("com.example.m", "Example", "swift");
    builder.set_known_disambiguated_path_components(
        "s:MAB",
        vec!["A-struct".to_string(), "B".to_string()],
    );
    builder.add_symbol_graph(&sparse);
    let resolver = builder.finish();

    assert!(resolver.find("/M/A-struct/B", None, true).is_ok());
}

#[test]
fn relative_links_ascend_past_the_parent() {
    let shapes = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [
            symbol("s:M3FooV", "swift", "swift.struct", &["Foo"]),
            symbol("s:M3BarV", "swift", "swift.struct", &["Bar"]),
            symbol("s:M3BarV3BazV", "swift", "swift.struct", &["Bar", "Baz"]),
        ],
        "relationships": [member("s:M3BarV3BazV", "s:M3BarV")],
    }));
    let resolver = resolver_for(&[shapes]);
    let baz = resolver.find("/M/Bar/Baz", None, true).unwrap();
    let foo = resolver.find("/M/Foo", None, true).unwrap();

    // Sibling lookup from a nested page walks up to the module.
    assert_eq!(resolver.find("Foo", Some(baz), true).unwrap(), foo);
    // `..` pops one level before the walk-up begins.
    assert_eq!(resolver.find("../Foo", Some(baz), true).unwrap(), foo);
}

#[test]
fn removing_a_bundle_keeps_other_bundles_resolvable() {
    let mut builder = HierarchyBuilder::new("com.example.other", "Example", "swift");
    let shapes = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [symbol("s:M3FooV", "swift", "swift.struct", &["Foo"])],
        "relationships": [],
    }));
    builder.add_symbol_graph_in_bundle("com.example.m", &shapes);
    builder.add_article("GettingStarted");
    let mut resolver = builder.finish();

    assert!(resolver.find("/M/Foo", None, true).is_ok());
    resolver.remove_bundle("com.example.m");

    let err = resolver.find("/M/Foo", None, true).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");
    assert!(resolver.resolve("GettingStarted", None, false).is_ok());
}

#[test]
fn empty_link_is_not_found_with_no_remaining_components() {
    let resolver = resolver_for(&[colliding_foo_graph()]);
    let err = resolver.find("", None, false).unwrap_err();
    let Error::NotFound { remaining, .. } = err else {
        panic!("expected NotFound, got {err:?}");
    };
    assert!(remaining.is_empty());
}

#[test]
fn pure_fragment_resolves_to_the_parent_anchor() {
    let mut builder = HierarchyBuilder::new("com.example.m", "Example", "swift");
    let article = builder.add_article("GettingStarted");
    builder.add_anchor(article, "overview");
    let resolver = builder.finish();

    let parent = resolver.find("/GettingStarted", None, false).unwrap();
    let anchor = resolver.find("#overview", Some(parent), false).unwrap();
    let reference = resolver.resolve("#overview", Some(&resolver.resolve("GettingStarted", None, false).unwrap()), false);
    assert!(reference.is_ok());
    assert_ne!(anchor, parent);

    let err = resolver.find("#missing", Some(parent), false).unwrap_err();
    assert!(matches!(err, Error::UnknownName { .. }), "got {err:?}");
}

#[test]
fn hyphenated_names_without_known_suffixes_stay_verbatim() {
    let hyphens = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [symbol("s:MFooBar", "swift", "swift.struct", &["Foo-Bar"])],
        "relationships": [],
    }));
    let resolver = resolver_for(&[hyphens]);
    assert!(resolver.find("/M/Foo-Bar", None, true).is_ok());
}

#[test]
fn primary_language_wins_without_disambiguation() {
    let multi = graph(serde_json::json!({
        "module": {"name": "M"},
        "symbols": [
            symbol("c:@S@Shape", "swift", "swift.struct", &["Shape"]),
            symbol("c:@S@Shape", "objc", "objc.class", &["Shape"]),
        ],
        "relationships": [],
    }));
    let resolver = resolver_for(&[multi]);

    let default = resolver.resolve("/M/Shape", None, true).unwrap();
    assert!(default.languages.contains("swift"), "{default:?}");

    let variant = resolver.resolve("/M/Shape-objc.class", None, true).unwrap();
    assert!(variant.languages.contains("objc"), "{variant:?}");
}

#[test]
fn builds_are_deterministic() {
    let build = || {
        let resolver = resolver_for(&[colliding_foo_graph(), protocol_graph()]);
        (resolver.dump(), resolver.paths().clone())
    };
    let (first_dump, first_paths) = build();
    let (second_dump, second_paths) = build();
    assert_eq!(first_dump, second_dump);
    assert_eq!(first_paths, second_paths);
}

#[test]
fn emitted_paths_are_injective_and_round_trip() {
    let resolver = resolver_for(&[colliding_foo_graph(), protocol_graph()]);

    let mut seen = std::collections::HashSet::new();
    for (precise, path) in resolver.paths() {
        assert!(seen.insert(path.clone()), "duplicate path {path}");
        assert!(
            resolver.find(path, None, true).is_ok(),
            "emitted path for {precise} does not resolve: {path}"
        );
    }
}

#[test]
fn stripping_the_last_disambiguation_breaks_resolution() {
    // Only favored siblings here: disfavored nodes intentionally resolve
    // to their favored sibling when the suffix is dropped.
    let resolver = resolver_for(&[colliding_foo_graph()]);

    for path in resolver.paths().values() {
        let (prefix, last) = path.rsplit_once('/').unwrap();
        let component = doclink::parser::parse_segment(last, 0..last.len());
        if !component.is_disambiguated() {
            continue;
        }
        let stripped = format!("{prefix}/{}", component.name);
        let err = resolver.find(&stripped, None, true);
        assert!(
            matches!(
                err,
                Err(Error::LookupCollision { .. } | Error::UnknownName { .. })
            ),
            "stripping {path} to {stripped} should be ambiguous, got {err:?}"
        );
    }
}

#[test]
fn every_symbol_is_reachable_from_its_parent() {
    let resolver = resolver_for(&[colliding_foo_graph(), protocol_graph()]);
    let hierarchy = resolver.hierarchy();

    for id in hierarchy.symbol_nodes() {
        let node = hierarchy.node(id);
        let Some(parent) = node.parent else {
            continue;
        };
        let listed = hierarchy
            .node(parent)
            .children
            .get(&node.name)
            .is_some_and(|tree| tree.nodes().contains(&id));
        assert!(listed, "node {} missing from its parent's children", node.name);
    }
}

#[test]
fn traversal_pairs_symbols_with_parents() {
    let resolver = resolver_for(&[protocol_graph()]);
    let mut pairs = Vec::new();
    resolver.traverse_symbol_and_parent_pairs(|symbol, parent| {
        pairs.push((symbol.path.clone(), parent.map(|p| p.path.clone())));
    });
    assert!(pairs
        .iter()
        .any(|(path, parent)| path == "/M/P" && parent.as_deref() == Some("/M")));
    assert!(pairs.iter().any(|(_, parent)| parent.as_deref() == Some("/M/P")));
}

#[test]
fn linkable_entities_are_sorted_by_path() {
    let resolver = resolver_for(&[colliding_foo_graph()]);
    let entities = resolver.linkable_entities();
    let paths: Vec<&str> = entities.iter().map(|e| e.path.as_str()).collect();
    let mut sorted = paths.clone();
    sorted.sort_unstable();
    assert_eq!(paths, sorted);
    assert!(entities.iter().any(|e| e.path == "/M/Foo-struct"));
}
