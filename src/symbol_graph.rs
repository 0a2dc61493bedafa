//! The consumed symbol-graph data model.
//!
//! A graph carries one module's symbols and the relationships between them.
//! These types mirror the on-disk JSON shape; the builder never mutates
//! them.

use serde::{Deserialize, Serialize};

/// One module symbol graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolGraph {
    pub module: ModuleInfo,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// The module a graph describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
}

/// A single symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub identifier: SymbolIdentifier,
    pub kind: KindInfo,
    pub names: Names,
    #[serde(rename = "pathComponents")]
    pub path_components: Vec<String>,
    #[serde(rename = "declarationFragments", default)]
    pub declaration_fragments: Vec<DeclarationFragment>,
}

/// Marker substring in precise identifiers of synthesized symbols.
const SYNTHESIZED_MARKER: &str = "::SYNTHESIZED::";

impl Symbol {
    /// The kind identifier with any `language.` prefix stripped, so lookups
    /// by kind match across languages.
    pub fn kind_id(&self) -> &str {
        strip_language_prefix(&self.kind.identifier)
    }

    /// Flattened declaration text, or `None` if the symbol has no fragments.
    pub fn declaration_text(&self) -> Option<String> {
        if self.declaration_fragments.is_empty() {
            return None;
        }
        Some(
            self.declaration_fragments
                .iter()
                .map(|f| f.spelling.as_str())
                .collect::<Vec<_>>()
                .join(""),
        )
    }

    /// Whether this symbol was synthesized rather than declared in source.
    pub fn is_synthesized(&self) -> bool {
        self.identifier.precise.contains(SYNTHESIZED_MARKER)
    }
}

/// Strip a known `language.` prefix from a kind identifier.
pub fn strip_language_prefix(kind: &str) -> &str {
    for language in ["swift", "objc", "c", "cpp", "data", "javascript"] {
        if let Some(rest) = kind.strip_prefix(language) {
            if let Some(rest) = rest.strip_prefix('.') {
                return rest;
            }
        }
    }
    kind
}

/// The globally unique name of a symbol in one interface language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SymbolIdentifier {
    pub precise: String,
    #[serde(rename = "interfaceLanguage")]
    pub interface_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindInfo {
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Names {
    pub title: String,
}

/// One token of a declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationFragment {
    #[serde(default)]
    pub kind: String,
    pub spelling: String,
}

/// A directed edge between two symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
}

/// Relationship kinds the hierarchy builder understands. Unknown kinds
/// deserialize to `Other` and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    MemberOf,
    RequirementOf,
    OptionalRequirementOf,
    DefaultImplementationOf,
    ConformsTo,
    InheritsFrom,
    #[serde(other)]
    Other,
}

impl RelationshipKind {
    /// Whether this relationship places the source under the target.
    pub fn is_membership(self) -> bool {
        matches!(
            self,
            Self::MemberOf | Self::RequirementOf | Self::OptionalRequirementOf
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_language_prefix_is_stripped() {
        assert_eq!(strip_language_prefix("swift.struct"), "struct");
        assert_eq!(strip_language_prefix("func.op"), "func.op");
        assert_eq!(strip_language_prefix("objc.method"), "method");
    }

    #[test]
    fn unknown_relationship_kind_deserializes_to_other() {
        let rel: Relationship = serde_json::from_str(
            r#"{"source": "a", "target": "b", "kind": "overloadOf"}"#,
        )
        .unwrap();
        assert_eq!(rel.kind, RelationshipKind::Other);
    }

    #[test]
    fn graph_with_missing_lists_defaults_empty() {
        let graph: SymbolGraph =
            serde_json::from_str(r#"{"module": {"name": "M"}}"#).unwrap();
        assert!(graph.symbols.is_empty());
        assert!(graph.relationships.is_empty());
    }
}
