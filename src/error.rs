use std::path::PathBuf;

use crate::parser::PathComponent;

/// A resolution candidate embedded in an error, display-ready so the
/// diagnostics renderer never needs to borrow the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The child name as it appears in the hierarchy.
    pub name: String,
    /// The disambiguation suffix that uniquely selects this candidate
    /// (empty when none is needed).
    pub suffix: String,
    /// The flattened declaration text, when the candidate is a symbol.
    pub declaration: Option<String>,
}

/// First remaining component's text, for error messages.
fn head(remaining: &[PathComponent]) -> &str {
    remaining.first().map_or("", |c| c.full.as_str())
}

/// All errors in doclink carry enough context to produce a useful diagnostic
/// without a debugger. Resolution variants embed the partial path, the
/// remaining components, and display-ready candidate or sibling lists.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no top-level page or module named `{}`", head(remaining))]
    NotFound {
        link: String,
        remaining: Vec<PathComponent>,
        available_roots: Vec<String>,
    },

    #[error("`{name}` matched a page that can no longer be found")]
    UnfindableMatch {
        name: String,
    },

    #[error("symbol link resolved to the non-symbol page `{name}`")]
    NonSymbolMatchForSymbolLink {
        link: String,
        name: String,
    },

    #[error("`{}` doesn't exist at `/{}`", head(remaining), partial.join("/"))]
    UnknownName {
        link: String,
        partial: Vec<String>,
        remaining: Vec<PathComponent>,
        siblings: Vec<String>,
    },

    #[error("`{}` doesn't match any page at `/{}`", head(remaining), partial.join("/"))]
    UnknownDisambiguation {
        link: String,
        partial: Vec<String>,
        remaining: Vec<PathComponent>,
        candidates: Vec<Candidate>,
    },

    #[error("`{}` is ambiguous at `/{}`", head(remaining), partial.join("/"))]
    LookupCollision {
        link: String,
        partial: Vec<String>,
        remaining: Vec<PathComponent>,
        candidates: Vec<Candidate>,
    },

    #[error("malformed symbol graph: {}: {reason}", path.display())]
    MalformedGraph {
        path: PathBuf,
        reason: String,
    },

    #[error("graphs directory not found: {}", path.display())]
    GraphsDirNotFound {
        path: PathBuf,
    },

    #[error("unknown parent link: `{link}`")]
    UnknownParent {
        link: String,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json deserialize: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml deserialize: {0}")]
    TomlDe(#[from] toml::de::Error),
}
