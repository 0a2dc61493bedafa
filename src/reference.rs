//! Resolved and unresolved link references.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identifier::TopicId;

/// Scheme prefix of a fully qualified documentation link.
const DOC_SCHEME: &str = "doc://";

/// A successfully resolved reference: enough to render a link without
/// touching the hierarchy again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub bundle: String,
    pub topic: Arc<TopicId>,
    /// The canonical URL path, e.g. `/M/Foo-struct/bar()`.
    pub path: String,
    pub languages: BTreeSet<String>,
    pub fragment: Option<String>,
}

impl ResolvedReference {
    /// The absolute `doc://` URL of this reference.
    pub fn url(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{DOC_SCHEME}{}{}#{fragment}", self.bundle, self.path),
            None => format!("{DOC_SCHEME}{}{}", self.bundle, self.path),
        }
    }
}

/// A link as written, before resolution. Carries the bundle id when the
/// link was fully qualified with a `doc://` scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub bundle: Option<String>,
    /// The path portion handed to the component parser.
    pub path: String,
}

impl UnresolvedReference {
    /// Split an optional `doc://bundle-id` prefix off a raw link.
    pub fn parse(link: &str) -> Self {
        let Some(rest) = link.strip_prefix(DOC_SCHEME) else {
            return Self {
                bundle: None,
                path: link.to_string(),
            };
        };
        match rest.split_once('/') {
            Some((bundle, path)) => Self {
                bundle: Some(bundle.to_string()),
                path: format!("/{path}"),
            },
            None => Self {
                bundle: Some(rest.to_string()),
                path: "/".to_string(),
            },
        }
    }
}

/// Summary of one addressable page, in the shape external archives
/// serialize as `linkable-entities.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkableEntity {
    pub path: String,
    pub title: String,
    /// Symbol kind identifier, or the non-symbol page kind.
    pub kind: String,
    pub languages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_links_have_no_bundle() {
        let unresolved = UnresolvedReference::parse("/M/Foo");
        assert_eq!(unresolved.bundle, None);
        assert_eq!(unresolved.path, "/M/Foo");
    }

    #[test]
    fn doc_scheme_links_split_bundle_and_path() {
        let unresolved = UnresolvedReference::parse("doc://com.example.m/M/Foo#frag");
        assert_eq!(unresolved.bundle.as_deref(), Some("com.example.m"));
        assert_eq!(unresolved.path, "/M/Foo#frag");
    }
}
