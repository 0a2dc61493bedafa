//! Out-of-band resolvers consulted around the path hierarchy.
//!
//! An external resolver answers for links that name a non-local bundle. A
//! fallback resolver is consulted on a path-hierarchy miss, against a fixed
//! sequence of candidate locations; successful results are cached by
//! absolute URL so repeated misses stay cheap.

use dashmap::DashMap;

use crate::error::Error;
use crate::reference::{ResolvedReference, UnresolvedReference};

/// Resolver for links into another documentation archive, keyed by bundle
/// id in the resolver table.
pub trait ExternalResolver: Send + Sync {
    /// Resolve a fully qualified link against the external archive.
    ///
    /// # Errors
    ///
    /// Returns the archive's own resolution error, which the caller reports
    /// unchanged.
    fn resolve(
        &self,
        reference: &UnresolvedReference,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference, Error>;
}

/// Resolver of last resort for links the path hierarchy cannot answer.
pub trait FallbackResolver: Send + Sync {
    /// Try to resolve one candidate location. `None` means this candidate
    /// is unknown to the fallback and the next one should be tried.
    fn resolve(
        &self,
        reference: &UnresolvedReference,
        parent: Option<&ResolvedReference>,
        is_symbol_link: bool,
    ) -> Option<ResolvedReference>;
}

/// The fixed sequence of candidate URLs tried on a hierarchy miss: the
/// articles root, the tutorial technology root, the tutorials root, the
/// link as a child of the parent, as a sibling of the parent, under the
/// module root, and finally under the bundle root.
pub fn candidate_urls(
    path: &str,
    parent: Option<&ResolvedReference>,
    bundle: &str,
    display_name: &str,
) -> Vec<String> {
    let trimmed = path.trim_start_matches('/');
    let mut candidates = vec![
        format!("doc://{bundle}/{display_name}/{trimmed}"),
        format!("doc://{bundle}/tutorials/{display_name}/{trimmed}"),
        format!("doc://{bundle}/tutorials/{trimmed}"),
    ];
    if let Some(parent) = parent {
        candidates.push(format!("doc://{}{}/{trimmed}", parent.bundle, parent.path));
        if let Some((siblings, _)) = parent.path.rsplit_once('/') {
            candidates.push(format!("doc://{}{siblings}/{trimmed}", parent.bundle));
        }
        if let Some(module) = module_root(&parent.path) {
            candidates.push(format!("doc://{}/{module}/{trimmed}", parent.bundle));
        }
    }
    candidates.push(format!("doc://{bundle}/{trimmed}"));
    candidates.dedup();
    candidates
}

/// The first path segment of a resolved path, if any.
fn module_root(path: &str) -> Option<&str> {
    path.trim_start_matches('/').split('/').next().filter(|s| !s.is_empty())
}

/// Concurrent cache of successful fallback resolutions, keyed by the
/// absolute candidate URL.
#[derive(Debug, Default)]
pub struct FallbackCache {
    cache: DashMap<String, ResolvedReference>,
}

impl FallbackCache {
    pub fn get(&self, url: &str) -> Option<ResolvedReference> {
        self.cache.get(url).map(|entry| entry.clone())
    }

    pub fn insert(&self, url: String, reference: ResolvedReference) {
        self.cache.insert(url, reference);
    }
}
