//! Unique topic identifiers and the process-wide interning pool.
//!
//! A `TopicId` names one documentation page. Equality and hashing consider
//! only `(category, id, fragment)`; the bundle and display name ride along
//! for presentation. The pool guarantees that equal identifiers share one
//! allocation, so identity comparisons stay cheap during resolution.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use serde::Serialize;

/// Category tag for a topic identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TopicCategory {
    Symbol,
    SparseSymbol,
    Article,
    Tutorial,
    TutorialTechnology,
    Technology,
    Container,
    Volume,
    Chapter,
    Module,
    Placeholder,
    Unresolved,
    AnchorViaFragment,
}

/// A unique identifier for one documentation topic.
#[derive(Debug, Clone, Serialize)]
pub struct TopicId {
    pub category: TopicCategory,
    pub id: String,
    pub bundle: Option<String>,
    pub display_name: Option<String>,
    pub fragment: Option<String>,
}

impl PartialEq for TopicId {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.id == other.id && self.fragment == other.fragment
    }
}

impl Eq for TopicId {}

impl Hash for TopicId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.category.hash(state);
        self.id.hash(state);
        self.fragment.hash(state);
    }
}

impl TopicId {
    /// A placeholder identifier for a reference that did not resolve.
    pub fn unresolved(id: &str) -> Arc<Self> {
        intern(Self {
            category: TopicCategory::Unresolved,
            id: id.to_string(),
            bundle: None,
            display_name: None,
            fragment: None,
        })
    }
}

/// Pool key: the components that participate in equality.
type PoolKey = (TopicCategory, String, Option<String>);

static POOL: LazyLock<DashMap<PoolKey, Arc<TopicId>>> = LazyLock::new(DashMap::new);

/// Intern a topic identifier in the process-wide pool.
///
/// Insertion is idempotent: the first identifier stored for a given
/// `(category, id, fragment)` wins, and later calls receive the shared
/// allocation even if their bundle or display name differ.
pub fn intern(topic: TopicId) -> Arc<TopicId> {
    let key = (topic.category, topic.id.clone(), topic.fragment.clone());
    POOL.entry(key).or_insert_with(|| Arc::new(topic)).clone()
}

/// A process-unique identifier for a findable hierarchy node.
///
/// Allocated once at node registration and cleared when the node's bundle is
/// unregistered; the node itself stays in the tree so subtrees remain
/// traversable. Identifiers are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u64);

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

impl LinkId {
    /// Allocate the next process-unique identifier.
    pub fn next() -> Self {
        Self(NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_bundle_and_display_name() {
        let a = TopicId {
            category: TopicCategory::Article,
            id: "getting-started".to_string(),
            bundle: Some("com.example.a".to_string()),
            display_name: Some("Getting Started".to_string()),
            fragment: None,
        };
        let mut b = a.clone();
        b.bundle = None;
        b.display_name = None;
        assert_eq!(a, b);
    }

    #[test]
    fn fragment_distinguishes() {
        let a = TopicId {
            category: TopicCategory::AnchorViaFragment,
            id: "doc://x/page".to_string(),
            bundle: None,
            display_name: None,
            fragment: Some("overview".to_string()),
        };
        let mut b = a.clone();
        b.fragment = Some("details".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn pool_shares_storage() {
        let make = || TopicId {
            category: TopicCategory::Symbol,
            id: "s:pool-test".to_string(),
            bundle: None,
            display_name: None,
            fragment: None,
        };
        let first = intern(make());
        let second = intern(make());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn link_ids_are_unique() {
        let a = LinkId::next();
        let b = LinkId::next();
        assert_ne!(a, b);
    }
}
