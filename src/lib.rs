//! Documentation link resolution over symbol-graph path hierarchies.
//!
//! `doclink` builds a path hierarchy from module symbol graphs plus
//! non-symbol pages (articles, tutorials, anchors, task groups), then
//! answers two questions: which page does a link refer to, and what is the
//! shortest unambiguous URL path that names each symbol.
//!
//! Build with [`builder::HierarchyBuilder`], freeze into a
//! [`resolver::LinkResolver`], then resolve links and emit paths:
//!
//! ```
//! use doclink::builder::HierarchyBuilder;
//! use doclink::symbol_graph::SymbolGraph;
//!
//! let graph: SymbolGraph = serde_json::from_str(
//!     r#"{"module": {"name": "M"}, "symbols": [], "relationships": []}"#,
//! )
//! .unwrap();
//! let mut builder = HierarchyBuilder::new("com.example.m", "Example", "swift");
//! builder.add_symbol_graph(&graph);
//! let resolver = builder.finish();
//! assert!(resolver.find("/M", None, true).is_ok());
//! ```

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod disambiguation;
pub mod emitter;
pub mod error;
pub mod fallback;
pub mod hasher;
pub mod hierarchy;
pub mod identifier;
pub mod loader;
pub mod parser;
pub mod reference;
pub mod resolver;
pub mod symbol_graph;

pub use builder::HierarchyBuilder;
pub use diagnostics::ErrorInfo;
pub use error::Error;
pub use reference::{LinkableEntity, ResolvedReference, UnresolvedReference};
pub use resolver::LinkResolver;
