//! Bundle loading: discover and parse symbol-graph files on disk.
//!
//! Walks a directory for `*.symbols.json` files and orders them so that a
//! module's primary graph comes before its `Module@Extension` graphs. The
//! first graph to mention a module owns creation of its root node, so this
//! ordering is what keeps builds deterministic across file systems.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;
use crate::symbol_graph::SymbolGraph;

/// Suffix of symbol graph files.
const GRAPH_SUFFIX: &str = ".symbols.json";

/// One parsed graph file.
#[derive(Debug)]
pub struct GraphFile {
    pub path: PathBuf,
    pub graph: SymbolGraph,
}

/// Load every symbol graph under `dir`, ordered with the primary-first
/// heuristic.
///
/// # Errors
///
/// Returns `Error::GraphsDirNotFound` if `dir` is not a directory,
/// `Error::Io` if a file cannot be read, or `Error::MalformedGraph` if a
/// file is not a valid symbol graph.
pub fn load_graphs(dir: &Path) -> Result<Vec<GraphFile>, Error> {
    if !dir.is_dir() {
        return Err(Error::GraphsDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(GRAPH_SUFFIX))
        })
        .collect();
    order_graph_files(&mut paths);

    let mut graphs = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path)?;
        let graph: SymbolGraph =
            serde_json::from_str(&content).map_err(|e| Error::MalformedGraph {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        graphs.push(GraphFile { path, graph });
    }
    Ok(graphs)
}

/// Sort graph file paths: stems without `@` first, then lexicographic by
/// file name. This places `Module.symbols.json` before
/// `Module@Extended.symbols.json`, which decides which file creates the
/// module root.
pub fn order_graph_files(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| {
        let key = |p: &PathBuf| {
            let name = p
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            (name.contains('@'), name)
        };
        key(a).cmp(&key(b))
    });
}
