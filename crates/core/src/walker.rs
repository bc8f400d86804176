//! Hierarchy walker
//!
//! Discovers the folder/service tree of a server without doing any I/O itself.
//! A listing only names its sub-folders, so each one has to be fetched on its
//! own. [`TreeWalk`] hands out those fetches one at a time through
//! [`TreeWalk::next_folder`] and is fed the results through
//! [`TreeWalk::record`]:
//!
//! ```rust,ignore
//! let mut walk = TreeWalk::new(&endpoint);
//! while let Some(pending) = walk.next_folder() {
//!     let result = fetch(pending.url()).await;
//!     walk.record(pending, result)?;
//! }
//! let outcome = walk.finish();
//! ```
//!
//! Traversal is pre-order over an explicit worklist, so the depth of the
//! remote hierarchy never touches the call stack. Each path is scheduled at
//! most once, which also stops folder loops.

use crate::catalog::{child_path, FolderListing, FolderNode, ServiceDescriptor};
use crate::endpoint::Endpoint;
use crate::error::{CatalogError, FetchError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// A folder listing waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFolder {
    path: String,
    url: String,
    parent: Option<usize>,
}

impl PendingFolder {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Something the walk swallowed instead of failing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The folder could not be fetched and is missing from the tree
    Skipped { path: String, cause: FetchError },
    /// The folder was reported again after it had already been scheduled
    Revisited { path: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Skipped { path, cause } => write!(f, "skipped {path}: {cause}"),
            Diagnostic::Revisited { path } => write!(f, "ignored repeated folder {path}"),
        }
    }
}

/// Result of a complete walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkOutcome {
    pub tree: FolderNode,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
struct ArenaNode {
    path: String,
    services: Vec<ServiceDescriptor>,
    children: Vec<usize>,
}

/// Sans-IO state of one hierarchy walk
#[derive(Debug)]
pub struct TreeWalk {
    endpoint: Endpoint,
    arena: Vec<ArenaNode>,
    visited: HashSet<String>,
    worklist: Vec<PendingFolder>,
    diagnostics: Vec<Diagnostic>,
}

impl TreeWalk {
    /// Start a walk at the services root of `endpoint`
    pub fn new(endpoint: &Endpoint) -> Self {
        let root = FolderNode::ROOT_PATH.to_string();
        let pending = PendingFolder {
            url: endpoint.services_url(&root),
            path: root.clone(),
            parent: None,
        };

        Self {
            endpoint: endpoint.clone(),
            arena: Vec::new(),
            visited: HashSet::from([root]),
            worklist: vec![pending],
            diagnostics: Vec::new(),
        }
    }

    /// Next folder to fetch, or `None` once the walk is complete
    pub fn next_folder(&mut self) -> Option<PendingFolder> {
        self.worklist.pop()
    }

    /// Feed the fetch result for `pending` back into the walk
    ///
    /// A failed root fetch aborts the walk with [`CatalogError::RootUnavailable`].
    /// A failed sub-folder fetch only records a [`Diagnostic::Skipped`]; the
    /// folder is left out of its parent's children.
    pub fn record(
        &mut self,
        pending: PendingFolder,
        result: Result<Value, FetchError>,
    ) -> Result<(), CatalogError> {
        let value = match result {
            Ok(value) => value,
            Err(source) if pending.is_root() => {
                self.worklist.clear();
                return Err(CatalogError::RootUnavailable {
                    url: pending.url,
                    source,
                });
            }
            Err(cause) => {
                self.diagnostics.push(Diagnostic::Skipped {
                    path: pending.path,
                    cause,
                });
                return Ok(());
            }
        };

        let listing = FolderListing::from_value(&value);
        let slot = self.arena.len();

        if let Some(parent) = pending.parent {
            self.arena[parent].children.push(slot);
        }

        // Reversed so the LIFO worklist pops siblings in server order.
        for name in listing.folders.iter().rev() {
            let path = child_path(&pending.path, name);
            if !self.visited.insert(path.clone()) {
                self.diagnostics.push(Diagnostic::Revisited { path });
                continue;
            }
            self.worklist.push(PendingFolder {
                url: self.endpoint.services_url(&path),
                path,
                parent: Some(slot),
            });
        }

        self.arena.push(ArenaNode {
            path: pending.path,
            services: listing.services,
            children: Vec::new(),
        });

        Ok(())
    }

    /// Number of folders fetched successfully so far
    pub fn folders_discovered(&self) -> usize {
        self.arena.len()
    }

    /// Assemble the tree from everything recorded so far
    ///
    /// If the root was never recorded the result is an empty root folder.
    pub fn finish(self) -> WalkOutcome {
        let mut built: Vec<Option<FolderNode>> = Vec::with_capacity(self.arena.len());
        built.resize_with(self.arena.len(), || None);

        // Children always sit at higher slots than their parent, so building
        // from the back finishes every child before its parent needs it.
        for (slot, node) in self.arena.into_iter().enumerate().rev() {
            let children = node
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[slot] = Some(FolderNode {
                path: node.path,
                services: node.services,
                children,
            });
        }

        let tree = built
            .into_iter()
            .next()
            .flatten()
            .unwrap_or_else(|| FolderNode {
                path: FolderNode::ROOT_PATH.to_string(),
                services: Vec::new(),
                children: Vec::new(),
            });

        WalkOutcome {
            tree,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::validate_endpoint;
    use serde_json::json;
    use std::collections::HashMap;

    fn endpoint() -> Endpoint {
        validate_endpoint("https://example.com/arcgis/rest/").unwrap()
    }

    /// Drive a walk against canned responses keyed by folder path.
    /// Paths without a response fail with a 404.
    fn run_walk(
        responses: &HashMap<&str, Value>,
    ) -> (Result<WalkOutcome, CatalogError>, Vec<String>) {
        let mut walk = TreeWalk::new(&endpoint());
        let mut requested = Vec::new();

        while let Some(pending) = walk.next_folder() {
            requested.push(pending.path().to_string());
            let result = responses
                .get(pending.path())
                .cloned()
                .ok_or_else(|| FetchError::status(404));
            if let Err(err) = walk.record(pending, result) {
                return (Err(err), requested);
            }
        }

        (Ok(walk.finish()), requested)
    }

    fn paths(tree: &FolderNode) -> Vec<String> {
        tree.iter().map(|n| n.path.clone()).collect()
    }

    #[test]
    fn test_walk_builds_complete_tree_in_preorder() {
        let responses = HashMap::from([
            (
                "/",
                json!({"folders": ["a", "b"], "services": [{"name": "Root", "type": "MapServer"}]}),
            ),
            (
                "/a",
                json!({"folders": [], "services": [{"name": "a/One", "type": "FeatureServer"}]}),
            ),
            ("/b", json!({"folders": ["c"], "services": []})),
            (
                "/b/c",
                json!({"folders": [], "services": [{"name": "b/c/Two", "type": "MapServer"}]}),
            ),
        ]);

        let (outcome, requested) = run_walk(&responses);
        let outcome = outcome.unwrap();

        assert_eq!(paths(&outcome.tree), vec!["/", "/a", "/b", "/b/c"]);
        assert_eq!(requested, vec!["/", "/a", "/b", "/b/c"]);
        assert!(outcome.diagnostics.is_empty());

        let tree = &outcome.tree;
        assert_eq!(tree.services[0].name, "Root");
        assert_eq!(tree.children[0].services[0].name, "a/One");
        assert!(tree.children[1].services.is_empty());
        assert_eq!(tree.children[1].children[0].path, "/b/c");
        assert_eq!(tree.children[1].children[0].services[0].name, "b/c/Two");
    }

    #[test]
    fn test_walk_requests_accumulated_paths() {
        let mut walk = TreeWalk::new(&endpoint());

        let root = walk.next_folder().unwrap();
        assert!(root.is_root());
        assert_eq!(root.url(), "https://example.com/arcgis/rest/services");
        walk.record(root, Ok(json!({"folders": ["parent"]}))).unwrap();

        let parent = walk.next_folder().unwrap();
        assert_eq!(parent.url(), "https://example.com/arcgis/rest/services/parent");
        walk.record(parent, Ok(json!({"folders": ["/sub"]}))).unwrap();

        let sub = walk.next_folder().unwrap();
        assert_eq!(sub.path(), "/parent/sub");
        assert_eq!(sub.url(), "https://example.com/arcgis/rest/services/parent/sub");
    }

    #[test]
    fn test_walk_omits_failed_subfolder() {
        let responses = HashMap::from([
            ("/", json!({"folders": ["a", "b"], "services": []})),
            ("/a", json!({"folders": [], "services": []})),
            ("/b", json!({"folders": ["c"], "services": []})),
        ]);

        let (outcome, requested) = run_walk(&responses);
        let outcome = outcome.unwrap();

        assert_eq!(requested, vec!["/", "/a", "/b", "/b/c"]);
        assert_eq!(paths(&outcome.tree), vec!["/", "/a", "/b"]);
        assert!(outcome.tree.children[1].children.is_empty());
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::Skipped {
                path: "/b/c".to_string(),
                cause: FetchError::status(404),
            }]
        );
    }

    #[test]
    fn test_walk_fails_when_root_fails() {
        let (outcome, requested) = run_walk(&HashMap::new());

        assert_eq!(requested, vec!["/"]);
        assert_eq!(
            outcome.unwrap_err(),
            CatalogError::RootUnavailable {
                url: "https://example.com/arcgis/rest/services".to_string(),
                source: FetchError::status(404),
            }
        );
    }

    #[test]
    fn test_walk_schedules_each_path_once() {
        let responses = HashMap::from([
            ("/", json!({"folders": ["a", "a"], "services": []})),
            // Misbehaving server: the folder reports itself as a sub-folder.
            ("/a", json!({"folders": ["/"], "services": []})),
        ]);

        let (outcome, requested) = run_walk(&responses);
        let outcome = outcome.unwrap();

        assert_eq!(requested, vec!["/", "/a"]);
        assert_eq!(outcome.tree.folder_paths(), vec!["/a"]);
        assert_eq!(
            outcome.diagnostics,
            vec![
                Diagnostic::Revisited {
                    path: "/a".to_string()
                },
                Diagnostic::Revisited {
                    path: "/a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_walk_preserves_sibling_order() {
        let responses = HashMap::from([
            ("/", json!({"folders": ["Zeta", "Alpha", "Mid"]})),
            ("/Zeta", json!({})),
            ("/Alpha", json!({})),
            ("/Mid", json!({})),
        ]);

        let (outcome, requested) = run_walk(&responses);

        assert_eq!(requested, vec!["/", "/Zeta", "/Alpha", "/Mid"]);
        assert_eq!(
            outcome.unwrap().tree.folder_paths(),
            vec!["/Zeta", "/Alpha", "/Mid"]
        );
    }

    #[test]
    fn test_finish_without_root_is_empty() {
        let walk = TreeWalk::new(&endpoint());
        let outcome = walk.finish();

        assert_eq!(outcome.tree.path, "/");
        assert!(outcome.tree.services.is_empty());
        assert!(outcome.tree.children.is_empty());
    }

    #[test]
    fn test_deep_hierarchy_does_not_recurse() {
        let mut walk = TreeWalk::new(&endpoint());
        let depth = 1_000;

        let mut level = 0;
        while let Some(pending) = walk.next_folder() {
            let folders = if level < depth { json!(["d"]) } else { json!([]) };
            walk.record(pending, Ok(json!({"folders": folders}))).unwrap();
            level += 1;
        }

        assert_eq!(walk.folders_discovered(), depth + 1);
        let outcome = walk.finish();
        assert_eq!(outcome.tree.folder_count(), depth + 1);
    }
}
