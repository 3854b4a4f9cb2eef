//! Lazily loaded directory tree for the sidebar.
//!
//! Nodes live in one flat, insertion-ordered vector and refer to their parent
//! by integer id. Three indices (path, id and parent -> children) keep lookups
//! O(1); they are rebuilt in a single pass after a bulk removal, so node
//! positions are never relied upon across mutations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{FmError, Result};
use crate::services::messages::Messages;
use crate::services::remote::{DirectoryService, TreeDirectory};
use crate::utils::format::{is_hidden, path_prefixes};

pub type NodeId = u64;

/// Parent id of top-level nodes
pub const ROOT_ID: NodeId = 0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeProps {
    pub has_subdirectories: bool,
    /// Children were fetched (possibly zero of them)
    pub subdirectories_loaded: bool,
    /// Branch is expanded in the sidebar; implies `subdirectories_loaded`
    pub show_subdirectories: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent_id: NodeId,
    pub path: String,
    pub basename: String,
    pub dirname: String,
    pub props: NodeProps,
}

/// One sidebar line produced by [`TreeCache::rows`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow<'a> {
    pub depth: usize,
    pub node: &'a TreeNode,
}

pub struct TreeCache {
    service: Arc<dyn DirectoryService>,
    disk: String,
    nodes: Vec<TreeNode>,
    /// Next id to hand out; reset to 1 only when the whole tree is discarded
    counter: NodeId,
    by_path: HashMap<String, usize>,
    by_id: HashMap<NodeId, usize>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl TreeCache {
    pub fn new(service: Arc<dyn DirectoryService>, disk: &str) -> Self {
        Self {
            service,
            disk: disk.to_string(),
            nodes: Vec::new(),
            counter: 1,
            by_path: HashMap::new(),
            by_id: HashMap::new(),
            children: HashMap::new(),
        }
    }

    pub fn disk(&self) -> &str {
        &self.disk
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        self.by_path.get(path).map(|&pos| &self.nodes[pos])
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&TreeNode> {
        self.by_id.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Direct children of `id` (use [`ROOT_ID`] for top-level nodes)
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |child| self.get_by_id(*child))
    }

    /// The id the next inserted node will receive
    pub fn next_id(&self) -> NodeId {
        self.counter
    }

    /// Nodes shown when hidden directories are filtered out
    pub fn visible_nodes(&self, show_hidden: bool) -> Vec<&TreeNode> {
        self.nodes
            .iter()
            .filter(|n| show_hidden || !is_hidden(&n.basename))
            .collect()
    }

    /// Depth-first sidebar rows: top-level nodes, then the children of every
    /// expanded node beneath it.
    pub fn rows(&self, show_hidden: bool) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, usize)> = self
            .children_ids(ROOT_ID)
            .iter()
            .rev()
            .map(|id| (*id, 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get_by_id(id) else { continue };
            if !show_hidden && is_hidden(&node.basename) {
                continue;
            }
            rows.push(TreeRow { depth, node });
            if node.props.show_subdirectories {
                stack.extend(self.children_ids(id).iter().rev().map(|c| (*c, depth + 1)));
            }
        }
        rows
    }

    fn children_ids(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Drop every node and restart ids at 1.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_path.clear();
        self.by_id.clear();
        self.children.clear();
        self.counter = 1;
    }

    /// Append a batch of directories under `parent_id`. A path that is already
    /// cached keeps its existing node and the duplicate is skipped.
    fn add_directories(&mut self, dirs: Vec<TreeDirectory>, parent_id: NodeId) -> Vec<NodeId> {
        let mut added = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if self.by_path.contains_key(&dir.path) {
                debug!(path = %dir.path, "tree: skipping already cached path");
                continue;
            }
            let id = self.counter;
            self.counter += 1;

            let pos = self.nodes.len();
            self.by_path.insert(dir.path.clone(), pos);
            self.by_id.insert(id, pos);
            self.children.entry(parent_id).or_default().push(id);
            self.nodes.push(TreeNode {
                id,
                parent_id,
                path: dir.path,
                basename: dir.basename,
                dirname: dir.dirname,
                props: NodeProps {
                    has_subdirectories: dir.props.has_subdirectories,
                    subdirectories_loaded: false,
                    show_subdirectories: false,
                },
            });
            added.push(id);
        }
        added
    }

    fn rebuild_index(&mut self) {
        self.by_path.clear();
        self.by_id.clear();
        self.children.clear();
        for (pos, node) in self.nodes.iter().enumerate() {
            self.by_path.insert(node.path.clone(), pos);
            self.by_id.insert(node.id, pos);
            self.children.entry(node.parent_id).or_default().push(node.id);
        }
    }

    fn props_mut(&mut self, id: NodeId) -> Option<&mut NodeProps> {
        let pos = *self.by_id.get(&id)?;
        Some(&mut self.nodes[pos].props)
    }

    fn lookup(&self, path: &str, messages: &mut Messages) -> Result<NodeId> {
        match self.get(path) {
            Some(node) => Ok(node.id),
            None => {
                let err = FmError::not_found(path);
                messages.report(&err);
                Err(err)
            }
        }
    }

    async fn fetch_children(
        &self,
        path: Option<&str>,
        messages: &mut Messages,
    ) -> Result<Vec<TreeDirectory>> {
        messages.add_loading();
        let result = self
            .service
            .tree(&self.disk, path)
            .await
            .and_then(|response| response.into_directories());
        messages.subtract_loading();
        result
    }

    /// Replace the whole tree with the top-level directories of `disk`.
    ///
    /// When the fetch fails the current tree is kept as is and the error is
    /// only returned, not reported.
    pub async fn initialize(&mut self, disk: &str, messages: &mut Messages) -> Result<usize> {
        messages.add_loading();
        let result = self
            .service
            .tree(disk, None)
            .await
            .and_then(|response| response.into_directories());
        messages.subtract_loading();

        let dirs = match result {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!(disk, error = %e, "tree: initialize failed");
                return Err(e);
            }
        };

        self.clear();
        self.disk = disk.to_string();
        let added = self.add_directories(dirs, ROOT_ID).len();
        info!(disk, nodes = added, "tree: initialized");
        Ok(added)
    }

    /// Show the children of `path`, fetching them first if they were never
    /// loaded. An already loaded node is only flipped to shown.
    pub async fn expand(&mut self, path: &str, messages: &mut Messages) -> Result<()> {
        let id = self.lookup(path, messages)?;
        if self.get_by_id(id).is_some_and(|n| n.props.subdirectories_loaded) {
            if let Some(props) = self.props_mut(id) {
                props.show_subdirectories = true;
            }
            return Ok(());
        }

        let children = match self.fetch_children(Some(path), messages).await {
            Ok(children) => children,
            Err(e) => {
                messages.report(&e);
                return Err(e);
            }
        };

        // Resolve by id again: the node is addressed by identity, not position.
        if self.get_by_id(id).is_none() {
            let err = FmError::not_found(path);
            messages.report(&err);
            return Err(err);
        }
        let added = self.add_directories(children, id);
        debug!(path, children = added.len(), "tree: loaded subdirectories");
        if let Some(props) = self.props_mut(id) {
            props.subdirectories_loaded = true;
            props.has_subdirectories = true;
            props.show_subdirectories = true;
        }
        Ok(())
    }

    /// Hide the children of `path`. Loaded children stay cached.
    pub fn collapse(&mut self, path: &str, messages: &mut Messages) -> Result<()> {
        let id = self.lookup(path, messages)?;
        if let Some(props) = self.props_mut(id) {
            props.show_subdirectories = false;
        }
        Ok(())
    }

    pub async fn toggle(&mut self, path: &str, messages: &mut Messages) -> Result<()> {
        let shown = self.get(path).is_some_and(|n| n.props.show_subdirectories);
        if shown {
            self.collapse(path, messages)
        } else {
            self.expand(path, messages).await
        }
    }

    /// Expand every ancestor of `path`, shallowest first, one after another.
    /// A failing step is reported and the walk continues; the first error is
    /// returned.
    pub async fn reopen_path(&mut self, path: &str, messages: &mut Messages) -> Result<()> {
        let mut first_error = None;
        for prefix in path_prefixes(path) {
            if let Err(e) = self.expand(&prefix, messages).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Insert directories created elsewhere without refetching.
    ///
    /// With a parent path the children go under that node and the node is
    /// marked loaded and expanded; without one they become top-level nodes.
    pub fn insert_subtree(
        &mut self,
        parent_path: Option<&str>,
        dirs: Vec<TreeDirectory>,
        messages: &mut Messages,
    ) -> Result<Vec<NodeId>> {
        let parent_path = parent_path.filter(|p| !p.is_empty());
        let Some(parent_path) = parent_path else {
            return Ok(self.add_directories(dirs, ROOT_ID));
        };

        let parent_id = self.lookup(parent_path, messages)?;
        let added = self.add_directories(dirs, parent_id);
        if let Some(props) = self.props_mut(parent_id) {
            props.has_subdirectories = true;
            props.show_subdirectories = true;
            props.subdirectories_loaded = true;
        }
        Ok(added)
    }

    /// Remove the nodes at `paths` together with all of their descendants.
    ///
    /// Descendants are found through parent ids with an explicit worklist;
    /// the node vector is filtered once at the end. Unknown paths are ignored.
    /// Returns the number of removed nodes.
    pub fn remove_subtree<S: AsRef<str>>(&mut self, paths: &[S]) -> usize {
        let mut marked: HashSet<NodeId> = HashSet::new();
        let mut worklist: Vec<NodeId> = paths
            .iter()
            .filter_map(|p| self.get(p.as_ref()).map(|n| n.id))
            .collect();

        while let Some(id) = worklist.pop() {
            if !marked.insert(id) {
                continue;
            }
            worklist.extend_from_slice(self.children_ids(id));
        }

        if marked.is_empty() {
            return 0;
        }

        let before = self.nodes.len();
        self.nodes.retain(|n| !marked.contains(&n.id));
        self.rebuild_index();
        let removed = before - self.nodes.len();
        debug!(removed, "tree: pruned subtrees");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stub::StubDirectoryService;

    fn tree_with(stub: StubDirectoryService) -> (TreeCache, Arc<StubDirectoryService>) {
        let stub = Arc::new(stub);
        (TreeCache::new(stub.clone(), "local"), stub)
    }

    fn dirs(paths: &[&str]) -> Vec<TreeDirectory> {
        paths.iter().map(|p| TreeDirectory::new(p, false)).collect()
    }

    fn assert_invariants(tree: &TreeCache) {
        let mut seen = HashSet::new();
        for node in tree.nodes() {
            assert!(seen.insert(node.path.clone()), "duplicate path {}", node.path);
            if node.parent_id != ROOT_ID {
                assert!(
                    tree.get_by_id(node.parent_id).is_some(),
                    "dangling parent of {}",
                    node.path
                );
            }
            if node.props.show_subdirectories {
                assert!(node.props.subdirectories_loaded);
            }
        }
    }

    // ========== initialize tests ==========

    #[tokio::test]
    async fn test_initialize_inserts_root_directories() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", true), ("b", false), ("c", true)]);
        let (mut tree, _) = tree_with(stub);
        let mut messages = Messages::new();

        let added = tree.initialize("local", &mut messages).await.unwrap();

        assert_eq!(added, 3);
        assert_eq!(tree.len(), 3);
        assert!(tree.nodes().iter().all(|n| n.parent_id == ROOT_ID));
        assert!(tree.nodes().iter().all(|n| !n.props.subdirectories_loaded));
        assert_eq!(
            tree.nodes().iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(!messages.is_loading());
    }

    #[tokio::test]
    async fn test_initialize_failure_keeps_state() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", false)])
            .with_tree_failure("broken", None, "Disk not found");
        let (mut tree, _) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        let result = tree.initialize("broken", &mut messages).await;

        assert_eq!(result, Err(FmError::remote("Disk not found")));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.disk(), "local");
        assert!(messages.errors().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_resets_counter() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", false), ("b", false)])
            .with_tree("public", None, &[("img", false)]);
        let (mut tree, _) = tree_with(stub);
        let mut messages = Messages::new();

        tree.initialize("local", &mut messages).await.unwrap();
        assert_eq!(tree.next_id(), 3);
        tree.initialize("public", &mut messages).await.unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("img").map(|n| n.id), Some(1));
        assert_eq!(tree.disk(), "public");
    }

    // ========== expand / collapse tests ==========

    #[tokio::test]
    async fn test_expand_unloaded_node_fetches_once() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", true)])
            .with_tree("local", Some("a"), &[("a/x", false), ("a/y", true)]);
        let (mut tree, stub) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        tree.expand("a", &mut messages).await.unwrap();

        assert_eq!(stub.tree_calls(), vec![None, Some("a".to_string())]);
        let parent = tree.get("a").unwrap().clone();
        assert!(parent.props.subdirectories_loaded);
        assert!(parent.props.has_subdirectories);
        assert!(parent.props.show_subdirectories);
        let children: Vec<_> = tree.children(parent.id).map(|n| n.path.as_str()).collect();
        assert_eq!(children, vec!["a/x", "a/y"]);
        assert!(tree.nodes().iter().filter(|n| n.path.starts_with("a/")).all(|n| n.parent_id == parent.id));
        assert_invariants(&tree);
    }

    #[tokio::test]
    async fn test_expand_loaded_node_only_flips_visibility() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", true)])
            .with_tree("local", Some("a"), &[("a/x", false)]);
        let (mut tree, stub) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();
        tree.expand("a", &mut messages).await.unwrap();
        tree.collapse("a", &mut messages).unwrap();
        let calls_before = stub.calls().len();

        tree.expand("a", &mut messages).await.unwrap();

        assert_eq!(stub.calls().len(), calls_before);
        assert!(tree.get("a").unwrap().props.show_subdirectories);
        assert_eq!(tree.len(), 2);
    }

    #[tokio::test]
    async fn test_expand_missing_path_reports_not_found() {
        let (mut tree, stub) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();

        let result = tree.expand("nope", &mut messages).await;

        assert_eq!(result, Err(FmError::not_found("nope")));
        assert_eq!(messages.errors().len(), 1);
        assert!(stub.calls().is_empty());
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_expand_remote_failure_leaves_node_untouched() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", true)])
            .with_tree_failure("local", Some("a"), "Permission denied");
        let (mut tree, _) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        let result = tree.expand("a", &mut messages).await;

        assert!(matches!(result, Err(FmError::RemoteFailure { .. })));
        assert_eq!(tree.get("a").unwrap().props, NodeProps {
            has_subdirectories: true,
            subdirectories_loaded: false,
            show_subdirectories: false,
        });
        assert_eq!(messages.errors()[0].message, "Permission denied");
        assert!(!messages.is_loading());
    }

    #[tokio::test]
    async fn test_expand_with_zero_children_marks_loaded() {
        let stub = StubDirectoryService::new().with_tree("local", None, &[("empty", false)]);
        let (mut tree, stub) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        tree.expand("empty", &mut messages).await.unwrap();
        tree.collapse("empty", &mut messages).unwrap();
        tree.expand("empty", &mut messages).await.unwrap();

        assert!(tree.get("empty").unwrap().props.subdirectories_loaded);
        assert_eq!(stub.tree_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_collapse_keeps_children() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("a", true)])
            .with_tree("local", Some("a"), &[("a/x", false)]);
        let (mut tree, _) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();
        tree.expand("a", &mut messages).await.unwrap();

        tree.collapse("a", &mut messages).unwrap();

        let node = tree.get("a").unwrap();
        assert!(!node.props.show_subdirectories);
        assert!(node.props.subdirectories_loaded);
        assert!(tree.get("a/x").is_some());
        assert!(tree.collapse("missing", &mut messages).is_err());
    }

    #[tokio::test]
    async fn test_toggle() {
        let stub = StubDirectoryService::new().with_tree("local", None, &[("a", true)]);
        let (mut tree, _) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        tree.toggle("a", &mut messages).await.unwrap();
        assert!(tree.get("a").unwrap().props.show_subdirectories);
        tree.toggle("a", &mut messages).await.unwrap();
        assert!(!tree.get("a").unwrap().props.show_subdirectories);
    }

    // ========== reopen_path tests ==========

    #[tokio::test]
    async fn test_reopen_path_expands_ancestors_in_order() {
        let stub = StubDirectoryService::new()
            .with_tree("local", None, &[("/a", true)])
            .with_tree("local", Some("/a"), &[("/a/b", true)])
            .with_tree("local", Some("/a/b"), &[("/a/b/c", true)])
            .with_tree("local", Some("/a/b/c"), &[("/a/b/c/d", false)]);
        let (mut tree, stub) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        tree.reopen_path("/a/b/c", &mut messages).await.unwrap();

        assert_eq!(
            stub.tree_calls(),
            vec![
                None,
                Some("/a".to_string()),
                Some("/a/b".to_string()),
                Some("/a/b/c".to_string()),
            ]
        );
        for path in ["/a", "/a/b", "/a/b/c"] {
            assert!(tree.get(path).unwrap().props.show_subdirectories);
        }
        assert!(messages.errors().is_empty());
        assert_invariants(&tree);
    }

    #[tokio::test]
    async fn test_reopen_path_on_empty_tree() {
        let (mut tree, stub) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();

        let result = tree.reopen_path("/a/b/c", &mut messages).await;

        assert_eq!(result, Err(FmError::not_found("/a")));
        // one attempt per ancestor depth, each reported
        let reported: Vec<_> = messages.errors().iter().map(|e| e.message.clone()).collect();
        assert_eq!(
            reported,
            vec![
                "Directory not found: /a",
                "Directory not found: /a/b",
                "Directory not found: /a/b/c",
            ]
        );
        assert!(stub.calls().is_empty());
    }

    // ========== insert_subtree tests ==========

    #[tokio::test]
    async fn test_insert_subtree_under_parent() {
        let stub = StubDirectoryService::new().with_tree("local", None, &[("a", false)]);
        let (mut tree, stub) = tree_with(stub);
        let mut messages = Messages::new();
        tree.initialize("local", &mut messages).await.unwrap();

        let ids = tree
            .insert_subtree(Some("a"), dirs(&["a/new"]), &mut messages)
            .unwrap();

        assert_eq!(ids, vec![2]);
        let parent = tree.get("a").unwrap();
        assert_eq!(parent.props, NodeProps {
            has_subdirectories: true,
            subdirectories_loaded: true,
            show_subdirectories: true,
        });
        assert_eq!(tree.get("a/new").unwrap().parent_id, parent.id);
        assert_eq!(stub.tree_calls().len(), 1);
    }

    #[test]
    fn test_insert_subtree_at_root_and_missing_parent() {
        let (mut tree, _) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();

        tree.insert_subtree(None, dirs(&["top"]), &mut messages).unwrap();
        tree.insert_subtree(Some(""), dirs(&["other"]), &mut messages).unwrap();
        assert_eq!(tree.get("top").unwrap().parent_id, ROOT_ID);
        assert_eq!(tree.get("other").unwrap().parent_id, ROOT_ID);

        let result = tree.insert_subtree(Some("ghost"), dirs(&["ghost/x"]), &mut messages);
        assert_eq!(result, Err(FmError::not_found("ghost")));
        assert!(tree.get("ghost/x").is_none());
        assert_eq!(messages.errors().len(), 1);
    }

    #[test]
    fn test_insert_subtree_skips_duplicate_paths() {
        let (mut tree, _) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();

        tree.insert_subtree(None, dirs(&["a", "b"]), &mut messages).unwrap();
        let ids = tree.insert_subtree(None, dirs(&["b", "c", "c"]), &mut messages).unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(tree.len(), 3);
        assert_invariants(&tree);
    }

    // ========== remove_subtree tests ==========

    fn build_tree() -> TreeCache {
        // a -> a/b -> a/b/c ; a -> a/d ; e -> e/f
        let (mut tree, _) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();
        tree.insert_subtree(None, dirs(&["a", "e"]), &mut messages).unwrap();
        tree.insert_subtree(Some("a"), dirs(&["a/b", "a/d"]), &mut messages).unwrap();
        tree.insert_subtree(Some("a/b"), dirs(&["a/b/c"]), &mut messages).unwrap();
        tree.insert_subtree(Some("e"), dirs(&["e/f"]), &mut messages).unwrap();
        tree
    }

    #[test]
    fn test_remove_subtree_removes_descendants_only() {
        let mut tree = build_tree();

        let removed = tree.remove_subtree(&["a/b"]);

        assert_eq!(removed, 2);
        let paths: Vec<_> = tree.nodes().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "e", "a/d", "e/f"]);
        assert_invariants(&tree);
    }

    #[test]
    fn test_remove_subtree_multiple_and_unknown() {
        let mut tree = build_tree();

        let removed = tree.remove_subtree(&["a", "e/f", "nope"]);

        assert_eq!(removed, 5);
        let paths: Vec<_> = tree.nodes().iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["e"]);
        assert_eq!(tree.remove_subtree(&["nope"]), 0);
        assert_invariants(&tree);
    }

    #[test]
    fn test_remove_subtree_ignores_has_subdirectories_flag() {
        // children linked by parent id are removed even when the parent never
        // advertised subdirectories
        let (mut tree, _) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();
        tree.insert_subtree(None, dirs(&["p"]), &mut messages).unwrap();
        tree.insert_subtree(Some("p"), dirs(&["p/q"]), &mut messages).unwrap();
        tree.insert_subtree(Some("p/q"), dirs(&["p/q/r"]), &mut messages).unwrap();
        if let Some(props) = tree.props_mut(2) {
            props.has_subdirectories = false;
        }

        assert_eq!(tree.remove_subtree(&["p"]), 3);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut tree = build_tree();
        let max_id = tree.nodes().iter().map(|n| n.id).max().unwrap();
        let mut messages = Messages::new();

        tree.remove_subtree(&["e"]);
        let ids = tree.insert_subtree(None, dirs(&["e"]), &mut messages).unwrap();

        assert!(ids[0] > max_id);
        assert_invariants(&tree);
    }

    #[test]
    fn test_remove_deep_chain_without_recursion() {
        let (mut tree, _) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();
        tree.insert_subtree(None, dirs(&["d0"]), &mut messages).unwrap();
        for depth in 1..20_000 {
            let parent = format!("d{}", depth - 1);
            let child = format!("d{}", depth);
            tree.insert_subtree(Some(parent.as_str()), dirs(&[child.as_str()]), &mut messages).unwrap();
        }
        assert_eq!(tree.len(), 20_000);

        assert_eq!(tree.remove_subtree(&["d0"]), 20_000);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_index_survives_removal() {
        let mut tree = build_tree();
        tree.remove_subtree(&["a/b"]);
        let mut messages = Messages::new();

        // lookups resolve against the rebuilt index
        let d = tree.get("a/d").unwrap().clone();
        assert_eq!(tree.get_by_id(d.id), Some(&d));
        let ids = tree.insert_subtree(Some("a/d"), dirs(&["a/d/z"]), &mut messages).unwrap();
        assert_eq!(tree.get_by_id(ids[0]).unwrap().parent_id, d.id);
    }

    // ========== view tests ==========

    #[test]
    fn test_rows_follow_expansion() {
        let mut tree = build_tree();
        let mut messages = Messages::new();
        tree.collapse("e", &mut messages).unwrap();

        let rows: Vec<_> = tree
            .rows(true)
            .iter()
            .map(|r| (r.depth, r.node.path.clone()))
            .collect();

        assert_eq!(
            rows,
            vec![
                (0, "a".to_string()),
                (1, "a/b".to_string()),
                (2, "a/b/c".to_string()),
                (1, "a/d".to_string()),
                (0, "e".to_string()),
            ]
        );
    }

    #[test]
    fn test_hidden_directories_filtered() {
        let (mut tree, _) = tree_with(StubDirectoryService::new());
        let mut messages = Messages::new();
        tree.insert_subtree(None, dirs(&[".git", "src"]), &mut messages).unwrap();
        tree.insert_subtree(Some(".git"), dirs(&[".git/objects"]), &mut messages).unwrap();

        assert_eq!(tree.visible_nodes(false).len(), 2);
        assert_eq!(tree.visible_nodes(true).len(), 3);
        let rows: Vec<_> = tree.rows(false).iter().map(|r| r.node.path.clone()).collect();
        assert_eq!(rows, vec!["src"]);
        assert_eq!(tree.rows(true).len(), 3);
    }
}
