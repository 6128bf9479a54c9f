use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

use logtree_types::{ROOT_NAMESPACE, Rank};

use crate::error::{LogError, Result};

/// Raw value stored for "no explicit level"
const INHERIT: u32 = 0;

/// One namespace in the filter hierarchy.
///
/// The parent link is fixed at creation; only the level and note change,
/// so readers can walk the chain without locking.
pub struct FilterNode {
    /// Full dotted namespace
    name: String,

    /// Node one segment shorter (None only for the root)
    parent: Option<Arc<FilterNode>>,

    /// Explicit rank, `INHERIT` when deferring to the parent
    level: AtomicU32,

    /// Free-text annotation
    note: RwLock<String>,
}

impl FilterNode {
    fn root(level: Rank) -> Self {
        Self {
            name: ROOT_NAMESPACE.to_string(),
            parent: None,
            level: AtomicU32::new(level.get()),
            note: RwLock::new(String::new()),
        }
    }

    fn child(name: String, parent: Arc<FilterNode>) -> Self {
        Self {
            name,
            parent: Some(parent),
            level: AtomicU32::new(INHERIT),
            note: RwLock::new(String::new()),
        }
    }

    /// Full namespace of this node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, None for the root
    pub fn parent(&self) -> Option<&Arc<FilterNode>> {
        self.parent.as_ref()
    }

    /// Is this the tree root?
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Explicit level, None when inheriting
    pub fn level(&self) -> Option<Rank> {
        Rank::new(self.level.load(Ordering::Acquire))
    }

    /// Annotation attached to this filter
    pub fn note(&self) -> String {
        self.note.read().clone()
    }

    /// Effective level: the nearest explicit level walking up to the root
    pub fn resolve(&self) -> Rank {
        let mut node = self;
        loop {
            if let Some(rank) = node.level() {
                return rank;
            }
            match &node.parent {
                Some(parent) => node = parent.as_ref(),
                // the root always holds a level
                None => return Rank::for_position(0),
            }
        }
    }

    /// Number of segments between this node and the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self;
        while let Some(parent) = &node.parent {
            depth += 1;
            node = parent.as_ref();
        }
        depth
    }

    fn store_level(&self, level: Option<Rank>) {
        let raw = level.map(Rank::get).unwrap_or(INHERIT);
        self.level.store(raw, Ordering::Release);
    }

    fn store_note(&self, note: &str) {
        *self.note.write() = note.to_string();
    }
}

impl fmt::Debug for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterNode")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("note", &*self.note.read())
            .finish()
    }
}

/// Namespace hierarchy of filter nodes. Nodes are never removed.
pub struct FilterTree {
    root: Arc<FilterNode>,
    nodes: RwLock<BTreeMap<String, Arc<FilterNode>>>,
}

impl FilterTree {
    /// Create a tree holding only the root, set to `root_level`
    pub fn new(root_level: Rank) -> Self {
        Self {
            root: Arc::new(FilterNode::root(root_level)),
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    /// The root node
    pub fn root(&self) -> &Arc<FilterNode> {
        &self.root
    }

    /// Look up an existing node without creating it
    pub fn get(&self, namespace: &str) -> Option<Arc<FilterNode>> {
        if namespace == ROOT_NAMESPACE {
            return Some(self.root.clone());
        }
        self.nodes.read().get(namespace).cloned()
    }

    /// Return the node for `namespace`, creating it and any missing ancestors
    pub fn locate_or_create(&self, namespace: &str) -> Result<Arc<FilterNode>> {
        if let Some(node) = self.get(namespace) {
            return Ok(node);
        }

        validate_namespace(namespace)?;

        let mut nodes = self.nodes.write();
        let mut current = self.root.clone();
        let mut path = String::with_capacity(namespace.len());

        for segment in namespace.split('.') {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);

            if path == ROOT_NAMESPACE {
                current = self.root.clone();
                continue;
            }

            current = nodes
                .entry(path.clone())
                .or_insert_with(|| Arc::new(FilterNode::child(path.clone(), current.clone())))
                .clone();
        }

        Ok(current)
    }

    /// Set (or unset with `None`) the explicit level of a namespace
    pub fn set_level(
        &self,
        namespace: &str,
        level: Option<Rank>,
        note: Option<&str>,
    ) -> Result<Arc<FilterNode>> {
        if namespace == ROOT_NAMESPACE && level.is_none() {
            return Err(LogError::RootUnset);
        }

        let node = self.locate_or_create(namespace)?;
        node.store_level(level);
        if let Some(note) = note {
            node.store_note(note);
        }
        Ok(node)
    }

    /// Effective level of a namespace
    pub fn resolve(&self, namespace: &str) -> Result<Rank> {
        Ok(self.locate_or_create(namespace)?.resolve())
    }

    /// All nodes, root first, the rest ordered by namespace
    pub fn nodes(&self) -> Vec<Arc<FilterNode>> {
        let nodes = self.nodes.read();
        let mut all = Vec::with_capacity(nodes.len() + 1);
        all.push(self.root.clone());
        all.extend(nodes.values().cloned());
        all
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.read().len() + 1
    }

    /// The tree always holds the root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Reset the root and translate every explicit level after a schema change
    pub(crate) fn remap_levels<F>(&self, root_level: Rank, remap: F)
    where
        F: Fn(&FilterNode, Rank) -> Option<Rank>,
    {
        self.root.store_level(Some(root_level));
        for node in self.nodes.read().values() {
            if let Some(rank) = node.level() {
                node.store_level(remap(node, rank));
            }
        }
    }
}

impl fmt::Debug for FilterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterTree")
            .field("root", &self.root)
            .field("nodes", &self.len())
            .finish()
    }
}

/// Check namespace syntax: dot-delimited, non-empty segments, no whitespace
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(LogError::namespace(namespace, "namespace cannot be empty"));
    }
    if namespace.chars().any(char::is_whitespace) {
        return Err(LogError::namespace(
            namespace,
            "namespace cannot contain whitespace",
        ));
    }
    if namespace.split('.').any(str::is_empty) {
        return Err(LogError::namespace(
            namespace,
            "namespace segments cannot be empty",
        ));
    }
    Ok(())
}
