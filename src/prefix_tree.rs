//! Index over delimited strings supporting efficient prefix traversal.
//!
//! Each tree level represents one component of a delimited string, so walking
//! a path walks the tree. Nodes are kept in an arena and reference each other
//! by index; a node's parent link and the key under which its parent holds it
//! allow erasure to prune empty branches rootward. Component comparison is
//! ASCII case-insensitive.

use indexmap::IndexMap;

use crate::path_utils::AsciiCaseKey;

/// Maximum number of alternative delimiter strings a tree can be built with.
pub const MAX_DELIMITERS: usize = 4;

const ROOT: usize = 0;

/// Handle to a node inside a [`PrefixTree`]. Valid for the tree that produced
/// it; handles to erased nodes dereference to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    parent: Option<usize>,
    parent_key: AsciiCaseKey,
    data: Option<T>,
    children: IndexMap<AsciiCaseKey, usize>,
}

impl<T> Node<T> {
    fn new(parent: Option<usize>, parent_key: AsciiCaseKey) -> Self {
        Self {
            parent,
            parent_key,
            data: None,
            children: IndexMap::new(),
        }
    }
}

/// Prefix tree keyed by delimited strings, storing optional data of type `T`
/// at each node.
#[derive(Debug)]
pub struct PrefixTree<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    delimiters: Vec<String>,
}

impl<T> Default for PrefixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PrefixTree<T> {
    /// Creates a tree using the standard backslash delimiter for filesystem
    /// paths.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delimiters(&["\\"])
    }

    /// Creates a tree using the given set of alternative delimiter strings.
    /// The set is fixed for the lifetime of the tree.
    ///
    /// # Panics
    /// Panics if no delimiters are supplied, more than [`MAX_DELIMITERS`] are
    /// supplied, or any delimiter is empty.
    #[must_use]
    pub fn with_delimiters(delimiters: &[&str]) -> Self {
        assert!(
            !delimiters.is_empty() && delimiters.len() <= MAX_DELIMITERS,
            "a prefix tree requires between 1 and {MAX_DELIMITERS} delimiters"
        );
        assert!(
            delimiters.iter().all(|d| !d.is_empty()),
            "prefix tree delimiters cannot be empty strings"
        );
        Self {
            nodes: vec![Some(Node::new(None, AsciiCaseKey::new("")))],
            free: Vec::new(),
            delimiters: delimiters.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates any nodes needed to represent `key` and stores `value` at the
    /// terminal node. If that node already carries data it is left untouched.
    /// Returns the terminal node and whether the tree was modified.
    pub fn insert(&mut self, key: &str, value: T) -> (NodeId, bool) {
        let id = self.create_path(key);
        let Some(node) = self.slot_mut(id) else {
            return (NodeId(id), false);
        };
        if node.data.is_some() {
            return (NodeId(id), false);
        }
        node.data = Some(value);
        (NodeId(id), true)
    }

    /// Stores `value` at the terminal node for `key`, creating nodes as
    /// needed and replacing any data already present.
    pub fn update(&mut self, key: &str, value: T) -> NodeId {
        let id = self.create_path(key);
        if let Some(node) = self.slot_mut(id) {
            node.data = Some(value);
        }
        NodeId(id)
    }

    /// Clears the data at the terminal node for `key`, then prunes every
    /// ancestor left with neither data nor children. Returns whether a
    /// data-bearing node was erased.
    pub fn erase(&mut self, key: &str) -> bool {
        let Some(NodeId(mut id)) = self.find(key) else {
            return false;
        };
        if let Some(node) = self.slot_mut(id) {
            node.data = None;
        }

        while id != ROOT {
            let Some(node) = self.slot(id) else { break };
            if node.data.is_some() || !node.children.is_empty() {
                break;
            }
            let parent = node.parent.unwrap_or(ROOT);
            let child_key = node.parent_key.clone();
            if let Some(parent_node) = self.slot_mut(parent) {
                parent_node.children.shift_remove(&child_key);
            }
            self.nodes[id] = None;
            self.free.push(id);
            id = parent;
        }
        true
    }

    /// Locates the node for `key`, requiring it to carry data.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<NodeId> {
        let id = self.traverse_to(key)?;
        self.data(id).is_some().then_some(id)
    }

    /// Checks whether the tree contains `key` as a data-bearing node.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Walks to the node for `key` regardless of whether it carries data.
    /// Returns `None` if any component along the way has no matching child.
    #[must_use]
    pub fn traverse_to(&self, key: &str) -> Option<NodeId> {
        let mut current = ROOT;
        for component in self.components(key) {
            current = self.child_of(current, component)?;
        }
        Some(NodeId(current))
    }

    /// Checks whether some key in the tree begins with `key`; in other words,
    /// whether a path of nodes exists for it, data-bearing or not.
    #[must_use]
    pub fn has_path_for_prefix(&self, key: &str) -> bool {
        self.traverse_to(key).is_some()
    }

    /// Returns the deepest node that carries data among the ancestors of
    /// `key` (including the node for `key` itself, and the root). The walk
    /// stops at the first component with no matching child.
    #[must_use]
    pub fn longest_matching_prefix(&self, key: &str) -> Option<NodeId> {
        let mut current = ROOT;
        let mut deepest = None;
        for component in self.components(key) {
            if self.data(NodeId(current)).is_some() {
                deepest = Some(NodeId(current));
            }
            match self.child_of(current, component) {
                Some(next) => current = next,
                None => break,
            }
        }
        if self.data(NodeId(current)).is_some() {
            deepest = Some(NodeId(current));
        }
        deepest
    }

    /// Data stored at `id`, if the node exists and carries any.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&T> {
        self.slot(id.0)?.data.as_ref()
    }

    /// Mutable access to the data stored at `id`.
    #[must_use]
    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slot_mut(id.0)?.data.as_mut()
    }

    /// Parent of `id`, if any. The root has no parent.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id.0)?.parent.map(NodeId)
    }

    /// The folded key under which the parent of `id` holds it.
    #[must_use]
    pub fn parent_key(&self, id: NodeId) -> &str {
        self.slot(id.0).map_or("", |node| node.parent_key.as_str())
    }

    /// Iterates over the direct children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.slot(id.0)
            .into_iter()
            .flat_map(|node| node.children.values().copied().map(NodeId))
    }

    fn slot(&self, id: usize) -> Option<&Node<T>> {
        self.nodes.get(id)?.as_ref()
    }

    fn slot_mut(&mut self, id: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id)?.as_mut()
    }

    fn child_of(&self, id: usize, component: &str) -> Option<usize> {
        self.slot(id)?
            .children
            .get(&AsciiCaseKey::new(component))
            .copied()
    }

    fn create_path(&mut self, key: &str) -> usize {
        let components: Vec<String> = self.components(key).map(ToString::to_string).collect();
        let mut current = ROOT;
        for component in components {
            let child_key = AsciiCaseKey::new(&component);
            if let Some(existing) = self.child_of(current, &component) {
                current = existing;
                continue;
            }
            let new_node = Node::new(Some(current), child_key.clone());
            let new_id = match self.free.pop() {
                Some(reused) => {
                    self.nodes[reused] = Some(new_node);
                    reused
                }
                None => {
                    self.nodes.push(Some(new_node));
                    self.nodes.len() - 1
                }
            };
            if let Some(parent_node) = self.slot_mut(current) {
                parent_node.children.insert(child_key, new_id);
            }
            current = new_id;
        }
        current
    }

    /// Splits `key` on any of the configured delimiters, skipping empty
    /// components. On overlapping matches the earliest occurrence wins, with
    /// delimiter declaration order breaking ties.
    fn components<'k>(&self, key: &'k str) -> impl Iterator<Item = &'k str> {
        let mut pieces = Vec::new();
        let mut rest = key;
        while !rest.is_empty() {
            let mut earliest: Option<(usize, usize)> = None;
            for delimiter in &self.delimiters {
                if let Some(pos) = rest.find(delimiter.as_str())
                    && earliest.is_none_or(|(best, _)| pos < best)
                {
                    earliest = Some((pos, delimiter.len()));
                }
            }
            match earliest {
                Some((pos, len)) => {
                    if pos > 0 {
                        pieces.push(&rest[..pos]);
                    }
                    rest = &rest[pos + len..];
                }
                None => {
                    pieces.push(rest);
                    break;
                }
            }
        }
        pieces.into_iter()
    }
}

#[cfg(test)]
#[path = "prefix_tree_tests.rs"]
mod tests;
