//! Persistent permission tree.
//!
//! Permission nodes are dotted paths (`build.place.stone`). A value bound to
//! `build` applies to every descendant that does not carry its own value, so
//! lookups walk from the root towards the requested node and keep the
//! deepest defined value seen on the way.
//!
//! Trees are immutable. [`NodeTree::with_value`] copies only the nodes on the
//! modified path; every untouched subtree is shared with the original tree
//! through `Arc`, which keeps copy-on-write updates in
//! [`MemorySubjectData`](crate::MemorySubjectData) cheap.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::Tristate;

#[derive(Clone, Debug, Default)]
struct Node {
    value: Tristate,
    children: HashMap<String, Arc<Node>>,
}

impl Node {
    fn is_prunable(&self) -> bool {
        !self.value.is_defined() && self.children.is_empty()
    }
}

/// An immutable tree of permission values keyed by dotted, case-insensitive
/// node names.
#[derive(Clone, Debug)]
pub struct NodeTree {
    root: Arc<Node>,
}

impl NodeTree {
    /// Creates an empty tree whose lookups resolve to `default`.
    pub fn empty(default: Tristate) -> Self {
        Self {
            root: Arc::new(Node {
                value: default,
                children: HashMap::new(),
            }),
        }
    }

    /// Builds a tree from explicit `node -> bool` entries with an
    /// `Undefined` default.
    pub fn of<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        Self::of_with_default(values, Tristate::Undefined)
    }

    /// Builds a tree from explicit `node -> bool` entries.
    pub fn of_with_default<I, K>(values: I, default: Tristate) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        Self::empty(default).with_all(values)
    }

    /// The value returned for nodes with no defined ancestor.
    pub fn default_value(&self) -> Tristate {
        self.root.value
    }

    /// True when no node carries an explicit value.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Resolves `node` to the value of its most specific defined ancestor
    /// (itself included), or the tree default.
    pub fn get(&self, node: &str) -> Tristate {
        let node = node.to_lowercase();
        let mut current = &self.root;
        let mut resolved = self.root.value;
        for part in node.split('.') {
            let Some(child) = current.children.get(part) else {
                break;
            };
            current = child;
            if child.value.is_defined() {
                resolved = child.value;
            }
        }
        resolved
    }

    /// Returns the value stored on exactly `node`, ignoring inheritance.
    pub fn get_exact(&self, node: &str) -> Tristate {
        let node = node.to_lowercase();
        let mut current = &self.root;
        for part in node.split('.') {
            match current.children.get(part) {
                Some(child) => current = child,
                None => return Tristate::Undefined,
            }
        }
        current.value
    }

    /// Returns a new tree with `node` bound to `value`.
    ///
    /// Binding `Undefined` removes the explicit value so lookups fall back to
    /// the nearest defined ancestor again.
    #[must_use]
    pub fn with_value(&self, node: &str, value: Tristate) -> Self {
        let node = node.to_lowercase();
        let parts: Vec<&str> = node.split('.').collect();

        let mut root = (*self.root).clone();
        Self::rewrite(&mut root, &parts, value);
        Self {
            root: Arc::new(root),
        }
    }

    /// Returns a new tree with every entry of `values` applied in order.
    #[must_use]
    pub fn with_all<I, K>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        self.with_all_tristates(
            values
                .into_iter()
                .map(|(node, value)| (node, Tristate::from_bool(value))),
        )
    }

    /// Like [`NodeTree::with_all`], accepting `Undefined` to unset nodes.
    #[must_use]
    pub fn with_all_tristates<I, K>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, Tristate)>,
        K: AsRef<str>,
    {
        values
            .into_iter()
            .fold(self.clone(), |tree, (node, value)| {
                tree.with_value(node.as_ref(), value)
            })
    }

    /// Returns every explicitly defined node with its value.
    ///
    /// The tree default is never included.
    pub fn as_map(&self) -> BTreeMap<String, bool> {
        let mut values = BTreeMap::new();
        for (name, child) in &self.root.children {
            Self::collect(child, name.clone(), &mut values);
        }
        values
    }

    fn collect(node: &Node, path: String, values: &mut BTreeMap<String, bool>) {
        if node.value.is_defined() {
            values.insert(path.clone(), node.value.as_bool());
        }
        for (name, child) in &node.children {
            Self::collect(child, format!("{path}.{name}"), values);
        }
    }

    // Copies the path below `parent`, dropping children left empty.
    fn rewrite(parent: &mut Node, parts: &[&str], value: Tristate) {
        let Some((head, rest)) = parts.split_first() else {
            parent.value = value;
            return;
        };
        let mut child = parent
            .children
            .get(*head)
            .map(|node| (**node).clone())
            .unwrap_or_default();
        Self::rewrite(&mut child, rest, value);
        if child.is_prunable() {
            parent.children.remove(*head);
        } else {
            parent.children.insert((*head).to_string(), Arc::new(child));
        }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::empty(Tristate::Undefined)
    }
}

impl PartialEq for NodeTree {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
            || (self.default_value() == other.default_value() && self.as_map() == other.as_map())
    }
}

impl Eq for NodeTree {}
