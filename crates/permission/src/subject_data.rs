//! Subject data contract.
//!
//! Subject data is everything stored *on* a subject, scoped by context set:
//! permission values, ordered parent references and string options. Reads
//! are synchronous snapshots; mutations are async and report whether they
//! actually changed anything.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{ContextSet, NodeTree, SubjectReference, Tristate};

/// Storage for the permissions, parents and options of one subject.
#[async_trait]
pub trait SubjectData: Send + Sync {
    // ===== permissions =====

    /// Every explicitly set permission, grouped by context set.
    fn all_permissions(&self) -> BTreeMap<ContextSet, BTreeMap<String, bool>>;

    /// The explicitly set permissions for exactly `contexts`.
    fn permissions(&self, contexts: &ContextSet) -> BTreeMap<String, bool> {
        self.node_tree(contexts).as_map()
    }

    /// The permission tree for exactly `contexts` (empty if none is stored).
    fn node_tree(&self, contexts: &ContextSet) -> NodeTree;

    /// Binds `node` to `value` under `contexts`.
    ///
    /// Returns `false` when the node already held `value`.
    async fn set_permission(&self, contexts: &ContextSet, node: &str, value: Tristate) -> bool;

    /// Removes every permission in every context set.
    async fn clear_permissions(&self) -> bool;

    /// Removes every permission stored under exactly `contexts`.
    async fn clear_permissions_in(&self, contexts: &ContextSet) -> bool;

    // ===== parents =====

    fn all_parents(&self) -> BTreeMap<ContextSet, Vec<SubjectReference>>;

    /// Parents stored under exactly `contexts`, in insertion order.
    fn parents(&self, contexts: &ContextSet) -> Vec<SubjectReference>;

    async fn add_parent(&self, contexts: &ContextSet, parent: SubjectReference) -> bool;

    async fn remove_parent(&self, contexts: &ContextSet, parent: &SubjectReference) -> bool;

    async fn clear_parents(&self) -> bool;

    async fn clear_parents_in(&self, contexts: &ContextSet) -> bool;

    // ===== options =====

    fn all_options(&self) -> BTreeMap<ContextSet, BTreeMap<String, String>>;

    fn options(&self, contexts: &ContextSet) -> BTreeMap<String, String>;

    fn option(&self, contexts: &ContextSet, key: &str) -> Option<String> {
        self.options(contexts).remove(&key.to_lowercase())
    }

    /// Sets `key` to `value`, or removes it when `value` is `None`.
    async fn set_option(&self, contexts: &ContextSet, key: &str, value: Option<String>) -> bool;

    async fn clear_options(&self) -> bool;

    async fn clear_options_in(&self, contexts: &ContextSet) -> bool;

    // ===== resolution support =====

    /// Stored context sets that apply under `active`, most specific first.
    fn applicable_contexts(&self, active: &ContextSet) -> Vec<ContextSet>;
}
