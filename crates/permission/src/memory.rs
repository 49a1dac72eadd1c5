//! In-memory, copy-on-write subject data.
//!
//! Each store maps a [`ContextSet`] to an immutable `Arc` snapshot. A
//! mutation reads the current snapshot, derives a new one and installs it
//! only if the slot still holds the snapshot it started from; otherwise it
//! retries against the newer value. Writers to different context sets touch
//! different slots, and readers always clone a complete snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{ContextSet, NodeTree, SubjectData, SubjectReference, Tristate};

type Store<V> = DashMap<ContextSet, Arc<V>>;

/// Outcome of deriving a new snapshot from the current one.
enum Update<V> {
    Unchanged,
    Replace(V),
    Remove,
}

/// Thread-safe [`SubjectData`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySubjectData {
    permissions: Store<NodeTree>,
    parents: Store<Vec<SubjectReference>>,
    options: Store<BTreeMap<String, String>>,
}

impl MemorySubjectData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores data previously captured with [`MemorySubjectData::snapshot`].
    pub fn from_snapshot(snapshot: SubjectDataSnapshot) -> Self {
        let data = Self::new();
        for (contexts, values) in snapshot.permissions {
            if !values.is_empty() {
                data.permissions
                    .insert(contexts, Arc::new(NodeTree::of(values)));
            }
        }
        for (contexts, parents) in snapshot.parents {
            let mut seen = BTreeSet::new();
            let parents: Vec<_> = parents
                .into_iter()
                .filter(|parent| seen.insert(parent.clone()))
                .collect();
            if !parents.is_empty() {
                data.parents.insert(contexts, Arc::new(parents));
            }
        }
        for (contexts, options) in snapshot.options {
            let options: BTreeMap<_, _> = options
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect();
            if !options.is_empty() {
                data.options.insert(contexts, Arc::new(options));
            }
        }
        data
    }

    /// Captures every store as plain, serializable collections.
    pub fn snapshot(&self) -> SubjectDataSnapshot {
        SubjectDataSnapshot {
            permissions: self.all_permissions().into_iter().collect(),
            parents: self.all_parents().into_iter().collect(),
            options: self.all_options().into_iter().collect(),
        }
    }

    /// True when no store holds any data.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.parents.is_empty() && self.options.is_empty()
    }
}

#[async_trait]
impl SubjectData for MemorySubjectData {
    fn all_permissions(&self) -> BTreeMap<ContextSet, BTreeMap<String, bool>> {
        self.permissions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().as_map()))
            .collect()
    }

    fn node_tree(&self, contexts: &ContextSet) -> NodeTree {
        read(&self.permissions, contexts)
            .map(|tree| (*tree).clone())
            .unwrap_or_default()
    }

    async fn set_permission(&self, contexts: &ContextSet, node: &str, value: Tristate) -> bool {
        let changed = update(&self.permissions, contexts, |current| {
            let tree = current.map(|tree| (**tree).clone()).unwrap_or_default();
            if tree.get_exact(node) == value {
                return Update::Unchanged;
            }
            let tree = tree.with_value(node, value);
            if tree.is_empty() {
                Update::Remove
            } else {
                Update::Replace(tree)
            }
        });
        if changed {
            tracing::trace!(contexts = %contexts, node, %value, "permission set");
        }
        changed
    }

    async fn clear_permissions(&self) -> bool {
        clear_all(&self.permissions)
    }

    async fn clear_permissions_in(&self, contexts: &ContextSet) -> bool {
        self.permissions.remove(contexts).is_some()
    }

    fn all_parents(&self) -> BTreeMap<ContextSet, Vec<SubjectReference>> {
        self.parents
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().to_vec()))
            .collect()
    }

    fn parents(&self, contexts: &ContextSet) -> Vec<SubjectReference> {
        read(&self.parents, contexts)
            .map(|parents| parents.to_vec())
            .unwrap_or_default()
    }

    async fn add_parent(&self, contexts: &ContextSet, parent: SubjectReference) -> bool {
        let changed = update(&self.parents, contexts, |current| {
            let mut parents = current.map(|p| p.to_vec()).unwrap_or_default();
            if parents.contains(&parent) {
                return Update::Unchanged;
            }
            parents.push(parent.clone());
            Update::Replace(parents)
        });
        if changed {
            tracing::trace!(contexts = %contexts, %parent, "parent added");
        }
        changed
    }

    async fn remove_parent(&self, contexts: &ContextSet, parent: &SubjectReference) -> bool {
        let changed = update(&self.parents, contexts, |current| {
            let Some(parents) = current.filter(|p| p.contains(parent)) else {
                return Update::Unchanged;
            };
            let parents: Vec<_> = parents.iter().filter(|p| *p != parent).cloned().collect();
            if parents.is_empty() {
                Update::Remove
            } else {
                Update::Replace(parents)
            }
        });
        if changed {
            tracing::trace!(contexts = %contexts, %parent, "parent removed");
        }
        changed
    }

    async fn clear_parents(&self) -> bool {
        clear_all(&self.parents)
    }

    async fn clear_parents_in(&self, contexts: &ContextSet) -> bool {
        self.parents.remove(contexts).is_some()
    }

    fn all_options(&self) -> BTreeMap<ContextSet, BTreeMap<String, String>> {
        self.options
            .iter()
            .map(|entry| (entry.key().clone(), (**entry.value()).clone()))
            .collect()
    }

    fn options(&self, contexts: &ContextSet) -> BTreeMap<String, String> {
        read(&self.options, contexts)
            .map(|options| (*options).clone())
            .unwrap_or_default()
    }

    fn option(&self, contexts: &ContextSet, key: &str) -> Option<String> {
        read(&self.options, contexts)?.get(&key.to_lowercase()).cloned()
    }

    async fn set_option(&self, contexts: &ContextSet, key: &str, value: Option<String>) -> bool {
        let key = key.to_lowercase();
        let changed = update(&self.options, contexts, |current| {
            let mut options = current.map(|o| (**o).clone()).unwrap_or_default();
            match &value {
                Some(value) if options.get(&key) == Some(value) => return Update::Unchanged,
                Some(value) => {
                    options.insert(key.clone(), value.clone());
                }
                None => {
                    if options.remove(&key).is_none() {
                        return Update::Unchanged;
                    }
                }
            }
            if options.is_empty() {
                Update::Remove
            } else {
                Update::Replace(options)
            }
        });
        if changed {
            tracing::trace!(contexts = %contexts, key = %key, ?value, "option set");
        }
        changed
    }

    async fn clear_options(&self) -> bool {
        clear_all(&self.options)
    }

    async fn clear_options_in(&self, contexts: &ContextSet) -> bool {
        self.options.remove(contexts).is_some()
    }

    fn applicable_contexts(&self, active: &ContextSet) -> Vec<ContextSet> {
        let mut applicable = BTreeSet::new();
        for store in [
            keys(&self.permissions),
            keys(&self.parents),
            keys(&self.options),
        ] {
            applicable.extend(store.into_iter().filter(|c| c.is_subset_of(active)));
        }
        let mut applicable: Vec<_> = applicable.into_iter().collect();
        // Larger sets are more specific; ties keep the stable set ordering.
        applicable.sort_by(|a, b| b.len().cmp(&a.len()));
        applicable
    }
}

/// Plain-collection image of a [`MemorySubjectData`].
///
/// Context sets are kept as list entries rather than map keys so the
/// snapshot serializes to formats that only allow string keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubjectDataSnapshot {
    pub permissions: Vec<(ContextSet, BTreeMap<String, bool>)>,
    pub parents: Vec<(ContextSet, Vec<SubjectReference>)>,
    pub options: Vec<(ContextSet, BTreeMap<String, String>)>,
}

// ============================================================================
// Compare-and-swap helpers
// ============================================================================

fn read<V>(store: &Store<V>, contexts: &ContextSet) -> Option<Arc<V>> {
    store.get(contexts).map(|entry| Arc::clone(entry.value()))
}

fn keys<V>(store: &Store<V>) -> Vec<ContextSet> {
    store.iter().map(|entry| entry.key().clone()).collect()
}

/// Installs `replacement` only if the slot still holds `expected`
/// (`None` meaning the slot must be vacant).
fn compare_and_swap<V>(
    store: &Store<V>,
    contexts: &ContextSet,
    expected: Option<&Arc<V>>,
    replacement: Option<Arc<V>>,
) -> bool {
    match (store.entry(contexts.clone()), expected) {
        (Entry::Occupied(mut slot), Some(expected)) if Arc::ptr_eq(slot.get(), expected) => {
            match replacement {
                Some(value) => {
                    slot.insert(value);
                }
                None => {
                    slot.remove();
                }
            }
            true
        }
        (Entry::Vacant(slot), None) => {
            if let Some(value) = replacement {
                slot.insert(value);
            }
            true
        }
        _ => false,
    }
}

/// Applies `derive` to the current snapshot until the swap succeeds.
fn update<V>(
    store: &Store<V>,
    contexts: &ContextSet,
    derive: impl Fn(Option<&Arc<V>>) -> Update<V>,
) -> bool {
    loop {
        let current = read(store, contexts);
        let replacement = match derive(current.as_ref()) {
            Update::Unchanged => return false,
            Update::Replace(value) => Some(Arc::new(value)),
            Update::Remove if current.is_none() => return false,
            Update::Remove => None,
        };
        if compare_and_swap(store, contexts, current.as_ref(), replacement) {
            return true;
        }
        tracing::trace!(contexts = %contexts, "snapshot replaced concurrently, retrying");
    }
}

fn clear_all<V>(store: &Store<V>) -> bool {
    keys(store)
        .iter()
        .fold(false, |changed, contexts| store.remove(contexts).is_some() || changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;

    fn nether() -> ContextSet {
        ContextSet::from(Context::world("nether"))
    }

    fn group(name: &str) -> SubjectReference {
        SubjectReference::new("group", name).unwrap()
    }

    #[tokio::test]
    async fn set_permission_reports_changes() {
        let data = MemorySubjectData::new();
        let global = ContextSet::global();

        assert!(data.set_permission(&global, "build", Tristate::True).await);
        assert!(!data.set_permission(&global, "build", Tristate::True).await);
        assert!(data.set_permission(&global, "build", Tristate::False).await);
        assert_eq!(data.node_tree(&global).get("build.place"), Tristate::False);
    }

    #[tokio::test]
    async fn explicit_child_is_not_a_noop_when_inherited() {
        let data = MemorySubjectData::new();
        let global = ContextSet::global();

        data.set_permission(&global, "build", Tristate::True).await;
        assert!(data.set_permission(&global, "build.place", Tristate::True).await);
        data.set_permission(&global, "build", Tristate::Undefined).await;
        assert_eq!(data.node_tree(&global).get("build.place"), Tristate::True);
    }

    #[tokio::test]
    async fn undefined_on_absent_context_is_noop() {
        let data = MemorySubjectData::new();
        assert!(!data.set_permission(&nether(), "fly", Tristate::Undefined).await);
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn unsetting_last_permission_drops_context() {
        let data = MemorySubjectData::new();
        data.set_permission(&nether(), "fly", Tristate::True).await;
        assert!(data.set_permission(&nether(), "fly", Tristate::Undefined).await);
        assert!(data.all_permissions().is_empty());
    }

    #[tokio::test]
    async fn permissions_are_scoped_by_context() {
        let data = MemorySubjectData::new();
        data.set_permission(&nether(), "fly", Tristate::True).await;

        assert_eq!(data.node_tree(&nether()).get("fly"), Tristate::True);
        assert_eq!(data.node_tree(&ContextSet::global()).get("fly"), Tristate::Undefined);
        assert_eq!(
            data.permissions(&nether()),
            BTreeMap::from([("fly".to_string(), true)])
        );
    }

    #[tokio::test]
    async fn parents_keep_order_and_reject_duplicates() {
        let data = MemorySubjectData::new();
        let global = ContextSet::global();

        assert!(data.add_parent(&global, group("admin")).await);
        assert!(data.add_parent(&global, group("builder")).await);
        assert!(!data.add_parent(&global, group("admin")).await);
        assert_eq!(data.parents(&global), vec![group("admin"), group("builder")]);

        assert!(data.remove_parent(&global, &group("admin")).await);
        assert!(!data.remove_parent(&global, &group("admin")).await);
        assert!(data.remove_parent(&global, &group("builder")).await);
        assert!(data.all_parents().is_empty());
    }

    #[tokio::test]
    async fn options_lowercase_keys_and_detect_noops() {
        let data = MemorySubjectData::new();
        let global = ContextSet::global();

        assert!(data.set_option(&global, "Prefix", Some("[A]".into())).await);
        assert!(!data.set_option(&global, "prefix", Some("[A]".into())).await);
        assert_eq!(data.option(&global, "PREFIX").as_deref(), Some("[A]"));

        assert!(data.set_option(&global, "prefix", None).await);
        assert!(!data.set_option(&global, "prefix", None).await);
        assert!(data.all_options().is_empty());
    }

    #[tokio::test]
    async fn clear_reports_whether_anything_was_removed() {
        let data = MemorySubjectData::new();
        assert!(!data.clear_permissions().await);
        assert!(!data.clear_parents_in(&nether()).await);

        data.set_permission(&nether(), "fly", Tristate::True).await;
        data.set_permission(&ContextSet::global(), "chat", Tristate::True).await;
        data.set_option(&nether(), "speed", Some("2".into())).await;

        assert!(data.clear_permissions_in(&nether()).await);
        assert!(data.clear_permissions().await);
        assert!(data.clear_options().await);
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn applicable_contexts_order_by_specificity() {
        let data = MemorySubjectData::new();
        let both = nether().with(Context::new("server", "lobby"));
        data.set_permission(&ContextSet::global(), "a", Tristate::True).await;
        data.set_permission(&both, "a", Tristate::True).await;
        data.add_parent(&nether(), group("admin")).await;
        data.set_option(&ContextSet::from(Context::world("end")), "k", Some("v".into()))
            .await;

        assert_eq!(
            data.applicable_contexts(&both),
            vec![both.clone(), nether(), ContextSet::global()]
        );
        assert_eq!(
            data.applicable_contexts(&nether()),
            vec![nether(), ContextSet::global()]
        );
    }

    #[tokio::test]
    async fn snapshot_restores_every_store() {
        let data = MemorySubjectData::new();
        data.set_permission(&nether(), "fly", Tristate::False).await;
        data.add_parent(&ContextSet::global(), group("admin")).await;
        data.set_option(&ContextSet::global(), "prefix", Some("[A]".into()))
            .await;

        let restored = MemorySubjectData::from_snapshot(data.snapshot());
        assert_eq!(restored.snapshot(), data.snapshot());
        assert_eq!(restored.node_tree(&nether()).get("fly"), Tristate::False);
    }
}
