//! Subject registry and context-scoped resolution.
//!
//! Resolution for a subject under a set of active contexts consults, in
//! order:
//!
//! 1. the subject's own data (transient, then persistent), trying every
//!    stored context set that applies, most specific first;
//! 2. its applicable parents, depth-first in stored order;
//! 3. the default subject of its collection, then the service-wide default;
//! 4. [`ServiceConfig::default_permission`].
//!
//! The first defined answer wins. A visited set stops parent cycles.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::{
    ContextSet, MemorySubjectData, ServiceConfig, Subject, SubjectCollection, SubjectData,
    SubjectReference, Tristate,
};

/// Entry point for loading subjects and answering permission queries.
#[derive(Debug)]
pub struct PermissionService {
    config: ServiceConfig,
    collections: DashMap<String, Arc<SubjectCollection>>,
}

impl PermissionService {
    pub const USER_COLLECTION: &'static str = "user";
    pub const GROUP_COLLECTION: &'static str = "group";
    pub const DEFAULTS_COLLECTION: &'static str = "defaults";
    /// Identifier of the service-wide default subject.
    pub const SERVICE_DEFAULTS: &'static str = "default";

    pub fn new(config: ServiceConfig) -> Self {
        let service = Self {
            config,
            collections: DashMap::new(),
        };
        // User and group collections always exist.
        service.collection(Self::USER_COLLECTION);
        service.collection(Self::GROUP_COLLECTION);
        service.collection(Self::DEFAULTS_COLLECTION);
        tracing::debug!(config = ?service.config, "permission service created");
        service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the named collection, creating it on first use.
    pub fn collection(&self, identifier: &str) -> Arc<SubjectCollection> {
        let identifier = identifier.to_lowercase();
        Arc::clone(
            self.collections
                .entry(identifier.clone())
                .or_insert_with(|| Arc::new(SubjectCollection::new(identifier)))
                .value(),
        )
    }

    pub fn get_collection(&self, identifier: &str) -> Option<Arc<SubjectCollection>> {
        self.collections
            .get(&identifier.to_lowercase())
            .map(|collection| Arc::clone(collection.value()))
    }

    /// Identifiers of every known collection, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.collections.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }

    pub fn load_subject(&self, reference: &SubjectReference) -> Result<Arc<Subject>> {
        self.collection(reference.collection())
            .load_subject(reference.identifier())
    }

    pub fn get_subject(&self, reference: &SubjectReference) -> Option<Arc<Subject>> {
        self.get_collection(reference.collection())?
            .get_subject(reference.identifier())
    }

    /// The service-wide default subject.
    pub fn defaults(&self) -> Result<Arc<Subject>> {
        self.collection(Self::DEFAULTS_COLLECTION)
            .load_subject(Self::SERVICE_DEFAULTS)
    }

    /// The default subject for members of `collection`.
    pub fn collection_defaults(&self, collection: &str) -> Result<Arc<Subject>> {
        self.collection(Self::DEFAULTS_COLLECTION)
            .load_subject(&collection.to_lowercase())
    }

    /// Resolves `node` for `subject` under `contexts`.
    pub fn permission_value(
        &self,
        subject: &SubjectReference,
        contexts: &ContextSet,
        node: &str,
    ) -> Tristate {
        let value = self
            .resolve(subject, contexts, |data, scope| {
                let value = data.node_tree(scope).get(node);
                value.is_defined().then_some(value)
            })
            .unwrap_or(self.config.default_permission);
        tracing::debug!(%subject, contexts = %contexts, node, %value, "permission resolved");
        value
    }

    pub fn has_permission(
        &self,
        subject: &SubjectReference,
        contexts: &ContextSet,
        node: &str,
    ) -> bool {
        self.permission_value(subject, contexts, node).as_bool()
    }

    /// Resolves option `key` for `subject` under `contexts`.
    pub fn option(
        &self,
        subject: &SubjectReference,
        contexts: &ContextSet,
        key: &str,
    ) -> Option<String> {
        self.resolve(subject, contexts, |data, scope| data.option(scope, key))
    }

    /// Direct parents of `subject` that apply under `contexts`, without
    /// duplicates, transient data first.
    pub fn parents_of(
        &self,
        subject: &SubjectReference,
        contexts: &ContextSet,
    ) -> Vec<SubjectReference> {
        self.get_subject(subject)
            .map(|subject| applicable_parents(&subject, contexts))
            .unwrap_or_default()
    }

    fn resolve<T>(
        &self,
        subject: &SubjectReference,
        contexts: &ContextSet,
        lookup: impl Fn(&MemorySubjectData, &ContextSet) -> Option<T>,
    ) -> Option<T> {
        let mut visited = HashSet::new();
        if let Some(found) = self.resolve_subject(subject, contexts, &lookup, &mut visited, 0) {
            return Some(found);
        }
        if !self.config.use_defaults {
            return None;
        }

        let fallbacks = [
            SubjectReference::new(Self::DEFAULTS_COLLECTION, subject.collection()),
            SubjectReference::new(Self::DEFAULTS_COLLECTION, Self::SERVICE_DEFAULTS),
        ];
        fallbacks
            .into_iter()
            .flatten()
            .find_map(|fallback| {
                self.resolve_subject(&fallback, contexts, &lookup, &mut visited, 0)
            })
    }

    fn resolve_subject<T>(
        &self,
        reference: &SubjectReference,
        contexts: &ContextSet,
        lookup: &impl Fn(&MemorySubjectData, &ContextSet) -> Option<T>,
        visited: &mut HashSet<SubjectReference>,
        depth: usize,
    ) -> Option<T> {
        if depth > self.config.max_parent_depth {
            tracing::debug!(subject = %reference, depth, "parent depth limit reached");
            return None;
        }
        if !visited.insert(reference.clone()) {
            return None;
        }
        let subject = self.get_subject(reference)?;

        for data in subject.data_stores() {
            for scope in data.applicable_contexts(contexts) {
                if let Some(found) = lookup(data, &scope) {
                    return Some(found);
                }
            }
        }

        applicable_parents(&subject, contexts)
            .iter()
            .find_map(|parent| self.resolve_subject(parent, contexts, lookup, visited, depth + 1))
    }
}

impl Default for PermissionService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

fn applicable_parents(subject: &Subject, contexts: &ContextSet) -> Vec<SubjectReference> {
    let mut seen = HashSet::new();
    let mut parents = Vec::new();
    for data in subject.data_stores() {
        for scope in data.applicable_contexts(contexts) {
            for parent in data.parents(&scope) {
                if seen.insert(parent.clone()) {
                    parents.push(parent);
                }
            }
        }
    }
    parents
}
