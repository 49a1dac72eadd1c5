//! Subjects and the collections that hold them.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::{MemorySubjectData, SubjectReference};

/// Anything that holds permission data: a user, a group, the console.
///
/// Every subject owns two stores. Persistent data is what an administrator
/// configures; transient data is scratch state that is never exported and
/// takes precedence during resolution.
#[derive(Debug)]
pub struct Subject {
    reference: SubjectReference,
    persistent: MemorySubjectData,
    transient: MemorySubjectData,
}

impl Subject {
    pub fn new(reference: SubjectReference) -> Self {
        Self::with_data(reference, MemorySubjectData::new())
    }

    /// Creates a subject around previously loaded persistent data.
    pub fn with_data(reference: SubjectReference, persistent: MemorySubjectData) -> Self {
        Self {
            reference,
            persistent,
            transient: MemorySubjectData::new(),
        }
    }

    pub fn reference(&self) -> &SubjectReference {
        &self.reference
    }

    pub fn identifier(&self) -> &str {
        self.reference.identifier()
    }

    pub fn subject_data(&self) -> &MemorySubjectData {
        &self.persistent
    }

    pub fn transient_data(&self) -> &MemorySubjectData {
        &self.transient
    }

    /// Both stores in resolution order: transient first.
    pub fn data_stores(&self) -> [&MemorySubjectData; 2] {
        [&self.transient, &self.persistent]
    }
}

/// A named group of subjects (`user`, `group`, ...).
#[derive(Debug)]
pub struct SubjectCollection {
    identifier: String,
    subjects: DashMap<String, Arc<Subject>>,
}

impl SubjectCollection {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            subjects: DashMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Builds the reference for `identifier` inside this collection.
    pub fn reference_to(&self, identifier: &str) -> Result<SubjectReference> {
        SubjectReference::new(&self.identifier, identifier)
    }

    /// Returns the subject, creating an empty one on first use.
    pub fn load_subject(&self, identifier: &str) -> Result<Arc<Subject>> {
        if let Some(subject) = self.get_subject(identifier) {
            return Ok(subject);
        }
        let reference = self.reference_to(identifier)?;
        let subject = self
            .subjects
            .entry(identifier.to_string())
            .or_insert_with(|| {
                tracing::debug!(subject = %reference, "subject created");
                Arc::new(Subject::new(reference))
            });
        Ok(Arc::clone(subject.value()))
    }

    /// Installs a fully built subject, replacing any existing one.
    pub fn insert_subject(&self, subject: Subject) -> Arc<Subject> {
        let subject = Arc::new(subject);
        self.subjects
            .insert(subject.identifier().to_string(), Arc::clone(&subject));
        subject
    }

    pub fn get_subject(&self, identifier: &str) -> Option<Arc<Subject>> {
        self.subjects
            .get(identifier)
            .map(|subject| Arc::clone(subject.value()))
    }

    pub fn has_subject(&self, identifier: &str) -> bool {
        self.subjects.contains_key(identifier)
    }

    pub fn remove_subject(&self, identifier: &str) -> Option<Arc<Subject>> {
        self.subjects.remove(identifier).map(|(_, subject)| subject)
    }

    /// All loaded subjects, sorted by identifier.
    pub fn subjects(&self) -> Vec<Arc<Subject>> {
        let mut subjects: Vec<_> = self
            .subjects
            .iter()
            .map(|subject| Arc::clone(subject.value()))
            .collect();
        subjects.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_subject_is_idempotent() {
        let users = SubjectCollection::new("user");
        let first = users.load_subject("alice").unwrap();
        let second = users.load_subject("alice").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.reference().to_string(), "user:alice");
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let users = SubjectCollection::new("user");
        assert!(users.load_subject("").is_err());
        assert!(users.is_empty());
    }

    #[test]
    fn subjects_are_listed_in_order() {
        let groups = SubjectCollection::new("group");
        for name in ["mod", "admin", "builder"] {
            groups.load_subject(name).unwrap();
        }
        let names: Vec<_> = groups
            .subjects()
            .iter()
            .map(|s| s.identifier().to_string())
            .collect();
        assert_eq!(names, ["admin", "builder", "mod"]);
        assert!(groups.remove_subject("mod").is_some());
        assert!(!groups.has_subject("mod"));
    }
}
