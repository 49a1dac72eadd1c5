//! JSON snapshots of every subject's persistent data.
//!
//! Transient data is session scratch and never leaves the process.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use permission_core::{
    MemorySubjectData, PermissionService, Subject, SubjectDataSnapshot, SubjectReference,
};
use serde::{Deserialize, Serialize};

/// Persistent data of every non-empty subject, by collection and identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub collections: BTreeMap<String, BTreeMap<String, SubjectDataSnapshot>>,
}

impl ServiceSnapshot {
    pub fn subject_count(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }
}

/// Copies the persistent data of every loaded subject.
pub fn capture(service: &PermissionService) -> ServiceSnapshot {
    let mut snapshot = ServiceSnapshot::default();
    for name in service.collection_names() {
        let Some(collection) = service.get_collection(&name) else {
            continue;
        };
        for subject in collection.subjects() {
            if subject.subject_data().is_empty() {
                continue;
            }
            snapshot
                .collections
                .entry(name.clone())
                .or_default()
                .insert(
                    subject.identifier().to_string(),
                    subject.subject_data().snapshot(),
                );
        }
    }
    snapshot
}

/// Installs every subject in `snapshot`, replacing loaded subjects with the
/// same reference. Returns how many subjects were installed.
pub fn restore(service: &PermissionService, snapshot: ServiceSnapshot) -> Result<usize> {
    let mut installed = 0;
    for (name, subjects) in snapshot.collections {
        let collection = service.collection(&name);
        for (identifier, data) in subjects {
            let reference = SubjectReference::new(&name, identifier)
                .with_context(|| format!("Invalid subject in collection {name}"))?;
            let subject = Subject::with_data(reference, MemorySubjectData::from_snapshot(data));
            let subject: Arc<Subject> = collection.insert_subject(subject);
            tracing::trace!(subject = %subject.reference(), "restored subject");
            installed += 1;
        }
    }
    Ok(installed)
}

pub fn read(path: &Path) -> Result<ServiceSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
}

pub fn write(path: &Path, snapshot: &ServiceSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))
}
