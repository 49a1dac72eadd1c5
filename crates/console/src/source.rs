//! The caller commands are parsed for.

use std::sync::Arc;

use command_core::CommandSource;
use permission_core::{ContextSet, PermissionService, SubjectReference};

/// Either the console, which holds every permission, or a subject whose
/// permissions are resolved through the service.
pub struct ShellSource {
    name: String,
    subject: Option<SubjectReference>,
    service: Arc<PermissionService>,
}

impl ShellSource {
    pub fn new(subject: Option<SubjectReference>, service: Arc<PermissionService>) -> Self {
        let name = subject
            .as_ref()
            .map_or_else(|| "Console".to_string(), ToString::to_string);
        Self {
            name,
            subject,
            service,
        }
    }

    pub fn subject(&self) -> Option<&SubjectReference> {
        self.subject.as_ref()
    }
}

impl CommandSource for ShellSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        match &self.subject {
            Some(subject) => self
                .service
                .has_permission(subject, &ContextSet::global(), permission),
            None => true,
        }
    }
}
