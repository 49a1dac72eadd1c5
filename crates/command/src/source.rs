//! Whoever runs a command.

/// The caller a command is parsed for.
///
/// Elements only need a display name and a permission check, so anything
/// that can answer those (a console, a subject, a test stub) can parse.
pub trait CommandSource: Send + Sync {
    fn name(&self) -> &str;

    fn has_permission(&self, permission: &str) -> bool;
}

/// A source holding every permission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Console;

impl CommandSource for Console {
    fn name(&self) -> &str {
        "Console"
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}
