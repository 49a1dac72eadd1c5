//! Permission service configuration.
use std::env;

use crate::Tristate;

/// Tunables for [`PermissionService`](crate::PermissionService) resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Value returned when no subject, parent or default defines a node.
    pub default_permission: Tristate,
    /// Maximum depth followed through parent references.
    pub max_parent_depth: usize,
    /// Whether collection and service defaults take part in resolution.
    pub use_defaults: bool,
}

impl ServiceConfig {
    pub const DEFAULT_MAX_PARENT_DEPTH: usize = 16;

    pub const fn new() -> Self {
        Self {
            default_permission: Tristate::Undefined,
            max_parent_depth: Self::DEFAULT_MAX_PARENT_DEPTH,
            use_defaults: true,
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `PERM_DEFAULT_VALUE` - `true`, `false` or `undefined` (default: undefined)
    /// - `PERM_MAX_PARENT_DEPTH` - Parent traversal limit (default: 16)
    /// - `PERM_USE_DEFAULTS` - Consult default subjects (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Some(value) = read_env::<Tristate>("PERM_DEFAULT_VALUE") {
            config.default_permission = value;
        }
        if let Some(depth) = read_env::<usize>("PERM_MAX_PARENT_DEPTH") {
            config.max_parent_depth = depth.max(1);
        }
        if let Some(enabled) = read_env::<bool>("PERM_USE_DEFAULTS") {
            config.use_defaults = enabled;
        }

        config
    }

    #[must_use]
    pub const fn with_default_permission(mut self, value: Tristate) -> Self {
        self.default_permission = value;
        self
    }

    #[must_use]
    pub const fn with_max_parent_depth(mut self, depth: usize) -> Self {
        self.max_parent_depth = depth;
        self
    }

    #[must_use]
    pub const fn with_defaults(mut self, enabled: bool) -> Self {
        self.use_defaults = enabled;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
