//! Interactive administration shell for `permission-core`.
//!
//! Lines are parsed with `command-core` elements into a [`CommandContext`]
//! and run against one [`PermissionService`]:
//!
//! - [`grammar`]: command table and custom subject/context elements
//! - [`shell`]: line execution
//! - [`snapshot`]: JSON import and export of persistent subject data
//!
//! [`CommandContext`]: command_core::CommandContext
//! [`PermissionService`]: permission_core::PermissionService
pub mod config;
pub mod grammar;
pub mod shell;
pub mod snapshot;
pub mod source;

pub use config::ConsoleConfig;
pub use shell::{Reply, Shell};
pub use snapshot::ServiceSnapshot;
pub use source::ShellSource;
