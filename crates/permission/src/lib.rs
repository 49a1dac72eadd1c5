//! Context-scoped permission data for game-server subjects.
//!
//! `permission-core` models what a permissions backend stores and how a
//! permission check is answered:
//!
//! - [`NodeTree`]: persistent tree of [`Tristate`] values over dotted nodes
//! - [`SubjectData`] / [`MemorySubjectData`]: permissions, parents and
//!   options per [`ContextSet`], updated with lock-free compare-and-swap
//! - [`PermissionService`]: subject collections plus resolution through
//!   contexts, parents and default subjects
pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod node_tree;
pub mod service;
pub mod subject;
pub mod subject_data;
pub mod tristate;

pub use config::ServiceConfig;
pub use context::{Context, ContextSet, SubjectReference};
pub use error::{PermissionError, Result};
pub use memory::{MemorySubjectData, SubjectDataSnapshot};
pub use node_tree::NodeTree;
pub use service::PermissionService;
pub use subject::{Subject, SubjectCollection};
pub use subject_data::SubjectData;
pub use tristate::Tristate;
