//! # `taskledger`
//!
//! Repositories for date-bucketed tasks, flat projects, hierarchical
//! project trees and a daily kanban board, over a pluggable document store.
//!
//! Three independent contexts share the [`store::DocumentStore`] trait:
//! - [`planner`]: tasks grouped by date, projects, and the [`Planner`] that
//!   enforces cross-collection rules.
//! - [`tree`]: project → sub-project → task documents with assignee
//!   notifications.
//! - [`daily`]: kanban cards.
//!
//! Repositories borrow the store they were built with; nothing is global.

pub mod config;
pub mod daily;
pub mod error;
pub mod id;
pub mod paths;
pub mod planner;
pub mod settings;
pub mod store;
pub mod tree;

pub use config::{DeletePolicy, LedgerConfig};
pub use error::{EntityKind, Error, Result};
pub use planner::Planner;
pub use store::{Collection, DocumentStore, MemoryStore, SqliteStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
