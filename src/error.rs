//! Error types for `taskledger`.

use std::fmt;

/// The kind of entity an operation failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A flat project from the project repository.
    Project,
    /// A task stored in a date bucket.
    Task,
    /// A whole date bucket.
    DateBucket,
    /// A project document of the hierarchical tree.
    TreeProject,
    /// A sub-project nested in a tree project.
    SubProject,
    /// A task nested in a sub-project.
    TreeTask,
    /// An assignee.
    Intervenant,
    /// A kanban card.
    DailyTask,
}

impl EntityKind {
    /// Human-readable name of the entity kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::DateBucket => "date bucket",
            Self::TreeProject => "tree project",
            Self::SubProject => "sub-project",
            Self::TreeTask => "tree task",
            Self::Intervenant => "intervenant",
            Self::DailyTask => "daily task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the repositories and their storage backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The targeted ID is absent from the relevant collection.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was being looked up.
        kind: EntityKind,
        /// The missing identifier.
        id: String,
    },

    /// A project with the same label (ignoring case) already exists.
    #[error("a project named \"{0}\" already exists")]
    DuplicateLabel(String),

    /// A required field is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The persistence backend is not initialized or cannot be reached.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Project deletion was refused because tasks still reference it.
    #[error("project {id} is still referenced by {tasks} task(s)")]
    ProjectInUse {
        /// The project that was to be deleted.
        id: String,
        /// Number of tasks referencing it.
        tasks: usize,
    },

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A JSON encoding or decoding error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Whether this is a [`Error::NotFound`] for the given kind.
    #[must_use]
    pub fn is_not_found(&self, expected: EntityKind) -> bool {
        matches!(self, Self::NotFound { kind, .. } if *kind == expected)
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
