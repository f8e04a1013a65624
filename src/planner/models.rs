//! Model types for the planner: projects and date-bucketed tasks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Can wait.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Urgency {
    /// Every urgency level, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Parse an urgency from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid urgency.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, InvalidUrgency> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(InvalidUrgency(s.to_string())),
        }
    }

    /// Get the string representation of the urgency.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when an invalid urgency string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUrgency(pub String);

impl std::fmt::Display for InvalidUrgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid urgency: '{}' (must be one of: low, medium, high)", self.0)
    }
}

impl std::error::Error for InvalidUrgency {}

/// Treat a stored empty string the same as a missing reference.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// A task filed under one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Globally unique identifier.
    pub id: String,
    /// Short description.
    pub label: String,
    /// Weak reference to a project. `None` once cleared.
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Urgency level.
    #[serde(default)]
    pub urgency: Urgency,
    /// Free-form comment.
    #[serde(default)]
    pub comment: String,
    /// The date bucket holding the task.
    pub date: NaiveDate,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the task last moved between dates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_at: Option<DateTime<Utc>>,
    /// The date it was moved from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_date: Option<NaiveDate>,
    /// When its project was deleted out from under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_removed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Whether the task references the given project.
    #[must_use]
    pub fn belongs_to(&self, project_id: &str) -> bool {
        self.project_id.as_deref() == Some(project_id)
    }
}

/// All tasks stored under one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBucket {
    /// The bucket key.
    pub date: NaiveDate,
    /// Tasks in insertion order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskBucket {
    /// Storage key of the bucket.
    #[must_use]
    pub fn key(&self) -> String {
        date_key(self.date)
    }

    /// Position of a task within the bucket.
    #[must_use]
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}

/// Storage key for a date (`YYYY-MM-DD`).
#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Short description (required).
    pub label: String,
    /// Optional project reference.
    pub project_id: Option<String>,
    /// Urgency level.
    pub urgency: Urgency,
    /// Free-form comment.
    pub comment: String,
}

impl NewTask {
    /// A task with just a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }
}

/// Fields that can be updated on a task.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    /// New label (if Some).
    pub label: Option<String>,
    /// New project reference (if Some). `Some(None)` clears it.
    pub project_id: Option<Option<String>>,
    /// New urgency (if Some).
    pub urgency: Option<Urgency>,
    /// New comment (if Some).
    pub comment: Option<String>,
}

impl TaskPatch {
    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.project_id.is_none()
            && self.urgency.is_none()
            && self.comment.is_none()
    }

    /// The patch that restores every editable field of `task`.
    #[must_use]
    pub fn restoring(task: &Task) -> Self {
        Self {
            label: Some(task.label.clone()),
            project_id: Some(task.project_id.clone()),
            urgency: Some(task.urgency),
            comment: Some(task.comment.clone()),
        }
    }

    /// Merge the patch over a task. Unset fields keep their value.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(label) = &self.label {
            task.label = label.trim().to_string();
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone().filter(|id| !id.is_empty());
        }
        if let Some(urgency) = self.urgency {
            task.urgency = urgency;
        }
        if let Some(comment) = &self.comment {
            task.comment.clone_from(comment);
        }
    }
}

/// Conjunctive task filter. Unset criteria match everything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Case-insensitive substring of the label.
    pub label: Option<String>,
    /// Exact project reference.
    pub project_id: Option<String>,
    /// Exact urgency.
    pub urgency: Option<Urgency>,
    /// Earliest date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub date_to: Option<NaiveDate>,
}

impl TaskQuery {
    /// Whether a task satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(label) = &self.label {
            if !task.label.to_lowercase().contains(&label.to_lowercase()) {
                return false;
            }
        }
        if let Some(project_id) = &self.project_id {
            if !task.belongs_to(project_id) {
                return false;
            }
        }
        if self.urgency.is_some_and(|u| u != task.urgency) {
            return false;
        }
        if self.date_from.is_some_and(|from| task.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| task.date > to) {
            return false;
        }
        true
    }
}

/// A project tasks can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier.
    pub id: String,
    /// Display name, unique ignoring case.
    pub label: String,
    /// Display color (`#RRGGBB`).
    pub color: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// False once archived.
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
    /// When the project was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the project was last archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    /// When the project was last reactivated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactivated_at: Option<DateTime<Utc>>,
}

const fn active_by_default() -> bool {
    true
}

impl Project {
    /// Whether the label equals `label` ignoring case and surrounding spaces.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.label.trim().to_lowercase() == label.trim().to_lowercase()
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    /// Display name (required, unique ignoring case).
    pub label: String,
    /// Display color. Defaults to the configured project color.
    pub color: Option<String>,
    /// Longer description.
    pub description: Option<String>,
}

impl NewProject {
    /// A project with just a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }

    /// Set the color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Fields that can be updated on a project.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectPatch {
    /// New label (if Some).
    pub label: Option<String>,
    /// New color (if Some).
    pub color: Option<String>,
    /// New description (if Some).
    pub description: Option<String>,
    /// New active flag (if Some).
    pub is_active: Option<bool>,
}

/// Result of deleting a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDeletion {
    /// The project as it was before deletion.
    pub deleted_project: Project,
    /// Number of tasks whose reference was cleared.
    pub tasks_affected: usize,
}
