//! Model types for the hierarchical project tree.
//!
//! Field names on the wire are the persisted French keys (`libelle`,
//! `sousProjets`, `taches`, ...); the Rust side uses English names.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Progress status shared by projects, sub-projects and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkStatus {
    /// Not started.
    #[default]
    #[serde(rename = "En attente")]
    Pending,
    /// Under way.
    #[serde(rename = "En cours")]
    InProgress,
    /// Finished.
    #[serde(rename = "Terminé")]
    Done,
    /// Stuck on something.
    #[serde(rename = "Bloqué")]
    Blocked,
}

impl WorkStatus {
    /// The persisted label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "En attente",
            Self::InProgress => "En cours",
            Self::Done => "Terminé",
            Self::Blocked => "Bloqué",
        }
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a tree task. Four levels, unlike planner tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TreeUrgency {
    /// `Faible`.
    #[serde(rename = "Faible")]
    Low,
    /// `Moyenne`.
    #[default]
    #[serde(rename = "Moyenne")]
    Medium,
    /// `Haute`.
    #[serde(rename = "Haute")]
    High,
    /// `Critique`.
    #[serde(rename = "Critique")]
    Critical,
}

/// Stored forms write an empty string for a missing date.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn optional_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// Descriptive fields common to every level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    /// Display name.
    #[serde(rename = "libelle")]
    pub label: String,
    /// Progress status.
    #[serde(rename = "statut", default)]
    pub status: WorkStatus,
    /// Planned start.
    #[serde(
        rename = "dateDebut",
        default,
        deserialize_with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    /// Planned end.
    #[serde(
        rename = "dateFin",
        default,
        deserialize_with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    /// Free-form comment.
    #[serde(rename = "commentaire", default)]
    pub comment: String,
}

impl Details {
    /// Details with just a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }
}

/// Shallow update of [`Details`]. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsPatch {
    /// New label (if Some).
    pub label: Option<String>,
    /// New status (if Some).
    pub status: Option<WorkStatus>,
    /// New start date (if Some). `Some(None)` clears it.
    pub start_date: Option<Option<NaiveDate>>,
    /// New end date (if Some). `Some(None)` clears it.
    pub end_date: Option<Option<NaiveDate>>,
    /// New comment (if Some).
    pub comment: Option<String>,
}

impl DetailsPatch {
    /// Merge the patch over `details`.
    pub fn apply_to(&self, details: &mut Details) {
        if let Some(label) = &self.label {
            details.label.clone_from(label);
        }
        if let Some(status) = self.status {
            details.status = status;
        }
        if let Some(start) = self.start_date {
            details.start_date = start;
        }
        if let Some(end) = self.end_date {
            details.end_date = end;
        }
        if let Some(comment) = &self.comment {
            details.comment.clone_from(comment);
        }
    }
}

/// A project document holding its whole sub-tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeProject {
    /// Unique identifier.
    pub id: String,
    /// Descriptive fields.
    #[serde(flatten)]
    pub details: Details,
    /// Owned sub-projects.
    #[serde(rename = "sousProjets", default)]
    pub sub_projects: Vec<SubProject>,
}

impl TreeProject {
    /// Mutable access to a sub-project.
    pub fn sub_project_mut(&mut self, id: &str) -> Option<&mut SubProject> {
        self.sub_projects.iter_mut().find(|sp| sp.id == id)
    }
}

/// A phase of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProject {
    /// Identifier, unique within the project.
    pub id: String,
    /// Descriptive fields.
    #[serde(flatten)]
    pub details: Details,
    /// Owned tasks.
    #[serde(rename = "taches", default)]
    pub tasks: Vec<TreeTask>,
}

impl SubProject {
    /// Mutable access to a task.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut TreeTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// A task inside a sub-project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeTask {
    /// Identifier.
    pub id: String,
    /// Descriptive fields.
    #[serde(flatten)]
    pub details: Details,
    /// Urgency level.
    #[serde(rename = "urgence", default)]
    pub urgency: TreeUrgency,
    /// Assigned intervenant ID.
    #[serde(
        rename = "intervenant",
        default,
        deserialize_with = "optional_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<String>,
}

/// Input for creating a tree task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTreeTask {
    /// Descriptive fields.
    pub details: Details,
    /// Urgency level.
    pub urgency: TreeUrgency,
    /// Intervenant to assign and notify.
    pub assignee: Option<String>,
}

/// Fields that can be updated on a tree task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeTaskPatch {
    /// Descriptive fields.
    pub details: DetailsPatch,
    /// New urgency (if Some).
    pub urgency: Option<TreeUrgency>,
    /// New assignee (if Some). `Some(None)` unassigns.
    pub assignee: Option<Option<String>>,
}

/// A person tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervenant {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Assignment log, oldest first. Never pruned.
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

/// One entry of an intervenant's assignment log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Identifier.
    pub id: String,
    /// When the assignment happened.
    pub date: DateTime<Utc>,
    /// Label of the assigned task.
    #[serde(rename = "tache")]
    pub task: String,
    /// Label of the task's project.
    #[serde(rename = "projet")]
    pub project: String,
    /// Label of the task's sub-project.
    #[serde(rename = "sousProjet")]
    pub sub_project: String,
}
