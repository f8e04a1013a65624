//! Kanban card types.

use crate::planner::Urgency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column a card sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyStatus {
    /// Not started.
    #[default]
    Pending,
    /// In progress.
    Doing,
    /// Finished.
    Done,
}

impl DailyStatus {
    /// Every status, in board order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Doing, Self::Done];

    /// Parse a status from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid status.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, InvalidDailyStatus> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "doing" => Ok(Self::Doing),
            "done" => Ok(Self::Done),
            _ => Err(InvalidDailyStatus(s.to_string())),
        }
    }

    /// Get the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Doing => "doing",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for DailyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when an invalid status string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDailyStatus(pub String);

impl std::fmt::Display for InvalidDailyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid status: '{}' (must be one of: pending, doing, done)", self.0)
    }
}

impl std::error::Error for InvalidDailyStatus {}

/// A kanban card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    /// Unique identifier.
    pub id: String,
    /// Short description.
    pub label: String,
    /// Urgency level.
    #[serde(default)]
    pub urgency: Urgency,
    /// Free-form comment.
    #[serde(default)]
    pub comment: String,
    /// Current column.
    #[serde(default)]
    pub status: DailyStatus,
    /// When the card was created.
    pub created_at: DateTime<Utc>,
    /// When the card was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a card. Cards always start as pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDailyTask {
    /// Short description (required).
    pub label: String,
    /// Urgency level.
    pub urgency: Urgency,
    /// Free-form comment.
    pub comment: String,
}

impl NewDailyTask {
    /// A card with just a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Self::default() }
    }
}

/// Fields that can be updated on a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyTaskPatch {
    /// New label (if Some).
    pub label: Option<String>,
    /// New urgency (if Some).
    pub urgency: Option<Urgency>,
    /// New comment (if Some).
    pub comment: Option<String>,
    /// New status (if Some). Any transition is allowed.
    pub status: Option<DailyStatus>,
}

impl DailyTaskPatch {
    /// A patch that only moves the card to another column.
    #[must_use]
    pub fn status(status: DailyStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.urgency.is_none()
            && self.comment.is_none()
            && self.status.is_none()
    }
}

/// Cards grouped into the three columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyBoard {
    /// Pending cards.
    pub pending: Vec<DailyTask>,
    /// Cards in progress.
    pub doing: Vec<DailyTask>,
    /// Finished cards.
    pub done: Vec<DailyTask>,
}

impl DailyBoard {
    /// The cards of one column.
    #[must_use]
    pub fn column(&self, status: DailyStatus) -> &[DailyTask] {
        match status {
            DailyStatus::Pending => &self.pending,
            DailyStatus::Doing => &self.doing,
            DailyStatus::Done => &self.done,
        }
    }

    /// Total number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.doing.len() + self.done.len()
    }

    /// Whether the board has no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<DailyTask> for DailyBoard {
    fn from_iter<I: IntoIterator<Item = DailyTask>>(iter: I) -> Self {
        let mut board = Self::default();
        for task in iter {
            match task.status {
                DailyStatus::Pending => board.pending.push(task),
                DailyStatus::Doing => board.doing.push(task),
                DailyStatus::Done => board.done.push(task),
            }
        }
        board
    }
}
