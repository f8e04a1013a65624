//! Kanban card repository.

use crate::daily::models::{DailyBoard, DailyStatus, DailyTask, DailyTaskPatch, NewDailyTask};
use crate::error::{EntityKind, Error, Result};
use crate::id::generate_id;
use crate::store::{Collection, DocumentStore, DocumentStoreExt};
use chrono::Utc;

/// Repository for kanban cards.
#[derive(Clone, Copy)]
pub struct DailyTaskRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> DailyTaskRepository<'a> {
    /// Create a repository over a store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every card, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn list_daily_tasks(&self) -> Result<Vec<DailyTask>> {
        self.store.ensure_available()?;
        let mut tasks: Vec<DailyTask> = self.store.get_all_as(Collection::DailyTasks)?;
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    /// Look a card up by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    pub fn get_daily_task(&self, id: &str) -> Result<DailyTask> {
        self.store.ensure_available()?;
        self.store.require_as(Collection::DailyTasks, EntityKind::DailyTask, id)
    }

    /// Cards in one column, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn list_by_status(&self, status: DailyStatus) -> Result<Vec<DailyTask>> {
        Ok(self.list_daily_tasks()?.into_iter().filter(|t| t.status == status).collect())
    }

    /// Every card, grouped by column.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn board(&self) -> Result<DailyBoard> {
        let board: DailyBoard = self.list_daily_tasks()?.into_iter().collect();
        tracing::debug!(
            pending = board.pending.len(),
            doing = board.doing.len(),
            done = board.done.len(),
            "loaded daily board"
        );
        Ok(board)
    }

    /// Create a pending card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty label.
    pub fn add_daily_task(&self, data: NewDailyTask) -> Result<DailyTask> {
        self.store.ensure_available()?;
        let label = data.label.trim();
        if label.is_empty() {
            return Err(Error::Validation("daily task label must not be empty".to_string()));
        }

        let now = Utc::now();
        let task = DailyTask {
            id: generate_id("daily"),
            label: label.to_string(),
            urgency: data.urgency,
            comment: data.comment,
            status: DailyStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store.put_as(Collection::DailyTasks, &task)?;
        tracing::info!(task_id = %task.id, label = %task.label, "daily task added");
        Ok(task)
    }

    /// Merge a patch over a card. Any status change is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the card does not exist, or
    /// [`Error::Validation`] if the label would become empty.
    pub fn update_daily_task(&self, id: &str, patch: &DailyTaskPatch) -> Result<DailyTask> {
        let mut task = self.get_daily_task(id)?;
        let previous = task.status;

        if let Some(label) = &patch.label {
            let label = label.trim();
            if label.is_empty() {
                return Err(Error::Validation("daily task label must not be empty".to_string()));
            }
            task.label = label.to_string();
        }
        if let Some(urgency) = patch.urgency {
            task.urgency = urgency;
        }
        if let Some(comment) = &patch.comment {
            task.comment.clone_from(comment);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = Utc::now();
        self.store.put_as(Collection::DailyTasks, &task)?;

        tracing::info!(task_id = %id, from = %previous, to = %task.status, "daily task updated");
        Ok(task)
    }

    /// Remove a card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the card does not exist.
    pub fn delete_daily_task(&self, id: &str) -> Result<DailyTask> {
        let task = self.get_daily_task(id)?;
        self.store.delete(Collection::DailyTasks, id)?;
        tracing::info!(task_id = %id, "daily task deleted");
        Ok(task)
    }
}
