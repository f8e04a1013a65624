//! Date-bucketed task repository.
//!
//! Tasks live in one record per calendar date. A bucket whose last task is
//! removed is deleted rather than stored empty. Task IDs are global, so
//! lookups by ID scan every bucket.

use crate::error::{EntityKind, Error, Result};
use crate::id::generate_id;
use crate::planner::models::{date_key, NewTask, Task, TaskBucket, TaskPatch, TaskQuery, Urgency};
use crate::settings::SettingsRepository;
use crate::store::{Collection, DocumentStore, DocumentStoreExt, WriteBatch};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;

/// Key used in [`TasksStats::by_project`] for tasks without a project.
pub const NO_PROJECT_KEY: &str = "sans-projet";

/// Task counts per urgency level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrgencyCounts {
    /// Tasks with low urgency.
    pub low: usize,
    /// Tasks with medium urgency.
    pub medium: usize,
    /// Tasks with high urgency.
    pub high: usize,
}

impl UrgencyCounts {
    /// Count one more task.
    pub fn record(&mut self, urgency: Urgency) {
        match urgency {
            Urgency::Low => self.low += 1,
            Urgency::Medium => self.medium += 1,
            Urgency::High => self.high += 1,
        }
    }

    /// Count for one level.
    #[must_use]
    pub const fn get(&self, urgency: Urgency) -> usize {
        match urgency {
            Urgency::Low => self.low,
            Urgency::Medium => self.medium,
            Urgency::High => self.high,
        }
    }

    /// Sum over all levels.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Aggregate statistics over every stored task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksStats {
    /// Number of tasks.
    pub total: usize,
    /// Counts per urgency.
    pub by_urgency: UrgencyCounts,
    /// Counts per project ID, with [`NO_PROJECT_KEY`] for unassigned tasks.
    pub by_project: BTreeMap<String, usize>,
    /// Number of dates holding at least one task.
    pub dates_with_tasks: usize,
    /// The task with the earliest `createdAt`.
    pub oldest_task: Option<Task>,
    /// The task with the latest `createdAt`.
    pub newest_task: Option<Task>,
}

/// Repository for tasks grouped by date.
#[derive(Clone, Copy)]
pub struct TaskRepository<'a> {
    store: &'a dyn DocumentStore,
    settings: SettingsRepository<'a>,
}

impl<'a> TaskRepository<'a> {
    /// Create a repository over a store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store, settings: SettingsRepository::new(store) }
    }

    pub(crate) fn buckets(&self) -> Result<Vec<TaskBucket>> {
        self.store.ensure_available()?;
        self.store.get_all_as(Collection::TaskBuckets)
    }

    fn bucket(&self, date: NaiveDate) -> Result<Option<TaskBucket>> {
        self.store.ensure_available()?;
        self.store.get_as(Collection::TaskBuckets, &date_key(date))
    }

    /// Find the bucket holding a task, and the task's position in it.
    fn locate(&self, task_id: &str) -> Result<(TaskBucket, usize)> {
        self.buckets()?
            .into_iter()
            .find_map(|bucket| bucket.position(task_id).map(|index| (bucket, index)))
            .ok_or_else(|| Error::not_found(EntityKind::Task, task_id))
    }

    /// Queue a bucket write: deleted when empty, stored otherwise.
    fn queue_bucket(batch: &mut WriteBatch, bucket: &TaskBucket) -> Result<()> {
        if bucket.tasks.is_empty() {
            batch.delete(Collection::TaskBuckets, bucket.key());
            Ok(())
        } else {
            batch.put_as(Collection::TaskBuckets, bucket)
        }
    }

    /// Reject a patch that would blank the label.
    fn check_patch(patch: &TaskPatch) -> Result<()> {
        if patch.label.as_deref().is_some_and(|label| label.trim().is_empty()) {
            return Err(Error::Validation("task label must not be empty".to_string()));
        }
        Ok(())
    }

    fn commit(&self, mut batch: WriteBatch) -> Result<()> {
        self.settings.stamp(&mut batch, Utc::now())?;
        self.store.apply(batch)
    }

    /// Every task, keyed by date. Dates without tasks are absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a bucket is corrupt.
    pub fn list_tasks_by_date(&self) -> Result<BTreeMap<NaiveDate, Vec<Task>>> {
        let map: BTreeMap<_, _> =
            self.buckets()?.into_iter().map(|bucket| (bucket.date, bucket.tasks)).collect();
        tracing::debug!(dates = map.len(), "listed tasks by date");
        Ok(map)
    }

    /// Tasks stored under one date, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the bucket is corrupt.
    pub fn list_tasks_for_date(&self, date: NaiveDate) -> Result<Vec<Task>> {
        Ok(self.bucket(date)?.map(|bucket| bucket.tasks).unwrap_or_default())
    }

    /// Every task, flattened in date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a bucket is corrupt.
    pub fn all_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.buckets()?.into_iter().flat_map(|bucket| bucket.tasks).collect())
    }

    /// Look a task up by ID across all dates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no bucket holds the task.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        let (mut bucket, index) = self.locate(id)?;
        Ok(bucket.tasks.swap_remove(index))
    }

    /// Append a new task to a date, creating the bucket if needed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty label, or a storage error.
    pub fn add_task(&self, date: NaiveDate, data: NewTask) -> Result<Task> {
        let label = data.label.trim();
        if label.is_empty() {
            return Err(Error::Validation("task label must not be empty".to_string()));
        }

        let now = Utc::now();
        let task = Task {
            id: generate_id("task"),
            label: label.to_string(),
            project_id: data.project_id.filter(|id| !id.is_empty()),
            urgency: data.urgency,
            comment: data.comment,
            date,
            created_at: now,
            updated_at: now,
            moved_at: None,
            previous_date: None,
            project_removed_at: None,
        };

        let mut bucket = self.bucket(date)?.unwrap_or(TaskBucket { date, tasks: Vec::new() });
        bucket.tasks.push(task.clone());

        let mut batch = WriteBatch::new();
        batch.put_as(Collection::TaskBuckets, &bucket)?;
        self.commit(batch)?;

        tracing::info!(task_id = %task.id, date = %date, label = %task.label, "task added");
        Ok(task)
    }

    /// Merge a patch over a task wherever it is stored.
    ///
    /// Only the bucket holding the task is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the patch blanks the label, or
    /// [`Error::NotFound`] if the task does not exist.
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        Self::check_patch(patch)?;
        let (mut bucket, index) = self.locate(id)?;
        let task = &mut bucket.tasks[index];
        patch.apply_to(task);
        task.updated_at = Utc::now();
        let updated = task.clone();

        let mut batch = WriteBatch::new();
        batch.put_as(Collection::TaskBuckets, &bucket)?;
        self.commit(batch)?;

        tracing::info!(task_id = %id, date = %bucket.date, "task updated");
        Ok(updated)
    }

    /// Remove a task, deleting its bucket if it becomes empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the task does not exist.
    pub fn delete_task(&self, id: &str) -> Result<Task> {
        let (mut bucket, index) = self.locate(id)?;
        let removed = bucket.tasks.remove(index);

        let mut batch = WriteBatch::new();
        Self::queue_bucket(&mut batch, &bucket)?;
        self.commit(batch)?;

        tracing::info!(
            task_id = %id,
            date = %bucket.date,
            bucket_removed = bucket.tasks.is_empty(),
            "task deleted"
        );
        Ok(removed)
    }

    /// Move a task from one date to another, applying a patch on the way.
    ///
    /// The task leaves `old_date`'s bucket (deleted if now empty) and is
    /// appended to `new_date`'s bucket with `movedAt` and `previousDate`
    /// stamped. Both bucket writes land in one batch. Moving to the same
    /// date is a plain update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the patch blanks the label, or
    /// [`Error::NotFound`] if `old_date` has no bucket or the bucket does
    /// not hold the task.
    pub fn change_task_date(
        &self,
        id: &str,
        old_date: NaiveDate,
        new_date: NaiveDate,
        patch: &TaskPatch,
    ) -> Result<Task> {
        Self::check_patch(patch)?;
        let mut old_bucket = self
            .bucket(old_date)?
            .ok_or_else(|| Error::not_found(EntityKind::DateBucket, date_key(old_date)))?;
        let index =
            old_bucket.position(id).ok_or_else(|| Error::not_found(EntityKind::Task, id))?;
        if old_date == new_date {
            return self.update_task(id, patch);
        }
        let mut task = old_bucket.tasks.remove(index);

        let now = Utc::now();
        patch.apply_to(&mut task);
        task.date = new_date;
        task.updated_at = now;
        task.moved_at = Some(now);
        task.previous_date = Some(old_date);

        let mut new_bucket =
            self.bucket(new_date)?.unwrap_or(TaskBucket { date: new_date, tasks: Vec::new() });
        new_bucket.tasks.push(task.clone());

        let mut batch = WriteBatch::new();
        Self::queue_bucket(&mut batch, &old_bucket)?;
        batch.put_as(Collection::TaskBuckets, &new_bucket)?;
        self.commit(batch)?;

        tracing::info!(task_id = %id, from = %old_date, to = %new_date, "task moved");
        Ok(task)
    }

    /// Tasks matching every criterion of the query, in date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a bucket is corrupt.
    pub fn search_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let tasks: Vec<Task> =
            self.all_tasks()?.into_iter().filter(|task| query.matches(task)).collect();
        tracing::debug!(matches = tasks.len(), "searched tasks");
        Ok(tasks)
    }

    /// Number of tasks referencing a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a bucket is corrupt.
    pub fn count_tasks_for_project(&self, project_id: &str) -> Result<usize> {
        Ok(self.all_tasks()?.iter().filter(|task| task.belongs_to(project_id)).count())
    }

    /// Aggregate statistics over every task.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a bucket is corrupt.
    pub fn tasks_stats(&self) -> Result<TasksStats> {
        let buckets = self.buckets()?;
        let mut stats =
            TasksStats { dates_with_tasks: buckets.len(), ..TasksStats::default() };

        for task in buckets.into_iter().flat_map(|bucket| bucket.tasks) {
            stats.total += 1;
            stats.by_urgency.record(task.urgency);
            let project_key = task.project_id.clone().unwrap_or_else(|| NO_PROJECT_KEY.to_string());
            *stats.by_project.entry(project_key).or_default() += 1;

            if stats.oldest_task.as_ref().map_or(true, |oldest| task.created_at < oldest.created_at) {
                stats.oldest_task = Some(task.clone());
            }
            if stats.newest_task.as_ref().map_or(true, |newest| task.created_at > newest.created_at) {
                stats.newest_task = Some(task);
            }
        }

        Ok(stats)
    }
}
