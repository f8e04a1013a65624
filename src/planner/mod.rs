//! Date-bucketed tasks and flat projects.
//!
//! [`TaskRepository`] and [`ProjectRepository`] each own one collection.
//! [`Planner`] sits on top and enforces the rules that span both: the
//! configured [`DeletePolicy`] for project deletion, and that a task is
//! never created or edited to point at a project that does not exist.

pub mod calendar;
pub mod models;
pub mod projects;
pub mod tasks;

pub use calendar::month_dates;
pub use models::{
    NewProject, NewTask, Project, ProjectDeletion, ProjectPatch, Task, TaskBucket, TaskPatch,
    TaskQuery, Urgency,
};
pub use projects::{ProjectRepository, ProjectUsage, ProjectsStats};
pub use tasks::{TaskRepository, TasksStats, UrgencyCounts, NO_PROJECT_KEY};

use crate::config::{DeletePolicy, LedgerConfig};
use crate::error::{EntityKind, Error, Result};
use crate::settings::{Settings, SettingsPatch, SettingsRepository, SETTINGS_KEY, SETTINGS_VERSION};
use crate::store::{Collection, DocumentStore, DocumentStoreExt};
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::BTreeSet;

/// Projects created on first run: label and color.
pub const DEFAULT_PROJECTS: [(&str, &str); 3] =
    [("Personal", "#10B981"), ("Work", "#3B82F6"), ("Urgent", "#EF4444")];

/// Summary of what the database holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of tasks.
    pub total_tasks: usize,
    /// Number of projects.
    pub total_projects: usize,
    /// Number of dates holding tasks.
    pub dates_with_tasks: usize,
    /// Last recorded change, if settings were ever written.
    pub last_update: Option<DateTime<Utc>>,
    /// Data version.
    pub version: String,
    /// Name of the storage backend.
    pub backend: &'static str,
}

/// Orchestrates the task and project repositories.
pub struct Planner<'a> {
    store: &'a dyn DocumentStore,
    projects: ProjectRepository<'a>,
    tasks: TaskRepository<'a>,
    settings: SettingsRepository<'a>,
    policy: DeletePolicy,
    seed: bool,
}

impl<'a> Planner<'a> {
    /// Create a planner over a store, configured from `config`.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, config: &LedgerConfig) -> Self {
        Self {
            store,
            projects: ProjectRepository::new(store, config.default_project_color.clone()),
            tasks: TaskRepository::new(store),
            settings: SettingsRepository::new(store),
            policy: config.delete_policy,
            seed: config.seed_defaults,
        }
    }

    /// The project repository.
    #[must_use]
    pub const fn projects(&self) -> &ProjectRepository<'a> {
        &self.projects
    }

    /// The task repository.
    #[must_use]
    pub const fn tasks(&self) -> &TaskRepository<'a> {
        &self.tasks
    }

    /// The settings repository.
    #[must_use]
    pub const fn settings(&self) -> &SettingsRepository<'a> {
        &self.settings
    }

    /// The active deletion policy.
    #[must_use]
    pub const fn delete_policy(&self) -> DeletePolicy {
        self.policy
    }

    /// Delete a project according to the configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectInUse`] under
    /// [`DeletePolicy::RefuseIfReferenced`] when tasks reference the project,
    /// or [`Error::NotFound`] if it does not exist.
    pub fn delete_project(&self, id: &str) -> Result<ProjectDeletion> {
        if self.policy == DeletePolicy::RefuseIfReferenced {
            self.projects.get_project(id)?;
            let tasks = self.tasks.count_tasks_for_project(id)?;
            if tasks > 0 {
                tracing::warn!(project_id = %id, tasks, "refusing to delete referenced project");
                return Err(Error::ProjectInUse { id: id.to_string(), tasks });
            }
        }
        self.projects.delete_project(id)
    }

    /// Add a task after checking its project reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `project_id` names a missing project,
    /// or any error of [`TaskRepository::add_task`].
    pub fn add_task(&self, date: NaiveDate, data: NewTask) -> Result<Task> {
        self.check_project_ref(data.project_id.as_deref())?;
        self.tasks.add_task(date, data)
    }

    /// Update a task after checking any new project reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the patch points at a missing project,
    /// or any error of [`TaskRepository::update_task`].
    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        self.check_patch_project(patch)?;
        self.tasks.update_task(id, patch)
    }

    /// Move a task after checking any new project reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the patch points at a missing project,
    /// or any error of [`TaskRepository::change_task_date`].
    pub fn change_task_date(
        &self,
        id: &str,
        old_date: NaiveDate,
        new_date: NaiveDate,
        patch: &TaskPatch,
    ) -> Result<Task> {
        self.check_patch_project(patch)?;
        self.tasks.change_task_date(id, old_date, new_date, patch)
    }

    fn check_project_ref(&self, project_id: Option<&str>) -> Result<()> {
        if let Some(project_id) = project_id.filter(|id| !id.is_empty()) {
            if !self.projects.exists(project_id)? {
                tracing::warn!(project_id = %project_id, "task references a missing project");
                return Err(Error::not_found(EntityKind::Project, project_id));
            }
        }
        Ok(())
    }

    fn check_patch_project(&self, patch: &TaskPatch) -> Result<()> {
        match &patch.project_id {
            Some(project_id) => self.check_project_ref(project_id.as_deref()),
            None => Ok(()),
        }
    }

    /// Dates to display for a month (see [`calendar::month_dates`]).
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid month, or a storage error.
    pub fn month_dates(&self, year: i32, month: u32) -> Result<Vec<NaiveDate>> {
        let with_tasks: BTreeSet<NaiveDate> =
            self.tasks.list_tasks_by_date()?.into_keys().collect();
        calendar::month_dates(year, month, &with_tasks)
    }

    /// The month's dates, each with its tasks.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid month, or a storage error.
    pub fn tasks_for_month(&self, year: i32, month: u32) -> Result<Vec<(NaiveDate, Vec<Task>)>> {
        let mut by_date = self.tasks.list_tasks_by_date()?;
        let with_tasks: BTreeSet<NaiveDate> = by_date.keys().copied().collect();
        let dates = calendar::month_dates(year, month, &with_tasks)?;
        Ok(dates
            .into_iter()
            .map(|date| (date, by_date.remove(&date).unwrap_or_default()))
            .collect())
    }

    /// Insert the default projects and sample tasks on first run.
    ///
    /// Returns whether anything was seeded. Does nothing when seeding is
    /// disabled or has already happened.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails.
    pub fn seed_defaults(&self, today: NaiveDate) -> Result<bool> {
        if !self.seed || !self.settings.get()?.is_first_run {
            return Ok(false);
        }

        let existing = self.projects.list_projects()?;
        let mut ids = Vec::with_capacity(DEFAULT_PROJECTS.len());
        for (label, color) in DEFAULT_PROJECTS {
            let id = match existing.iter().find(|p| p.has_label(label)) {
                Some(project) => project.id.clone(),
                None => self.projects.add_project(NewProject::new(label).with_color(color))?.id,
            };
            ids.push(id);
        }
        let (personal, work) = (&ids[0], &ids[1]);

        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let samples = [
            (today, "Groceries", personal, Urgency::Medium, "Bread and milk"),
            (today, "Team meeting", work, Urgency::High, "Present the new project"),
            (tomorrow, "Doctor", personal, Urgency::Medium, "Appointment at 2pm"),
        ];
        for (date, label, project_id, urgency, comment) in samples {
            self.tasks.add_task(
                date,
                NewTask {
                    label: label.to_string(),
                    project_id: Some(project_id.clone()),
                    urgency,
                    comment: comment.to_string(),
                },
            )?;
        }

        self.settings.update(&SettingsPatch { is_first_run: Some(false), ..Default::default() })?;
        tracing::info!(%today, projects = ids.len(), tasks = samples.len(), "seeded default data");
        Ok(true)
    }

    /// Summary counts over the whole database.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn database_stats(&self) -> Result<DatabaseStats> {
        let by_date = self.tasks.list_tasks_by_date()?;
        let total_projects = self.projects.list_projects()?.len();
        let stored: Option<Settings> = self.store.get_as(Collection::Settings, SETTINGS_KEY)?;

        Ok(DatabaseStats {
            total_tasks: by_date.values().map(Vec::len).sum(),
            total_projects,
            dates_with_tasks: by_date.len(),
            last_update: stored.as_ref().map(|s| s.last_update),
            version: stored.map_or_else(|| SETTINGS_VERSION.to_string(), |s| s.version),
            backend: self.store.backend_name(),
        })
    }

    /// Remove every task, project and the settings record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a delete fails.
    pub fn clear_all(&self) -> Result<()> {
        self.store.ensure_available()?;
        for collection in [Collection::TaskBuckets, Collection::Projects, Collection::Settings] {
            self.store.clear(collection)?;
        }
        tracing::info!(backend = self.store.backend_name(), "planner data cleared");
        Ok(())
    }
}
