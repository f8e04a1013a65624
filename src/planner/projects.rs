//! Flat project repository.
//!
//! Labels are unique ignoring case. Deleting a project clears the reference
//! on every task that pointed at it; whether a deletion may happen at all is
//! decided one level up, in [`crate::planner::Planner`].

use crate::error::{EntityKind, Error, Result};
use crate::id::generate_id;
use crate::planner::models::{NewProject, Project, ProjectDeletion, ProjectPatch, Task};
use crate::planner::tasks::{TaskRepository, UrgencyCounts};
use crate::settings::SettingsRepository;
use crate::store::{Collection, DocumentStore, DocumentStoreExt, WriteBatch};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;

/// Label of the synthetic usage entry for tasks without a project.
pub const NO_PROJECT_LABEL: &str = "No project";

/// Color of the synthetic usage entry.
pub const NO_PROJECT_COLOR: &str = "#9CA3AF";

/// Task usage of one project, or of the synthetic "no project" entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUsage {
    /// Project ID, `None` for tasks without a project.
    pub project_id: Option<String>,
    /// Project label.
    pub label: String,
    /// Project color.
    pub color: String,
    /// Number of tasks.
    pub total_tasks: usize,
    /// Task counts per urgency.
    pub by_urgency: UrgencyCounts,
    /// Task counts per date.
    pub by_date: BTreeMap<NaiveDate, usize>,
    /// Earliest date with a task.
    pub first_date: Option<NaiveDate>,
    /// Latest date with a task.
    pub last_date: Option<NaiveDate>,
}

impl ProjectUsage {
    fn empty(project_id: Option<String>, label: &str, color: &str) -> Self {
        Self {
            project_id,
            label: label.to_string(),
            color: color.to_string(),
            total_tasks: 0,
            by_urgency: UrgencyCounts::default(),
            by_date: BTreeMap::new(),
            first_date: None,
            last_date: None,
        }
    }

    fn record(&mut self, task: &Task) {
        self.total_tasks += 1;
        self.by_urgency.record(task.urgency);
        *self.by_date.entry(task.date).or_default() += 1;
        self.first_date = Some(self.first_date.map_or(task.date, |d| d.min(task.date)));
        self.last_date = Some(self.last_date.map_or(task.date, |d| d.max(task.date)));
    }
}

/// Usage statistics across all projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectsStats {
    /// Number of projects.
    pub total_projects: usize,
    /// Number of active projects.
    pub active_projects: usize,
    /// Number of archived projects.
    pub archived_projects: usize,
    /// Number of tasks, including ones with a dangling reference.
    pub total_tasks: usize,
    /// One entry per project in list order, then the "no project" entry.
    pub usage: Vec<ProjectUsage>,
    /// The entry with the most tasks. `None` when no entry has any.
    pub most_used: Option<ProjectUsage>,
    /// The real project with the fewest tasks. `None` without projects.
    pub least_used: Option<ProjectUsage>,
}

/// Repository for flat projects.
#[derive(Clone)]
pub struct ProjectRepository<'a> {
    store: &'a dyn DocumentStore,
    tasks: TaskRepository<'a>,
    settings: SettingsRepository<'a>,
    default_color: String,
}

impl<'a> ProjectRepository<'a> {
    /// Create a repository over a store.
    ///
    /// `default_color` is given to projects created without one.
    pub fn new(store: &'a dyn DocumentStore, default_color: impl Into<String>) -> Self {
        Self {
            store,
            tasks: TaskRepository::new(store),
            settings: SettingsRepository::new(store),
            default_color: default_color.into(),
        }
    }

    fn commit(&self, mut batch: WriteBatch) -> Result<()> {
        self.settings.stamp(&mut batch, Utc::now())?;
        self.store.apply(batch)
    }

    fn save(&self, project: &Project) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put_as(Collection::Projects, project)?;
        self.commit(batch)
    }

    fn check_label(projects: &[Project], label: &str, except_id: Option<&str>) -> Result<()> {
        if label.is_empty() {
            return Err(Error::Validation("project label must not be empty".to_string()));
        }
        let taken = projects
            .iter()
            .any(|p| Some(p.id.as_str()) != except_id && p.has_label(label));
        if taken {
            return Err(Error::DuplicateLabel(label.to_string()));
        }
        Ok(())
    }

    /// Every project, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.store.ensure_available()?;
        let mut projects: Vec<Project> = self.store.get_all_as(Collection::Projects)?;
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tracing::debug!(count = projects.len(), "listed projects");
        Ok(projects)
    }

    /// Look a project up by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        self.store.ensure_available()?;
        self.store.require_as(Collection::Projects, EntityKind::Project, id)
    }

    /// Whether a project with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    pub fn exists(&self, id: &str) -> Result<bool> {
        self.store.ensure_available()?;
        Ok(self.store.get(Collection::Projects, id)?.is_some())
    }

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty label and
    /// [`Error::DuplicateLabel`] if the label is taken ignoring case.
    pub fn add_project(&self, data: NewProject) -> Result<Project> {
        let projects = self.list_projects()?;
        let label = data.label.trim();
        Self::check_label(&projects, label, None)?;

        let now = Utc::now();
        let project = Project {
            id: generate_id("project"),
            label: label.to_string(),
            color: data.color.unwrap_or_else(|| self.default_color.clone()),
            description: data.description.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
            archived_at: None,
            reactivated_at: None,
        };
        self.save(&project)?;

        tracing::info!(project_id = %project.id, label = %project.label, "project added");
        Ok(project)
    }

    /// Merge a patch over a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist, or
    /// [`Error::DuplicateLabel`] if a new label collides with another project.
    pub fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project> {
        let projects = self.list_projects()?;
        let mut project = projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Project, id))?;

        if let Some(label) = &patch.label {
            let label = label.trim();
            Self::check_label(&projects, label, Some(id))?;
            project.label = label.to_string();
        }
        if let Some(color) = &patch.color {
            project.color.clone_from(color);
        }
        if let Some(description) = &patch.description {
            project.description.clone_from(description);
        }
        if let Some(is_active) = patch.is_active {
            project.is_active = is_active;
        }
        project.updated_at = Utc::now();
        self.save(&project)?;

        tracing::info!(project_id = %id, label = %project.label, "project updated");
        Ok(project)
    }

    /// Delete a project and clear every task reference to it.
    ///
    /// Each affected task gets `projectId` cleared with `updatedAt` and
    /// `projectRemovedAt` stamped. The bucket rewrites and the project
    /// deletion are applied as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist.
    pub fn delete_project(&self, id: &str) -> Result<ProjectDeletion> {
        let project = self.get_project(id)?;
        let now = Utc::now();

        let mut batch = WriteBatch::new();
        let mut tasks_affected = 0;
        for mut bucket in self.tasks.buckets()? {
            let mut touched = false;
            for task in bucket.tasks.iter_mut().filter(|t| t.belongs_to(id)) {
                task.project_id = None;
                task.updated_at = now;
                task.project_removed_at = Some(now);
                tasks_affected += 1;
                touched = true;
            }
            if touched {
                batch.put_as(Collection::TaskBuckets, &bucket)?;
            }
        }
        batch.delete(Collection::Projects, id);
        self.commit(batch)?;

        tracing::info!(project_id = %id, tasks_affected, "project deleted");
        Ok(ProjectDeletion { deleted_project: project, tasks_affected })
    }

    /// Archive an active project or reactivate an archived one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist.
    pub fn toggle_project_status(&self, id: &str) -> Result<Project> {
        let mut project = self.get_project(id)?;
        let now = Utc::now();
        project.is_active = !project.is_active;
        if project.is_active {
            project.reactivated_at = Some(now);
        } else {
            project.archived_at = Some(now);
        }
        project.updated_at = now;
        self.save(&project)?;

        tracing::info!(project_id = %id, is_active = project.is_active, "project status toggled");
        Ok(project)
    }

    /// Copy a project under a new label.
    ///
    /// Without `new_label` the copy is named `"<label> (copy)"`. The copy goes
    /// through [`Self::add_project`], so label uniqueness applies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the source does not exist, or
    /// [`Error::DuplicateLabel`] if the new label is taken.
    pub fn duplicate_project(&self, id: &str, new_label: Option<&str>) -> Result<Project> {
        let source = self.get_project(id)?;
        let label = new_label.map_or_else(|| format!("{} (copy)", source.label), str::to_string);
        let copy = self.add_project(NewProject {
            label,
            color: Some(source.color),
            description: Some(source.description),
        })?;
        tracing::debug!(source = %id, copy = %copy.id, "project duplicated");
        Ok(copy)
    }

    /// Projects whose label or description contains `query`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn search_projects(&self, query: &str) -> Result<Vec<Project>> {
        let needle = query.to_lowercase();
        Ok(self
            .list_projects()?
            .into_iter()
            .filter(|p| {
                p.label.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Task usage per project.
    ///
    /// Tasks referencing a project that no longer exists count towards
    /// `total_tasks` only.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn projects_stats(&self) -> Result<ProjectsStats> {
        let projects = self.list_projects()?;
        let tasks = self.tasks.all_tasks()?;

        let mut usage: Vec<ProjectUsage> = projects
            .iter()
            .map(|p| ProjectUsage::empty(Some(p.id.clone()), &p.label, &p.color))
            .collect();
        let mut unassigned = ProjectUsage::empty(None, NO_PROJECT_LABEL, NO_PROJECT_COLOR);

        for task in &tasks {
            match &task.project_id {
                None => unassigned.record(task),
                Some(project_id) => {
                    match usage.iter_mut().find(|u| u.project_id.as_ref() == Some(project_id)) {
                        Some(entry) => entry.record(task),
                        None => {
                            tracing::warn!(
                                task_id = %task.id,
                                project_id = %project_id,
                                "task references a missing project"
                            );
                        }
                    }
                }
            }
        }

        let least_used = usage.iter().min_by_key(|u| u.total_tasks).cloned();
        usage.push(unassigned);

        // First entry wins ties.
        let most_used = usage
            .iter()
            .filter(|u| u.total_tasks > 0)
            .fold(None::<&ProjectUsage>, |best, u| match best {
                Some(b) if b.total_tasks >= u.total_tasks => Some(b),
                _ => Some(u),
            })
            .cloned();

        let active_projects = projects.iter().filter(|p| p.is_active).count();
        Ok(ProjectsStats {
            total_projects: projects.len(),
            active_projects,
            archived_projects: projects.len() - active_projects,
            total_tasks: tasks.len(),
            usage,
            most_used,
            least_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PROJECT_COLOR;
    use crate::planner::models::{NewTask, Urgency};
    use crate::store::{MemoryStore, SqliteStore};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn repo(store: &MemoryStore) -> ProjectRepository<'_> {
        ProjectRepository::new(store, DEFAULT_PROJECT_COLOR)
    }

    fn task_in(project: Option<&Project>, label: &str, urgency: Urgency) -> NewTask {
        NewTask {
            label: label.to_string(),
            project_id: project.map(|p| p.id.clone()),
            urgency,
            comment: String::new(),
        }
    }

    #[test]
    fn test_add_project() {
        let store = MemoryStore::new();
        let projects = repo(&store);

        let work = projects.add_project(NewProject::new("  Work ")).unwrap();
        assert!(work.id.starts_with("project_"));
        assert_eq!(work.label, "Work");
        assert_eq!(work.color, DEFAULT_PROJECT_COLOR);
        assert!(work.is_active);
        assert_eq!(projects.get_project(&work.id).unwrap(), work);
        assert!(projects.exists(&work.id).unwrap());
    }

    #[test]
    fn test_add_rejects_duplicate_label_ignoring_case() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        projects.add_project(NewProject::new("Work")).unwrap();

        for label in ["work", "WORK", " Work "] {
            let result = projects.add_project(NewProject::new(label));
            assert!(matches!(result, Err(Error::DuplicateLabel(_))), "{label}");
        }
        assert_eq!(projects.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_add_rejects_empty_label() {
        let store = MemoryStore::new();
        let result = repo(&store).add_project(NewProject::new("  "));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_list_projects_returns_every_project() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let a = projects.add_project(NewProject::new("A")).unwrap();
        let b = projects.add_project(NewProject::new("B")).unwrap();
        let c = projects.add_project(NewProject::new("C")).unwrap();

        let ids: Vec<_> = projects.list_projects().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 3);
        for id in [&a.id, &b.id, &c.id] {
            assert!(ids.contains(id));
        }
    }

    #[test]
    fn test_update_project() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let work = projects.add_project(NewProject::new("Work")).unwrap();

        let patch = ProjectPatch {
            color: Some("#000000".into()),
            description: Some("Day job".into()),
            ..Default::default()
        };
        let updated = projects.update_project(&work.id, &patch).unwrap();
        assert_eq!(updated.label, "Work");
        assert_eq!(updated.color, "#000000");
        assert_eq!(updated.description, "Day job");
        assert_eq!(updated.created_at, work.created_at);
        assert!(updated.updated_at >= work.updated_at);
    }

    #[test]
    fn test_update_allows_own_label_and_rejects_others() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let work = projects.add_project(NewProject::new("Work")).unwrap();
        projects.add_project(NewProject::new("Home")).unwrap();

        let same = ProjectPatch { label: Some("WORK".into()), ..Default::default() };
        assert_eq!(projects.update_project(&work.id, &same).unwrap().label, "WORK");

        let clash = ProjectPatch { label: Some("home".into()), ..Default::default() };
        assert!(matches!(
            projects.update_project(&work.id, &clash),
            Err(Error::DuplicateLabel(_))
        ));
    }

    #[test]
    fn test_update_missing_project() {
        let store = MemoryStore::new();
        let result = repo(&store).update_project("project_x", &ProjectPatch::default());
        assert!(result.unwrap_err().is_not_found(EntityKind::Project));
    }

    #[test]
    fn test_delete_clears_task_references() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let tasks = TaskRepository::new(&store);
        let work = projects.add_project(NewProject::new("Work")).unwrap();
        let home = projects.add_project(NewProject::new("Home")).unwrap();

        let t1 = tasks.add_task(day(3), task_in(Some(&work), "a", Urgency::Low)).unwrap();
        let t2 = tasks.add_task(day(4), task_in(Some(&work), "b", Urgency::Low)).unwrap();
        let other = tasks.add_task(day(4), task_in(Some(&home), "c", Urgency::Low)).unwrap();

        let deletion = projects.delete_project(&work.id).unwrap();
        assert_eq!(deletion.tasks_affected, 2);
        assert_eq!(deletion.deleted_project, work);
        assert!(projects.get_project(&work.id).unwrap_err().is_not_found(EntityKind::Project));

        for id in [&t1.id, &t2.id] {
            let task = tasks.get_task(id).unwrap();
            assert!(task.project_id.is_none());
            assert!(task.project_removed_at.is_some());
        }
        assert_eq!(tasks.get_task(&other.id).unwrap(), other);
    }

    #[test]
    fn test_delete_missing_project() {
        let store = MemoryStore::new();
        let result = repo(&store).delete_project("project_x");
        assert!(result.unwrap_err().is_not_found(EntityKind::Project));
    }

    #[test]
    fn test_toggle_project_status() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let work = projects.add_project(NewProject::new("Work")).unwrap();

        let archived = projects.toggle_project_status(&work.id).unwrap();
        assert!(!archived.is_active);
        assert!(archived.archived_at.is_some());
        assert!(archived.reactivated_at.is_none());

        let reactivated = projects.toggle_project_status(&work.id).unwrap();
        assert!(reactivated.is_active);
        assert!(reactivated.reactivated_at.is_some());
        assert_eq!(reactivated.archived_at, archived.archived_at);
    }

    #[test]
    fn test_duplicate_project() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let work = projects
            .add_project(NewProject {
                label: "Work".into(),
                color: Some("#EF4444".into()),
                description: Some("Day job".into()),
            })
            .unwrap();

        let copy = projects.duplicate_project(&work.id, None).unwrap();
        assert_ne!(copy.id, work.id);
        assert_eq!(copy.label, "Work (copy)");
        assert_eq!(copy.color, "#EF4444");
        assert_eq!(copy.description, "Day job");

        assert!(matches!(
            projects.duplicate_project(&work.id, None),
            Err(Error::DuplicateLabel(_))
        ));
        let named = projects.duplicate_project(&work.id, Some("Side job")).unwrap();
        assert_eq!(named.label, "Side job");
    }

    #[test]
    fn test_search_projects() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        projects
            .add_project(NewProject {
                label: "Work".into(),
                description: Some("Office things".into()),
                ..Default::default()
            })
            .unwrap();
        projects.add_project(NewProject::new("Garden")).unwrap();

        assert_eq!(projects.search_projects("OFFICE").unwrap().len(), 1);
        assert_eq!(projects.search_projects("gar").unwrap()[0].label, "Garden");
        assert!(projects.search_projects("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_projects_stats() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let tasks = TaskRepository::new(&store);
        let work = projects.add_project(NewProject::new("Work")).unwrap();
        let idle = projects.add_project(NewProject::new("Idle")).unwrap();
        projects.toggle_project_status(&idle.id).unwrap();

        tasks.add_task(day(3), task_in(Some(&work), "a", Urgency::High)).unwrap();
        tasks.add_task(day(7), task_in(Some(&work), "b", Urgency::Low)).unwrap();
        tasks.add_task(day(7), task_in(None, "c", Urgency::Medium)).unwrap();
        let mut dangling = task_in(None, "d", Urgency::Low);
        dangling.project_id = Some("project_gone".into());
        tasks.add_task(day(8), dangling).unwrap();

        let stats = projects.projects_stats().unwrap();
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.archived_projects, 1);
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.usage.len(), 3);

        let work_usage = &stats.usage[0];
        assert_eq!(work_usage.project_id.as_deref(), Some(work.id.as_str()));
        assert_eq!(work_usage.total_tasks, 2);
        assert_eq!(work_usage.by_urgency, UrgencyCounts { low: 1, medium: 0, high: 1 });
        assert_eq!(work_usage.first_date, Some(day(3)));
        assert_eq!(work_usage.last_date, Some(day(7)));
        assert_eq!(work_usage.by_date[&day(7)], 1);

        let unassigned = stats.usage.last().unwrap();
        assert!(unassigned.project_id.is_none());
        assert_eq!(unassigned.label, NO_PROJECT_LABEL);
        assert_eq!(unassigned.total_tasks, 1);

        assert_eq!(stats.most_used.unwrap().label, "Work");
        assert_eq!(stats.least_used.unwrap().label, "Idle");
    }

    #[test]
    fn test_projects_stats_least_used_skips_unassigned() {
        let store = MemoryStore::new();
        let projects = repo(&store);
        let tasks = TaskRepository::new(&store);
        let work = projects.add_project(NewProject::new("Work")).unwrap();
        tasks.add_task(day(3), task_in(Some(&work), "a", Urgency::High)).unwrap();

        let stats = projects.projects_stats().unwrap();
        assert_eq!(stats.least_used.unwrap().label, "Work");
    }

    #[test]
    fn test_projects_stats_empty() {
        let store = MemoryStore::new();
        let stats = repo(&store).projects_stats().unwrap();
        assert_eq!(stats.total_projects, 0);
        assert_eq!(stats.usage.len(), 1);
        assert!(stats.most_used.is_none());
        assert!(stats.least_used.is_none());
    }

    #[test]
    fn test_sqlite_cascade_is_one_batch() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("ledger.db")).unwrap();
        let projects = ProjectRepository::new(&store, DEFAULT_PROJECT_COLOR);
        let tasks = TaskRepository::new(&store);

        let work = projects.add_project(NewProject::new("Work")).unwrap();
        let t = tasks.add_task(day(3), task_in(Some(&work), "a", Urgency::Low)).unwrap();

        assert_eq!(projects.delete_project(&work.id).unwrap().tasks_affected, 1);
        assert!(tasks.get_task(&t.id).unwrap().project_id.is_none());
        assert!(projects.list_projects().unwrap().is_empty());
    }
}
