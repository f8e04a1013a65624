//! Project tree repository.
//!
//! Each project is one document embedding its sub-projects and their
//! tasks. Every nested mutation loads the document, rewrites it and saves
//! it whole. If the save fails the caller must discard its copy: nothing
//! is rolled back.

use crate::error::{EntityKind, Error, Result};
use crate::id::generate_id;
use crate::store::{Collection, DocumentStore, DocumentStoreExt};
use crate::tree::intervenants::{Assignment, IntervenantRepository};
use crate::tree::models::{
    Details, DetailsPatch, NewTreeTask, SubProject, TreeProject, TreeTask, TreeTaskPatch,
};

/// Trim the label in place, rejecting it when nothing is left.
fn require_label(details: &mut Details, what: &str) -> Result<()> {
    let trimmed = details.label.trim();
    if trimmed.len() != details.label.len() {
        details.label = trimmed.to_string();
    }
    if details.label.is_empty() {
        return Err(Error::Validation(format!("{what} label must not be empty")));
    }
    Ok(())
}

fn find_sub_project<'p>(project: &'p mut TreeProject, id: &str) -> Result<&'p mut SubProject> {
    project.sub_project_mut(id).ok_or_else(|| Error::not_found(EntityKind::SubProject, id))
}

fn find_task<'s>(sub: &'s mut SubProject, id: &str) -> Result<&'s mut TreeTask> {
    sub.task_mut(id).ok_or_else(|| Error::not_found(EntityKind::TreeTask, id))
}

/// Repository for project trees.
#[derive(Clone, Copy)]
pub struct ProjectTreeRepository<'a> {
    store: &'a dyn DocumentStore,
    intervenants: IntervenantRepository<'a>,
}

impl<'a> ProjectTreeRepository<'a> {
    /// Create a repository over a store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store, intervenants: IntervenantRepository::new(store) }
    }

    /// Load a project, let `f` rewrite it, and save it back.
    ///
    /// Nothing is written when `f` fails.
    fn modify<T>(
        &self,
        project_id: &str,
        f: impl FnOnce(&mut TreeProject) -> Result<T>,
    ) -> Result<T> {
        let mut project = self.get_project(project_id)?;
        let out = f(&mut project)?;
        self.store.put_as(Collection::ProjectTrees, &project)?;
        Ok(out)
    }

    fn check_assignee(&self, assignee: Option<&str>) -> Result<()> {
        if let Some(id) = assignee {
            self.intervenants.get_intervenant(id)?;
        }
        Ok(())
    }

    /// Every project tree, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a document is corrupt.
    pub fn list_projects(&self) -> Result<Vec<TreeProject>> {
        self.store.ensure_available()?;
        let projects: Vec<TreeProject> = self.store.get_all_as(Collection::ProjectTrees)?;
        tracing::debug!(count = projects.len(), "listed project trees");
        Ok(projects)
    }

    /// Load one project tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    pub fn get_project(&self, id: &str) -> Result<TreeProject> {
        self.store.ensure_available()?;
        self.store.require_as(Collection::ProjectTrees, EntityKind::TreeProject, id)
    }

    /// Create a project with no sub-projects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty label.
    pub fn add_project(&self, mut details: Details) -> Result<TreeProject> {
        self.store.ensure_available()?;
        require_label(&mut details, "project")?;
        let project =
            TreeProject { id: generate_id("tree"), details, sub_projects: Vec::new() };
        self.store.put_as(Collection::ProjectTrees, &project)?;
        tracing::info!(project_id = %project.id, label = %project.details.label, "tree project added");
        Ok(project)
    }

    /// Shallow-merge a patch over a project's own fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist.
    pub fn update_project(&self, id: &str, patch: &DetailsPatch) -> Result<TreeProject> {
        let updated = self.modify(id, |project| {
            patch.apply_to(&mut project.details);
            require_label(&mut project.details, "project")?;
            Ok(project.clone())
        })?;
        tracing::info!(project_id = %id, "tree project updated");
        Ok(updated)
    }

    /// Delete a project and its whole sub-tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist.
    pub fn delete_project(&self, id: &str) -> Result<TreeProject> {
        let project = self.get_project(id)?;
        self.store.delete(Collection::ProjectTrees, id)?;
        tracing::info!(
            project_id = %id,
            sub_projects = project.sub_projects.len(),
            "tree project deleted"
        );
        Ok(project)
    }

    /// Append a sub-project with an empty task list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project does not exist, or
    /// [`Error::Validation`] for an empty label.
    pub fn add_sub_project(&self, project_id: &str, mut details: Details) -> Result<SubProject> {
        require_label(&mut details, "sub-project")?;
        let sub = SubProject { id: generate_id("sub"), details, tasks: Vec::new() };
        self.modify(project_id, |project| {
            project.sub_projects.push(sub.clone());
            Ok(())
        })?;
        tracing::info!(project_id = %project_id, sub_project_id = %sub.id, "sub-project added");
        Ok(sub)
    }

    /// Shallow-merge a patch over a sub-project's own fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project or sub-project does not exist.
    pub fn update_sub_project(
        &self,
        project_id: &str,
        sub_project_id: &str,
        patch: &DetailsPatch,
    ) -> Result<SubProject> {
        let updated = self.modify(project_id, |project| {
            let sub = find_sub_project(project, sub_project_id)?;
            patch.apply_to(&mut sub.details);
            require_label(&mut sub.details, "sub-project")?;
            Ok(sub.clone())
        })?;
        tracing::info!(project_id = %project_id, sub_project_id = %sub_project_id, "sub-project updated");
        Ok(updated)
    }

    /// Remove a sub-project and its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the project or sub-project does not exist.
    pub fn delete_sub_project(&self, project_id: &str, sub_project_id: &str) -> Result<SubProject> {
        let removed = self.modify(project_id, |project| {
            let index = project
                .sub_projects
                .iter()
                .position(|sp| sp.id == sub_project_id)
                .ok_or_else(|| Error::not_found(EntityKind::SubProject, sub_project_id))?;
            Ok(project.sub_projects.remove(index))
        })?;
        tracing::info!(project_id = %project_id, sub_project_id = %sub_project_id, "sub-project deleted");
        Ok(removed)
    }

    /// Append a task to a sub-project and notify its assignee.
    ///
    /// The assignee must exist before anything is written. The notification
    /// is appended after the project is saved; if that second write fails
    /// the task stays saved and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown project, sub-project or
    /// assignee, or [`Error::Validation`] for an empty label.
    pub fn add_task(
        &self,
        project_id: &str,
        sub_project_id: &str,
        mut data: NewTreeTask,
    ) -> Result<TreeTask> {
        require_label(&mut data.details, "task")?;
        let assignee = data.assignee.filter(|id| !id.is_empty());
        self.check_assignee(assignee.as_deref())?;

        let task = TreeTask {
            id: generate_id("ttask"),
            details: data.details,
            urgency: data.urgency,
            assignee,
        };
        let (project_label, sub_label) = self.modify(project_id, |project| {
            let project_label = project.details.label.clone();
            let sub = find_sub_project(project, sub_project_id)?;
            sub.tasks.push(task.clone());
            Ok((project_label, sub.details.label.clone()))
        })?;
        tracing::info!(
            project_id = %project_id,
            sub_project_id = %sub_project_id,
            task_id = %task.id,
            "tree task added"
        );

        if let Some(assignee) = &task.assignee {
            let assignment = Assignment {
                task: &task.details.label,
                project: &project_label,
                sub_project: &sub_label,
            };
            self.intervenants.notify(assignee, &assignment)?;
        }
        Ok(task)
    }

    /// Merge a patch over a task.
    ///
    /// Reassigning does not notify the new assignee.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown project, sub-project, task
    /// or new assignee.
    pub fn update_task(
        &self,
        project_id: &str,
        sub_project_id: &str,
        task_id: &str,
        patch: &TreeTaskPatch,
    ) -> Result<TreeTask> {
        let new_assignee = patch
            .assignee
            .as_ref()
            .map(|a| a.clone().filter(|id| !id.is_empty()));
        if let Some(assignee) = &new_assignee {
            self.check_assignee(assignee.as_deref())?;
        }

        let updated = self.modify(project_id, |project| {
            let sub = find_sub_project(project, sub_project_id)?;
            let task = find_task(sub, task_id)?;
            patch.details.apply_to(&mut task.details);
            require_label(&mut task.details, "task")?;
            if let Some(urgency) = patch.urgency {
                task.urgency = urgency;
            }
            if let Some(assignee) = new_assignee {
                task.assignee = assignee;
            }
            Ok(task.clone())
        })?;
        tracing::info!(project_id = %project_id, task_id = %task_id, "tree task updated");
        Ok(updated)
    }

    /// Remove a task from a sub-project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown project, sub-project or task.
    pub fn delete_task(
        &self,
        project_id: &str,
        sub_project_id: &str,
        task_id: &str,
    ) -> Result<TreeTask> {
        let removed = self.modify(project_id, |project| {
            let sub = find_sub_project(project, sub_project_id)?;
            let index = sub
                .tasks
                .iter()
                .position(|t| t.id == task_id)
                .ok_or_else(|| Error::not_found(EntityKind::TreeTask, task_id))?;
            Ok(sub.tasks.remove(index))
        })?;
        tracing::info!(project_id = %project_id, task_id = %task_id, "tree task deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::tree::models::{TreeUrgency, WorkStatus};

    fn setup(store: &MemoryStore) -> (ProjectTreeRepository<'_>, TreeProject, SubProject) {
        let repo = ProjectTreeRepository::new(store);
        let project = repo.add_project(Details::new("Website")).unwrap();
        let sub = repo.add_sub_project(&project.id, Details::new("Phase 1")).unwrap();
        (repo, project, sub)
    }

    fn new_task(label: &str, assignee: Option<&str>) -> NewTreeTask {
        NewTreeTask {
            details: Details::new(label),
            urgency: TreeUrgency::High,
            assignee: assignee.map(str::to_string),
        }
    }

    #[test]
    fn test_add_project_starts_empty() {
        let store = MemoryStore::new();
        let repo = ProjectTreeRepository::new(&store);
        let project = repo.add_project(Details::new("Website")).unwrap();

        assert!(project.sub_projects.is_empty());
        assert_eq!(repo.list_projects().unwrap(), vec![project.clone()]);
        assert_eq!(repo.get_project(&project.id).unwrap(), project);
        assert!(matches!(repo.add_project(Details::new(" ")), Err(Error::Validation(_))));
    }

    #[test]
    fn test_labels_are_stored_trimmed() {
        let store = MemoryStore::new();
        let repo = ProjectTreeRepository::new(&store);
        let project = repo.add_project(Details::new(" Website ")).unwrap();
        let sub = repo.add_sub_project(&project.id, Details::new("\tPhase 1 ")).unwrap();
        let task = repo.add_task(&project.id, &sub.id, new_task("  Design", None)).unwrap();

        let stored = repo.get_project(&project.id).unwrap();
        assert_eq!(stored.details.label, "Website");
        assert_eq!(stored.sub_projects[0].details.label, "Phase 1");
        assert_eq!(stored.sub_projects[0].tasks[0].details.label, "Design");
        assert_eq!(task.details.label, "Design");

        let patch = DetailsPatch { label: Some(" Website v2 ".into()), ..Default::default() };
        assert_eq!(repo.update_project(&project.id, &patch).unwrap().details.label, "Website v2");
    }

    #[test]
    fn test_update_project_is_shallow() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);

        let patch = DetailsPatch { status: Some(WorkStatus::InProgress), ..Default::default() };
        let updated = repo.update_project(&project.id, &patch).unwrap();
        assert_eq!(updated.details.status, WorkStatus::InProgress);
        assert_eq!(updated.details.label, "Website");
        assert_eq!(updated.sub_projects, vec![sub]);
    }

    #[test]
    fn test_delete_project_removes_subtree() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);
        repo.add_task(&project.id, &sub.id, new_task("Design", None)).unwrap();

        let deleted = repo.delete_project(&project.id).unwrap();
        assert_eq!(deleted.sub_projects[0].tasks.len(), 1);
        assert!(repo.list_projects().unwrap().is_empty());
        assert!(repo.get_project(&project.id).unwrap_err().is_not_found(EntityKind::TreeProject));
    }

    #[test]
    fn test_sub_project_crud() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);
        assert!(sub.tasks.is_empty());

        let patch = DetailsPatch { label: Some("Phase one".into()), ..Default::default() };
        let renamed = repo.update_sub_project(&project.id, &sub.id, &patch).unwrap();
        assert_eq!(renamed.details.label, "Phase one");

        let second = repo.add_sub_project(&project.id, Details::new("Phase 2")).unwrap();
        assert_eq!(repo.get_project(&project.id).unwrap().sub_projects.len(), 2);

        repo.delete_sub_project(&project.id, &sub.id).unwrap();
        assert_eq!(repo.get_project(&project.id).unwrap().sub_projects, vec![second]);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);
        let patch = DetailsPatch::default();

        assert!(repo
            .update_sub_project("tree_x", &sub.id, &patch)
            .unwrap_err()
            .is_not_found(EntityKind::TreeProject));
        assert!(repo
            .update_sub_project(&project.id, "sub_x", &patch)
            .unwrap_err()
            .is_not_found(EntityKind::SubProject));
        assert!(repo
            .add_task(&project.id, "sub_x", new_task("x", None))
            .unwrap_err()
            .is_not_found(EntityKind::SubProject));
        assert!(repo
            .delete_task(&project.id, &sub.id, "ttask_x")
            .unwrap_err()
            .is_not_found(EntityKind::TreeTask));
        assert!(repo
            .update_task(&project.id, &sub.id, "ttask_x", &TreeTaskPatch::default())
            .unwrap_err()
            .is_not_found(EntityKind::TreeTask));
        assert!(repo.delete_project("tree_x").unwrap_err().is_not_found(EntityKind::TreeProject));

        // Nothing was written by the failed calls.
        assert_eq!(repo.get_project(&project.id).unwrap().sub_projects, vec![sub]);
    }

    #[test]
    fn test_add_task_notifies_assignee() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);
        let people = IntervenantRepository::new(&store);
        let alice = people.add_intervenant("Alice", "alice@example.com").unwrap();

        let task = repo.add_task(&project.id, &sub.id, new_task("Design", Some(&alice.id))).unwrap();
        assert_eq!(task.assignee.as_deref(), Some(alice.id.as_str()));

        let log = people.get_intervenant(&alice.id).unwrap().notifications;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].task, "Design");
        assert_eq!(log[0].project, "Website");
        assert_eq!(log[0].sub_project, "Phase 1");
    }

    #[test]
    fn test_add_task_without_assignee_notifies_nobody() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);
        let people = IntervenantRepository::new(&store);
        let alice = people.add_intervenant("Alice", "alice@example.com").unwrap();

        repo.add_task(&project.id, &sub.id, new_task("Solo", None)).unwrap();
        repo.add_task(&project.id, &sub.id, new_task("Blank", Some(""))).unwrap();
        assert!(people.get_intervenant(&alice.id).unwrap().notifications.is_empty());
    }

    #[test]
    fn test_add_task_unknown_assignee_writes_nothing() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);

        let err = repo.add_task(&project.id, &sub.id, new_task("Design", Some("nobody"))).unwrap_err();
        assert!(err.is_not_found(EntityKind::Intervenant));
        assert!(repo.get_project(&project.id).unwrap().sub_projects[0].tasks.is_empty());
    }

    #[test]
    fn test_update_and_delete_task() {
        let store = MemoryStore::new();
        let (repo, project, sub) = setup(&store);
        let people = IntervenantRepository::new(&store);
        let bob = people.add_intervenant("Bob", "bob@example.com").unwrap();
        let task = repo.add_task(&project.id, &sub.id, new_task("Design", None)).unwrap();

        let patch = TreeTaskPatch {
            details: DetailsPatch { status: Some(WorkStatus::Done), ..Default::default() },
            urgency: Some(TreeUrgency::Low),
            assignee: Some(Some(bob.id.clone())),
        };
        let updated = repo.update_task(&project.id, &sub.id, &task.id, &patch).unwrap();
        assert_eq!(updated.details.status, WorkStatus::Done);
        assert_eq!(updated.details.label, "Design");
        assert_eq!(updated.urgency, TreeUrgency::Low);
        assert_eq!(updated.assignee.as_deref(), Some(bob.id.as_str()));
        assert!(people.get_intervenant(&bob.id).unwrap().notifications.is_empty());

        let bad = TreeTaskPatch { assignee: Some(Some("nobody".into())), ..Default::default() };
        assert!(repo
            .update_task(&project.id, &sub.id, &task.id, &bad)
            .unwrap_err()
            .is_not_found(EntityKind::Intervenant));

        let removed = repo.delete_task(&project.id, &sub.id, &task.id).unwrap();
        assert_eq!(removed, updated);
        assert!(repo.get_project(&project.id).unwrap().sub_projects[0].tasks.is_empty());
    }

    #[test]
    fn test_offline_store() {
        let store = MemoryStore::new();
        let (repo, project, _) = setup(&store);
        store.set_offline(true);
        assert!(matches!(repo.list_projects(), Err(Error::BackendUnavailable(_))));
        assert!(matches!(
            repo.add_sub_project(&project.id, Details::new("x")),
            Err(Error::BackendUnavailable(_))
        ));
    }
}
