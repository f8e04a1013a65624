//! Intervenants and their assignment log.

use crate::error::{EntityKind, Error, Result};
use crate::id::generate_id;
use crate::store::{Collection, DocumentStore, DocumentStoreExt};
use crate::tree::models::{Intervenant, Notification};
use chrono::Utc;

/// What a notification refers to, by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<'s> {
    /// Task label.
    pub task: &'s str,
    /// Project label.
    pub project: &'s str,
    /// Sub-project label.
    pub sub_project: &'s str,
}

/// Repository for intervenants.
#[derive(Clone, Copy)]
pub struct IntervenantRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> IntervenantRepository<'a> {
    /// Create a repository over a store.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every intervenant, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a record is corrupt.
    pub fn list_intervenants(&self) -> Result<Vec<Intervenant>> {
        self.store.ensure_available()?;
        self.store.get_all_as(Collection::Intervenants)
    }

    /// Look an intervenant up by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    pub fn get_intervenant(&self, id: &str) -> Result<Intervenant> {
        self.store.ensure_available()?;
        self.store.require_as(Collection::Intervenants, EntityKind::Intervenant, id)
    }

    /// Register an intervenant with an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the name or email is empty.
    pub fn add_intervenant(&self, name: &str, email: &str) -> Result<Intervenant> {
        self.store.ensure_available()?;
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() {
            return Err(Error::Validation("intervenant needs a name and an email".to_string()));
        }

        let intervenant = Intervenant {
            id: generate_id("intervenant"),
            name: name.to_string(),
            email: email.to_string(),
            notifications: Vec::new(),
        };
        self.store.put_as(Collection::Intervenants, &intervenant)?;
        tracing::info!(intervenant_id = %intervenant.id, name = %intervenant.name, "intervenant added");
        Ok(intervenant)
    }

    /// Remove an intervenant. Tasks assigned to it keep the dangling ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    pub fn delete_intervenant(&self, id: &str) -> Result<Intervenant> {
        let intervenant = self.get_intervenant(id)?;
        self.store.delete(Collection::Intervenants, id)?;
        tracing::info!(intervenant_id = %id, "intervenant deleted");
        Ok(intervenant)
    }

    /// Append an entry to an intervenant's log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the intervenant does not exist.
    pub fn notify(&self, id: &str, assignment: &Assignment<'_>) -> Result<Notification> {
        let mut intervenant = self.get_intervenant(id)?;
        let notification = Notification {
            id: generate_id("notification"),
            date: Utc::now(),
            task: assignment.task.to_string(),
            project: assignment.project.to_string(),
            sub_project: assignment.sub_project.to_string(),
        };
        intervenant.notifications.push(notification.clone());
        self.store.put_as(Collection::Intervenants, &intervenant)?;

        tracing::info!(
            intervenant_id = %id,
            task = %notification.task,
            log_len = intervenant.notifications.len(),
            "intervenant notified"
        );
        Ok(notification)
    }

    /// The last `n` log entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the intervenant does not exist.
    pub fn recent_notifications(&self, id: &str, n: usize) -> Result<Vec<Notification>> {
        let mut notifications = self.get_intervenant(id)?.notifications;
        let skip = notifications.len().saturating_sub(n);
        Ok(notifications.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn assignment(task: &str) -> Assignment<'_> {
        Assignment { task, project: "Website", sub_project: "Phase 1" }
    }

    #[test]
    fn test_add_and_list() {
        let store = MemoryStore::new();
        let repo = IntervenantRepository::new(&store);
        let alice = repo.add_intervenant(" Alice ", "alice@example.com").unwrap();

        assert_eq!(alice.name, "Alice");
        assert!(alice.notifications.is_empty());
        assert_eq!(repo.list_intervenants().unwrap(), vec![alice.clone()]);
        assert_eq!(repo.get_intervenant(&alice.id).unwrap(), alice);
    }

    #[test]
    fn test_add_requires_name_and_email() {
        let store = MemoryStore::new();
        let repo = IntervenantRepository::new(&store);
        assert!(matches!(repo.add_intervenant("", "a@b.c"), Err(Error::Validation(_))));
        assert!(matches!(repo.add_intervenant("Bob", "  "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let repo = IntervenantRepository::new(&store);
        let bob = repo.add_intervenant("Bob", "bob@example.com").unwrap();

        assert_eq!(repo.delete_intervenant(&bob.id).unwrap(), bob);
        assert!(repo.list_intervenants().unwrap().is_empty());
        assert!(repo.delete_intervenant(&bob.id).unwrap_err().is_not_found(EntityKind::Intervenant));
    }

    #[test]
    fn test_notify_appends() {
        let store = MemoryStore::new();
        let repo = IntervenantRepository::new(&store);
        let alice = repo.add_intervenant("Alice", "alice@example.com").unwrap();

        let first = repo.notify(&alice.id, &assignment("Design")).unwrap();
        repo.notify(&alice.id, &assignment("Build")).unwrap();

        let stored = repo.get_intervenant(&alice.id).unwrap();
        assert_eq!(stored.notifications.len(), 2);
        assert_eq!(stored.notifications[0], first);
        assert_eq!(stored.notifications[0].project, "Website");
        assert_eq!(stored.notifications[1].task, "Build");
    }

    #[test]
    fn test_notify_unknown_intervenant() {
        let store = MemoryStore::new();
        let repo = IntervenantRepository::new(&store);
        let err = repo.notify("intervenant_x", &assignment("Design")).unwrap_err();
        assert!(err.is_not_found(EntityKind::Intervenant));
    }

    #[test]
    fn test_recent_notifications() {
        let store = MemoryStore::new();
        let repo = IntervenantRepository::new(&store);
        let alice = repo.add_intervenant("Alice", "alice@example.com").unwrap();
        for task in ["a", "b", "c", "d"] {
            repo.notify(&alice.id, &assignment(task)).unwrap();
        }

        let recent: Vec<_> = repo
            .recent_notifications(&alice.id, 3)
            .unwrap()
            .into_iter()
            .map(|n| n.task)
            .collect();
        assert_eq!(recent, ["b", "c", "d"]);
        assert_eq!(repo.recent_notifications(&alice.id, 10).unwrap().len(), 4);
        assert!(repo.recent_notifications(&alice.id, 0).unwrap().is_empty());
        // The log itself is never pruned.
        assert_eq!(repo.get_intervenant(&alice.id).unwrap().notifications.len(), 4);
    }
}
