//! Hierarchical projects: project, sub-projects, tasks.
//!
//! A project document owns its sub-projects and their tasks. Tasks may be
//! assigned to an [`Intervenant`], who gets a log entry on assignment.

pub mod intervenants;
pub mod models;
pub mod projects;

pub use intervenants::{Assignment, IntervenantRepository};
pub use models::{
    Details, DetailsPatch, Intervenant, NewTreeTask, Notification, SubProject, TreeProject,
    TreeTask, TreeTaskPatch, TreeUrgency, WorkStatus,
};
pub use projects::ProjectTreeRepository;
