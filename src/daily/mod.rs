//! Daily kanban board.
//!
//! Cards move freely between the pending, doing and done columns. They are
//! not linked to projects.

pub mod models;
pub mod repository;

pub use models::{DailyBoard, DailyStatus, DailyTask, DailyTaskPatch, InvalidDailyStatus, NewDailyTask};
pub use repository::DailyTaskRepository;
