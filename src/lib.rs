//! This crate turns a Notion task database into a weekly kanban board, a focus view and a meetings table.
//!
//! Pages of the database have no fixed shape: the [`property`] module reads their loosely-typed properties with
//! documented defaults, and the [`task`] and [`meeting`] modules normalize them into stable records. \
//! The [`query`] module builds the requests, that a [`RemoteStore`](traits::RemoteStore) (usually a [`Client`](client::Client)) runs.
//!
//! A [`TaskBoard`] caches the fetched tasks and applies local changes optimistically, before the store confirms them.
//! The [`partition`] module splits tasks into the inbox and the days of a week.

pub mod traits;

pub mod config;
pub mod error;
pub mod property;
pub mod page;
mod task;
pub use task::{normalize_tasks, NewTask, Task, TaskPatch, Theme};
mod meeting;
pub use meeting::{fetch_meetings, normalize_meetings, Meeting};
pub mod query;
pub mod partition;
pub mod board;
pub use board::TaskBoard;

pub mod client;
pub mod memory_store;
pub mod mock_behaviour;

pub mod utils;
