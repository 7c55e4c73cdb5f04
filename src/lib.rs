//! Todo board and blog editor backed by local storage
//!
//! This library provides two widgets persisted to string-keyed storage
//! slots: a multi-type todo/notes board grouped by recurrence, and a blog
//! editor with an autosaved draft.

mod autosave;
mod blog;
mod cli;
mod config;
mod errors;
pub mod helper;
mod form;
mod note;
mod removal;
mod render;
mod storage;
mod todo;
mod types;

// Re-export key components
pub use autosave::*;
pub use blog::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use form::*;
pub use helper::{resolve_id, Confirm, TerminalConfirm};
pub use note::*;
pub use removal::*;
pub use render::*;
pub use storage::*;
pub use todo::*;
pub use types::*;
