//! Command-line surface of notedeck.
mod app;
mod args;

pub use app::*;
pub use args::*;
