//! Shared types for the notedeck application.
//!
//! This module holds the crate-wide `Result` alias and the command-line
//! subcommands.
use std::path::PathBuf;

use clap::Subcommand;

use crate::{DeckError, NoteType, Repetition};

/// A specialized Result type for notedeck operations.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Available subcommands for the notedeck application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the todo/notes board
    #[clap(subcommand)]
    Todo(TodoCommand),

    /// Manage blog posts
    #[clap(subcommand)]
    Blog(BlogCommand),

    /// List the occupied storage slots
    Slots,
}

#[derive(Subcommand, Debug)]
pub enum TodoCommand {
    /// Add an item to the board
    Add {
        /// Kind of item
        #[clap(short = 'k', long = "type", value_enum, default_value_t = NoteType::Task)]
        note_type: NoteType,

        /// Title (image, video, audio, attachment)
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Task description, or the media URL
        #[clap(short, long)]
        content: Option<String>,

        /// Due date, YYYY-MM-DD (task only)
        #[clap(short, long)]
        due: Option<String>,

        /// Reminder date, YYYY-MM-DD (task only)
        #[clap(short, long)]
        reminder: Option<String>,

        /// Recurrence class (task only)
        #[clap(long = "repeat", value_enum, default_value_t = Repetition::None)]
        repetition: Repetition,

        /// File to attach (attachment only)
        #[clap(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the board grouped by recurrence
    List {
        /// Output the rendered board as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Toggle an item between done and open
    Toggle {
        /// Id or unique id prefix
        id: String,
    },

    /// Delete an item
    Delete {
        /// Id or unique id prefix
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlogCommand {
    /// Publish a new post
    New {
        /// Title of the post
        #[clap(short = 'T', long)]
        title: String,

        /// Content, Markdown unless --html is given
        #[clap(short, long)]
        content: Option<String>,

        /// Read the content from a file
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Featured image URL
        #[clap(short, long)]
        image: Option<String>,

        /// Treat content as HTML markup
        #[clap(long)]
        html: bool,
    },

    /// Write a post interactively, with the draft autosaved
    Compose,

    /// List posts, newest first
    List {
        /// Output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show a post in full
    View {
        /// Id or unique id prefix
        id: String,

        /// Output the raw post as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit a post in place
    Edit {
        /// Id or unique id prefix
        id: String,

        /// New title
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content, Markdown unless --html is given
        #[clap(short, long)]
        content: Option<String>,

        /// Read the new content from a file
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// New featured image URL (empty to remove)
        #[clap(short, long)]
        image: Option<String>,

        /// Treat content as HTML markup
        #[clap(long)]
        html: bool,

        /// Open the current markup in the editor
        #[clap(short, long)]
        edit: bool,
    },

    /// Delete a post
    Delete {
        /// Id or unique id prefix
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show the saved draft
    Draft {
        /// Discard the draft
        #[clap(long)]
        clear: bool,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Preview the saved draft with character and word counts
    Preview,
}
