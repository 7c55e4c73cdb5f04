use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    name = "notedeck",
    version,
    about = "Todo board and blog editor backed by local storage"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding the storage slots
    #[clap(long, value_parser)]
    pub storage_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the notedeck application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlogCommand, NoteType, Repetition, TodoCommand};

    #[test]
    fn parses_todo_add() {
        let cli = Cli::try_parse_from([
            "notedeck", "todo", "add", "--content", "stretch", "--repeat", "daily", "--due",
            "2025-01-01",
        ])
        .unwrap();

        match cli.command {
            Commands::Todo(TodoCommand::Add {
                note_type,
                content,
                repetition,
                due,
                ..
            }) => {
                assert_eq!(note_type, NoteType::Task);
                assert_eq!(content.as_deref(), Some("stretch"));
                assert_eq!(repetition, Repetition::Daily);
                assert_eq!(due.as_deref(), Some("2025-01-01"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_attachment_and_globals() {
        let cli = Cli::try_parse_from([
            "notedeck", "--storage-dir", "/tmp/deck", "-v", "todo", "add", "--type",
            "attachment", "-T", "Scan", "--file", "scan.pdf",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.storage_dir, Some(PathBuf::from("/tmp/deck")));
        assert!(matches!(
            cli.command,
            Commands::Todo(TodoCommand::Add {
                note_type: NoteType::Attachment,
                ..
            })
        ));
    }

    #[test]
    fn parses_blog_delete() {
        let cli = Cli::try_parse_from(["notedeck", "blog", "delete", "ab12", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Blog(BlogCommand::Delete { force: true, .. })
        ));
    }
}
