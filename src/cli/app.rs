//! CLI module for the notedeck application
//!
//! This module handles the command-line interface for interacting with the
//! todo board and the blog.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
    sync::Arc,
    time::Duration,
};

use chrono::Local;
use console::style;
use log::{debug, info};
use shell_words::split;
use tempfile::Builder;

use crate::{
    helper::{content_preview, html_to_text, markdown_to_html, non_empty},
    write_board, write_post_detail, write_post_list, write_preview, BlogCommand, BlogWidget,
    Commands, Config, Confirm, DeckError, DraftAutosaver, FormLimits, NoteForm, Result,
    SlotBackend, Submitted, TerminalConfirm, TodoCommand, TodoWidget,
};

/// CLI Application handler - processes CLI commands against the slot storage
pub struct App {
    /// Host storage
    backend: Arc<dyn SlotBackend>,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given storage backend and config
    pub fn new(backend: Arc<dyn SlotBackend>, config: Config, verbose: bool) -> Self {
        Self {
            backend,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Todo(command) => self.run_todo(command).await,
            Commands::Blog(command) => self.run_blog(command).await,
            Commands::Slots => self.list_slots(),
        }
    }

    async fn run_todo(&self, command: TodoCommand) -> Result<()> {
        match command {
            TodoCommand::Add {
                note_type,
                title,
                content,
                due,
                reminder,
                repetition,
                file,
            } => {
                let form = NoteForm {
                    note_type,
                    title,
                    content,
                    due_date: due,
                    reminder_date: reminder,
                    repetition,
                    file,
                };
                self.add_note(form).await
            }
            TodoCommand::List { json } => self.list_notes(json),
            TodoCommand::Toggle { id } => self.toggle_note(&id),
            TodoCommand::Delete { id, force } => self.delete_note(&id, force).await,
        }
    }

    async fn run_blog(&self, command: BlogCommand) -> Result<()> {
        match command {
            BlogCommand::New {
                title,
                content,
                file,
                image,
                html,
            } => self.create_post(title, content, file, image, html),
            BlogCommand::Compose => self.compose_post().await,
            BlogCommand::List { json } => self.list_posts(json),
            BlogCommand::View { id, json } => self.view_post(&id, json),
            BlogCommand::Edit {
                id,
                title,
                content,
                file,
                image,
                html,
                edit,
            } => self.edit_post(&id, title, content, file, image, html, edit),
            BlogCommand::Delete { id, force } => self.delete_post(&id, force),
            BlogCommand::Draft { clear, force } => self.handle_draft(clear, force),
            BlogCommand::Preview => self.preview_draft(),
        }
    }

    async fn add_note(&self, form: NoteForm) -> Result<()> {
        let item = form.submit(&FormLimits::from(&self.config)).await?;

        let mut board = TodoWidget::open(Arc::clone(&self.backend))?;
        let label = item.display_title().to_string();
        let short_id = item.short_id();
        let note_type = item.note_type();
        board.add(item)?;

        println!("Added {} '{}' with ID: {}", note_type, label, short_id);
        Ok(())
    }

    fn list_notes(&self, json: bool) -> Result<()> {
        let board = TodoWidget::open(Arc::clone(&self.backend))?;
        let rendered = board.render(Local::now().date_naive());

        if json {
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        } else {
            write_board(&mut stdout().lock(), &rendered)?;
        }
        Ok(())
    }

    fn toggle_note(&self, id: &str) -> Result<()> {
        let mut board = TodoWidget::open(Arc::clone(&self.backend))?;
        let item = board.find(id)?;
        let (id, title) = (item.id, item.display_title().to_string());

        let completed = board.toggle_complete(id)?;
        println!(
            "'{}' marked as {}",
            title,
            if completed { "done" } else { "not done" }
        );
        Ok(())
    }

    async fn delete_note(&self, id: &str, force: bool) -> Result<()> {
        let mut board = TodoWidget::open(Arc::clone(&self.backend))?;
        let item = board.find(id)?.clone();

        if !force {
            println!("You are about to delete the following item:");
            println!("ID:    {}", item.id);
            println!("Type:  {}", item.note_type());
            println!("Title: {}", item.display_title());
        }
        let confirm = TerminalConfirm { force };
        if !confirm.confirm("Are you sure you want to delete this item?") {
            println!("Deletion cancelled.");
            return Ok(());
        }

        // Show the leaving item, then commit once its transition ends
        let fallback = Duration::from_millis(self.config.removal_fallback_ms);
        let mut pending = board.mark_for_removal(item.id, fallback)?;
        println!(
            "{}",
            style(format!("  [ ] {}", item.display_title()))
                .dim()
                .strikethrough()
        );
        pending.transition_end();

        let (id, settled) = pending.settle().await;
        debug!("Removal of {} settled: {:?}", id, settled);
        board.commit_removal(id)?;

        println!("Item '{}' has been deleted.", item.display_title());
        Ok(())
    }

    fn create_post(
        &self,
        title: String,
        content: Option<String>,
        file: Option<PathBuf>,
        image: Option<String>,
        html: bool,
    ) -> Result<()> {
        let content = self.resolve_content(&title, content, file, html, "")?;

        // Leave any compose draft for `blog compose`
        let mut blog = BlogWidget::open(Arc::clone(&self.backend))?;
        blog.set_draft_aside()?;
        {
            let mut form = blog.form()?;
            form.title = title;
            form.content = content;
            form.featured_image = image.unwrap_or_default();
        }

        if let Submitted::Created(id) = blog.submit()? {
            println!("Post created with ID: {}", id);
        }
        Ok(())
    }

    /// Interactive compose: the form is autosaved to the draft slot while the
    /// user is typing or editing.
    async fn compose_post(&self) -> Result<()> {
        let mut blog = BlogWidget::open(Arc::clone(&self.backend))?;
        let mut autosaver = DraftAutosaver::new(
            Duration::from_secs(self.config.autosave_interval_secs),
            blog.drafts().clone(),
            blog.form_handle(),
        );
        autosaver.start().await?;

        let result = self.compose_steps(&mut blog, &mut autosaver).await;

        autosaver.stop().await?;
        result
    }

    async fn compose_steps(
        &self,
        blog: &mut BlogWidget,
        autosaver: &mut DraftAutosaver,
    ) -> Result<()> {
        let current = blog.form()?.clone();
        if !current.title.is_empty() || !current.content.is_empty() {
            println!("Restored draft '{}'", current.title);
        }

        let title = prompt_line("Title", &current.title).await?;
        blog.form()?.title = title.clone();

        let image = prompt_line("Featured image URL", &current.featured_image).await?;
        blog.form()?.featured_image = image;

        let editor_cmd = self.config.get_editor_command();
        let existing = current.content.clone();
        info!("Opening editor to write post content. Save and exit when done...");
        let text = tokio::task::spawn_blocking(move || {
            open_editor_with_content(&editor_cmd, &title, &existing)
        })
        .await
        .map_err(|e| DeckError::EditorError {
            message: format!("Editor task failed: {}", e),
        })??;
        blog.form()?.content = markdown_to_html(&text);
        autosaver.save_now().await?;

        let preview = blog.preview()?;
        write_preview(&mut stdout().lock(), &preview)?;

        let publish = tokio::task::spawn_blocking(|| {
            TerminalConfirm { force: false }.confirm("Publish this post?")
        })
        .await
        .map_err(|e| DeckError::ApplicationError {
            message: format!("Prompt task failed: {}", e),
        })?;

        finish_compose(blog, autosaver, publish).await
    }

    fn list_posts(&self, json: bool) -> Result<()> {
        let blog = BlogWidget::open(Arc::clone(&self.backend))?;
        let cards = blog.render_list();
        if json {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        } else {
            write_post_list(&mut stdout().lock(), &cards)?;
        }
        Ok(())
    }

    fn view_post(&self, id: &str, json: bool) -> Result<()> {
        let mut blog = BlogWidget::open(Arc::clone(&self.backend))?;
        let id = blog.find(id)?.id;
        let post = blog.view(id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(post)?);
        } else {
            write_post_detail(&mut stdout().lock(), post)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn edit_post(
        &self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        image: Option<String>,
        html: bool,
        open_editor: bool,
    ) -> Result<()> {
        // Validate input - check for conflicting options
        if content.is_some() && open_editor {
            return Err(DeckError::ApplicationError {
                message: "Cannot specify both --content and --edit options".to_string(),
            });
        }
        if file.is_some() && open_editor {
            return Err(DeckError::ApplicationError {
                message: "Cannot specify both --file and --edit options".to_string(),
            });
        }

        let mut blog = BlogWidget::open(Arc::clone(&self.backend))?;
        blog.set_draft_aside()?;

        // Load the existing post into the form
        let id = blog.find(id)?.id;
        blog.edit(id)?;

        // Get new content from the editor, inline text or a file
        let current = blog.form()?.clone();
        let new_content = if open_editor {
            Some(self.resolve_content(&current.title, None, None, true, &current.content)?)
        } else if content.is_some() || file.is_some() {
            Some(self.resolve_content(&current.title, content, file, html, "")?)
        } else {
            None
        };

        // Update only the fields that were provided
        {
            let mut form = blog.form()?;
            if let Some(title) = non_empty(title) {
                form.title = title;
            }
            if let Some(content) = new_content {
                form.content = content;
            }
            if let Some(image) = image {
                form.featured_image = image.trim().to_string();
            }
        }

        blog.submit()?;
        println!("Post {} updated successfully", id);
        Ok(())
    }

    fn delete_post(&self, id: &str, force: bool) -> Result<()> {
        let mut blog = BlogWidget::open(Arc::clone(&self.backend))?;
        let post = blog.find(id)?.clone();

        if !force {
            println!("You are about to delete the following post:");
            println!("ID:      {}", post.id);
            println!("Title:   {}", post.title);
            println!(
                "Created: {}",
                post.created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
            );
            let preview = content_preview(&post.text_content(), 100);
            if !preview.is_empty() {
                println!("\nContent preview:\n{}", preview);
            }
            println!("\nThis action cannot be undone!");
        }

        if blog.delete(post.id, &TerminalConfirm { force })? {
            println!("Post '{}' ({}) has been permanently deleted.", post.title, post.id);
        } else {
            println!("Deletion cancelled.");
        }
        Ok(())
    }

    fn handle_draft(&self, clear: bool, force: bool) -> Result<()> {
        let mut blog = BlogWidget::open(Arc::clone(&self.backend))?;

        if clear {
            if blog.clear_form(&TerminalConfirm { force })? {
                println!("Draft discarded.");
            } else {
                println!("Draft kept.");
            }
            return Ok(());
        }

        match blog.drafts().load()? {
            Some(draft) if !draft.is_blank() => {
                println!("Title: {}", style(&draft.title).bold());
                if !draft.featured_image.is_empty() {
                    println!("Image: {}", draft.featured_image);
                }
                println!("\n{}", html_to_text(&draft.content).trim());
            }
            _ => println!("No draft saved."),
        }
        Ok(())
    }

    fn preview_draft(&self) -> Result<()> {
        let blog = BlogWidget::open(Arc::clone(&self.backend))?;
        write_preview(&mut stdout().lock(), &blog.preview()?)?;
        Ok(())
    }

    fn list_slots(&self) -> Result<()> {
        let keys = self.backend.keys()?;
        if keys.is_empty() {
            println!("Storage is empty.");
        }
        for key in keys {
            if self.verbose {
                let size = self.backend.read(&key)?.map(|text| text.len()).unwrap_or(0);
                println!("{:<32} {} bytes", key, size);
            } else {
                println!("{}", key);
            }
        }
        Ok(())
    }

    /// Picks the content source; Markdown is rendered to HTML unless `html` is set.
    fn resolve_content(
        &self,
        title: &str,
        content: Option<String>,
        file: Option<PathBuf>,
        html: bool,
        existing: &str,
    ) -> Result<String> {
        let raw = match (content, file) {
            (Some(_), Some(_)) => {
                return Err(DeckError::ApplicationError {
                    message: "Cannot specify both --content and --file options".to_string(),
                })
            }
            (Some(content), None) => content,
            (None, Some(file_path)) => read_content_from_file(&file_path)?,
            (None, None) => {
                info!("Opening editor to write post content. Save and exit when done...");
                open_editor_with_content(&self.config.get_editor_command(), title, existing)?
            }
        };

        Ok(if html { raw } else { markdown_to_html(&raw) })
    }
}

/// Publishes the composed post, or leaves it in the draft slot when declined.
async fn finish_compose(
    blog: &mut BlogWidget,
    autosaver: &mut DraftAutosaver,
    publish: bool,
) -> Result<()> {
    if !publish {
        autosaver.save_now().await?;
        println!("Draft kept. Run `notedeck blog compose` to continue.");
        return Ok(());
    }

    // No snapshot may land after the submit clears the draft
    autosaver.stop().await?;
    match blog.submit()? {
        Submitted::Created(id) => println!("Post created with ID: {}", id),
        Submitted::Updated(id) => println!("Post {} updated", id),
    }
    Ok(())
}

/// Asks for one line on the terminal; an empty answer keeps `current`.
async fn prompt_line(label: &str, current: &str) -> Result<String> {
    let prompt = if current.is_empty() {
        format!("{}: ", label)
    } else {
        format!("{} [{}]: ", label, current)
    };
    let current = current.to_string();

    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{}", prompt);
        stdout().flush()?;
        let mut input = String::new();
        stdin().read_line(&mut input)?;
        let input = input.trim();
        Ok(if input.is_empty() {
            current
        } else {
            input.to_string()
        })
    })
    .await
    .map_err(|e| DeckError::ApplicationError {
        message: format!("Prompt task failed: {}", e),
    })?
}

fn read_content_from_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(DeckError::ApplicationError {
            message: format!("Not a file: {}", path.display()),
        });
    }
    read_to_string(path).map_err(|e| DeckError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn open_editor_with_content(editor_cmd: &str, title: &str, existing: &str) -> Result<String> {
    // Create a temporary file with .md extension
    let temp_file = Builder::new().suffix(".md").tempfile()?;
    let temp_path = temp_file.path().to_path_buf();

    write_editor_template(&temp_path, title, existing)?;
    launch_editor(editor_cmd, &temp_path)?;

    // Read back what the user saved
    let content = read_to_string(&temp_path)?;
    Ok(process_editor_content(&content))
}

fn write_editor_template(path: &Path, title: &str, existing: &str) -> Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;

    writeln!(file, "<!-- {} -->", title)?;
    writeln!(
        file,
        "<!-- Write the post below in Markdown; inline HTML is kept as is. -->"
    )?;
    writeln!(
        file,
        "<!-- Lines that start with <!-- and end with --> are comments and will be ignored. -->"
    )?;
    writeln!(file)?;
    if !existing.is_empty() {
        writeln!(file, "{}", existing)?;
    }

    Ok(())
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    // Handle shell-like command parsing
    let args = split(editor_cmd).map_err(|e| DeckError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    // First word is the program name, rest are arguments
    let Some((program, rest)) = args.split_first() else {
        return Err(DeckError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program)
        .args(rest)
        .arg(file_path.to_string_lossy().as_ref())
        .status()?;

    if !status.success() {
        return Err(DeckError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }

    Ok(())
}

fn process_editor_content(content: &str) -> String {
    // Remove HTML comment lines from content
    content
        .lines()
        .filter(|line| {
            let line = line.trim();
            !(line.starts_with("<!--") && line.ends_with("-->"))
        })
        .collect::<Vec<&str>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlogForm, Draft, MemorySlots, NoteType, Repetition, DRAFT_SLOT};

    fn app(backend: &MemorySlots) -> App {
        App::new(Arc::new(backend.clone()), Config::default(), false)
    }

    #[test]
    fn editor_comments_are_dropped() {
        let text = "<!-- title -->\n<!-- help -->\n\n# Heading\nbody <b>x</b>\n";
        assert_eq!(process_editor_content(text), "# Heading\nbody <b>x</b>");
    }

    #[tokio::test]
    async fn todo_commands_round_trip() {
        let backend = MemorySlots::new();
        let app = app(&backend);

        app.run(Commands::Todo(TodoCommand::Add {
            note_type: NoteType::Task,
            title: None,
            content: Some("water plants".to_string()),
            due: None,
            reminder: None,
            repetition: Repetition::Weekly,
            file: None,
        }))
        .await
        .unwrap();

        let board = TodoWidget::open(Arc::new(backend.clone())).unwrap();
        let id = board.items()[0].id.simple().to_string();

        app.run(Commands::Todo(TodoCommand::Toggle { id: id[..6].to_string() }))
            .await
            .unwrap();
        assert!(TodoWidget::open(Arc::new(backend.clone())).unwrap().items()[0].completed);

        app.run(Commands::Todo(TodoCommand::Delete { id, force: true }))
            .await
            .unwrap();
        assert!(TodoWidget::open(Arc::new(backend.clone())).unwrap().is_empty());
    }

    #[tokio::test]
    async fn blog_commands_round_trip() {
        let backend = MemorySlots::new();
        let app = app(&backend);

        app.run(Commands::Blog(BlogCommand::New {
            title: "Hello".to_string(),
            content: Some("*hi* there".to_string()),
            file: None,
            image: None,
            html: false,
        }))
        .await
        .unwrap();

        let blog = BlogWidget::open(Arc::new(backend.clone())).unwrap();
        assert_eq!(blog.posts()[0].content, "<p><em>hi</em> there</p>\n");
        let id = blog.posts()[0].id.to_string();

        app.run(Commands::Blog(BlogCommand::Edit {
            id: id.clone(),
            title: Some("Hello again".to_string()),
            content: Some("<p>raw</p>".to_string()),
            file: None,
            image: Some("https://example.com/a.png".to_string()),
            html: true,
            edit: false,
        }))
        .await
        .unwrap();

        let blog = BlogWidget::open(Arc::new(backend.clone())).unwrap();
        let post = &blog.posts()[0];
        assert_eq!(post.title, "Hello again");
        assert_eq!(post.content, "<p>raw</p>");
        assert_eq!(post.featured_image.as_deref(), Some("https://example.com/a.png"));

        app.run(Commands::Blog(BlogCommand::Delete { id, force: true }))
            .await
            .unwrap();
        assert!(BlogWidget::open(Arc::new(backend)).unwrap().posts().is_empty());
    }

    fn saved_draft(backend: &MemorySlots) -> Draft {
        let draft = Draft {
            title: "Half written essay".to_string(),
            content: "<p>to be continued</p>".to_string(),
            featured_image: String::new(),
        };
        BlogWidget::open(Arc::new(backend.clone()))
            .unwrap()
            .drafts()
            .save(&draft)
            .unwrap();
        draft
    }

    #[tokio::test]
    async fn new_and_edit_leave_the_compose_draft_alone() {
        let backend = MemorySlots::new();
        let app = app(&backend);
        let draft = saved_draft(&backend);

        app.run(Commands::Blog(BlogCommand::New {
            title: "Quick note".to_string(),
            content: Some("<p>short</p>".to_string()),
            file: None,
            image: None,
            html: true,
        }))
        .await
        .unwrap();

        let blog = BlogWidget::open(Arc::new(backend.clone())).unwrap();
        assert_eq!(blog.posts()[0].title, "Quick note");
        assert_eq!(blog.drafts().load().unwrap(), Some(draft.clone()));

        app.run(Commands::Blog(BlogCommand::Edit {
            id: blog.posts()[0].id.to_string(),
            title: Some("Quick note, fixed".to_string()),
            content: None,
            file: None,
            image: None,
            html: false,
            edit: false,
        }))
        .await
        .unwrap();

        let blog = BlogWidget::open(Arc::new(backend.clone())).unwrap();
        assert_eq!(blog.posts()[0].title, "Quick note, fixed");
        assert_eq!(blog.posts()[0].content, "<p>short</p>");
        assert_eq!(blog.drafts().load().unwrap(), Some(draft));
    }

    #[tokio::test]
    async fn declined_compose_keeps_the_draft() {
        let backend = MemorySlots::new();
        let mut blog = BlogWidget::open(Arc::new(backend.clone())).unwrap();
        let mut autosaver = DraftAutosaver::new(
            Duration::from_secs(5),
            blog.drafts().clone(),
            blog.form_handle(),
        );
        autosaver.start().await.unwrap();
        {
            let mut form = blog.form().unwrap();
            form.title = "Not yet".to_string();
            form.content = "<p>needs work</p>".to_string();
        }

        finish_compose(&mut blog, &mut autosaver, false).await.unwrap();
        autosaver.stop().await.unwrap();

        assert!(blog.posts().is_empty());
        let draft = blog.drafts().load().unwrap().unwrap();
        assert_eq!(draft.title, "Not yet");
        assert_eq!(blog.form().unwrap().title, "Not yet");
    }

    #[tokio::test]
    async fn published_compose_clears_the_draft() {
        let backend = MemorySlots::new();
        saved_draft(&backend);
        let mut blog = BlogWidget::open(Arc::new(backend.clone())).unwrap();
        let mut autosaver = DraftAutosaver::new(
            Duration::from_secs(5),
            blog.drafts().clone(),
            blog.form_handle(),
        );
        autosaver.start().await.unwrap();
        autosaver.save_now().await.unwrap();

        finish_compose(&mut blog, &mut autosaver, true).await.unwrap();
        autosaver.stop().await.unwrap();

        assert_eq!(blog.posts()[0].title, "Half written essay");
        assert_eq!(backend.read(DRAFT_SLOT).unwrap(), None);
        assert_eq!(*blog.form().unwrap(), BlogForm::default());
    }

    #[tokio::test]
    async fn conflicting_content_sources_are_rejected() {
        let backend = MemorySlots::new();
        let result = app(&backend)
            .run(Commands::Blog(BlogCommand::New {
                title: "x".to_string(),
                content: Some("a".to_string()),
                file: Some(PathBuf::from("a.md")),
                image: None,
                html: false,
            }))
            .await;
        assert!(matches!(result, Err(DeckError::ApplicationError { .. })));
    }
}
