//! Projection of the stored records into on-screen lists.
//!
//! Rendering is split in two: `render_*` functions build plain view models
//! ([`Board`], [`PostCard`], ...) that tests can inspect, and `write_*`
//! functions print those models to a terminal.
use std::{collections::HashSet, io};

use chrono::{Local, NaiveDate};
use console::style;
use log::trace;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::{
    helper::{content_preview, pluralize},
    BlogPost, NoteBody, NoteItem, NoteType, Preview, Repetition,
};

/// Placeholder written for an empty bucket.
pub const EMPTY_BUCKET: &str = "No items in this list.";
/// Placeholder written for an empty post list.
pub const EMPTY_POSTS: &str = "No blog posts yet. Create one!";
/// Shown instead of a player when a video link is not a YouTube link.
pub const INVALID_VIDEO: &str = "Invalid video URL. Please use a YouTube link.";

/// What a card shows below its header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentView {
    None,
    Image { url: String },
    Embed { video_id: String, embed_url: String },
    InvalidVideo,
    AudioPlayer { url: String },
    VideoPlayer { url: String },
    Download { file_name: String },
}

/// Date decorations of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub overdue: bool,
    pub reminder_active: bool,
}

/// One rendered board entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteCard {
    /// Target of the card's controls
    pub id: Uuid,
    /// Index of the record in the stored sequence at render time
    pub position: usize,
    pub title: String,
    pub note_type: NoteType,
    pub completed: bool,
    pub leaving: bool,
    pub content: ContentView,
    pub due_date: Option<NaiveDate>,
    pub reminder_date: Option<NaiveDate>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub repetition: Repetition,
    pub cards: Vec<NoteCard>,
}

/// The whole board, one bucket per recurrence class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub buckets: Vec<Bucket>,
    /// Number of one-time items
    pub one_time_count: usize,
}

impl Board {
    pub fn bucket(&self, repetition: Repetition) -> &Bucket {
        // every class has a bucket
        &self.buckets[Repetition::ALL
            .iter()
            .position(|r| *r == repetition)
            .unwrap_or(0)]
    }

    pub fn cards(&self) -> impl Iterator<Item = &NoteCard> {
        self.buckets.iter().flat_map(|bucket| bucket.cards.iter())
    }

    pub fn count_label(&self) -> String {
        pluralize(self.one_time_count, "item")
    }
}

/// Extracts the video id of a `youtu.be/<id>` or `youtube.com/watch?v=<id>` link.
pub fn youtube_video_id(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    let host = url.host_str()?;

    let id = if host == "youtu.be" {
        url.path().trim_start_matches('/').to_string()
    } else if host.contains("youtube.com") {
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?
    } else {
        return None;
    };

    (!id.is_empty()).then_some(id)
}

pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

/// Overdue when due strictly before today; reminder active when on or before today.
pub fn task_status(item: &NoteItem, today: NaiveDate) -> TaskStatus {
    match item.as_task() {
        Some(task) => TaskStatus {
            overdue: task.due_date.is_some_and(|due| due < today),
            reminder_active: task.reminder_date.is_some_and(|reminder| reminder <= today),
        },
        None => TaskStatus::default(),
    }
}

pub fn content_view(item: &NoteItem) -> ContentView {
    match &item.body {
        NoteBody::Task(_) => ContentView::None,
        NoteBody::Image(media) => ContentView::Image {
            url: media.content.clone(),
        },
        NoteBody::Video(media) => match youtube_video_id(&media.content) {
            Some(video_id) => ContentView::Embed {
                embed_url: youtube_embed_url(&video_id),
                video_id,
            },
            None => ContentView::InvalidVideo,
        },
        NoteBody::Audio(media) => ContentView::AudioPlayer {
            url: media.content.clone(),
        },
        NoteBody::Attachment(file) => {
            if file.file_type.starts_with("image/") {
                ContentView::Image {
                    url: file.content.clone(),
                }
            } else if file.file_type.starts_with("video/") {
                ContentView::VideoPlayer {
                    url: file.content.clone(),
                }
            } else if file.file_type.starts_with("audio/") {
                ContentView::AudioPlayer {
                    url: file.content.clone(),
                }
            } else {
                ContentView::Download {
                    file_name: file.file_name.clone(),
                }
            }
        }
    }
}

/// Partitions the items into recurrence buckets in a single pass.
///
/// Relative order inside a bucket follows the stored order, and each card
/// records the stored index of its own record.
pub fn render_board(items: &[NoteItem], today: NaiveDate, leaving: &HashSet<Uuid>) -> Board {
    let mut buckets: Vec<Bucket> = Repetition::ALL
        .iter()
        .map(|repetition| Bucket {
            repetition: *repetition,
            cards: Vec::new(),
        })
        .collect();

    for (position, item) in items.iter().enumerate() {
        let task = item.as_task();
        let card = NoteCard {
            id: item.id,
            position,
            title: item.display_title().to_string(),
            note_type: item.note_type(),
            completed: item.completed,
            leaving: leaving.contains(&item.id),
            content: content_view(item),
            due_date: task.and_then(|t| t.due_date),
            reminder_date: task.and_then(|t| t.reminder_date),
            status: task_status(item, today),
        };

        let slot = Repetition::ALL
            .iter()
            .position(|r| *r == item.repetition())
            .unwrap_or(0);
        buckets[slot].cards.push(card);
    }

    let one_time_count = buckets[0].cards.len();
    trace!("Rendered {} items into {} buckets", items.len(), buckets.len());

    Board {
        buckets,
        one_time_count,
    }
}

/// One entry of the post list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub id: Uuid,
    pub position: usize,
    pub title: String,
    pub updated: NaiveDate,
}

/// Posts newest first, each bound to its own stored index.
pub fn render_post_list(posts: &[BlogPost]) -> Vec<PostCard> {
    posts
        .iter()
        .enumerate()
        .rev()
        .map(|(position, post)| PostCard {
            id: post.id,
            position,
            title: post.title.clone(),
            updated: post.updated_at.with_timezone(&Local).date_naive(),
        })
        .collect()
}

fn short(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn content_line(content: &ContentView) -> Option<String> {
    match content {
        ContentView::None => None,
        ContentView::Image { url } => Some(format!("[image] {}", content_preview(url, 60))),
        ContentView::Embed { embed_url, .. } => Some(format!("[video] {}", embed_url)),
        ContentView::InvalidVideo => Some(INVALID_VIDEO.to_string()),
        ContentView::AudioPlayer { url } => Some(format!("[audio] {}", content_preview(url, 60))),
        ContentView::VideoPlayer { url } => Some(format!("[video] {}", content_preview(url, 60))),
        ContentView::Download { file_name } => Some(format!("[file] {} (download)", file_name)),
    }
}

/// Writes the board as grouped text lists.
pub fn write_board(w: &mut impl io::Write, board: &Board) -> io::Result<()> {
    let width = terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80);

    for bucket in &board.buckets {
        writeln!(w, "{}", style(bucket.repetition.heading()).bold().underlined())?;

        if bucket.cards.is_empty() {
            writeln!(w, "  {}", style(EMPTY_BUCKET).dim())?;
        }

        for card in &bucket.cards {
            let mark = if card.completed { "[x]" } else { "[ ]" };
            let mut header = format!(
                "  {} {} {} ({})",
                mark,
                style(short(&card.id)).cyan(),
                card.title,
                card.note_type
            );
            if card.status.overdue {
                header.push_str(&format!(" {}", style("OVERDUE").red().bold()));
            }
            if card.status.reminder_active {
                header.push_str(&format!(" {}", style("REMINDER").yellow()));
            }

            if card.leaving {
                writeln!(w, "{}", style(header).dim().strikethrough())?;
            } else if card.completed {
                writeln!(w, "{}", style(header).dim())?;
            } else {
                writeln!(w, "{}", header)?;
            }

            if let Some(line) = content_line(&card.content) {
                let max = width.saturating_sub(6).max(20);
                writeln!(w, "      {}", content_preview(&line, max))?;
            }

            let mut dates = Vec::new();
            if let Some(due) = card.due_date {
                dates.push(format!("Due: {}", due.format("%Y-%m-%d")));
            }
            if let Some(reminder) = card.reminder_date {
                dates.push(format!("Reminder: {}", reminder.format("%Y-%m-%d")));
            }
            if !dates.is_empty() {
                writeln!(w, "      {}", dates.join("  "))?;
            }
        }
        writeln!(w)?;
    }

    writeln!(w, "{}", board.count_label())
}

pub fn write_post_list(w: &mut impl io::Write, cards: &[PostCard]) -> io::Result<()> {
    if cards.is_empty() {
        writeln!(w, "{}", style(EMPTY_POSTS).dim())?;
    }
    for card in cards {
        writeln!(
            w,
            "{}  {}  {}",
            style(short(&card.id)).cyan(),
            card.updated.format("%Y-%m-%d"),
            style(&card.title).bold()
        )?;
    }
    writeln!(w, "\n{}", pluralize(cards.len(), "post"))
}

/// Full view of a post: image, title, timestamps and text content.
pub fn write_post_detail(w: &mut impl io::Write, post: &BlogPost) -> io::Result<()> {
    let width = terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80);

    if let Some(image) = &post.featured_image {
        writeln!(w, "[image] {}", image)?;
    }
    writeln!(w, "{}", style(&post.title).bold())?;
    writeln!(
        w,
        "{}",
        style(format!(
            "Created: {} | Last Updated: {}",
            post.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            post.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ))
        .dim()
    )?;
    writeln!(w, "{}", "-".repeat(width.min(50)))?;
    writeln!(w, "{}", post.text_content().trim())
}

pub fn write_preview(w: &mut impl io::Write, preview: &Preview) -> io::Result<()> {
    if let Some(image) = &preview.featured_image {
        writeln!(w, "[image] {}", image)?;
    }
    writeln!(w, "{}", style(&preview.title).bold())?;
    writeln!(w, "{}", preview.body.trim())?;
    writeln!(
        w,
        "\n{} | {}",
        pluralize(preview.char_count, "character"),
        pluralize(preview.word_count, "word")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttachmentNote, MediaNote, TaskNote};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(content: &str, repetition: Repetition) -> NoteItem {
        NoteItem::new(NoteBody::Task(TaskNote {
            content: content.to_string(),
            due_date: None,
            reminder_date: None,
            repetition,
        }))
    }

    fn dated(due: Option<NaiveDate>, reminder: Option<NaiveDate>) -> NoteItem {
        NoteItem::new(NoteBody::Task(TaskNote {
            content: "dated".to_string(),
            due_date: due,
            reminder_date: reminder,
            repetition: Repetition::None,
        }))
    }

    fn attachment(file_type: &str) -> NoteItem {
        NoteItem::new(NoteBody::Attachment(AttachmentNote {
            title: "file".to_string(),
            file_name: "file.bin".to_string(),
            file_type: file_type.to_string(),
            content: format!("data:{};base64,AA==", file_type),
        }))
    }

    #[test]
    fn youtube_forms_share_an_id() {
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://m.youtube.com/watch?feature=share&v=abc").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn other_links_are_not_videos() {
        assert_eq!(youtube_video_id("https://vimeo.com/12345"), None);
        assert_eq!(youtube_video_id("https://www.youtube.com/watch"), None);
        assert_eq!(youtube_video_id("https://youtu.be/"), None);
        assert_eq!(youtube_video_id("not a url"), None);

        let item = NoteItem::new(NoteBody::Video(MediaNote {
            title: "clip".to_string(),
            content: "https://vimeo.com/12345".to_string(),
        }));
        assert_eq!(content_view(&item), ContentView::InvalidVideo);
    }

    #[test]
    fn due_today_is_not_overdue() {
        let today = day(2025, 6, 15);
        assert!(task_status(&dated(Some(day(2025, 6, 14)), None), today).overdue);
        assert!(!task_status(&dated(Some(today), None), today).overdue);
        assert!(!task_status(&dated(Some(day(2025, 6, 16)), None), today).overdue);
    }

    #[test]
    fn reminder_is_active_on_the_day() {
        let today = day(2025, 6, 15);
        assert!(task_status(&dated(None, Some(today)), today).reminder_active);
        assert!(task_status(&dated(None, Some(day(2025, 1, 1))), today).reminder_active);
        assert!(!task_status(&dated(None, Some(day(2025, 6, 16))), today).reminder_active);
    }

    #[test]
    fn attachments_branch_on_mime_prefix() {
        assert!(matches!(content_view(&attachment("image/png")), ContentView::Image { .. }));
        assert!(matches!(content_view(&attachment("video/mp4")), ContentView::VideoPlayer { .. }));
        assert!(matches!(content_view(&attachment("audio/ogg")), ContentView::AudioPlayer { .. }));
        assert_eq!(
            content_view(&attachment("application/pdf")),
            ContentView::Download {
                file_name: "file.bin".to_string()
            }
        );
    }

    #[test]
    fn buckets_are_exhaustive_and_disjoint() {
        let items = vec![
            task("a", Repetition::Daily),
            task("b", Repetition::None),
            NoteItem::new(NoteBody::Image(MediaNote {
                title: "pic".to_string(),
                content: "https://example.com/p.png".to_string(),
            })),
            task("c", Repetition::Daily),
            task("d", Repetition::Ongoing),
        ];
        let board = render_board(&items, day(2025, 1, 1), &HashSet::new());

        assert_eq!(board.buckets.len(), 5);
        let mut seen: Vec<Uuid> = board.cards().map(|c| c.id).collect();
        seen.sort();
        let mut expected: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        expected.sort();
        assert_eq!(seen, expected);

        let daily: Vec<&str> = board
            .bucket(Repetition::Daily)
            .cards
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(daily, vec!["a", "c"]);
        assert!(board.bucket(Repetition::Weekly).cards.is_empty());
        assert_eq!(board.count_label(), "2 items");
    }

    #[test]
    fn cards_carry_stored_positions() {
        let items = vec![
            task("a", Repetition::Weekly),
            task("b", Repetition::None),
            task("c", Repetition::Weekly),
        ];
        let board = render_board(&items, day(2025, 1, 1), &HashSet::new());
        for card in board.cards() {
            assert_eq!(items[card.position].id, card.id);
        }
    }

    #[test]
    fn board_writes_placeholders() {
        let board = render_board(&[], day(2025, 1, 1), &HashSet::new());
        let mut out = Vec::new();
        write_board(&mut out, &board).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(EMPTY_BUCKET).count(), 5);
        assert!(text.ends_with("0 items\n"));
    }
}
