use std::{
    io::{stdin, stdout, Write},
    path::Path,
};

use chrono::NaiveDate;
use log::debug;
use pulldown_cmark::{html, Parser};
use uuid::Uuid;

use crate::{DeckError, Result};

/// Gate in front of every destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Asks on the terminal, accepting `y`/`yes`. `force` skips the question.
pub struct TerminalConfirm {
    pub force: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.force {
            return true;
        }

        print!("{} [y/N]: ", prompt);
        if stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        if stdin().read_line(&mut input).is_err() {
            return false;
        }

        let input = input.trim().to_lowercase();
        input == "y" || input == "yes"
    }
}

/// Parses an optional `YYYY-MM-DD` argument; blank input means no date.
pub fn parse_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| DeckError::InvalidDate {
                input: text.to_string(),
            }),
    }
}

/// Trims an optional input, mapping blank strings to `None`.
pub fn non_empty(input: Option<String>) -> Option<String> {
    input
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Renders Markdown into the HTML markup stored in blog posts.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Strips markup tags and decodes the common entities.
pub fn html_to_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Number of whitespace separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First non-empty line, cut to `max_len` characters.
pub fn content_preview(content: &str, max_len: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

/// Guesses a MIME type from the file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    };
    debug!("Guessed MIME type {} for {}", mime, path.display());
    mime
}

/// Matches a full id or a unique prefix of its simple (hyphen-free) form.
pub fn resolve_id(ids: impl IntoIterator<Item = Uuid>, input: &str) -> Result<Uuid> {
    let needle = input.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(DeckError::RecordNotFound {
            id: input.to_string(),
        });
    }

    let mut matches = ids
        .into_iter()
        .filter(|id| id.simple().to_string().starts_with(&needle));

    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (Some(_), Some(_)) => Err(DeckError::AmbiguousId {
            prefix: input.to_string(),
        }),
        (None, _) => Err(DeckError::RecordNotFound {
            id: input.to_string(),
        }),
    }
}

/// "1 item", "3 items".
pub fn pluralize(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_or_fail_loudly() {
        assert_eq!(parse_date(None).unwrap(), None);
        assert_eq!(parse_date(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_date(Some("2025-02-28")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
        assert!(matches!(
            parse_date(Some("28/02/2025")),
            Err(DeckError::InvalidDate { .. })
        ));
    }

    #[test]
    fn markup_is_stripped_for_counting() {
        let text = html_to_text("<p>Hello <b>big</b>&nbsp;world</p><br>");
        assert_eq!(text, "Hello big world");
        assert_eq!(word_count(&text), 3);
    }

    #[test]
    fn markdown_becomes_markup() {
        assert_eq!(markdown_to_html("**hi**"), "<p><strong>hi</strong></p>\n");
    }

    #[test]
    fn previews_are_cut() {
        assert_eq!(content_preview("\n\n  first line  \nsecond", 50), "first line");
        assert_eq!(content_preview("abcdef", 3), "abc...");
    }

    #[test]
    fn mime_guess() {
        assert_eq!(mime_from_path(Path::new("a/b/Photo.JPG")), "image/jpeg");
        assert_eq!(mime_from_path(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(mime_from_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn ids_resolve_by_prefix() {
        let a = Uuid::parse_str("aaaa1111-0000-4000-8000-000000000000").unwrap();
        let b = Uuid::parse_str("aaaa2222-0000-4000-8000-000000000000").unwrap();

        assert_eq!(resolve_id([a, b], "aaaa1").unwrap(), a);
        assert_eq!(resolve_id([a, b], &b.to_string()).unwrap(), b);
        assert!(matches!(resolve_id([a, b], "aaaa"), Err(DeckError::AmbiguousId { .. })));
        assert!(matches!(resolve_id([a, b], "bbbb"), Err(DeckError::RecordNotFound { .. })));
        assert!(resolve_id([a, b], "").is_err());
    }

    #[test]
    fn closures_confirm() {
        let yes = |_: &str| true;
        assert!(yes.confirm("sure?"));
        assert!(TerminalConfirm { force: true }.confirm("sure?"));
        assert_eq!(pluralize(1, "post"), "1 post");
        assert_eq!(pluralize(0, "item"), "0 items");
    }
}
