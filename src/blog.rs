//! The blog editor: posts, the compose form and the detail view.
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    helper::{html_to_text, word_count},
    render_post_list, resolve_id, Confirm, DeckError, Draft, DraftSlot, PostCard, Result,
    SlotBackend, Store, POSTS_SLOT,
};

/// A published post. `content` is HTML markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(title: String, content: String, featured_image: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            featured_image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Content with the markup stripped.
    pub fn text_content(&self) -> String {
        html_to_text(&self.content)
    }
}

/// The compose form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogForm {
    pub title: String,
    pub content: String,
    pub featured_image: String,
    /// Set while an existing post is being edited
    pub editing: Option<Uuid>,
}

impl BlogForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Snapshot persisted by the autosaver.
    pub fn to_draft(&self) -> Draft {
        Draft {
            title: self.title.clone(),
            content: self.content.clone(),
            featured_image: self.featured_image.clone(),
        }
    }

    pub fn apply_draft(&mut self, draft: Draft) {
        self.title = draft.title;
        self.content = draft.content;
        self.featured_image = draft.featured_image;
    }

    pub fn preview(&self) -> Preview {
        let text = html_to_text(&self.content);
        let title = self.title.trim();
        let image = self.featured_image.trim();
        Preview {
            title: if title.is_empty() {
                "Your Title Here".to_string()
            } else {
                title.to_string()
            },
            body: if self.content.is_empty() {
                "Your content will appear here...".to_string()
            } else {
                text.clone()
            },
            featured_image: (!image.is_empty()).then(|| image.to_string()),
            char_count: text.chars().count(),
            word_count: word_count(&text),
        }
    }
}

/// Form state shared with the autosaver.
pub type FormHandle = Arc<Mutex<BlogForm>>;

/// Live preview of the compose form.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub title: String,
    pub body: String,
    pub featured_image: Option<String>,
    pub char_count: usize,
    pub word_count: usize,
}

/// Visibility of the detail view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailView {
    #[default]
    Hidden,
    Visible(Uuid),
}

/// Outcome of a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Created(Uuid),
    Updated(Uuid),
}

/// Owned state of the blog widget.
pub struct BlogWidget {
    store: Store<BlogPost>,
    drafts: DraftSlot,
    posts: Vec<BlogPost>,
    form: FormHandle,
    view: DetailView,
    /// Whether the form holds the autosaved draft
    draft_attached: bool,
}

impl BlogWidget {
    /// Loads the posts and restores any saved draft into the form.
    pub fn open(backend: Arc<dyn SlotBackend>) -> Result<Self> {
        let store = Store::new(Arc::clone(&backend), POSTS_SLOT);
        let drafts = DraftSlot::new(backend);
        let posts = store.load()?;

        let mut form = BlogForm::default();
        if let Some(draft) = drafts.load()? {
            info!("Restored blog draft '{}'", draft.title);
            form.apply_draft(draft);
        }

        info!("Opened blog with {} posts", posts.len());
        Ok(Self {
            store,
            drafts,
            posts,
            form: Arc::new(Mutex::new(form)),
            view: DetailView::Hidden,
            draft_attached: true,
        })
    }

    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    pub fn drafts(&self) -> &DraftSlot {
        &self.drafts
    }

    pub fn form_handle(&self) -> FormHandle {
        Arc::clone(&self.form)
    }

    pub fn form(&self) -> Result<MutexGuard<'_, BlogForm>> {
        self.form.lock().map_err(|_| DeckError::ApplicationError {
            message: "Failed to acquire lock on blog form".to_string(),
        })
    }

    /// Empties the form without touching the saved draft.
    ///
    /// Later submits and clears leave the draft slot alone, so a post written
    /// outside the compose flow does not consume an unrelated draft.
    pub fn set_draft_aside(&mut self) -> Result<()> {
        self.form()?.reset();
        self.draft_attached = false;
        debug!("Draft set aside, form detached from the draft slot");
        Ok(())
    }

    pub fn detail_state(&self) -> DetailView {
        self.view
    }

    /// Resolves a full id or a unique id prefix.
    pub fn find(&self, id_or_prefix: &str) -> Result<&BlogPost> {
        let id = resolve_id(self.posts.iter().map(|post| post.id), id_or_prefix)?;
        self.get(id)
    }

    fn get(&self, id: Uuid) -> Result<&BlogPost> {
        self.posts
            .iter()
            .find(|post| post.id == id)
            .ok_or_else(|| DeckError::RecordNotFound { id: id.to_string() })
    }

    fn position_of(&self, id: Uuid) -> Result<usize> {
        self.posts
            .iter()
            .position(|post| post.id == id)
            .ok_or_else(|| DeckError::RecordNotFound { id: id.to_string() })
    }

    /// Persists `posts` and adopts them only once the write succeeded.
    fn commit(&mut self, posts: Vec<BlogPost>) -> Result<()> {
        self.store.save(&posts)?;
        self.posts = posts;
        Ok(())
    }

    /// Appends a new post, or updates the one being edited in place.
    ///
    /// Empty titles and empty content are rejected without touching storage.
    /// On success the form is reset and, unless it was set aside, the draft
    /// slot cleared.
    pub fn submit(&mut self) -> Result<Submitted> {
        let form = self.form()?.clone();

        let title = form.title.trim().to_string();
        if title.is_empty() {
            return Err(DeckError::MissingField {
                field: "title".to_string(),
            });
        }
        let content = form.content.trim();
        if content.is_empty() || content == "<br>" {
            return Err(DeckError::EmptyContent);
        }
        let content = form.content.clone();
        let image = form.featured_image.trim();
        let featured_image = (!image.is_empty()).then(|| image.to_string());

        let mut posts = self.posts.clone();
        let outcome = match form.editing {
            Some(id) => {
                let post = &mut posts[self.position_of(id)?];
                post.title = title;
                post.content = content;
                post.featured_image = featured_image;
                post.updated_at = Utc::now().max(post.created_at);
                Submitted::Updated(id)
            }
            None => {
                let post = BlogPost::new(title, content, featured_image);
                let id = post.id;
                posts.push(post);
                Submitted::Created(id)
            }
        };
        self.commit(posts)?;
        match outcome {
            Submitted::Created(id) => info!("Post {} created", id),
            Submitted::Updated(id) => info!("Post {} updated", id),
        }

        self.form()?.reset();
        if self.draft_attached {
            self.drafts.clear()?;
        }
        self.view = DetailView::Hidden;
        Ok(outcome)
    }

    /// Resets the form and erases the draft once confirmed.
    pub fn clear_form(&mut self, confirm: &dyn Confirm) -> Result<bool> {
        if !confirm.confirm("Clear the form? Any unsaved changes will be lost.") {
            debug!("Clear form cancelled");
            return Ok(false);
        }
        self.form()?.reset();
        if self.draft_attached {
            self.drafts.clear()?;
        }
        info!("Blog form cleared");
        Ok(true)
    }

    /// Shows the full post.
    pub fn view(&mut self, id: Uuid) -> Result<&BlogPost> {
        self.get(id)?;
        self.view = DetailView::Visible(id);
        self.get(id)
    }

    pub fn close(&mut self) {
        self.view = DetailView::Hidden;
    }

    /// Hides the view and loads the post into the form in editing mode.
    pub fn edit(&mut self, id: Uuid) -> Result<()> {
        let post = self.get(id)?.clone();
        {
            let mut form = self.form()?;
            form.title = post.title;
            form.content = post.content;
            form.featured_image = post.featured_image.unwrap_or_default();
            form.editing = Some(id);
        }
        self.view = DetailView::Hidden;
        debug!("Editing post {}", id);
        Ok(())
    }

    /// Removes the post once confirmed; returns whether it was removed.
    pub fn delete(&mut self, id: Uuid, confirm: &dyn Confirm) -> Result<bool> {
        let position = self.position_of(id)?;
        if !confirm.confirm(
            "Are you sure you want to delete this post? This action cannot be undone.",
        ) {
            debug!("Delete of post {} cancelled", id);
            return Ok(false);
        }

        let mut posts = self.posts.clone();
        posts.remove(position);
        self.commit(posts)?;
        self.view = DetailView::Hidden;

        let mut form = self.form()?;
        if form.editing == Some(id) {
            warn!("Post {} was open in the form; leaving editing mode", id);
            form.editing = None;
        }
        info!("Post {} deleted", id);
        Ok(true)
    }

    /// Posts newest first.
    pub fn render_list(&self) -> Vec<PostCard> {
        render_post_list(&self.posts)
    }

    pub fn preview(&self) -> Result<Preview> {
        Ok(self.form()?.preview())
    }
}
