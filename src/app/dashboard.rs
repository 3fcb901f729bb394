//! "My posts" page: the author's own posts, with inline editing and
//! confirmed deletes.
//!
//! At most one post is being edited at a time. Starting an edit on another
//! post throws the current buffer away.

use time::OffsetDateTime;

use crate::api::{ActionError, ApiError, PostDraft};
use crate::posts::{normalize, normalize_all, Post, PostId, PostList, PostRecord};

use super::forms::PostForm;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this post?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostMode {
    Viewing,
    Editing,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    pub post_id: PostId,
    pub form: PostForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub post_id: PostId,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    posts: PostList,
    pub loading: bool,
    pub selected: usize,
    edit: Option<EditSession>,
    confirm: Option<PendingDelete>,
    deleting: Option<PostId>,
}

impl DashboardState {
    pub fn posts(&self) -> &PostList {
        &self.posts
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts.get_index(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.posts.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.posts.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Replaces the list with a fresh fetch, sorted newest update first.
    pub fn apply_loaded(
        &mut self,
        result: Result<Vec<PostRecord>, ApiError>,
        now: OffsetDateTime,
    ) -> Result<(), ApiError> {
        self.loading = false;
        let records = result?;
        let mut posts = normalize_all(records, now);
        crate::posts::sort_by_recent_update(&mut posts);
        self.posts.replace_all(posts);
        if let Some(edit) = &self.edit {
            if self.posts.get(&edit.post_id).is_none() {
                tracing::debug!(post = %edit.post_id, "edited post vanished after reload");
                self.edit = None;
            }
        }
        self.move_selection(0);
        Ok(())
    }

    pub fn mode_of(&self, id: &PostId) -> PostMode {
        match &self.edit {
            Some(edit) if &edit.post_id == id => PostMode::Editing,
            _ => PostMode::Viewing,
        }
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn edit_session_mut(&mut self) -> Option<&mut EditSession> {
        self.edit.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Opens an edit buffer seeded from the post. Returns the id of a
    /// different post whose unsaved buffer was dropped, if any.
    pub fn begin_edit(&mut self, id: &PostId) -> Option<PostId> {
        let post = self.posts.get(id)?;
        let form = PostForm::from_post(&post.title, &post.content);
        let previous = self.edit.replace(EditSession {
            post_id: id.clone(),
            form,
        });
        previous
            .map(|session| session.post_id)
            .filter(|previous_id| previous_id != id)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.edit.take().is_some()
    }

    /// Validates the open buffer and marks it as saving.
    pub fn save_request(&mut self) -> Option<Result<(PostId, PostDraft), ActionError>> {
        let edit = self.edit.as_mut()?;
        if edit.form.submitting {
            return None;
        }
        Some(edit.form.edit_draft().map(|draft| {
            edit.form.submitting = true;
            (edit.post_id.clone(), draft)
        }))
    }

    /// Success swaps the server's version into place and closes the buffer.
    /// Failure keeps the buffer so nothing typed is lost.
    pub fn apply_saved(
        &mut self,
        id: &PostId,
        result: Result<PostRecord, ApiError>,
        now: OffsetDateTime,
    ) -> Result<(), ApiError> {
        let open_for_id = self.edit.as_ref().is_some_and(|edit| &edit.post_id == id);
        match result {
            Ok(record) => {
                let mut post = normalize(record, now);
                post.id = id.clone();
                if !self.posts.replace(post) {
                    tracing::warn!(post = %id, "saved post is no longer listed");
                }
                if open_for_id {
                    self.edit = None;
                }
                Ok(())
            }
            Err(err) => {
                if let Some(edit) = self.edit.as_mut().filter(|_| open_for_id) {
                    edit.form.submitting = false;
                }
                Err(err)
            }
        }
    }

    pub fn request_delete(&mut self) -> bool {
        if self.deleting.is_some() {
            return false;
        }
        let Some(post) = self.selected_post() else {
            return false;
        };
        self.confirm = Some(PendingDelete {
            post_id: post.id.clone(),
            title: post.title.clone(),
        });
        true
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.confirm.as_ref()
    }

    pub fn cancel_delete(&mut self) -> bool {
        self.confirm.take().is_some()
    }

    /// Closes the prompt and returns the id to delete.
    pub fn confirm_delete(&mut self) -> Option<PostId> {
        let pending = self.confirm.take()?;
        self.deleting = Some(pending.post_id.clone());
        Some(pending.post_id)
    }

    pub fn is_deleting(&self, id: &PostId) -> bool {
        self.deleting.as_ref() == Some(id)
    }

    /// The list is never touched here; on success the caller re-fetches.
    pub fn apply_deleted(&mut self, id: &PostId, result: Result<(), ApiError>) -> Result<(), ApiError> {
        if self.deleting.as_ref() == Some(id) {
            self.deleting = None;
        }
        result?;
        if self.edit.as_ref().is_some_and(|edit| &edit.post_id == id) {
            self.edit = None;
        }
        Ok(())
    }
}

pub fn count_badge(count: usize) -> String {
    if count == 1 {
        "1 post".to_string()
    } else {
        format!("{count} posts")
    }
}
