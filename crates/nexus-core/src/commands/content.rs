use tracing::{info, warn};

use nexus_shared::{Category, Severity};
use nexus_store::{Comment, Post};

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::events::EngineEvent;

impl Engine {
    pub fn create_post(&self, body: &str, images: Vec<String>, category: Category) -> Result<Post> {
        self.with_state(|inner, now| -> Result<Post> {
            let author = inner.actor()?;
            let post = inner
                .content
                .create_post(&author, body, images, category, now)?;
            inner.persist_posts();

            info!(post = %post.id, author = %author.id, %category, "post published");
            inner.notify("Post published successfully!", Severity::Success, now);
            inner.events.emit(EngineEvent::PostCreated {
                post_id: post.id.clone(),
            });
            Ok(post)
        })
    }

    pub fn add_comment(&self, post_id: &str, body: &str) -> Result<Comment> {
        self.with_state(|inner, now| -> Result<Comment> {
            let author = inner.actor()?;
            let comment = match inner.content.add_comment(&author, post_id, body, now) {
                Ok(c) => c,
                Err(e @ EngineError::RateLimited { .. }) => {
                    let secs = e.retry_after_secs().unwrap_or_default();
                    warn!(author = %author.id, post = post_id, secs, "comment throttled");
                    inner.notify(
                        &format!("Please wait {secs}s before commenting again."),
                        Severity::Warning,
                        now,
                    );
                    return Err(e);
                }
                Err(e) => return Err(e),
            };
            inner.persist_comments();
            inner.persist_posts();

            info!(comment = %comment.id, post = post_id, author = %author.id, "comment added");
            inner.notify("Comment added", Severity::Success, now);
            inner.events.emit(EngineEvent::CommentAdded {
                post_id: post_id.to_string(),
                comment_id: comment.id.clone(),
            });
            Ok(comment)
        })
    }

    /// Newest first.
    pub fn list_comments(&self, post_id: &str) -> Vec<Comment> {
        self.with_state(|inner, _| inner.content.list_comments(post_id))
    }

    /// Newest first.
    pub fn list_posts(&self, category: Category) -> Vec<Post> {
        self.with_state(|inner, _| inner.content.list_posts(category))
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.with_state(|inner, _| inner.content.post(id).cloned())
    }

    pub fn toggle_like(&self, post_id: &str) -> Result<Post> {
        self.with_state(|inner, _| -> Result<Post> {
            let actor = inner.actor()?;
            let post = inner.content.toggle_like(&actor.id, post_id)?;
            inner.persist_posts();
            Ok(post)
        })
    }
}
