//! Posts, comments, and the per-author comment throttle.

use chrono::{DateTime, Utc};

use nexus_shared::{new_id, Category, Role};
use nexus_store::{Comment, Post, User};

use crate::error::{EngineError, Result};
use crate::rate_limit::CommentThrottle;

#[derive(Debug, Default)]
pub struct ContentStore {
    /// Newest first.
    posts: Vec<Post>,
    /// Insertion order.
    comments: Vec<Comment>,
    throttle: CommentThrottle,
}

impl ContentStore {
    /// Build the store from snapshots. Comment counters are recomputed from
    /// the comments actually present.
    pub fn new(mut posts: Vec<Post>, comments: Vec<Comment>) -> Self {
        for post in &mut posts {
            post.comments_count = comments.iter().filter(|c| c.post_id == post.id).count() as u64;
        }
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            posts,
            comments,
            throttle: CommentThrottle::default(),
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn create_post(
        &mut self,
        author: &User,
        body: &str,
        images: Vec<String>,
        category: Category,
        now: DateTime<Utc>,
    ) -> Result<Post> {
        if category == Category::Announcement && author.role != Role::Admin {
            return Err(EngineError::InvalidOperation(
                "only administrators can publish announcements".into(),
            ));
        }
        if body.trim().is_empty() && images.is_empty() {
            return Err(EngineError::InvalidOperation("post is empty".into()));
        }

        let post = Post {
            id: new_id(),
            author_id: author.id.clone(),
            body: body.to_string(),
            images,
            likes: 0,
            liked_by: Default::default(),
            created_at: now,
            category,
            author: author.snapshot(),
            comments_count: 0,
        };
        self.posts.insert(0, post.clone());
        Ok(post)
    }

    pub fn add_comment(
        &mut self,
        author: &User,
        post_id: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let post = self
            .post(post_id)
            .ok_or_else(|| EngineError::NotFound(format!("post {post_id}")))?;
        if !post.category.allows_comments() {
            return Err(EngineError::CommentsDisabled);
        }
        if body.trim().is_empty() {
            return Err(EngineError::InvalidOperation("comment is empty".into()));
        }
        self.throttle
            .check(&author.id, now)
            .map_err(|retry_after| EngineError::RateLimited { retry_after })?;

        let comment = Comment {
            id: new_id(),
            post_id: post_id.to_string(),
            author_id: author.id.clone(),
            body: body.to_string(),
            created_at: now,
            author: author.snapshot(),
        };
        self.comments.push(comment.clone());
        self.throttle.record(&author.id, now);
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.comments_count += 1;
        }
        Ok(comment)
    }

    /// Newest first; equal timestamps list the later insertion first.
    pub fn list_comments(&self, post_id: &str) -> Vec<Comment> {
        let mut out: Vec<Comment> = self
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn list_posts(&self, category: Category) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    /// Like or unlike `post_id` on behalf of `user_id`.
    pub fn toggle_like(&mut self, user_id: &str, post_id: &str) -> Result<Post> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| EngineError::NotFound(format!("post {post_id}")))?;

        if post.liked_by.remove(user_id) {
            post.likes = post.likes.saturating_sub(1);
        } else {
            post.liked_by.insert(user_id.to_string());
            post.likes += 1;
        }
        Ok(post.clone())
    }
}
