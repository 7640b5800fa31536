use anyhow::Result;
use async_trait::async_trait;

use super::{NewPost, Post, PostPage, PostQuery};

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest posts first, filtered and paginated per `query`.
    async fn list(&self, query: &PostQuery) -> Result<PostPage>;
    async fn create(&self, post: NewPost) -> Result<Post>;
}
