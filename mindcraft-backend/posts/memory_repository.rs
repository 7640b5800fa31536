use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::repository::PostRepository;
use super::{NewPost, Post, PostPage, PostQuery};

/// Case-insensitive literal match against name or prompt.
fn matches(query: &PostQuery, post: &Post) -> bool {
    match &query.search {
        None => true,
        Some(needle) => {
            let needle = needle.to_lowercase();
            post.name.to_lowercase().contains(&needle)
                || post.prompt.to_lowercase().contains(&needle)
        }
    }
}

/// Process-local post storage, kept in insertion order.
#[derive(Default)]
pub struct MemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn list(&self, query: &PostQuery) -> Result<PostPage> {
        let posts = self.posts.read().await;
        let matching: Vec<&Post> = posts.iter().rev().filter(|p| matches(query, p)).collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(PostPage::new(page, total, query.limit))
    }

    async fn create(&self, post: NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: ObjectId::new().to_hex(),
            name: post.name,
            prompt: post.prompt,
            photo: post.photo,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.push(post.clone());
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(i: usize) -> NewPost {
        NewPost {
            name: format!("user{i}"),
            prompt: if i % 2 == 0 { format!("a fox #{i}") } else { format!("a cat #{i}") },
            photo: format!("https://storage.googleapis.com/b/images/{i}.jpg"),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let repo = MemoryPostRepository::new();
        let post = repo.create(new_post(1)).await.unwrap();
        assert_eq!(post.id.len(), 24);
        assert_eq!(post.created_at, post.updated_at);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paginated() {
        let repo = MemoryPostRepository::new();
        for i in 0..25 {
            repo.create(new_post(i)).await.unwrap();
        }

        let first = repo.list(&PostQuery::new(Some(1), Some(10), None)).await.unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.posts.len(), 10);
        assert_eq!(first.posts[0].name, "user24");

        let last = repo.list(&PostQuery::new(Some(3), Some(10), None)).await.unwrap();
        assert_eq!(last.posts.len(), 5);
        assert_eq!(last.posts[4].name, "user0");

        let beyond = repo.list(&PostQuery::new(Some(9), Some(10), None)).await.unwrap();
        assert!(beyond.posts.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[tokio::test]
    async fn test_search_matches_name_case_insensitive() {
        let repo = MemoryPostRepository::new();
        repo.create(NewPost {
            name: "Red Fox".into(),
            prompt: "forest at dawn".into(),
            photo: "https://example.com/a.jpg".into(),
        })
        .await
        .unwrap();

        let page = repo
            .list(&PostQuery::new(None, None, Some("FOX".into())))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        let none = repo
            .list(&PostQuery::new(None, None, Some("whale".into())))
            .await
            .unwrap();
        assert!(none.posts.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_search() {
        let repo = MemoryPostRepository::new();
        for i in 0..6 {
            repo.create(new_post(i)).await.unwrap();
        }

        let page = repo
            .list(&PostQuery::new(None, None, Some("Fox".into())))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.posts.iter().all(|p| p.prompt.contains("fox")));
    }
}
