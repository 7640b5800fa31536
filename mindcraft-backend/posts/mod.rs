#[cfg(test)]
pub mod memory_repository;
pub mod mongo_repository;
pub mod repository;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub prompt: String,
    /// Public URL of the uploaded image.
    pub photo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub name: String,
    pub prompt: String,
    pub photo: String,
}

/// A normalized listing request: 1-based page, bounded limit, optional search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
}

impl PostQuery {
    pub fn new(page: Option<u64>, limit: Option<u64>, search: Option<String>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            search: search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    /// Documents to skip, saturating and capped to what Mongo accepts.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

impl Default for PostQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
    pub total_pages: u64,
}

impl PostPage {
    pub fn new(posts: Vec<Post>, total: u64, limit: u64) -> Self {
        Self {
            posts,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}
