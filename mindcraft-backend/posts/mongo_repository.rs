use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use super::repository::PostRepository;
use super::{NewPost, Post, PostPage, PostQuery};

const COLLECTION: &str = "posts";

/// Stored shape of a post, with BSON-native id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    prompt: String,
    photo: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Self {
        Post {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name,
            prompt: doc.prompt,
            photo: doc.photo,
            created_at: to_chrono(doc.created_at),
            updated_at: to_chrono(doc.updated_at),
        }
    }
}

/// Escape regex metacharacters so search text matches literally.
pub fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}/-".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn search_filter(query: &PostQuery) -> Document {
    match &query.search {
        None => doc! {},
        Some(search) => {
            let pattern = escape_regex(search);
            doc! {
                "$or": [
                    { "name": { "$regex": pattern.clone(), "$options": "i" } },
                    { "prompt": { "$regex": pattern.clone(), "$options": "i" } },
                ]
            }
        }
    }
}

pub struct MongoPostRepository {
    posts: Collection<PostDocument>,
}

impl MongoPostRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            posts: db.collection(COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder().keys(doc! { "createdAt": -1 }).build();
        self.posts
            .create_index(index, None)
            .await
            .context("failed to create posts index")?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn list(&self, query: &PostQuery) -> Result<PostPage> {
        let filter = search_filter(query);
        let total = self
            .posts
            .count_documents(filter.clone(), None)
            .await
            .context("failed to count posts")?;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(query.skip())
            .limit(query.limit as i64)
            .build();
        let docs: Vec<PostDocument> = self
            .posts
            .find(filter, options)
            .await
            .context("failed to query posts")?
            .try_collect()
            .await
            .context("failed to read posts")?;

        let posts = docs.into_iter().map(Post::from).collect();
        Ok(PostPage::new(posts, total, query.limit))
    }

    async fn create(&self, post: NewPost) -> Result<Post> {
        let now = bson::DateTime::now();
        let mut doc = PostDocument {
            id: None,
            name: post.name,
            prompt: post.prompt,
            photo: post.photo,
            created_at: now,
            updated_at: now,
        };

        let result = self
            .posts
            .insert_one(&doc, None)
            .await
            .context("failed to insert post")?;
        doc.id = result.inserted_id.as_object_id();

        tracing::info!(post_id = ?doc.id, "created post");
        Ok(doc.into())
    }
}
