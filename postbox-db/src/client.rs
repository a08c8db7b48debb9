use crate::{
    record::{POST_COLUMNS, PostRecord},
    statement::{Delete, Insert, Select, Update},
};
use async_trait::async_trait;
use postbox_common::model::{
    Id,
    post::{Post, PostFields, PostMarker},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;
use tracing::debug;

pub const POSTS_TABLE: &str = "posts";

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Table scoped access to stored posts.
///
/// Every method runs exactly one statement.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Inserts a post and returns the id the database assigned to it.
    ///
    /// Absent fields are left out of the insert, so the table's constraints decide about them.
    async fn create_post(&self, post: &PostFields) -> Result<Id<PostMarker>>;

    /// Overwrites the present fields and returns the number of updated rows.
    async fn update_post(&self, post_id: Id<PostMarker>, post: &PostFields) -> Result<u64>;

    /// Returns the number of deleted rows.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<u64>;
}

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PostStore for DbClient {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let records: Vec<PostRecord> = Select::from(POSTS_TABLE)
            .columns(POST_COLUMNS)
            .order_by("id")
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), "Listed posts");
        Ok(records.into_iter().map(Post::from).collect())
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record: Option<PostRecord> = Select::from(POSTS_TABLE)
            .columns(POST_COLUMNS)
            .filter("id", post_id.get())
            .fetch_first(&self.pool)
            .await?;

        Ok(record.map(Post::from))
    }

    async fn create_post(&self, post: &PostFields) -> Result<Id<PostMarker>> {
        let id = Insert::into(POSTS_TABLE)
            .value_opt("title", post.title.as_deref())
            .value_opt("contents", post.contents.as_deref())
            .returning("id")
            .fetch_returning_id(&self.pool)
            .await?;

        debug!(%id, "Created post");
        Ok(id.into())
    }

    async fn update_post(&self, post_id: Id<PostMarker>, post: &PostFields) -> Result<u64> {
        let rows = Update::table(POSTS_TABLE)
            .set_opt("title", post.title.as_deref())
            .set_opt("contents", post.contents.as_deref())
            .filter("id", post_id.get())
            .execute(&self.pool)
            .await?;

        debug!(%post_id, rows, "Updated post");
        Ok(rows)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<u64> {
        let rows = Delete::from(POSTS_TABLE)
            .filter("id", post_id.get())
            .execute(&self.pool)
            .await?;

        debug!(%post_id, rows, "Deleted post");
        Ok(rows)
    }
}
