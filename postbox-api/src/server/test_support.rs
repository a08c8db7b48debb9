use crate::server::{ServerState, routes};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use postbox_common::model::{
    Id,
    post::{Post, PostContent, PostFields, PostMarker},
};
use postbox_db::client::{DbError, PostStore, Result};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

pub fn app(store: Arc<dyn PostStore>) -> Router {
    routes().with_state(ServerState { posts: store })
}

/// Sends one request through the router and decodes the JSON body, if any.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = (!bytes.is_empty()).then(|| serde_json::from_slice(&bytes).unwrap());

    (status, json)
}

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, PostContent>,
    mutations: usize,
    concurrent_deletes: bool,
}

/// A post table kept in memory, with ids counting up from 1.
///
/// Like the real table, `title` and `contents` are `NOT NULL`.
#[derive(Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

fn not_null_violation(column: &str) -> DbError {
    DbError::Sqlx(sqlx::Error::Protocol(format!(
        "null value in column \"{column}\" violates not-null constraint"
    )))
}

impl MemoryStore {
    pub fn with_posts(posts: &[(&str, &str)]) -> Self {
        let mut table = Table::default();
        for (title, contents) in posts {
            table.last_id += 1;
            table.rows.insert(
                table.last_id,
                PostContent {
                    title: (*title).to_owned(),
                    contents: (*contents).to_owned(),
                },
            );
        }

        Self {
            table: Mutex::new(table),
        }
    }

    /// Makes another client delete the row right before every write.
    ///
    /// Created posts are gone before they can be read back, and updates and deletes find
    /// nothing to change.
    pub fn with_concurrent_deletes(self) -> Self {
        self.table.lock().unwrap().concurrent_deletes = true;
        self
    }

    pub fn row_count(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }

    /// Number of inserts, updates and deletes that changed a row.
    pub fn mutations(&self) -> usize {
        self.table.lock().unwrap().mutations
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let table = self.table.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .map(|(id, content)| Post {
                id: Id::new(*id),
                content: content.clone(),
            })
            .collect())
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.get(&post_id.get()).map(|content| Post {
            id: post_id,
            content: content.clone(),
        }))
    }

    async fn create_post(&self, post: &PostFields) -> Result<Id<PostMarker>> {
        let title = post.title.clone().ok_or_else(|| not_null_violation("title"))?;
        let contents = post
            .contents
            .clone()
            .ok_or_else(|| not_null_violation("contents"))?;

        let mut table = self.table.lock().unwrap();
        table.last_id += 1;
        let id = table.last_id;
        table.mutations += 1;
        if !table.concurrent_deletes {
            table.rows.insert(id, PostContent { title, contents });
        }
        Ok(Id::new(id))
    }

    async fn update_post(&self, post_id: Id<PostMarker>, post: &PostFields) -> Result<u64> {
        if post.title.is_none() && post.contents.is_none() {
            return Ok(0);
        }

        let mut table = self.table.lock().unwrap();
        if table.concurrent_deletes {
            table.rows.remove(&post_id.get());
        }
        let Some(row) = table.rows.get_mut(&post_id.get()) else {
            return Ok(0);
        };
        if let Some(title) = &post.title {
            row.title.clone_from(title);
        }
        if let Some(contents) = &post.contents {
            row.contents.clone_from(contents);
        }
        table.mutations += 1;
        Ok(1)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<u64> {
        let mut table = self.table.lock().unwrap();
        if table.concurrent_deletes {
            table.rows.remove(&post_id.get());
        }
        if table.rows.remove(&post_id.get()).is_none() {
            return Ok(0);
        }
        table.mutations += 1;
        Ok(1)
    }
}

/// A store whose database is never reachable.
pub struct FailingStore;

fn unreachable_database() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl PostStore for FailingStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        Err(unreachable_database())
    }

    async fn fetch_post(&self, _post_id: Id<PostMarker>) -> Result<Option<Post>> {
        Err(unreachable_database())
    }

    async fn create_post(&self, _post: &PostFields) -> Result<Id<PostMarker>> {
        Err(unreachable_database())
    }

    async fn update_post(&self, _post_id: Id<PostMarker>, _post: &PostFields) -> Result<u64> {
        Err(unreachable_database())
    }

    async fn delete_post(&self, _post_id: Id<PostMarker>) -> Result<u64> {
        Err(unreachable_database())
    }
}
