use crate::server::{Result, ServerError, ServerRouter, existing::ExistingPost, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use postbox_common::model::{
    Id,
    post::{Post, PostFields, PostMarker},
};
use postbox_db::client::PostStore;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
pub(in crate::server) struct PostPath {
    pub id: Id<PostMarker>,
}

async fn list_posts(
    PostsPath(): PostsPath,
    State(db): State<Arc<dyn PostStore>>,
) -> Result<Json<Vec<Post>>> {
    let posts = db.list_posts().await?;

    Ok(Json(posts))
}

async fn get_post(_: PostPath, ExistingPost(post): ExistingPost) -> Result<Json<Post>> {
    Ok(Json(post))
}

async fn create_post(
    PostsPath(): PostsPath,
    State(db): State<Arc<dyn PostStore>>,
    Json(fields): Json<PostFields>,
) -> Result<Json<Post>> {
    let id = db.create_post(&fields).await?;

    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::CreatedPostMissing(id))?;

    Ok(Json(post))
}

async fn update_post(
    PostPath { id }: PostPath,
    _: ExistingPost,
    State(db): State<Arc<dyn PostStore>>,
    Json(fields): Json<PostFields>,
) -> Result<Json<Post>> {
    db.update_post(id, &fields).await?;

    // Deleted concurrently between the write and the read.
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn delete_post(
    PostPath { id }: PostPath,
    _: ExistingPost,
    State(db): State<Arc<dyn PostStore>>,
) -> Result<StatusCode> {
    // Zero rows means a concurrent delete got there first.
    if db.delete_post(id).await? == 0 {
        return Err(ServerError::PostByIdNotFound(id));
    }

    Ok(StatusCode::NO_CONTENT)
}
