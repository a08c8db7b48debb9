use crate::server::{ServerError, routes::posts::PostPath};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use postbox_common::model::post::Post;
use postbox_db::client::PostStore;
use std::sync::Arc;

/// The post named by the request path.
///
/// Extracting this rejects with [`ServerError::PostByIdNotFound`] before the handler runs if
/// no post has that id, so handlers taking it never see an unknown id.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ExistingPost(pub Post);

impl<S> FromRequestParts<S> for ExistingPost
where
    Arc<dyn PostStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let PostPath { id } = PostPath::from_request_parts(parts, state).await?;

        let post = Arc::<dyn PostStore>::from_ref(state)
            .fetch_post(id)
            .await?
            .ok_or(ServerError::PostByIdNotFound(id))?;

        Ok(Self(post))
    }
}
