use postbox_common::model::post::{Post, PostContent};
use sqlx::FromRow;

pub(crate) const POST_COLUMNS: &[&str] = &["id", "title", "contents"];

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub title: String,
    pub contents: String,
}

impl From<PostRecord> for Post {
    fn from(value: PostRecord) -> Self {
        Self {
            id: value.id.into(),
            content: PostContent {
                title: value.title,
                contents: value.contents,
            },
        }
    }
}
