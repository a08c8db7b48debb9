use crate::model::Id;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    #[serde(flatten)]
    pub content: PostContent,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostContent {
    pub title: String,
    pub contents: String,
}

/// A create or update request body.
///
/// Fields are passed through as given: an absent field is left out of the statement, so an
/// update keeps the stored value and an insert falls back to the column's constraints.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostFields {
    pub title: Option<String>,
    pub contents: Option<String>,
}
