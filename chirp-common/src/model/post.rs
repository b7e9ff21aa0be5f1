use crate::model::{
    Id, ModelValidationError,
    user::{User, UserMarker},
};
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use thiserror::Error;
use time::UtcDateTime;

pub const POST_CONTENT_MAX_LEN: usize = 280;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// Post body, bounded to [`POST_CONTENT_MAX_LEN`] Unicode code points and
/// never blank after trimming.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostContent(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidPostContentError {
    #[error("content cannot be empty")]
    Empty,
    #[error("content exceeds {POST_CONTENT_MAX_LEN} characters")]
    TooLong,
}

impl PostContent {
    pub fn new(content: String) -> Result<Self, InvalidPostContentError> {
        if content.trim().is_empty() {
            Err(InvalidPostContentError::Empty)
        } else if content.chars().count() > POST_CONTENT_MAX_LEN {
            Err(InvalidPostContentError::TooLong)
        } else {
            Ok(Self(content))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostContent::new(inner).map_err(Error::custom)
    }
}

/// A post with its author loaded. Replies reference their parent by id only;
/// the reply tree is never materialized as an object graph.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub content: PostContent,
    pub parent_id: Option<Id<PostMarker>>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct NewPost {
    pub author: Id<UserMarker>,
    pub content: PostContent,
    pub parent: Option<Id<PostMarker>>,
}

impl NewPost {
    pub fn new(
        author: Id<UserMarker>,
        content: PostContent,
        parent: Option<Id<PostMarker>>,
    ) -> Result<Self, ModelValidationError> {
        if !author.is_assigned() {
            return Err(ModelValidationError::MissingAuthor);
        }

        Ok(Self {
            author,
            content,
            parent,
        })
    }
}
