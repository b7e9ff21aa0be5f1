use crate::model::{
    Id, ModelValidationError,
    post::{Post, PostMarker},
    user::{User, UserMarker},
};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LikeMarker;

/// A like with both ends of the edge loaded.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Id<LikeMarker>,
    pub user: User,
    pub post: Post,
    pub created_at: UtcDateTime,
}

/// A (user, post) pair may be liked at most once; the store's unique index
/// is the backstop for concurrent attempts.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewLike {
    pub user: Id<UserMarker>,
    pub post: Id<PostMarker>,
}

impl NewLike {
    pub fn new(user: Id<UserMarker>, post: Id<PostMarker>) -> Result<Self, ModelValidationError> {
        if !user.is_assigned() {
            return Err(ModelValidationError::MissingUser);
        }
        if !post.is_assigned() {
            return Err(ModelValidationError::MissingPost);
        }

        Ok(Self { user, post })
    }
}
