use crate::model::{Id, ModelValidationError, user::UserMarker};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct FollowMarker;

/// A follow edge between two users. Both ends are plain id references.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: Id<FollowMarker>,
    pub follower_id: Id<UserMarker>,
    pub followee_id: Id<UserMarker>,
    pub created_at: UtcDateTime,
}

/// A (follower, followee) pair is unique and may never be reflexive.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewFollow {
    pub follower: Id<UserMarker>,
    pub followee: Id<UserMarker>,
}

impl NewFollow {
    pub fn new(
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    ) -> Result<Self, ModelValidationError> {
        if !follower.is_assigned() {
            return Err(ModelValidationError::MissingFollower);
        }
        if !followee.is_assigned() {
            return Err(ModelValidationError::MissingFollowee);
        }
        if follower == followee {
            return Err(ModelValidationError::SelfFollow);
        }

        Ok(Self { follower, followee })
    }
}
