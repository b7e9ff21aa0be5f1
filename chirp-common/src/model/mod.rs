pub mod follow;
pub mod like;
pub mod post;
pub mod session;
pub mod user;

use crate::model::{
    post::InvalidPostContentError,
    user::{InvalidDisplayNameError, InvalidEmailAddressError, InvalidUsernameError},
};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    EmailAddress(#[from] InvalidEmailAddressError),
    #[error(transparent)]
    DisplayName(#[from] InvalidDisplayNameError),
    #[error(transparent)]
    PostContent(#[from] InvalidPostContentError),
    #[error("author id is required")]
    MissingAuthor,
    #[error("user id is required")]
    MissingUser,
    #[error("post id is required")]
    MissingPost,
    #[error("follower id is required")]
    MissingFollower,
    #[error("followee id is required")]
    MissingFollowee,
    #[error("cannot follow yourself")]
    SelfFollow,
}

/// Store-assigned identifier, tagged with the entity it belongs to so a post
/// id cannot be passed where a user id is expected.
#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Id<Marker>(i64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }

    /// Whether the id can refer to a persisted record. The store never
    /// assigns zero or negative ids.
    #[must_use]
    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<i64> for Id<Marker> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for i64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}
