//! Row shapes as they come out of the store, and their conversions into the
//! domain types. The credential and soft-delete columns are never selected,
//! so a record cannot leak them.

use chirp_common::model::follow::Follow;
use chirp_common::model::like::Like;
use chirp_common::model::post::{Post, PostContent};
use chirp_common::model::user::{DisplayName, EmailAddress, User, Username};
use sqlx::FromRow;
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Database had invalid entry")]
pub struct DbDataError;

fn timestamp(seconds: i64) -> Result<UtcDateTime, DbDataError> {
    UtcDateTime::from_unix_timestamp(seconds).map_err(|_| DbDataError)
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A post row joined with its author's columns.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub author_id: i64,
    pub author_username: String,
    pub author_email: String,
    pub author_display_name: String,
    pub author_bio: Option<String>,
    pub author_avatar: Option<String>,
    pub author_created_at: i64,
    pub author_updated_at: i64,
}

/// A like row joined with the liking user, the liked post, and that post's
/// author.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct LikeRecord {
    pub id: i64,
    pub created_at: i64,
    pub user_id: i64,
    pub user_username: String,
    pub user_email: String,
    pub user_display_name: String,
    pub user_bio: Option<String>,
    pub user_avatar: Option<String>,
    pub user_created_at: i64,
    pub user_updated_at: i64,
    pub post_id: i64,
    pub post_content: String,
    pub post_parent_id: Option<i64>,
    pub post_created_at: i64,
    pub post_updated_at: i64,
    pub author_id: i64,
    pub author_username: String,
    pub author_email: String,
    pub author_display_name: String,
    pub author_bio: Option<String>,
    pub author_avatar: Option<String>,
    pub author_created_at: i64,
    pub author_updated_at: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct FollowRecord {
    pub id: i64,
    pub follower_id: i64,
    pub followee_id: i64,
    pub created_at: i64,
}

impl TryFrom<FollowRecord> for Follow {
    type Error = DbDataError;

    fn try_from(value: FollowRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            follower_id: value.follower_id.into(),
            followee_id: value.followee_id.into(),
            created_at: timestamp(value.created_at)?,
        })
    }
}

impl TryFrom<UserRecord> for User {
    type Error = DbDataError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            username: Username::new(value.username).map_err(|_| DbDataError)?,
            email: EmailAddress::new(value.email).map_err(|_| DbDataError)?,
            name: DisplayName::new(value.display_name).map_err(|_| DbDataError)?,
            bio: value.bio,
            avatar: value.avatar,
            created_at: timestamp(value.created_at)?,
            updated_at: timestamp(value.updated_at)?,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = DbDataError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let author = User::try_from(UserRecord {
            id: value.author_id,
            username: value.author_username,
            email: value.author_email,
            display_name: value.author_display_name,
            bio: value.author_bio,
            avatar: value.author_avatar,
            created_at: value.author_created_at,
            updated_at: value.author_updated_at,
        })?;

        Ok(Self {
            id: value.id.into(),
            author,
            content: PostContent::new(value.content).map_err(|_| DbDataError)?,
            parent_id: value.parent_id.map(Into::into),
            created_at: timestamp(value.created_at)?,
            updated_at: timestamp(value.updated_at)?,
        })
    }
}

impl TryFrom<LikeRecord> for Like {
    type Error = DbDataError;

    fn try_from(value: LikeRecord) -> Result<Self, Self::Error> {
        let user = User::try_from(UserRecord {
            id: value.user_id,
            username: value.user_username,
            email: value.user_email,
            display_name: value.user_display_name,
            bio: value.user_bio,
            avatar: value.user_avatar,
            created_at: value.user_created_at,
            updated_at: value.user_updated_at,
        })?;

        let post = Post::try_from(PostRecord {
            id: value.post_id,
            content: value.post_content,
            parent_id: value.post_parent_id,
            created_at: value.post_created_at,
            updated_at: value.post_updated_at,
            author_id: value.author_id,
            author_username: value.author_username,
            author_email: value.author_email,
            author_display_name: value.author_display_name,
            author_bio: value.author_bio,
            author_avatar: value.author_avatar,
            author_created_at: value.author_created_at,
            author_updated_at: value.author_updated_at,
        })?;

        Ok(Self {
            id: value.id.into(),
            user,
            post,
            created_at: timestamp(value.created_at)?,
        })
    }
}
