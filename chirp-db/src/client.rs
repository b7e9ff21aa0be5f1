use crate::record::{DbDataError, FollowRecord, LikeRecord, PostRecord, UserRecord};
use crate::schema::{self, SqlFlavor};
use chirp_common::model::follow::{Follow, FollowMarker, NewFollow};
use chirp_common::model::like::{Like, LikeMarker, NewLike};
use chirp_common::model::post::{NewPost, Post, PostMarker};
use chirp_common::model::user::{NewUser, User, UserMarker, Username};
use chirp_common::model::Id;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::{AnyPool, query, query_as, query_scalar};
use std::sync::Once;
use thiserror::Error;
use time::UtcDateTime;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] DbDataError),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Maps a unique-index violation on insert to [`DbError::Conflict`]; any
/// other failure stays a storage error.
fn conflict_on_unique(what: &'static str) -> impl FnOnce(sqlx::Error) -> DbError {
    move |err| match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict(what),
        other => DbError::Sqlx(other),
    }
}

fn unix_now() -> i64 {
    UtcDateTime::now().unix_timestamp()
}

static INSTALL_DRIVERS: Once = Once::new();

#[derive(Debug)]
pub struct DbClient {
    pool: AnyPool,
    flavor: SqlFlavor,
}

impl DbClient {
    /// Connects to the store behind `url`: `postgres://` in production,
    /// `sqlite:` (including `sqlite::memory:`) in tests.
    pub async fn connect(url: &str) -> Result<Self> {
        INSTALL_DRIVERS.call_once(install_default_drivers);

        // An in-memory sqlite database exists per connection; more than one
        // connection in the pool would see different databases.
        let max_connections = if url.contains("memory") { 1 } else { 5 };

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let flavor = SqlFlavor::from_url(url);

        Ok(Self { pool, flavor })
    }

    pub async fn create_schema(&self) -> Result<()> {
        schema::create_schema(&self.pool, self.flavor).await?;
        Ok(())
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<Id<UserMarker>> {
        let now = unix_now();

        let id = query_scalar::<_, i64>(
            "
            INSERT INTO users (username, email, password_hash, display_name, bio,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(user.username.get())
        .bind(user.email.get())
        .bind(user.password.encode())
        .bind(user.name.get())
        .bind(user.bio.as_deref())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("username or email"))?;

        Ok(id.into())
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT id, username, email, display_name, bio, avatar, created_at, updated_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT id, username, email, display_name, bio, avatar, created_at, updated_at
            FROM users
            WHERE username = $1 AND deleted_at IS NULL
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let records = query_as::<_, UserRecord>(
            "
            SELECT id, username, email, display_name, bio, avatar, created_at, updated_at
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let users = records
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    /// Profile edit. Returns false when the user does not exist or is
    /// soft-deleted.
    pub async fn update_user_profile(
        &self,
        user_id: Id<UserMarker>,
        name: &str,
        bio: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<bool> {
        let result = query(
            "
            UPDATE users
            SET display_name = $1, bio = $2, avatar = $3, updated_at = $4
            WHERE id = $5 AND deleted_at IS NULL
            ",
        )
        .bind(name)
        .bind(bio)
        .bind(avatar)
        .bind(unix_now())
        .bind(user_id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the user deleted without removing the row. The user's posts,
    /// likes, and follow edges are left untouched.
    pub async fn soft_delete_user(&self, user_id: Id<UserMarker>) -> Result<bool> {
        let result = query("UPDATE users SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
            .bind(unix_now())
            .bind(user_id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Id<PostMarker>> {
        let now = unix_now();

        let id = query_scalar::<_, i64>(
            "
            INSERT INTO posts (content, author_id, parent_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(post.content.get())
        .bind(post.author.get())
        .bind(post.parent.map(Id::get))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.into())
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT p.id, p.content, p.parent_id, p.created_at, p.updated_at,
                u.id AS author_id, u.username AS author_username, u.email AS author_email,
                u.display_name AS author_display_name, u.bio AS author_bio,
                u.avatar AS author_avatar, u.created_at AS author_created_at,
                u.updated_at AS author_updated_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1 AND p.deleted_at IS NULL
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    /// All live posts, newest first, each with its author loaded.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(
            "
            SELECT p.id, p.content, p.parent_id, p.created_at, p.updated_at,
                u.id AS author_id, u.username AS author_username, u.email AS author_email,
                u.display_name AS author_display_name, u.bio AS author_bio,
                u.avatar AS author_avatar, u.created_at AS author_created_at,
                u.updated_at AS author_updated_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.deleted_at IS NULL
            ORDER BY p.created_at DESC, p.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    /// Marks the post deleted without removing the row. Existing likes on
    /// the post are deliberately left in place.
    pub async fn soft_delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("UPDATE posts SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
            .bind(unix_now())
            .bind(post_id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_like(&self, like: &NewLike) -> Result<Id<LikeMarker>> {
        let id = query_scalar::<_, i64>(
            "
            INSERT INTO likes (user_id, post_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(like.user.get())
        .bind(like.post.get())
        .bind(unix_now())
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("like"))?;

        Ok(id.into())
    }

    pub async fn fetch_like(&self, like_id: Id<LikeMarker>) -> Result<Option<Like>> {
        let record = query_as::<_, LikeRecord>(
            "
            SELECT l.id, l.created_at,
                u.id AS user_id, u.username AS user_username, u.email AS user_email,
                u.display_name AS user_display_name, u.bio AS user_bio,
                u.avatar AS user_avatar, u.created_at AS user_created_at,
                u.updated_at AS user_updated_at,
                p.id AS post_id, p.content AS post_content, p.parent_id AS post_parent_id,
                p.created_at AS post_created_at, p.updated_at AS post_updated_at,
                a.id AS author_id, a.username AS author_username, a.email AS author_email,
                a.display_name AS author_display_name, a.bio AS author_bio,
                a.avatar AS author_avatar, a.created_at AS author_created_at,
                a.updated_at AS author_updated_at
            FROM likes l
            JOIN users u ON u.id = l.user_id
            JOIN posts p ON p.id = l.post_id
            JOIN users a ON a.id = p.author_id
            WHERE l.id = $1
            ",
        )
        .bind(like_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let like = record.map(Like::try_from).transpose()?;
        Ok(like)
    }

    /// Removes the like edge for (user, post). Hard delete; returns false
    /// when there was nothing to remove.
    pub async fn delete_like(
        &self,
        user_id: Id<UserMarker>,
        post_id: Id<PostMarker>,
    ) -> Result<bool> {
        let result = query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id.get())
            .bind(post_id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_liked_by(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<bool> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM likes WHERE post_id = $1 AND user_id = $2",
        )
        .bind(post_id.get())
        .bind(user_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn create_follow(&self, follow: &NewFollow) -> Result<Id<FollowMarker>> {
        let id = query_scalar::<_, i64>(
            "
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(follow.follower.get())
        .bind(follow.followee.get())
        .bind(unix_now())
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("follow"))?;

        Ok(id.into())
    }

    pub async fn fetch_follow(&self, follow_id: Id<FollowMarker>) -> Result<Option<Follow>> {
        let record = query_as::<_, FollowRecord>(
            "
            SELECT id, follower_id, followee_id, created_at
            FROM follows
            WHERE id = $1
            ",
        )
        .bind(follow_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let follow = record.map(Follow::try_from).transpose()?;
        Ok(follow)
    }

    /// Removes the follow edge. Hard delete; returns false when there was
    /// nothing to remove.
    pub async fn delete_follow(
        &self,
        follower_id: Id<UserMarker>,
        followee_id: Id<UserMarker>,
    ) -> Result<bool> {
        let result = query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id.get())
            .bind(followee_id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn follower_count(&self, user_id: Id<UserMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn following_count(&self, user_id: Id<UserMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn post_count(&self, user_id: Id<UserMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn like_count(&self, post_id: Id<PostMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id.get())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn reply_count(&self, post_id: Id<PostMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE parent_id = $1 AND deleted_at IS NULL",
        )
        .bind(post_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
