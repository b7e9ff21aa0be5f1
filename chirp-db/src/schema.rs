//! Table and index bootstrap. Run once at startup; every statement is
//! `IF NOT EXISTS` so an already-migrated database is left untouched.
//!
//! The unique indexes are the storage-layer backstop for the model
//! invariants: usernames and emails are unique across all users (including
//! soft-deleted ones), a (user, post) pair holds at most one like, and a
//! (follower, followee) pair at most one follow edge.

use sqlx::AnyPool;

/// The two SQL dialects the client runs against. Only the auto-assigned
/// primary key column differs.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SqlFlavor {
    Postgres,
    Sqlite,
}

impl SqlFlavor {
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite") {
            Self::Sqlite
        } else {
            Self::Postgres
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            Self::Postgres => "BIGSERIAL PRIMARY KEY",
            Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }
}

pub async fn create_schema(pool: &AnyPool, flavor: SqlFlavor) -> Result<(), sqlx::Error> {
    let id = flavor.id_column();

    let statements = [
        format!(
            "
            CREATE TABLE IF NOT EXISTS users (
                id {id},
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                display_name TEXT NOT NULL,
                bio TEXT,
                avatar TEXT,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                deleted_at BIGINT
            )
            "
        ),
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username)".to_owned(),
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)".to_owned(),
        format!(
            "
            CREATE TABLE IF NOT EXISTS posts (
                id {id},
                content TEXT NOT NULL,
                author_id BIGINT NOT NULL REFERENCES users (id),
                parent_id BIGINT REFERENCES posts (id),
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                deleted_at BIGINT
            )
            "
        ),
        "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts (author_id)".to_owned(),
        "CREATE INDEX IF NOT EXISTS idx_posts_parent ON posts (parent_id)".to_owned(),
        format!(
            "
            CREATE TABLE IF NOT EXISTS likes (
                id {id},
                user_id BIGINT NOT NULL REFERENCES users (id),
                post_id BIGINT NOT NULL REFERENCES posts (id),
                created_at BIGINT NOT NULL
            )
            "
        ),
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_user_post ON likes (user_id, post_id)".to_owned(),
        format!(
            "
            CREATE TABLE IF NOT EXISTS follows (
                id {id},
                follower_id BIGINT NOT NULL REFERENCES users (id),
                followee_id BIGINT NOT NULL REFERENCES users (id),
                created_at BIGINT NOT NULL
            )
            "
        ),
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_follower_followee \
            ON follows (follower_id, followee_id)"
            .to_owned(),
    ];

    for statement in statements {
        sqlx::query(&statement).execute(pool).await?;
    }

    Ok(())
}
