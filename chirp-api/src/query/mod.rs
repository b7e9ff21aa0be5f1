//! The query dispatcher. One request envelope in, one response envelope out;
//! no state is carried between requests. Callers name an operation in the
//! selector text and pass arguments through the `variables` bag; the reply
//! carries exactly one of `data` or `errors`.

use chirp_common::credential::{PasswordHash, PasswordHashError};
use chirp_common::model::like::NewLike;
use chirp_common::model::post::{NewPost, PostContent, PostMarker};
use chirp_common::model::session::SessionToken;
use chirp_common::model::user::{DisplayName, EmailAddress, NewUser, User, Username};
use chirp_common::model::{Id, ModelValidationError};
use chirp_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorMessage>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl QueryResponse {
    fn data(key: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(key.to_owned(), value);

        Self {
            data: Some(Value::Object(data)),
            errors: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            data: None,
            errors: Some(vec![ErrorMessage { message }]),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Operation {
    ListUsers,
    Register,
    CreatePost,
    ListPosts,
    UnlikePost,
    LikePost,
}

/// Resolution table, walked in order; the first entry whose marker word
/// appears in the selector (with the matching mutation-ness) wins. The order
/// is observable when a selector names several operations: `unlikePost` sits
/// before `likePost`.
const OPERATION_MARKERS: [(&str, bool, Operation); 6] = [
    ("users", false, Operation::ListUsers),
    ("register", true, Operation::Register),
    ("createPost", true, Operation::CreatePost),
    ("posts", false, Operation::ListPosts),
    ("unlikePost", true, Operation::UnlikePost),
    ("likePost", true, Operation::LikePost),
];

impl Operation {
    /// Matches whole identifier words rather than raw substrings, so one
    /// operation name embedded in another (`likePost` inside `unlikePost`)
    /// cannot hijack the route.
    #[must_use]
    pub fn resolve(selector: &str) -> Option<Self> {
        let words: Vec<&str> = selector
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|word| !word.is_empty())
            .collect();
        let is_mutation = words.contains(&"mutation");

        OPERATION_MARKERS
            .iter()
            .find(|(marker, mutation, _)| *mutation == is_mutation && words.contains(marker))
            .map(|(_, _, operation)| *operation)
    }
}

#[derive(Debug, Error)]
pub enum ExecuteError {
    /// No operation marker matched the selector.
    #[error("Operation not implemented")]
    UnknownOperation,
    /// The variables bag was missing or structurally wrong for the matched
    /// operation.
    #[error("Invalid input format: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Credential(#[from] PasswordHashError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("Response could not be serialized: {0}")]
    SerializeResponse(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Storage(DbError),
}

impl From<DbError> for ExecuteError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(what) => Self::Conflict(what),
            other => Self::Storage(other),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct RegisterInput {
    username: String,
    email: String,
    password: String,
    name: String,
    #[serde(default)]
    bio: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct CreatePostInput {
    content: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikePostInput {
    post_id: i64,
}

/// Acting user for mutations that need a caller: the user with id 1, created
/// as a placeholder account when no user has that id yet. A stand-in for
/// authentication, not identity.
pub const FALLBACK_ACTOR_ID: i64 = 1;

const FALLBACK_USERNAME: &str = "default_user";
const FALLBACK_EMAIL: &str = "default@example.com";
const FALLBACK_NAME: &str = "Default User";
const FALLBACK_PASSWORD: &str = "password";

#[derive(Clone, Debug)]
pub struct QueryExecutor {
    db: Arc<DbClient>,
}

impl QueryExecutor {
    #[must_use]
    pub fn new(db: Arc<DbClient>) -> Self {
        Self { db }
    }

    /// Runs one request to completion. Every failure is folded into the
    /// envelope as a single-element error list; there is no partial success.
    pub async fn execute(&self, request: &QueryRequest) -> QueryResponse {
        match self.dispatch(request).await {
            Ok((key, value)) => QueryResponse::data(key, value),
            Err(err) => QueryResponse::error(err.to_string()),
        }
    }

    async fn dispatch(
        &self,
        request: &QueryRequest,
    ) -> Result<(&'static str, Value), ExecuteError> {
        let operation =
            Operation::resolve(&request.query).ok_or(ExecuteError::UnknownOperation)?;
        debug!(?operation, "Dispatching query");

        match operation {
            Operation::ListUsers => self.list_users().await,
            Operation::Register => self.register(&request.variables).await,
            Operation::CreatePost => self.create_post(&request.variables).await,
            Operation::ListPosts => self.list_posts().await,
            Operation::UnlikePost => self.unlike_post(&request.variables).await,
            Operation::LikePost => self.like_post(&request.variables).await,
        }
    }

    fn input<T: DeserializeOwned>(variables: &Map<String, Value>) -> Result<T, ExecuteError> {
        let input = variables.get("input").ok_or_else(|| {
            ExecuteError::InvalidInput("an \"input\" object is required".to_owned())
        })?;

        serde_json::from_value(input.clone())
            .map_err(|err| ExecuteError::InvalidInput(err.to_string()))
    }

    async fn list_users(&self) -> Result<(&'static str, Value), ExecuteError> {
        let users = self.db.list_users().await?;

        Ok(("users", serde_json::to_value(users)?))
    }

    async fn register(
        &self,
        variables: &Map<String, Value>,
    ) -> Result<(&'static str, Value), ExecuteError> {
        let input: RegisterInput = Self::input(variables)?;

        let username = Username::new(input.username).map_err(ModelValidationError::from)?;
        let email = EmailAddress::new(input.email).map_err(ModelValidationError::from)?;
        let name = DisplayName::new(input.name).map_err(ModelValidationError::from)?;
        let password = PasswordHash::new(&input.password)?;

        let user_id = self
            .db
            .create_user(&NewUser {
                username,
                email,
                password,
                name,
                bio: input.bio,
            })
            .await?;
        let user = self
            .db
            .fetch_user(user_id)
            .await?
            .ok_or(ExecuteError::NotFound("user"))?;
        let token = SessionToken::generate_random(user_id);

        let mut payload = Map::new();
        payload.insert("token".to_owned(), Value::String(token.as_token_str()));
        payload.insert("user".to_owned(), serde_json::to_value(user)?);

        Ok(("register", Value::Object(payload)))
    }

    async fn create_post(
        &self,
        variables: &Map<String, Value>,
    ) -> Result<(&'static str, Value), ExecuteError> {
        let input: CreatePostInput = Self::input(variables)?;
        let content = PostContent::new(input.content).map_err(ModelValidationError::from)?;

        let author = self.ensure_fallback_actor().await?;
        let new_post = NewPost::new(author.id, content, None)?;

        let post_id = self.db.create_post(&new_post).await?;
        let post = self
            .db
            .fetch_post(post_id)
            .await?
            .ok_or(ExecuteError::NotFound("post"))?;

        Ok(("createPost", serde_json::to_value(post)?))
    }

    async fn list_posts(&self) -> Result<(&'static str, Value), ExecuteError> {
        let posts = self.db.list_posts().await?;

        Ok(("posts", serde_json::to_value(posts)?))
    }

    async fn like_post(
        &self,
        variables: &Map<String, Value>,
    ) -> Result<(&'static str, Value), ExecuteError> {
        let input: LikePostInput = Self::input(variables)?;
        let post_id = Id::<PostMarker>::new(input.post_id);

        let user = self.ensure_fallback_actor().await?;
        let new_like = NewLike::new(user.id, post_id)?;

        if self.db.fetch_post(post_id).await?.is_none() {
            return Err(ExecuteError::NotFound("post"));
        }

        let like_id = self.db.create_like(&new_like).await?;
        let like = self
            .db
            .fetch_like(like_id)
            .await?
            .ok_or(ExecuteError::NotFound("like"))?;

        Ok(("likePost", serde_json::to_value(like)?))
    }

    async fn unlike_post(
        &self,
        variables: &Map<String, Value>,
    ) -> Result<(&'static str, Value), ExecuteError> {
        let input: LikePostInput = Self::input(variables)?;
        let post_id = Id::<PostMarker>::new(input.post_id);

        let user = self.ensure_fallback_actor().await?;
        let like = NewLike::new(user.id, post_id)?;

        if self.db.delete_like(like.user, like.post).await? {
            Ok(("unlikePost", Value::Bool(true)))
        } else {
            Err(ExecuteError::NotFound("like"))
        }
    }

    async fn ensure_fallback_actor(&self) -> Result<User, ExecuteError> {
        let id = Id::new(FALLBACK_ACTOR_ID);
        if let Some(user) = self.db.fetch_user(id).await? {
            return Ok(user);
        }

        let new_user = NewUser {
            username: Username::new(FALLBACK_USERNAME.to_owned())
                .map_err(ModelValidationError::from)?,
            email: EmailAddress::new(FALLBACK_EMAIL.to_owned())
                .map_err(ModelValidationError::from)?,
            password: PasswordHash::new(FALLBACK_PASSWORD)?,
            name: DisplayName::new(FALLBACK_NAME.to_owned())
                .map_err(ModelValidationError::from)?,
            bio: None,
        };

        let created = self.db.create_user(&new_user).await?;
        let user = self
            .db
            .fetch_user(created)
            .await?
            .ok_or(ExecuteError::NotFound("user"))?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::Operation;

    #[test]
    fn queries_resolve_without_the_mutation_keyword() {
        assert_eq!(
            Operation::resolve("{ users { id username name } }"),
            Some(Operation::ListUsers)
        );
        assert_eq!(
            Operation::resolve("{ posts { id content author { username } } }"),
            Some(Operation::ListPosts)
        );
    }

    #[test]
    fn mutations_require_the_mutation_keyword() {
        assert_eq!(Operation::resolve("{ register }"), None);
        assert_eq!(
            Operation::resolve("mutation { register(input: $input) { token } }"),
            Some(Operation::Register)
        );
        assert_eq!(
            Operation::resolve("mutation { createPost(input: $input) { id } }"),
            Some(Operation::CreatePost)
        );
    }

    #[test]
    fn like_post_is_not_shadowed_by_unlike_post() {
        assert_eq!(
            Operation::resolve("mutation { likePost(input: $input) { id } }"),
            Some(Operation::LikePost)
        );
        assert_eq!(
            Operation::resolve("mutation { unlikePost(input: $input) }"),
            Some(Operation::UnlikePost)
        );
    }

    #[test]
    fn check_order_breaks_ties() {
        // A selector naming both operations resolves by table order.
        assert_eq!(
            Operation::resolve("mutation { unlikePost likePost }"),
            Some(Operation::UnlikePost)
        );
        assert_eq!(
            Operation::resolve("{ users posts }"),
            Some(Operation::ListUsers)
        );
    }

    #[test]
    fn unknown_selectors_do_not_resolve() {
        assert_eq!(Operation::resolve("{ followers { id } }"), None);
        assert_eq!(Operation::resolve(""), None);
        // Mutation-ness must match the table entry.
        assert_eq!(Operation::resolve("mutation { users }"), None);
    }
}
