use chirp_common::credential::PasswordHash;
use chirp_common::model::Id;
use chirp_common::model::follow::NewFollow;
use chirp_common::model::like::NewLike;
use chirp_common::model::post::{NewPost, PostContent, PostMarker};
use chirp_common::model::user::{DisplayName, EmailAddress, NewUser, UserMarker, Username};
use chirp_db::client::{DbClient, DbError};

async fn test_db() -> DbClient {
    let db = DbClient::connect("sqlite::memory:")
        .await
        .expect("connecting to in-memory store");
    db.create_schema().await.expect("creating schema");
    db
}

fn new_user(username: &str, email: &str, name: &str) -> NewUser {
    NewUser {
        username: Username::new(username.to_owned()).unwrap(),
        email: EmailAddress::new(email.to_owned()).unwrap(),
        password: PasswordHash::new("test_password").unwrap(),
        name: DisplayName::new(name.to_owned()).unwrap(),
        bio: Some("Test user bio".to_owned()),
    }
}

fn content(text: &str) -> PostContent {
    PostContent::new(text.to_owned()).unwrap()
}

async fn create_user(db: &DbClient, username: &str) -> Id<UserMarker> {
    db.create_user(&new_user(
        username,
        &format!("{username}@example.com"),
        username,
    ))
    .await
    .unwrap()
}

async fn create_post(db: &DbClient, author: Id<UserMarker>, text: &str) -> Id<PostMarker> {
    let post = NewPost::new(author, content(text), None).unwrap();
    db.create_post(&post).await.unwrap()
}

#[tokio::test]
async fn user_round_trips_through_the_store() {
    let db = test_db().await;

    let id = db
        .create_user(&new_user("alice", "alice@x.com", "Alice"))
        .await
        .unwrap();
    assert!(id.is_assigned());

    let user = db.fetch_user(id).await.unwrap().expect("user exists");
    assert_eq!(user.id, id);
    assert_eq!(user.username.get(), "alice");
    assert_eq!(user.email.get(), "alice@x.com");
    assert_eq!(user.name.get(), "Alice");
    assert_eq!(user.bio.as_deref(), Some("Test user bio"));
    assert_eq!(user.avatar, None);

    let by_username = db
        .fetch_user_by_username(&Username::new("alice".to_owned()).unwrap())
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(by_username, user);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let db = test_db().await;

    create_user(&db, "alice").await;
    let err = db
        .create_user(&new_user("alice", "other@example.com", "Other"))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let db = test_db().await;

    db.create_user(&new_user("alice", "shared@example.com", "Alice"))
        .await
        .unwrap();
    let err = db
        .create_user(&new_user("bob", "shared@example.com", "Bob"))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Conflict(_)));
}

#[tokio::test]
async fn soft_deleted_users_disappear_from_reads() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;

    assert!(db.soft_delete_user(alice).await.unwrap());
    // Already deleted, nothing left to mark.
    assert!(!db.soft_delete_user(alice).await.unwrap());

    assert_eq!(db.fetch_user(alice).await.unwrap(), None);
    let users = db.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, bob);
}

#[tokio::test]
async fn profile_updates_apply_to_live_users_only() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    assert!(
        db.update_user_profile(alice, "Alice B.", Some("new bio"), Some("avatar.png"))
            .await
            .unwrap()
    );

    let user = db.fetch_user(alice).await.unwrap().unwrap();
    assert_eq!(user.name.get(), "Alice B.");
    assert_eq!(user.bio.as_deref(), Some("new bio"));
    assert_eq!(user.avatar.as_deref(), Some("avatar.png"));

    db.soft_delete_user(alice).await.unwrap();
    assert!(
        !db.update_user_profile(alice, "Ghost", None, None)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn posts_load_their_author() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let post_id = create_post(&db, alice, "hello world").await;

    let post = db.fetch_post(post_id).await.unwrap().expect("post exists");
    assert_eq!(post.content.get(), "hello world");
    assert_eq!(post.author.id, alice);
    assert_eq!(post.author.username.get(), "alice");
    assert_eq!(post.parent_id, None);
}

#[tokio::test]
async fn posts_list_newest_first() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let first = create_post(&db, alice, "first").await;
    let second = create_post(&db, alice, "second").await;
    let third = create_post(&db, alice, "third").await;

    let posts = db.list_posts().await.unwrap();
    let ids: Vec<_> = posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![third, second, first]);
}

#[tokio::test]
async fn soft_deleted_posts_are_hidden() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let keep = create_post(&db, alice, "keep").await;
    let removed = create_post(&db, alice, "drop").await;

    assert!(db.soft_delete_post(removed).await.unwrap());
    assert!(!db.soft_delete_post(removed).await.unwrap());

    assert_eq!(db.fetch_post(removed).await.unwrap(), None);
    let posts = db.list_posts().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, keep);

    assert_eq!(db.post_count(alice).await.unwrap(), 1);
}

#[tokio::test]
async fn a_post_can_be_liked_once_per_user() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let post = create_post(&db, alice, "like me").await;

    let like = NewLike::new(alice, post).unwrap();
    let like_id = db.create_like(&like).await.unwrap();

    let loaded = db.fetch_like(like_id).await.unwrap().expect("like exists");
    assert_eq!(loaded.user.id, alice);
    assert_eq!(loaded.post.id, post);
    assert_eq!(loaded.post.author.id, alice);

    let err = db.create_like(&like).await.unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
    assert_eq!(db.like_count(post).await.unwrap(), 1);
}

#[tokio::test]
async fn unliking_removes_the_edge_exactly_once() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let post = create_post(&db, alice, "like me").await;

    db.create_like(&NewLike::new(alice, post).unwrap())
        .await
        .unwrap();
    assert!(db.is_liked_by(post, alice).await.unwrap());

    assert!(db.delete_like(alice, post).await.unwrap());
    assert!(!db.delete_like(alice, post).await.unwrap());

    assert!(!db.is_liked_by(post, alice).await.unwrap());
    assert_eq!(db.like_count(post).await.unwrap(), 0);
}

#[tokio::test]
async fn likes_survive_post_soft_deletion() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let post = create_post(&db, alice, "doomed").await;
    db.create_like(&NewLike::new(alice, post).unwrap())
        .await
        .unwrap();

    db.soft_delete_post(post).await.unwrap();

    // No cascade: the like rows remain even though the post is hidden.
    assert_eq!(db.like_count(post).await.unwrap(), 1);
    assert!(db.is_liked_by(post, alice).await.unwrap());
}

#[tokio::test]
async fn follow_edges_are_unique_and_countable() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let bob = create_user(&db, "bob").await;
    let carol = create_user(&db, "carol").await;

    let follow_id = db
        .create_follow(&NewFollow::new(bob, alice).unwrap())
        .await
        .unwrap();
    db.create_follow(&NewFollow::new(carol, alice).unwrap())
        .await
        .unwrap();

    let edge = db
        .fetch_follow(follow_id)
        .await
        .unwrap()
        .expect("follow exists");
    assert_eq!(edge.follower_id, bob);
    assert_eq!(edge.followee_id, alice);

    let err = db
        .create_follow(&NewFollow::new(bob, alice).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));

    assert_eq!(db.follower_count(alice).await.unwrap(), 2);
    assert_eq!(db.following_count(bob).await.unwrap(), 1);
    assert_eq!(db.following_count(alice).await.unwrap(), 0);

    assert!(db.delete_follow(bob, alice).await.unwrap());
    assert!(!db.delete_follow(bob, alice).await.unwrap());
    assert_eq!(db.follower_count(alice).await.unwrap(), 1);
}

#[tokio::test]
async fn counts_are_zero_without_related_records() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let post = create_post(&db, alice, "lonely").await;

    assert_eq!(db.follower_count(alice).await.unwrap(), 0);
    assert_eq!(db.following_count(alice).await.unwrap(), 0);
    assert_eq!(db.like_count(post).await.unwrap(), 0);
    assert_eq!(db.reply_count(post).await.unwrap(), 0);
    assert!(!db.is_liked_by(post, alice).await.unwrap());
}

#[tokio::test]
async fn replies_thread_by_parent_id() {
    let db = test_db().await;

    let alice = create_user(&db, "alice").await;
    let root = create_post(&db, alice, "root").await;

    let reply = NewPost::new(alice, content("reply one"), Some(root)).unwrap();
    db.create_post(&reply).await.unwrap();
    let reply = NewPost::new(alice, content("reply two"), Some(root)).unwrap();
    let second_reply = db.create_post(&reply).await.unwrap();

    assert_eq!(db.reply_count(root).await.unwrap(), 2);

    let loaded = db.fetch_post(second_reply).await.unwrap().unwrap();
    assert_eq!(loaded.parent_id, Some(root));

    // Soft-deleting a reply removes it from the count.
    db.soft_delete_post(second_reply).await.unwrap();
    assert_eq!(db.reply_count(root).await.unwrap(), 1);
}
