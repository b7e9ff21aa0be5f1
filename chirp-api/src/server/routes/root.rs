use crate::server::ServerRouter;
use axum::{Router, response::Html};
use axum_extra::routing::{RouterExt, TypedPath};

pub fn routes() -> ServerRouter {
    Router::new().typed_get(root)
}

#[derive(TypedPath)]
#[typed_path("/")]
struct RootPath;

const USAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>chirp API</title></head>
<body>
<h1>chirp API</h1>
<p>Query endpoint: <code>POST /query</code></p>
<p>Body: <code>{ \"query\": \"...\", \"variables\": { \"input\": { ... } } }</code></p>
<p>Operations: <code>users</code>, <code>posts</code>, <code>register</code>,
<code>createPost</code>, <code>likePost</code>, <code>unlikePost</code>.</p>
</body>
</html>
";

async fn root(_: RootPath) -> Html<&'static str> {
    Html(USAGE)
}
