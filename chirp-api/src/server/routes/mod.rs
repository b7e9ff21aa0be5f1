use crate::server::ServerRouter;
use axum::Router;

mod query;
mod root;

pub fn routes() -> ServerRouter {
    Router::new().merge(query::routes()).merge(root::routes())
}
