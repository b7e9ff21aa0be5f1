use crate::query::{QueryExecutor, QueryRequest, QueryResponse};
use crate::server::{ServerRouter, ServerState, json::Json};
use axum::Router;
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use chirp_db::client::DbClient;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new().typed_post(post_query)
}

#[derive(TypedPath)]
#[typed_path("/query")]
struct QueryPath;

/// Any decoded envelope is answered with an envelope and status 200; only an
/// undecodable body is rejected before reaching the executor.
#[axum::debug_handler(state = ServerState)]
async fn post_query(
    _: QueryPath,
    State(db): State<Arc<DbClient>>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let executor = QueryExecutor::new(db);

    Json(executor.execute(&request).await)
}
