use crate::server::Server;
use std::sync::Arc;
use warp::Filter;

pub mod v1;

/// Mount the user routes at `/api/user/...` and again at `/api/v1/user/...`.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let unversioned = v1::routes(server.clone());
    let versioned = warp::path("v1").and(v1::routes(server));

    warp::path("api").and(unversioned.or(versioned).unify())
}
