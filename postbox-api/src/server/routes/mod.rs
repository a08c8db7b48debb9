use crate::server::ServerRouter;

pub(super) mod posts;

pub fn routes() -> ServerRouter {
    ServerRouter::new().merge(posts::routes())
}
