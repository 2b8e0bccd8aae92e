//! `tower::Service` adapter for [`Router`].
//!
//! Routing is synchronous, so the service is always ready and its future resolves
//! immediately. Layers from the tower ecosystem stack on top as usual:
//!
//! ```rust,ignore
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! let service = ServiceBuilder::new()
//!     .concurrency_limit(64)
//!     .service(router.into_service());
//! let response = service.oneshot(request).await?;
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{Ready, ready};
use tower::Service;

use crate::error::DispatchError;
use crate::handler::Responder;
use crate::router::Router;

/// A shared [`Router`] serving `http::Request`s.
pub struct RouterService<R> {
    router: Arc<Router<R>>,
}

impl<R> RouterService<R> {
    pub fn new(router: Arc<Router<R>>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router<R> {
        &self.router
    }
}

impl<R> From<Router<R>> for RouterService<R> {
    fn from(router: Router<R>) -> Self {
        Self::new(Arc::new(router))
    }
}

impl<R> Clone for RouterService<R> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<R> std::fmt::Debug for RouterService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RouterService").field(&self.router).finish()
    }
}

impl<B, R> Service<http::Request<B>> for RouterService<R>
where
    B: AsRef<[u8]>,
    R: Responder,
{
    type Response = R;
    type Error = DispatchError;
    type Future = Ready<Result<R, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        ready(self.router.dispatch(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RouterBuilder;
    use crate::view::View;
    use tower::ServiceExt;

    fn service() -> RouterService<String> {
        let mut builder = RouterBuilder::new();
        builder
            .route(
                "GET",
                "/blog/<int:id>",
                View::new("detail", |id: i64| format!("post {id}")).params(["id"]),
            )
            .unwrap();
        builder.build().into_service()
    }

    fn get(uri: &str) -> http::Request<Vec<u8>> {
        http::Request::get(uri).body(Vec::new()).unwrap()
    }

    #[test]
    fn test_oneshot_dispatch() {
        let response = tokio_test::block_on(service().oneshot(get("/blog/7"))).unwrap();
        assert_eq!(response, "post 7");

        let response = tokio_test::block_on(service().oneshot(get("/blog/x"))).unwrap();
        assert_eq!(response, "404 Not Found");
    }

    #[test]
    fn test_path_placeholders_see_decoded_text() {
        let mut builder = RouterBuilder::new();
        builder
            .route("GET", "/u/<name>", View::new("user", |name: String| name).params(["name"]))
            .unwrap();
        let service = builder.build().into_service();

        let response = tokio_test::block_on(service.oneshot(get("/u/J%C3%BCrgen%20X"))).unwrap();
        assert_eq!(response, "Jürgen X");
    }

    #[test]
    fn test_clones_share_router() {
        let service = service();
        let clone = service.clone();
        assert_eq!(clone.router().route_count(), 1);
        assert!(std::ptr::eq(service.router(), clone.router()));
    }
}
