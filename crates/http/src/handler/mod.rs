//! The seam between a connection and the application.
//!
//! A connection hands every complete [`Request`] to a [`Handler`] and writes back the
//! [`Response`] it produces. A handler error is answered with `500 Internal Server Error`.

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;

use crate::protocol::{Request, Response};

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, req: Request) -> Result<Response, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, req: Request) -> Result<Response, Self::Error> {
        (self.f)(req).await
    }
}

/// Turns an async function into a [`Handler`].
///
/// ```
/// use std::convert::Infallible;
/// use http::StatusCode;
/// use stepwise_http::handler::make_handler;
/// use stepwise_http::protocol::{Request, Response};
///
/// let handler = make_handler(|request: Request| async move {
///     Ok::<_, Infallible>(Response::with_body(StatusCode::OK, request.uri().path().to_string()))
/// });
/// ```
pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response, Err>>,
    F: Fn(Request) -> Ret,
{
    HandlerFn { f }
}
