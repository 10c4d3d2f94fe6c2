//! Path-template action routing on top of `stepwise-http`.
//!
//! A [`Resource`](resource::Resource) groups actions: an HTTP method, a path template such as
//! `/users/{userId}/contacts/{contactId}` and a [`Signature`](mapping::Signature) saying how the
//! captured values and the body are converted. Each resource owns a pool of handler instances;
//! a route function borrows one instance exclusively for the duration of a request.
//!
//! # Example
//!
//! ```no_run
//! use http::{Method, StatusCode};
//! use stepwise_http::protocol::Response;
//! use stepwise_web::Server;
//! use stepwise_web::completes::Completes;
//! use stepwise_web::mapping::{ParamType, Signature};
//! use stepwise_web::resource::Resource;
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! #[tokio::main]
//! async fn main() {
//!     let greetings = Resource::builder("greetings")
//!         .route(Method::GET, "/hello/{name}", Signature::of([ParamType::String]), |_: &mut Greeter, _, params| {
//!             let name = params.str(0).unwrap_or("world");
//!             Ok(Completes::with(Response::with_body(StatusCode::OK, format!("hello {name}"))))
//!         })
//!         .instances_with(4, Greeter::default)
//!         .build()
//!         .unwrap();
//!
//!     let server = Server::builder().address("127.0.0.1:8080").resource(greetings).build().unwrap();
//!     server.start().await.unwrap();
//! }
//! ```

pub mod action;
pub mod completes;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mapping;
pub mod pool;
pub mod resource;

mod request;
mod server;

pub use dispatcher::{Dispatcher, Resources};
pub use error::{ActionError, DispatchError, HandlerError, MappingError};
pub use request::RequestContext;
pub use server::{Server, ServerBuildError, ServerBuilder};
