//! Request dispatching: match, map, invoke, respond.
//!
//! [`Resources::route`] resolves a request into a [`Dispatch`], which keeps routing misses,
//! parameter mapping failures and matches apart. [`Dispatcher`] turns each outcome into a
//! response:
//!
//! - no matching action: `404 Not Found`, logged as a warning
//! - captured values or body that can't be mapped: `400 Bad Request`, logged as an error
//! - handler error, or a deferred response that never arrives: `500 Internal Server Error`,
//!   logged as an error

use std::convert::Infallible;
use std::fmt;

use async_trait::async_trait;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use stepwise_http::handler::Handler;
use stepwise_http::protocol::{ContentMediaType, Request, Response};
use tracing::{error, warn};

use crate::action::{Action, MatchResult};
use crate::error::MappingError;
use crate::mapping::MappedParameters;
use crate::resource::ResourceHandler;

/// Every registered resource, in registration order.
#[derive(Default)]
pub struct Resources {
    resources: Vec<Box<dyn ResourceHandler>>,
}

pub enum Dispatch<'a> {
    Matched { resource: &'a dyn ResourceHandler, action: &'a Action, parameters: MappedParameters },
    NotFound,
    Faulted { action: &'a Action, error: MappingError },
}

impl fmt::Debug for Dispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Matched { resource, action, parameters } => f
                .debug_struct("Matched")
                .field("resource", &resource.name())
                .field("action", &action.id())
                .field("parameters", parameters)
                .finish(),
            Dispatch::NotFound => f.write_str("NotFound"),
            Dispatch::Faulted { action, error } => f.debug_struct("Faulted").field("action", &action.id()).field("error", error).finish(),
        }
    }
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, resource: impl ResourceHandler + 'static) -> Self {
        self.add(resource);
        self
    }

    pub fn add(&mut self, resource: impl ResourceHandler + 'static) {
        self.resources.push(Box::new(resource));
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|resource| resource.name())
    }

    /// The first resource with a matching action decides; its captured values are mapped at once.
    pub fn route(&self, request: &Request) -> Dispatch<'_> {
        for resource in &self.resources {
            if let MatchResult::Matched { action, parameters } = resource.match_with(request.method(), request.uri()) {
                return match action.map(request, parameters) {
                    Ok(parameters) => Dispatch::Matched { resource: resource.as_ref(), action, parameters },
                    Err(error) => Dispatch::Faulted { action, error },
                };
            }
        }
        Dispatch::NotFound
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    resources: Resources,
}

impl Dispatcher {
    pub fn new(resources: Resources) -> Self {
        Self { resources }
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub async fn dispatch_matching(&self, request: &Request) -> Response {
        match self.resources.route(request) {
            Dispatch::NotFound => {
                warn!(method = %request.method(), uri = %request.uri(), "no matching resource");
                plain_text(StatusCode::NOT_FOUND, format!("No matching resource for method {} and Uri {}", request.method(), request.uri()))
            }

            Dispatch::Faulted { action, error } => {
                error!(action = action.id(), template = %action.template(), cause = %error, "can't map request parameters");
                plain_text(StatusCode::BAD_REQUEST, error.to_string())
            }

            Dispatch::Matched { resource, action, parameters } => {
                match resource.dispatch_to_handler_with(request, action, parameters).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!(resource = resource.name(), action = action.id(), cause = %e, "handler failed");
                        Response::of(StatusCode::INTERNAL_SERVER_ERROR)
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Handler for Dispatcher {
    type Error = Infallible;

    async fn call(&self, req: Request) -> Result<Response, Self::Error> {
        Ok(self.dispatch_matching(&req).await)
    }
}

fn plain_text(status: StatusCode, text: String) -> Response {
    Response::with_body(status, text).and_header(CONTENT_TYPE.as_str(), ContentMediaType::plain_text().to_string())
}
