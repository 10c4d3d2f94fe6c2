//! Resources: named groups of actions served by a pool of handler instances.
//!
//! Each action is bound to a route function receiving an exclusively borrowed handler instance,
//! the [`RequestContext`] and the [`MappedParameters`]. Actions are matched in registration order
//! and the first match wins.
//!
//! ```
//! use http::{Method, StatusCode};
//! use stepwise_http::protocol::Response;
//! use stepwise_web::completes::Completes;
//! use stepwise_web::mapping::{ParamType, Signature};
//! use stepwise_web::resource::Resource;
//!
//! #[derive(Default)]
//! struct UserHandler {
//!     queries: usize,
//! }
//!
//! let resource = Resource::builder("users")
//!     .route(Method::GET, "/users/{id}", Signature::of([ParamType::U64]), |handler: &mut UserHandler, _context, params| {
//!         handler.queries += 1;
//!         let id = params.u64(0).unwrap_or_default();
//!         Ok(Completes::with(Response::with_body(StatusCode::OK, format!("user {id}"))))
//!     })
//!     .instances_with(2, UserHandler::default)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, Uri};
use stepwise_http::protocol::{Request, Response};
use tracing::debug;

use crate::action::{Action, MatchResult};
use crate::completes::Completes;
use crate::error::{ActionError, DispatchError, HandlerError};
use crate::mapping::{JsonMapper, MappedParameters, ObjectMapper, Signature};
use crate::pool::HandlerPool;
use crate::request::RequestContext;

pub type Route<H> = Arc<dyn Fn(&mut H, &RequestContext<'_>, MappedParameters) -> Result<Completes, HandlerError> + Send + Sync>;

/// Object-safe view of a [`Resource`], whatever its handler type.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn name(&self) -> &str;

    /// First action of this resource matching the request, in registration order.
    fn match_with(&self, method: &Method, uri: &Uri) -> MatchResult<'_>;

    /// Borrows a handler instance, runs the route of `action` and waits for its outcome.
    async fn dispatch_to_handler_with(&self, request: &Request, action: &Action, parameters: MappedParameters) -> Result<Response, DispatchError>;
}

pub struct Resource<H> {
    name: String,
    routes: Vec<(Action, Route<H>)>,
    pool: HandlerPool<H>,
}

impl<H> Resource<H> {
    pub fn builder(name: impl Into<String>) -> ResourceBuilder<H> {
        ResourceBuilder::new(name.into())
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.routes.iter().map(|(action, _)| action)
    }

    pub fn pool(&self) -> &HandlerPool<H> {
        &self.pool
    }
}

#[async_trait]
impl<H: Send + 'static> ResourceHandler for Resource<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_with(&self, method: &Method, uri: &Uri) -> MatchResult<'_> {
        self.routes.iter().map(|(action, _)| action.match_with(method, uri)).find(MatchResult::is_matched).unwrap_or(MatchResult::NoMatch)
    }

    async fn dispatch_to_handler_with(&self, request: &Request, action: &Action, parameters: MappedParameters) -> Result<Response, DispatchError> {
        let (_, route) = self.routes.get(action.id()).ok_or(DispatchError::Incomplete { action: action.id() })?;

        let completes = {
            let mut handler = self.pool.acquire().await.map_err(|_| DispatchError::Unavailable { resource: self.name.clone() })?;
            debug!(resource = %self.name, action = action.id(), available = self.pool.available(), "handler acquired");

            let context = RequestContext::new(&self.name, request, action);
            route(&mut *handler, &context, parameters).map_err(|source| DispatchError::HandlerFault { action: action.id(), source })?
        };

        completes.outcome().await.ok_or(DispatchError::Incomplete { action: action.id() })
    }
}

impl<H> fmt::Debug for Resource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("actions", &self.actions().collect::<Vec<_>>())
            .field("pool", &self.pool)
            .finish()
    }
}

pub struct ResourceBuilder<H> {
    name: String,
    mapper: Arc<dyn ObjectMapper>,
    routes: Vec<(Action, Route<H>)>,
    instances: Vec<H>,
    error: Option<ActionError>,
}

impl<H> ResourceBuilder<H> {
    fn new(name: String) -> Self {
        Self { name, mapper: Arc::new(JsonMapper), routes: Vec::new(), instances: Vec::new(), error: None }
    }

    /// Mapper for bodies of the actions registered after this call.
    #[must_use]
    pub fn mapper(mut self, mapper: Arc<dyn ObjectMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    /// Registers an action; an invalid template is reported by [`ResourceBuilder::build`].
    #[must_use]
    pub fn route<F>(mut self, method: Method, template: &str, signature: Signature, route: F) -> Self
    where
        F: Fn(&mut H, &RequestContext<'_>, MappedParameters) -> Result<Completes, HandlerError> + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }

        match Action::new(self.routes.len(), method, template, signature, Arc::clone(&self.mapper)) {
            Ok(action) => self.routes.push((action, Arc::new(route))),
            Err(e) => self.error = Some(e),
        }
        self
    }

    #[must_use]
    pub fn instances(mut self, instances: Vec<H>) -> Self {
        self.instances = instances;
        self
    }

    #[must_use]
    pub fn instances_with(mut self, size: usize, factory: impl FnMut() -> H) -> Self {
        self.instances = std::iter::repeat_with(factory).take(size).collect();
        self
    }

    pub fn build(self) -> Result<Resource<H>, ActionError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.instances.is_empty() {
            return Err(ActionError::EmptyPool { resource: self.name });
        }

        Ok(Resource { name: self.name, routes: self.routes, pool: HandlerPool::new(self.instances) })
    }
}
