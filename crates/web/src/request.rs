//! The context a route function runs in.

use http::{Method, Uri, Version};
use stepwise_http::protocol::{Body, Headers, Request};

use crate::action::Action;

/// The request being dispatched, the action it matched and the resource owning that action.
///
/// The lifetime ties the context to the dispatch: route functions can read it but not keep it.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'req> {
    resource: &'req str,
    request: &'req Request,
    action: &'req Action,
}

impl<'req> RequestContext<'req> {
    pub fn new(resource: &'req str, request: &'req Request, action: &'req Action) -> Self {
        Self { resource, request, action }
    }

    pub fn resource_name(&self) -> &'req str {
        self.resource
    }

    pub fn request(&self) -> &'req Request {
        self.request
    }

    pub fn action(&self) -> &'req Action {
        self.action
    }

    pub fn method(&self) -> &'req Method {
        self.request.method()
    }

    pub fn uri(&self) -> &'req Uri {
        self.request.uri()
    }

    pub fn version(&self) -> Version {
        self.request.version()
    }

    pub fn headers(&self) -> &'req Headers {
        self.request.headers()
    }

    pub fn body(&self) -> &'req Body {
        self.request.body()
    }
}
