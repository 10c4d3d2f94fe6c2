//! Actions: an HTTP method, a compiled path template and a target signature.
//!
//! Path templates are `/`-separated; a segment of the form `{name}` captures the request segment
//! at the same position, every other segment must match literally. There is no wildcard and no
//! scoring: a template matches a path or it does not.
//!
//! ```
//! use std::sync::Arc;
//! use http::{Method, Uri};
//! use stepwise_web::action::Action;
//! use stepwise_web::mapping::{JsonMapper, ParamType, Signature};
//!
//! let action = Action::new(0, Method::GET, "/users/{id}", Signature::of([ParamType::String]), Arc::new(JsonMapper)).unwrap();
//!
//! let result = action.match_with(&Method::GET, &Uri::from_static("/users/42"));
//! assert_eq!(result.parameter("id"), Some("42"));
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{Method, Uri};
use stepwise_http::protocol::{ContentMediaType, Request};

use crate::error::{ActionError, MappingError};
use crate::mapping::{BodyType, MappedParameters, ObjectMapper, Signature};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, ActionError> {
        if !template.starts_with('/') {
            return Err(ActionError::invalid_template(template, "must start with '/'"));
        }

        let mut names = HashSet::new();
        let mut segments = Vec::new();
        for segment in path_segments(template) {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() {
                        return Err(ActionError::invalid_template(template, "empty parameter name"));
                    }
                    if name.contains(['{', '}']) {
                        return Err(ActionError::invalid_template(template, format!("illegal parameter name '{name}'")));
                    }
                    if !names.insert(name) {
                        return Err(ActionError::invalid_template(template, format!("duplicate parameter name '{name}'")));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None if segment.contains(['{', '}']) => {
                    return Err(ActionError::invalid_template(template, format!("unbalanced braces in segment '{segment}'")));
                }
                None => segments.push(Segment::Literal(segment.to_string())),
            }
        }

        Ok(Self { raw: template.to_string(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn param_count(&self) -> usize {
        self.param_names().count()
    }

    /// Captures the parameter segments of `path`, `None` unless every segment lines up.
    pub fn match_path(&self, path: &str) -> Option<Vec<String>> {
        let mut captured = Vec::new();
        let mut request_segments = path_segments(path);

        for segment in &self.segments {
            let request_segment = request_segments.next()?;
            match segment {
                Segment::Literal(literal) if literal == request_segment => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) => captured.push(request_segment.to_string()),
            }
        }

        if request_segments.next().is_some() {
            return None;
        }
        Some(captured)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn path_segments(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Outcome of matching a request against an action.
#[derive(Debug)]
pub enum MatchResult<'a> {
    Matched { action: &'a Action, parameters: Vec<String> },
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn action(&self) -> Option<&'a Action> {
        match self {
            MatchResult::Matched { action, .. } => Some(*action),
            MatchResult::NoMatch => None,
        }
    }

    /// Captured value of the parameter called `name`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        match self {
            MatchResult::Matched { action, parameters } => {
                let index = action.template().param_names().position(|n| n == name)?;
                parameters.get(index).map(String::as_str)
            }
            MatchResult::NoMatch => None,
        }
    }
}

pub struct Action {
    id: usize,
    method: Method,
    template: PathTemplate,
    signature: Signature,
    mapper: Arc<dyn ObjectMapper>,
}

impl Action {
    pub fn new(id: usize, method: Method, template: &str, signature: Signature, mapper: Arc<dyn ObjectMapper>) -> Result<Self, ActionError> {
        let template = PathTemplate::parse(template)?;

        let declared = signature.params().len();
        let captured = template.param_count();
        if declared != captured {
            return Err(ActionError::SignatureMismatch { id, template: template.raw, declared, captured });
        }

        Ok(Self { id, method, template, signature, mapper })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn mapper(&self) -> &dyn ObjectMapper {
        self.mapper.as_ref()
    }

    /// Matches the method exactly and the path of `uri` segment by segment; the query is ignored.
    pub fn match_with(&self, method: &Method, uri: &Uri) -> MatchResult<'_> {
        if &self.method != method {
            return MatchResult::NoMatch;
        }

        match self.template.match_path(uri.path()) {
            Some(parameters) => MatchResult::Matched { action: self, parameters },
            None => MatchResult::NoMatch,
        }
    }

    /// Converts captured values into the declared types, then appends the body if one is declared.
    pub fn map(&self, request: &Request, captured: Vec<String>) -> Result<MappedParameters, MappingError> {
        let declared = self.signature.params();
        if declared.len() != captured.len() {
            return Err(MappingError::ParameterCountMismatch { expected: declared.len(), actual: captured.len() });
        }

        let values = self
            .template
            .param_names()
            .zip(declared)
            .zip(captured)
            .map(|((name, param_type), raw)| param_type.convert(name, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let body = match self.signature.body_type() {
            Some(body_type) => Some(self.map_body(request, body_type)?),
            None => None,
        };

        Ok(MappedParameters::new(values, body))
    }

    fn map_body(&self, request: &Request, body_type: &BodyType) -> Result<Box<dyn Any + Send>, MappingError> {
        let expected = self.mapper.media_type();

        // an absent Content-Type is read with the mapper's media type
        if let Some(content_type) = request.headers().get(CONTENT_TYPE.as_str()) {
            let supported = ContentMediaType::parse(content_type).is_ok_and(|declared| declared.is_same_base_type(&expected));
            if !supported {
                return Err(MappingError::media_type_not_supported(content_type, &expected));
            }
        }

        if !request.body().has_content() {
            return Err(MappingError::MissingBody { expected: body_type.type_name() });
        }

        let text = request.body().as_str().map_err(|e| MappingError::deserialize(body_type.type_name(), e))?;
        let value = self.mapper.deserialize(text, body_type.type_name())?;
        body_type.convert(value)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("template", &self.template.raw)
            .field("signature", &self.signature)
            .field("media_type", &self.mapper.media_type().to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{JsonMapper, MockObjectMapper, ParamType, ParamValue};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct UserData {
        name: String,
    }

    fn action(method: Method, template: &str, signature: Signature) -> Action {
        Action::new(0, method, template, signature, Arc::new(JsonMapper)).unwrap()
    }

    #[test]
    fn parse_template() {
        let template = PathTemplate::parse("/users/{id}/name").unwrap();
        assert_eq!(
            template.segments(),
            &[Segment::Literal("users".into()), Segment::Param("id".into()), Segment::Literal("name".into())]
        );
        assert_eq!(template.param_names().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(template.to_string(), "/users/{id}/name");
    }

    #[test]
    fn invalid_templates() {
        for template in ["users", "/users/{}", "/users/{id}/{id}", "/users/{id", "/users/x{id}", "/{{id}}"] {
            assert!(matches!(PathTemplate::parse(template), Err(ActionError::InvalidTemplate { .. })), "{template}");
        }
    }

    #[test]
    fn scenario_match_captures_id() {
        let action = action(Method::GET, "/users/{id}", Signature::of([ParamType::String]));

        let result = action.match_with(&Method::GET, &Uri::from_static("/users/42"));
        assert!(result.is_matched());
        assert_eq!(result.parameter("id"), Some("42"));
        assert_eq!(result.parameter("other"), None);
    }

    #[test]
    fn match_rules() {
        let action = action(Method::PATCH, "/users/{userId}/contact", Signature::of([ParamType::String]));

        assert!(action.match_with(&Method::PATCH, &Uri::from_static("/users/7/contact?verbose=true")).is_matched());
        assert!(!action.match_with(&Method::PUT, &Uri::from_static("/users/7/contact")).is_matched());
        assert!(!action.match_with(&Method::PATCH, &Uri::from_static("/users/7/name")).is_matched());
        assert!(!action.match_with(&Method::PATCH, &Uri::from_static("/users/7")).is_matched());
        assert!(!action.match_with(&Method::PATCH, &Uri::from_static("/users/7/contact/extra")).is_matched());
        assert!(!action.match_with(&Method::PATCH, &Uri::from_static("/users/7/contact/")).is_matched());

        let root = action_root();
        assert!(root.match_with(&Method::GET, &Uri::from_static("/")).is_matched());
        assert!(!root.match_with(&Method::GET, &Uri::from_static("/users")).is_matched());
    }

    fn action_root() -> Action {
        action(Method::GET, "/", Signature::new())
    }

    #[test]
    fn signature_must_cover_captures() {
        let result = Action::new(3, Method::GET, "/users/{id}", Signature::new(), Arc::new(JsonMapper));
        assert!(matches!(result, Err(ActionError::SignatureMismatch { id: 3, declared: 0, captured: 1, .. })));
    }

    #[test]
    fn map_params_and_body() {
        let action = action(Method::PATCH, "/users/{id}/name/{active}", Signature::of([ParamType::U64, ParamType::Bool]).body::<UserData>());
        let request = Request::has(Method::PATCH).content_type("application/json; charset=utf-8").body(r#"{"name":"Jane"}"#).build();

        let mut mapped = action.map(&request, vec!["7".into(), "false".into()]).unwrap();
        assert_eq!(mapped.values(), &[ParamValue::U64(7), ParamValue::Bool(false)]);
        assert_eq!(mapped.take_body::<UserData>(), Some(UserData { name: "Jane".into() }));
    }

    #[test]
    fn map_failures() {
        let action = action(Method::POST, "/users/{id}", Signature::of([ParamType::I64]).body::<UserData>());
        let request = Request::has(Method::POST).body(r#"{"name":"Jane"}"#).build();

        let error = action.map(&request, vec!["abc".into()]).unwrap_err();
        assert!(matches!(error, MappingError::InvalidParameter { .. }));

        let error = action.map(&request, vec![]).unwrap_err();
        assert_eq!(error, MappingError::ParameterCountMismatch { expected: 1, actual: 0 });

        let xml = Request::has(Method::POST).content_type("application/xml").body("<user/>").build();
        let error = action.map(&xml, vec!["1".into()]).unwrap_err();
        assert!(matches!(error, MappingError::MediaTypeNotSupported { .. }));

        let empty = Request::has(Method::POST).build();
        let error = action.map(&empty, vec!["1".into()]).unwrap_err();
        assert!(matches!(error, MappingError::MissingBody { .. }));

        let broken = Request::has(Method::POST).body("{\"name\":").build();
        let error = action.map(&broken, vec!["1".into()]).unwrap_err();
        assert!(matches!(error, MappingError::Deserialize { .. }));
    }

    #[test]
    fn body_goes_through_the_mapper() {
        let mut mapper = MockObjectMapper::new();
        mapper.expect_media_type().returning(ContentMediaType::plain_text);
        mapper
            .expect_deserialize()
            .withf(|text, type_name| text.to_string() == "Jane" && type_name.ends_with("UserData"))
            .times(1)
            .returning(|text, _| Ok(serde_json::json!({ "name": text })));

        let action = Action::new(1, Method::PUT, "/users", Signature::new().body::<UserData>(), Arc::new(mapper)).unwrap();
        let request = Request::has(Method::PUT).content_type("text/plain").body("Jane").build();

        let mut mapped = action.map(&request, vec![]).unwrap();
        assert!(mapped.is_empty());
        assert_eq!(mapped.take_body::<UserData>(), Some(UserData { name: "Jane".into() }));
    }
}
