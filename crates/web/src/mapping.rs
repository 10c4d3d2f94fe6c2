//! Typed handler arguments.
//!
//! An action declares the types of its captured path parameters ([`ParamType`]) and, optionally,
//! of its body ([`BodyType`]). Mapping a matched request produces [`MappedParameters`]: the
//! converted path values in template order, then the deserialized body.
//!
//! Body text goes through an [`ObjectMapper`], the replaceable seam between the router and a
//! serialization format. [`JsonMapper`] is the default.

use std::any::{Any, type_name};
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stepwise_http::protocol::ContentMediaType;

use crate::error::MappingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    I64,
    U64,
    F64,
    Bool,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::I64 => "i64",
            ParamType::U64 => "u64",
            ParamType::F64 => "f64",
            ParamType::Bool => "bool",
        }
    }

    /// Converts one captured value, `name` only serves the error message.
    pub fn convert(self, name: &str, raw: String) -> Result<ParamValue, MappingError> {
        let invalid = |raw: &str| MappingError::invalid_parameter(name, raw, self.name());
        match self {
            ParamType::String => Ok(ParamValue::String(raw)),
            ParamType::I64 => raw.parse().map(ParamValue::I64).map_err(|_| invalid(&raw)),
            ParamType::U64 => raw.parse().map(ParamValue::U64).map_err(|_| invalid(&raw)),
            ParamType::F64 => raw.parse().map(ParamValue::F64).map_err(|_| invalid(&raw)),
            ParamType::Bool => raw.parse().map(ParamValue::Bool).map_err(|_| invalid(&raw)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

type ConvertFn = fn(Value) -> Result<Box<dyn Any + Send>, serde_json::Error>;

/// The declared type of a request body.
#[derive(Clone, Copy)]
pub struct BodyType {
    type_name: &'static str,
    convert: ConvertFn,
}

impl BodyType {
    pub fn of<T: DeserializeOwned + Send + 'static>() -> Self {
        Self { type_name: type_name::<T>(), convert: convert_value::<T> }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn convert(&self, value: Value) -> Result<Box<dyn Any + Send>, MappingError> {
        (self.convert)(value).map_err(|e| MappingError::deserialize(self.type_name, e))
    }
}

impl fmt::Debug for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BodyType").field(&self.type_name).finish()
    }
}

fn convert_value<T: DeserializeOwned + Send + 'static>(value: Value) -> Result<Box<dyn Any + Send>, serde_json::Error> {
    let typed: T = serde_json::from_value(value)?;
    Ok(Box::new(typed))
}

/// Ordered parameter types plus an optional body type.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<ParamType>,
    body: Option<BodyType>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(params: impl IntoIterator<Item = ParamType>) -> Self {
        Self { params: params.into_iter().collect(), body: None }
    }

    #[must_use]
    pub fn param(mut self, param_type: ParamType) -> Self {
        self.params.push(param_type);
        self
    }

    #[must_use]
    pub fn body<T: DeserializeOwned + Send + 'static>(mut self) -> Self {
        self.body = Some(BodyType::of::<T>());
        self
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn body_type(&self) -> Option<&BodyType> {
        self.body.as_ref()
    }
}

/// Arguments ready for a route function.
#[derive(Default)]
pub struct MappedParameters {
    values: Vec<ParamValue>,
    body: Option<Box<dyn Any + Send>>,
}

impl MappedParameters {
    pub fn new(values: Vec<ParamValue>, body: Option<Box<dyn Any + Send>>) -> Self {
        Self { values, body }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&ParamValue> {
        self.values.get(index)
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(ParamValue::as_str)
    }

    pub fn i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(ParamValue::as_i64)
    }

    pub fn u64(&self, index: usize) -> Option<u64> {
        self.get(index).and_then(ParamValue::as_u64)
    }

    pub fn f64(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(ParamValue::as_f64)
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(ParamValue::as_bool)
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Takes the body out if it was declared as `T`; a body of another type stays in place.
    pub fn take_body<T: 'static>(&mut self) -> Option<T> {
        let body = self.body.take()?;
        match body.downcast::<T>() {
            Ok(typed) => Some(*typed),
            Err(body) => {
                self.body = Some(body);
                None
            }
        }
    }
}

impl fmt::Debug for MappedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedParameters").field("values", &self.values).field("has_body", &self.has_body()).finish()
    }
}

/// Converts between body text and structured values.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectMapper: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<String, MappingError>;

    /// Parses `text`; `type_name` names the type the value is meant for.
    fn deserialize(&self, text: &str, type_name: &str) -> Result<Value, MappingError>;

    /// Media type of the text this mapper reads and writes.
    fn media_type(&self) -> ContentMediaType;
}

/// Serializes any `T` through `mapper`.
pub fn serialize_with<T: Serialize + ?Sized>(mapper: &dyn ObjectMapper, value: &T) -> Result<String, MappingError> {
    let value = serde_json::to_value(value).map_err(MappingError::serialize)?;
    mapper.serialize(&value)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMapper;

impl ObjectMapper for JsonMapper {
    fn serialize(&self, value: &Value) -> Result<String, MappingError> {
        serde_json::to_string(value).map_err(MappingError::serialize)
    }

    fn deserialize(&self, text: &str, type_name: &str) -> Result<Value, MappingError> {
        serde_json::from_str(text).map_err(|e| MappingError::deserialize(type_name, e))
    }

    fn media_type(&self) -> ContentMediaType {
        ContentMediaType::json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Name {
        given: String,
        family: String,
    }

    #[test]
    fn convert_params() {
        assert_eq!(ParamType::String.convert("id", "42".into()).unwrap(), ParamValue::String("42".into()));
        assert_eq!(ParamType::I64.convert("id", "-42".into()).unwrap(), ParamValue::I64(-42));
        assert_eq!(ParamType::U64.convert("id", "42".into()).unwrap(), ParamValue::U64(42));
        assert_eq!(ParamType::F64.convert("ratio", "0.5".into()).unwrap(), ParamValue::F64(0.5));
        assert_eq!(ParamType::Bool.convert("active", "true".into()).unwrap(), ParamValue::Bool(true));
    }

    #[test]
    fn convert_invalid_param() {
        let error = ParamType::U64.convert("id", "-1".into()).unwrap_err();
        assert_eq!(error, MappingError::invalid_parameter("id", "-1", "u64"));

        let error = ParamType::Bool.convert("active", "yes".into()).unwrap_err();
        assert!(matches!(error, MappingError::InvalidParameter { expected: "bool", .. }));
    }

    #[test]
    fn body_type_converts_and_downcasts() {
        let body_type = BodyType::of::<Name>();
        assert!(body_type.type_name().ends_with("Name"));

        let value = JsonMapper.deserialize(r#"{"given":"Jane","family":"Doe"}"#, body_type.type_name()).unwrap();
        let body = body_type.convert(value).unwrap();

        let mut params = MappedParameters::new(vec![ParamValue::U64(1)], Some(body));
        assert_eq!(params.u64(0), Some(1));
        assert_eq!(params.str(0), None);

        assert!(params.take_body::<String>().is_none());
        assert!(params.has_body());
        assert_eq!(params.take_body::<Name>(), Some(Name { given: "Jane".into(), family: "Doe".into() }));
        assert!(!params.has_body());
    }

    #[test]
    fn body_of_wrong_shape() {
        let value = JsonMapper.deserialize(r#"{"given":"Jane"}"#, "Name").unwrap();
        let error = BodyType::of::<Name>().convert(value).unwrap_err();
        assert!(matches!(error, MappingError::Deserialize { .. }));
    }

    #[test]
    fn json_mapper() {
        assert_eq!(JsonMapper.media_type(), ContentMediaType::json());
        assert!(matches!(JsonMapper.deserialize("{", "Name"), Err(MappingError::Deserialize { .. })));

        let text = serialize_with(&JsonMapper, &vec![1, 2, 3]).unwrap();
        assert_eq!(text, "[1,2,3]");
    }
}
