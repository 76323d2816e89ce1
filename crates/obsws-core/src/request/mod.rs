//! Request specs and typed result parsing.
//!
//! A [`RequestSpec`] is the untyped body of an op 6 frame: a type name, a
//! correlation id, and optional request data.  A [`Request<T>`] pairs a spec
//! with the parser that turns the server's `responseData` into `T`.
//!
//! The builder functions in the submodules return `Request<T>` values with
//! the right spec and parser already attached:
//!
//! ```rust
//! use obsws_core::request::stream;
//!
//! let request = stream::get_stream_status();
//! assert_eq!(request.spec().request_type, "GetStreamStatus");
//! ```

pub mod batch;
pub mod general;
pub mod inputs;
pub mod scenes;
pub mod stream;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while turning `responseData` into a typed result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseParseError {
    /// The request succeeded but the server sent no `responseData`.
    #[error("response carried no responseData")]
    MissingResponseData,

    /// A required field is absent.
    #[error("response is missing field `{0}`")]
    MissingField(String),

    /// A field is present but has the wrong type.
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: String, reason: String },

    /// The whole payload failed to deserialise into the result type.
    #[error("could not deserialise response: {0}")]
    Deserialize(String),
}

// ── RequestSpec ───────────────────────────────────────────────────────────────

/// The untyped body of a request frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    pub request_type: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

impl RequestSpec {
    /// Creates a spec with a fresh random correlation id.
    pub fn new(request_type: impl Into<String>, request_data: Option<Value>) -> Self {
        Self::with_id(request_type, Uuid::new_v4().to_string(), request_data)
    }

    /// Creates a spec with a caller-chosen correlation id.
    pub fn with_id(
        request_type: impl Into<String>,
        request_id: impl Into<String>,
        request_data: Option<Value>,
    ) -> Self {
        Self {
            request_type: request_type.into(),
            request_id: request_id.into(),
            request_data,
        }
    }

    /// Reads an integer field from `request_data`, if present.
    pub fn data_u64(&self, field: &str) -> Option<u64> {
        self.request_data.as_ref()?.get(field)?.as_u64()
    }
}

// ── Request<T> ────────────────────────────────────────────────────────────────

/// Converts optional `responseData` into a typed result.
pub type ResponseParser<T> =
    Arc<dyn Fn(Option<Value>) -> Result<T, ResponseParseError> + Send + Sync>;

/// A request spec plus the parser for its result.
pub struct Request<T> {
    spec: RequestSpec,
    parser: ResponseParser<T>,
}

impl<T> Clone for Request<T> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            parser: Arc::clone(&self.parser),
        }
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request").field("spec", &self.spec).finish_non_exhaustive()
    }
}

impl<T> Request<T> {
    /// Pairs a spec with an arbitrary parser.
    pub fn new<F>(spec: RequestSpec, parser: F) -> Self
    where
        F: Fn(Option<Value>) -> Result<T, ResponseParseError> + Send + Sync + 'static,
    {
        Self {
            spec,
            parser: Arc::new(parser),
        }
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub fn id(&self) -> &str {
        &self.spec.request_id
    }

    /// Replaces the generated correlation id.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.spec.request_id = id.into();
        self
    }

    /// Runs the parser on a response payload.
    pub fn parse(&self, response_data: Option<Value>) -> Result<T, ResponseParseError> {
        (self.parser)(response_data)
    }

    pub fn into_parts(self) -> (RequestSpec, ResponseParser<T>) {
        (self.spec, self.parser)
    }
}

impl Request<()> {
    /// A request whose response carries nothing of interest.
    pub fn void(spec: RequestSpec) -> Self {
        Self::new(spec, |_| Ok(()))
    }
}

impl Request<Option<Value>> {
    /// A request whose `responseData` is handed back untouched.
    pub fn raw(spec: RequestSpec) -> Self {
        Self::new(spec, Ok)
    }
}

impl<T: DeserializeOwned + 'static> Request<T> {
    /// Deserialises the whole `responseData` object into `T`.
    pub fn structured(spec: RequestSpec) -> Self {
        Self::new(spec, |data| {
            let data = data.ok_or(ResponseParseError::MissingResponseData)?;
            serde_json::from_value(data).map_err(|e| ResponseParseError::Deserialize(e.to_string()))
        })
    }

    /// Extracts one field of `responseData` as `T`.
    pub fn single_field(spec: RequestSpec, field: &'static str) -> Self {
        Self::new(spec, move |data| {
            let object = response_object(data)?;
            take_field(object, field)
        })
    }
}

impl<T: DeserializeOwned + 'static> Request<Vec<T>> {
    /// Extracts one array field of `responseData` as a `Vec<T>`.
    pub fn list_field(spec: RequestSpec, field: &'static str) -> Self {
        Self::new(spec, move |data| {
            let object = response_object(data)?;
            take_field(object, field)
        })
    }
}

fn response_object(data: Option<Value>) -> Result<Map<String, Value>, ResponseParseError> {
    match data {
        Some(Value::Object(object)) => Ok(object),
        Some(other) => Err(ResponseParseError::InvalidField {
            field: "responseData".into(),
            reason: format!("expected an object, got {other}"),
        }),
        None => Err(ResponseParseError::MissingResponseData),
    }
}

fn take_field<T: DeserializeOwned>(
    mut object: Map<String, Value>,
    field: &str,
) -> Result<T, ResponseParseError> {
    let value = object
        .remove(field)
        .ok_or_else(|| ResponseParseError::MissingField(field.to_string()))?;
    serde_json::from_value(value).map_err(|e| ResponseParseError::InvalidField {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

// ── SourceId ──────────────────────────────────────────────────────────────────

/// Scenes, inputs, and other sources can be addressed by name or by UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    Name(String),
    Uuid(String),
}

impl SourceId {
    /// Inserts the `<prefix>Name` / `<prefix>Uuid` field into a request object.
    pub fn insert_into(&self, object: &mut Map<String, Value>, prefix: &str) {
        let (suffix, value) = match self {
            SourceId::Name(v) => ("Name", v),
            SourceId::Uuid(v) => ("Uuid", v),
        };
        object.insert(format!("{prefix}{suffix}"), Value::String(value.clone()));
    }
}

impl From<&str> for SourceId {
    fn from(name: &str) -> Self {
        SourceId::Name(name.to_string())
    }
}

impl From<String> for SourceId {
    fn from(name: String) -> Self {
        SourceId::Name(name)
    }
}

impl From<Uuid> for SourceId {
    fn from(uuid: Uuid) -> Self {
        SourceId::Uuid(uuid.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
