use bytes::Bytes;
use headers::ContentType;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use super::{PayloadSerializer, PayloadTarget};
use crate::args::ArgValue;
use crate::error::SerializeError;
use crate::model::{Shape, StructureShape};
use crate::request::{OutgoingRequest, RequestBody};

/// JSON body encoder.
///
/// Structure members are written under their `locationName` (or member name),
/// `Null` members are omitted, blobs are base64 encoded.
///
/// # Example
///
/// ```rust
/// use restshape_core::JsonPayload;
///
/// let payload = JsonPayload::new()
///     .with_content_type("application/x-amz-json-1.1".parse().expect("a mime"));
/// ```
#[derive(Debug, Clone)]
pub struct JsonPayload {
    content_type: mime::Mime,
}

impl Default for JsonPayload {
    fn default() -> Self {
        Self {
            content_type: mime::APPLICATION_JSON,
        }
    }
}

impl JsonPayload {
    /// Creates an encoder using `application/json`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the content type sent with the body.
    #[must_use]
    pub fn with_content_type(mut self, content_type: mime::Mime) -> Self {
        self.content_type = content_type;
        self
    }

    /// Converts a value into JSON as described by the target.
    pub fn to_json(
        &self,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<Value, SerializeError> {
        match target {
            PayloadTarget::Member { member, .. } => shape_to_json(member.shape(), value),
            PayloadTarget::Input(input) => match value {
                ArgValue::Map(entries) => structure_to_json(input, entries),
                other => plain_json(other),
            },
        }
    }
}

impl PayloadSerializer for JsonPayload {
    fn payload(
        &self,
        request: &mut OutgoingRequest,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        let json = self.to_json(target, value)?;
        let data = serde_json::to_vec(&json)?;
        trace!(size = data.len(), "JSON payload encoded");

        request.set_content_type(ContentType::from(self.content_type.clone()));
        request.set_body(RequestBody::Encoded(Bytes::from(data)));
        Ok(())
    }
}

fn shape_to_json(shape: &Shape, value: &ArgValue) -> Result<Value, SerializeError> {
    match (shape, value) {
        (Shape::Structure(structure), ArgValue::Map(entries)) => {
            structure_to_json(structure, entries)
        }
        (Shape::List(member), ArgValue::List(items)) => items
            .iter()
            .map(|item| shape_to_json(member.shape(), item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Shape::Map { value: member, .. }, ArgValue::Map(entries)) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, item) in entries {
                object.insert(key.clone(), shape_to_json(member.shape(), item)?);
            }
            Ok(Value::Object(object))
        }
        (_, other) => plain_json(other),
    }
}

fn structure_to_json(
    structure: &StructureShape,
    entries: &IndexMap<String, ArgValue>,
) -> Result<Value, SerializeError> {
    let mut object = Map::with_capacity(entries.len());
    for (name, item) in entries {
        if item.is_null() {
            continue;
        }
        let Some(member) = structure.member(name) else {
            trace!(name = name.as_str(), shape = structure.name(), "unknown member skipped");
            continue;
        };
        object.insert(
            member.wire_name(name).to_string(),
            shape_to_json(member.shape(), item)?,
        );
    }
    Ok(Value::Object(object))
}

fn plain_json(value: &ArgValue) -> Result<Value, SerializeError> {
    serde_json::to_value(value).map_err(SerializeError::from)
}
