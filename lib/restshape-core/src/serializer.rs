use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use url::Url;

use crate::args::{ArgValue, ArgumentMap};
use crate::error::SerializeError;
use crate::model::{
    Location, Member, OperationDescriptor, ServiceModel, ShapeType, StructureShape,
};
use crate::payload::{PayloadSerializer, PayloadTarget};
use crate::request::{OutgoingRequest, RequestBody};
use crate::uri::{EndpointTemplate, TemplateValue};

mod builder;
pub use self::builder::RestSerializerBuilder;

/// Serializes REST operations into HTTP requests.
///
/// Each input member is routed by its location: URI members fill the path
/// template, header and query string members become headers and query
/// parameters, the payload member or the remaining body members are handed to
/// the [`PayloadSerializer`] chosen at construction.
///
/// The serializer holds no mutable state and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restshape_core::{
///     ArgumentMap, Location, Member, NoPayload, OperationDescriptor, RestSerializer, ShapeType,
///     StructureShape,
/// };
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let input = StructureShape::new("PutObjectRequest")
///     .with_member("Bucket", Member::new(ShapeType::String).with_location(Location::Uri))
///     .with_member("Key", Member::new(ShapeType::String).with_location(Location::Uri))
///     .with_member("Body", Member::new(ShapeType::Blob))
///     .with_payload("Body");
/// let operation = OperationDescriptor::new("PutObject", Method::PUT, "/{Bucket}/{Key}")
///     .with_input(input);
///
/// let serializer = RestSerializer::builder()
///     .with_endpoint("https://s3.amazonaws.com")?
///     .build(NoPayload);
///
/// let args = ArgumentMap::new()
///     .with("Bucket", "foo")
///     .with("Key", "bar")
///     .with("Body", "123");
/// let request = serializer.serialize(&operation, &args)?;
///
/// assert_eq!(request.uri()?.path(), "/foo/bar");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestSerializer<P> {
    endpoint: Url,
    strict: bool,
    payload: P,
}

impl RestSerializer<()> {
    /// Creates a builder with the default configuration.
    pub fn builder() -> RestSerializerBuilder {
        RestSerializerBuilder::default()
    }
}

impl<P> RestSerializer<P>
where
    P: PayloadSerializer,
{
    /// The base endpoint requests are built against.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The payload encoder.
    pub fn payload_serializer(&self) -> &P {
        &self.payload
    }

    /// Whether unknown arguments and missing URI members are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Looks up an operation by name, then serializes it.
    ///
    /// # Errors
    ///
    /// Fails with [`SerializeError::UnknownOperation`] when the model has no
    /// such operation, otherwise as [`Self::serialize`].
    pub fn serialize_operation(
        &self,
        model: &ServiceModel,
        name: &str,
        args: &ArgumentMap,
    ) -> Result<OutgoingRequest, SerializeError> {
        let operation = model
            .operation(name)
            .ok_or_else(|| SerializeError::UnknownOperation {
                name: name.to_string(),
            })?;
        self.serialize(operation, args)
    }

    /// Builds the HTTP request of an operation call.
    ///
    /// # Errors
    ///
    /// Fails with [`SerializeError::InvalidArgument`] when a header-map member
    /// gets a value that is not a map. Header values and names must be valid
    /// HTTP, and the payload encoder may fail. In strict mode, unknown argument
    /// names and missing URI members are rejected too.
    pub fn serialize(
        &self,
        operation: &OperationDescriptor,
        args: &ArgumentMap,
    ) -> Result<OutgoingRequest, SerializeError> {
        let input = operation.input();
        if self.strict {
            Self::validate(input, args)?;
        }

        let endpoint = self.build_endpoint(operation, args)?;
        let url = endpoint.expand()?;
        let mut request =
            OutgoingRequest::new(operation.method().clone(), url).with_operation(operation.name());

        // Payload trait
        let payload = input.payload();
        if payload.is_some() {
            self.apply_payload(&mut request, input, args)?;
        }

        let mut body_members = IndexMap::new();
        for (name, value) in args {
            let Some(member) = input.member(name) else {
                trace!(
                    name = name.as_str(),
                    shape = input.name(),
                    "no such member, skipped"
                );
                continue;
            };
            match member.location() {
                Location::Body if payload.is_none() => {
                    body_members.insert(name.clone(), value.clone());
                }
                Location::Body | Location::Uri => {}
                Location::Header => Self::apply_header(&mut request, name, member, value)?,
                Location::QueryString => Self::apply_query(&mut request, name, member, value)?,
            }
        }

        if !body_members.is_empty() {
            self.payload.payload(
                &mut request,
                PayloadTarget::Input(input),
                &ArgValue::Map(body_members),
            )?;
        }

        debug!(
            operation = operation.name(),
            method = %request.method(),
            url = %request.url(),
            headers = request.headers().len(),
            query = request.query().len(),
            body = ?request.body(),
            "request serialized"
        );
        Ok(request)
    }

    /// Computes the request target: the unexpanded path template and the
    /// values of every URI member, `None` when the argument is missing.
    ///
    /// List and map arguments stay composite so the template can join their
    /// items.
    ///
    /// # Errors
    ///
    /// Fails when an argument cannot be coerced into a wire string.
    pub fn build_endpoint(
        &self,
        operation: &OperationDescriptor,
        args: &ArgumentMap,
    ) -> Result<EndpointTemplate, SerializeError> {
        operation
            .input()
            .members()
            .filter(|(_, member)| member.location() == Location::Uri)
            .try_fold(
                EndpointTemplate::new(self.endpoint.clone(), operation.request_uri()),
                |template, (name, member)| {
                    let value = args.value(name).map(TemplateValue::try_from).transpose()?;
                    Ok(template.with_variable(member.wire_name(name), value))
                },
            )
    }

    fn apply_payload(
        &self,
        request: &mut OutgoingRequest,
        input: &StructureShape,
        args: &ArgumentMap,
    ) -> Result<(), SerializeError> {
        let Some((name, member)) = input.payload_member() else {
            warn!(
                name = input.payload(),
                shape = input.name(),
                "payload member is not defined"
            );
            return Ok(());
        };
        let Some(value) = args.value(name) else {
            return Ok(());
        };

        if member.is_raw_payload() {
            // streaming bodies and string payloads are sent as-is
            request.set_body(RequestBody::Stream(value.to_raw_bytes()?));
        } else {
            self.payload
                .payload(request, PayloadTarget::Member { name, member }, value)?;
        }
        Ok(())
    }

    fn apply_header(
        request: &mut OutgoingRequest,
        name: &str,
        member: &Member,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        if member.shape_type() == ShapeType::Map {
            return Self::apply_header_map(request, name, member, value);
        }

        match value {
            ArgValue::Null => {}
            ArgValue::List(items) => {
                let header = member.wire_name(name);
                for (index, item) in items.iter().enumerate() {
                    let item = item.to_wire_string()?;
                    if index == 0 {
                        request.set_header(header, &item)?;
                    } else {
                        request.append_header(header, &item)?;
                    }
                }
            }
            other => request.set_header(member.wire_name(name), &other.to_wire_string()?)?,
        }
        Ok(())
    }

    fn apply_header_map(
        request: &mut OutgoingRequest,
        name: &str,
        member: &Member,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        let entries = value
            .as_map()
            .ok_or_else(|| SerializeError::InvalidArgument {
                name: name.to_string(),
                message: format!("must be a map, got a {}", value.kind()),
            })?;

        let prefix = member.location_name().unwrap_or_default();
        for (key, item) in entries {
            request.set_header(&format!("{prefix}{key}"), &item.to_wire_string()?)?;
        }
        Ok(())
    }

    fn apply_query(
        request: &mut OutgoingRequest,
        name: &str,
        member: &Member,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        let values = match value {
            ArgValue::Null => return Ok(()),
            ArgValue::List(items) => items
                .iter()
                .map(ArgValue::to_wire_string)
                .collect::<Result<Vec<_>, _>>()?,
            other => vec![other.to_wire_string()?],
        };
        request.set_query(member.wire_name(name), values);
        Ok(())
    }

    fn validate(input: &StructureShape, args: &ArgumentMap) -> Result<(), SerializeError> {
        if let Some(name) = args.keys().find(|name| input.member(name).is_none()) {
            return Err(SerializeError::UnknownMember {
                name: name.clone(),
                shape: input.name().to_string(),
            });
        }

        let missing = input.members().find(|(name, member)| {
            member.location() == Location::Uri && args.value(name).is_none()
        });
        if let Some((name, _)) = missing {
            return Err(SerializeError::MissingUriArgument {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
