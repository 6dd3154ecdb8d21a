use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use super::operation::OperationDescriptor;
use super::shape::{Location, Member, Shape, ShapeType, StructureShape};
use crate::error::ModelError;

/// A read-only collection of operations, looked up by name.
///
/// Usually loaded once from a JSON API description with [`ServiceModel::from_json`]
/// and shared across every serialization.
///
/// # Example
///
/// ```rust
/// use restshape_core::ServiceModel;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let model = ServiceModel::from_json(r#"{
///     "metadata": { "protocol": "rest-json" },
///     "operations": {
///         "GetThing": {
///             "http": { "method": "GET", "requestUri": "/things/{Id}" },
///             "input": { "shape": "GetThingRequest" }
///         }
///     },
///     "shapes": {
///         "GetThingRequest": {
///             "type": "structure",
///             "members": { "Id": { "shape": "String", "location": "uri" } }
///         },
///         "String": { "type": "string" }
///     }
/// }"#)?;
///
/// let operation = model.operation("GetThing").expect("an operation");
/// assert_eq!(operation.request_uri(), "/things/{Id}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServiceModel {
    protocol: Option<String>,
    xml_namespace: Option<String>,
    operations: IndexMap<String, OperationDescriptor>,
}

impl ServiceModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an operation, keyed by its name.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationDescriptor) -> Self {
        self.operations
            .insert(operation.name().to_string(), operation);
        self
    }

    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.get(name)
    }

    /// Iterates over the operations in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDescriptor> + '_ {
        self.operations.values()
    }

    /// The wire protocol declared in the metadata, e.g. `rest-xml`.
    ///
    /// Informational only: serialization never reads it. The caller picks the
    /// [`PayloadSerializer`](crate::PayloadSerializer) to build with.
    ///
    /// ```rust
    /// use restshape_core::{ArgumentMap, JsonPayload, RestSerializer, ServiceModel, XmlPayload};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let model = ServiceModel::from_json(r#"{
    ///     "metadata": { "protocol": "rest-xml" },
    ///     "operations": {
    ///         "ListThings": { "http": { "method": "GET", "requestUri": "/things" } }
    ///     }
    /// }"#)?;
    ///
    /// let args = ArgumentMap::new();
    /// let request = match model.protocol() {
    ///     Some("rest-xml") => RestSerializer::builder()
    ///         .build(XmlPayload::new())
    ///         .serialize_operation(&model, "ListThings", &args)?,
    ///     _ => RestSerializer::builder()
    ///         .build(JsonPayload::new())
    ///         .serialize_operation(&model, "ListThings", &args)?,
    /// };
    /// assert_eq!(request.url().path(), "/things");
    /// # Ok(())
    /// # }
    /// ```
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// The service-wide XML namespace, if declared.
    pub fn xml_namespace(&self) -> Option<&str> {
        self.xml_namespace.as_deref()
    }

    /// Loads a model from a JSON API description.
    ///
    /// Shape references are resolved eagerly into owned trees.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, unknown or recursive shape references,
    /// invalid HTTP methods, unknown locations and unsupported shape types.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let raw = serde_json::from_str::<RawService>(json)?;
        let resolver = Resolver { shapes: &raw.shapes };

        let mut operations = IndexMap::with_capacity(raw.operations.len());
        for (name, raw_operation) in &raw.operations {
            let method = Method::from_str(&raw_operation.http.method).map_err(|_| {
                ModelError::InvalidMethod {
                    operation: name.clone(),
                    method: raw_operation.http.method.clone(),
                }
            })?;

            let mut operation =
                OperationDescriptor::new(name, method, &raw_operation.http.request_uri);
            if let Some(input) = &raw_operation.input {
                let input = resolver.resolve_input(name, input)?;
                operation = operation.with_input(Arc::new(input));
            }
            operations.insert(name.clone(), operation);
        }
        debug!(count = operations.len(), "service model loaded");

        Ok(Self {
            protocol: raw.metadata.protocol,
            xml_namespace: raw.metadata.xml_namespace,
            operations,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    operations: IndexMap<String, RawOperation>,
    #[serde(default)]
    shapes: IndexMap<String, RawShape>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    protocol: Option<String>,
    xml_namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    http: RawHttp,
    input: Option<RawRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHttp {
    method: String,
    #[serde(default = "default_request_uri")]
    request_uri: String,
}

fn default_request_uri() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRef {
    shape: String,
    location: Option<String>,
    location_name: Option<String>,
    #[serde(default)]
    streaming: bool,
    xml_namespace: Option<RawXmlNamespace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShape {
    #[serde(rename = "type")]
    shape_type: String,
    #[serde(default)]
    members: IndexMap<String, RawRef>,
    payload: Option<String>,
    member: Option<RawRef>,
    key: Option<RawRef>,
    value: Option<RawRef>,
    location_name: Option<String>,
    xml_namespace: Option<RawXmlNamespace>,
    #[serde(default)]
    streaming: bool,
}

#[derive(Debug, Deserialize)]
struct RawXmlNamespace {
    uri: String,
}

struct Resolver<'a> {
    shapes: &'a IndexMap<String, RawShape>,
}

impl Resolver<'_> {
    fn resolve_input(&self, operation: &str, input: &RawRef) -> Result<StructureShape, ModelError> {
        let mut stack = Vec::new();
        let shape = self.resolve_shape(operation, &input.shape, &mut stack)?;
        let Shape::Structure(mut structure) = shape else {
            return Err(ModelError::UnsupportedType {
                name: input.shape.clone(),
                shape_type: "non-structure input".to_string(),
            });
        };

        if let Some(location_name) = &input.location_name {
            structure = structure.with_location_name(location_name);
        }
        if let Some(namespace) = &input.xml_namespace {
            structure = structure.with_xml_namespace(&namespace.uri);
        }
        Ok(structure)
    }

    fn resolve_member(
        &self,
        from: &str,
        member_name: &str,
        raw: &RawRef,
        stack: &mut Vec<String>,
    ) -> Result<Member, ModelError> {
        let mut shape = self.resolve_shape(from, &raw.shape, stack)?;
        if let (Shape::Structure(structure), Some(namespace)) = (&mut shape, &raw.xml_namespace) {
            *structure = std::mem::take(structure).with_xml_namespace(&namespace.uri);
        }

        let shape_streaming = self
            .shapes
            .get(&raw.shape)
            .is_some_and(|target| target.streaming);

        let mut member = Member::new(shape)
            .with_location(parse_location(member_name, raw.location.as_deref())?)
            .with_streaming(raw.streaming || shape_streaming);
        if let Some(location_name) = &raw.location_name {
            member = member.with_location_name(location_name);
        }
        Ok(member)
    }

    fn resolve_shape(
        &self,
        from: &str,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<Shape, ModelError> {
        let raw = self
            .shapes
            .get(name)
            .ok_or_else(|| ModelError::UnknownShape {
                name: name.to_string(),
                from: from.to_string(),
            })?;

        if stack.iter().any(|visited| visited == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(ModelError::RecursiveShape { chain });
        }

        stack.push(name.to_string());
        let result = self.build_shape(name, raw, stack);
        stack.pop();
        result
    }

    fn build_shape(
        &self,
        name: &str,
        raw: &RawShape,
        stack: &mut Vec<String>,
    ) -> Result<Shape, ModelError> {
        let shape = match raw.shape_type.as_str() {
            "string" | "character" => Shape::Scalar(ShapeType::String),
            "blob" => Shape::Scalar(ShapeType::Blob),
            "boolean" => Shape::Scalar(ShapeType::Boolean),
            "byte" | "short" | "integer" => Shape::Scalar(ShapeType::Integer),
            "long" => Shape::Scalar(ShapeType::Long),
            "float" => Shape::Scalar(ShapeType::Float),
            "double" => Shape::Scalar(ShapeType::Double),
            "timestamp" => Shape::Scalar(ShapeType::Timestamp),
            "structure" => {
                let mut structure = StructureShape::new(name);
                for (member_name, member_ref) in &raw.members {
                    let member = self.resolve_member(name, member_name, member_ref, stack)?;
                    structure = structure.with_member(member_name, member);
                }
                if let Some(payload) = &raw.payload {
                    structure = structure.with_payload(payload);
                }
                if let Some(location_name) = &raw.location_name {
                    structure = structure.with_location_name(location_name);
                }
                if let Some(namespace) = &raw.xml_namespace {
                    structure = structure.with_xml_namespace(&namespace.uri);
                }
                Shape::Structure(structure)
            }
            "list" => {
                let member = self.required_ref(name, raw.member.as_ref(), "member")?;
                Shape::List(Box::new(self.resolve_member(name, "member", member, stack)?))
            }
            "map" => {
                let key = self.required_ref(name, raw.key.as_ref(), "key")?;
                let value = self.required_ref(name, raw.value.as_ref(), "value")?;
                Shape::Map {
                    key: Box::new(self.resolve_member(name, "key", key, stack)?),
                    value: Box::new(self.resolve_member(name, "value", value, stack)?),
                }
            }
            other => {
                return Err(ModelError::UnsupportedType {
                    name: name.to_string(),
                    shape_type: other.to_string(),
                });
            }
        };
        Ok(shape)
    }

    fn required_ref<'r>(
        &self,
        name: &str,
        raw: Option<&'r RawRef>,
        field: &str,
    ) -> Result<&'r RawRef, ModelError> {
        raw.ok_or_else(|| ModelError::UnknownShape {
            name: format!("{name}.{field}"),
            from: name.to_string(),
        })
    }
}

fn parse_location(member: &str, location: Option<&str>) -> Result<Location, ModelError> {
    match location {
        None => Ok(Location::Body),
        // header maps are declared with `headers`
        Some("header" | "headers") => Ok(Location::Header),
        Some("querystring") => Ok(Location::QueryString),
        Some("uri") => Ok(Location::Uri),
        Some(other) => Err(ModelError::UnknownLocation {
            member: member.to_string(),
            location: other.to_string(),
        }),
    }
}
