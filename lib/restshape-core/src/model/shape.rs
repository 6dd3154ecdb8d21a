use indexmap::IndexMap;

/// The semantic type of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ShapeType {
    /// UTF-8 text.
    #[display("string")]
    String,
    /// Raw bytes.
    #[display("blob")]
    Blob,
    /// `true` or `false`.
    #[display("boolean")]
    Boolean,
    /// 32 bits signed integer.
    #[display("integer")]
    Integer,
    /// 64 bits signed integer.
    #[display("long")]
    Long,
    /// Single precision floating point.
    #[display("float")]
    Float,
    /// Double precision floating point.
    #[display("double")]
    Double,
    /// A point in time.
    #[display("timestamp")]
    Timestamp,
    /// Named members.
    #[display("structure")]
    Structure,
    /// Homogeneous sequence.
    #[display("list")]
    List,
    /// String keyed map.
    #[display("map")]
    Map,
}

/// The part of an HTTP request a member is serialized into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum Location {
    /// No explicit location: the member is carried in the body.
    #[default]
    #[display("body")]
    Body,
    /// An HTTP header (or a family of headers for maps).
    #[display("header")]
    Header,
    /// A query string parameter.
    #[display("querystring")]
    QueryString,
    /// A placeholder of the request URI template.
    #[display("uri")]
    Uri,
}

/// A schema node: the type of a value and the nested shapes it is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A scalar type (anything but structure, list and map).
    Scalar(ShapeType),
    /// A structure with named members.
    Structure(StructureShape),
    /// A list whose elements are described by the member.
    List(Box<Member>),
    /// A map with described keys and values.
    Map {
        /// The key member.
        key: Box<Member>,
        /// The value member.
        value: Box<Member>,
    },
}

impl Shape {
    /// Returns the semantic type of this shape.
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Scalar(shape_type) => *shape_type,
            Self::Structure(_) => ShapeType::Structure,
            Self::List(_) => ShapeType::List,
            Self::Map { .. } => ShapeType::Map,
        }
    }

    /// Creates a list shape of the given element shape.
    pub fn list(member: Member) -> Self {
        Self::List(Box::new(member))
    }

    /// Creates a map shape with string keys and the given value shape.
    pub fn map(value: Member) -> Self {
        Self::Map {
            key: Box::new(Member::new(ShapeType::String)),
            value: Box::new(value),
        }
    }
}

impl From<ShapeType> for Shape {
    fn from(value: ShapeType) -> Self {
        match value {
            ShapeType::Structure => Self::Structure(StructureShape::default()),
            ShapeType::List => Self::list(Member::new(ShapeType::String)),
            ShapeType::Map => Self::map(Member::new(ShapeType::String)),
            scalar => Self::Scalar(scalar),
        }
    }
}

impl From<StructureShape> for Shape {
    fn from(value: StructureShape) -> Self {
        Self::Structure(value)
    }
}

/// Per-field metadata: a shape plus where and how it goes on the wire.
///
/// # Example
///
/// ```rust
/// use restshape_core::{Location, Member, ShapeType};
///
/// let content_type = Member::new(ShapeType::String)
///     .with_location(Location::Header)
///     .with_location_name("Content-Type");
///
/// assert_eq!(content_type.wire_name("ContentType"), "Content-Type");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    shape: Shape,
    location: Location,
    location_name: Option<String>,
    streaming: bool,
}

impl Member {
    /// Creates a body-located member of the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            location: Location::Body,
            location_name: None,
            streaming: false,
        }
    }

    /// Sets the location of the member.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Sets the wire name override.
    #[must_use]
    pub fn with_location_name(mut self, location_name: impl Into<String>) -> Self {
        self.location_name = Some(location_name.into());
        self
    }

    /// Marks the member as a raw data stream.
    #[must_use]
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// The member's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The member's semantic type.
    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type()
    }

    /// The member's location.
    pub fn location(&self) -> Location {
        self.location
    }

    /// The explicit wire name, if any.
    pub fn location_name(&self) -> Option<&str> {
        self.location_name.as_deref()
    }

    /// The wire name: `locationName` when declared, the member name otherwise.
    pub fn wire_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.location_name.as_deref().unwrap_or(name)
    }

    /// Whether the value is transmitted as raw bytes.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Whether the value is sent as-is when used as the payload member.
    ///
    /// Streaming members, strings and blobs are never structurally encoded.
    pub fn is_raw_payload(&self) -> bool {
        self.streaming || matches!(self.shape_type(), ShapeType::String | ShapeType::Blob)
    }
}

/// A structure shape: ordered members and an optional payload member.
///
/// Used as the input shape of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureShape {
    name: String,
    members: IndexMap<String, Member>,
    payload: Option<String>,
    location_name: Option<String>,
    xml_namespace: Option<String>,
}

impl StructureShape {
    /// Creates an empty structure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds (or replaces) a member.
    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.members.insert(name.into(), member);
        self
    }

    /// Designates the payload member.
    ///
    /// A structure has at most one payload member, the last call wins.
    #[must_use]
    pub fn with_payload(mut self, name: impl Into<String>) -> Self {
        self.payload = Some(name.into());
        self
    }

    /// Sets the element name used when the structure is the root of an XML body.
    #[must_use]
    pub fn with_location_name(mut self, location_name: impl Into<String>) -> Self {
        self.location_name = Some(location_name.into());
        self
    }

    /// Sets the XML namespace written on the root element.
    #[must_use]
    pub fn with_xml_namespace(mut self, uri: impl Into<String>) -> Self {
        self.xml_namespace = Some(uri.into());
        self
    }

    /// The shape name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Iterates over the members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> + '_ {
        self.members
            .iter()
            .map(|(name, member)| (name.as_str(), member))
    }

    /// The payload member name, if declared.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// The payload member name and descriptor, if declared and defined.
    pub fn payload_member(&self) -> Option<(&str, &Member)> {
        let name = self.payload.as_deref()?;
        self.members.get(name).map(|member| (name, member))
    }

    /// The explicit element name, if any.
    pub fn location_name(&self) -> Option<&str> {
        self.location_name.as_deref()
    }

    /// The XML namespace, if any.
    pub fn xml_namespace(&self) -> Option<&str> {
        self.xml_namespace.as_deref()
    }
}
