//! # Restshape Core
//!
//! Turn a REST API operation call into an HTTP request, driven by the
//! operation's description.
//!
//! An operation is described by an [`OperationDescriptor`]: HTTP method, a
//! request URI template such as `/{Bucket}/{Key+}` and an input
//! [`StructureShape`] whose members say where each argument goes:
//!
//! - **[`Location::Uri`]** - substituted into the URI template
//! - **[`Location::Header`]** - sent as a header, or a header per entry for map members
//! - **[`Location::QueryString`]** - sent as a query parameter
//! - **[`Location::Body`]** - encoded in the body by a [`PayloadSerializer`]
//!
//! A member can also be declared as the *payload* of the input shape: string,
//! blob and streaming payloads are sent as-is, other payloads are handed to
//! the [`PayloadSerializer`].
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use restshape_core::{
//!     ArgumentMap, JsonPayload, Location, Member, OperationDescriptor, RestSerializer,
//!     ShapeType, StructureShape,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let input = StructureShape::new("CreateUserRequest")
//!     .with_member("Team", Member::new(ShapeType::String).with_location(Location::Uri))
//!     .with_member(
//!         "Trace",
//!         Member::new(ShapeType::String)
//!             .with_location(Location::Header)
//!             .with_location_name("x-trace-id"),
//!     )
//!     .with_member("Name", Member::new(ShapeType::String).with_location_name("name"));
//! let operation =
//!     OperationDescriptor::new("CreateUser", Method::POST, "/teams/{Team}/users").with_input(input);
//!
//! let serializer = RestSerializer::builder()
//!     .with_endpoint("https://api.example.com")?
//!     .build(JsonPayload::new());
//!
//! let args = ArgumentMap::new()
//!     .with("Team", "core")
//!     .with("Trace", "abc")
//!     .with("Name", "Alice");
//! let request = serializer.serialize(&operation, &args)?;
//!
//! assert_eq!(request.uri()?.as_str(), "https://api.example.com/teams/core/users");
//! assert_eq!(request.headers()["x-trace-id"], "abc");
//! assert_eq!(
//!     request.body().as_bytes().map(|data| data.as_ref()),
//!     Some(br#"{"name":"Alice"}"#.as_slice())
//! );
//!
//! // Send it with reqwest
//! let _request = reqwest::Request::try_from(request)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Service Models
//!
//! Operations are usually loaded from a JSON service description with
//! [`ServiceModel::from_json`], then serialized by name with
//! [`RestSerializer::serialize_operation`].
//!
//! ```rust
//! use restshape_core::{ArgumentMap, NoPayload, RestSerializer, ServiceModel};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = ServiceModel::from_json(r#"{
//!     "metadata": {"protocol": "rest-xml"},
//!     "operations": {
//!         "GetObject": {
//!             "http": {"method": "GET", "requestUri": "/{Bucket}/{Key+}"},
//!             "input": {"shape": "GetObjectRequest"}
//!         }
//!     },
//!     "shapes": {
//!         "GetObjectRequest": {
//!             "type": "structure",
//!             "members": {
//!                 "Bucket": {"shape": "Name", "location": "uri"},
//!                 "Key": {"shape": "Name", "location": "uri"}
//!             }
//!         },
//!         "Name": {"type": "string"}
//!     }
//! }"#)?;
//!
//! let serializer = RestSerializer::builder().build(NoPayload);
//! let args = ArgumentMap::new().with("Bucket", "photos").with("Key", "2024/cat.jpg");
//! let request = serializer.serialize_operation(&model, "GetObject", &args)?;
//!
//! assert_eq!(request.url().path(), "/photos/2024/cat.jpg");
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate logs with [`tracing`]: each serialized request at `DEBUG`,
//! skipped arguments and encoded payload sizes at `TRACE`.

mod args;
mod error;
pub mod model;
pub mod payload;
mod request;
mod serializer;
mod uri;

pub use self::args::{ArgValue, ArgumentMap};
pub use self::error::{ModelError, SerializeError};
pub use self::model::{
    Location, Member, OperationDescriptor, ServiceModel, Shape, ShapeType, StructureShape,
};
pub use self::payload::{JsonPayload, NoPayload, PayloadSerializer, PayloadTarget, XmlPayload};
pub use self::request::{OutgoingRequest, RequestBody};
pub use self::serializer::{RestSerializer, RestSerializerBuilder};
pub use self::uri::{EndpointTemplate, TemplateValue};
