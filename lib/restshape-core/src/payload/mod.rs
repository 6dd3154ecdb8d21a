//! Format-specific body encoders.
//!
//! A [`PayloadSerializer`] is chosen once, when the
//! [`RestSerializer`](crate::RestSerializer) is built:
//!
//! - [`JsonPayload`] - JSON documents (`rest-json`)
//! - [`XmlPayload`] - XML documents (`rest-xml`)
//! - [`NoPayload`] - operations without a structured body

use tracing::warn;

use crate::args::ArgValue;
use crate::error::SerializeError;
use crate::model::{Member, StructureShape};
use crate::request::OutgoingRequest;

mod json;
pub use self::json::JsonPayload;

mod xml;
pub use self::xml::XmlPayload;

/// What a payload value is encoded as.
#[derive(Debug, Clone, Copy)]
pub enum PayloadTarget<'a> {
    /// The explicit payload member of the input shape.
    Member {
        /// The member name.
        name: &'a str,
        /// The member descriptor.
        member: &'a Member,
    },
    /// The whole input shape: the value is the map of body members.
    Input(&'a StructureShape),
}

/// Encodes a structured value into the body of a request.
///
/// Called at most twice per serialization: once for an explicit payload
/// member, once for the aggregate of the body members.
pub trait PayloadSerializer {
    /// Encodes `value` as described by `target` and sets the request body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be encoded.
    fn payload(
        &self,
        request: &mut OutgoingRequest,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<(), SerializeError>;
}

/// Encoder for operations that do not carry a structured body.
///
/// Values are dropped with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPayload;

impl PayloadSerializer for NoPayload {
    fn payload(
        &self,
        request: &mut OutgoingRequest,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        warn!(
            operation = request.operation(),
            ?target,
            kind = value.kind(),
            "no payload encoder configured, body value dropped"
        );
        Ok(())
    }
}
