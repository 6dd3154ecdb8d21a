use std::io::{self, Write};

use bytes::Bytes;
use headers::ContentType;
use indexmap::IndexMap;
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};
use tracing::trace;

use super::{PayloadSerializer, PayloadTarget};
use crate::args::ArgValue;
use crate::error::SerializeError;
use crate::model::{Member, Shape, StructureShape};
use crate::request::{OutgoingRequest, RequestBody};

/// XML body encoder.
///
/// The root element is named after the payload member (`locationName` or
/// member name) or, for body members, after the input shape. Lists are written
/// as repeated `<member>` elements, maps as `<entry><key/><value/></entry>`.
#[derive(Debug, Clone, Default)]
pub struct XmlPayload {
    namespace: Option<String>,
}

impl XmlPayload {
    /// Creates an encoder without a default namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace used when the shape does not declare one.
    #[must_use]
    pub fn with_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    /// Encodes a value as an XML document.
    ///
    /// # Errors
    ///
    /// Fails if writing the document fails.
    pub fn to_xml(
        &self,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<Vec<u8>, SerializeError> {
        let mut buf = Vec::with_capacity(512);
        let mut writer = Writer::new(&mut buf);

        match target {
            PayloadTarget::Member { name, member } => {
                let structure = match member.shape() {
                    Shape::Structure(structure) => Some(structure),
                    _ => None,
                };
                let namespace = structure
                    .and_then(StructureShape::xml_namespace)
                    .or(self.namespace.as_deref());
                write_root(&mut writer, member.wire_name(name), namespace, |writer| {
                    write_content(writer, member.shape(), value)
                })
            }
            PayloadTarget::Input(input) => {
                let root = input.location_name().unwrap_or(input.name());
                let namespace = input.xml_namespace().or(self.namespace.as_deref());
                write_root(&mut writer, root, namespace, |writer| match value {
                    ArgValue::Map(entries) => write_members(writer, input, entries),
                    other => write_text(writer, other),
                })
            }
        }
        .map_err(SerializeError::XmlError)?;

        Ok(buf)
    }
}

impl PayloadSerializer for XmlPayload {
    fn payload(
        &self,
        request: &mut OutgoingRequest,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        let data = self.to_xml(target, value)?;
        trace!(size = data.len(), "XML payload encoded");

        request.set_content_type(ContentType::from(mime::TEXT_XML));
        request.set_body(RequestBody::Encoded(Bytes::from(data)));
        Ok(())
    }
}

fn write_root<W, F>(
    writer: &mut Writer<W>,
    tag: &str,
    namespace: Option<&str>,
    content: F,
) -> io::Result<()>
where
    W: Write,
    F: FnOnce(&mut Writer<W>) -> io::Result<()>,
{
    let mut element = writer.create_element(tag);
    if let Some(namespace) = namespace {
        element = element.with_attribute(("xmlns", namespace));
    }
    element.write_inner_content(content)?;
    Ok(())
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    shape: &Shape,
    value: &ArgValue,
) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_inner_content(|writer| write_content(writer, shape, value))?;
    Ok(())
}

fn write_content<W: Write>(
    writer: &mut Writer<W>,
    shape: &Shape,
    value: &ArgValue,
) -> io::Result<()> {
    match (shape, value) {
        (Shape::Structure(structure), ArgValue::Map(entries)) => {
            write_members(writer, structure, entries)
        }
        (Shape::List(member), ArgValue::List(items)) => {
            let tag = member.location_name().unwrap_or("member");
            for item in items.iter().filter(|item| !item.is_null()) {
                write_element(writer, tag, member.shape(), item)?;
            }
            Ok(())
        }
        (Shape::Map { key, value: member }, ArgValue::Map(entries)) => {
            write_entries(writer, key, member, entries)
        }
        (_, other) => write_text(writer, other),
    }
}

fn write_members<W: Write>(
    writer: &mut Writer<W>,
    structure: &StructureShape,
    entries: &IndexMap<String, ArgValue>,
) -> io::Result<()> {
    for (name, item) in entries {
        if item.is_null() {
            continue;
        }
        let Some(member) = structure.member(name) else {
            trace!(
                name = name.as_str(),
                shape = structure.name(),
                "unknown member skipped"
            );
            continue;
        };
        write_element(writer, member.wire_name(name), member.shape(), item)?;
    }
    Ok(())
}

fn write_entries<W: Write>(
    writer: &mut Writer<W>,
    key: &Member,
    value: &Member,
    entries: &IndexMap<String, ArgValue>,
) -> io::Result<()> {
    let key_tag = key.location_name().unwrap_or("key");
    let value_tag = value.location_name().unwrap_or("value");

    for (entry_key, entry_value) in entries {
        writer.create_element("entry").write_inner_content(|writer| {
            writer
                .create_element(key_tag)
                .write_text_content(BytesText::new(entry_key))?;
            write_element(writer, value_tag, value.shape(), entry_value)
        })?;
    }
    Ok(())
}

fn write_text<W: Write>(writer: &mut Writer<W>, value: &ArgValue) -> io::Result<()> {
    let text = value.to_wire_string().map_err(io::Error::other)?;
    writer.write_event(Event::Text(BytesText::new(&text)))
}
