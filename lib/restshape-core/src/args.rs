use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::SerializeError;

/// A caller-supplied argument value.
///
/// Mirrors JSON values with an extra [`ArgValue::Blob`] variant for raw bytes.
/// Maps keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ArgValue {
    /// No value.
    ///
    /// Treated as "not set" for the payload, URI, scalar header and query
    /// string members. A header-map member still requires a map and rejects
    /// it.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// Raw bytes.
    Blob(Bytes),
    /// A sequence of values.
    List(Vec<ArgValue>),
    /// String keyed values.
    Map(IndexMap<String, ArgValue>),
}

impl ArgValue {
    /// Returns `true` for [`ArgValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the entries if the value is map-shaped.
    pub fn as_map(&self) -> Option<&IndexMap<String, ArgValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// A short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Blob(_) => "blob",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Coerces the value into its wire string representation.
    ///
    /// Strings are kept verbatim, numbers and booleans use their textual form,
    /// blobs are base64 encoded, lists and maps become compact JSON.
    /// `Null` becomes the empty string.
    pub fn to_wire_string(&self) -> Result<String, SerializeError> {
        let result = match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Blob(data) => STANDARD.encode(data),
            Self::List(_) | Self::Map(_) => serde_json::to_string(self)?,
        };
        Ok(result)
    }

    /// Raw bytes used when the value is sent as an unencoded body.
    pub fn to_raw_bytes(&self) -> Result<Bytes, SerializeError> {
        match self {
            Self::Blob(data) => Ok(data.clone()),
            Self::String(value) => Ok(Bytes::from(value.clone())),
            other => other.to_wire_string().map(Bytes::from),
        }
    }
}

impl Serialize for ArgValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Number(value) => value.serialize(serializer),
            Self::String(value) => serializer.serialize_str(value),
            Self::Blob(data) => serializer.serialize_str(&STANDARD.encode(data)),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(value) => Self::Number(value),
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(items) => items.into_iter().collect(),
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(value: $ty) -> Self {
                    Self::Number(serde_json::Number::from(value))
                }
            }
        )+
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<Bytes> for ArgValue {
    fn from(value: Bytes) -> Self {
        Self::Blob(value)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(Bytes::from(value))
    }
}

impl From<&'static [u8]> for ArgValue {
    fn from(value: &'static [u8]) -> Self {
        Self::Blob(Bytes::from_static(value))
    }
}

impl From<IndexMap<String, ArgValue>> for ArgValue {
    fn from(value: IndexMap<String, ArgValue>) -> Self {
        Self::Map(value)
    }
}

impl<V> FromIterator<V> for ArgValue
where
    V: Into<ArgValue>,
{
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}

/// Caller-supplied arguments of one operation call, keyed by member name.
///
/// Iteration follows insertion order; members of the input shape may be omitted.
///
/// # Example
///
/// ```rust
/// use restshape_core::ArgumentMap;
///
/// let args = ArgumentMap::new()
///     .with("Bucket", "foo")
///     .with("Key", "bar")
///     .with("Body", "123");
///
/// assert_eq!(args.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, derive_more::Deref, derive_more::DerefMut)]
pub struct ArgumentMap(IndexMap<String, ArgValue>);

impl ArgumentMap {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an argument.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the value of an argument if it is present and not `Null`.
    pub fn value(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name).filter(|value| !value.is_null())
    }
}

impl<K, V> FromIterator<(K, V)> for ArgumentMap
where
    K: Into<String>,
    V: Into<ArgValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ArgumentMap {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        value.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a ArgumentMap {
    type Item = (&'a String, &'a ArgValue);
    type IntoIter = indexmap::map::Iter<'a, String, ArgValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
