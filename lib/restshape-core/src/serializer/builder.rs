use std::sync::LazyLock;

use url::Url;

use super::RestSerializer;
use crate::error::SerializeError;
use crate::payload::PayloadSerializer;

static DEFAULT_ENDPOINT: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://127.0.0.1/").expect("a valid URL"));

/// Builder for [`RestSerializer`] instances.
///
/// # Default Configuration
///
/// - **Endpoint**: `http://127.0.0.1/`
/// - **Strict validation**: disabled, unknown arguments are ignored and
///   missing URI members expand to nothing
///
/// # Example
///
/// ```rust
/// use restshape_core::{JsonPayload, RestSerializer};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let serializer = RestSerializer::builder()
///     .with_endpoint("https://api.example.com/v1")?
///     .with_strict_validation(true)
///     .build(JsonPayload::new());
///
/// assert!(serializer.is_strict());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestSerializerBuilder {
    endpoint: Url,
    strict: bool,
}

impl Default for RestSerializerBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.clone(),
            strict: false,
        }
    }
}

impl RestSerializerBuilder {
    /// Sets the base endpoint.
    ///
    /// The path of the endpoint is kept: request paths are appended to it.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint is not an absolute `http` or `https` URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, SerializeError> {
        let url = endpoint
            .parse::<Url>()
            .map_err(|error| SerializeError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                error: error.to_string(),
            })?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(SerializeError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                error: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(SerializeError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                error: "query and fragment are not allowed".to_string(),
            });
        }

        self.endpoint = url;
        Ok(self)
    }

    /// Enables or disables strict validation of the arguments.
    ///
    /// When enabled, an argument without matching input member and a URI
    /// member without value fail the serialization.
    #[must_use]
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builds the serializer with the given payload encoder.
    pub fn build<P>(self, payload: P) -> RestSerializer<P>
    where
        P: PayloadSerializer,
    {
        let Self { endpoint, strict } = self;
        RestSerializer {
            endpoint,
            strict,
            payload,
        }
    }
}
