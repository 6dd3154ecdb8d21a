use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use indexmap::IndexMap;
use url::Url;

use crate::error::SerializeError;

/// The body of an outgoing request.
#[derive(Clone, Default, PartialEq, derive_more::Debug)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Raw data sent as-is.
    #[debug("Stream({} bytes)", _0.len())]
    Stream(Bytes),
    /// Data produced by a payload encoder.
    #[debug("Encoded({} bytes)", _0.len())]
    Encoded(Bytes),
}

impl RequestBody {
    /// Returns `true` when there is no body.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The body bytes, if any.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Empty => None,
            Self::Stream(data) | Self::Encoded(data) => Some(data),
        }
    }
}

/// A request being built: method, target, headers, query parameters and body.
///
/// Headers are case-insensitive and may hold several values. Query parameters
/// keep their insertion order and are appended after the literal query of the
/// URL, if any.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restshape_core::OutgoingRequest;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut request = OutgoingRequest::new(Method::GET, "https://example.com/foo?acl".parse()?);
/// request.set_query("max-keys", vec!["10".to_string()]);
/// request.set_header("x-amz-request-payer", "requester")?;
///
/// assert_eq!(request.uri()?.as_str(), "https://example.com/foo?acl&max-keys=10");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    query: IndexMap<String, Vec<String>>,
    body: RequestBody,
    operation: Option<String>,
}

impl OutgoingRequest {
    /// Creates a request without headers, query parameters or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: IndexMap::new(),
            body: RequestBody::Empty,
            operation: None,
        }
    }

    /// Attaches the name of the operation this request was built for.
    #[must_use]
    pub fn with_operation(mut self, name: impl Into<String>) -> Self {
        self.operation = Some(name.into());
        self
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target URL, without the query parameters added with [`Self::set_query`].
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The query parameters.
    pub fn query(&self) -> &IndexMap<String, Vec<String>> {
        &self.query
    }

    /// The body.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// The operation name, if attached.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Sets a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Fails if the name or the value is not valid in an HTTP header.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), SerializeError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Adds a header value, keeping the previous ones.
    ///
    /// # Errors
    ///
    /// Fails if the name or the value is not valid in an HTTP header.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<(), SerializeError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Sets the `Content-Type` header.
    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.headers.typed_insert(content_type);
    }

    /// Sets a query parameter, replacing any previous values.
    pub fn set_query(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.query.insert(name.into(), values);
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: RequestBody) {
        self.body = body;
    }

    /// The encoded query string: the literal query of the URL followed by the
    /// query parameters, `None` when both are empty.
    ///
    /// # Errors
    ///
    /// Fails if the query parameters cannot be URL-encoded.
    pub fn query_string(&self) -> Result<Option<String>, SerializeError> {
        let pairs = self
            .query
            .iter()
            .flat_map(|(name, values)| {
                values
                    .iter()
                    .map(move |value| (name.as_str(), value.as_str()))
            })
            .collect::<Vec<_>>();
        let encoded = serde_urlencoded::to_string(&pairs)?;

        let parts = [self.url.query().unwrap_or_default(), encoded.as_str()];
        let query = parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("&");

        Ok((!query.is_empty()).then_some(query))
    }

    /// The final target URL, query parameters included.
    ///
    /// # Errors
    ///
    /// Fails if the query parameters cannot be URL-encoded.
    pub fn uri(&self) -> Result<Url, SerializeError> {
        let mut url = self.url.clone();
        let query = self.query_string()?;
        url.set_query(query.as_deref());
        Ok(url)
    }

    /// Converts into an [`http::Request`].
    ///
    /// # Errors
    ///
    /// Fails if the target URL cannot be represented as an [`http::Uri`].
    pub fn into_http(self) -> Result<http::Request<Bytes>, SerializeError> {
        let uri = self.uri()?;
        let Self {
            method,
            headers,
            body,
            ..
        } = self;

        let mut request = http::Request::builder()
            .method(method)
            .uri(uri.as_str())
            .body(body.as_bytes().cloned().unwrap_or_default())?;
        *request.headers_mut() = headers;

        Ok(request)
    }
}

impl TryFrom<OutgoingRequest> for reqwest::Request {
    type Error = SerializeError;

    fn try_from(value: OutgoingRequest) -> Result<Self, Self::Error> {
        let url = value.uri()?;
        let OutgoingRequest {
            method,
            headers,
            body,
            ..
        } = value;

        let mut request = reqwest::Request::new(method, url);
        *request.headers_mut() = headers;
        if let Some(data) = body.as_bytes() {
            *request.body_mut() = Some(reqwest::Body::from(data.clone()));
        }

        Ok(request)
    }
}
