/// Errors that can occur while serializing an operation into an HTTP request.
///
/// Serialization is permissive: missing URI variables, unknown
/// argument names and absent payload values are not errors unless strict
/// validation is enabled on the [`RestSerializer`](crate::RestSerializer).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum SerializeError {
    /// An argument value does not have the shape its member requires.
    ///
    /// Raised when a header-map member receives a value that is not a map.
    #[display("Invalid argument '{name}': {message}")]
    #[from(skip)]
    InvalidArgument {
        /// The member name of the offending argument.
        name: String,
        /// What was wrong with the value.
        message: String,
    },

    /// Invalid HTTP header name.
    ///
    /// Occurs when a member's `locationName` (or a header-map key) is not a valid header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    ///
    /// Occurs when an argument coerced to its wire string contains invalid characters.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// URL parsing error when constructing the request URL.
    UrlError(url::ParseError),

    /// HTTP protocol error from the http crate.
    HttpError(http::Error),

    /// JSON body encoding error.
    JsonError(serde_json::Error),

    /// XML body encoding error.
    #[from(skip)]
    #[display("XML encoding error: {_0}")]
    XmlError(std::io::Error),

    /// Query string encoding error.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// The endpoint cannot be used as a base URL.
    #[display("Invalid endpoint '{endpoint}': {error}")]
    #[from(skip)]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        error: String,
    },

    /// No operation with that name exists in the service model.
    #[display("Unknown operation: {name}")]
    #[from(skip)]
    UnknownOperation {
        /// The operation name that was looked up.
        name: String,
    },

    /// Strict validation only: an argument does not match any input member.
    #[display("Unknown member '{name}' for input shape '{shape}'")]
    #[from(skip)]
    UnknownMember {
        /// The argument name.
        name: String,
        /// The input shape name.
        shape: String,
    },

    /// Strict validation only: a URI-located member has no value.
    #[display("Missing value for URI member '{name}'")]
    #[from(skip)]
    MissingUriArgument {
        /// The member name.
        name: String,
    },
}

/// Errors raised while loading a service model description.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ModelError {
    /// The model document is not valid JSON or does not match the expected layout.
    JsonError(serde_json::Error),

    /// A shape reference points to a shape that is not defined.
    #[display("Unknown shape '{name}' referenced from '{from}'")]
    #[from(skip)]
    UnknownShape {
        /// The missing shape name.
        name: String,
        /// The referencing shape or operation.
        from: String,
    },

    /// A shape references itself, directly or through other shapes.
    #[display("Recursive shape reference: {}", chain.join(" -> "))]
    #[from(skip)]
    RecursiveShape {
        /// The reference chain that closes the cycle.
        chain: Vec<String>,
    },

    /// The HTTP method of an operation is not valid.
    #[display("Invalid HTTP method '{method}' for operation '{operation}'")]
    #[from(skip)]
    InvalidMethod {
        /// The operation name.
        operation: String,
        /// The rejected method.
        method: String,
    },

    /// A member declares a location this serializer does not know.
    #[display("Unknown location '{location}' on member '{member}'")]
    #[from(skip)]
    UnknownLocation {
        /// The member name.
        member: String,
        /// The rejected location.
        location: String,
    },

    /// A shape type is not supported.
    #[display("Unsupported type '{shape_type}' for shape '{name}'")]
    #[from(skip)]
    UnsupportedType {
        /// The shape name.
        name: String,
        /// The rejected type.
        shape_type: String,
    },
}
