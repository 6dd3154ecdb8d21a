use std::sync::Arc;

use http::Method;

use super::shape::StructureShape;

/// Immutable definition of one API call.
///
/// The input shape is shared so that descriptors can be cloned cheaply
/// out of a long-lived [`ServiceModel`](super::ServiceModel).
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    name: String,
    method: Method,
    request_uri: String,
    input: Arc<StructureShape>,
}

impl OperationDescriptor {
    /// Creates an operation with an empty input shape.
    ///
    /// # Example
    ///
    /// ```rust
    /// use http::Method;
    /// use restshape_core::OperationDescriptor;
    ///
    /// let operation = OperationDescriptor::new("ListBuckets", Method::GET, "/");
    /// assert!(operation.input().members().next().is_none());
    /// ```
    pub fn new(name: impl Into<String>, method: Method, request_uri: impl Into<String>) -> Self {
        let name = name.into();
        let input = Arc::new(StructureShape::new(format!("{name}Request")));
        Self {
            name,
            method,
            request_uri: request_uri.into(),
            input,
        }
    }

    /// Sets the input shape.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<Arc<StructureShape>>) -> Self {
        self.input = input.into();
        self
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URI path template, e.g. `/{Bucket}/{Key+}`.
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// The input shape.
    pub fn input(&self) -> &StructureShape {
        &self.input
    }
}
