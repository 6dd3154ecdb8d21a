//! Read-only API model: operations, their input shapes and member metadata.

mod shape;
pub use self::shape::{Location, Member, Shape, ShapeType, StructureShape};

mod operation;
pub use self::operation::OperationDescriptor;

mod service;
pub use self::service::ServiceModel;
