use std::sync::Mutex;

use bytes::Bytes;
use http::Method;
use serde_json::json;

use super::*;
use crate::model::Shape;
use crate::payload::NoPayload;

/// Records every call instead of encoding.
#[derive(Debug, Default)]
struct RecordingPayload {
    calls: Mutex<Vec<(String, ArgValue)>>,
}

impl RecordingPayload {
    fn calls(&self) -> Vec<(String, ArgValue)> {
        self.calls.lock().expect("not poisoned").clone()
    }
}

impl PayloadSerializer for RecordingPayload {
    fn payload(
        &self,
        request: &mut OutgoingRequest,
        target: PayloadTarget<'_>,
        value: &ArgValue,
    ) -> Result<(), SerializeError> {
        let target = match target {
            PayloadTarget::Member { name, .. } => format!("member:{name}"),
            PayloadTarget::Input(input) => format!("input:{}", input.name()),
        };
        self.calls
            .lock()
            .expect("not poisoned")
            .push((target, value.clone()));
        request.set_body(RequestBody::Encoded(Bytes::from_static(b"encoded")));
        Ok(())
    }
}

fn serializer<P: PayloadSerializer>(payload: P) -> RestSerializer<P> {
    RestSerializer::builder()
        .with_endpoint("https://s3.amazonaws.com")
        .expect("valid endpoint")
        .build(payload)
}

fn strict_serializer() -> RestSerializer<RecordingPayload> {
    RestSerializer::builder()
        .with_endpoint("https://s3.amazonaws.com")
        .expect("valid endpoint")
        .with_strict_validation(true)
        .build(RecordingPayload::default())
}

fn uri_member() -> Member {
    Member::new(ShapeType::String).with_location(Location::Uri)
}

fn put_object() -> OperationDescriptor {
    let input = StructureShape::new("PutObjectRequest")
        .with_member("Bucket", uri_member())
        .with_member("Key", uri_member())
        .with_member(
            "ContentType",
            Member::new(ShapeType::String)
                .with_location(Location::Header)
                .with_location_name("Content-Type"),
        )
        .with_member(
            "Metadata",
            Member::new(Shape::map(Member::new(ShapeType::String)))
                .with_location(Location::Header)
                .with_location_name("x-amz-meta-"),
        )
        .with_member("Body", Member::new(ShapeType::Blob).with_streaming(true))
        .with_payload("Body");

    OperationDescriptor::new("PutObject", Method::PUT, "/{Bucket}/{Key+}").with_input(input)
}

fn list_objects() -> OperationDescriptor {
    let input = StructureShape::new("ListObjectsRequest")
        .with_member("Bucket", uri_member())
        .with_member(
            "Prefix",
            Member::new(ShapeType::String)
                .with_location(Location::QueryString)
                .with_location_name("prefix"),
        )
        .with_member(
            "MaxKeys",
            Member::new(ShapeType::Integer)
                .with_location(Location::QueryString)
                .with_location_name("max-keys"),
        )
        .with_member(
            "Tags",
            Member::new(Shape::list(Member::new(ShapeType::String)))
                .with_location(Location::QueryString)
                .with_location_name("tag"),
        );

    OperationDescriptor::new("ListObjects", Method::GET, "/{Bucket}?list-type=2").with_input(input)
}

fn create_thing() -> OperationDescriptor {
    let input = StructureShape::new("CreateThingRequest")
        .with_member("Id", uri_member())
        .with_member(
            "Token",
            Member::new(ShapeType::String)
                .with_location(Location::Header)
                .with_location_name("x-token"),
        )
        .with_member("Name", Member::new(ShapeType::String))
        .with_member("Size", Member::new(ShapeType::Integer));

    OperationDescriptor::new("CreateThing", Method::POST, "/things/{Id}").with_input(input)
}

fn header_text<'a>(request: &'a OutgoingRequest, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[test]
fn test_put_object_end_to_end() {
    let serializer = serializer(RecordingPayload::default());
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", "bar")
        .with("Body", "123");

    let request = serializer
        .serialize(&put_object(), &args)
        .expect("should serialize");

    assert_eq!(request.method(), &Method::PUT);
    insta::assert_snapshot!(request.url(), @"https://s3.amazonaws.com/foo/bar");
    assert_eq!(
        request.body(),
        &RequestBody::Stream(Bytes::from_static(b"123"))
    );
    assert_eq!(request.operation(), Some("PutObject"));
    assert!(serializer.payload_serializer().calls().is_empty());
}

#[test]
fn test_uri_members_are_percent_encoded() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new()
        .with("Bucket", "my bucket")
        .with("Key", "photos/2024/a b.jpg");

    let request = serializer
        .serialize(&put_object(), &args)
        .expect("should serialize");

    insta::assert_snapshot!(request.url().path(), @"/my%20bucket/photos/2024/a%20b.jpg");
}

#[test]
fn test_missing_uri_member_expands_to_nothing() {
    let serializer = serializer(NoPayload);

    let missing = ArgumentMap::new().with("Bucket", "foo");
    let null = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", ArgValue::Null);

    for args in [missing, null] {
        let request = serializer
            .serialize(&put_object(), &args)
            .expect("should serialize");
        assert_eq!(request.url().path(), "/foo/");
        assert!(!request.url().as_str().contains("null"));
    }
}

#[test]
fn test_build_endpoint_lists_every_uri_member() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new().with("Bucket", "foo").with("Body", "x");

    let endpoint = serializer
        .build_endpoint(&put_object(), &args)
        .expect("should build");

    assert_eq!(endpoint.template(), "/{Bucket}/{Key+}");
    assert_eq!(endpoint.variables().len(), 2);
    assert_eq!(
        endpoint.variables().get("Bucket"),
        Some(&Some(TemplateValue::from("foo")))
    );
    assert_eq!(endpoint.variables().get("Key"), Some(&None));
}

#[test]
fn test_list_uri_member_is_comma_joined() {
    let input = StructureShape::new("GetItemsRequest")
        .with_member("Key", uri_member())
        .with_member(
            "Ids",
            Member::new(Shape::list(Member::new(ShapeType::String)))
                .with_location(Location::Uri),
        );
    let operation =
        OperationDescriptor::new("GetItems", Method::GET, "/{+Key}/{Ids}").with_input(input);
    let serializer = RestSerializer::builder()
        .with_endpoint("https://e.com")
        .expect("valid endpoint")
        .build(NoPayload);
    let args = ArgumentMap::new()
        .with("Key", "a/b")
        .with("Ids", ArgValue::from(json!(["x", "y"])));

    let endpoint = serializer
        .build_endpoint(&operation, &args)
        .expect("should build");
    assert_eq!(
        endpoint.variables().get("Ids"),
        Some(&Some(TemplateValue::List(vec![
            "x".to_string(),
            "y".to_string()
        ])))
    );

    let request = serializer
        .serialize(&operation, &args)
        .expect("should serialize");
    insta::assert_snapshot!(request.url(), @"https://e.com/a/b/x,y");
}

#[test]
fn test_header_map_uses_prefix() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", "bar")
        .with("Metadata", ArgValue::from(json!({"a": "1", "b": "2"})));

    let request = serializer
        .serialize(&put_object(), &args)
        .expect("should serialize");

    assert_eq!(header_text(&request, "x-amz-meta-a"), Some("1"));
    assert_eq!(header_text(&request, "x-amz-meta-b"), Some("2"));
    assert_eq!(request.headers().len(), 2);
}

#[test]
fn test_header_map_rejects_non_map_value() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", "bar")
        .with("Metadata", "oops");

    let error = serializer
        .serialize(&put_object(), &args)
        .expect_err("should fail");

    insta::assert_snapshot!(error, @"Invalid argument 'Metadata': must be a map, got a string");
}

#[test]
fn test_content_type_header() {
    let serializer = serializer(NoPayload);
    let operation = put_object();

    let with_header = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", "bar")
        .with("ContentType", "text/plain");
    let request = serializer
        .serialize(&operation, &with_header)
        .expect("should serialize");
    assert_eq!(header_text(&request, "content-type"), Some("text/plain"));

    let without_header = ArgumentMap::new().with("Bucket", "foo").with("Key", "bar");
    let request = serializer
        .serialize(&operation, &without_header)
        .expect("should serialize");
    assert!(request.headers().get("content-type").is_none());
}

#[test]
fn test_scalar_headers_are_coerced() {
    let input = StructureShape::new("Input")
        .with_member(
            "Flag",
            Member::new(ShapeType::Boolean)
                .with_location(Location::Header)
                .with_location_name("x-flag"),
        )
        .with_member(
            "Checksum",
            Member::new(ShapeType::Blob)
                .with_location(Location::Header)
                .with_location_name("x-checksum"),
        )
        .with_member(
            "Values",
            Member::new(Shape::list(Member::new(ShapeType::String)))
                .with_location(Location::Header)
                .with_location_name("x-value"),
        )
        .with_member(
            "Skipped",
            Member::new(ShapeType::String)
                .with_location(Location::Header)
                .with_location_name("x-skipped"),
        );
    let operation = OperationDescriptor::new("Op", Method::GET, "/").with_input(input);
    let args = ArgumentMap::new()
        .with("Flag", true)
        .with("Checksum", b"hi".as_slice())
        .with("Values", ArgValue::from_iter(["a", "b"]))
        .with("Skipped", ArgValue::Null);

    let request = serializer(NoPayload)
        .serialize(&operation, &args)
        .expect("should serialize");

    assert_eq!(header_text(&request, "x-flag"), Some("true"));
    assert_eq!(header_text(&request, "x-checksum"), Some("aGk="));
    let values: Vec<_> = request
        .headers()
        .get_all("x-value")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    assert_eq!(values, vec!["a", "b"]);
    assert!(request.headers().get("x-skipped").is_none());
}

#[test]
fn test_query_string_members() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Prefix", "photos/")
        .with("MaxKeys", 10)
        .with("Tags", ArgValue::from_iter(["a", "b"]));

    let request = serializer
        .serialize(&list_objects(), &args)
        .expect("should serialize");

    let uri = request.uri().expect("valid uri");
    insta::assert_snapshot!(uri, @"https://s3.amazonaws.com/foo?list-type=2&prefix=photos%2F&max-keys=10&tag=a&tag=b");
}

#[test]
fn test_null_query_member_is_skipped() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Prefix", ArgValue::Null);

    let request = serializer
        .serialize(&list_objects(), &args)
        .expect("should serialize");

    assert!(request.query().is_empty());
}

#[test]
fn test_body_members_are_aggregated() {
    let serializer = serializer(RecordingPayload::default());
    let args = ArgumentMap::new()
        .with("Id", "42")
        .with("Name", "box")
        .with("Token", "secret")
        .with("Size", 3);

    let request = serializer
        .serialize(&create_thing(), &args)
        .expect("should serialize");

    assert_eq!(request.url().path(), "/things/42");
    assert_eq!(header_text(&request, "x-token"), Some("secret"));
    assert_eq!(
        serializer.payload_serializer().calls(),
        vec![(
            "input:CreateThingRequest".to_string(),
            ArgValue::from(json!({"Name": "box", "Size": 3}))
        )]
    );
    assert_eq!(
        request.body(),
        &RequestBody::Encoded(Bytes::from_static(b"encoded"))
    );
}

#[test]
fn test_no_body_members_means_no_payload_call() {
    let serializer = serializer(RecordingPayload::default());
    let args = ArgumentMap::new().with("Id", "42");

    let request = serializer
        .serialize(&create_thing(), &args)
        .expect("should serialize");

    assert!(serializer.payload_serializer().calls().is_empty());
    assert!(request.body().is_empty());
}

#[test]
fn test_structured_payload_member_uses_hook() {
    let configuration = StructureShape::new("CreateBucketConfiguration")
        .with_member("LocationConstraint", Member::new(ShapeType::String));
    let input = StructureShape::new("CreateBucketRequest")
        .with_member("Bucket", uri_member())
        .with_member(
            "CreateBucketConfiguration",
            Member::new(configuration).with_location_name("CreateBucketConfiguration"),
        )
        .with_member("Loose", Member::new(ShapeType::String))
        .with_payload("CreateBucketConfiguration");
    let operation =
        OperationDescriptor::new("CreateBucket", Method::PUT, "/{Bucket}").with_input(input);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with(
            "CreateBucketConfiguration",
            ArgValue::from(json!({"LocationConstraint": "eu-west-1"})),
        )
        .with("Loose", "dropped");

    let serializer = serializer(RecordingPayload::default());
    serializer
        .serialize(&operation, &args)
        .expect("should serialize");

    // a declared payload replaces the body members
    assert_eq!(
        serializer.payload_serializer().calls(),
        vec![(
            "member:CreateBucketConfiguration".to_string(),
            ArgValue::from(json!({"LocationConstraint": "eu-west-1"}))
        )]
    );
}

#[test]
fn test_declared_payload_drops_loose_body_members_when_absent() {
    let configuration = StructureShape::new("CreateBucketConfiguration")
        .with_member("LocationConstraint", Member::new(ShapeType::String));
    let input = StructureShape::new("CreateBucketRequest")
        .with_member("Bucket", uri_member())
        .with_member("CreateBucketConfiguration", Member::new(configuration))
        .with_member("Loose", Member::new(ShapeType::String))
        .with_payload("CreateBucketConfiguration");
    let operation =
        OperationDescriptor::new("CreateBucket", Method::PUT, "/{Bucket}").with_input(input);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Loose", "dropped");

    let serializer = serializer(RecordingPayload::default());
    let request = serializer
        .serialize(&operation, &args)
        .expect("should serialize");

    assert!(serializer.payload_serializer().calls().is_empty());
    assert!(matches!(request.body(), RequestBody::Empty));
    assert_eq!(request.url().path(), "/foo");
}

#[test]
fn test_null_header_map_value_is_rejected() {
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", "bar")
        .with("Metadata", ArgValue::Null);

    let error = serializer
        .serialize(&put_object(), &args)
        .expect_err("should fail");

    insta::assert_snapshot!(error, @"Invalid argument 'Metadata': must be a map, got a null");
}

#[test]
fn test_omitted_payload_leaves_body_empty() {
    let serializer = serializer(RecordingPayload::default());
    let args = ArgumentMap::new()
        .with("Bucket", "foo")
        .with("Key", "bar")
        .with("Body", ArgValue::Null);

    let request = serializer
        .serialize(&put_object(), &args)
        .expect("should serialize");

    assert!(request.body().is_empty());
    assert!(serializer.payload_serializer().calls().is_empty());
}

#[test]
fn test_string_payload_is_raw() {
    let input = StructureShape::new("PutPolicyRequest")
        .with_member("Policy", Member::new(ShapeType::String))
        .with_payload("Policy");
    let operation = OperationDescriptor::new("PutPolicy", Method::PUT, "/?policy").with_input(input);
    let args = ArgumentMap::new().with("Policy", r#"{"Version":"2012-10-17"}"#);

    let serializer = serializer(RecordingPayload::default());
    let request = serializer
        .serialize(&operation, &args)
        .expect("should serialize");

    assert_eq!(
        request.body(),
        &RequestBody::Stream(Bytes::from_static(br#"{"Version":"2012-10-17"}"#))
    );
    assert_eq!(request.url().query(), Some("policy"));
    assert!(serializer.payload_serializer().calls().is_empty());
}

#[test]
fn test_unknown_arguments_are_ignored() {
    let serializer = serializer(RecordingPayload::default());
    let args = ArgumentMap::new()
        .with("Id", "42")
        .with("Whatever", "ignored")
        .with("x-token", "not a member name");

    let request = serializer
        .serialize(&create_thing(), &args)
        .expect("should serialize");

    assert!(request.headers().is_empty());
    assert!(request.query().is_empty());
    assert!(request.body().is_empty());
}

#[test]
fn test_strict_rejects_unknown_argument() {
    let args = ArgumentMap::new().with("Id", "42").with("Whatever", "?");

    let error = strict_serializer()
        .serialize(&create_thing(), &args)
        .expect_err("should fail");

    assert!(matches!(
        error,
        SerializeError::UnknownMember { ref name, .. } if name == "Whatever"
    ));
}

#[test]
fn test_strict_rejects_missing_uri_member() {
    let args = ArgumentMap::new().with("Name", "box");

    let error = strict_serializer()
        .serialize(&create_thing(), &args)
        .expect_err("should fail");

    insta::assert_snapshot!(error, @"Missing value for URI member 'Id'");
}

#[test]
fn test_serialize_operation_by_name() {
    let model = ServiceModel::new()
        .with_operation(put_object())
        .with_operation(create_thing());
    let serializer = serializer(NoPayload);
    let args = ArgumentMap::new().with("Bucket", "foo").with("Key", "bar");

    let request = serializer
        .serialize_operation(&model, "PutObject", &args)
        .expect("should serialize");
    assert_eq!(request.url().path(), "/foo/bar");

    let error = serializer
        .serialize_operation(&model, "DeleteObject", &args)
        .expect_err("should fail");
    assert!(matches!(error, SerializeError::UnknownOperation { .. }));
}

#[test]
fn test_serializer_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<RestSerializer<NoPayload>>();
    assert_send_sync::<RestSerializer<crate::payload::JsonPayload>>();
    assert_send_sync::<RestSerializer<crate::payload::XmlPayload>>();
}
