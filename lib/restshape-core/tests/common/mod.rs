#![allow(dead_code)]

use restshape_core::{NoPayload, RestSerializer, ServiceModel, XmlPayload};
use rstest::fixture;
use tracing::info;

const S3_MODEL: &str = include_str!("s3.json");

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub fn s3_model() -> ServiceModel {
    init_tracing();
    match ServiceModel::from_json(S3_MODEL) {
        Ok(model) => model,
        Err(error) => {
            panic!("fail to load S3 model: {error}");
        }
    }
}

#[fixture]
pub fn s3_serializer(s3_model: ServiceModel) -> RestSerializer<XmlPayload> {
    let mut payload = XmlPayload::new();
    if let Some(namespace) = s3_model.xml_namespace() {
        payload = payload.with_namespace(namespace);
    }

    match RestSerializer::builder().with_endpoint("https://s3.amazonaws.com") {
        Ok(builder) => builder.build(payload),
        Err(error) => {
            panic!("fail to build serializer: {error}");
        }
    }
}

pub fn bare_serializer() -> RestSerializer<NoPayload> {
    init_tracing();
    RestSerializer::builder().build(NoPayload)
}

pub fn body_text(request: &restshape_core::OutgoingRequest) -> String {
    let data = request.body().as_bytes().cloned().unwrap_or_default();
    String::from_utf8_lossy(&data).into_owned()
}
