use integration_tests::mock::{MockCheckData, MockHeaderUpdate, MockMixerClient, MockReportData};
use integration_tests::trace_init;
use mixer_control::{
    AttributeBag, CheckResponseInfo, Controller, HttpClientConfig, LocalAttributes, PerRouteConfig,
};

#[test]
fn forward_only_config_forwards_without_transport_calls() {
    trace_init();

    let json = r#"{
        "forward_attributes": {
            "attributes": {"source-key": {"string_value": "source-value"}}
        }
    }"#;
    let config: HttpClientConfig = serde_json::from_str(json).unwrap();
    let client = MockMixerClient::new();
    let controller = Controller::builder(config, client.clone()).build();

    let request = MockCheckData::new();
    let mut headers = MockHeaderUpdate::default();
    let mut handler = controller.create_request_handler(&PerRouteConfig::default());
    let on_done = Box::new(|info: CheckResponseInfo| assert!(info.is_ok()));
    handler.check(&request, &mut headers, None, on_done);
    handler.report(&request, &MockReportData::with_code(200));

    assert_eq!(client.check_count(), 0);
    assert_eq!(client.report_count(), 0);
    assert_eq!(headers.added.len(), 1);
    assert_eq!(
        AttributeBag::deserialize(&headers.added[0]).unwrap(),
        AttributeBag::new().with("source-key", "source-value")
    );
}

#[test]
fn stale_forward_header_is_removed_first() {
    let client = MockMixerClient::new();
    let controller = Controller::builder(HttpClientConfig::default(), client).build();

    let mut headers = MockHeaderUpdate::default();
    let mut handler = controller.create_request_handler(&PerRouteConfig::default());
    handler.check(&MockCheckData::new(), &mut headers, None, Box::new(|_| {}));

    assert_eq!(headers.removed, 1);
    assert!(headers.added.is_empty());
}

#[test]
fn outbound_forwards_local_preset() {
    let config = HttpClientConfig {
        forward_attributes: AttributeBag::new().with("source-key", "global"),
        ..Default::default()
    };
    let local = LocalAttributes {
        forward: AttributeBag::new().with("source.uid", "kubernetes://productpage-v1"),
        ..Default::default()
    };
    let controller = Controller::builder(config, MockMixerClient::new())
        .outbound(true)
        .local_attributes(local)
        .build();

    let mut headers = MockHeaderUpdate::default();
    let mut handler = controller.create_request_handler(&PerRouteConfig::default());
    handler.check(&MockCheckData::new(), &mut headers, None, Box::new(|_| {}));

    let forwarded = AttributeBag::deserialize(&headers.added[0]).unwrap();
    assert_eq!(forwarded.get_str("source-key"), Some("global"));
    assert_eq!(
        forwarded.get_str("source.uid"),
        Some("kubernetes://productpage-v1")
    );
}
