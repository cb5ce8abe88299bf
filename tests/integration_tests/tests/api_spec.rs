use integration_tests::mock::{MockCheckData, MockHeaderUpdate, MockMixerClient};
use integration_tests::trace_init;
use mixer_control::{Controller, HttpClientConfig, PerRouteConfig, ServiceConfig};

fn bookstore() -> ServiceConfig {
    let json = r#"{
        "http_api_spec": [{
            "attributes": {"attributes": {"api.service": {"string_value": "bookstore"}}},
            "patterns": [{
                "attributes": {"attributes": {"api.operation": {"string_value": "GetShelf"}}},
                "http_method": "GET",
                "uri_template": "/shelves/{shelf}"
            }]
        }]
    }"#;
    serde_json::from_str(json).unwrap()
}

#[test]
fn matched_operation_reaches_check() {
    trace_init();

    let client = MockMixerClient::new();
    let controller = Controller::builder(HttpClientConfig::default(), client.clone()).build();
    controller.add_service_config("bookstore", bookstore());

    let route = PerRouteConfig::for_service_config_id("bookstore");
    let mut handler = controller.create_request_handler(&route);
    let request = MockCheckData::new().with_request("GET", "/shelves/7?key=abc");
    let mut headers = MockHeaderUpdate::default();
    handler.check(&request, &mut headers, None, Box::new(|_| {}));

    let check = client.last_check().unwrap();
    let bag = check.attributes();
    assert_eq!(bag.get_str("api.service"), Some("bookstore"));
    assert_eq!(bag.get_str("api.operation"), Some("GetShelf"));
    assert_eq!(bag.get_str("api.key"), Some("abc"));
    assert_eq!(bag.get_str("request.path"), Some("/shelves/7?key=abc"));
}

#[test]
fn unmatched_request_gets_no_api_attributes() {
    let client = MockMixerClient::new();
    let controller = Controller::builder(HttpClientConfig::default(), client.clone()).build();
    controller.add_service_config("bookstore", bookstore());

    let route = PerRouteConfig::for_service_config_id("bookstore");
    let mut handler = controller.create_request_handler(&route);
    let request = MockCheckData::new().with_request("DELETE", "/shelves/7?key=abc");
    let mut headers = MockHeaderUpdate::default();
    handler.check(&request, &mut headers, None, Box::new(|_| {}));

    let check = client.last_check().unwrap();
    let bag = check.attributes();
    assert!(!bag.contains("api.service"));
    assert!(!bag.contains("api.operation"));
    assert!(!bag.contains("api.key"));
    assert_eq!(bag.get_str("request.method"), Some("DELETE"));
}
