use http::header::{HeaderValue, USER_AGENT};
use integration_tests::mock::{MockCheckData, MockHeaderUpdate, MockMixerClient};
use mixer_control::{Controller, HttpClientConfig, PerRouteConfig, ServiceConfig, Value};

#[test]
fn non_ascii_header_values_reach_check() {
    let client = MockMixerClient::new();
    let config = HttpClientConfig::default().with_service_config("svc", ServiceConfig::default());
    let controller = Controller::builder(config, client.clone()).build();

    let mut request = MockCheckData::new().with_request("GET", "/");
    let user = HeaderValue::from_bytes("José".as_bytes()).unwrap();
    let agent = HeaderValue::from_bytes("Café/1.0".as_bytes()).unwrap();
    request.headers.insert("x-user", user);
    request.headers.insert(USER_AGENT, agent);

    let mut handler = controller.create_request_handler(&PerRouteConfig::for_destination("svc"));
    let mut headers = MockHeaderUpdate::default();
    handler.check(&request, &mut headers, None, Box::new(|_| {}));

    let check = client.last_check().unwrap();
    let bag = check.attributes();
    assert_eq!(bag.get_str("request.useragent"), Some("Café/1.0"));
    let Some(Value::StringMap(sent)) = bag.get("request.headers") else {
        panic!("request.headers should be a string map");
    };
    assert_eq!(sent["x-user"], "José");
    assert_eq!(sent["user-agent"], "Café/1.0");
}
