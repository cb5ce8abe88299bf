use integration_tests::mock::{MockCheckData, MockHeaderUpdate, MockMixerClient};
use mixer_control::{Controller, HttpClientConfig, PerRouteConfig, QuotaRequirement, ServiceConfig};

#[test]
fn check_carries_route_quota() {
    let json = r#"{
        "quota_spec": {
            "rules": [{"quotas": [{"quota": "route0-quota", "charge": 10}]}]
        }
    }"#;
    let service: ServiceConfig = serde_json::from_str(json).unwrap();
    let client = MockMixerClient::new();
    let controller = Controller::builder(HttpClientConfig::default(), client.clone()).build();
    controller.add_service_config("route0", service);

    let route = PerRouteConfig::for_service_config_id("route0");
    let mut handler = controller.create_request_handler(&route);
    let request = MockCheckData::new();
    let mut headers = MockHeaderUpdate::default();
    handler.check(&request, &mut headers, None, Box::new(|_| {}));

    let check = client.last_check().unwrap();
    assert_eq!(
        check.quota_requirements(),
        &[QuotaRequirement::new("route0-quota", 10)]
    );
}

#[test]
fn no_quota_spec_means_no_requirements() {
    let client = MockMixerClient::new();
    let config = HttpClientConfig::default().with_service_config("svc", ServiceConfig::default());
    let controller = Controller::builder(config, client.clone()).build();

    let mut handler = controller.create_request_handler(&PerRouteConfig::for_destination("svc"));
    let request = MockCheckData::new();
    let mut headers = MockHeaderUpdate::default();
    handler.check(&request, &mut headers, None, Box::new(|_| {}));

    let check = client.last_check().unwrap();
    assert!(check.quota_requirements().is_empty());
}
