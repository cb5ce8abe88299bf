use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use integration_tests::mock::{Completion, MockCheckData, MockHeaderUpdate, MockMixerClient};
use integration_tests::trace_init;
use mixer_control::{
    CheckResponseInfo, CheckState, Controller, HttpClientConfig, PerRouteConfig, ServiceConfig,
};
use tonic::{Code, Status};

#[test]
fn handlers_on_many_threads_share_one_cache() {
    trace_init();

    let client = MockMixerClient::new();
    let controller = Controller::builder(HttpClientConfig::default(), client.clone())
        .service_config_cache_size(16)
        .build();
    let completed = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let controller = controller.clone();
            let completed = completed.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("route-{}", (t * 50 + i) % 24);
                    controller.add_service_config(id.clone(), ServiceConfig::default());

                    let completed = completed.clone();
                    let route = PerRouteConfig::for_service_config_id(id);
                    let mut handler = controller.create_request_handler(&route);
                    handler.check(
                        &MockCheckData::new(),
                        &mut MockHeaderUpdate::default(),
                        None,
                        Box::new(move |_| {
                            completed.fetch_add(1, Ordering::SeqCst);
                        }),
                    );
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(completed.load(Ordering::SeqCst), 400);
    assert_eq!(controller.client_context().cached_service_configs(), 16);
}

#[test]
fn deferred_completion_reports_transport_failure() {
    let client = MockMixerClient::with_completion(Completion::Deferred);
    let config = HttpClientConfig::default().with_service_config("svc", ServiceConfig::default());
    let controller = Controller::builder(config, client.clone()).build();

    let code = Arc::new(parking_lot::Mutex::new(None));
    let slot = code.clone();
    let mut handler = controller.create_request_handler(&PerRouteConfig::for_destination("svc"));
    handler.check(
        &MockCheckData::new(),
        &mut MockHeaderUpdate::default(),
        None,
        Box::new(move |info| *slot.lock() = Some(info.status().code())),
    );
    assert_eq!(handler.check_state(), CheckState::Pending);

    let on_done = client.take_pending().pop().unwrap();
    let failure = CheckResponseInfo::from_status(Status::unavailable("backend down"));
    std::thread::spawn(move || on_done(failure)).join().unwrap();

    assert_eq!(*code.lock(), Some(Code::Unavailable));
    assert_eq!(handler.check_state(), CheckState::Completed);
}

#[tokio::test]
async fn check_async_completes_on_transport_thread() {
    trace_init();

    let client = MockMixerClient::with_completion(Completion::OtherThread);
    let config = HttpClientConfig::default().with_service_config("svc", ServiceConfig::default());
    let controller = Controller::builder(config, client.clone()).build();

    let mut handler = controller.create_request_handler(&PerRouteConfig::for_destination("svc"));
    let request = MockCheckData::new();
    let mut headers = MockHeaderUpdate::default();
    let info = handler.check_async(&request, &mut headers, None).await;

    assert!(info.is_ok());
    assert_eq!(client.check_count(), 1);
    assert_eq!(handler.check_state(), CheckState::Completed);
}
