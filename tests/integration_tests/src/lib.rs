pub mod mock {
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::HeaderMap;
    use mixer_control::{
        AttributeBag, CancelFunc, CheckContext, CheckData, CheckDoneFunc, CheckResponseInfo,
        HeaderUpdate, MixerClient, ReportContext, ReportData, ReportInfo, TransportCheckFunc,
    };
    use parking_lot::Mutex;
    use tonic::Status;

    /// Request facts with call counters.
    #[derive(Debug, Default)]
    pub struct MockCheckData {
        pub source: Option<(IpAddr, u16)>,
        pub peer_principal: Option<String>,
        pub local_principal: Option<String>,
        pub forwarded: Option<Bytes>,
        pub headers: HeaderMap,
        pub path: Option<String>,
        pub method: Option<String>,

        pub source_ip_port_calls: AtomicUsize,
        pub principal_calls: AtomicUsize,
        pub extract_calls: AtomicUsize,
    }

    impl MockCheckData {
        pub fn new() -> Self {
            Self {
                source: Some(("10.1.2.3".parse().unwrap(), 4567)),
                peer_principal: Some("spiffe://cluster.local/ns/default/sa/productpage".into()),
                local_principal: Some("spiffe://cluster.local/ns/default/sa/reviews".into()),
                ..Default::default()
            }
        }

        /// Attaches attributes as a downstream proxy would forward them.
        pub fn with_forwarded(mut self, attributes: &AttributeBag) -> Self {
            self.forwarded = Some(attributes.serialize());
            self
        }

        pub fn with_request(mut self, method: &str, path: &str) -> Self {
            self.method = Some(method.into());
            self.path = Some(path.into());
            self
        }

        /// Total number of accessor calls that read request facts.
        pub fn extraction_calls(&self) -> usize {
            self.source_ip_port_calls.load(Ordering::SeqCst)
                + self.principal_calls.load(Ordering::SeqCst)
                + self.extract_calls.load(Ordering::SeqCst)
        }
    }

    impl CheckData for MockCheckData {
        fn source_ip_port(&self) -> Option<(IpAddr, u16)> {
            self.source_ip_port_calls.fetch_add(1, Ordering::SeqCst);
            self.source
        }

        fn principal(&self, peer: bool) -> Option<String> {
            self.principal_calls.fetch_add(1, Ordering::SeqCst);
            if peer {
                self.peer_principal.clone()
            } else {
                self.local_principal.clone()
            }
        }

        fn extract_istio_attributes(&self) -> Option<Bytes> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            self.forwarded.clone()
        }

        fn request_headers(&self) -> HeaderMap {
            self.headers.clone()
        }

        fn path(&self) -> Option<String> {
            self.path.clone()
        }

        fn method(&self) -> Option<String> {
            self.method.clone()
        }
    }

    /// Response facts with call counters.
    #[derive(Debug, Default)]
    pub struct MockReportData {
        pub headers: HeaderMap,
        pub info: ReportInfo,
        pub filter_state: HashMap<String, prost_types::Struct>,

        pub response_headers_calls: AtomicUsize,
        pub report_info_calls: AtomicUsize,
    }

    impl MockReportData {
        pub fn with_code(code: u16) -> Self {
            Self {
                info: ReportInfo {
                    response_code: Some(code),
                    ..Default::default()
                },
                ..Default::default()
            }
        }

        pub fn extraction_calls(&self) -> usize {
            self.response_headers_calls.load(Ordering::SeqCst)
                + self.report_info_calls.load(Ordering::SeqCst)
        }
    }

    impl ReportData for MockReportData {
        fn response_headers(&self) -> HeaderMap {
            self.response_headers_calls.fetch_add(1, Ordering::SeqCst);
            self.headers.clone()
        }

        fn report_info(&self) -> ReportInfo {
            self.report_info_calls.fetch_add(1, Ordering::SeqCst);
            self.info.clone()
        }

        fn dynamic_filter_state(&self) -> HashMap<String, prost_types::Struct> {
            self.filter_state.clone()
        }
    }

    /// Records the forward attributes written to the upstream request.
    #[derive(Debug, Default)]
    pub struct MockHeaderUpdate {
        pub added: Vec<Bytes>,
        pub removed: usize,
    }

    impl HeaderUpdate for MockHeaderUpdate {
        fn add_istio_attributes(&mut self, serialized: Bytes) {
            self.added.push(serialized);
        }

        fn remove_istio_attributes(&mut self) {
            self.removed += 1;
        }
    }

    /// How [`MockMixerClient`] completes a Check.
    #[derive(Debug, Clone)]
    pub enum Completion {
        /// Invoke `on_done` before returning.
        Immediate(Status),
        /// Keep `on_done` until the test takes it with [`MockMixerClient::take_pending`].
        Deferred,
        /// Invoke `on_done` with OK from a freshly spawned thread.
        OtherThread,
    }

    /// A transport that records every call.
    pub struct MockMixerClient {
        completion: Completion,
        checks: Mutex<Vec<Arc<CheckContext>>>,
        reports: Mutex<Vec<Arc<ReportContext>>>,
        pending: Mutex<Vec<CheckDoneFunc>>,
    }

    impl MockMixerClient {
        pub fn new() -> Arc<Self> {
            Self::with_completion(Completion::Immediate(Status::ok("")))
        }

        pub fn with_completion(completion: Completion) -> Arc<Self> {
            Arc::new(Self {
                completion,
                checks: Mutex::new(Vec::new()),
                reports: Mutex::new(Vec::new()),
                pending: Mutex::new(Vec::new()),
            })
        }

        pub fn check_count(&self) -> usize {
            self.checks.lock().len()
        }

        pub fn report_count(&self) -> usize {
            self.reports.lock().len()
        }

        pub fn last_check(&self) -> Option<Arc<CheckContext>> {
            self.checks.lock().last().cloned()
        }

        pub fn last_report(&self) -> Option<Arc<ReportContext>> {
            self.reports.lock().last().cloned()
        }

        pub fn take_pending(&self) -> Vec<CheckDoneFunc> {
            std::mem::take(&mut *self.pending.lock())
        }
    }

    impl std::fmt::Debug for MockMixerClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockMixerClient")
                .field("completion", &self.completion)
                .field("checks", &self.check_count())
                .field("reports", &self.report_count())
                .finish()
        }
    }

    impl MixerClient for MockMixerClient {
        fn check(
            &self,
            context: Arc<CheckContext>,
            _transport: Option<TransportCheckFunc>,
            on_done: CheckDoneFunc,
        ) -> Option<CancelFunc> {
            self.checks.lock().push(context);
            match &self.completion {
                Completion::Immediate(status) => {
                    on_done(CheckResponseInfo::from_status(status.clone()));
                }
                Completion::Deferred => self.pending.lock().push(on_done),
                Completion::OtherThread => {
                    std::thread::spawn(move || on_done(CheckResponseInfo::ok()));
                }
            }
            None
        }

        fn report(&self, context: Arc<ReportContext>) {
            self.reports.lock().push(context);
        }
    }
}

pub fn trace_init() {
    let _ = tracing_subscriber::fmt::try_init();
}
