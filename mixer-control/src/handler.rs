//! Per-request Check and Report.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tonic::Status;
use tracing::{debug, warn};

use crate::attribute::{AttributeBag, MergePolicy};
use crate::builder::{self, AttributesBuilder};
use crate::client::{
    CancelFunc, CheckContext, CheckDoneFunc, CheckResponseInfo, ReportContext, TransportCheckFunc,
};
use crate::context::{ClientContext, ServiceContext};
use crate::data::{CheckData, HeaderUpdate, ReportData};

/// Progress of a handler's Check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// `check` has not been called.
    NotStarted,
    /// The transport Check is in flight.
    Pending,
    /// `on_done` has fired.
    Completed,
}

impl CheckState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => CheckState::NotStarted,
            1 => CheckState::Pending,
            _ => CheckState::Completed,
        }
    }
}

/// Progress of a handler's Report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    /// `report` has not been called.
    NotStarted,
    /// `report` has been called.
    Completed,
}

/// Drives Check and Report for a single request.
///
/// Created by [`Controller::create_request_handler`](crate::Controller::create_request_handler).
/// A handler may move between threads but is never used by two at once.
/// Callers must call [`check`](Self::check) before [`report`](Self::report).
pub struct RequestHandler {
    client_context: Arc<ClientContext>,
    service_context: Arc<ServiceContext>,
    request_attributes: AttributeBag,
    forwarded_attributes: Option<AttributeBag>,
    check_attributes_extracted: bool,
    forwarded_attributes_extracted: bool,
    check_state: Arc<AtomicU8>,
    report_state: ReportState,
}

impl RequestHandler {
    pub(crate) fn new(
        client_context: Arc<ClientContext>,
        service_context: Arc<ServiceContext>,
    ) -> Self {
        Self {
            client_context,
            service_context,
            request_attributes: AttributeBag::new(),
            forwarded_attributes: None,
            check_attributes_extracted: false,
            forwarded_attributes_extracted: false,
            check_state: Arc::new(AtomicU8::new(CheckState::NotStarted as u8)),
            report_state: ReportState::NotStarted,
        }
    }

    /// Runs the Check for this request.
    ///
    /// Forward attributes are written to `header_update` first. `on_done`
    /// fires exactly once: synchronously with OK when Check calls are
    /// disabled, otherwise from whatever thread the transport completes on.
    /// The returned cancel handle comes straight from the transport.
    pub fn check(
        &mut self,
        check_data: &dyn CheckData,
        header_update: &mut dyn HeaderUpdate,
        transport: Option<TransportCheckFunc>,
        on_done: CheckDoneFunc,
    ) -> Option<CancelFunc> {
        if self.check_state() != CheckState::NotStarted {
            warn!("check called more than once on the same request handler");
            on_done(CheckResponseInfo::from_status(Status::failed_precondition(
                "check already called for this request",
            )));
            return None;
        }

        header_update.remove_istio_attributes();
        if let Some(forward) = self.service_context.serialized_forward_attributes() {
            header_update.add_istio_attributes(forward.clone());
        }

        let service = Arc::clone(&self.service_context);
        if service.check_enabled() || service.report_enabled() {
            self.extract_check_attributes(check_data);
            self.extract_forwarded_attributes(check_data);
        }

        if !service.check_enabled() {
            debug!("check calls disabled, allowing request");
            self.set_check_state(CheckState::Completed);
            on_done(CheckResponseInfo::ok());
            return None;
        }

        let mut attributes = service.static_attributes().clone();
        attributes.merge(&self.request_attributes, MergePolicy::Override);
        attributes.merge(service.local_attributes(), MergePolicy::Override);
        if let Some(forwarded) = &self.forwarded_attributes {
            attributes.merge(forwarded, MergePolicy::Override);
        }
        let context = Arc::new(CheckContext::new(
            attributes,
            service.quota_requirements().to_vec(),
        ));

        self.set_check_state(CheckState::Pending);
        let state = Arc::clone(&self.check_state);
        let on_done: CheckDoneFunc = Box::new(move |info| {
            state.store(CheckState::Completed as u8, Ordering::Release);
            on_done(info);
        });

        self.client_context
            .client()
            .check(context, transport, on_done)
    }

    /// Runs the Check and resolves the returned future with its outcome.
    pub fn check_async(
        &mut self,
        check_data: &dyn CheckData,
        header_update: &mut dyn HeaderUpdate,
        transport: Option<TransportCheckFunc>,
    ) -> PendingCheck {
        let (tx, rx) = oneshot::channel();
        let cancel = self.check(
            check_data,
            header_update,
            transport,
            Box::new(move |info| {
                let _ = tx.send(info);
            }),
        );
        PendingCheck { rx, cancel }
    }

    /// Sends the Report for this request.
    ///
    /// Request-side facts are taken from `check_data` if `check` did not
    /// already extract them.
    pub fn report(&mut self, check_data: &dyn CheckData, report_data: &dyn ReportData) {
        if self.report_state == ReportState::Completed {
            warn!("report called more than once on the same request handler");
            return;
        }
        self.report_state = ReportState::Completed;

        let service = Arc::clone(&self.service_context);
        if !service.report_enabled() {
            debug!("report calls disabled");
            return;
        }

        self.extract_check_attributes(check_data);
        self.extract_forwarded_attributes(check_data);

        let mut response_attributes = AttributeBag::new();
        let mut builder = AttributesBuilder::new(&mut response_attributes);
        builder.extract_report_attributes(report_data);

        let mut attributes = service.static_attributes().clone();
        attributes.merge(&self.request_attributes, MergePolicy::Override);
        attributes.merge(&response_attributes, MergePolicy::Override);
        attributes.merge(service.local_attributes(), MergePolicy::Override);
        if let Some(forwarded) = &self.forwarded_attributes {
            attributes.merge(forwarded, MergePolicy::Override);
        }

        self.client_context
            .client()
            .report(Arc::new(ReportContext::new(attributes)));
    }

    /// Current Check state.
    pub fn check_state(&self) -> CheckState {
        CheckState::from_u8(self.check_state.load(Ordering::Acquire))
    }

    /// Current Report state.
    pub fn report_state(&self) -> ReportState {
        self.report_state
    }

    /// The service context this handler was resolved to.
    pub fn service_context(&self) -> &Arc<ServiceContext> {
        &self.service_context
    }

    fn set_check_state(&self, state: CheckState) {
        self.check_state.store(state as u8, Ordering::Release);
    }

    fn extract_check_attributes(&mut self, check_data: &dyn CheckData) {
        if self.check_attributes_extracted {
            return;
        }
        self.check_attributes_extracted = true;

        let mut builder = AttributesBuilder::new(&mut self.request_attributes);
        builder.extract_check_attributes(check_data);
        builder.extract_api_attributes(check_data, self.service_context.api_spec());
    }

    fn extract_forwarded_attributes(&mut self, check_data: &dyn CheckData) {
        if self.forwarded_attributes_extracted
            || self.service_context.ignore_forwarded_attributes()
        {
            return;
        }
        self.forwarded_attributes_extracted = true;
        self.forwarded_attributes = builder::extract_forwarded_attributes(check_data);
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("service_context", &self.service_context)
            .field("check_state", &self.check_state())
            .field("report_state", &self.report_state)
            .finish_non_exhaustive()
    }
}

/// A Check in flight, returned by [`RequestHandler::check_async`].
///
/// Resolves to the Check outcome, or to `CANCELLED` if the transport drops
/// the completion without invoking it.
#[must_use = "futures do nothing unless polled"]
pub struct PendingCheck {
    rx: oneshot::Receiver<CheckResponseInfo>,
    cancel: Option<CancelFunc>,
}

impl PendingCheck {
    /// Cancels the Check through the transport, if it supports cancellation.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Future for PendingCheck {
    type Output = CheckResponseInfo;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                CheckResponseInfo::from_status(Status::cancelled("check completion dropped"))
            })
        })
    }
}

impl fmt::Debug for PendingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCheck")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
