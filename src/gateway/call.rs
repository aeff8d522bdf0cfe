use poll_promise::Promise;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

use super::client::ComputationGateway;
use super::request::{ChainContext, ComputationRequest, HistoricalWindow, RequestKey};
use super::response::{CallError, GatewayOutcome, SeriesResult, decode_point};

/// What a view renders for one call site.
#[derive(Debug)]
pub enum CallState<T> {
    /// Nothing issued yet (or the call site was cancelled)
    Idle,
    Loading,
    Success(Arc<T>),
    Failed(CallError),
}

impl<T> Clone for CallState<T> {
    fn clone(&self) -> Self {
        match self {
            CallState::Idle => CallState::Idle,
            CallState::Loading => CallState::Loading,
            CallState::Success(value) => CallState::Success(Arc::clone(value)),
            CallState::Failed(e) => CallState::Failed(e.clone()),
        }
    }
}

impl<T> CallState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, CallState::Loading)
    }

    pub fn result(&self) -> Option<&Arc<T>> {
        match self {
            CallState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CallError> {
        match self {
            CallState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

struct InFlight<T: Send + 'static> {
    token: CancellationToken,
    promise: Promise<Option<GatewayOutcome<T>>>,
}

struct ActiveRequest {
    key: RequestKey,
    request: ComputationRequest,
    validity: Result<(), String>,
}

/// One call site: owns the latest request, its cancellation token and the
/// resulting state.
///
/// - Re-issuing the request that is already active is a no-op, so a view may
///   call `run_*` every frame.
/// - Issuing a different request cancels the previous one; its result is
///   never applied.
/// - Dropping the call site (unmount) cancels whatever is in flight.
pub struct ComputationCall<T: Send + 'static> {
    state: CallState<T>,
    active: Option<ActiveRequest>,
    in_flight: Option<InFlight<T>>,
    /// Advances once per visible completion
    revision: u64,
    decode: fn(Value) -> Result<T, String>,
}

pub type PointCall = ComputationCall<Value>;
pub type SeriesCall = ComputationCall<SeriesResult>;

impl<T: Send + 'static> ComputationCall<T> {
    pub fn new(decode: fn(Value) -> Result<T, String>) -> Self {
        Self {
            state: CallState::Idle,
            active: None,
            in_flight: None,
            revision: 0,
            decode,
        }
    }

    pub fn state(&self) -> &CallState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Issues `request` unless it is already the active one.
    /// Returns `true` if the state changed.
    pub fn issue(&mut self, gateway: &Arc<dyn ComputationGateway>, request: ComputationRequest) -> bool {
        let validity = request.validate();
        self.issue_with(gateway, request, validity)
    }

    /// Explicit re-invocation of the active request (no-op if none).
    pub fn refresh(&mut self, gateway: &Arc<dyn ComputationGateway>) -> bool {
        match self.active.take() {
            Some(active) => {
                self.cancel_in_flight();
                self.issue_with(gateway, active.request, active.validity)
            }
            None => false,
        }
    }

    /// Applies a finished result, if any. Returns `true` if the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(InFlight { token, promise }) = self.in_flight.take() else {
            return false;
        };
        if token.is_cancelled() {
            return false;
        }

        match promise.try_take() {
            Ok(Some(outcome)) => {
                if token.is_cancelled() {
                    return false;
                }
                self.finish(outcome);
                true
            }
            // The task observed its own cancellation
            Ok(None) => false,
            Err(promise) => {
                self.in_flight = Some(InFlight { token, promise });
                false
            }
        }
    }

    /// Unmount: cancel and forget, so a later identical request is issued afresh.
    pub fn cancel(&mut self) {
        self.cancel_in_flight();
        self.active = None;
        if self.state.is_loading() {
            self.state = CallState::Idle;
        }
    }

    fn issue_with(
        &mut self,
        gateway: &Arc<dyn ComputationGateway>,
        request: ComputationRequest,
        validity: Result<(), String>,
    ) -> bool {
        let key = request.key();
        if self.active.as_ref().is_some_and(|active| active.key == key) {
            return false;
        }

        let superseded = self.in_flight.is_some();
        self.cancel_in_flight();

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_gateway_calls {
            log::info!(
                "[gateway] issue {} via {}{}",
                request.slug(),
                gateway.signature(),
                if superseded { " (superseding in-flight call)" } else { "" }
            );
        }
        #[cfg(not(debug_assertions))]
        let _ = superseded;

        if let Err(reason) = &validity {
            self.state = CallState::Failed(CallError::InvalidRequest(reason.clone()));
            self.revision += 1;
            self.active = Some(ActiveRequest {
                key,
                request,
                validity,
            });
            return true;
        }

        self.state = CallState::Loading;

        let token = CancellationToken::new();
        let task_token = token.clone();
        let task_gateway = Arc::clone(gateway);
        let task_request = request.clone();
        let decode = self.decode;

        let promise = Promise::spawn_async(async move {
            tokio::select! {
                _ = task_token.cancelled() => None,
                outcome = task_gateway.run(&task_request) => Some(outcome.decode_with(decode)),
            }
        });

        self.in_flight = Some(InFlight { token, promise });
        self.active = Some(ActiveRequest {
            key,
            request,
            validity,
        });
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.token.cancel();
        }
    }

    fn finish(&mut self, outcome: GatewayOutcome<T>) {
        let slug = self
            .active
            .as_ref()
            .map(|active| active.request.slug().to_string())
            .unwrap_or_default();

        self.state = match outcome {
            GatewayOutcome::Success(value) => CallState::Success(Arc::new(value)),
            GatewayOutcome::DomainError(e) => {
                log::warn!("[gateway] {} failed: {}", slug, e);
                CallState::Failed(CallError::Domain(e))
            }
            GatewayOutcome::TransportError(detail) => {
                log::error!("[gateway] {} transport error: {}", slug, detail);
                CallState::Failed(CallError::Transport(detail))
            }
        };
        self.revision += 1;
    }
}

impl ComputationCall<Value> {
    pub fn point() -> Self {
        Self::new(decode_point)
    }

    /// Point mode: one opaque JSON output.
    pub fn run_computation(
        &mut self,
        gateway: &Arc<dyn ComputationGateway>,
        name: &str,
        params: Value,
        context: ChainContext,
    ) -> &CallState<Value> {
        self.issue(gateway, ComputationRequest::new(name, params, context));
        &self.state
    }
}

impl ComputationCall<SeriesResult> {
    pub fn series() -> Self {
        Self::new(SeriesResult::decode)
    }

    /// Series mode: the base model is wrapped in the historical model, which
    /// fans it out over `window` every `interval`.
    pub fn run_historical_computation(
        &mut self,
        gateway: &Arc<dyn ComputationGateway>,
        name: &str,
        params: Value,
        context: ChainContext,
        window: &HistoricalWindow,
    ) -> &CallState<SeriesResult> {
        let base = ComputationRequest::new(name, params, context);
        let validity = base.validate();
        let wrapped = ComputationRequest::historical(&base, window);
        self.issue_with(gateway, wrapped, validity);
        &self.state
    }
}

impl<T: Send + 'static> Drop for ComputationCall<T> {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}
