//! Dispatcher - 宛先ごとに発信リクエストを投入する
//!
//! # フロー
//! 1. テンプレートと全宛先を検証（1 件でも不正なら 1 度も発信せずに失敗）
//! 2. 入力順に create_call を呼ぶ
//! 3. 失敗はその宛先の CallOutcome に記録し、次の宛先へ進む
//! 4. 宛先の間に固定 delay（自主的なレート制限）
//! 5. 全宛先分の CallOutcome を入力順で返す

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use super::builder::DispatcherBuilder;
use super::cancel::{CancelSignal, pause};
use super::rate_limit::Pacer;
use super::report::{DispatchReport, HaltReason};
use crate::config::{DispatchConfig, DispatchOptions, ResolvedOptions};
use crate::domain::{
    BatchId, CallOutcome, CallRequest, DispatchBatch, DispatchError, PhoneNumber,
    ValidationError,
};
use crate::ports::{CallingBackend, Clock, CreateCall, IdGenerator};
use crate::retry::RetryDecision;

/// Sequential notification dispatcher.
///
/// Cheap to clone: every field is shared and read-only after construction.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn CallingBackend>,
    caller_id: PhoneNumber,
    config: DispatchConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_parts(
        backend: Arc<dyn CallingBackend>,
        caller_id: PhoneNumber,
        config: DispatchConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            backend,
            caller_id,
            config,
            clock,
            ids,
        }
    }

    pub fn caller_id(&self) -> &PhoneNumber {
        &self.caller_id
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn CallingBackend> {
        Arc::clone(&self.backend)
    }

    pub(crate) fn new_batch_id(&self) -> BatchId {
        self.ids.generate_batch_id()
    }

    /// Place one call per destination, in order. Never aborts on a single failure.
    pub async fn dispatch<S: AsRef<str>>(
        &self,
        template: &str,
        destinations: &[S],
        options: &DispatchOptions,
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatch_until(template, destinations, options, &CancelSignal::never())
            .await
    }

    /// Like [`dispatch`](Self::dispatch), stopping between destinations once `cancel` fires.
    ///
    /// Destinations left behind are still reported, as not attempted.
    pub async fn dispatch_until<S: AsRef<str>>(
        &self,
        template: &str,
        destinations: &[S],
        options: &DispatchOptions,
        cancel: &CancelSignal,
    ) -> Result<DispatchReport, DispatchError> {
        let resolved = self.config.resolve(options);
        let message = resolved.message(template)?;
        let batch = DispatchBatch::prepare(&message, destinations)?;
        let batch_id = self.new_batch_id();

        let span = info_span!("dispatch", %batch_id, destinations = batch.len());
        let (outcomes, halted) = self
            .run_sequential(batch, &resolved, cancel)
            .instrument(span.clone())
            .await;

        let report = DispatchReport::new(batch_id, outcomes, halted);
        span.in_scope(|| log_summary(&report));
        Ok(report)
    }

    /// One destination, one outcome.
    pub async fn call_one(
        &self,
        destination: &str,
        template: &str,
        options: &DispatchOptions,
    ) -> Result<CallOutcome, DispatchError> {
        let resolved = self.config.resolve(options);
        let to = PhoneNumber::parse(destination).map_err(|source| {
            ValidationError::InvalidDestination {
                index: 0,
                value: destination.to_string(),
                source,
            }
        })?;
        let request = CallRequest::new(to, resolved.message(template)?);
        let (outcome, _) = self
            .submit(0, request, &resolved, &Pacer::Sleep, &CancelSignal::never())
            .await;
        Ok(outcome)
    }

    async fn run_sequential(
        &self,
        batch: DispatchBatch,
        resolved: &ResolvedOptions,
        cancel: &CancelSignal,
    ) -> (Vec<CallOutcome>, Option<HaltReason>) {
        let total = batch.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut halted = None;

        for (index, request) in batch.into_iter().enumerate() {
            if halted.is_none() {
                halted = stop_requested(cancel, resolved);
            }
            if let Some(reason) = halted {
                outcomes.push(reason.not_attempted(index, request.destination));
                continue;
            }

            let (outcome, interrupted) = self
                .submit(index, request, resolved, &Pacer::Sleep, cancel)
                .await;
            halted = interrupted;
            if halted.is_none() && resolved.fail_fast && outcome.is_backend_unavailable() {
                warn!(index, "backend unavailable, skipping remaining destinations");
                halted = Some(HaltReason::BackendUnavailable);
            }
            outcomes.push(outcome);

            let more_remain = index + 1 < total;
            if halted.is_none() && more_remain && !pause(resolved.delay, cancel).await {
                halted = Some(HaltReason::Cancelled);
            }
        }
        (outcomes, halted)
    }

    /// Submit one request, retrying per policy. Failures end up in the outcome.
    ///
    /// The halt reason is set when cancellation cut a retry wait short.
    pub(crate) async fn submit(
        &self,
        index: usize,
        request: CallRequest,
        resolved: &ResolvedOptions,
        pacer: &Pacer<'_>,
        cancel: &CancelSignal,
    ) -> (CallOutcome, Option<HaltReason>) {
        let call = CreateCall {
            payload: request.payload(),
            to: request.destination,
            from: self.caller_id.clone(),
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            let attempted_at = self.clock.now();
            let error = match self.backend.create_call(&call).await {
                Ok(reference) => {
                    debug!(index, to = %call.to, %reference, attempts, "call queued");
                    let outcome =
                        CallOutcome::queued(index, call.to, reference, attempts, attempted_at);
                    return (outcome, None);
                }
                Err(error) => error,
            };

            match resolved.retry.decide(attempts, &error) {
                RetryDecision::Retry { delay } => {
                    debug!(index, to = %call.to, kind = ?error.kind, attempts, ?delay, "submission failed, retrying");
                    if !pacer.wait(delay, cancel).await {
                        warn!(index, to = %call.to, "cancelled while waiting to retry");
                        let outcome =
                            CallOutcome::failed(index, call.to, &error, attempts, attempted_at);
                        return (outcome, Some(HaltReason::Cancelled));
                    }
                }
                RetryDecision::GiveUp { reason } => {
                    warn!(
                        index,
                        to = %call.to,
                        kind = ?error.kind,
                        detail = %error.detail,
                        attempts,
                        %reason,
                        "call failed to submit"
                    );
                    let outcome =
                        CallOutcome::failed(index, call.to, &error, attempts, attempted_at);
                    return (outcome, None);
                }
            }
        }
    }
}

/// Cancellation wins over the deadline when both apply.
pub(crate) fn stop_requested(
    cancel: &CancelSignal,
    resolved: &ResolvedOptions,
) -> Option<HaltReason> {
    if cancel.is_cancelled() {
        return Some(HaltReason::Cancelled);
    }
    match resolved.deadline {
        Some(deadline) if tokio::time::Instant::now() >= deadline => {
            Some(HaltReason::DeadlineExceeded)
        }
        _ => None,
    }
}

pub(crate) fn log_summary(report: &DispatchReport) {
    let counts = report.counts();
    info!(
        queued = counts.queued,
        failed = counts.failed,
        not_attempted = counts.not_attempted,
        halted = ?report.halted(),
        "dispatch finished"
    );
}
