//! PooledDispatcher - ワーカープールで並列に発信する
//!
//! 逐次版との違い:
//! - N 本のワーカーが共有キューから宛先を取り出す
//! - レート制限は全ワーカー共有のトークン予算（`RateLimiter`）
//! - 結果は入力 index でタグ付けし、最後に入力順へ並べ直す
//! - cancel / fail-fast は全ワーカーで共有（実行中の呼び出しは中断しない）

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, info_span, warn};

use super::cancel::CancelSignal;
use super::dispatcher::{Dispatcher, log_summary, stop_requested};
use super::rate_limit::{Pacer, RateLimiter};
use super::report::{DispatchReport, HaltReason};
use crate::config::{DispatchOptions, ResolvedOptions};
use crate::domain::{CallOutcome, CallRequest, DispatchBatch, DispatchError};

#[derive(Debug, thiserror::Error)]
#[error("worker pool needs at least one worker")]
pub struct ZeroWorkers;

/// Bounded worker pool over a [`Dispatcher`].
#[derive(Clone)]
pub struct PooledDispatcher {
    dispatcher: Dispatcher,
    workers: usize,
}

impl PooledDispatcher {
    pub fn new(dispatcher: Dispatcher, workers: usize) -> Result<Self, ZeroWorkers> {
        if workers == 0 {
            return Err(ZeroWorkers);
        }
        Ok(Self {
            dispatcher,
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn dispatch<S: AsRef<str>>(
        &self,
        template: &str,
        destinations: &[S],
        options: &DispatchOptions,
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatch_until(template, destinations, options, &CancelSignal::never())
            .await
    }

    pub async fn dispatch_until<S: AsRef<str>>(
        &self,
        template: &str,
        destinations: &[S],
        options: &DispatchOptions,
        cancel: &CancelSignal,
    ) -> Result<DispatchReport, DispatchError> {
        let resolved = Arc::new(self.dispatcher.config().resolve(options));
        let message = resolved.message(template)?;
        let batch = DispatchBatch::prepare(&message, destinations)?;
        let batch_id = self.dispatcher.new_batch_id();
        let total = batch.len();

        let span = info_span!("dispatch", %batch_id, destinations = total, workers = self.workers);

        let queue: Arc<Mutex<VecDeque<(usize, CallRequest)>>> =
            Arc::new(Mutex::new(batch.into_iter().enumerate().collect()));
        let limiter = Arc::new(RateLimiter::new(resolved.delay));
        let halted: Arc<OnceLock<HaltReason>> = Arc::new(OnceLock::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<CallOutcome>();

        let mut joins = Vec::with_capacity(self.workers.min(total));
        for worker_id in 0..self.workers.min(total) {
            let dispatcher = self.dispatcher.clone();
            let resolved = Arc::clone(&resolved);
            let queue = Arc::clone(&queue);
            let limiter = Arc::clone(&limiter);
            let halted = Arc::clone(&halted);
            let cancel = cancel.clone();
            let tx = tx.clone();

            let worker = async move {
                loop {
                    let next = queue.lock().await.pop_front();
                    let Some((index, request)) = next else {
                        break;
                    };

                    if let Some(reason) = halt_reason(&halted, &cancel, &resolved) {
                        let _ = tx.send(reason.not_attempted(index, request.destination));
                        continue;
                    }
                    if !limiter.acquire(&cancel).await {
                        let reason = *halted.get_or_init(|| HaltReason::Cancelled);
                        let _ = tx.send(reason.not_attempted(index, request.destination));
                        continue;
                    }
                    // a stop may have happened while waiting for the token
                    if let Some(reason) = halt_reason(&halted, &cancel, &resolved) {
                        let _ = tx.send(reason.not_attempted(index, request.destination));
                        continue;
                    }

                    let (outcome, interrupted) = dispatcher
                        .submit(index, request, &resolved, &Pacer::Limiter(&limiter), &cancel)
                        .await;
                    if let Some(reason) = interrupted {
                        let _ = halted.set(reason);
                    } else if resolved.fail_fast && outcome.is_backend_unavailable() {
                        warn!(worker_id, index, "backend unavailable, skipping remaining destinations");
                        let _ = halted.set(HaltReason::BackendUnavailable);
                    }
                    let _ = tx.send(outcome);
                }
            };
            joins.push(tokio::spawn(worker.instrument(span.clone())));
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        for join in joins {
            join.await
                .map_err(|e| DispatchError::Worker(e.to_string()))?;
        }
        outcomes.sort_by_key(CallOutcome::index);

        let report = DispatchReport::new(batch_id, outcomes, halted.get().copied());
        span.in_scope(|| log_summary(&report));
        Ok(report)
    }
}

/// The batch-wide halt, latching the first stop any worker observes.
fn halt_reason(
    halted: &OnceLock<HaltReason>,
    cancel: &CancelSignal,
    resolved: &ResolvedOptions,
) -> Option<HaltReason> {
    if let Some(reason) = halted.get() {
        return Some(*reason);
    }
    let reason = stop_requested(cancel, resolved)?;
    Some(*halted.get_or_init(|| reason))
}
