use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use courier_api::{Message, MessageReader, Record};

use crate::codec;
use crate::config::ConsumerConfig;
use crate::error::EngineError;
use crate::gate::{AdmissionGate, Clock, SystemClock};
use crate::handler::Handler;

/// Lifecycle of a [`ConsumerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Built, no workers yet.
    Created,
    Running,
    /// `close` is waiting for the workers to exit.
    Stopping,
    /// Workers gone and reader closed. Terminal.
    Stopped,
}

// ═══════════════════════════════════════════════════════════════
//  ConsumerPool
// ═══════════════════════════════════════════════════════════════

/// Typed consumer: `num_workers` loops sharing one reader, each decoding
/// messages into `T` and handing them to a business handler.
///
/// Per-message failures (transport, decoding, handler) are logged and the
/// loop moves on; only `close` or the parent token stops the workers.
/// Processing order is only guaranteed within a single worker.
///
/// A panicking handler takes its worker down: the panic is logged, the
/// message is neither committed nor requeued and the pool keeps running with
/// one worker fewer. Release builds abort on panic instead.
pub struct ConsumerPool<T: Record> {
    config: ConsumerConfig,
    reader: Arc<dyn MessageReader>,
    clock: Arc<dyn Clock>,
    state: PoolState,
    token: Option<CancellationToken>,
    tracker: TaskTracker,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> std::fmt::Debug for ConsumerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerPool")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl<T: Record> ConsumerPool<T> {
    /// Validate the configuration and take ownership of the read half.
    pub fn new(config: ConsumerConfig, reader: Arc<dyn MessageReader>) -> Result<Self, EngineError> {
        config.validate().map_err(|e| e.with_context("consumer"))?;
        Ok(Self {
            config,
            reader,
            clock: Arc::new(SystemClock),
            state: PoolState::Created,
            token: None,
            tracker: TaskTracker::new(),
            _record: PhantomData,
        })
    }

    /// Replace the clock the admission gate reads.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Spawn the workers. Must be called inside a tokio runtime.
    ///
    /// Workers stop when `parent` is cancelled or when the pool is closed.
    pub fn start<H: Handler<T>>(
        &mut self,
        parent: &CancellationToken,
        handler: H,
    ) -> Result<(), EngineError> {
        if self.state != PoolState::Created {
            return Err(EngineError::InvalidState(format!(
                "pool for topic '{}' cannot start from {:?}",
                self.config.topic, self.state
            )));
        }

        let token = parent.child_token();
        let handler = Arc::new(handler);
        let gate = self.config.business_hours.then(|| {
            AdmissionGate::new(self.config.schedule, self.clock.clone(), self.config.gate_backoff())
        });
        let topic: Arc<str> = Arc::from(self.config.topic.as_str());

        for id in 0..self.config.num_workers {
            let worker = Worker {
                id,
                topic: topic.clone(),
                reader: self.reader.clone(),
                gate: gate.clone(),
                read_retry: self.config.read_retry(),
                token: token.clone(),
            };
            self.tracker.spawn(worker.run::<T, H>(handler.clone()));
        }
        // No more workers will be added; `wait` resolves once they all exit.
        self.tracker.close();

        self.token = Some(token);
        self.state = PoolState::Running;
        tracing::info!(
            topic = %self.config.topic,
            group = %self.config.group_id,
            workers = self.config.num_workers,
            business_hours = self.config.business_hours,
            "consumer pool started"
        );
        Ok(())
    }

    /// Stop the workers, wait for every one of them, then close the reader.
    ///
    /// A handler already running is awaited, not interrupted. Closing a
    /// stopped pool does nothing.
    pub async fn close(&mut self) -> Result<(), EngineError> {
        match self.state {
            PoolState::Stopped => return Ok(()),
            PoolState::Created => {}
            PoolState::Running | PoolState::Stopping => {
                self.state = PoolState::Stopping;
                if let Some(token) = &self.token {
                    token.cancel();
                }
                self.tracker.close();
                self.tracker.wait().await;
            }
        }

        self.state = PoolState::Stopped;
        self.reader.close().await?;
        tracing::info!(topic = %self.config.topic, group = %self.config.group_id, "consumer pool stopped");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Worker
// ═══════════════════════════════════════════════════════════════

struct Worker {
    id: usize,
    topic: Arc<str>,
    reader: Arc<dyn MessageReader>,
    gate: Option<AdmissionGate>,
    read_retry: Duration,
    token: CancellationToken,
}

impl Worker {
    /// read → gate → decode → handle → commit, until cancelled.
    async fn run<T: Record, H: Handler<T>>(self, handler: Arc<H>) {
        let _exit = ExitGuard {
            id: self.id,
            topic: self.topic.clone(),
        };
        tracing::debug!(worker = self.id, topic = %self.topic, "worker started");

        loop {
            let read = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                read = self.reader.read_next() => read,
            };

            let message = match read {
                Ok(message) => message,
                Err(e) if e.is_terminal() => {
                    tracing::warn!(worker = self.id, topic = %self.topic, error = %e, "reader unavailable, worker exiting");
                    break;
                }
                Err(e) => {
                    tracing::error!(worker = self.id, topic = %self.topic, error = %e, "read error");
                    if !self.pause(self.read_retry).await {
                        break;
                    }
                    continue;
                }
            };

            // Cancelled while the read was completing: leave the message
            // for whoever reads the group next.
            if self.token.is_cancelled() {
                self.hand_back(message).await;
                break;
            }

            if let Some(gate) = &self.gate {
                if !gate.admit_now() {
                    tracing::info!(
                        worker = self.id,
                        topic = %self.topic,
                        offset = message.offset,
                        backoff_secs = gate.backoff().as_secs(),
                        "outside business hours, deferring message"
                    );
                    self.hand_back(message).await;
                    if !self.pause(gate.backoff()).await {
                        break;
                    }
                    continue;
                }
            }

            self.dispatch::<T, H>(&handler, &message).await;

            if let Err(e) = self.reader.commit(&message).await {
                tracing::warn!(worker = self.id, topic = %self.topic, offset = message.offset, error = %e, "commit failed");
            }
        }

        tracing::debug!(worker = self.id, topic = %self.topic, "worker stopped");
    }

    async fn dispatch<T: Record, H: Handler<T>>(&self, handler: &H, message: &Message) {
        let record: T = match codec::decode(T::schema(), &message.value) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    worker = self.id,
                    topic = %self.topic,
                    offset = message.offset,
                    error = %e,
                    "dropping undecodable message"
                );
                return;
            }
        };

        if let Err(e) = handler.handle(self.token.clone(), record).await {
            tracing::error!(
                worker = self.id,
                topic = %self.topic,
                offset = message.offset,
                key = %String::from_utf8_lossy(&message.key),
                error = %e,
                "handler error"
            );
        }
    }

    async fn hand_back(&self, message: Message) {
        let offset = message.offset;
        if let Err(e) = self.reader.requeue(message).await {
            tracing::warn!(worker = self.id, topic = %self.topic, offset, error = %e, "requeue failed");
        }
    }

    /// Sleep unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Reports a worker unwinding out of its loop.
struct ExitGuard {
    id: usize,
    topic: Arc<str>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::error!(worker = self.id, topic = %self.topic, "worker panicked, pool continues without it");
        }
    }
}
