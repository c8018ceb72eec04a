//! Fire-and-forget dispatch from the ack path to the processing stage.
//!
//! The dispatcher submits an [`InvocationRequest`] to a bounded queue and returns at once; there
//! is no return channel, so the caller cannot observe completion. The [`Worker`] drains the queue
//! and runs each invocation as its own task, so concurrent deliveries are unordered.

use crate::pipeline::Pipeline;
use axum::body::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Name of the processing function the webhook receiver invokes.
pub const PROCESS_FUNCTION: &str = "line-reply-process";

/// Only one-way invocation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    Async,
}

/// One submitted invocation. `payload` is the inbound request, unmodified.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub id: Uuid,
    pub function: String,
    pub mode: InvocationMode,
    pub payload: Bytes,
}

/// Synchronous acknowledgment returned to the webhook caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

impl Ack {
    pub const BODY: &'static str = r#"{"statusCode":200}"#;
}

#[derive(Clone)]
pub struct Dispatcher {
    function: String,
    tx: mpsc::Sender<InvocationRequest>,
}

impl Dispatcher {
    /// Dispatcher and the receiving end of its queue (hand the receiver to a [`Worker`]).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<InvocationRequest>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                function: PROCESS_FUNCTION.to_string(),
                tx,
            },
            rx,
        )
    }

    /// Submit one invocation without waiting, then ack. A full or closed queue is logged; the
    /// ack is returned either way.
    pub fn dispatch(&self, payload: Bytes) -> Ack {
        let request = InvocationRequest {
            id: Uuid::new_v4(),
            function: self.function.clone(),
            mode: InvocationMode::Async,
            payload,
        };
        let id = request.id;
        match self.tx.try_send(request) {
            Ok(()) => log::info!("dispatch: submitted invocation {} to {}", id, self.function),
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("dispatch: queue full, dropping invocation {}", id)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::warn!("dispatch: worker gone, dropping invocation {}", id)
            }
        }
        Ack
    }
}

/// Consumes invocations addressed to [`PROCESS_FUNCTION`] and runs the pipeline for each.
pub struct Worker {
    pipeline: Pipeline,
    rx: mpsc::Receiver<InvocationRequest>,
}

impl Worker {
    pub fn new(pipeline: Pipeline, rx: mpsc::Receiver<InvocationRequest>) -> Self {
        Self { pipeline, rx }
    }

    /// Run until every dispatcher is dropped, then wait for in-flight invocations.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut tasks = tokio::task::JoinSet::new();
        while let Some(request) = self.rx.recv().await {
            if request.function != PROCESS_FUNCTION {
                log::warn!(
                    "worker: ignoring invocation {} for unknown function {}",
                    request.id,
                    request.function
                );
                continue;
            }
            let pipeline = self.pipeline.clone();
            tasks.spawn(async move {
                let outcome = pipeline.process(&request.payload).await;
                log::info!("worker: invocation {} finished: {}", request.id, outcome);
            });
            while tasks.try_join_next().is_some() {}
        }
        while tasks.join_next().await.is_some() {}
        log::info!("worker: queue closed, stopped");
    }
}
