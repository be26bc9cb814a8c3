//! # In-Process Queue Worker
//!
//! Drains the channel behind `ChannelPublisher`. Each message runs in its own
//! task, at most `max_concurrency` at a time. While every permit is taken the
//! worker stops receiving, so a full channel pushes back on the trigger.

use sigmascholar::{ExecutionOutcome, IngestionRequest, PipelineExecutor};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Semaphore},
    task::{JoinHandle, JoinSet},
};
use tracing::{error, info, warn};

/// Spawns the worker. Once every publisher has been dropped it finishes the
/// runs already in flight, then stops.
pub fn spawn_worker(
    mut receiver: mpsc::Receiver<IngestionRequest>,
    executor: Arc<PipelineExecutor>,
    max_concurrency: usize,
) -> JoinHandle<()> {
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        while let Some(request) = receiver.recv().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let executor = executor.clone();
            in_flight.spawn(async move {
                let outcome = executor.execute(&request).await;
                log_outcome(&request, &outcome);
                drop(permit);
            });
            while let Some(joined) = in_flight.try_join_next() {
                report_panic(joined);
            }
        }

        info!(in_flight = in_flight.len(), "Processing queue closed, draining worker.");
        while let Some(joined) = in_flight.join_next().await {
            report_panic(joined);
        }
        info!("Worker stopped.");
    })
}

fn report_panic(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!("Pipeline task aborted: {e}");
    }
}

pub(crate) fn log_outcome(request: &IngestionRequest, outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Completed {
            element_count,
            text_length,
            used_fallback,
        } => info!(
            file_id = %request.file_id,
            element_count,
            text_length,
            used_fallback,
            "Document processed"
        ),
        ExecutionOutcome::Failed { error } => {
            warn!(file_id = %request.file_id, %error, "Document processing failed")
        }
        ExecutionOutcome::RecordMissing => {
            warn!(file_id = %request.file_id, "Document processed without a file record")
        }
        ExecutionOutcome::StatusWriteFailed { error } => {
            warn!(file_id = %request.file_id, %error, "Document status could not be written")
        }
    }
}
