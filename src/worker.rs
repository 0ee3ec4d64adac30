//! Background report worker
//!
//! The worker owns a job queue and drives each report through its lifecycle
//! in the store: `pending -> processing -> completed|failed`. Callers submit a
//! URL and get back the report ID plus a channel that resolves when the job
//! finishes. The pipeline itself knows nothing about the queue or the store.

use crate::crawler::{Degradation, Pipeline};
use crate::insights::InsightGenerator;
use crate::state::PipelineStage;
use crate::storage::{ReportStore, StorageError};
use crate::SageError;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Default number of jobs that may wait in the queue
pub const DEFAULT_QUEUE_SIZE: usize = 32;

/// Stage name recorded when a finished analysis could not be stored
pub const STORING_STAGE: &str = "storing";

/// A report to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub report_id: i64,
    pub url: String,

    /// Whether narrative insights should be generated
    pub with_insights: bool,
}

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed {
        report_id: i64,
        overall_score: f64,
        degradations: Vec<Degradation>,
    },
    Failed {
        report_id: i64,
        stage: PipelineStage,
        message: String,
    },
}

impl JobOutcome {
    pub fn report_id(&self) -> i64 {
        match self {
            Self::Completed { report_id, .. } | Self::Failed { report_id, .. } => *report_id,
        }
    }
}

/// Handle to a submitted job
#[derive(Debug)]
pub struct JobTicket {
    pub report_id: i64,

    /// Resolves once the report reaches a terminal status
    pub outcome: oneshot::Receiver<Result<JobOutcome, SageError>>,
}

struct QueuedJob {
    job: AnalysisJob,
    reply: oneshot::Sender<Result<JobOutcome, SageError>>,
}

fn lock_store<S>(store: &Mutex<S>) -> Result<MutexGuard<'_, S>, StorageError> {
    store.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Runs one job against the store
///
/// Pipeline failures are recorded on the report and returned as
/// `JobOutcome::Failed`; only storage failures are errors here. A report
/// whose result cannot be stored is still moved to `failed` when the store
/// allows it.
pub async fn process_job<S, G>(
    pipeline: &Pipeline,
    store: &Mutex<S>,
    generator: Option<&G>,
    job: &AnalysisJob,
) -> Result<JobOutcome, SageError>
where
    S: ReportStore,
    G: InsightGenerator,
{
    {
        let mut store = lock_store(store)?;
        store.mark_processing(job.report_id)?;
    }
    tracing::info!("Processing report {} for {}", job.report_id, job.url);

    let generator = if job.with_insights { generator } else { None };
    let result = pipeline.analyze(&job.url, generator).await;

    let mut store = lock_store(store)?;
    match result {
        Ok(result) => {
            if let Err(e) = store.complete_report(job.report_id, &result) {
                tracing::error!("Failed to store report {}: {}", job.report_id, e);
                // Leave the report terminal even though its analysis is lost
                if let Err(fail_err) =
                    store.fail_report(job.report_id, Some(STORING_STAGE), &e.to_string())
                {
                    tracing::error!(
                        "Failed to mark report {} failed: {}",
                        job.report_id,
                        fail_err
                    );
                }
                return Err(e.into());
            }
            tracing::info!(
                "Report {} completed with score {}",
                job.report_id,
                result.score_result.overall
            );
            Ok(JobOutcome::Completed {
                report_id: job.report_id,
                overall_score: result.score_result.overall,
                degradations: result.degradations,
            })
        }
        Err(e) => {
            let stage = e.stage();
            let message = e.to_string();
            store.fail_report(job.report_id, Some(stage.as_str()), &message)?;
            tracing::warn!("Report {} failed at {}: {}", job.report_id, stage, message);
            Ok(JobOutcome::Failed {
                report_id: job.report_id,
                stage,
                message,
            })
        }
    }
}

/// Processes analysis jobs one at a time on a background task
pub struct ReportWorker<S> {
    store: Arc<Mutex<S>>,
    sender: mpsc::Sender<QueuedJob>,
    handle: JoinHandle<()>,
}

impl<S> ReportWorker<S>
where
    S: ReportStore + Send + 'static,
{
    /// Starts the worker task
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline used for every job
    /// * `store` - Report store shared with the caller
    /// * `generator` - Insight generator for jobs that ask for insights
    /// * `queue_size` - Jobs that may wait before `submit` blocks
    pub fn spawn<G>(
        pipeline: Pipeline,
        store: Arc<Mutex<S>>,
        generator: Option<G>,
        queue_size: usize,
    ) -> Self
    where
        G: InsightGenerator + 'static,
    {
        let (sender, mut receiver) = mpsc::channel::<QueuedJob>(queue_size.max(1));
        let worker_store = store.clone();

        let handle = tokio::spawn(async move {
            while let Some(queued) = receiver.recv().await {
                let outcome =
                    process_job(&pipeline, &worker_store, generator.as_ref(), &queued.job).await;
                if let Err(e) = &outcome {
                    tracing::error!("Job for report {} failed: {}", queued.job.report_id, e);
                }
                // The submitter may have stopped waiting
                let _ = queued.reply.send(outcome);
            }
            tracing::debug!("Report worker stopped");
        });

        Self {
            store,
            sender,
            handle,
        }
    }

    /// Creates a pending report for `url` and queues it
    ///
    /// # Returns
    ///
    /// * `Ok(JobTicket)` - The report was created and queued
    /// * `Err(SageError)` - The report could not be created or the worker is gone
    pub async fn submit(&self, url: &str, with_insights: bool) -> Result<JobTicket, SageError> {
        let report_id = {
            let mut store = lock_store(&self.store)?;
            store.create_report(url)?
        };

        let (reply, outcome) = oneshot::channel();
        let job = AnalysisJob {
            report_id,
            url: url.to_string(),
            with_insights,
        };

        self.sender
            .send(QueuedJob { job, reply })
            .await
            .map_err(|_| SageError::WorkerStopped)?;
        tracing::debug!("Queued report {} for {}", report_id, url);

        Ok(JobTicket { report_id, outcome })
    }

    /// Stops accepting jobs and waits for queued ones to finish
    pub async fn shutdown(self) -> Result<(), SageError> {
        drop(self.sender);
        self.handle.await.map_err(|_| SageError::WorkerStopped)
    }
}
