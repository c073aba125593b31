use std::time::Duration;

use recollect_core::hash::digest_ids;
use recollect_core::Message;

use crate::batch::{partition, select, Batch};
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::payload::{ImportRequest, ImportResponse, RequestSettings};
use crate::transport::{ImportTransport, Reply, IMPORT_PATH, STATUS_PATH};

/// What happened to one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// HTTP 200 with the remote counters.
    Accepted(ImportResponse),
    /// Any other status.
    Rejected { status: u16, body: String },
    /// No usable response: connection, timeout, or undecodable body.
    TransportFailed { error: String },
}

impl BatchOutcome {
    fn from_result(result: Result<Reply, ImportError>) -> Self {
        match result {
            Ok(reply) if reply.is_ok() => match reply.json::<ImportResponse>(IMPORT_PATH) {
                Ok(resp) => BatchOutcome::Accepted(resp),
                Err(e) => BatchOutcome::TransportFailed {
                    error: e.to_string(),
                },
            },
            Ok(reply) => BatchOutcome::Rejected {
                status: reply.status,
                body: reply.excerpt(),
            },
            Err(e) => BatchOutcome::TransportFailed {
                error: e.to_string(),
            },
        }
    }
}

/// Running totals across batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportTally {
    /// Messages sent, summed over batch sizes.
    pub attempted: usize,
    /// `totalProcessed` as reported by the remote side.
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub failed_batches: usize,
}

impl ImportTally {
    /// Fold one batch outcome into the totals.
    pub fn absorb(self, batch_len: usize, outcome: &BatchOutcome) -> Self {
        let mut next = Self {
            attempted: self.attempted + batch_len,
            ..self
        };
        match outcome {
            BatchOutcome::Accepted(resp) => {
                next.processed += resp.total_processed;
                next.successful += resp.successful;
                next.failed += resp.failed;
                next.duplicates += resp.duplicates.unwrap_or(0);
            }
            BatchOutcome::Rejected { .. } | BatchOutcome::TransportFailed { .. } => {
                next.failed += batch_len;
                next.failed_batches += 1;
            }
        }
        next
    }

    /// A run succeeds when at least one message was accepted.
    pub fn is_success(&self) -> bool {
        self.successful > 0
    }

    /// Percentage of attempted messages accepted, `None` when nothing was sent.
    pub fn success_rate(&self) -> Option<f64> {
        if self.attempted == 0 {
            None
        } else {
            Some(self.successful as f64 / self.attempted as f64 * 100.0)
        }
    }
}

/// One line of the per-batch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub number: usize,
    pub size: usize,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub tally: ImportTally,
    pub batches: Vec<BatchReport>,
    pub skipped_system: usize,
}

/// Loop settings derived from [`ImportConfig`].
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub batch_size: usize,
    pub pause: Duration,
    pub skip_system: bool,
    pub precheck: bool,
    pub verify: bool,
    pub request: RequestSettings,
}

impl RunPlan {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            pause: config.pause,
            skip_system: config.skip_system,
            precheck: true,
            verify: true,
            request: RequestSettings {
                platform: config.platform.clone(),
                dry_run: config.dry_run,
                idempotency_prefix: config.idempotency_prefix.clone(),
            },
        }
    }
}

/// Confirm the store answers its status endpoint with 200.
pub fn precheck<T: ImportTransport>(transport: &mut T) -> Result<(), ImportError> {
    let reply = transport.status()?;
    if !reply.is_ok() {
        return Err(reply.unexpected(STATUS_PATH));
    }
    tracing::info!("memory store reachable");
    Ok(())
}

/// Upload `messages` batch by batch.
///
/// Batches are sent strictly in order with `plan.pause` between them. A
/// failed batch is recorded and the loop moves on; the only errors returned
/// are a bad batch size and a failed precheck, both before anything is sent.
pub fn import_messages<T: ImportTransport>(
    transport: &mut T,
    messages: &[Message],
    plan: &RunPlan,
) -> Result<ImportReport, ImportError> {
    let selected = select(messages, plan.skip_system);
    let batches = partition(&selected, plan.batch_size)?;
    let skipped_system = messages.len() - selected.len();

    if plan.precheck {
        precheck(transport)?;
    }

    tracing::info!(
        messages = selected.len(),
        batches = batches.len(),
        skipped_system,
        digest = %digest_ids(selected.iter().map(|e| e.message.id.as_str())),
        "starting import"
    );

    let mut report = ImportReport {
        skipped_system,
        ..ImportReport::default()
    };
    for batch in &batches {
        let outcome = send_batch(transport, batch, &plan.request);
        report.tally = report.tally.absorb(batch.len(), &outcome);
        report.batches.push(BatchReport {
            number: batch.number,
            size: batch.len(),
            outcome,
        });

        if !batch.is_last() && !plan.pause.is_zero() {
            std::thread::sleep(plan.pause);
        }
    }

    if plan.verify {
        verify(transport);
    }
    Ok(report)
}

fn send_batch<T: ImportTransport>(
    transport: &mut T,
    batch: &Batch<'_, '_>,
    settings: &RequestSettings,
) -> BatchOutcome {
    let request = ImportRequest::for_batch(batch, settings);
    let outcome = BatchOutcome::from_result(transport.submit(&request));
    match &outcome {
        BatchOutcome::Accepted(resp) => tracing::info!(
            batch = batch.number,
            total = batch.total,
            successful = resp.successful,
            failed = resp.failed,
            processed = resp.total_processed,
            "batch imported"
        ),
        BatchOutcome::Rejected { status, body } => tracing::warn!(
            batch = batch.number,
            total = batch.total,
            status,
            body = %body,
            "batch rejected"
        ),
        BatchOutcome::TransportFailed { error } => tracing::warn!(
            batch = batch.number,
            total = batch.total,
            error = %error,
            "batch failed"
        ),
    }
    outcome
}

/// Post-run status check; failures are logged only.
fn verify<T: ImportTransport>(transport: &mut T) {
    match transport.status() {
        Ok(reply) if reply.is_ok() => {
            tracing::info!(status = %reply.excerpt(), "post-import status")
        }
        Ok(reply) => tracing::warn!(status = reply.status, "post-import status check failed"),
        Err(e) => tracing::warn!(error = %e, "post-import status check failed"),
    }
}
