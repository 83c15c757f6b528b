//! Concurrent match dispatch.
//!
//! One task is scheduled per eligible source record on a bounded worker pool
//! sized from the available hardware parallelism. Workers return their
//! classification over a channel; a single collector performs the union, so
//! the final buckets are order-independent and no shared accumulator needs
//! locking. Tasks never communicate with each other.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::catalog::CellLineCatalog;
use crate::error::{CellMapError, CellMapResult, DispatchError};
use crate::matching::orchestrator::{classify, is_eligible_source, Classification};
use crate::matching::MatchContext;
use crate::report::{Bucket, MappingReport, ReportWriter};

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Fraction of available CPUs given to the worker pool (at least one
    /// worker is always spawned).
    pub worker_ratio: f64,
    /// Capacity of the job and result channels.
    pub queue_capacity: usize,
    /// Upper bound on the joint wait for all tasks. Exceeding it skips the
    /// report flush; running tasks are left to finish on their own.
    pub wait_timeout: Duration,
    /// Cap on submitted records, 0 for unbounded. A debugging aid.
    pub max_records: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_ratio: 0.9,
            queue_capacity: 1024,
            wait_timeout: Duration::from_secs(10 * 60 * 60),
            max_records: 0,
        }
    }
}

impl DispatchConfig {
    /// Worker pool size under this configuration on this machine.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        let cpus = num_cpus::get();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = (cpus as f64 * self.worker_ratio).round() as usize;
        scaled.max(1)
    }
}

struct TaskResult {
    accession: String,
    outcome: Result<Classification, String>,
}

/// Schedules one orchestration task per eligible source record and gathers
/// the classifications into a [`MappingReport`].
pub struct MatchDispatcher {
    ctx: Arc<MatchContext>,
    cfg: DispatchConfig,
}

impl MatchDispatcher {
    /// Creates a dispatcher over a fully loaded context.
    #[must_use]
    pub fn new(ctx: Arc<MatchContext>, cfg: DispatchConfig) -> Self {
        Self { ctx, cfg }
    }

    /// Runs the whole job: filter, fan out, collect.
    ///
    /// A worker panic inside one record's scoring is contained and recorded
    /// as a failure; it never takes down the job. Exceeding the wait bound
    /// marks the report timed out without cancelling running tasks.
    ///
    /// # Errors
    /// Returns [`DispatchError::WorkerSpawn`] when the pool cannot be
    /// created.
    pub fn run(&self) -> CellMapResult<MappingReport> {
        let started = Instant::now();
        let mut report = MappingReport::new();

        let cpus = num_cpus::get();
        let workers = self.cfg.worker_count();
        tracing::info!(cpus, workers, "sizing match worker pool");

        let mut eligible: Vec<String> = self.ctx.source.accessions();
        eligible.sort();
        eligible.retain(|accession| {
            self.ctx
                .source
                .cell_line(accession)
                .is_some_and(|record| is_eligible_source(&self.ctx, record))
        });
        if self.cfg.max_records > 0 {
            eligible.truncate(self.cfg.max_records);
        }
        let expected = eligible.len();
        tracing::info!(
            eligible = expected,
            total = self.ctx.source.len(),
            targets = self.ctx.target.len(),
            "submitting match tasks"
        );

        let capacity = self.cfg.queue_capacity.max(1);
        let (job_tx, job_rx) = bounded::<String>(capacity);
        let (result_tx, result_rx) = bounded::<TaskResult>(capacity);

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let ctx = Arc::clone(&self.ctx);
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("cellmap-match-{index}"))
                .spawn(move || worker_loop(&ctx, &jobs, &results))
                .map_err(|e| DispatchError::WorkerSpawn {
                    message: e.to_string(),
                })?;
            handles.push(handle);
        }
        drop(job_rx);
        drop(result_tx);

        // Submission runs on its own thread so the collector below can drain
        // results while the bounded job queue fills.
        let feeder = thread::Builder::new()
            .name("cellmap-submit".to_string())
            .spawn(move || {
                for (index, accession) in eligible.into_iter().enumerate() {
                    tracing::debug!(queue = index + 1, accession = %accession, "submitting match task");
                    if job_tx.send(accession).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| DispatchError::WorkerSpawn {
                message: e.to_string(),
            })?;

        let deadline = started + self.cfg.wait_timeout;
        let mut received = 0usize;
        while received < expected {
            match result_rx.recv_deadline(deadline) {
                Ok(task) => {
                    received += 1;
                    match task.outcome {
                        Ok(classification) => report.record(&task.accession, classification),
                        Err(reason) => {
                            tracing::error!(
                                accession = %task.accession,
                                reason = %reason,
                                "match task failed"
                            );
                            report.record_failure(&task.accession, reason);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        outstanding = expected - received,
                        timeout = ?self.cfg.wait_timeout,
                        "match job wait exceeded its bound; leaving tasks to finish"
                    );
                    report.mark_timed_out();
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!(
                        outstanding = expected - received,
                        "result channel closed before all tasks reported"
                    );
                    report.mark_timed_out();
                    break;
                }
            }
        }

        if report.timed_out() {
            // Detach: the pool keeps draining its queue, results go nowhere.
            drop(handles);
            drop(feeder);
        } else {
            let _ = feeder.join();
            drop(result_rx);
            for handle in handles {
                let _ = handle.join();
            }
        }

        report.set_elapsed(started.elapsed());
        for bucket in Bucket::WRITTEN {
            tracing::info!(
                bucket = bucket.as_str(),
                records = report.accessions(bucket).len(),
                "bucket populated"
            );
        }
        if !report.failures().is_empty() {
            tracing::warn!(failed = report.failures().len(), "tasks failed during the job");
        }
        Ok(report)
    }

    /// Runs the job and flushes the report. A timed-out job skips the flush
    /// with a logged condition; a flush failure is fatal.
    ///
    /// # Errors
    /// Propagates spawn errors from [`MatchDispatcher::run`] and writer
    /// errors from the flush.
    pub fn run_and_flush(&self, writer: &mut dyn ReportWriter) -> CellMapResult<MappingReport> {
        let report = self.run()?;
        if report.timed_out() {
            tracing::warn!("match job incomplete; skipping report flush");
            return Ok(report);
        }
        report.flush(writer).map_err(CellMapError::from)?;
        tracing::info!(summary = %report.summary(), "finished mapping job");
        Ok(report)
    }
}

fn worker_loop(ctx: &MatchContext, jobs: &Receiver<String>, results: &Sender<TaskResult>) {
    for accession in jobs {
        let outcome = match ctx.source.cell_line(&accession) {
            None => Err(format!("record {accession} missing from source catalog")),
            Some(source) => panic::catch_unwind(AssertUnwindSafe(|| classify(ctx, source)))
                .map_err(|payload| panic_message(payload.as_ref())),
        };
        // A send failure means the collector gave up waiting; keep draining
        // the queue so submission can complete, discarding results.
        let _ = results.send(TaskResult { accession, outcome });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "match task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CellLineCatalog, InMemoryBridge, InMemoryCatalog, MappingBridge};
    use crate::entity::{CellLine, OntologyTerm, TermKind};
    use crate::ontology::DiseaseOntology;

    fn named(accession: &str, name: &str) -> CellLine {
        let mut line = CellLine::from_accession(accession);
        line.set_name(name);
        line
    }

    fn catalogs(source: Vec<CellLine>, target: Vec<CellLine>) -> MatchContext {
        let mut source_catalog = InMemoryCatalog::new("EFO");
        for record in source {
            source_catalog.insert(record);
        }
        let mut target_catalog = InMemoryCatalog::new("CLO");
        for record in target {
            target_catalog.insert(record);
        }
        MatchContext::new(
            Arc::new(source_catalog),
            Arc::new(target_catalog),
            Arc::new(InMemoryBridge::empty()),
        )
    }

    #[test]
    fn every_eligible_record_lands_in_exactly_one_bucket() {
        let ctx = catalogs(
            vec![
                named("EFO_1", "HeLa"),
                named("EFO_2", "HEK293"),
                named("EFO_3", "unheard of"),
            ],
            vec![named("CLO_1", "HeLa"), named("CLO_2", "HEK293 cell")],
        );
        let dispatcher = MatchDispatcher::new(Arc::new(ctx), DispatchConfig::default());
        let report = dispatcher.run().unwrap();

        for accession in ["EFO_1", "EFO_2", "EFO_3"] {
            assert!(report.bucket_of(accession).is_some(), "{accession} lost");
        }
        assert_eq!(report.bucket_of("EFO_1"), Some(Bucket::ExactValid));
        assert!(!report.timed_out());
        assert!(report.failures().is_empty());
    }

    #[test]
    fn single_worker_configuration_still_completes() {
        let ctx = catalogs(
            vec![named("EFO_1", "HeLa")],
            vec![named("CLO_1", "HeLa cell")],
        );
        let cfg = DispatchConfig {
            worker_ratio: 0.0,
            ..DispatchConfig::default()
        };
        assert_eq!(cfg.worker_count(), 1);
        let report = MatchDispatcher::new(Arc::new(ctx), cfg).run().unwrap();
        assert_eq!(report.bucket_of("EFO_1"), Some(Bucket::Fuzzy));
    }

    #[test]
    fn max_records_caps_submission() {
        let ctx = catalogs(
            vec![named("EFO_1", "a"), named("EFO_2", "b"), named("EFO_3", "c")],
            vec![named("CLO_1", "d")],
        );
        let cfg = DispatchConfig {
            max_records: 1,
            ..DispatchConfig::default()
        };
        let report = MatchDispatcher::new(Arc::new(ctx), cfg).run().unwrap();
        // Submission is sorted, so the cap keeps the first accession.
        assert!(report.bucket_of("EFO_1").is_some());
        assert!(report.bucket_of("EFO_2").is_none());
        assert!(report.bucket_of("EFO_3").is_none());
    }

    struct SlowBridge;

    impl MappingBridge for SlowBridge {
        fn is_source_bridged(&self, _accession: &str) -> bool {
            false
        }

        fn is_target_bridged(&self, _accession: &str) -> bool {
            thread::sleep(Duration::from_millis(300));
            false
        }

        fn bridged_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn exceeding_the_wait_bound_skips_the_flush() {
        let mut ctx = catalogs(
            vec![named("EFO_1", "HeLa")],
            vec![named("CLO_1", "HeLa")],
        );
        ctx.bridge = Arc::new(SlowBridge);
        let cfg = DispatchConfig {
            wait_timeout: Duration::from_millis(10),
            ..DispatchConfig::default()
        };
        let report = MatchDispatcher::new(Arc::new(ctx), cfg).run().unwrap();
        assert!(report.timed_out());
        assert!(report.bucket_of("EFO_1").is_none());
    }

    struct PanickingOntology;

    impl DiseaseOntology for PanickingOntology {
        fn diseases_from_cross_reference(&self, _accession: &str) -> Vec<OntologyTerm> {
            panic!("ontology backend exploded");
        }

        fn is_ancestor_or_descendant(
            &self,
            _a: &OntologyTerm,
            _b: &OntologyTerm,
            _max_distance: u32,
        ) -> bool {
            false
        }
    }

    #[test]
    fn a_panicking_task_lands_in_the_failed_bucket() {
        let mut source = named("EFO_1", "HeLa");
        let mut source_disease = OntologyTerm::from_accession(TermKind::Disease, "EFO_0000311");
        source_disease.set_name("cancer");
        source.add_disease(source_disease);

        let mut target = named("CLO_1", "HeLa");
        let mut target_disease = OntologyTerm::from_accession(TermKind::Disease, "DOID_162");
        target_disease.set_name("malignancy");
        target.add_disease(target_disease);

        // A healthy record alongside, to show the job survives.
        let healthy = named("EFO_2", "HEK293");

        let ctx = catalogs(vec![source, healthy], vec![target])
            .with_disease_ontology(Arc::new(PanickingOntology));
        let report = MatchDispatcher::new(Arc::new(ctx), DispatchConfig::default())
            .run()
            .unwrap();

        assert_eq!(report.bucket_of("EFO_1"), Some(Bucket::Failed));
        assert_eq!(report.failures().len(), 1);
        assert!(report.failures()[0].reason.contains("exploded"));
        assert_eq!(report.bucket_of("EFO_2"), Some(Bucket::Fuzzy));
    }

    #[test]
    fn bridged_records_are_excluded_on_both_sides() {
        struct FixedBridge;

        impl MappingBridge for FixedBridge {
            fn is_source_bridged(&self, accession: &str) -> bool {
                accession == "EFO_1"
            }

            fn is_target_bridged(&self, accession: &str) -> bool {
                accession == "CLO_1"
            }

            fn bridged_count(&self) -> usize {
                1
            }
        }

        let mut ctx = catalogs(
            vec![named("EFO_1", "HeLa"), named("EFO_2", "HeLa")],
            vec![named("CLO_1", "HeLa"), named("CLO_2", "HeLa variant")],
        );
        ctx.bridge = Arc::new(FixedBridge);
        let report = MatchDispatcher::new(Arc::new(ctx), DispatchConfig::default())
            .run()
            .unwrap();

        // EFO_1 is bridged away entirely.
        assert!(report.bucket_of("EFO_1").is_none());
        // EFO_2 never sees the bridged target CLO_1, so no exact hit exists.
        assert_eq!(report.bucket_of("EFO_2"), Some(Bucket::Fuzzy));
        let rows = report.rows(Bucket::Fuzzy);
        assert!(rows.iter().all(|row| row.target_accession != "CLO_1"));
    }

    #[test]
    fn empty_source_catalog_yields_an_empty_report() {
        let ctx = catalogs(vec![], vec![named("CLO_1", "HeLa")]);
        let report = MatchDispatcher::new(Arc::new(ctx), DispatchConfig::default())
            .run()
            .unwrap();
        for bucket in Bucket::WRITTEN {
            assert!(report.accessions(bucket).is_empty());
        }
    }

    #[test]
    fn default_worker_count_tracks_available_cpus() {
        let cfg = DispatchConfig::default();
        let count = cfg.worker_count();
        assert!(count >= 1);
        assert!(count <= num_cpus::get());
    }
}
