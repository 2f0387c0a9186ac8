//! # Scheduler Module
//!
//! Drives the sampling pipeline on a background task while the caller's own flow (UI
//! automation, a timer, Ctrl-C) carries on:
//!
//! ```text
//! acquire -> assemble -> append to series store -> feed live aggregator
//! ```
//!
//! Lifecycle: `Idle -> Running -> Stopping -> Stopped`. [`SamplingScheduler::start`] returns
//! immediately. [`SamplingScheduler::stop`] is cooperative: the worker finishes the tick it is
//! in, exits its loop, and is joined before the export is computed, so the aggregator only
//! ever sees a quiesced series. Calling `start` twice, or `stop` before `start`, does nothing.
//!
//! Failure policy:
//!
//! * a dump that does not parse, or an acquisition that times out, costs one tick
//! * a row that cannot be written costs one tick and leaves nothing behind in the log
//! * an error from the diagnostic channel itself ends the worker; `stop` still exports
//!   everything captured up to that point, and so does a worker that panicked
//!
//! The export is computed over the whole series log once the worker is gone, so rows an
//! earlier run appended to the same file are part of it. Reading the log back is the same
//! batch aggregation `hm-perf aggregate` runs; if that read fails the rows this run observed
//! are exported instead.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::acquisition::DiagnosticSource;
use crate::aggregate::{aggregate_file, Export, LiveAggregator};
use crate::config::SamplerConfig;
use crate::cpu::CoreRegistry;
use crate::error::{Error, Result};
use crate::sample::SampleAssembler;
use crate::store::SeriesStore;

/// Lifecycle of a [`SamplingScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Ticks appended to the series store
    pub ticks_ok: usize,
    /// Ticks dropped because the dump did not parse or acquisition timed out
    pub ticks_failed: usize,
    /// Ticks lost because the row could not be written
    pub write_failures: usize,
    /// Best-effort export over every row in the series log
    pub export: Export,
    pub series_path: PathBuf,
    /// Where the export was written, `None` if writing it failed
    pub export_path: Option<PathBuf>,
    /// The channel error that ended the run early, if any
    pub terminated_by: Option<String>,
}

impl RunReport {
    /// Every tick the worker attempted
    pub fn ticks_total(&self) -> usize {
        self.ticks_ok + self.ticks_failed + self.write_failures
    }
}

#[derive(Debug, Default)]
struct WorkerOutcome {
    ticks_ok: usize,
    ticks_failed: usize,
    write_failures: usize,
    terminated_by: Option<String>,
    live: LiveAggregator,
}

/// Runs the acquire-parse-append cycle at a fixed cadence
pub struct SamplingScheduler {
    config: SamplerConfig,
    source: Arc<dyn DiagnosticSource>,
    assembler: SampleAssembler,
    store: Option<SeriesStore>,
    series_path: PathBuf,
    state: SchedulerState,
    cancel: CancellationToken,
    done: CancellationToken,
    worker: Option<JoinHandle<WorkerOutcome>>,
}

impl fmt::Debug for SamplingScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplingScheduler")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SamplingScheduler {
    pub fn new(config: SamplerConfig, source: Arc<dyn DiagnosticSource>) -> Self {
        let series_path = config.series_path();
        Self {
            config,
            source,
            assembler: SampleAssembler::default(),
            store: None,
            series_path,
            state: SchedulerState::Idle,
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            worker: None,
        }
    }

    /// Uses a dedicated core registry instead of the process-wide one
    pub fn with_registry(mut self, registry: Arc<CoreRegistry>) -> Self {
        self.assembler = SampleAssembler::new(registry);
        self
    }

    /// Writes into an already opened store instead of opening `series_path()` at start
    pub fn with_store(mut self, store: SeriesStore) -> Self {
        self.series_path = store.path().to_path_buf();
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Validates the configuration, opens the series store and spawns the worker. Must be called
    /// from within a Tokio runtime.
    ///
    /// Errors here are run-setup errors (invalid configuration, unwritable output directory, no
    /// runtime); the scheduler stays `Idle`. An out-of-range interval is clamped, see
    /// [`SamplerConfig::validate`].
    pub fn start(&mut self) -> Result<()> {
        if self.state != SchedulerState::Idle {
            debug!(state = %self.state, "start ignored");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| Error::invalid_state("start() needs a Tokio runtime"))?;
        self.config.validate()?;
        fs::create_dir_all(&self.config.output_dir)?;
        let store = match self.store.take() {
            Some(store) => store,
            None => SeriesStore::open(self.config.series_path())?,
        };
        self.series_path = store.path().to_path_buf();

        let worker = Worker {
            config: self.config.clone(),
            source: Arc::clone(&self.source),
            assembler: self.assembler.clone(),
            store: Arc::new(Mutex::new(store)),
            cancel: self.cancel.clone(),
            done: self.done.clone(),
        };
        self.worker = Some(runtime.spawn(worker.run()));
        self.state = SchedulerState::Running;

        info!(
            package = %self.config.package_name,
            interval_ms = self.config.interval_ms,
            series = %self.series_path.display(),
            "sampling started"
        );
        Ok(())
    }

    /// Resolves once the worker has exited, whether stopped or terminated by a channel error
    pub async fn terminated(&self) {
        if self.worker.is_some() {
            self.done.cancelled().await;
        }
    }

    /// Signals the worker, waits for it to finish its current tick, then aggregates the series
    /// log and writes the export. Returns `None` when the scheduler was not running.
    ///
    /// A worker that panicked still yields a report: its tick counters are lost, the export is
    /// not.
    pub async fn stop(&mut self) -> Result<Option<RunReport>> {
        if self.state != SchedulerState::Running {
            debug!(state = %self.state, "stop ignored");
            return Ok(None);
        }
        let Some(worker) = self.worker.take() else {
            self.state = SchedulerState::Stopped;
            return Ok(None);
        };

        self.state = SchedulerState::Stopping;
        info!("stopping sampling");
        self.cancel.cancel();

        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "sampling worker failed");
                WorkerOutcome { terminated_by: Some(format!("sampling worker failed: {e}")), ..WorkerOutcome::default() }
            },
        };
        self.state = SchedulerState::Stopped;

        let export = self.aggregate_run(outcome.live).await;
        let export_path = self.config.export_path();
        let export_path = match write_export(&export, &export_path).await {
            Ok(()) => Some(export_path),
            Err(e) => {
                error!(path = %export_path.display(), error = %e, "failed to write export");
                None
            },
        };

        let report = RunReport {
            ticks_ok: outcome.ticks_ok,
            ticks_failed: outcome.ticks_failed,
            write_failures: outcome.write_failures,
            export,
            series_path: self.series_path.clone(),
            export_path,
            terminated_by: outcome.terminated_by,
        };
        info!(
            ticks_ok = report.ticks_ok,
            ticks_failed = report.ticks_failed,
            write_failures = report.write_failures,
            "sampling stopped"
        );
        Ok(Some(report))
    }

    /// Batch-aggregates the quiesced log, falling back to the rows this run observed
    async fn aggregate_run(&self, live: LiveAggregator) -> Export {
        let path = self.series_path.clone();
        let format = self.config.timestamp_format;

        let reason = match task::spawn_blocking(move || aggregate_file(path, format)).await {
            Ok(Ok(export)) => return export,
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        warn!(path = %self.series_path.display(), error = %reason, "could not read series back, exporting live rows");
        live.finish(format)
    }
}

async fn write_export(export: &Export, path: &Path) -> Result<()> {
    tokio::fs::write(path, export.to_json_pretty()?).await?;
    info!(path = %path.display(), "wrote aggregate export");
    Ok(())
}

impl Drop for SamplingScheduler {
    fn drop(&mut self) {
        // The worker ends after its current tick; nobody is left to collect the report
        if self.worker.is_some() {
            self.cancel.cancel();
        }
    }
}

/// Everything the background task owns for the length of a run
struct Worker {
    config: SamplerConfig,
    source: Arc<dyn DiagnosticSource>,
    assembler: SampleAssembler,
    store: Arc<Mutex<SeriesStore>>,
    cancel: CancellationToken,
    done: CancellationToken,
}

impl Worker {
    async fn run(mut self) -> WorkerOutcome {
        let _done = scopeguard::guard(self.done.clone(), |done| done.cancel());
        let mut outcome = WorkerOutcome::default();

        let mut cadence = interval(self.config.interval());
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = cadence.tick() => {},
            }
            if self.cancel.is_cancelled() {
                break;
            }

            if let Err(e) = self.tick(&mut outcome).await {
                error!(error = %e, "diagnostic channel failed, ending run");
                outcome.terminated_by = Some(e.to_string());
                break;
            }
        }

        debug!(rows = self.store.lock().rows_written(), "sampling worker exiting");
        outcome
    }

    /// One acquire-parse-append cycle. Only a channel error is returned.
    async fn tick(&mut self, outcome: &mut WorkerOutcome) -> Result<()> {
        let dump = match timeout(self.config.acquisition_timeout(), self.source.acquire()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_ms = self.config.acquisition_timeout_ms, "acquisition timed out, dropping tick");
                outcome.ticks_failed += 1;
                return Ok(());
            },
        };

        let sample = match self.assembler.assemble(&dump) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "dropping tick");
                outcome.ticks_failed += 1;
                return Ok(());
            },
        };

        let store = Arc::clone(&self.store);
        match task::spawn_blocking(move || store.lock().append(&sample)).await {
            Ok(Ok(row)) => {
                outcome.live.observe_row(&row);
                outcome.ticks_ok += 1;
            },
            Ok(Err(e)) => {
                error!(error = %e, "failed to append tick");
                outcome.write_failures += 1;
            },
            Err(e) => {
                error!(error = %e, "append task failed");
                outcome.write_failures += 1;
            },
        }
        Ok(())
    }
}
