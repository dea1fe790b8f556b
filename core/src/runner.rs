//! # Runner
//!
//! Schedules probes of a plugin over a wordlist.
//!
//! The [`WordlistRunner`] reads candidates on one task, feeds them through a
//! bounded queue to `threads` workers and collects their results on the
//! calling task. Every stage watches the cancellation token: once it fires the
//! reader stops, the workers finish the probe in hand and the run returns a
//! report flagged as interrupted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use burrow_common::cancel::CancellationToken;
use burrow_common::config::{GlobalOptions, MAX_THREADS, Wordlist};
use burrow_common::plugin::{Enumerator, Finding, ProbeResult, Ruleset};
use burrow_common::success;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Counters of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub attempted: usize,
    pub found: usize,
    pub failed: usize,
    /// The run stopped early because cancellation was requested.
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Executes a plugin against its workload.
///
/// Implementations should return soon after `cancel` fires, either with a
/// partial report or with an error. Both are reported as a cancelled run.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(
        &self,
        globals: &GlobalOptions,
        plugin: Arc<dyn Enumerator>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RunReport>;
}

type ProgressCallback = Arc<dyn Fn(usize) + Send + Sync>;
type FindingCallback = Arc<dyn Fn(&Finding) + Send + Sync>;

#[derive(Default)]
pub struct WordlistRunner {
    on_progress: Option<ProgressCallback>,
    on_finding: Option<FindingCallback>,
}

impl WordlistRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the number of completed probes after each one.
    pub fn on_progress(mut self, callback: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Called for every positive result.
    pub fn on_finding(mut self, callback: impl Fn(&Finding) + Send + Sync + 'static) -> Self {
        self.on_finding = Some(Arc::new(callback));
        self
    }

    fn record(&self, result: ProbeResult, report: &mut RunReport, verbose: bool) -> Option<Finding> {
        report.attempted += 1;
        if let Some(cb) = &self.on_progress {
            cb(report.attempted);
        }

        match result {
            ProbeResult::Found(finding) => {
                report.found += 1;
                if let Some(cb) = &self.on_finding {
                    cb(&finding);
                }
                Some(finding)
            }
            ProbeResult::Missing { subject } => {
                if verbose {
                    debug!("Missed: {subject}");
                }
                None
            }
            ProbeResult::Failed { subject, reason } => {
                report.failed += 1;
                debug!("Probe of {subject} failed: {reason}");
                None
            }
        }
    }
}

#[async_trait]
impl Runner for WordlistRunner {
    async fn run(
        &self,
        globals: &GlobalOptions,
        plugin: Arc<dyn Enumerator>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();

        plugin.pre_run(cancel).await?;
        if cancel.is_cancelled() {
            report.interrupted = true;
            report.elapsed = start.elapsed();
            return Ok(report);
        }

        let reader = open_wordlist(&globals.wordlist).await?;
        let mut output = open_output(globals).await?;

        let threads = globals.threads.clamp(1, MAX_THREADS);
        let (candidate_tx, candidate_rx) = mpsc::channel::<String>(threads.saturating_mul(2));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ProbeResult>();

        info!("Starting {} enumeration with {threads} workers", plugin.name());
        let producer = tokio::spawn(feed_candidates(
            reader,
            plugin.ruleset(),
            candidate_tx,
            cancel.clone(),
        ));

        let candidate_rx = Arc::new(Mutex::new(candidate_rx));
        let workers: Vec<JoinHandle<()>> = (0..threads)
            .map(|_| {
                tokio::spawn(probe_candidates(
                    plugin.clone(),
                    candidate_rx.clone(),
                    result_tx.clone(),
                    cancel.clone(),
                    globals.delay,
                ))
            })
            .collect();
        drop(result_tx);

        let mut write_error = None;
        while let Some(result) = result_rx.recv().await {
            if let Some(finding) = self.record(result, &mut report, globals.verbose)
                && let Some(file) = output.as_mut()
                && let Err(e) = file.write_all(format!("{finding}\n").as_bytes()).await
            {
                write_error = Some(anyhow::Error::new(e).context("writing to output file"));
                break;
            }
        }
        if let Some(e) = write_error {
            producer.abort();
            for worker in &workers {
                worker.abort();
            }
            return Err(e);
        }

        for worker in workers {
            worker.await.context("probe worker crashed")?;
        }
        let read = producer.await.context("wordlist reader crashed")??;
        debug!("{read} candidates queued");

        if let Some(mut file) = output {
            file.flush().await.context("flushing output file")?;
        }

        report.interrupted = cancel.is_cancelled();
        report.elapsed = start.elapsed();
        if !report.interrupted {
            success!("Finished {} probes, {} found", report.attempted, report.found);
        }
        Ok(report)
    }
}

async fn open_wordlist(wordlist: &Wordlist) -> anyhow::Result<Box<dyn AsyncBufRead + Send + Unpin>> {
    match wordlist {
        Wordlist::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        Wordlist::File(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("opening wordlist {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

async fn open_output(globals: &GlobalOptions) -> anyhow::Result<Option<File>> {
    let Some(path) = &globals.output else {
        return Ok(None);
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("opening output file {}", path.display()))?;
    Ok(Some(file))
}

async fn feed_candidates(
    mut reader: Box<dyn AsyncBufRead + Send + Unpin>,
    ruleset: Ruleset,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) -> anyhow::Result<usize> {
    let mut raw = Vec::new();
    let mut line_no = 0usize;
    let mut queued = 0;

    loop {
        raw.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut raw) => read.context("reading wordlist")?,
        };
        if read == 0 {
            break;
        }
        line_no += 1;

        let Ok(line) = std::str::from_utf8(&raw) else {
            debug!("Skipping wordlist line {line_no}: not valid UTF-8");
            continue;
        };
        let Some(candidate) = ruleset.admit(line) else {
            continue;
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(candidate.to_string()) => {
                if sent.is_err() {
                    break;
                }
            }
        }
        queued += 1;
    }
    Ok(queued)
}

async fn probe_candidates(
    plugin: Arc<dyn Enumerator>,
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    tx: mpsc::UnboundedSender<ProbeResult>,
    cancel: CancellationToken,
    delay: Duration,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                candidate = rx.recv() => candidate,
            }
        };
        let Some(candidate) = next else {
            break;
        };

        let result = plugin.probe_one(&cancel, &candidate).await;
        if tx.send(result).is_err() {
            break;
        }

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
