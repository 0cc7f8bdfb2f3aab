use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// A status endpoint that can be fetched repeatedly
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    type Status: Send + 'static;

    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Fetch one snapshot. Errors are logged by the poller and otherwise ignored.
    async fn fetch(&self) -> Result<Self::Status>;
}

/// A fetched snapshot tagged with the sequence number of its request
#[derive(Debug, Clone, PartialEq)]
pub struct Polled<T> {
    pub seq: u64,
    pub status: T,
}

/// Drops responses older than the newest one already applied
#[derive(Debug, Default, Clone)]
pub struct SequenceGate {
    last: Option<u64>,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `seq` if it is newer than everything accepted so far
    pub fn admit(&mut self, seq: u64) -> bool {
        match self.last {
            Some(last) if seq <= last => false,
            _ => {
                self.last = Some(seq);
                true
            }
        }
    }
}

/// Fixed-interval poller running as a cancellable tokio task.
///
/// Every tick issues one fetch in its own task so a slow response never
/// delays the next request; consumers order results with [`SequenceGate`].
/// Stopping (or dropping) the poller cancels the loop and any fetch still
/// in flight, so nothing is delivered afterwards. Sequence numbers keep
/// increasing across restarts, so a consumer's gate never sees them go back.
pub struct Poller {
    name: String,
    period: Duration,
    seq: Arc<AtomicU64>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            seq: Arc::new(AtomicU64::new(0)),
            token: CancellationToken::new(),
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Start polling `source`, sending each snapshot to `sink`.
    ///
    /// A missing source means the endpoint is not configured: nothing is
    /// spawned and `false` is returned. So does a zero period.
    /// Starting a running poller is a no-op.
    pub fn start<S>(
        &mut self,
        source: Option<Arc<S>>,
        sink: mpsc::UnboundedSender<Polled<S::Status>>,
    ) -> bool
    where
        S: StatusSource,
    {
        if self.is_running() {
            debug!("{} poller already running", self.name);
            return true;
        }

        if self.period.is_zero() {
            error!("{} poll interval must be greater than zero; polling disabled", self.name);
            return false;
        }

        let source = match source {
            Some(source) => source,
            None => {
                info!("{} endpoint not configured; polling disabled", self.name);
                return false;
            }
        };

        self.token = CancellationToken::new();
        let token = self.token.clone();
        let period = self.period;
        let name = self.name.clone();
        let next_seq = self.seq.clone();

        info!(
            "Starting {} poller for {} with interval of {} ms",
            name,
            source.name(),
            period.as_millis()
        );

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut issued: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let seq = next_seq.fetch_add(1, Ordering::SeqCst) + 1;
                        issued += 1;
                        spawn_fetch(source.clone(), sink.clone(), token.clone(), seq, name.clone());
                    }
                }
            }

            debug!("{} poller loop exited after {} requests", name, issued);
        }));

        true
    }

    /// Stop polling. Idempotent.
    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
            info!("{} poller stopped", self.name);
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_fetch<S: StatusSource>(
    source: Arc<S>,
    sink: mpsc::UnboundedSender<Polled<S::Status>>,
    token: CancellationToken,
    seq: u64,
    name: String,
) {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("{} request #{} cancelled", name, seq);
            }
            result = source.fetch() => match result {
                Ok(status) => {
                    if token.is_cancelled() {
                        return;
                    }
                    if sink.send(Polled { seq, status }).is_err() {
                        debug!("{} consumer gone; dropping response #{}", name, seq);
                    }
                }
                Err(e) => {
                    warn!("{} poll #{} failed; keeping last status: {:#}", name, seq, e);
                }
            }
        }
    });
}
