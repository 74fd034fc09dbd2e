//! Background status polling
//!
//! The poller owns the current [`SourceControlStatus`] and is its only writer.
//! Probes run on a worker thread and report back over a channel; the owning
//! (main) thread applies results in [`StatusPoller::drain`], so a snapshot is
//! always replaced whole and readers never see a partial update.
//!
//! At most one probe sequence runs at a time. A request made while one is in
//! flight is dropped, not queued: the next periodic tick retries naturally.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel as chan;

use crate::provider::Probes;
use crate::status::{ProviderKind, SourceControlStatus};

/// State shared with in-flight workers.
///
/// Workers hold a [`Weak`] to this; once the poller is dropped the upgrade
/// fails and late results are discarded.
#[derive(Debug, Default)]
struct PollerShared {
    in_flight: AtomicBool,
}

/// Worker's handle on [`PollerShared`]. Clears the in-flight flag if the
/// worker unwinds before delivering.
struct InFlightGuard(Weak<PollerShared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if std::thread::panicking()
            && let Some(shared) = self.0.upgrade()
        {
            log::warn!("Status poll worker panicked");
            shared.in_flight.store(false, Ordering::Release);
        }
    }
}

pub struct StatusPoller {
    probes: Probes,
    project_dir: PathBuf,
    shared: Arc<PollerShared>,
    status: Arc<SourceControlStatus>,
    last_request: Option<Instant>,
    tx: chan::Sender<SourceControlStatus>,
    rx: chan::Receiver<SourceControlStatus>,
}

impl StatusPoller {
    pub fn new(probes: Probes, project_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = chan::unbounded();
        Self {
            probes,
            project_dir: project_dir.into(),
            shared: Arc::default(),
            status: Arc::default(),
            last_request: None,
            tx,
            rx,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn probes(&self) -> &Probes {
        &self.probes
    }

    /// Latest complete snapshot.
    pub fn snapshot(&self) -> Arc<SourceControlStatus> {
        Arc::clone(&self.status)
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// When the last accepted request was issued.
    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }

    /// Start a probe sequence for `preferred` unless one is already running.
    ///
    /// Returns whether a new sequence was started.
    pub fn request_update(&mut self, preferred: ProviderKind) -> bool {
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Status poll already in flight; request dropped");
            return false;
        }
        self.last_request = Some(Instant::now());

        let probes = self.probes.clone();
        let project_dir = self.project_dir.clone();
        let liveness = InFlightGuard(Arc::downgrade(&self.shared));
        let tx = self.tx.clone();

        let spawned = std::thread::Builder::new()
            .name("safesave-poll".into())
            .spawn(move || {
                let status = probes.probe(preferred, &project_dir);
                if liveness.0.upgrade().is_none() {
                    log::debug!("Poller dropped; discarding status for {}", project_dir.display());
                    return;
                }
                // The receiver lives as long as the poller, checked above
                let _ = tx.send(status);
            });

        if let Err(e) = spawned {
            log::warn!("Failed to start status poll: {e}");
            self.shared.in_flight.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Apply any finished probe results. Returns whether the snapshot changed hands.
    ///
    /// Call from the owning thread; this is the only place the snapshot is
    /// replaced.
    pub fn drain(&mut self) -> bool {
        let mut applied = false;
        while let Ok(status) = self.rx.try_recv() {
            self.apply(status);
            applied = true;
        }
        applied
    }

    /// Block up to `timeout` for an in-flight result, then apply it.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(status) => {
                self.apply(status);
                self.drain();
                true
            }
            Err(chan::RecvTimeoutError::Timeout) => false,
            // Unreachable while we hold a sender
            Err(chan::RecvTimeoutError::Disconnected) => false,
        }
    }

    fn apply(&mut self, status: SourceControlStatus) {
        log::debug!(
            "Status updated: provider={} repo={} branch={:?}",
            status.provider,
            status.is_repo,
            status.branch
        );
        self.status = Arc::new(status);
        self.shared.in_flight.store(false, Ordering::Release);
    }
}
