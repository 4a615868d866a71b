//! `notify`-backed delivery: OS events in, hub dispatches out.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::hub::WatchHub;
use super::listener::PathEventKind;

/// Filesystem watcher feeding a [`WatchHub`].
///
/// Created and deleted events are dispatched immediately; modify events are
/// debounced per path. Listener callbacks run on the task driving
/// [`FsWatcher::run`], so backend latency is absorbed there.
///
/// The `notify` callback never blocks. Listeners register new OS watches
/// while handling events, and `notify` answers those requests on the same
/// thread that runs the callback, so the channel between them is unbounded.
pub struct FsWatcher {
    hub: Arc<WatchHub>,
    debouncer: Debouncer,
    event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    tick: Duration,
    backlog_warning: usize,
}

impl FsWatcher {
    pub fn builder() -> FsWatcherBuilder {
        FsWatcherBuilder::new()
    }

    /// The hub listeners subscribe to.
    pub fn hub(&self) -> Arc<WatchHub> {
        self.hub.clone()
    }

    /// Deliver events until `shutdown` resolves.
    ///
    /// Pending debounced modifications are dropped on shutdown.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<(), WatchError> {
        tokio::pin!(shutdown);
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut backlog_reported = false;
        crate::log_event!("watcher", "started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    let dropped = self.debouncer.clear();
                    crate::log_event!("watcher", "stopping", "{dropped} pending modifications dropped");
                    return Ok(());
                }

                received = self.event_rx.recv() => {
                    match received {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => {
                            let err = WatchError::EventError { details: e.to_string() };
                            tracing::error!("[watcher] {err}");
                        }
                        None => return Err(WatchError::ChannelClosed),
                    }

                    let backlog = self.event_rx.len();
                    if backlog >= self.backlog_warning && !backlog_reported {
                        tracing::warn!("[watcher] {backlog} events queued behind slow listeners");
                        backlog_reported = true;
                    } else if backlog == 0 {
                        backlog_reported = false;
                    }
                }

                _ = ticker.tick() => {
                    for path in self.debouncer.take_ready(Instant::now().into_std()) {
                        self.process_modification(&path);
                    }
                }
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        let Some(kind) = classify(&event.kind) else {
            crate::debug_event!("watcher", "ignored", "{:?}", event.kind);
            return;
        };

        for path in event.paths {
            match kind {
                PathEventKind::Modified => self.debouncer.record(path, std::time::Instant::now()),
                PathEventKind::Deleted => {
                    self.debouncer.cancel(&path);
                    self.hub.dispatch(&path, kind);
                }
                PathEventKind::Created => {
                    self.hub.dispatch(&path, kind);
                }
            }
        }
    }

    fn process_modification(&self, path: &Path) {
        // A rename away can surface as a plain modify on some platforms.
        if !path.exists() {
            self.hub.dispatch(path, PathEventKind::Deleted);
            return;
        }
        self.hub.dispatch(path, PathEventKind::Modified);
    }
}

/// Map a `notify` event kind onto the three kinds listeners understand.
fn classify(kind: &EventKind) -> Option<PathEventKind> {
    match kind {
        EventKind::Create(_) => Some(PathEventKind::Created),
        EventKind::Remove(_) => Some(PathEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(PathEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(PathEventKind::Created),
        EventKind::Modify(_) => Some(PathEventKind::Modified),
        _ => None,
    }
}

/// Builder for [`FsWatcher`].
pub struct FsWatcherBuilder {
    debounce_ms: u64,
    backlog_warning: usize,
    tick_ms: u64,
}

impl FsWatcherBuilder {
    pub fn new() -> Self {
        Self {
            debounce_ms: 500,
            backlog_warning: 100,
            tick_ms: 100,
        }
    }

    /// Quiet period before a modify event is delivered.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Queued event count at which a backlog warning is logged.
    pub fn backlog_warning(mut self, events: usize) -> Self {
        self.backlog_warning = events.max(1);
        self
    }

    /// How often the debouncer is polled.
    pub fn tick_ms(mut self, ms: u64) -> Self {
        self.tick_ms = ms.max(1);
        self
    }

    pub fn build(self) -> Result<FsWatcher, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Only fails once `run` has returned and dropped the receiver.
            let _ = tx.send(res);
        })?;

        Ok(FsWatcher {
            hub: Arc::new(WatchHub::with_notifier(watcher)),
            debouncer: Debouncer::new(self.debounce_ms),
            event_rx: rx,
            tick: Duration::from_millis(self.tick_ms),
            backlog_warning: self.backlog_warning,
        })
    }
}

impl Default for FsWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
