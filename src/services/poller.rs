use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Notify};

use super::detector::is_new;
use super::formatter::MessageFormatter;
use crate::document::{Document, DocumentKind};
use crate::domain::{ChangeKey, ContentRecord, Notification, SourceDescriptor};
use crate::errors::{HeraldError, HeraldResult};
use crate::fetch::Fetcher;
use crate::sinks::DeliverySink;
use crate::strategies::{DetailSource, ExtractionStrategy};

/// Lifecycle of a poller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerPhase {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl PollerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollerPhase::Idle => "idle",
            PollerPhase::Running => "running",
            PollerPhase::Paused => "paused",
            PollerPhase::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PollerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Latest item matches what was last delivered.
    Unchanged,
    Delivered(ChangeKey),
    /// The sink refused; the key was not advanced.
    DeliveryFailed,
    /// Fetch, parse or extraction failed; nothing changed.
    Failed,
}

/// Snapshot for the operator status listing.
#[derive(Debug, Clone, Serialize)]
pub struct PollerStatus {
    pub name: String,
    pub label: String,
    pub emoji: Option<String>,
    pub running: bool,
    pub phase: PollerPhase,
    pub last_key: Option<String>,
    pub last_title: Option<String>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl fmt::Display for PollerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {} {} [{}] {} ({})",
            self.emoji.as_deref().unwrap_or("📰"),
            self.label,
            self.name,
            if self.running { "on" } else { "off" },
            self.phase
        )?;
        if let Some(title) = &self.last_title {
            write!(f, "\n    Last posted: {}", title)?;
        }
        if let Some(key) = &self.last_key {
            write!(f, "\n    Last item: {}", key)?;
        }
        if let Some(at) = self.last_cycle_at {
            write!(f, "\n    Last checked: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PollerState {
    last_key: ChangeKey,
    last_delivered: Option<Notification>,
    last_cycle_at: Option<DateTime<Utc>>,
}

/// Result of inspecting the listing document.
enum Listing {
    Unchanged,
    New {
        key: ChangeKey,
        /// Present when the listing already held the whole item.
        record: Option<ContentRecord>,
        detail: DetailSource,
    },
}

/// Runs one source's fetch, detect, extract, format, deliver cycle on its interval.
pub struct Poller {
    source: Arc<SourceDescriptor>,
    strategy: Arc<dyn ExtractionStrategy>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DeliverySink>,
    formatter: MessageFormatter,
    running: AtomicBool,
    started: AtomicBool,
    stopped: AtomicBool,
    resume: Notify,
    state: Mutex<PollerState>,
}

impl Poller {
    pub fn new(
        source: SourceDescriptor,
        strategy: Arc<dyn ExtractionStrategy>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DeliverySink>,
    ) -> HeraldResult<Self> {
        source.validate()?;

        Ok(Self {
            source: Arc::new(source),
            strategy,
            fetcher,
            sink,
            formatter: MessageFormatter::new(),
            running: AtomicBool::new(true),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            resume: Notify::new(),
            state: Mutex::new(PollerState::default()),
        })
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    fn state(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> PollerPhase {
        if self.stopped.load(Ordering::SeqCst) {
            PollerPhase::Stopped
        } else if !self.started.load(Ordering::SeqCst) {
            PollerPhase::Idle
        } else if self.is_running() {
            PollerPhase::Running
        } else {
            PollerPhase::Paused
        }
    }

    /// Set the run flag, waking a paused loop when it turns on. Returns the new state.
    pub fn set_running(&self, running: bool) -> bool {
        let was_running = self.running.swap(running, Ordering::SeqCst);
        if running && !was_running {
            self.resume.notify_waiters();
        }
        running
    }

    /// Flip the run flag. Returns the new state.
    pub fn toggle(&self) -> bool {
        let running = !self.running.fetch_xor(true, Ordering::SeqCst);
        if running {
            self.resume.notify_waiters();
        }
        tracing::info!(source = %self.source.name, running, "poller toggled");
        running
    }

    pub fn last_key(&self) -> ChangeKey {
        self.state().last_key.clone()
    }

    pub fn last_delivered(&self) -> Option<Notification> {
        self.state().last_delivered.clone()
    }

    pub fn status(&self) -> PollerStatus {
        let state = self.state();
        PollerStatus {
            name: self.source.name.clone(),
            label: self.source.label.clone(),
            emoji: self.source.emoji.clone(),
            running: self.is_running(),
            phase: self.phase(),
            last_key: Some(state.last_key.to_string()).filter(|k| !k.is_empty()),
            last_title: state.last_delivered.as_ref().map(|n| n.title.clone()),
            last_cycle_at: state.last_cycle_at,
        }
    }

    /// Run one cycle, logging any failure
    pub async fn run_cycle(&self) -> CycleOutcome {
        let outcome = match self.try_cycle().await {
            Ok(outcome) => outcome,
            Err(e) => {
                e.log(&self.source.name);
                match e {
                    HeraldError::Delivery(_) => CycleOutcome::DeliveryFailed,
                    _ => CycleOutcome::Failed,
                }
            }
        };

        self.state().last_cycle_at = Some(Utc::now());
        outcome
    }

    async fn try_cycle(&self) -> HeraldResult<CycleOutcome> {
        let bytes = self.fetcher.fetch(&self.source.url).await?;
        let last = self.last_key();

        let (key, record) = match self.inspect_listing(&bytes, &last)? {
            Listing::Unchanged => {
                tracing::debug!(source = %self.source.name, key = %last, "no new content");
                return Ok(CycleOutcome::Unchanged);
            }
            Listing::New {
                key,
                record: Some(record),
                ..
            } => (key, record),
            Listing::New {
                key,
                record: None,
                detail,
            } => {
                let record = self.fetch_detail(&key, detail).await?;
                (key, record)
            }
        };

        let notification = self.formatter.format(&record, &self.source);
        self.sink.deliver(&notification).await?;

        tracing::info!(
            source = %self.source.name,
            key = %key,
            title = %notification.title,
            "delivered new content"
        );

        let mut state = self.state();
        state.last_key = key.clone();
        state.last_delivered = Some(notification);
        Ok(CycleOutcome::Delivered(key))
    }

    /// Parse the listing and decide whether it carries something new.
    ///
    /// Documents do not cross an await, so parsing and navigation stay in here.
    fn inspect_listing(&self, bytes: &[u8], last: &ChangeKey) -> HeraldResult<Listing> {
        let doc = Document::parse(bytes, self.strategy.listing_kind())?;

        let key = self
            .strategy
            .find_latest(&doc, &self.source)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| HeraldError::NotFound(format!("no latest item at {}", self.source.url)))?;

        if !is_new(&key, last) {
            return Ok(Listing::Unchanged);
        }

        let detail = self.strategy.detail_source(&key, &self.source);
        let record = match detail {
            DetailSource::SameDocument => Some(self.extract(&doc, &key)?),
            DetailSource::Fetch { .. } => None,
        };

        Ok(Listing::New { key, record, detail })
    }

    async fn fetch_detail(&self, key: &ChangeKey, detail: DetailSource) -> HeraldResult<ContentRecord> {
        let (url, kind) = match detail {
            DetailSource::Fetch { url, kind } => (url, kind),
            DetailSource::SameDocument => (self.source.url.clone(), self.strategy.listing_kind()),
        };

        let bytes = self.fetcher.fetch(&url).await?;
        self.extract_from(&bytes, kind, key)
    }

    fn extract_from(&self, bytes: &[u8], kind: DocumentKind, key: &ChangeKey) -> HeraldResult<ContentRecord> {
        let doc = Document::parse(bytes, kind)?;
        self.extract(&doc, key)
    }

    fn extract(&self, doc: &Document, key: &ChangeKey) -> HeraldResult<ContentRecord> {
        self.strategy
            .extract(doc, key, &self.source)
            .ok_or_else(|| HeraldError::NotFound(format!("no content for {}", key)))
    }

    /// Poll until shutdown is signalled.
    ///
    /// While paused no fetch is scheduled; turning the flag back on wakes the
    /// loop at once instead of waiting out the interval. Only a parked loop is
    /// woken: toggling while a cycle or sleep is in progress leaves the
    /// schedule alone.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        self.started.store(true, Ordering::SeqCst);
        tracing::info!(
            source = %self.source.name,
            strategy = self.strategy.name(),
            interval_secs = self.source.interval.as_secs(),
            "poller started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            if !self.is_running() {
                // Register before re-checking the flag so a resume in between is not lost
                let resumed = self.resume.notified();
                tokio::pin!(resumed);
                resumed.as_mut().enable();

                if !self.is_running() {
                    tokio::select! {
                        _ = &mut resumed => {}
                        _ = shutdown.changed() => break,
                    }
                }
                continue;
            }

            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.source.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.mark_stopped();
        tracing::info!(source = %self.source.name, "poller stopped");
    }

    /// Final phase; a stopped poller never runs again.
    pub(crate) fn mark_stopped(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
