//! Bounded polling waits.
//!
//! The [`Waiter`] is the synchronization engine of the crate: it evaluates a
//! probe repeatedly at a fixed interval until the probe yields a value or the
//! timeout elapses. All waits are bounded; nothing in this module blocks
//! unconditionally.
//!
//! Soft versus hard handling of a timeout is decided at the call site, not
//! here: page construction may log and continue
//! ([`crate::page::LoadPolicy::Suppress`]), while waits that gate a mutating
//! action fail loudly with a typed error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::result::{EsperarError, EsperarResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default polling interval for profiles without an explicit one (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Smallest accepted polling interval; [`WaitSpec`] clamps below this
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Page-load profile: timeout (30 seconds)
pub const PAGE_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Page-load profile: polling interval (2 seconds)
pub const PAGE_LOAD_POLL_MS: u64 = 2_000;

/// Element-visible profile: timeout (10 seconds)
pub const ELEMENT_VISIBLE_TIMEOUT_MS: u64 = 10_000;

/// Indexing-settle profile: timeout (40 seconds)
pub const INDEXING_TIMEOUT_MS: u64 = 40_000;

/// Indexing-settle profile: polling interval (5 seconds)
pub const INDEXING_POLL_MS: u64 = 5_000;

/// Script-readiness profile: timeout (30 seconds)
pub const SCRIPT_READY_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// WAIT SPEC
// =============================================================================

/// A (timeout, polling interval) pair for one bounded wait
///
/// The interval is clamped to [`MIN_POLL_INTERVAL_MS`] so a wait can never
/// poll with a non-positive spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSpec {
    timeout_ms: u64,
    poll_interval_ms: u64,
}

impl WaitSpec {
    /// Create a wait spec
    #[must_use]
    pub const fn new(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms: if poll_interval_ms < MIN_POLL_INTERVAL_MS {
                MIN_POLL_INTERVAL_MS
            } else {
                poll_interval_ms
            },
        }
    }

    /// Override the timeout
    #[must_use]
    pub const fn with_timeout(self, timeout_ms: u64) -> Self {
        Self::new(timeout_ms, self.poll_interval_ms)
    }

    /// Override the polling interval
    #[must_use]
    pub const fn with_poll_interval(self, poll_interval_ms: u64) -> Self {
        Self::new(self.timeout_ms, poll_interval_ms)
    }

    /// Timeout in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Polling interval in milliseconds
    #[must_use]
    pub const fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Polling interval as a [`Duration`]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT PROFILES
// =============================================================================

/// The calibrated wait profiles used across the crate
///
/// Every profile is externally overridable; scenarios running against a fake
/// driver shorten these to keep test wall-clock time down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitProfiles {
    /// Page-load condition after navigation (soft by default)
    pub page_load: WaitSpec,
    /// Element visibility immediately before a mutating action (hard)
    pub element_visible: WaitSpec,
    /// Backend indexing/spinner settle; its probe refreshes the page each poll
    pub indexing: WaitSpec,
    /// Script-based readiness (e.g. pending-request counters reaching zero)
    pub script_ready: WaitSpec,
}

impl Default for WaitProfiles {
    fn default() -> Self {
        Self {
            page_load: WaitSpec::new(PAGE_LOAD_TIMEOUT_MS, PAGE_LOAD_POLL_MS),
            element_visible: WaitSpec::new(ELEMENT_VISIBLE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS),
            indexing: WaitSpec::new(INDEXING_TIMEOUT_MS, INDEXING_POLL_MS),
            script_ready: WaitSpec::new(SCRIPT_READY_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitProfiles {
    /// Create the default profiles
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the page-load profile
    #[must_use]
    pub const fn with_page_load(mut self, spec: WaitSpec) -> Self {
        self.page_load = spec;
        self
    }

    /// Override the element-visible profile
    #[must_use]
    pub const fn with_element_visible(mut self, spec: WaitSpec) -> Self {
        self.element_visible = spec;
        self
    }

    /// Override the indexing profile
    #[must_use]
    pub const fn with_indexing(mut self, spec: WaitSpec) -> Self {
        self.indexing = spec;
        self
    }

    /// Override the script-readiness profile
    #[must_use]
    pub const fn with_script_ready(mut self, spec: WaitSpec) -> Self {
        self.script_ready = spec;
        self
    }

    /// Uniformly short profiles for unit tests against a fake driver
    #[must_use]
    pub const fn short(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        let spec = WaitSpec::new(timeout_ms, poll_interval_ms);
        Self {
            page_load: spec,
            element_visible: spec,
            indexing: spec,
            script_ready: spec,
        }
    }
}

// =============================================================================
// CANCELLATION
// =============================================================================

/// Cooperative cancellation flag for a blocking wait
///
/// Cloning shares the flag; a token cancelled from anywhere cancels every
/// wait observing it. Cancellation is checked once per poll, so it takes
/// effect within one polling interval.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Bounded polling engine
///
/// `wait_until` blocks the calling flow of control; the scheduling model is
/// single-threaded and synchronous per scenario.
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter;

impl Waiter {
    /// Create a waiter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Poll `probe` until it yields a value or `spec` times out
    ///
    /// The probe runs immediately, then once per polling interval. The first
    /// `Some` wins and is returned as-is; on exhaustion the result is
    /// [`EsperarError::WaitTimedOut`]. Total blocking time is bounded by the
    /// timeout plus one interval.
    pub fn wait_until<T, F>(&self, spec: &WaitSpec, waiting_for: &str, probe: F) -> EsperarResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        self.poll(spec, None, waiting_for, probe)
    }

    /// Like [`Waiter::wait_until`], but abortable through a [`CancelToken`]
    pub fn wait_until_cancelled<T, F>(
        &self,
        spec: &WaitSpec,
        token: &CancelToken,
        waiting_for: &str,
        probe: F,
    ) -> EsperarResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        self.poll(spec, Some(token), waiting_for, probe)
    }

    fn poll<T, F>(
        &self,
        spec: &WaitSpec,
        token: Option<&CancelToken>,
        waiting_for: &str,
        mut probe: F,
    ) -> EsperarResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        let start = Instant::now();
        let timeout = spec.timeout();
        let interval = spec.poll_interval();

        loop {
            if let Some(token) = token {
                if token.is_cancelled() {
                    tracing::debug!(waiting_for, "wait cancelled");
                    return Err(EsperarError::WaitCancelled {
                        waiting_for: waiting_for.to_string(),
                    });
                }
            }

            if let Some(value) = probe() {
                tracing::trace!(
                    waiting_for,
                    elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "wait satisfied"
                );
                return Ok(value);
            }

            if start.elapsed() >= timeout {
                break;
            }
            std::thread::sleep(interval);
        }

        tracing::debug!(waiting_for, timeout_ms = spec.timeout_ms(), "wait timed out");
        Err(EsperarError::WaitTimedOut {
            ms: spec.timeout_ms(),
            waiting_for: waiting_for.to_string(),
        })
    }
}
