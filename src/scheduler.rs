//! Frame-rate limited auto-rendering.
//!
//! State changes made through [`Handle::update`](crate::Handle::update) are not rendered
//! right away. The changed component is recorded in a pending set together with the
//! state it had before the change, and the auto-renderer re-renders every pending
//! component on the next allowed frame.
//!
//! The pending set and the renderer's frame driver live in thread-local slots, since
//! host documents are single-threaded. Only one renderer may run per process: a second
//! [`initialize`] fails with [`Error::AlreadyInitialized`] whichever thread calls it.

use alloc::{boxed::Box, vec::Vec};
use core::{
    cell::RefCell,
    sync::atomic::{AtomicBool, Ordering},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    Error,
    attachment::State,
    host::{Dom, FrameDriver, FrameId},
    node::{Node, NodeId},
};

/// Lowest accepted render rate, in renders per second.
pub const MIN_RATE: u32 = 20;
/// Highest accepted render rate, in renders per second.
pub const MAX_RATE: u32 = 100;
/// Render rate used when none is given.
pub const DEFAULT_RATE: u32 = 30;

/// Something the flush loop can re-render.
pub(crate) trait Rerender {
    fn rerender(&self) -> Result<(), Error>;
}

struct Pending {
    target: Box<dyn Rerender>,
    baseline: State,
}

static RUNNING: AtomicBool = AtomicBool::new(false);

thread_local! {
    static PENDING: RefCell<IndexMap<NodeId, Pending>> = RefCell::new(IndexMap::new());
    static RENDERER: RefCell<Option<AutoRenderer>> = const { RefCell::new(None) };
}

/// Records a state change of `node` from `prior` to `current`.
pub(crate) fn track<D: Dom>(node: &Node<D>, prior: State, current: &State, recycle: bool) {
    if prior == *current {
        return;
    }
    let id = node.id();
    PENDING.with(|pending| {
        let mut pending = pending.borrow_mut();
        let reverted = pending
            .get(&id)
            .is_some_and(|entry| entry.baseline == *current);
        if reverted {
            pending.shift_remove(&id);
            debug!(node = ?id, "pending render cancelled");
        } else if recycle {
            pending.insert(
                id,
                Pending {
                    target: Box::new(node.clone()),
                    baseline: prior,
                },
            );
        }
    });
}

pub(crate) fn is_pending(id: NodeId) -> bool {
    PENDING.with(|pending| pending.borrow().contains_key(&id))
}

/// Number of components waiting for the next flush on this thread.
#[must_use]
pub fn pending_count() -> usize {
    PENDING.with(|pending| pending.borrow().len())
}

/// Re-renders every component that is pending when the call starts, in the order they
/// were first queued, and returns how many were processed.
///
/// Each entry is removed before its component re-renders, so updates made while
/// re-rendering are queued for the next flush.
///
/// # Errors
///
/// The first failing re-render aborts the flush and is returned. Entries not yet
/// processed stay pending.
pub fn flush() -> Result<usize, Error> {
    let snapshot: Vec<NodeId> =
        PENDING.with(|pending| pending.borrow().keys().copied().collect());
    let mut processed = 0;
    for id in snapshot {
        let Some(entry) = PENDING.with(|pending| pending.borrow_mut().shift_remove(&id)) else {
            continue;
        };
        entry.target.rerender()?;
        processed += 1;
    }
    if processed > 0 {
        debug!(processed, "flushed pending renders");
    }
    Ok(processed)
}

fn interval_of(rate: u32) -> Result<f64, Error> {
    if !(MIN_RATE..=MAX_RATE).contains(&rate) {
        return Err(Error::InvalidRate(rate));
    }
    Ok(1000.0 / f64::from(rate))
}

struct AutoRenderer {
    driver: Box<dyn FrameDriver>,
    interval: f64,
    timestamp: f64,
    frame: Option<FrameId>,
}

impl AutoRenderer {
    // Returns `true` when enough time passed since the last flush.
    fn advance(&mut self) -> bool {
        let now = self.driver.now();
        let elapsed = now - self.timestamp;
        if elapsed > self.interval {
            self.timestamp = now - elapsed % self.interval;
            true
        } else {
            false
        }
    }
}

/// Starts the auto-renderer on this thread.
///
/// `rate` is the highest number of flushes per second and defaults to 30. The first
/// frame is scheduled right away.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] when a renderer is running on any thread,
/// [`Error::InvalidRate`] when `rate` is outside `20..=100`, and driver errors raised
/// while scheduling the first frame. The renderer is left stopped on error.
pub fn initialize(driver: impl FrameDriver, rate: Option<u32>) -> Result<(), Error> {
    let rate = rate.unwrap_or(DEFAULT_RATE);
    let interval = interval_of(rate)?;
    if RUNNING
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(Error::AlreadyInitialized);
    }
    let timestamp = driver.now();
    RENDERER.with(|slot| {
        *slot.borrow_mut() = Some(AutoRenderer {
            driver: Box::new(driver),
            interval,
            timestamp,
            frame: None,
        });
    });
    info!(rate, "auto-renderer initialized");
    if let Err(error) = frame() {
        let renderer = RENDERER.with(|slot| slot.borrow_mut().take());
        RUNNING.store(false, Ordering::Release);
        if let Some(AutoRenderer {
            driver,
            frame: Some(id),
            ..
        }) = renderer
        {
            driver.cancel_frame(id)?;
        }
        return Err(error);
    }
    Ok(())
}

/// Changes the render rate.
///
/// A running renderer switches to the new interval and restarts its timing window. A
/// stopped renderer is unaffected; [`initialize`] takes its own rate.
///
/// # Errors
///
/// Returns [`Error::InvalidRate`] when `rate` is outside `20..=100`.
pub fn interval(rate: u32) -> Result<(), Error> {
    let interval = interval_of(rate)?;
    RENDERER.with(|slot| {
        if let Some(renderer) = slot.borrow_mut().as_mut() {
            renderer.interval = interval;
            renderer.timestamp = renderer.driver.now();
            debug!(rate, "render rate changed");
        }
    });
    Ok(())
}

/// Stops the auto-renderer without flushing. Pending updates keep accumulating until
/// the renderer is started again or [`flush`] is called.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] when no renderer was started on this thread, and
/// driver errors raised while cancelling the scheduled frame.
pub fn terminate() -> Result<(), Error> {
    let renderer = RENDERER
        .with(|slot| slot.borrow_mut().take())
        .ok_or(Error::NotInitialized)?;
    RUNNING.store(false, Ordering::Release);
    if let Some(frame) = renderer.frame {
        renderer.driver.cancel_frame(frame)?;
    }
    info!("auto-renderer terminated");
    Ok(())
}

/// Returns `true` while an auto-renderer runs on any thread.
#[must_use]
pub fn is_running() -> bool {
    RUNNING.load(Ordering::Acquire)
}

fn frame() -> Result<(), Error> {
    let due = RENDERER.with(|slot| -> Result<bool, Error> {
        let mut slot = slot.borrow_mut();
        let Some(renderer) = slot.as_mut() else {
            return Ok(false);
        };
        renderer.frame = Some(renderer.driver.request_frame(Box::new(on_frame))?);
        Ok(renderer.advance())
    })?;
    if due {
        flush()?;
    }
    Ok(())
}

// Frame callbacks have no caller to return errors to.
fn on_frame() {
    if let Err(error) = frame() {
        error!(%error, "auto-render frame failed");
    }
}

/// Auto-renderer settings, deserializable from configuration files.
///
/// ```
/// use jsx_dom::RendererSettings;
///
/// let settings: RendererSettings = serde_json::from_str(r#"{ "rate": 60 }"#).unwrap();
/// assert_eq!(settings.rate, 60);
/// let defaults: RendererSettings = serde_json::from_str("{}").unwrap();
/// assert_eq!(defaults.rate, 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Highest number of flushes per second, within `20..=100`.
    pub rate: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self { rate: DEFAULT_RATE }
    }
}

impl RendererSettings {
    /// Settings with the given rate.
    #[must_use]
    pub const fn with_rate(rate: u32) -> Self {
        Self { rate }
    }

    /// Flush interval in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRate`] when the rate is out of range.
    pub fn interval(&self) -> Result<f64, Error> {
        interval_of(self.rate)
    }

    /// Starts the auto-renderer with these settings.
    ///
    /// # Errors
    ///
    /// See [`initialize`].
    pub fn initialize(&self, driver: impl FrameDriver) -> Result<(), Error> {
        initialize(driver, Some(self.rate))
    }
}
