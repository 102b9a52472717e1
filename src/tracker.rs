use crate::config::{Settings, MIN_SLEEP};
use crate::io::InputSource;
use crate::pipeline::{Pipeline, Shared};
use crate::types::{Snapshot, TrackOptions};
use crate::{Result, TrackError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Handle to a running tracker loop.
///
/// A single background thread pulls one raw sample per period, runs the
/// pipeline and sleeps for the rest of the period. Dropping the handle stops
/// the loop the same way [`Tracker::stop`] does.
pub struct Tracker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<Result<Pipeline>>>,
}

impl Tracker {
    /// Start the tracker thread.
    ///
    /// `settings.options`, when set, replaces the toggles the pipeline
    /// carried; otherwise those are kept.
    pub fn start<S>(pipeline: Pipeline, source: S, settings: Settings) -> Result<Tracker>
    where
        S: InputSource + 'static,
    {
        let shared = pipeline.shared().clone();
        if let Some(options) = settings.options {
            shared.set_options(options);
        }
        shared.reset_quit();
        let period = settings.period;

        let thread = std::thread::Builder::new()
            .name("trackcore-logic".into())
            .spawn(move || run_loop(pipeline, source, period))
            .map_err(|e| TrackError::Spawn(e.to_string()))?;

        Ok(Tracker {
            shared,
            thread: Some(thread),
        })
    }

    /// Re-reference the output to the pose seen on the next cycle.
    pub fn request_center(&self) {
        self.shared.request_center();
    }

    /// When disabled, new raw samples are ignored and the last one is held.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.is_enabled()
    }

    pub fn options(&self) -> TrackOptions {
        self.shared.options()
    }

    pub fn set_options(&self, options: TrackOptions) {
        self.shared.set_options(options);
    }

    /// Latest mapped and raw poses.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot()
    }

    /// Check if the loop thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for its shutdown pass.
    ///
    /// Returns the pipeline (with deactivated curves) on a clean exit, or the
    /// collaborator fault that ended the loop early.
    pub fn stop(mut self) -> Result<Pipeline> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<Pipeline> {
        self.shared.request_quit();
        let thread = self.thread.take().ok_or(TrackError::Disconnected)?;
        thread.join().map_err(|_| TrackError::WorkerPanicked)?
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if self.thread.is_some() {
            if let Err(e) = self.shutdown() {
                log::warn!("Tracker stopped with error: {}", e);
            }
        }
    }
}

fn run_loop<S: InputSource>(
    mut pipeline: Pipeline,
    mut source: S,
    period: Duration,
) -> Result<Pipeline> {
    let shared = pipeline.shared().clone();
    let _timer = TimerResolution::acquire();

    log::info!("Tracker loop started (period {:?})", period);

    while !shared.should_quit() {
        let start = Instant::now();

        if let Err(e) = source.sample().and_then(|raw| pipeline.logic(&raw)) {
            log::error!("Tracker loop aborted: {}", e);
            pipeline.deactivate_curves();
            return Err(e);
        }

        let sleep = period.saturating_sub(start.elapsed()).max(MIN_SLEEP);
        std::thread::sleep(sleep);
    }

    log::info!("Tracker loop stopping, publishing neutral pose");
    pipeline.shutdown()?;
    Ok(pipeline)
}

/// Best-effort 1 ms host timer resolution for the lifetime of the loop.
#[cfg(windows)]
struct TimerResolution {
    active: bool,
}

#[cfg(windows)]
#[link(name = "winmm")]
extern "system" {
    fn timeBeginPeriod(u_period: u32) -> u32;
    fn timeEndPeriod(u_period: u32) -> u32;
}

#[cfg(windows)]
impl TimerResolution {
    fn acquire() -> TimerResolution {
        // TIMERR_NOERROR == 0
        let rc = unsafe { timeBeginPeriod(1) };
        if rc != 0 {
            log::warn!("timeBeginPeriod(1) failed ({}), keeping default timer resolution", rc);
        }
        TimerResolution { active: rc == 0 }
    }
}

#[cfg(windows)]
impl Drop for TimerResolution {
    fn drop(&mut self) {
        if self.active {
            unsafe {
                timeEndPeriod(1);
            }
        }
    }
}

#[cfg(not(windows))]
struct TimerResolution;

#[cfg(not(windows))]
impl TimerResolution {
    fn acquire() -> TimerResolution {
        TimerResolution
    }
}
