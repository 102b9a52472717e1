//! C FFI layer for trackcore.
//!
//! Provides an opaque handle-based API for C/C++ hosts. The input source and
//! output protocol are supplied as callbacks sharing one user pointer.
//! The generated C header is written to `include/trackcore.h` by cbindgen.

use crate::config::Settings;
use crate::error::LastError;
use crate::io::{InputSource, Protocol};
use crate::mapping::{AxisOptions, Mappings};
use crate::pipeline::Pipeline;
use crate::tracker::Tracker;
use crate::types::{Axis, Pose, TrackOptions, DOF};
use crate::{Result, TrackError};
use std::ffi::{c_char, c_int, c_void};
use std::time::Duration;

/// Last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Fills `out[0..6]` with a raw sample. Returns 0 on success; anything else
/// stops the tracker.
pub type TcSourceFn = extern "C" fn(user: *mut c_void, out: *mut f64) -> c_int;

/// Receives the 6 transformed components. Returns 0 on success; anything
/// else stops the tracker.
pub type TcProtocolFn = extern "C" fn(user: *mut c_void, pose: *const f64) -> c_int;

/// Opaque tracker handle for C consumers.
pub struct TcTracker(Tracker);

/// Per-axis options in C-compatible layout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TcAxisConfig {
    pub invert: bool,
    pub altp: bool,
    /// Source slot 0..5; any other value disables the output.
    pub src: c_int,
    pub zero: f64,
}

/// Snapshot in C-compatible layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TcSnapshot {
    /// [x, y, z, yaw, pitch, roll] as handed to the protocol.
    pub mapped: [f64; 6],
    /// Raw accumulator for the same cycle.
    pub raw: [f64; 6],
}

impl From<TcAxisConfig> for AxisOptions {
    fn from(c: TcAxisConfig) -> AxisOptions {
        AxisOptions {
            invert: c.invert,
            altp: c.altp,
            src: usize::try_from(c.src).ok(),
            zero: c.zero,
        }
    }
}

struct UserData(*mut c_void);

// The host promises the user pointer may be used from the tracker thread.
unsafe impl Send for UserData {}

struct CallbackSource {
    func: TcSourceFn,
    user: UserData,
}

impl InputSource for CallbackSource {
    fn sample(&mut self) -> Result<[f64; DOF]> {
        let mut out = [0.0; DOF];
        let rc = (self.func)(self.user.0, out.as_mut_ptr());
        if rc != 0 {
            return Err(TrackError::Source(format!("source callback returned {}", rc)));
        }
        Ok(out)
    }
}

struct CallbackProtocol {
    func: TcProtocolFn,
    user: UserData,
}

impl Protocol for CallbackProtocol {
    fn pose(&mut self, pose: &Pose) -> Result<()> {
        let rc = (self.func)(self.user.0, pose.as_array().as_ptr());
        if rc != 0 {
            return Err(TrackError::Protocol(format!(
                "protocol callback returned {}",
                rc
            )));
        }
        Ok(())
    }
}

/// Start a tracker with identity response curves.
///
/// `axes` points to 6 axis configs in [x, y, z, yaw, pitch, roll] order, or
/// is null for pass-through. `options` is a `TrackOptions` bitmap.
/// `period_ms` of 0 selects the default period. Returns NULL on error
/// (check tc_last_error()).
///
/// # Safety
/// `axes` must point to at least 6 `TcAxisConfig` elements, or be null.
/// `user` must stay valid, and be usable from another thread, until
/// `tc_tracker_stop` returns.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_start(
    axes: *const TcAxisConfig,
    options: u32,
    period_ms: u32,
    source: Option<TcSourceFn>,
    protocol: Option<TcProtocolFn>,
    user: *mut c_void,
) -> *mut TcTracker {
    let Some(source) = source else {
        LAST_ERROR.set(&TrackError::InvalidConfig("source callback is null".into()));
        return std::ptr::null_mut();
    };

    let mut mappings = Mappings::identity();
    if !axes.is_null() {
        let configs = std::slice::from_raw_parts(axes, DOF);
        for (axis, config) in Axis::ALL.iter().zip(configs) {
            mappings.axis_mut(*axis).opts = AxisOptions::from(*config);
        }
    }

    let mut pipeline = Pipeline::new(mappings);
    if let Some(func) = protocol {
        pipeline = pipeline.with_protocol(CallbackProtocol {
            func,
            user: UserData(user),
        });
    }

    let mut settings = Settings::default().with_options(TrackOptions::from_bits_truncate(options));
    if period_ms > 0 {
        settings = settings.with_period(Duration::from_millis(period_ms as u64));
    }

    let source = CallbackSource {
        func: source,
        user: UserData(user),
    };

    match Tracker::start(pipeline, source, settings) {
        Ok(tracker) => Box::into_raw(Box::new(TcTracker(tracker))),
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Center on the pose seen at the next cycle.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_request_center(tracker: *const TcTracker) {
    if let Some(tracker) = tracker.as_ref() {
        tracker.0.request_center();
    }
}

/// Enable or freeze intake of new raw samples.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_set_enabled(tracker: *const TcTracker, enabled: bool) {
    if let Some(tracker) = tracker.as_ref() {
        tracker.0.set_enabled(enabled);
    }
}

/// Change the `TrackOptions` bitmap while running.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_set_options(tracker: *const TcTracker, options: u32) {
    if let Some(tracker) = tracker.as_ref() {
        tracker.0.set_options(TrackOptions::from_bits_truncate(options));
    }
}

/// Copy the latest snapshot. Returns 0 on success, -1 on null arguments.
///
/// # Safety
/// `tracker` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_get_snapshot(
    tracker: *const TcTracker,
    out: *mut TcSnapshot,
) -> c_int {
    if tracker.is_null() || out.is_null() {
        return -1;
    }
    let snapshot = (*tracker).0.snapshot();
    out.write(TcSnapshot {
        mapped: snapshot.mapped.0,
        raw: snapshot.raw.0,
    });
    0
}

/// Check if the tracker thread is still running.
///
/// # Safety
/// `tracker` must be a valid tracker pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_is_running(tracker: *const TcTracker) -> bool {
    match tracker.as_ref() {
        Some(tracker) => tracker.0.is_running(),
        None => false,
    }
}

/// Stop the tracker, wait for its shutdown pass and free the handle.
/// Returns 0 on a clean stop, -1 if the loop had ended with an error.
///
/// # Safety
/// `tracker` must be a pointer returned by `tc_tracker_start`, or null.
#[no_mangle]
pub unsafe extern "C" fn tc_tracker_stop(tracker: *mut TcTracker) -> c_int {
    if tracker.is_null() {
        return 0;
    }
    let tracker = Box::from_raw(tracker);
    match tracker.0.stop() {
        Ok(_) => 0,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next trackcore API call.
#[no_mangle]
pub extern "C" fn tc_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    extern "C" fn ten_x(_user: *mut c_void, out: *mut f64) -> c_int {
        let sample = [10.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        unsafe { std::ptr::copy_nonoverlapping(sample.as_ptr(), out, DOF) };
        0
    }

    extern "C" fn failing(_user: *mut c_void, _out: *mut f64) -> c_int {
        7
    }

    extern "C" fn count(user: *mut c_void, _pose: *const f64) -> c_int {
        let counter = unsafe { &*(user as *const AtomicUsize) };
        counter.fetch_add(1, Ordering::Relaxed);
        0
    }

    #[test]
    fn test_axis_config_conversion() {
        let opts = AxisOptions::from(TcAxisConfig {
            invert: true,
            altp: false,
            src: -1,
            zero: 0.5,
        });
        assert!(opts.invert);
        assert_eq!(opts.src, None);
        assert_eq!(opts.zero, 0.5);
    }

    #[test]
    fn test_null_source_rejected() {
        let t = unsafe {
            tc_tracker_start(std::ptr::null(), 0, 0, None, None, std::ptr::null_mut())
        };
        assert!(t.is_null());
        assert!(!tc_last_error().is_null());
    }

    #[test]
    fn test_start_snapshot_stop() {
        static PUBLISHED: AtomicUsize = AtomicUsize::new(0);
        let mut axes = [TcAxisConfig {
            invert: false,
            altp: false,
            src: 0,
            zero: 0.0,
        }; DOF];
        for (i, a) in axes.iter_mut().enumerate() {
            a.src = i as c_int;
        }
        axes[0].invert = true;

        let user = &PUBLISHED as *const AtomicUsize as *mut c_void;
        let t = unsafe { tc_tracker_start(axes.as_ptr(), 0, 0, Some(ten_x), Some(count), user) };
        assert!(!t.is_null());

        let mut snap = TcSnapshot::default();
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            assert_eq!(unsafe { tc_tracker_get_snapshot(t, &mut snap) }, 0);
            if snap.raw[0] == 10.0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(snap.raw[0], 10.0);
        assert!((snap.mapped[0] + 10.0).abs() < 1e-9);
        assert!(unsafe { tc_tracker_is_running(t) });

        assert_eq!(unsafe { tc_tracker_stop(t) }, 0);
        assert!(PUBLISHED.load(Ordering::Relaxed) >= 2);
    }

    #[test]
    fn test_failing_source_reports_error() {
        let t = unsafe {
            tc_tracker_start(std::ptr::null(), 0, 0, Some(failing), None, std::ptr::null_mut())
        };
        assert!(!t.is_null());
        let deadline = Instant::now() + Duration::from_secs(2);
        while unsafe { tc_tracker_is_running(t) } && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(unsafe { tc_tracker_stop(t) }, -1);
    }
}
