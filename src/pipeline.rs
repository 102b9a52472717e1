use crate::centering::Centering;
use crate::io::{Filter, Protocol};
use crate::mapping::{map, Mappings};
use crate::math::{euler_to_rmat, t_compensate};
use crate::types::{Axis, Pose, Snapshot, TrackOptions, DOF};
use crate::Result;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// State shared between the worker and outside callers.
///
/// The flags are single-word signals read once per cycle; a write may be
/// observed one cycle late, which is acceptable for all of them. Only the
/// snapshot needs a lock.
#[derive(Debug)]
pub struct Shared {
    quit: AtomicBool,
    enabled: AtomicBool,
    center: AtomicBool,
    options: AtomicU32,
    snapshot: Mutex<Snapshot>,
}

impl Default for Shared {
    fn default() -> Self {
        Shared::new(TrackOptions::empty())
    }
}

impl Shared {
    pub fn new(options: TrackOptions) -> Shared {
        Shared {
            quit: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
            center: AtomicBool::new(false),
            options: AtomicU32::new(options.bits()),
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    /// Arm a one-shot centering on the next cycle.
    pub fn request_center(&self) {
        self.center.store(true, Ordering::Relaxed);
    }

    pub fn center_pending(&self) -> bool {
        self.center.load(Ordering::Relaxed)
    }

    pub(crate) fn take_center(&self) -> bool {
        self.center.swap(false, Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn options(&self) -> TrackOptions {
        TrackOptions::from_bits_truncate(self.options.load(Ordering::Relaxed))
    }

    pub fn set_options(&self, options: TrackOptions) {
        self.options.store(options.bits(), Ordering::Relaxed);
    }

    pub(crate) fn request_quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_quit(&self) {
        self.quit.store(false, Ordering::Relaxed);
    }

    /// Copy of the latest published cycle output.
    pub fn snapshot(&self) -> Snapshot {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// One tick of the transform chain:
/// raw -> filter -> invert -> curves -> centering -> compensation -> remap -> publish.
pub struct Pipeline {
    mappings: Mappings,
    filter: Option<Box<dyn Filter>>,
    protocol: Option<Box<dyn Protocol>>,
    centering: Centering,
    final_raw: Pose,
    shared: Arc<Shared>,
}

impl Pipeline {
    pub fn new(mappings: Mappings) -> Pipeline {
        Pipeline {
            mappings,
            filter: None,
            protocol: None,
            centering: Centering::new(),
            final_raw: Pose::zero(),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Pipeline {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_protocol(mut self, protocol: impl Protocol + 'static) -> Pipeline {
        self.protocol = Some(Box::new(protocol));
        self
    }

    /// Initial toggles. Kept by `Tracker::start` unless the settings carry
    /// their own.
    pub fn with_options(self, options: TrackOptions) -> Pipeline {
        self.shared.set_options(options);
        self
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    pub fn mappings_mut(&mut self) -> &mut Mappings {
        &mut self.mappings
    }

    pub fn centering(&self) -> &Centering {
        &self.centering
    }

    /// The raw accumulator as of the last cycle.
    pub fn raw(&self) -> Pose {
        self.final_raw
    }

    /// Run one cycle with a fresh raw sample.
    ///
    /// While disabled the sample is ignored and the previous accumulator is
    /// processed again.
    pub fn logic(&mut self, newpose: &[f64; DOF]) -> Result<Pose> {
        if self.shared.is_enabled() {
            self.final_raw = Pose(*newpose);
        }
        self.step()
    }

    /// Final pass with an all-zero raw pose, then deactivate every curve.
    ///
    /// The configured filter stays in the chain, so the published pose may
    /// not reach exact origin.
    pub fn shutdown(&mut self) -> Result<Pose> {
        self.final_raw = Pose::zero();
        let result = self.step();
        self.deactivate_curves();
        result
    }

    pub fn deactivate_curves(&mut self) {
        self.mappings.deactivate_all();
    }

    fn step(&mut self) -> Result<Pose> {
        let mut filtered = match self.filter.as_mut() {
            Some(filter) => filter.filter(&self.final_raw),
            None => self.final_raw,
        };

        // invert before building any rotation, the matrix is sign sensitive
        let inverts = self.mappings.inverts();
        for i in 0..DOF {
            if inverts[i] {
                filtered[i] = -filtered[i];
            }
        }

        let mut mapped = Pose::zero();
        for i in 0..DOF {
            mapped[i] = map(filtered[i], inverts[i], &mut self.mappings[i]);
        }

        let centered = self
            .centering
            .run(self.shared.take_center(), &filtered, &mapped);

        let compensated = compensate(&centered, self.shared.options());

        let out = self.remap(&compensated);

        if let Some(protocol) = self.protocol.as_mut() {
            protocol.pose(&out)?;
        }

        self.shared.publish(Snapshot {
            mapped: out,
            raw: self.final_raw,
        });

        Ok(out)
    }

    fn remap(&self, pose: &Pose) -> Pose {
        let mut out = Pose::zero();
        for (i, axis) in self.mappings.iter().enumerate() {
            out[i] = match axis.opts.source_index() {
                Some(k) => pose[k],
                None => 0.0,
            };
        }
        out
    }
}

fn compensate(centered: &Pose, options: TrackOptions) -> Pose {
    if !options.contains(TrackOptions::TCOMP) {
        return *centered;
    }
    let rmat = euler_to_rmat(
        centered[Axis::Yaw],
        centered[Axis::Pitch],
        centered[Axis::Roll],
    );
    let xyz = t_compensate(
        &rmat,
        centered.translation(),
        options.contains(TrackOptions::TCOMP_PRESERVE_Z),
    );
    let mut out = *centered;
    out.0[..3].copy_from_slice(&xyz);
    out
}
