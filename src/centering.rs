use crate::math::Quat;
use crate::types::{Axis, Pose};

/// User-defined zero reference.
///
/// The translation reference comes from the filtered (pre-curve) pose, the
/// orientation reference from the mapped (post-curve) pose. The two are
/// captured at different stages on purpose and must stay that way.
#[derive(Debug, Clone, Copy, Default)]
pub struct Centering {
    t_b: [f64; 3],
    q_b: Quat,
}

impl Centering {
    pub fn new() -> Centering {
        Centering::default()
    }

    /// Translation captured at the last centering.
    pub fn translation_ref(&self) -> [f64; 3] {
        self.t_b
    }

    /// Orientation captured at the last centering.
    pub fn orientation_ref(&self) -> Quat {
        self.q_b
    }

    pub fn capture(&mut self, filtered: &Pose, mapped: &Pose) {
        self.t_b = filtered.translation();
        self.q_b = orientation(mapped);
        log::debug!("Centered: t_b={:?} ypr={:?}", self.t_b, mapped.rotation());
    }

    /// Express `mapped` relative to the captured reference.
    pub fn apply(&self, mapped: &Pose) -> Pose {
        let ypr = (orientation(mapped) * self.q_b.inv()).to_euler_degrees();

        let mut centered = Pose::zero();
        for i in 0..3 {
            centered[i] = mapped[i] - self.t_b[i];
            centered[i + 3] = ypr[i];
        }
        centered
    }

    /// Consume a pending request (if any), then center `mapped`.
    pub fn run(&mut self, requested: bool, filtered: &Pose, mapped: &Pose) -> Pose {
        if requested {
            self.capture(filtered, mapped);
        }
        self.apply(mapped)
    }
}

fn orientation(pose: &Pose) -> Quat {
    Quat::from_euler_degrees(pose[Axis::Yaw], pose[Axis::Pitch], pose[Axis::Roll])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pose_near(a: &Pose, b: &Pose) {
        for i in 0..6 {
            assert!((a[i] - b[i]).abs() < 1e-9, "slot {i}: {} vs {}", a[i], b[i]);
        }
    }

    #[test]
    fn test_uncentered_passes_through() {
        let c = Centering::new();
        let p = Pose::new(1.0, 2.0, 3.0, 10.0, -20.0, 30.0);
        assert_pose_near(&c.apply(&p), &p);
    }

    #[test]
    fn test_capture_moment_is_origin() {
        let mut c = Centering::new();
        let p = Pose::new(4.0, -5.0, 6.0, 45.0, 10.0, -70.0);
        let out = c.run(true, &p, &p);
        assert_pose_near(&out, &Pose::zero());
    }

    #[test]
    fn test_translation_ref_uses_filtered_pose() {
        let mut c = Centering::new();
        let filtered = Pose::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        let mapped = Pose::new(3.0, 3.0, 3.0, 0.0, 0.0, 0.0);
        let out = c.run(true, &filtered, &mapped);
        assert_eq!(c.translation_ref(), [1.0, 1.0, 1.0]);
        assert_pose_near(&out, &Pose::new(2.0, 2.0, 2.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_centering_twice_is_idempotent() {
        let p = Pose::new(2.0, 0.0, -1.0, 30.0, 5.0, 0.0);
        let later = Pose::new(3.0, 1.0, -1.0, 50.0, 5.0, 10.0);

        let mut once = Centering::new();
        once.run(true, &p, &p);
        let a = once.run(false, &later, &later);

        let mut twice = Centering::new();
        twice.run(true, &p, &p);
        twice.run(true, &p, &p);
        let b = twice.run(false, &later, &later);

        assert_pose_near(&a, &b);
    }

    #[test]
    fn test_relative_rotation() {
        let mut c = Centering::new();
        let base = Pose::new(0.0, 0.0, 0.0, 20.0, 0.0, 0.0);
        c.run(true, &base, &base);
        let out = c.apply(&Pose::new(0.0, 0.0, 0.0, 35.0, 0.0, 0.0));
        assert!((out[Axis::Yaw] - 15.0).abs() < 1e-9);
        assert!((c.orientation_ref().norm() - 1.0).abs() < 1e-12);
    }
}
