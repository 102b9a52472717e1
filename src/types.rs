use std::ops::{Index, IndexMut};

/// Number of degrees of freedom carried by a [`Pose`].
pub const DOF: usize = 6;

/// Semantic slot of a pose component.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    Yaw = 3,
    Pitch = 4,
    Roll = 5,
}

impl Axis {
    pub const ALL: [Axis; DOF] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Yaw,
        Axis::Pitch,
        Axis::Roll,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 6DOF pose: translation [x, y, z] in user units followed by
/// [yaw, pitch, roll] in degrees.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose(pub [f64; DOF]);

impl Pose {
    pub const fn zero() -> Self {
        Pose([0.0; DOF])
    }

    pub fn new(x: f64, y: f64, z: f64, yaw: f64, pitch: f64, roll: f64) -> Self {
        Pose([x, y, z, yaw, pitch, roll])
    }

    pub fn translation(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Rotation part as [yaw, pitch, roll] in degrees.
    pub fn rotation(&self) -> [f64; 3] {
        [self.0[3], self.0[4], self.0[5]]
    }

    pub fn as_array(&self) -> &[f64; DOF] {
        &self.0
    }
}

impl From<[f64; DOF]> for Pose {
    fn from(values: [f64; DOF]) -> Self {
        Pose(values)
    }
}

impl Index<usize> for Pose {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Pose {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl Index<Axis> for Pose {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        &self.0[axis.index()]
    }
}

impl IndexMut<Axis> for Pose {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        &mut self.0[axis.index()]
    }
}

/// Latest published cycle output, copied out under the snapshot lock.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    /// Pose handed to the output protocol.
    pub mapped: Pose,
    /// Raw accumulator the cycle was computed from.
    pub raw: Pose,
}

bitflags::bitflags! {
    /// Global pipeline toggles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[repr(C)]
    pub struct TrackOptions: u32 {
        /// Correct translation for rotation about an off-center pivot.
        const TCOMP            = 1 << 0;
        /// With TCOMP, keep the centered Z instead of the rotated Z.
        const TCOMP_PRESERVE_Z = 1 << 1;
    }
}
