//! Orientation primitives used by centering and rotation compensation.
//!
//! Angles cross this module's public surface in degrees, in
//! [yaw, pitch, roll] order, matching the rotation slots of [`crate::Pose`].

/// Row-major 3x3 matrix.
pub type Mat3 = [[f64; 3]; 3];

/// Unit quaternion [w, x, y, z] using the yaw(Z), pitch(Y), roll(X)
/// aerospace convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Build from yaw, pitch and roll in radians.
    pub fn from_euler_rads(yaw: f64, pitch: f64, roll: f64) -> Quat {
        let (sin_phi, cos_phi) = (roll / 2.0).sin_cos();
        let (sin_the, cos_the) = (pitch / 2.0).sin_cos();
        let (sin_psi, cos_psi) = (yaw / 2.0).sin_cos();

        Quat {
            w: cos_phi * cos_the * cos_psi + sin_phi * sin_the * sin_psi,
            x: sin_phi * cos_the * cos_psi - cos_phi * sin_the * sin_psi,
            y: cos_phi * sin_the * cos_psi + sin_phi * cos_the * sin_psi,
            z: cos_phi * cos_the * sin_psi - sin_phi * sin_the * cos_psi,
        }
    }

    pub fn from_euler_degrees(yaw: f64, pitch: f64, roll: f64) -> Quat {
        Quat::from_euler_rads(yaw.to_radians(), pitch.to_radians(), roll.to_radians())
    }

    /// Inverse of a unit quaternion (its conjugate).
    pub fn inv(&self) -> Quat {
        Quat {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Extract [yaw, pitch, roll] in radians.
    pub fn to_euler_rads(&self) -> [f64; 3] {
        let Quat { w, x, y, z } = *self;
        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let pitch = (2.0 * (w * y - x * z)).clamp(-1.0, 1.0).asin();
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        [yaw, pitch, roll]
    }

    /// Extract [yaw, pitch, roll] in degrees.
    pub fn to_euler_degrees(&self) -> [f64; 3] {
        let [yaw, pitch, roll] = self.to_euler_rads();
        [yaw.to_degrees(), pitch.to_degrees(), roll.to_degrees()]
    }
}

impl std::ops::Mul for Quat {
    type Output = Quat;

    /// Hamilton product.
    fn mul(self, b: Quat) -> Quat {
        let a = self;
        Quat {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }
}

/// Tait-Bryan XYZ rotation matrix (not classical Euler).
///
/// Composes pitch about X, then yaw about Y, then roll about Z:
///
/// ```text
/// [ c2c3,            -c2s3,            s2   ]
/// [ c1s3 + c3s1s2,    c1c3 - s1s2s3,  -c2s1 ]
/// [ s1s3 - c1c3s2,    c3s1 + c1s2s3,   c1c2 ]
/// ```
///
/// with (c1, s1) from pitch, (c2, s2) from yaw and (c3, s3) from roll.
pub fn euler_to_rmat(yaw: f64, pitch: f64, roll: f64) -> Mat3 {
    let (s1, c1) = pitch.to_radians().sin_cos();
    let (s2, c2) = yaw.to_radians().sin_cos();
    let (s3, c3) = roll.to_radians().sin_cos();

    [
        [c2 * c3, -c2 * s3, s2],
        [c1 * s3 + c3 * s1 * s2, c1 * c3 - s1 * s2 * s3, -c2 * s1],
        [s1 * s3 - c1 * c3 * s2, c3 * s1 + c1 * s2 * s3, c1 * c2],
    ]
}

/// Recover [yaw, pitch, roll] in degrees from a matrix built by
/// [`euler_to_rmat`].
///
/// At yaw = ±90° pitch and roll are coupled; roll is reported as 0 and the
/// whole residual rotation is attributed to pitch.
pub fn rmat_to_euler(m: &Mat3) -> [f64; 3] {
    let yaw = m[0][2].clamp(-1.0, 1.0).asin();
    let (pitch, roll) = if yaw.cos().abs() > 1e-6 {
        ((-m[1][2]).atan2(m[2][2]), (-m[0][1]).atan2(m[0][0]))
    } else {
        (m[2][1].atan2(m[1][1]), 0.0)
    };
    [yaw.to_degrees(), pitch.to_degrees(), roll.to_degrees()]
}

pub fn mat_vec(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Rotation-induced translation compensation.
///
/// X and Y are negated into the rotation frame and negated back afterwards
/// (handedness differs between the measurement and rotation frames).
/// `preserve_z` keeps the input Z instead of the rotated one.
pub fn t_compensate(rmat: &Mat3, xyz: [f64; 3], preserve_z: bool) -> [f64; 3] {
    let ret = mat_vec(rmat, [-xyz[0], -xyz[1], xyz[2]]);
    let z = if preserve_z { xyz[2] } else { ret[2] };
    [-ret[0], -ret[1], z]
}
