//! Response curves.
//!
//! Curves are authored elsewhere; the pipeline only evaluates them and tells
//! them whether they are the variant currently in use.

/// Scalar transfer function with an activity side channel.
///
/// `set_active` is called on every cycle for both curves of an axis, so
/// implementations that ramp or apply hysteresis on switch can track the
/// transition themselves.
pub trait ResponseCurve: Send {
    fn evaluate(&self, x: f64) -> f64;

    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;
}

/// Piecewise-linear curve through control points on the non-negative half
/// axis, mirrored for negative input.
///
/// Beyond the last control point the output is held at the last value.
#[derive(Debug, Clone)]
pub struct Spline {
    points: Vec<(f64, f64)>,
    active: bool,
}

impl Spline {
    /// Build from control points. Points are sorted by x; points with a
    /// negative x are dropped. An implicit (0, 0) start is assumed.
    pub fn new(points: &[(f64, f64)]) -> Spline {
        let mut points: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| *x >= 0.0 && x.is_finite() && y.is_finite())
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Spline {
            points,
            active: false,
        }
    }

    /// `y = x` over the whole real line.
    pub fn identity() -> Spline {
        Spline {
            points: Vec::new(),
            active: false,
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    fn eval_positive(&self, x: f64) -> f64 {
        let Some(&(last_x, last_y)) = self.points.last() else {
            return x;
        };
        if x >= last_x {
            return last_y;
        }

        let mut prev = (0.0, 0.0);
        for &(px, py) in &self.points {
            if x <= px {
                let span = px - prev.0;
                if span <= f64::EPSILON {
                    return py;
                }
                let t = (x - prev.0) / span;
                return prev.1 + t * (py - prev.1);
            }
            prev = (px, py);
        }
        last_y
    }
}

impl ResponseCurve for Spline {
    fn evaluate(&self, x: f64) -> f64 {
        if x < 0.0 {
            -self.eval_positive(-x)
        } else {
            self.eval_positive(x)
        }
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let c = Spline::identity();
        assert_eq!(c.evaluate(10.0), 10.0);
        assert_eq!(c.evaluate(-10.0), -10.0);
        assert_eq!(c.evaluate(0.0), 0.0);
    }

    #[test]
    fn test_interpolation_and_clamp() {
        let c = Spline::new(&[(20.0, 40.0), (10.0, 10.0)]);
        assert_eq!(c.points()[0], (10.0, 10.0));
        assert!((c.evaluate(5.0) - 5.0).abs() < 1e-12);
        assert!((c.evaluate(15.0) - 25.0).abs() < 1e-12);
        assert_eq!(c.evaluate(100.0), 40.0);
    }

    #[test]
    fn test_odd_symmetry() {
        let c = Spline::new(&[(10.0, 30.0), (30.0, 50.0)]);
        for x in [0.5, 3.0, 12.0, 29.0, 80.0] {
            assert_eq!(c.evaluate(-x), -c.evaluate(x));
        }
    }

    #[test]
    fn test_activity_flag() {
        let mut c = Spline::identity();
        assert!(!c.is_active());
        c.set_active(true);
        assert!(c.is_active());
        c.set_active(false);
        assert!(!c.is_active());
    }
}
