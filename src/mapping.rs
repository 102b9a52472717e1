use crate::curve::{ResponseCurve, Spline};
use crate::types::{Axis, DOF};

/// Per-axis options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOptions {
    /// Negate the filtered value before mapping.
    pub invert: bool,
    /// Use the alternate curve for the (inversion-corrected) negative half.
    pub altp: bool,
    /// Pose slot this output reads from; `None` or an index past the last
    /// slot forces the output to 0.
    pub src: Option<usize>,
    /// Offset added after the curve.
    pub zero: f64,
}

impl AxisOptions {
    /// Pass-through options for the given output slot.
    pub fn identity(axis: Axis) -> AxisOptions {
        AxisOptions {
            invert: false,
            altp: false,
            src: Some(axis.index()),
            zero: 0.0,
        }
    }

    /// The routed source slot, if it names a valid pose component.
    pub fn source_index(&self) -> Option<usize> {
        self.src.filter(|&k| k < DOF)
    }
}

/// One output axis: options plus its primary and alternate response curves.
pub struct AxisMapping {
    pub opts: AxisOptions,
    pub curve: Box<dyn ResponseCurve>,
    pub curve_alt: Box<dyn ResponseCurve>,
}

impl AxisMapping {
    pub fn new(
        opts: AxisOptions,
        curve: Box<dyn ResponseCurve>,
        curve_alt: Box<dyn ResponseCurve>,
    ) -> AxisMapping {
        AxisMapping {
            opts,
            curve,
            curve_alt,
        }
    }

    pub fn identity(axis: Axis) -> AxisMapping {
        AxisMapping::new(
            AxisOptions::identity(axis),
            Box::new(Spline::identity()),
            Box::new(Spline::identity()),
        )
    }

    /// Mark both curves inactive.
    pub fn deactivate(&mut self) {
        self.curve.set_active(false);
        self.curve_alt.set_active(false);
    }
}

/// Map one axis position through its response curve.
///
/// The alternate curve is selected when the sign of `pos`, corrected for
/// inversion, is negative and the axis enables it. Both curves receive
/// their activity state on every call.
pub fn map(pos: f64, invert: bool, axis: &mut AxisMapping) -> f64 {
    let alt = (pos < 0.0) == !invert && axis.opts.altp;
    axis.curve.set_active(!alt);
    axis.curve_alt.set_active(alt);
    let fc = if alt { &axis.curve_alt } else { &axis.curve };
    fc.evaluate(pos) + axis.opts.zero
}

/// The six axis mappings, indexed by output slot.
pub struct Mappings {
    axes: [AxisMapping; DOF],
}

impl Default for Mappings {
    fn default() -> Self {
        Mappings::identity()
    }
}

impl Mappings {
    pub fn new(axes: [AxisMapping; DOF]) -> Mappings {
        Mappings { axes }
    }

    /// Identity curves, no inversion, no offset, straight-through routing.
    pub fn identity() -> Mappings {
        Mappings {
            axes: Axis::ALL.map(AxisMapping::identity),
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisMapping {
        &self.axes[axis.index()]
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisMapping {
        &mut self.axes[axis.index()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AxisMapping> {
        self.axes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, AxisMapping> {
        self.axes.iter_mut()
    }

    pub fn inverts(&self) -> [bool; DOF] {
        std::array::from_fn(|i| self.axes[i].opts.invert)
    }

    pub fn deactivate_all(&mut self) {
        for axis in self.axes.iter_mut() {
            axis.deactivate();
        }
    }
}

impl std::ops::Index<usize> for Mappings {
    type Output = AxisMapping;

    fn index(&self, i: usize) -> &AxisMapping {
        &self.axes[i]
    }
}

impl std::ops::IndexMut<usize> for Mappings {
    fn index_mut(&mut self, i: usize) -> &mut AxisMapping {
        &mut self.axes[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(k: f64) -> Box<dyn ResponseCurve> {
        Box::new(Spline::new(&[(100.0, 100.0 * k)]))
    }

    fn axis(altp: bool, zero: f64) -> AxisMapping {
        AxisMapping::new(
            AxisOptions {
                invert: false,
                altp,
                src: Some(0),
                zero,
            },
            scaled(2.0),
            scaled(3.0),
        )
    }

    #[test]
    fn test_primary_curve_plus_zero() {
        let mut a = axis(false, 1.5);
        assert!((map(10.0, false, &mut a) - 21.5).abs() < 1e-12);
        assert!((map(-10.0, false, &mut a) - (-18.5)).abs() < 1e-12);
        assert!(a.curve.is_active());
        assert!(!a.curve_alt.is_active());
    }

    #[test]
    fn test_alternate_curve_on_negative_side() {
        let mut a = axis(true, 0.0);
        assert!((map(-10.0, false, &mut a) - (-30.0)).abs() < 1e-12);
        assert!(a.curve_alt.is_active());
        assert!(!a.curve.is_active());

        assert!((map(10.0, false, &mut a) - 20.0).abs() < 1e-12);
        assert!(a.curve.is_active());
        assert!(!a.curve_alt.is_active());
    }

    #[test]
    fn test_inversion_flips_alternate_side() {
        let mut a = axis(true, 0.0);
        assert!((map(10.0, true, &mut a) - 30.0).abs() < 1e-12);
        assert!(a.curve_alt.is_active());
        assert!((map(-10.0, true, &mut a) - (-20.0)).abs() < 1e-12);
        assert!(a.curve.is_active());
    }

    #[test]
    fn test_source_index_range() {
        let mut opts = AxisOptions::identity(Axis::Roll);
        assert_eq!(opts.source_index(), Some(5));
        opts.src = Some(9);
        assert_eq!(opts.source_index(), None);
        opts.src = None;
        assert_eq!(opts.source_index(), None);
    }

    #[test]
    fn test_deactivate_all() {
        let mut m = Mappings::identity();
        for a in m.iter_mut() {
            map(1.0, false, a);
        }
        assert!(m.iter().all(|a| a.curve.is_active()));
        m.deactivate_all();
        assert!(m.iter().all(|a| !a.curve.is_active() && !a.curve_alt.is_active()));
    }
}
