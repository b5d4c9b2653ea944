//! Easing curves and interpolatable values for [`Interpolate`](crate::Interpolate).

/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Clone, Copy, Debug, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// Quadratic, slow start.
    EaseIn,
    /// Quadratic, slow end.
    EaseOut,
    /// Slow at both ends, symmetric around `0.5`.
    EaseInOut,
    Custom(fn(f32) -> f32),
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            Easing::EaseInOut => {
                let sq = t * t;
                sq / (2.0 * (sq - t) + 1.0)
            }
            Easing::Custom(curve) => curve(t),
        }
    }
}

/// A value that can be blended between two endpoints.
pub trait Lerp: Copy + 'static {
    /// `start` at `t == 0`, `end` at `t == 1`. `t` is clamped to `[0, 1]`.
    fn lerp(start: Self, end: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(start: Self, end: Self, t: f32) -> Self {
        start - (start - end) * t.clamp(0.0, 1.0)
    }
}

impl<const N: usize> Lerp for [f32; N] {
    fn lerp(start: Self, end: Self, t: f32) -> Self {
        let mut out = start;
        for (value, target) in out.iter_mut().zip(end) {
            *value = f32::lerp(*value, target, t);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn curves_fix_both_endpoints() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert!(close(easing.apply(0.0), 0.0), "{easing:?} at 0");
            assert!(close(easing.apply(1.0), 1.0), "{easing:?} at 1");
        }
    }

    #[test]
    fn curve_shapes_at_midpoints() {
        assert!(close(Easing::Linear.apply(0.25), 0.25));
        assert!(close(Easing::EaseIn.apply(0.5), 0.25));
        assert!(close(Easing::EaseOut.apply(0.5), 0.75));
        assert!(close(Easing::EaseInOut.apply(0.5), 0.5));
        // 0.0625 / (2 * (0.0625 - 0.25) + 1)
        assert!(close(Easing::EaseInOut.apply(0.25), 0.1));
        assert!(close(Easing::Custom(|t| 1.0 - t).apply(0.25), 0.75));
    }

    #[test]
    fn lerp_clamps_factor() {
        assert!(close(f32::lerp(2.0, 4.0, 0.5), 3.0));
        assert!(close(f32::lerp(2.0, 4.0, 3.0), 4.0));
        assert!(close(f32::lerp(2.0, 4.0, -1.0), 2.0));
        assert_eq!(<[f32; 2]>::lerp([0.0, 10.0], [1.0, 0.0], 0.5), [0.5, 5.0]);
    }
}
